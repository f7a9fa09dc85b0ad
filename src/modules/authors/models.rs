use libris_kernel::ValidationErrors;
use serde::{Deserialize, Serialize};

use crate::utils::fields::{required_text, WriteMode};

pub const NAME_MAX_CHARS: usize = 200;
pub const NAME_TAKEN: &str = "author with this name already exists.";

/// Author as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub biography: String,
    /// Books credited to this author, ordered by title then year.
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
}

/// Request body for create, full and partial update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorPayload {
    pub name: Option<String>,
    pub biography: Option<String>,
}

/// Cleaned values ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorFields {
    pub name: String,
    pub biography: String,
}

impl AuthorPayload {
    /// Validate the payload, merging over `current` for partial updates.
    ///
    /// `biography` is optional in every mode; when omitted on an update the
    /// stored value is kept.
    pub fn resolve(
        self,
        mode: WriteMode,
        current: Option<&Author>,
    ) -> Result<AuthorFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(
            &mut errors,
            "name",
            mode.pick(self.name, current.map(|a| a.name.clone())),
            NAME_MAX_CHARS,
        );
        let biography = self
            .biography
            .map(|b| b.trim().to_string())
            .or_else(|| current.map(|a| a.biography.clone()))
            .unwrap_or_default();

        errors.into_result()?;
        Ok(AuthorFields {
            name: name.unwrap_or_default(),
            biography,
        })
    }
}

use libris_kernel::ValidationErrors;
use serde::{Deserialize, Serialize};

use crate::utils::fields::{required_text, WriteMode};

pub const NAME_MAX_CHARS: usize = 100;
pub const NAME_TAKEN: &str = "genre with this name already exists.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenrePayload {
    pub name: Option<String>,
}

impl GenrePayload {
    /// Cleaned genre name, merged over `current` for partial updates.
    pub fn resolve(
        self,
        mode: WriteMode,
        current: Option<&Genre>,
    ) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(
            &mut errors,
            "name",
            mode.pick(self.name, current.map(|g| g.name.clone())),
            NAME_MAX_CHARS,
        );
        errors.into_result()?;
        Ok(name.unwrap_or_default())
    }
}

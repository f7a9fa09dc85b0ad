use serde::{Deserialize, Serialize};

pub const TITLE_MAX_CHARS: usize = 100;
/// Limit shared by genre, category and publisher.
pub const LABEL_MAX_CHARS: usize = 100;

/// Fiction is the default; textbooks may exist in several editions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookType {
    #[default]
    Fiction,
    Textbook,
}

impl BookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fiction => "fiction",
            Self::Textbook => "textbook",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "fiction" => Some(Self::Fiction),
            "textbook" => Some(Self::Textbook),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Book as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Author id, as accepted on writes.
    pub author: i64,
    pub author_name: String,
    pub year: i64,
    pub genre: String,
    pub category: String,
    pub publisher: String,
    /// Path relative to the media root.
    pub cover_image: Option<String>,
    /// Path relative to the media root.
    pub book_file: String,
    pub book_type: BookType,
}

/// Validated scalar fields of a book about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCandidate {
    pub title: String,
    pub author: i64,
    pub year: i64,
    pub genre: String,
    pub category: String,
    pub publisher: String,
    pub book_type: BookType,
}

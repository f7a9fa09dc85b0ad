//! Checks a book must pass before it is written.
//!
//! Field checks run first and stop the evaluation; once they pass, both
//! record-level checks always run so a caller sees every conflict at once.

use std::ops::RangeInclusive;

use async_trait::async_trait;
use libris_db::{StoreError, StoreResult};
use libris_http::AppError;
use libris_kernel::ValidationErrors;
use thiserror::Error;

use super::models::{BookCandidate, BookType};

pub const YEAR_RANGE: RangeInclusive<i64> = 1000..=9999;
pub const YEAR_OUT_OF_RANGE: &str = "Year must be between 1000 and 9999.";
pub const DUPLICATE_BOOK: &str =
    "A book with this title, author, year and publisher already exists.";
pub const DUPLICATE_EDITION: &str =
    "This edition of the textbook already exists. Change the year to register a new edition.";

pub fn unknown_author(author: i64) -> String {
    format!("Invalid pk \"{author}\" - object does not exist.")
}

/// Read access the policy needs from the store.
#[async_trait]
pub trait BookLookup: Send + Sync {
    async fn author_exists(&self, author: i64) -> StoreResult<bool>;

    /// Ids of other books sharing title, author, year and publisher.
    async fn same_natural_key(
        &self,
        candidate: &BookCandidate,
        exclude: Option<i64>,
    ) -> StoreResult<Vec<i64>>;

    /// Years of other textbooks sharing title, author and publisher.
    async fn textbook_edition_years(
        &self,
        candidate: &BookCandidate,
        exclude: Option<i64>,
    ) -> StoreResult<Vec<i64>>;
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Rejected(ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Rejected(errors) => errors.into(),
            PolicyError::Store(err) => err.into(),
        }
    }
}

pub fn check_year(year: i64) -> Result<(), &'static str> {
    if YEAR_RANGE.contains(&year) {
        Ok(())
    } else {
        Err(YEAR_OUT_OF_RANGE)
    }
}

/// Evaluate `candidate` against the store. `exclude` is the id of the book
/// being updated, if any.
pub async fn evaluate<L>(
    lookup: &L,
    candidate: &BookCandidate,
    exclude: Option<i64>,
) -> Result<(), PolicyError>
where
    L: BookLookup + ?Sized,
{
    let mut errors = ValidationErrors::new();

    if let Err(message) = check_year(candidate.year) {
        errors.add_field("year", message);
    }
    if !lookup.author_exists(candidate.author).await? {
        errors.add_field("author", unknown_author(candidate.author));
    }
    if !errors.is_empty() {
        return Err(PolicyError::Rejected(errors));
    }

    if !lookup.same_natural_key(candidate, exclude).await?.is_empty() {
        errors.add_non_field(DUPLICATE_BOOK);
    }
    if candidate.book_type == BookType::Textbook
        && lookup
            .textbook_edition_years(candidate, exclude)
            .await?
            .contains(&candidate.year)
    {
        errors.add_non_field(DUPLICATE_EDITION);
    }

    if !errors.is_empty() {
        tracing::debug!(title = %candidate.title, %errors, "book rejected by policy");
    }
    errors.into_result().map_err(PolicyError::Rejected)
}

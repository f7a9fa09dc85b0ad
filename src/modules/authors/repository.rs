use std::collections::HashMap;

use libris_db::{Database, StoreError, StoreResult};

use super::models::{Author, AuthorFields, BookSummary};

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: i64,
    name: String,
    biography: String,
}

#[derive(sqlx::FromRow)]
struct OwnedSummary {
    author_id: i64,
    id: i64,
    title: String,
}

/// Author table access.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    db: Database,
}

impl AuthorRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All authors ordered by name, each with their books.
    pub async fn list(&self) -> StoreResult<Vec<Author>> {
        let rows: Vec<AuthorRow> =
            sqlx::query_as("SELECT id, name, biography FROM author ORDER BY name, id")
                .fetch_all(self.db.pool())
                .await?;

        let summaries: Vec<OwnedSummary> =
            sqlx::query_as("SELECT author_id, id, title FROM book ORDER BY title, year, id")
                .fetch_all(self.db.pool())
                .await?;
        let mut books: HashMap<i64, Vec<BookSummary>> = HashMap::new();
        for s in summaries {
            books.entry(s.author_id).or_default().push(BookSummary {
                id: s.id,
                title: s.title,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let books = books.remove(&row.id).unwrap_or_default();
                into_author(row, books)
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> StoreResult<Author> {
        let row: AuthorRow = sqlx::query_as("SELECT id, name, biography FROM author WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("author", id))?;

        let books: Vec<BookSummary> =
            sqlx::query_as("SELECT id, title FROM book WHERE author_id = ? ORDER BY title, year, id")
                .bind(id)
                .fetch_all(self.db.pool())
                .await?;

        Ok(into_author(row, books))
    }

    /// Whether another author already uses `name`.
    pub async fn name_taken(&self, name: &str, exclude: Option<i64>) -> StoreResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM author WHERE name = ? AND id != ? LIMIT 1")
                .bind(name)
                .bind(exclude.unwrap_or(0))
                .fetch_optional(self.db.pool())
                .await?;
        Ok(found.is_some())
    }

    pub async fn insert(&self, fields: &AuthorFields) -> StoreResult<i64> {
        let result = sqlx::query("INSERT INTO author (name, biography) VALUES (?, ?)")
            .bind(&fields.name)
            .bind(&fields.biography)
            .execute(self.db.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(&self, id: i64, fields: &AuthorFields) -> StoreResult<()> {
        let result = sqlx::query("UPDATE author SET name = ?, biography = ? WHERE id = ?")
            .bind(&fields.name)
            .bind(&fields.biography)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("author", id));
        }
        Ok(())
    }

    /// Delete the author; the foreign key cascades to their books.
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("author", id));
        }
        Ok(())
    }
}

fn into_author(row: AuthorRow, books: Vec<BookSummary>) -> Author {
    Author {
        id: row.id,
        name: row.name,
        biography: row.biography,
        books,
    }
}

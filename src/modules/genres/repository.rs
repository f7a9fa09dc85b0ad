use libris_db::{Database, StoreError, StoreResult};

use super::models::Genre;

/// Genre table access.
#[derive(Debug, Clone)]
pub struct GenreRepository {
    db: Database,
}

impl GenreRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> StoreResult<Vec<Genre>> {
        Ok(
            sqlx::query_as("SELECT id, name FROM genre ORDER BY name, id")
                .fetch_all(self.db.pool())
                .await?,
        )
    }

    pub async fn get(&self, id: i64) -> StoreResult<Genre> {
        sqlx::query_as("SELECT id, name FROM genre WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("genre", id))
    }

    pub async fn name_taken(&self, name: &str, exclude: Option<i64>) -> StoreResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM genre WHERE name = ? AND id != ? LIMIT 1")
                .bind(name)
                .bind(exclude.unwrap_or(0))
                .fetch_optional(self.db.pool())
                .await?;
        Ok(found.is_some())
    }

    pub async fn insert(&self, name: &str) -> StoreResult<Genre> {
        let result = sqlx::query("INSERT INTO genre (name) VALUES (?)")
            .bind(name)
            .execute(self.db.pool())
            .await?;
        Ok(Genre {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub async fn rename(&self, id: i64, name: &str) -> StoreResult<Genre> {
        let result = sqlx::query("UPDATE genre SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("genre", id));
        }
        Ok(Genre {
            id,
            name: name.to_string(),
        })
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM genre WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("genre", id));
        }
        Ok(())
    }
}

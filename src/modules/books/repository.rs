use async_trait::async_trait;
use libris_db::{Database, StoreError, StoreResult};
use sqlx::{Sqlite, SqliteConnection, Transaction};

use super::models::{Book, BookCandidate};
use super::policy::BookLookup;

const SELECT_BOOK: &str = r#"
    SELECT b.id, b.title, b.author_id AS author, a.name AS author_name, b.year,
           b.genre, b.category, b.publisher, b.cover_image, b.book_file, b.book_type
    FROM book b
    JOIN author a ON a.id = b.author_id
"#;

/// Row values for an insert or update.
#[derive(Debug)]
pub struct BookRecord<'a> {
    pub candidate: &'a BookCandidate,
    pub book_file: &'a str,
    pub cover_image: Option<&'a str>,
}

/// Book table access.
#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        self.db.begin().await
    }

    /// All books ordered by title, then year.
    pub async fn list(&self) -> StoreResult<Vec<Book>> {
        Ok(
            sqlx::query_as(&format!("{SELECT_BOOK} ORDER BY b.title, b.year, b.id"))
                .fetch_all(self.db.pool())
                .await?,
        )
    }

    pub async fn get(&self, id: i64) -> StoreResult<Book> {
        sqlx::query_as(&format!("{SELECT_BOOK} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("book", id))
    }

    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        record: &BookRecord<'_>,
    ) -> StoreResult<i64> {
        let c = record.candidate;
        let result = sqlx::query(
            r#"
            INSERT INTO book
                (title, author_id, year, genre, category, publisher,
                 cover_image, book_file, book_type)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&c.title)
        .bind(c.author)
        .bind(c.year)
        .bind(&c.genre)
        .bind(&c.category)
        .bind(&c.publisher)
        .bind(record.cover_image)
        .bind(record.book_file)
        .bind(c.book_type)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        record: &BookRecord<'_>,
    ) -> StoreResult<()> {
        let c = record.candidate;
        let result = sqlx::query(
            r#"
            UPDATE book
            SET title = ?, author_id = ?, year = ?, genre = ?, category = ?,
                publisher = ?, cover_image = ?, book_file = ?, book_type = ?
            WHERE id = ?
            "#,
        )
        .bind(&c.title)
        .bind(c.author)
        .bind(c.year)
        .bind(&c.genre)
        .bind(&c.category)
        .bind(&c.publisher)
        .bind(record.cover_image)
        .bind(record.book_file)
        .bind(c.book_type)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("book", id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("book", id));
        }
        Ok(())
    }
}

#[async_trait]
impl BookLookup for BookRepository {
    async fn author_exists(&self, author: i64) -> StoreResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM author WHERE id = ?")
            .bind(author)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.is_some())
    }

    async fn same_natural_key(
        &self,
        candidate: &BookCandidate,
        exclude: Option<i64>,
    ) -> StoreResult<Vec<i64>> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT id FROM book
            WHERE title = ? AND author_id = ? AND year = ? AND publisher = ?
              AND id IS NOT ?
            "#,
        )
        .bind(&candidate.title)
        .bind(candidate.author)
        .bind(candidate.year)
        .bind(&candidate.publisher)
        .bind(exclude)
        .fetch_all(self.db.pool())
        .await?)
    }

    async fn textbook_edition_years(
        &self,
        candidate: &BookCandidate,
        exclude: Option<i64>,
    ) -> StoreResult<Vec<i64>> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT year FROM book
            WHERE book_type = 'textbook'
              AND title = ? AND author_id = ? AND publisher = ?
              AND id IS NOT ?
            "#,
        )
        .bind(&candidate.title)
        .bind(candidate.author)
        .bind(&candidate.publisher)
        .bind(exclude)
        .fetch_all(self.db.pool())
        .await?)
    }
}

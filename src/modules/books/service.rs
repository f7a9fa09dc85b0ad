//! Book writes: form cleaning, policy, one transaction, then file storage.

use anyhow::Context;
use libris_db::StoreError;
use libris_http::AppError;
use libris_kernel::ValidationErrors;

use super::form::{BookForm, FileChange, Upload, NO_FILE};
use super::media::{MediaKind, MediaStore};
use super::models::{Book, BookCandidate};
use super::policy::{self, unknown_author, DUPLICATE_BOOK};
use super::repository::{BookRecord, BookRepository};
use crate::utils::fields::WriteMode;

#[derive(Debug, Clone)]
pub struct BookService {
    repo: BookRepository,
    media: MediaStore,
}

impl BookService {
    pub fn new(repo: BookRepository, media: MediaStore) -> Self {
        Self { repo, media }
    }

    pub fn repo(&self) -> &BookRepository {
        &self.repo
    }

    pub async fn create(&self, form: BookForm) -> Result<Book, AppError> {
        let submission = form.resolve(WriteMode::Create, None)?;
        policy::evaluate(&self.repo, &submission.candidate, None).await?;

        let id = self
            .persist(None, submission.candidate, submission.book_file, submission.cover_image)
            .await?;
        tracing::info!(book_id = id, "book created");
        Ok(self.repo.get(id).await?)
    }

    pub async fn update(&self, id: i64, form: BookForm, mode: WriteMode) -> Result<Book, AppError> {
        let current = self.repo.get(id).await?;
        let submission = form.resolve(mode, Some(&current))?;
        policy::evaluate(&self.repo, &submission.candidate, Some(id)).await?;

        self.persist(
            Some(&current),
            submission.candidate,
            submission.book_file,
            submission.cover_image,
        )
        .await?;
        tracing::info!(book_id = id, ?mode, "book updated");
        Ok(self.repo.get(id).await?)
    }

    /// Stored files are left in place.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.repo.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    /// Write the row, then the uploads, then commit. Uploads written before
    /// a failure are removed again and the transaction rolls back on drop.
    async fn persist(
        &self,
        current: Option<&Book>,
        candidate: BookCandidate,
        book_file: FileChange,
        cover_image: FileChange,
    ) -> Result<i64, AppError> {
        let mut pending: Vec<(String, Upload)> = Vec::new();

        let book_file = match (book_file, current) {
            (FileChange::Replace(upload), _) => {
                let path = self.media.reserve(MediaKind::BookFile, &upload.file_name);
                pending.push((path.clone(), upload));
                path
            }
            (_, Some(book)) => book.book_file.clone(),
            (_, None) => return Err(ValidationErrors::field("book_file", NO_FILE).into()),
        };
        let cover_image = match cover_image {
            FileChange::Keep => current.and_then(|book| book.cover_image.clone()),
            FileChange::Clear => None,
            FileChange::Replace(upload) => {
                let path = self.media.reserve(MediaKind::CoverImage, &upload.file_name);
                pending.push((path.clone(), upload));
                Some(path)
            }
        };

        let record = BookRecord {
            candidate: &candidate,
            book_file: &book_file,
            cover_image: cover_image.as_deref(),
        };

        let mut tx = self.repo.begin().await?;
        let id = match current {
            None => self.repo.insert(&mut tx, &record).await,
            Some(book) => self.repo.update(&mut tx, book.id, &record).await.map(|()| book.id),
        }
        .map_err(|err| write_conflict(err, &candidate))?;

        let mut written = Vec::with_capacity(pending.len());
        for (path, upload) in &pending {
            if let Err(err) = self.media.write(path, &upload.bytes).await {
                self.media.discard(&written).await;
                return Err(AppError::Internal(
                    anyhow::Error::new(err).context(format!("failed to store upload {path}")),
                ));
            }
            written.push(path.clone());
        }

        if let Err(err) = tx.commit().await.context("failed to commit book write") {
            self.media.discard(&written).await;
            return Err(err.into());
        }
        Ok(id)
    }
}

/// Constraint failures from a concurrent writer are reported the same way
/// the policy reports them.
fn write_conflict(err: StoreError, candidate: &BookCandidate) -> AppError {
    match err {
        StoreError::UniqueViolation { .. } => ValidationErrors::non_field(DUPLICATE_BOOK).into(),
        StoreError::ForeignKeyViolation { .. } => {
            ValidationErrors::field("author", unknown_author(candidate.author)).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use bytes::Bytes;
    use libris_db::Database;
    use libris_kernel::ModuleRegistry;
    use tempfile::TempDir;

    use super::*;
    use crate::modules::books::models::BookType;

    async fn service(media_root: &Path) -> BookService {
        let db = Database::in_memory().await.unwrap();
        let mut registry = ModuleRegistry::new();
        crate::modules::register_all(&mut registry);
        db.apply_migrations(&registry.collect_migrations())
            .await
            .unwrap();
        sqlx::query("INSERT INTO author (id, name) VALUES (1, 'Пёрышкин')")
            .execute(db.pool())
            .await
            .unwrap();

        let media = MediaStore::new(media_root);
        media.prepare().await.unwrap();
        BookService::new(BookRepository::new(db), media)
    }

    fn candidate(author: i64) -> BookCandidate {
        BookCandidate {
            title: "Физика".to_string(),
            author,
            year: 2020,
            genre: "Наука".to_string(),
            category: "Учебник".to_string(),
            publisher: "Дрофа".to_string(),
            book_type: BookType::Textbook,
        }
    }

    fn pdf() -> FileChange {
        FileChange::Replace(Upload {
            file_name: "physics.pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        })
    }

    fn stored_files(media: &TempDir) -> usize {
        std::fs::read_dir(media.path().join("books")).unwrap().count()
    }

    fn validation(err: AppError) -> ValidationErrors {
        match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unique_index_conflict_is_reported_as_duplicate() {
        let media = tempfile::tempdir().unwrap();
        let service = service(media.path()).await;

        service
            .persist(None, candidate(1), pdf(), FileChange::Keep)
            .await
            .unwrap();

        // skips the policy, as a concurrent writer would
        let err = service
            .persist(None, candidate(1), pdf(), FileChange::Keep)
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.non_field_messages(), [DUPLICATE_BOOK]);
        assert_eq!(errors.fields().count(), 1);

        assert_eq!(stored_files(&media), 1);
        assert_eq!(service.repo().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_author_reference_is_an_author_error() {
        let media = tempfile::tempdir().unwrap();
        let service = service(media.path()).await;

        let err = service
            .persist(None, candidate(99), pdf(), FileChange::Keep)
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.messages("author"), [unknown_author(99)]);
        assert!(errors.non_field_messages().is_empty());

        assert_eq!(stored_files(&media), 0);
        assert!(service.repo().list().await.unwrap().is_empty());
    }
}

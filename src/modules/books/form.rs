//! Multipart book form: parsing, field cleaning and merge with the stored
//! record.

use axum::extract::Multipart;
use bytes::Bytes;
use libris_http::AppError;
use libris_kernel::ValidationErrors;

use super::models::{Book, BookCandidate, BookType, LABEL_MAX_CHARS, TITLE_MAX_CHARS};
use super::policy;
use super::upload::{check_book_file, check_cover_image};
use crate::utils::fields::{required_text, WriteMode, REQUIRED};

pub const NO_FILE: &str = "No file was submitted.";
pub const NOT_A_FILE: &str = "The submitted data was not a file. Check the encoding type on the form.";
pub const NOT_AN_INTEGER: &str = "A valid integer is required.";

fn invalid_pk(raw: &str) -> String {
    format!("Incorrect type. Expected pk value, received \"{raw}\".")
}

fn invalid_choice(raw: &str) -> String {
    format!("\"{raw}\" is not a valid choice.")
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Default)]
enum FilePart {
    #[default]
    Absent,
    /// Text part where a file was expected; empty text clears.
    Text(String),
    File(Upload),
}

/// Raw form as submitted. Unknown parts are ignored; repeated parts keep the
/// last value.
#[derive(Debug, Default)]
pub struct BookForm {
    title: Option<String>,
    author: Option<String>,
    year: Option<String>,
    genre: Option<String>,
    category: Option<String>,
    publisher: Option<String>,
    book_type: Option<String>,
    book_file: FilePart,
    cover_image: FilePart,
}

/// What happens to a stored file on write.
#[derive(Debug)]
pub enum FileChange {
    Keep,
    Clear,
    Replace(Upload),
}

#[derive(Debug)]
pub struct BookSubmission {
    pub candidate: BookCandidate,
    pub book_file: FileChange,
    pub cover_image: FileChange,
}

impl BookForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let part = match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|err| AppError::bad_request(err.body_text()))?;
                    FilePart::File(Upload { file_name, bytes })
                }
                None => FilePart::Text(
                    field
                        .text()
                        .await
                        .map_err(|err| AppError::bad_request(err.body_text()))?,
                ),
            };
            form.set(&name, part);
        }
        Ok(form)
    }

    fn set(&mut self, name: &str, part: FilePart) {
        let text = match part {
            FilePart::Text(text) => text,
            file => {
                match name {
                    "book_file" => self.book_file = file,
                    "cover_image" => self.cover_image = file,
                    // file parts for scalar fields are ignored
                    _ => {}
                }
                return;
            }
        };
        let slot = match name {
            "title" => &mut self.title,
            "author" => &mut self.author,
            "year" => &mut self.year,
            "genre" => &mut self.genre,
            "category" => &mut self.category,
            "publisher" => &mut self.publisher,
            "book_type" => &mut self.book_type,
            "book_file" => {
                self.book_file = FilePart::Text(text);
                return;
            }
            "cover_image" => {
                self.cover_image = FilePart::Text(text);
                return;
            }
            _ => return,
        };
        *slot = Some(text);
    }

    /// Set a text field directly, as if it had been submitted.
    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, FilePart::Text(value.into()));
        self
    }

    /// Attach a file part directly, as if it had been submitted.
    pub fn with_file(mut self, name: &str, file_name: &str, bytes: impl Into<Bytes>) -> Self {
        self.set(
            name,
            FilePart::File(Upload {
                file_name: file_name.to_string(),
                bytes: bytes.into(),
            }),
        );
        self
    }

    /// Clean every field and merge with `current` according to `mode`.
    /// All field errors are collected before returning.
    pub fn resolve(
        self,
        mode: WriteMode,
        current: Option<&Book>,
    ) -> Result<BookSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(
            &mut errors,
            "title",
            mode.pick(self.title, current.map(|b| b.title.clone())),
            TITLE_MAX_CHARS,
        );
        let genre = required_text(
            &mut errors,
            "genre",
            mode.pick(self.genre, current.map(|b| b.genre.clone())),
            LABEL_MAX_CHARS,
        );
        let category = required_text(
            &mut errors,
            "category",
            mode.pick(self.category, current.map(|b| b.category.clone())),
            LABEL_MAX_CHARS,
        );
        let publisher = required_text(
            &mut errors,
            "publisher",
            mode.pick(self.publisher, current.map(|b| b.publisher.clone())),
            LABEL_MAX_CHARS,
        );

        let author = match mode.pick(self.author, current.map(|b| b.author.to_string())) {
            None => {
                errors.add_field("author", REQUIRED);
                None
            }
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(author) => Some(author),
                Err(_) => {
                    errors.add_field("author", invalid_pk(&raw));
                    None
                }
            },
        };

        let year = match mode.pick(self.year, current.map(|b| b.year.to_string())) {
            None => {
                errors.add_field("year", REQUIRED);
                None
            }
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(year) => match policy::check_year(year) {
                    Ok(()) => Some(year),
                    Err(message) => {
                        errors.add_field("year", message);
                        None
                    }
                },
                Err(_) => {
                    errors.add_field("year", NOT_AN_INTEGER);
                    None
                }
            },
        };

        // optional with a default: an omitted value keeps the stored one
        let book_type = match self.book_type {
            None => Some(current.map(|b| b.book_type).unwrap_or_default()),
            Some(raw) => match BookType::parse(raw.trim()) {
                Some(book_type) => Some(book_type),
                None => {
                    errors.add_field("book_type", invalid_choice(&raw));
                    None
                }
            },
        };

        let book_file = match self.book_file {
            FilePart::File(upload) => match check_book_file(&upload.file_name, upload.size()) {
                Ok(_) => FileChange::Replace(upload),
                Err(rejection) => {
                    errors.add_field("book_file", rejection.to_string());
                    FileChange::Keep
                }
            },
            FilePart::Absent if mode == WriteMode::Partial => FileChange::Keep,
            FilePart::Absent => {
                errors.add_field("book_file", NO_FILE);
                FileChange::Keep
            }
            FilePart::Text(text) if text.is_empty() && mode == WriteMode::Partial => {
                FileChange::Keep
            }
            FilePart::Text(text) if text.is_empty() => {
                errors.add_field("book_file", NO_FILE);
                FileChange::Keep
            }
            FilePart::Text(_) => {
                errors.add_field("book_file", NOT_A_FILE);
                FileChange::Keep
            }
        };

        let cover_image = match self.cover_image {
            FilePart::Absent => FileChange::Keep,
            FilePart::Text(text) if text.is_empty() => FileChange::Clear,
            FilePart::Text(_) => {
                errors.add_field("cover_image", NOT_A_FILE);
                FileChange::Keep
            }
            FilePart::File(upload) => match check_cover_image(&upload.file_name, upload.size()) {
                Ok(_) => FileChange::Replace(upload),
                Err(rejection) => {
                    errors.add_field("cover_image", rejection.to_string());
                    FileChange::Keep
                }
            },
        };

        match (title, author, year, genre, category, publisher, book_type) {
            (
                Some(title),
                Some(author),
                Some(year),
                Some(genre),
                Some(category),
                Some(publisher),
                Some(book_type),
            ) if errors.is_empty() => Ok(BookSubmission {
                candidate: BookCandidate {
                    title,
                    author,
                    year,
                    genre,
                    category,
                    publisher,
                    book_type,
                },
                book_file,
                cover_image,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::policy::YEAR_OUT_OF_RANGE;
    use crate::utils::fields::BLANK;

    fn complete() -> BookForm {
        BookForm::default()
            .with_text("title", "Маленький принц")
            .with_text("author", "1")
            .with_text("year", "1943")
            .with_text("genre", "Сказка")
            .with_text("category", "Художественная литература")
            .with_text("publisher", "Эксмо")
            .with_file("book_file", "prince.pdf", &b"%PDF-1.4"[..])
    }

    fn stored() -> Book {
        Book {
            id: 3,
            title: "Физика".to_string(),
            author: 2,
            author_name: "Пёрышкин".to_string(),
            year: 2020,
            genre: "Наука".to_string(),
            category: "Учебник".to_string(),
            publisher: "Дрофа".to_string(),
            cover_image: Some("covers/a.png".to_string()),
            book_file: "books/a.pdf".to_string(),
            book_type: BookType::Textbook,
        }
    }

    #[test]
    fn complete_form_defaults_to_fiction() {
        let submission = complete().resolve(WriteMode::Create, None).unwrap();
        assert_eq!(submission.candidate.book_type, BookType::Fiction);
        assert_eq!(submission.candidate.year, 1943);
        assert!(matches!(submission.book_file, FileChange::Replace(_)));
        assert!(matches!(submission.cover_image, FileChange::Keep));
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = BookForm::default()
            .resolve(WriteMode::Create, None)
            .unwrap_err();
        for field in ["title", "author", "year", "genre", "category", "publisher"] {
            assert_eq!(errors.messages(field), [REQUIRED], "{field}");
        }
        assert_eq!(errors.messages("book_file"), [NO_FILE]);
        assert!(errors.messages("book_type").is_empty());
    }

    #[test]
    fn malformed_scalars_are_field_errors() {
        let errors = complete()
            .with_text("year", "nineteen")
            .with_text("author", "abc")
            .with_text("book_type", "poetry")
            .with_text("title", " ")
            .resolve(WriteMode::Create, None)
            .unwrap_err();

        assert_eq!(errors.messages("year"), [NOT_AN_INTEGER]);
        assert_eq!(errors.messages("author"), [invalid_pk("abc")]);
        assert_eq!(errors.messages("book_type"), [invalid_choice("poetry")]);
        assert_eq!(errors.messages("title"), [BLANK]);
    }

    #[test]
    fn year_range_is_reported_with_other_field_errors() {
        let errors = complete()
            .with_text("year", "999")
            .with_text("publisher", "")
            .resolve(WriteMode::Create, None)
            .unwrap_err();
        assert_eq!(errors.messages("year"), [YEAR_OUT_OF_RANGE]);
        assert_eq!(errors.messages("publisher"), [BLANK]);
    }

    #[test]
    fn text_book_file_is_rejected() {
        let errors = complete()
            .with_file("book_file", "notes.txt", &b"plain"[..])
            .resolve(WriteMode::Create, None)
            .unwrap_err();
        let messages = errors.messages("book_file");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("text/plain"));
    }

    #[test]
    fn partial_update_merges_over_stored_book() {
        let book = stored();
        let submission = BookForm::default()
            .with_text("year", "2021")
            .resolve(WriteMode::Partial, Some(&book))
            .unwrap();

        assert_eq!(submission.candidate.year, 2021);
        assert_eq!(submission.candidate.title, "Физика");
        assert_eq!(submission.candidate.author, 2);
        assert_eq!(submission.candidate.book_type, BookType::Textbook);
        assert!(matches!(submission.book_file, FileChange::Keep));
    }

    #[test]
    fn full_update_requires_fields_again() {
        let book = stored();
        let errors = BookForm::default()
            .with_text("year", "2021")
            .resolve(WriteMode::Replace, Some(&book))
            .unwrap_err();
        assert_eq!(errors.messages("title"), [REQUIRED]);
        assert_eq!(errors.messages("book_file"), [NO_FILE]);
        // book_type has a default, so it is not required
        assert!(errors.messages("book_type").is_empty());
    }

    #[test]
    fn empty_cover_part_clears_the_cover() {
        let book = stored();
        let submission = BookForm::default()
            .with_text("cover_image", "")
            .resolve(WriteMode::Partial, Some(&book))
            .unwrap();
        assert!(matches!(submission.cover_image, FileChange::Clear));
    }

    #[test]
    fn cover_must_be_an_image() {
        let errors = complete()
            .with_file("cover_image", "cover.pdf", &b"%PDF"[..])
            .resolve(WriteMode::Create, None)
            .unwrap_err();
        assert_eq!(errors.messages("cover_image").len(), 1);
    }
}

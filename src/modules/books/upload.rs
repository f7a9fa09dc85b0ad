//! Acceptance check for uploaded files.
//!
//! The content type comes from the file name alone; bytes are never
//! inspected. This is a policy gate, not a sandbox.

use thiserror::Error;

/// 50 MiB, inclusive.
pub const MAX_BOOK_FILE_BYTES: u64 = 50 * 1024 * 1024;
pub const ALLOWED_BOOK_TYPES: [&str; 2] = ["application/pdf", "application/epub+zip"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Cannot determine file type.")]
    UnknownType,

    #[error("Unsupported file type: {found}. Allowed: {}.", ALLOWED_BOOK_TYPES.join(", "))]
    UnsupportedType { found: &'static str },

    #[error("File too large ({size} bytes). Maximum size is 50 MB.")]
    TooLarge { size: u64 },

    #[error("The submitted file is empty.")]
    Empty,

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
}

/// Resolve a content type from the file extension, case-insensitively.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    mime_guess::from_path(file_name).first_raw()
}

/// Accept a book file: PDF or EPUB, non-empty, at most [`MAX_BOOK_FILE_BYTES`].
pub fn check_book_file(file_name: &str, size: u64) -> Result<&'static str, UploadRejection> {
    let content_type = content_type_for(file_name).ok_or(UploadRejection::UnknownType)?;
    if !ALLOWED_BOOK_TYPES.contains(&content_type) {
        return Err(UploadRejection::UnsupportedType {
            found: content_type,
        });
    }
    if size == 0 {
        return Err(UploadRejection::Empty);
    }
    if size > MAX_BOOK_FILE_BYTES {
        return Err(UploadRejection::TooLarge { size });
    }
    Ok(content_type)
}

/// Accept a cover image: any `image/*` type, non-empty.
pub fn check_cover_image(file_name: &str, size: u64) -> Result<&'static str, UploadRejection> {
    match content_type_for(file_name) {
        Some(content_type) if content_type.starts_with("image/") => {
            if size == 0 {
                Err(UploadRejection::Empty)
            } else {
                Ok(content_type)
            }
        }
        _ => Err(UploadRejection::NotAnImage),
    }
}

//! Storage for uploaded book files and cover images under the media root.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    BookFile,
    CoverImage,
}

impl MediaKind {
    fn dir(self) -> &'static str {
        match self {
            Self::BookFile => "books",
            Self::CoverImage => "covers",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the per-kind directories.
    pub async fn prepare(&self) -> io::Result<()> {
        for kind in [MediaKind::BookFile, MediaKind::CoverImage] {
            tokio::fs::create_dir_all(self.root.join(kind.dir())).await?;
        }
        Ok(())
    }

    /// Relative path for a new upload, keeping the original extension.
    pub fn reserve(&self, kind: MediaKind, original_name: &str) -> String {
        let id = Uuid::now_v7();
        match Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}/{id}.{}", kind.dir(), ext.to_ascii_lowercase()),
            None => format!("{}/{id}", kind.dir()),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn write(&self, relative: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.path(relative), bytes).await
    }

    /// Best-effort removal of files written for a write that did not commit.
    pub async fn discard(&self, relatives: &[String]) {
        for relative in relatives {
            if let Err(err) = tokio::fs::remove_file(self.path(relative)).await {
                tracing::warn!(path = %relative, error = %err, "failed to discard upload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_are_unique_and_keep_extension() {
        let store = MediaStore::new("media");
        let a = store.reserve(MediaKind::BookFile, "Маленький принц.PDF");
        let b = store.reserve(MediaKind::BookFile, "Маленький принц.PDF");

        assert_ne!(a, b);
        assert!(a.starts_with("books/"));
        assert!(a.ends_with(".pdf"));
        assert!(store
            .reserve(MediaKind::CoverImage, "cover.png")
            .starts_with("covers/"));
    }

    #[tokio::test]
    async fn writes_and_discards_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        store.prepare().await.unwrap();

        let relative = store.reserve(MediaKind::BookFile, "a.epub");
        store.write(&relative, b"epub").await.unwrap();
        assert_eq!(std::fs::read(store.path(&relative)).unwrap(), b"epub");

        store.discard(&[relative.clone()]).await;
        assert!(!store.path(&relative).exists());
    }
}

use std::path::Path;

use crate::document::{DEFAULT_MAX_FILE_SIZE, DOCUMENT_EXTENSIONS, DocumentError};

/// Reads UTF-8 source and documentation files with a size cap.
#[derive(Debug, Clone)]
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl TextLoader {
    /// Read the file at `path` as text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::FileTooLarge`] above the size cap,
    /// [`DocumentError::UnsupportedFormat`] for non UTF-8 content and
    /// [`DocumentError::Io`] when the file cannot be read.
    pub async fn load(&self, path: &Path) -> Result<String, DocumentError> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > self.max_file_size {
            return Err(DocumentError::FileTooLarge(meta.len()));
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(
                DocumentError::UnsupportedFormat(format!("{} is not UTF-8", path.display())),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `path` has a documentation extension.
    #[must_use]
    pub fn is_document(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, "hello world").unwrap();

        let content = TextLoader::default().load(&file).await.unwrap();
        assert_eq!(content, "hello world");
    }

    #[tokio::test]
    async fn load_nonexistent_file() {
        let result = TextLoader::default()
            .load(Path::new("/nonexistent/file.txt"))
            .await;
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[tokio::test]
    async fn load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.md");
        std::fs::write(&file, "").unwrap();

        let content = TextLoader::default().load(&file).await.unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn binary_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blob.txt");
        std::fs::write(&file, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let result = TextLoader::default().load(&file).await;
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn file_too_large_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, "x").unwrap();

        let loader = TextLoader { max_file_size: 0 };
        let result = loader.load(&file).await;
        assert!(matches!(result, Err(DocumentError::FileTooLarge(1))));
    }

    #[test]
    fn document_extensions() {
        assert!(TextLoader::is_document(Path::new("docs/README.md")));
        assert!(TextLoader::is_document(Path::new("notes.MARKDOWN")));
        assert!(TextLoader::is_document(Path::new("guide.rst")));
        assert!(TextLoader::is_document(Path::new("a.txt")));
        assert!(TextLoader::is_document(Path::new("site/index.html")));
        assert!(TextLoader::is_document(Path::new("legacy/FAQ.HTM")));
        assert!(!TextLoader::is_document(Path::new("Main.java")));
        assert!(!TextLoader::is_document(Path::new("Makefile")));
    }
}

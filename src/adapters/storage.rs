use crate::core::Storage;
use crate::utils::error::Result;
use std::path::PathBuf;

/// Files rooted at the configured data directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::trace!("wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("data"));

        storage.write_file("1100.json", b"{}").await.unwrap();

        let written = std::fs::read(temp_dir.path().join("data").join("1100.json")).unwrap();
        assert_eq!(written, b"{}");
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.write_file("tweets.csv", b"id\n1\n").await.unwrap();
        storage.write_file("tweets.csv", b"id\n").await.unwrap();

        assert_eq!(std::fs::read(temp_dir.path().join("tweets.csv")).unwrap(), b"id\n");
    }

    #[tokio::test]
    async fn test_write_into_file_path_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("blocker"), b"").unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("blocker"));

        let err = storage.write_file("1100.json", b"{}").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::SearchError::IoError(_)));
    }
}

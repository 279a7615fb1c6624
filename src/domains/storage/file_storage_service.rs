use async_trait::async_trait;
use log::debug;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Object storage error: {0}")]
    ObjectStore(String),
}

pub type FileStorageResult<T> = Result<T, FileStorageError>;

/// Destination for exported files, addressed by a relative `/`-separated key.
#[async_trait]
pub trait FileStorageService: Send + Sync {
    /// Store `data` under `key`, replacing anything already there.
    /// Returns the number of bytes written.
    async fn put(&self, key: &str, data: Vec<u8>) -> FileStorageResult<u64>;

    /// Human readable location of `key`, used in logs.
    fn describe(&self, key: &str) -> String;
}

// --- Local File Storage Implementation ---

pub struct LocalFileStorageService {
    base_path: PathBuf,
}

impl LocalFileStorageService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Keys must stay below the base directory.
    fn resolve(&self, key: &str) -> FileStorageResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(FileStorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl FileStorageService for LocalFileStorageService {
    async fn put(&self, key: &str, data: Vec<u8>) -> FileStorageResult<u64> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        debug!("writing file to local file in {}", self.base_path.display());
        fs::write(&path, &data).await?;
        Ok(data.len() as u64)
    }

    fn describe(&self, key: &str) -> String {
        self.base_path.join(key).display().to_string()
    }
}

pub mod cloud_storage;
pub mod file_storage_service;

pub use cloud_storage::S3FileStorageService;
pub use file_storage_service::{
    FileStorageError, FileStorageResult, FileStorageService, LocalFileStorageService,
};

use std::sync::Arc;

use crate::config::Destination;

/// Build the storage backend for the configured destination.
pub async fn from_destination(destination: &Destination) -> Arc<dyn FileStorageService> {
    match destination {
        Destination::S3 { bucket } => Arc::new(S3FileStorageService::from_env(bucket).await),
        Destination::Local { directory } => Arc::new(LocalFileStorageService::new(directory)),
    }
}

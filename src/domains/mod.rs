pub mod export;
pub mod storage;

pub use export::{ExportJob, ExportService, ExportWriter, FileFormat};
pub use storage::{FileStorageService, LocalFileStorageService, S3FileStorageService};

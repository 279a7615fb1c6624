pub mod types;
pub mod repository;
pub mod schemas;
pub mod reshape;
pub mod writers;
pub mod writer;
pub mod service;

pub use repository::{ExportLogRepository, PgExportLogRepository, SqliteExportLogRepository};
pub use service::ExportService;
pub use types::{
    ExportError, ExportJob, ExportedFile, FileFormat, JobFailure, JobStage, LocationDay, MeasurementRow,
    EXPORT_FIELDS,
};
pub use writer::{partition_key, ExportWriter, TableEncoder, WriterFactory};

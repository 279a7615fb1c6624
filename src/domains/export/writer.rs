use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use log::debug;
use std::sync::Arc;

use crate::domains::export::types::{ExportError, ExportJob, ExportedFile, FileFormat};
use crate::domains::export::writers::{CsvFileWriter, ParquetFileWriter};
use crate::domains::storage::FileStorageService;

/// Turns a table into the bytes of one file.
pub trait TableEncoder: Send + Sync {
    fn encode(&self, table: &RecordBatch) -> Result<Vec<u8>, ExportError>;

    fn format(&self) -> FileFormat;
}

/// Writer factory for creating format-specific encoders
pub struct WriterFactory;

impl WriterFactory {
    pub fn create_encoder(format: FileFormat) -> Box<dyn TableEncoder> {
        match format {
            FileFormat::Csv => Box::new(CsvFileWriter::default()),
            FileFormat::CsvGz => Box::new(CsvFileWriter::compressed()),
            FileFormat::Parquet => Box::new(ParquetFileWriter::new()),
        }
    }
}

/// Storage key for a job's file:
/// `records/{format}/country={C}/locationid={L}/year={Y}/month={M}/loc-{L}-{Y}{M}{D}.{ext}`.
///
/// Month and day are not zero padded; existing consumers rely on these exact names.
pub fn partition_key(format: FileFormat, country: &str, job: &ExportJob) -> String {
    let (year, month, day) = (job.day.year(), job.day.month(), job.day.day());
    format!(
        "records/{format}/country={country}/locationid={location}/year={year}/month={month}/loc-{location}-{year}{month}{day}.{ext}",
        format = format.as_str(),
        country = country,
        location = job.location_id,
        year = year,
        month = month,
        day = day,
        ext = format.file_extension(),
    )
}

/// Encodes tables in the configured format and stores them.
pub struct ExportWriter {
    encoder: Box<dyn TableEncoder>,
    storage: Arc<dyn FileStorageService>,
}

impl ExportWriter {
    pub fn new(format: FileFormat, storage: Arc<dyn FileStorageService>) -> Self {
        Self {
            encoder: WriterFactory::create_encoder(format),
            storage,
        }
    }

    pub fn format(&self) -> FileFormat {
        self.encoder.format()
    }

    /// Encode `table` and store it under `key`, overwriting any previous file.
    pub async fn write(&self, job: &ExportJob, table: &RecordBatch, key: &str) -> Result<ExportedFile, ExportError> {
        debug!("writing file to {} format", self.format());
        let data = self.encoder.encode(table)?;
        let bytes = data.len();

        self.storage.put(key, data).await?;
        debug!("wrote {} bytes to {}", bytes, self.storage.describe(key));

        Ok(ExportedFile {
            job: *job,
            key: key.to_string(),
            rows: table.num_rows(),
            bytes,
        })
    }
}

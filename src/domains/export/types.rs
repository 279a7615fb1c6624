use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domains::storage::FileStorageError;
use crate::errors::{ConfigError, DbError};

/// Output columns written for every export, in file order.
pub const EXPORT_FIELDS: [&str; 6] = ["location", "datetime", "lat", "lon", "measurand", "value"];

/// One unit of exportable work: every measurement for a location on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExportJob {
    #[sqlx(rename = "sensor_nodes_id")]
    pub location_id: i64,
    pub day: NaiveDate,
}

impl ExportJob {
    pub fn new(location_id: i64, day: NaiveDate) -> Self {
        Self { location_id, day }
    }
}

impl fmt::Display for ExportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.location_id, self.day)
    }
}

/// A single sensor reading as served by the measurement store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeasurementRow {
    pub location: String,
    pub datetime: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub measurand: String,
    pub value: f64,
    pub country: Option<String>,
    pub sensor_nodes_id: i64,
    pub sensor_systems_id: i64,
}

/// Location/day with the number of measurements recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationDay {
    #[sqlx(rename = "sensor_nodes_id")]
    pub location_id: i64,
    pub day: NaiveDate,
    pub measurements: i64,
}

/// Export formats supported by the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,
    CsvGz,
    Parquet,
}

impl FileFormat {
    /// Name used both in the partition path and as the file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::CsvGz => "csv.gz",
            FileFormat::Parquet => "parquet",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "csv.gz" => Ok(FileFormat::CsvGz),
            "parquet" => Ok(FileFormat::Parquet),
            // Recognised, but there is no JSON writer.
            "json" => Err(ConfigError::UnsupportedFormat("json".to_string())),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Artifact produced by a successful job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub job: ExportJob,
    pub key: String,
    pub rows: usize,
    pub bytes: usize,
}

/// Errors raised while processing a single export job
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("No measurements found")]
    NoMeasurements,

    #[error("Column '{0}' is not present in the measurement data")]
    MissingColumn(String),

    #[error("Measurement data has no country")]
    MissingCountry,

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Storage error: {0}")]
    Storage(#[from] FileStorageError),

    #[error("Job did not finish within {0:?}")]
    Timeout(Duration),
}

impl From<arrow::error::ArrowError> for ExportError {
    fn from(error: arrow::error::ArrowError) -> Self {
        ExportError::Serialization(error.to_string())
    }
}

impl From<parquet::errors::ParquetError> for ExportError {
    fn from(error: parquet::errors::ParquetError) -> Self {
        ExportError::Serialization(error.to_string())
    }
}

/// Step of the job pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStage {
    Fetch,
    Reshape,
    Write,
    MarkExported,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Fetch => "fetch",
            JobStage::Reshape => "reshape",
            JobStage::Write => "write",
            JobStage::MarkExported => "mark exported",
        };
        f.write_str(name)
    }
}

/// Tagged failure of one job. `stage` is `None` when the job as a whole
/// was abandoned, e.g. on timeout.
#[derive(Debug, Error)]
#[error("{}{}: {}", .job, stage_suffix(.stage), .source)]
pub struct JobFailure {
    pub job: ExportJob,
    pub stage: Option<JobStage>,
    #[source]
    pub source: ExportError,
}

impl JobFailure {
    pub fn at(job: ExportJob, stage: JobStage, source: ExportError) -> Self {
        Self {
            job,
            stage: Some(stage),
            source,
        }
    }
}

fn stage_suffix(stage: &Option<JobStage>) -> String {
    stage.map(|s| format!(" ({})", s)).unwrap_or_default()
}

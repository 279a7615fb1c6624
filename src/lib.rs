//! Exports per-location, per-day measurement data from the measurement store
//! into partitioned CSV, gzipped CSV or Parquet files on local disk or S3.

pub mod config;
pub mod database;
pub mod domains;
pub mod errors;

mod db_migration;

#[cfg(test)]
mod test_support;

pub use config::{Destination, Settings};
pub use domains::export::{ExportJob, ExportService, ExportWriter, FileFormat};
pub use errors::{ServiceError, ServiceResult};

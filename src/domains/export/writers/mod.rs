pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::CsvFileWriter;
pub use parquet_writer::ParquetFileWriter;

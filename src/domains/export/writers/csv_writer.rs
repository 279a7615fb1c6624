use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::io::Write;

use crate::domains::export::types::{ExportError, FileFormat};
use crate::domains::export::writer::TableEncoder;

/// Plain or gzip-compressed CSV with a header row and no index column.
#[derive(Debug, Clone, Default)]
pub struct CsvFileWriter {
    compress: bool,
}

impl CsvFileWriter {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    pub fn compressed() -> Self {
        Self::new(true)
    }

    fn write_csv(&self, table: &RecordBatch) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        {
            let mut writer = WriterBuilder::new().with_header(true).build(&mut buffer);
            writer.write(table)?;
        }
        Ok(buffer)
    }

    fn gzip(data: &[u8]) -> Result<Vec<u8>, ExportError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| ExportError::Compression(format!("Compression write error: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| ExportError::Compression(format!("Compression finish error: {}", e)))
    }
}

impl TableEncoder for CsvFileWriter {
    fn encode(&self, table: &RecordBatch) -> Result<Vec<u8>, ExportError> {
        let csv = self.write_csv(table)?;
        if !self.compress {
            return Ok(csv);
        }
        debug!("compressing {} bytes of csv", csv.len());
        Self::gzip(&csv)
    }

    fn format(&self) -> FileFormat {
        if self.compress {
            FileFormat::CsvGz
        } else {
            FileFormat::Csv
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::export::reshape::reshape;
    use crate::domains::export::schemas::measurement_batch;
    use crate::domains::export::types::EXPORT_FIELDS;
    use crate::test_support::sample_rows;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn export_table(rows: usize) -> RecordBatch {
        reshape(measurement_batch(&sample_rows(rows, "US")).unwrap(), &EXPORT_FIELDS).unwrap()
    }

    #[test]
    fn test_csv_has_header_and_one_line_per_row() {
        let bytes = CsvFileWriter::default().encode(&export_table(3)).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, EXPORT_FIELDS.to_vec());

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][0], "site-1");
        assert!(records[0][1].starts_with("2021-08-08T01:00:00"));
        assert_eq!(&records[0][4], "pm25");
    }

    #[test]
    fn test_csv_output_is_deterministic() {
        let writer = CsvFileWriter::default();
        let table = export_table(5);
        assert_eq!(writer.encode(&table).unwrap(), writer.encode(&table).unwrap());
    }

    #[test]
    fn test_compressed_csv_decompresses_to_plain_csv() {
        let table = export_table(4);
        let plain = CsvFileWriter::default().encode(&table).unwrap();
        let compressed = CsvFileWriter::compressed().encode(&table).unwrap();
        assert_ne!(plain, compressed);

        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice()).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, plain);
        assert_eq!(CsvFileWriter::compressed().format(), FileFormat::CsvGz);
    }

    #[test]
    fn test_default_writer_is_plain_csv() {
        let table = export_table(2);
        assert_eq!(CsvFileWriter::default().format(), FileFormat::Csv);
        assert_eq!(
            CsvFileWriter::default().encode(&table).unwrap(),
            CsvFileWriter::new(false).encode(&table).unwrap()
        );
        assert_eq!(CsvFileWriter::new(true).format(), FileFormat::CsvGz);
    }
}

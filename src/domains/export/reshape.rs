use arrow::record_batch::RecordBatch;

use super::types::ExportError;

/// Project `table` down to `fields`, in that order.
///
/// An empty table is returned untouched. A field missing from a non-empty
/// table is an error rather than being skipped.
pub fn reshape(table: RecordBatch, fields: &[&str]) -> Result<RecordBatch, ExportError> {
    if table.num_rows() == 0 {
        return Ok(table);
    }

    let schema = table.schema();
    let indices = fields
        .iter()
        .map(|field| {
            schema
                .index_of(field)
                .map_err(|_| ExportError::MissingColumn(field.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    table
        .project(&indices)
        .map_err(|e| ExportError::Schema(e.to_string()))
}

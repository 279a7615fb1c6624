//! Arrow schema for rows served by the measurement store.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::{Arc, LazyLock};

use crate::domains::export::types::{ExportError, MeasurementRow};

/// Offset form, which arrow can format without a timezone database.
const UTC_OFFSET: &str = "+00:00";

static MEASUREMENT_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| Arc::new(measurement_schema()));

pub fn measurement_schema() -> Schema {
    Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("datetime", DataType::Timestamp(TimeUnit::Microsecond, Some(UTC_OFFSET.into())), false),
        Field::new("lat", DataType::Float64, true),
        Field::new("lon", DataType::Float64, true),
        Field::new("measurand", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
        Field::new("country", DataType::Utf8, true),
        Field::new("sensor_nodes_id", DataType::Int64, false),
        Field::new("sensor_systems_id", DataType::Int64, false),
    ])
}

pub fn measurement_schema_ref() -> SchemaRef {
    MEASUREMENT_SCHEMA.clone()
}

/// Columnar copy of `rows`. Row order is preserved.
pub fn measurement_batch(rows: &[MeasurementRow]) -> Result<RecordBatch, ExportError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.location.as_str()))),
        Arc::new(
            TimestampMicrosecondArray::from(rows.iter().map(|r| r.datetime.timestamp_micros()).collect::<Vec<_>>())
                .with_timezone(UTC_OFFSET),
        ),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.lat).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.lon).collect::<Vec<_>>())),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.measurand.as_str()))),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.value).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.country.as_deref()).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.sensor_nodes_id).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.sensor_systems_id).collect::<Vec<_>>())),
    ];

    RecordBatch::try_new(measurement_schema_ref(), columns).map_err(|e| ExportError::Schema(e.to_string()))
}

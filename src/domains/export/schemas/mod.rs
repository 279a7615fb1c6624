pub mod measurement;

pub use measurement::{measurement_batch, measurement_schema, measurement_schema_ref};

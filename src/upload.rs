//! Upload processing: decode an uploaded file, infer its column types and package the result
//! as a serializable response.
//!
//! ```rust
//! use column_infer::infer::InferenceOptions;
//! use column_infer::ingestion::IngestionOptions;
//! use column_infer::upload::process_upload;
//!
//! let body = b"id,joined\n1,2024-01-05\n2,2024-02-11\n";
//! let response = process_upload(
//!     "people.csv",
//!     body,
//!     &IngestionOptions::default(),
//!     &InferenceOptions::default(),
//! )
//! .unwrap();
//!
//! let json = serde_json::to_value(&response).unwrap();
//! assert_eq!(json["types"]["id"], "int8");
//! assert_eq!(json["data"][0]["joined"], "2024-01-05T00:00:00");
//! ```

use std::path::Path;

use serde::Serialize;

use crate::error::{InferenceError, InferenceResult};
use crate::infer::{InferenceOptions, TypeReport, infer_and_convert};
use crate::ingestion::unified::ingest_named_bytes;
use crate::ingestion::{IngestionFormat, IngestionOptions};
use crate::observability::Severity;
use crate::types::{DataSet, Value};

/// One row, keyed by column name in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Successful upload result.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Converted rows.
    pub data: Vec<Record>,
    /// Final type per column.
    pub types: TypeReport,
    /// Warning-level diagnostics, e.g. override fallbacks and chunk disagreements.
    pub warnings: Vec<String>,
}

/// Error payload returned to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&InferenceError> for ErrorResponse {
    fn from(err: &InferenceError) -> Self {
        Self { error: err.to_string() }
    }
}

/// Decode `bytes`, infer and convert every column, and build the response.
///
/// The format comes from `ingestion.format` or, when unset, from the extension of
/// `file_name`.
pub fn process_upload(
    file_name: &str,
    bytes: &[u8],
    ingestion: &IngestionOptions,
    inference: &InferenceOptions,
) -> InferenceResult<UploadResponse> {
    let name = Path::new(file_name);
    let format = match ingestion.format {
        Some(f) => f,
        None => IngestionFormat::from_path(name)?,
    };

    let mut dataset = ingest_named_bytes(name, bytes, format, ingestion)?;
    let types = infer_and_convert(&mut dataset, inference)?;

    let warnings = types
        .diagnostics_at_or_above(Severity::Warning)
        .map(ToString::to_string)
        .collect();

    Ok(UploadResponse {
        data: records(&dataset),
        types,
        warnings,
    })
}

/// Row-oriented view of a converted table.
pub fn records(dataset: &DataSet) -> Vec<Record> {
    dataset
        .rows
        .iter()
        .map(|row| {
            dataset
                .schema
                .fields
                .iter()
                .zip(row)
                .map(|(field, value)| (field.name.clone(), to_json(value)))
                .collect()
        })
        .collect()
}

/// JSON rendering of one cell. Timestamps become ISO-8601 strings, complex numbers `a+bj`
/// strings and non-finite floats `null`.
pub fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Int8(v) => Json::from(*v),
        Value::Int16(v) => Json::from(*v),
        Value::Int32(v) => Json::from(*v),
        Value::Int64(v) => Json::from(*v),
        // Round-trip through the shortest f32 text so 0.1f32 renders as 0.1.
        Value::Float32(v) => float_json(v.to_string().parse().unwrap_or(f64::NAN)),
        Value::Float64(v) => float_json(*v),
        Value::Complex(c) => Json::String(c.to_string()),
        Value::DateTime(dt) => Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        Value::Category(level) => Json::String(level.to_string()),
        Value::Bool(b) => Json::Bool(*b),
        Value::Utf8(s) => Json::String(s.clone()),
    }
}

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{ErrorResponse, to_json};
    use crate::error::InferenceError;
    use crate::types::{Complex64, Value};

    #[test]
    fn renders_cells_as_json() {
        assert_eq!(to_json(&Value::Float32(0.1)), json!(0.1));
        assert_eq!(to_json(&Value::Float64(f64::INFINITY)), json!(null));
        assert_eq!(to_json(&Value::Complex(Complex64::new(1.0, -2.0))), json!("1-2j"));
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(to_json(&Value::DateTime(dt)), json!("2024-03-01T08:30:00"));
        assert_eq!(to_json(&Value::Int16(-300)), json!(-300));
        assert_eq!(to_json(&Value::Null), json!(null));
    }

    #[test]
    fn error_response_carries_the_message() {
        let err = InferenceError::UnknownColumn {
            column: "age".to_string(),
        };
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body, json!({"error": "override names unknown column 'age'"}));
    }
}

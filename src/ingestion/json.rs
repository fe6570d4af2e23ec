//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single JSON object: `{"a":1}`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Columns are the union of object keys in first-seen order; a key absent from a row is a
//! missing cell. Numbers and booleans keep their JSON type, strings go through the null
//! markers, and nested arrays/objects are kept as their JSON text.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{InferenceError, InferenceResult};
use crate::types::{DataSet, Value};

use super::{NullMarkers, raw_dataset};

/// Ingest a JSON file into a raw [`DataSet`].
pub fn ingest_json_from_path(path: impl AsRef<Path>, null_markers: &NullMarkers) -> InferenceResult<DataSet> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, null_markers)
}

/// Ingest JSON from an in-memory string into a raw [`DataSet`].
pub fn ingest_json_from_str(input: &str, null_markers: &NullMarkers) -> InferenceResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InferenceError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => ingest_json_values(&items, null_markers),
            serde_json::Value::Object(_) => ingest_json_values(std::slice::from_ref(&v), null_markers),
            _ => Err(InferenceError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| InferenceError::SchemaMismatch {
                message: format!("invalid ndjson at line {}: {}", i + 1, e),
            })?;
            values.push(v);
        }
        ingest_json_values(&values, null_markers)
    }
}

fn ingest_json_values(values: &[serde_json::Value], null_markers: &NullMarkers) -> InferenceResult<DataSet> {
    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut objects = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let obj = v.as_object().ok_or_else(|| InferenceError::SchemaMismatch {
            message: format!("row {} is not a json object", idx0 + 1),
        })?;
        for key in obj.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), headers.len());
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            let mut row = vec![Value::Null; headers.len()];
            for (key, jv) in obj {
                if let Some(&idx) = positions.get(key) {
                    row[idx] = convert_json_value(jv, null_markers);
                }
            }
            row
        })
        .collect();

    raw_dataset(headers, rows)
}

fn convert_json_value(v: &serde_json::Value, null_markers: &NullMarkers) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => n.as_f64().map_or(Value::Null, Value::Float64),
        },
        serde_json::Value::String(s) => null_markers.decode(s),
        nested => Value::Utf8(nested.to_string()),
    }
}

//! Ingestion entrypoints and implementations.
//!
//! Every reader produces a raw [`DataSet`]: one [`DataType::Utf8`] field per column, cells as
//! text (or the loose scalar the source already carried) and missing cells as
//! [`Value::Null`]. Typing is left to [`crate::infer`].
//!
//! Most callers should use [`ingest_from_path`] or [`ingest_from_bytes`] (from [`unified`]),
//! which:
//!
//! - auto-detect the format by file extension (or take it from [`IngestionOptions`])
//! - decode the input into an in-memory [`DataSet`]
//! - optionally report success/failure/alerts to an [`crate::observability::InferenceObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod unified;

use std::collections::HashSet;

use crate::error::InferenceResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

pub use unified::{ExcelSheetSelection, IngestionFormat, IngestionOptions, ingest_from_bytes, ingest_from_path};

/// Cell texts treated as missing values.
pub const DEFAULT_NULL_MARKERS: [&str; 10] = ["", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// Set of cell texts that decode to [`Value::Null`]. Cells are trimmed before matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullMarkers {
    markers: HashSet<String>,
}

impl NullMarkers {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut markers: HashSet<String> = markers.into_iter().map(Into::into).collect();
        // Blank cells are always missing.
        markers.insert(String::new());
        Self { markers }
    }

    /// Only blank cells are missing.
    pub fn blank_only() -> Self {
        Self::new(std::iter::empty::<String>())
    }

    pub fn is_null(&self, cell: &str) -> bool {
        self.markers.contains(cell.trim())
    }

    /// Decode one text cell: trimmed text, or [`Value::Null`] for a marker.
    pub fn decode(&self, cell: &str) -> Value {
        if self.is_null(cell) {
            Value::Null
        } else {
            Value::Utf8(cell.trim().to_string())
        }
    }
}

impl Default for NullMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_MARKERS)
    }
}

/// Build a raw text table. Duplicate column names and ragged rows are rejected.
pub(crate) fn raw_dataset(headers: Vec<String>, rows: Vec<Vec<Value>>) -> InferenceResult<DataSet> {
    let schema = Schema::new(headers.into_iter().map(|h| Field::new(h, DataType::Utf8)).collect());
    DataSet::try_new(schema, rows)
}

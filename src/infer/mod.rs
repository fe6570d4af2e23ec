//! Column type inference.
//!
//! [`infer_and_convert`] is the engine entry point. It:
//!
//! - validates the options, the table shape and the override specification
//! - applies overrides first (see [`overrides`])
//! - classifies every other column chunk by chunk (numeric → complex → datetime → category →
//!   text) and converts it in place
//! - returns a [`TypeReport`] built after all conversions completed
//!
//! Per-value conversion failures become missing values, and a failed override keeps its
//! column as text. Only structural problems are returned as errors.
//!
//! ```rust
//! use column_infer::infer::{infer_and_convert, InferenceOptions};
//! use column_infer::types::{DataSet, DataType, Value};
//!
//! let raw = |s: &str| Value::Utf8(s.to_string());
//! let mut ds = DataSet::from_columns(vec![
//!     ("score", vec![raw("100"), raw("200.5"), raw("NaN"), raw("300")]),
//!     ("grade", vec![raw("A"), raw("B"), raw("C"), raw("A")]),
//! ])
//! .unwrap();
//!
//! let report = infer_and_convert(&mut ds, &InferenceOptions::default()).unwrap();
//! assert_eq!(report.get("score"), Some(DataType::Float32));
//! assert_eq!(report.get("grade"), Some(DataType::Utf8));
//! ```

mod classify;
mod complex;
mod convert;
pub mod datetime;
mod numeric;
pub mod overrides;
mod report;

use std::fmt;
use std::sync::Arc;

use crate::error::{InferenceError, InferenceResult};
use crate::observability::{Emitter, InferenceObserver};
use crate::types::DataSet;

use classify::{Thresholds, classify_column};

pub use datetime::COMMON_DATE_FORMATS;
pub use numeric::FLOAT32_LIMIT;
pub use overrides::{ColumnOverride, OverrideSpec};
pub use report::TypeReport;

/// Default minimum fraction of a chunk that must parse as numbers.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.5;

/// Default distinct-value ratio below which text columns become categorical. Used for both
/// single-chunk and multi-chunk columns.
pub const DEFAULT_CATEGORY_CUTOFF: f64 = 0.1;

/// Default number of rows per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

/// Options controlling inference.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct InferenceOptions {
    /// Minimum fraction (in `[0, 1]`) of a chunk's cells that must coerce to numbers for the
    /// chunk to be numeric.
    pub numeric_threshold: f64,
    /// Distinct-value ratio (in `[0, 1]`) below which a text chunk is categorical.
    pub category_cutoff: f64,
    /// Rows per chunk. Columns no longer than this are classified in one pass.
    pub chunk_size: usize,
    /// Explicit per-column types, applied before automatic inference.
    pub overrides: OverrideSpec,
    /// Optional observer for chunk, column and diagnostic events.
    pub observer: Option<Arc<dyn InferenceObserver>>,
}

impl fmt::Debug for InferenceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceOptions")
            .field("numeric_threshold", &self.numeric_threshold)
            .field("category_cutoff", &self.category_cutoff)
            .field("chunk_size", &self.chunk_size)
            .field("overrides", &self.overrides)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
            category_cutoff: DEFAULT_CATEGORY_CUTOFF,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overrides: OverrideSpec::default(),
            observer: None,
        }
    }
}

impl InferenceOptions {
    /// Check that thresholds are finite fractions and the chunk size is positive.
    pub fn validate(&self) -> InferenceResult<()> {
        let fraction = |name: &str, v: f64| {
            if v.is_finite() && (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(InferenceError::InvalidOptions {
                    message: format!("{name} must be within [0, 1], got {v}"),
                })
            }
        };
        fraction("numeric_threshold", self.numeric_threshold)?;
        fraction("category_cutoff", self.category_cutoff)?;
        if self.chunk_size == 0 {
            return Err(InferenceError::InvalidOptions {
                message: "chunk_size must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Infer and convert the type of every column of `dataset` in place.
///
/// Fails before touching any column if the options are invalid, the table is malformed, or
/// an override names a column that does not exist.
pub fn infer_and_convert(dataset: &mut DataSet, options: &InferenceOptions) -> InferenceResult<TypeReport> {
    options.validate()?;
    dataset.validate()?;
    options.overrides.validate_against(&dataset.schema)?;

    let thresholds = Thresholds {
        numeric: options.numeric_threshold,
        category_cutoff: options.category_cutoff,
    };
    let mut emitter = Emitter::new(options.observer.as_deref());

    for (column, spec) in options.overrides.iter() {
        if let Some(idx) = dataset.schema.index_of(column) {
            overrides::apply_override(dataset, idx, spec, &mut emitter);
        }
    }

    for idx in 0..dataset.column_count() {
        if options.overrides.contains(&dataset.schema.fields[idx].name) {
            continue;
        }
        classify_column(dataset, idx, &thresholds, options.chunk_size, &mut emitter);
    }

    Ok(TypeReport::from_schema(&dataset.schema, emitter.into_diagnostics()))
}

#[cfg(test)]
mod tests {
    use super::{InferenceOptions, infer_and_convert};
    use crate::error::InferenceError;
    use crate::infer::{ColumnOverride, OverrideSpec};
    use crate::types::{DataSet, DataType, Value};

    fn raw(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::Utf8(s.to_string())).collect()
    }

    #[test]
    fn rejects_out_of_range_options() {
        let mut ds = DataSet::from_columns(vec![("a", raw(&["1"]))]).unwrap();
        let opts = InferenceOptions {
            numeric_threshold: 1.5,
            ..Default::default()
        };
        let err = infer_and_convert(&mut ds, &opts).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOptions { .. }));

        let opts = InferenceOptions {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(infer_and_convert(&mut ds, &opts).is_err());
    }

    #[test]
    fn unknown_override_column_leaves_table_untouched() {
        let mut ds = DataSet::from_columns(vec![("a", raw(&["1", "2"]))]).unwrap();
        let before = ds.clone();
        let opts = InferenceOptions {
            overrides: OverrideSpec::new().with("missing", ColumnOverride::Cast(DataType::Int8)),
            ..Default::default()
        };
        let err = infer_and_convert(&mut ds, &opts).unwrap_err();
        assert!(matches!(err, InferenceError::UnknownColumn { column } if column == "missing"));
        assert_eq!(ds, before);
    }

    #[test]
    fn ragged_tables_are_structural_errors() {
        let mut ds = DataSet::from_columns(vec![("a", raw(&["1", "2"]))]).unwrap();
        ds.rows[1].push(Value::Null);
        let err = infer_and_convert(&mut ds, &InferenceOptions::default()).unwrap_err();
        assert!(matches!(err, InferenceError::SchemaMismatch { .. }));
    }

    #[test]
    fn overridden_columns_skip_classification() {
        let mut ds = DataSet::from_columns(vec![
            ("code", raw(&["1", "2", "3"])),
            ("n", raw(&["1", "2", "3"])),
        ])
        .unwrap();
        let opts = InferenceOptions {
            overrides: OverrideSpec::new().with("code", ColumnOverride::Cast(DataType::Utf8)),
            ..Default::default()
        };
        let report = infer_and_convert(&mut ds, &opts).unwrap();
        assert_eq!(report.get("code"), Some(DataType::Utf8));
        assert_eq!(report.get("n"), Some(DataType::Int8));
        assert_eq!(ds.rows[0][0], Value::Utf8("1".to_string()));
        assert_eq!(ds.rows[0][1], Value::Int8(1));
    }

    #[test]
    fn empty_table_reports_every_column() {
        let mut ds = DataSet::from_columns(vec![("a", Vec::new()), ("b", Vec::new())]).unwrap();
        let report = infer_and_convert(&mut ds, &InferenceOptions::default()).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.get("a"), Some(DataType::Utf8));
    }
}

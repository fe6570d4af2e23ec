use thiserror::Error;

use crate::types::DataType;

/// Convenience result type for ingestion and inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Structural errors returned by ingestion and inference.
///
/// Per-value and per-column conversion problems never surface here; they degrade to missing
/// values or to a text column (see [`ConversionError`]).
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel ingestion error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The table is malformed (ragged rows, duplicate column names, missing header, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// An override names a column the table does not have.
    #[error("override names unknown column '{column}'")]
    UnknownColumn { column: String },

    /// A type name outside the allowed set.
    #[error("unsupported type '{name}'")]
    UnsupportedType { name: String },

    /// The input format cannot be determined or is not enabled.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// Inference options are out of range.
    #[error("invalid options: {message}")]
    InvalidOptions { message: String },
}

/// Why a whole-column conversion attempt failed.
///
/// Returned by the override applier's conversion attempts; the applier recovers from it by
/// falling back to a text column.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// A cell could not be cast to the target type.
    #[error("cannot convert '{raw}' to {target}")]
    Cast { raw: String, target: DataType },

    /// The datetime format string is not a valid strftime pattern.
    #[error("invalid datetime format '{format}'")]
    InvalidFormat { format: String },

    /// No cell matched any datetime pattern.
    #[error("no value matched datetime format '{format}'")]
    NoMatch { format: String },
}

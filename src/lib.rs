//! `column-infer` decodes tabular files whose columns arrive without type metadata and infers
//! a best-fit type per column, converting the values in place.
//!
//! The primary entrypoints are [`ingestion::ingest_from_path`] (decode a file into a raw
//! [`types::DataSet`]) and [`infer::infer_and_convert`] (type every column).
//! [`upload::process_upload`] chains both for an uploaded file and returns a serializable
//! response.
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **Delimited text**: `.csv`, `.tsv`, `.txt`
//! - **JSON**: `.json` (array-of-objects or single object) and `.ndjson`
//! - **Excel/workbooks** (requires the Cargo feature `excel`): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`
//!
//! Cells equal to a null marker (`""`, `NA`, `N/A`, `NaN`, `null`, ...) and explicit JSON
//! `null` map to [`types::Value::Null`].
//!
//! ## Inferred types
//!
//! Each column is classified in order: numeric (narrowest of int8/16/32/64, float32/64),
//! complex, datetime, category, text. Large columns are classified in fixed-size chunks whose
//! verdicts are reconciled into one type. Callers can pin a column's type with an
//! [`infer::OverrideSpec`]; a failed override keeps the column as text and reports a
//! diagnostic instead of failing the batch.
//!
//! ```rust
//! use column_infer::infer::{infer_and_convert, InferenceOptions, OverrideSpec};
//! use column_infer::ingestion::{ingest_from_bytes, IngestionFormat, IngestionOptions};
//! use column_infer::types::DataType;
//!
//! # fn main() -> Result<(), column_infer::InferenceError> {
//! let csv = b"id,score,joined,grade\n1,100,2024-01-05,A\n2,200.5,2024-02-11,B\n3,NaN,2024-03-20,C\n";
//! let mut ds = ingest_from_bytes(csv, IngestionFormat::Csv, &IngestionOptions::default())?;
//!
//! let opts = InferenceOptions {
//!     overrides: OverrideSpec::from_json(r#"{"id": "int64"}"#)?,
//!     ..Default::default()
//! };
//! let report = infer_and_convert(&mut ds, &opts)?;
//!
//! assert_eq!(report.get("id"), Some(DataType::Int64));
//! assert_eq!(report.get("score"), Some(DataType::Float32));
//! assert_eq!(report.get("joined"), Some(DataType::DateTime));
//! assert_eq!(report.get("grade"), Some(DataType::Utf8));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified ingestion entrypoints and format-specific implementations
//! - [`infer`]: the inference engine, overrides and the type report
//! - [`upload`]: upload processing and response payloads
//! - [`observability`]: observer hooks for ingestion outcomes and inference diagnostics
//! - [`types`]: schema, value and in-memory dataset types
//! - [`error`]: error types

pub mod error;
pub mod infer;
pub mod ingestion;
pub mod observability;
pub mod types;
pub mod upload;

pub use error::{ConversionError, InferenceError, InferenceResult};
pub use infer::{InferenceOptions, TypeReport, infer_and_convert};

//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which decodes a file into a raw in-memory
//! [`crate::types::DataSet`] ready for [`crate::infer::infer_and_convert`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the file
//!   extension.
//! - If an [`InferenceObserver`] is provided, success/failure/alerts are reported to it.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{InferenceError, InferenceResult};
use crate::observability::{InferenceObserver, IngestionContext, IngestionStats, Severity};
use crate::types::DataSet;

use super::{NullMarkers, csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Delimited text (CSV, TSV).
    Csv,
    /// JSON array-of-objects, single object or NDJSON.
    Json,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format from a path or file name.
    pub fn from_path(path: impl AsRef<Path>) -> InferenceResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| InferenceError::UnsupportedFormat {
                message: format!("cannot infer format: path has no extension ({})", path.display()),
            })?;

        Self::from_extension(ext).ok_or_else(|| InferenceError::UnsupportedFormat {
            message: format!(
                "cannot infer format from extension '{ext}' for path ({})",
                path.display()
            ),
        })
    }
}

/// How to choose sheet(s) when ingesting an Excel workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExcelSheetSelection {
    /// Ingest the first sheet (default).
    #[default]
    First,
    /// Ingest a single named sheet.
    Sheet(String),
    /// Ingest all sheets and concatenate rows.
    AllSheets,
    /// Ingest only the listed sheets (in order) and concatenate rows.
    Sheets(Vec<String>),
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Field delimiter for delimited text. If `None`, `.tsv` paths use a tab and everything
    /// else a comma.
    pub delimiter: Option<u8>,
    /// Cell texts decoded as missing values.
    pub null_markers: NullMarkers,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn InferenceObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("delimiter", &self.delimiter.map(char::from))
            .field("null_markers", &self.null_markers)
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: None,
            null_markers: NullMarkers::default(),
            excel_sheet_selection: ExcelSheetSelection::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// - If `options.format` is `None`, format is inferred from the file extension.
/// - Use `options.excel_sheet_selection` for Excel multi-tab behavior.
///
/// When an observer is configured, this function reports:
///
/// - `on_ingested` on success, with row/column counts
/// - `on_ingest_failed` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use column_infer::infer::{infer_and_convert, InferenceOptions};
/// use column_infer::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), column_infer::InferenceError> {
/// let mut ds = ingest_from_path("people.csv", &IngestionOptions::default())?;
/// let report = infer_and_convert(&mut ds, &InferenceOptions::default())?;
/// println!("{}", serde_json::to_string(&report)?);
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use column_infer::ingestion::{ingest_from_path, IngestionOptions};
/// use column_infer::observability::{Severity, StdErrObserver};
///
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver)),
///     alert_at_or_above: Severity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are treated as Critical and will trigger `on_alert` at this threshold.
/// let _err = ingest_from_path("does_not_exist.csv", &opts).unwrap_err();
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> InferenceResult<DataSet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => IngestionFormat::from_path(path)?,
    };

    let ctx = IngestionContext {
        source: path.to_path_buf(),
        format: fmt,
    };

    let result = match fmt {
        IngestionFormat::Csv => {
            csv::ingest_csv_from_path(path, delimiter_for(path, options), &options.null_markers)
        }
        IngestionFormat::Json => json::ingest_json_from_path(path, &options.null_markers),
        IngestionFormat::Excel => ingest_excel_dispatch(ExcelSource::Path(path), options),
    };

    report(options, &ctx, result)
}

/// Unified ingestion entry point for in-memory sources (e.g. uploaded files).
///
/// Delimited input defaults to a comma unless `options.delimiter` is set.
pub fn ingest_from_bytes(
    bytes: &[u8],
    format: IngestionFormat,
    options: &IngestionOptions,
) -> InferenceResult<DataSet> {
    ingest_named_bytes(Path::new("<memory>"), bytes, format, options)
}

/// Like [`ingest_from_bytes`], reporting `name` as the source and using it to pick the
/// delimiter.
pub(crate) fn ingest_named_bytes(
    name: &Path,
    bytes: &[u8],
    format: IngestionFormat,
    options: &IngestionOptions,
) -> InferenceResult<DataSet> {
    let ctx = IngestionContext {
        source: name.to_path_buf(),
        format,
    };

    let result = match format {
        IngestionFormat::Csv => csv::ingest_csv_from_bytes(bytes, delimiter_for(name, options), &options.null_markers),
        IngestionFormat::Json => std::str::from_utf8(bytes)
            .map_err(|e| InferenceError::SchemaMismatch {
                message: format!("json input is not valid utf-8: {e}"),
            })
            .and_then(|text| json::ingest_json_from_str(text, &options.null_markers)),
        IngestionFormat::Excel => ingest_excel_dispatch(ExcelSource::Bytes(bytes), options),
    };

    report(options, &ctx, result)
}

fn report(
    options: &IngestionOptions,
    ctx: &IngestionContext,
    result: InferenceResult<DataSet>,
) -> InferenceResult<DataSet> {
    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => obs.on_ingested(
                ctx,
                IngestionStats {
                    rows: ds.row_count(),
                    columns: ds.column_count(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_ingest_failed(ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(ctx, sev, e);
                }
            }
        }
    }

    result
}

fn delimiter_for(path: &Path, options: &IngestionOptions) -> u8 {
    options.delimiter.unwrap_or_else(|| {
        let is_tsv = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
        if is_tsv { b'\t' } else { b',' }
    })
}

/// Severity used for observer callbacks when ingestion fails.
pub fn severity_for_error(e: &InferenceError) -> Severity {
    match e {
        InferenceError::Io(_) => Severity::Critical,
        InferenceError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        #[cfg(feature = "excel")]
        InferenceError::Excel(err) => {
            // calamine wraps I/O inside format-specific errors.
            if error_chain_contains_io(err) {
                Severity::Critical
            } else {
                Severity::Error
            }
        }
        InferenceError::Json(_)
        | InferenceError::SchemaMismatch { .. }
        | InferenceError::UnknownColumn { .. }
        | InferenceError::UnsupportedType { .. }
        | InferenceError::UnsupportedFormat { .. }
        | InferenceError::InvalidOptions { .. } => Severity::Error,
    }
}

#[cfg_attr(not(feature = "excel"), allow(dead_code))]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

#[cfg_attr(not(feature = "excel"), allow(dead_code))]
enum ExcelSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

fn ingest_excel_dispatch(source: ExcelSource<'_>, options: &IngestionOptions) -> InferenceResult<DataSet> {
    #[cfg(feature = "excel")]
    {
        use super::excel;

        let sel = &options.excel_sheet_selection;
        match source {
            ExcelSource::Path(path) => excel::ingest_excel_from_path(path, sel, &options.null_markers),
            ExcelSource::Bytes(bytes) => excel::ingest_excel_from_bytes(bytes, sel, &options.null_markers),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (source, options);
        Err(InferenceError::UnsupportedFormat {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

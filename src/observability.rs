//! Observer hooks for ingestion outcomes and inference diagnostics.
//!
//! The engine never prints on its own. Callers attach an [`InferenceObserver`] to
//! [`crate::ingestion::IngestionOptions`] or [`crate::infer::InferenceOptions`] to record
//! metrics, log, or alert.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::InferenceError;
use crate::ingestion::IngestionFormat;
use crate::types::DataType;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Input path, or the upload file name for in-memory sources.
    pub source: PathBuf,
    /// Format used for ingestion.
    pub format: IngestionFormat,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of ingested rows.
    pub rows: usize,
    /// Number of ingested columns.
    pub columns: usize,
}

/// How a column received its final type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSource {
    /// Applied from the override specification.
    Override,
    /// Chosen by the automatic classifier.
    Inferred,
    /// Override conversion failed and the column was kept as text.
    Fallback,
}

/// Final outcome for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOutcome {
    pub column: String,
    pub data_type: DataType,
    pub source: TypeSource,
    /// Number of chunks the classifier split the column into (1 for overrides).
    pub chunks: usize,
}

/// A non-fatal message produced while converting a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub column: String,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] column '{}': {}", self.severity, self.column, self.message)
    }
}

/// Observer interface for ingestion and inference.
///
/// Every callback has a no-op default; implement only what you need.
pub trait InferenceObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_ingested(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_ingest_failed(&self, _ctx: &IngestionContext, _severity: Severity, _error: &InferenceError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_ingest_failed`].
    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        self.on_ingest_failed(ctx, severity, error)
    }

    /// Called once per classified chunk with the chunk's candidate type.
    fn on_chunk(&self, _column: &str, _rows: Range<usize>, _candidate: DataType) {}

    /// Called once per column after its values were converted.
    fn on_column(&self, _outcome: &ColumnOutcome) {}

    /// Called for every diagnostic.
    fn on_diagnostic(&self, _diagnostic: &Diagnostic) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn InferenceObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn InferenceObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl InferenceObserver for CompositeObserver {
    fn on_ingested(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_ingested(ctx, stats);
        }
    }

    fn on_ingest_failed(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        for o in &self.observers {
            o.on_ingest_failed(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_chunk(&self, column: &str, rows: Range<usize>, candidate: DataType) {
        for o in &self.observers {
            o.on_chunk(column, rows.clone(), candidate);
        }
    }

    fn on_column(&self, outcome: &ColumnOutcome) {
        for o in &self.observers {
            o.on_column(outcome);
        }
    }

    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        for o in &self.observers {
            o.on_diagnostic(diagnostic);
        }
    }
}

/// Logs ingestion and inference events to stderr.
///
/// Chunk events are skipped; they are too chatty for a terminal.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl InferenceObserver for StdErrObserver {
    fn on_ingested(&self, ctx: &IngestionContext, stats: IngestionStats) {
        eprintln!(
            "[ingest][ok] format={:?} source={} rows={} columns={}",
            ctx.format,
            ctx.source.display(),
            stats.rows,
            stats.columns
        );
    }

    fn on_ingest_failed(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        eprintln!(
            "[ingest][{:?}] format={:?} source={} err={}",
            severity,
            ctx.format,
            ctx.source.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        eprintln!(
            "[ALERT][ingest][{:?}] format={:?} source={} err={}",
            severity,
            ctx.format,
            ctx.source.display(),
            error
        );
    }

    fn on_column(&self, outcome: &ColumnOutcome) {
        eprintln!(
            "[infer][column] name={} type={} source={:?} chunks={}",
            outcome.column, outcome.data_type, outcome.source, outcome.chunks
        );
    }

    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        eprintln!(
            "[infer][{:?}] column={} {}",
            diagnostic.severity, diagnostic.column, diagnostic.message
        );
    }
}

/// Appends ingestion and inference events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl InferenceObserver for FileObserver {
    fn on_ingested(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok format={:?} source={} rows={} columns={}",
            unix_ts(),
            ctx.format,
            ctx.source.display(),
            stats.rows,
            stats.columns
        ));
    }

    fn on_ingest_failed(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.source.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: Severity, error: &InferenceError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.source.display(),
            error
        ));
    }

    fn on_column(&self, outcome: &ColumnOutcome) {
        self.append_line(&format!(
            "{} column name={} type={} source={:?} chunks={}",
            unix_ts(),
            outcome.column,
            outcome.data_type,
            outcome.source,
            outcome.chunks
        ));
    }

    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.append_line(&format!(
            "{} diagnostic severity={:?} column={} {}",
            unix_ts(),
            diagnostic.severity,
            diagnostic.column,
            diagnostic.message
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Routes inference events to the optional observer and keeps the diagnostics for the report.
pub(crate) struct Emitter<'a> {
    observer: Option<&'a dyn InferenceObserver>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(observer: Option<&'a dyn InferenceObserver>) -> Self {
        Self {
            observer,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn chunk(&self, column: &str, rows: Range<usize>, candidate: DataType) {
        if let Some(obs) = self.observer {
            obs.on_chunk(column, rows, candidate);
        }
    }

    pub(crate) fn column(&self, outcome: ColumnOutcome) {
        if let Some(obs) = self.observer {
            obs.on_column(&outcome);
        }
    }

    pub(crate) fn diagnostic(&mut self, column: &str, severity: Severity, message: String) {
        let diagnostic = Diagnostic {
            column: column.to_string(),
            severity,
            message,
        };
        if let Some(obs) = self.observer {
            obs.on_diagnostic(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

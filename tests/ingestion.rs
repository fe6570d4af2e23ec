use std::sync::{Arc, Mutex};

use column_infer::InferenceError;
use column_infer::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader};
use column_infer::ingestion::json::ingest_json_from_path;
use column_infer::ingestion::{
    IngestionFormat, IngestionOptions, NullMarkers, ingest_from_bytes, ingest_from_path,
};
use column_infer::observability::{InferenceObserver, IngestionContext, IngestionStats, Severity};
use column_infer::types::{DataType, Value};

#[derive(Default)]
struct RecordingObserver {
    ingested: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl InferenceObserver for RecordingObserver {
    fn on_ingested(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.ingested.lock().unwrap().push(stats);
    }

    fn on_ingest_failed(&self, _ctx: &IngestionContext, severity: Severity, _error: &InferenceError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: Severity, _error: &InferenceError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn ingest_csv_from_path_keeps_raw_text() {
    let ds = ingest_csv_from_path("tests/fixtures/people.csv", b',', &NullMarkers::default()).unwrap();

    assert_eq!(ds.row_count(), 4);
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["id", "name", "score", "joined", "grade", "active"]
    );
    assert!(ds.schema.fields.iter().all(|f| f.data_type == DataType::Utf8));
    assert_eq!(ds.rows[0][0], Value::Utf8("1".to_string()));
    assert_eq!(ds.rows[2][2], Value::Null);
}

#[test]
fn ingest_csv_with_custom_null_markers() {
    let input = "id,note\n1,-\n2,ok\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr, &NullMarkers::new(["-"])).unwrap();
    assert_eq!(ds.rows[0][1], Value::Null);
    assert_eq!(ds.rows[1][1], Value::Utf8("ok".to_string()));
}

#[test]
fn tsv_extension_selects_tab_delimiter() {
    let ds = ingest_from_path("tests/fixtures/cities.tsv", &IngestionOptions::default()).unwrap();
    assert_eq!(ds.column_count(), 3);
    assert_eq!(ds.rows[1][1], Value::Utf8("Bergen".to_string()));
    assert_eq!(ds.rows[2][2], Value::Null);
}

#[test]
fn ndjson_keeps_loose_scalars() {
    let ds = ingest_json_from_path("tests/fixtures/events.ndjson", &NullMarkers::default()).unwrap();
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["id", "amount", "tags", "when"]
    );
    assert_eq!(ds.rows[0][0], Value::Int64(1));
    assert_eq!(ds.rows[0][1], Value::Float64(12.5));
    assert_eq!(ds.rows[1][2], Value::Null);
    assert_eq!(ds.rows[2][2], Value::Utf8("[]".to_string()));
}

#[test]
fn ingest_from_bytes_uses_the_given_format() {
    let ds = ingest_from_bytes(br#"[{"a": 1}, {"b": "x"}]"#, IngestionFormat::Json, &IngestionOptions::default()).unwrap();
    assert_eq!(ds.column_count(), 2);
    assert_eq!(ds.rows[1], vec![Value::Null, Value::Utf8("x".to_string())]);

    let opts = IngestionOptions {
        delimiter: Some(b';'),
        ..Default::default()
    };
    let ds = ingest_from_bytes(b"a;b\n1;2\n", IngestionFormat::Csv, &opts).unwrap();
    assert_eq!(ds.rows[0][1], Value::Utf8("2".to_string()));
}

#[test]
fn unknown_extension_is_unsupported() {
    let err = ingest_from_path("tests/fixtures/people.parquet", &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, InferenceError::UnsupportedFormat { .. }));
}

#[cfg(not(feature = "excel"))]
#[test]
fn excel_without_feature_is_unsupported() {
    let err = ingest_from_bytes(b"PK", IngestionFormat::Excel, &IngestionOptions::default()).unwrap_err();
    assert!(err.to_string().contains("enable cargo feature 'excel'"));
}

#[test]
fn observer_receives_stats_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    ingest_from_path("tests/fixtures/people.csv", &opts).unwrap();

    let ingested = obs.ingested.lock().unwrap().clone();
    assert_eq!(ingested, vec![IngestionStats { rows: 4, columns: 6 }]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        format: Some(IngestionFormat::Csv),
        observer: Some(obs.clone()),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };

    // Missing file -> Io error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_non_critical_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: Severity::Critical,
        ..Default::default()
    };

    // Duplicate header -> Error severity (not Critical) -> should not alert
    let _ = ingest_from_bytes(b"a,a\n1,2\n", IngestionFormat::Csv, &opts).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

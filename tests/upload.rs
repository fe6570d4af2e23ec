use std::fs;

use column_infer::InferenceError;
use column_infer::infer::{InferenceOptions, OverrideSpec};
use column_infer::ingestion::IngestionOptions;
use column_infer::upload::{ErrorResponse, process_upload};
use serde_json::json;

#[test]
fn upload_returns_records_and_types() {
    let bytes = fs::read("tests/fixtures/people.csv").unwrap();
    let response = process_upload(
        "people.csv",
        &bytes,
        &IngestionOptions::default(),
        &InferenceOptions::default(),
    )
    .unwrap();

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(
        body["types"],
        json!({
            "id": "int8",
            "name": "text",
            "score": "float32",
            "joined": "datetime",
            "grade": "text",
            "active": "text"
        })
    );
    assert_eq!(
        body["data"][0],
        json!({
            "id": 1,
            "name": "Ada",
            "score": 98.5,
            "joined": "2024-01-05T00:00:00",
            "grade": "A",
            "active": "true"
        })
    );
    assert_eq!(body["data"][2]["score"], json!(null));
    assert_eq!(body["warnings"], json!([]));
}

#[test]
fn upload_keeps_column_order_in_records() {
    let response = process_upload(
        "t.csv",
        b"z,a,m\n1,2,3\n",
        &IngestionOptions::default(),
        &InferenceOptions::default(),
    )
    .unwrap();
    let text = serde_json::to_string(&response.data[0]).unwrap();
    assert_eq!(text, r#"{"z":1,"a":2,"m":3}"#);
}

#[test]
fn upload_reports_override_fallbacks_as_warnings() {
    let opts = InferenceOptions {
        overrides: OverrideSpec::from_json(r#"{"name": {"type": "datetime", "format": "%Y-%m-%d"}}"#).unwrap(),
        ..Default::default()
    };
    let bytes = fs::read("tests/fixtures/people.csv").unwrap();
    let response = process_upload("people.csv", &bytes, &IngestionOptions::default(), &opts).unwrap();

    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("column 'name'"));
    assert_eq!(response.data[0]["name"], json!("Ada"));
}

#[test]
fn unsupported_upload_maps_to_error_payload() {
    let err = process_upload(
        "data.bin",
        b"\x00\x01",
        &IngestionOptions::default(),
        &InferenceOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, InferenceError::UnsupportedFormat { .. }));

    let payload = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
    let message = payload["error"].as_str().unwrap();
    assert!(message.starts_with("unsupported format:"));
}

#[test]
fn unknown_override_column_is_an_error_payload() {
    let opts = InferenceOptions {
        overrides: OverrideSpec::from_json(r#"{"age": "int8"}"#).unwrap(),
        ..Default::default()
    };
    let err = process_upload("t.csv", b"id\n1\n", &IngestionOptions::default(), &opts).unwrap_err();
    assert_eq!(
        serde_json::to_value(ErrorResponse::from(&err)).unwrap(),
        json!({"error": "override names unknown column 'age'"})
    );
}

//! Delimited-text ingestion (CSV, TSV).

use std::io::Read;
use std::path::Path;

use crate::error::InferenceResult;
use crate::types::{DataSet, Value};

use super::{NullMarkers, raw_dataset};

/// Ingest a delimited file into a raw [`DataSet`].
///
/// Rules:
///
/// - The file must have a header row; header names are trimmed and must be unique.
/// - Every record must have as many fields as the header.
/// - Cells matching a null marker become [`Value::Null`]; others are kept as trimmed text.
pub fn ingest_csv_from_path(
    path: impl AsRef<Path>,
    delimiter: u8,
    null_markers: &NullMarkers,
) -> InferenceResult<DataSet> {
    let mut rdr = reader_builder(delimiter).from_path(path)?;
    ingest_csv_from_reader(&mut rdr, null_markers)
}

/// Ingest delimited text held in memory.
pub fn ingest_csv_from_bytes(bytes: &[u8], delimiter: u8, null_markers: &NullMarkers) -> InferenceResult<DataSet> {
    let mut rdr = reader_builder(delimiter).from_reader(bytes);
    ingest_csv_from_reader(&mut rdr, null_markers)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    null_markers: &NullMarkers,
) -> InferenceResult<DataSet> {
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|cell| null_markers.decode(cell)).collect());
    }

    raw_dataset(headers, rows)
}

fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).delimiter(delimiter);
    builder
}

#[cfg(test)]
mod tests {
    use super::ingest_csv_from_bytes;
    use crate::error::InferenceError;
    use crate::ingestion::NullMarkers;
    use crate::types::{DataType, Value};

    #[test]
    fn reads_headers_and_marks_missing_cells() {
        let input = b"id, name ,score\n1,Ada,NA\n2, Grace ,\n";
        let ds = ingest_csv_from_bytes(input, b',', &NullMarkers::default()).unwrap();
        assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["id", "name", "score"]);
        assert!(ds.schema.fields.iter().all(|f| f.data_type == DataType::Utf8));
        assert_eq!(ds.rows[1][1], Value::Utf8("Grace".to_string()));
        assert_eq!(ds.rows[0][2], Value::Null);
        assert_eq!(ds.rows[1][2], Value::Null);
    }

    #[test]
    fn honors_delimiter() {
        let ds = ingest_csv_from_bytes(b"a\tb\n1\t2\n", b'\t', &NullMarkers::default()).unwrap();
        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.rows[0][1], Value::Utf8("2".to_string()));
    }

    #[test]
    fn ragged_records_are_csv_errors() {
        let err = ingest_csv_from_bytes(b"a,b\n1\n", b',', &NullMarkers::default()).unwrap_err();
        assert!(matches!(err, InferenceError::Csv(_)));
    }

    #[test]
    fn duplicate_headers_are_schema_errors() {
        let err = ingest_csv_from_bytes(b"a,a\n1,2\n", b',', &NullMarkers::default()).unwrap_err();
        assert!(matches!(err, InferenceError::SchemaMismatch { .. }));
    }

    #[test]
    fn header_only_input_is_an_empty_table() {
        let ds = ingest_csv_from_bytes(b"a,b\n", b',', &NullMarkers::default()).unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 2);
    }
}

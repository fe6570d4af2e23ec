#![cfg(feature = "excel")]

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, DataType as _, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};

use crate::error::{InferenceError, InferenceResult};
use crate::types::{DataSet, Value};

use super::unified::ExcelSheetSelection;
use super::{NullMarkers, raw_dataset};

/// Ingest an Excel document (`.xlsx`, `.xls`, `.ods`, etc.) into a raw [`DataSet`].
///
/// Behavior:
/// - Reads the sheets named by `selection`, concatenating rows in selection order
/// - Detects the first non-empty row of each sheet as the header row; every selected sheet
///   must carry the same header
/// - Numbers, booleans and dates keep their cell type; text cells go through the null markers
pub fn ingest_excel_from_path(
    path: impl AsRef<Path>,
    selection: &ExcelSheetSelection,
    null_markers: &NullMarkers,
) -> InferenceResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;
    ingest_workbook(&mut workbook, selection, null_markers)
}

/// Ingest a workbook held in memory (format sniffed from the content).
pub fn ingest_excel_from_bytes(
    bytes: &[u8],
    selection: &ExcelSheetSelection,
    null_markers: &NullMarkers,
) -> InferenceResult<DataSet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    ingest_workbook(&mut workbook, selection, null_markers)
}

fn ingest_workbook<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    selection: &ExcelSheetSelection,
    null_markers: &NullMarkers,
) -> InferenceResult<DataSet> {
    let available = workbook.sheet_names();
    let sheets: Vec<String> = match selection {
        ExcelSheetSelection::First => available.into_iter().take(1).collect(),
        ExcelSheetSelection::Sheet(name) => vec![name.clone()],
        ExcelSheetSelection::AllSheets => available,
        ExcelSheetSelection::Sheets(names) => names.clone(),
    };
    if sheets.is_empty() {
        return Err(InferenceError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut headers: Option<Vec<String>> = None;
    let mut all_rows: Vec<Vec<Value>> = Vec::new();
    for sheet in &sheets {
        let range = workbook.worksheet_range(sheet)?;
        let (sheet_headers, mut sheet_rows) =
            ingest_sheet_range(&range, null_markers).map_err(|e| wrap_schema_err_with_sheet(sheet, e))?;
        match &headers {
            Some(first) if *first != sheet_headers => {
                return Err(InferenceError::SchemaMismatch {
                    message: format!(
                        "sheet '{sheet}': header {sheet_headers:?} differs from first sheet header {first:?}"
                    ),
                });
            }
            Some(_) => {}
            None => headers = Some(sheet_headers),
        }
        all_rows.append(&mut sheet_rows);
    }

    raw_dataset(headers.unwrap_or_default(), all_rows)
}

fn ingest_sheet_range(
    range: &calamine::Range<Data>,
    null_markers: &NullMarkers,
) -> InferenceResult<(Vec<String>, Vec<Vec<Value>>)> {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| InferenceError::SchemaMismatch {
            message: "sheet has no non-empty rows (no header row found)".to_string(),
        })?
        .iter()
        .map(|c| cell_to_header_string(c).trim().to_string())
        .collect();

    let rows = rows_iter
        .map(|row| {
            (0..headers.len())
                .map(|idx| convert_cell(row.get(idx).unwrap_or(&Data::Empty), null_markers))
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn wrap_schema_err_with_sheet(sheet: &str, err: InferenceError) -> InferenceError {
    match err {
        InferenceError::SchemaMismatch { message } => InferenceError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data, null_markers: &NullMarkers) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => null_markers.decode(s),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => match c.as_datetime() {
            Some(dt) => Value::DateTime(dt),
            None => Value::Utf8(c.to_string()),
        },
        Data::DurationIso(s) => Value::Utf8(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use calamine::Data;

    use super::{cell_to_header_string, convert_cell};
    use crate::ingestion::NullMarkers;
    use crate::types::Value;

    #[test]
    fn cells_keep_loose_types() {
        let markers = NullMarkers::default();
        assert_eq!(convert_cell(&Data::Int(3), &markers), Value::Int64(3));
        assert_eq!(convert_cell(&Data::Float(2.5), &markers), Value::Float64(2.5));
        assert_eq!(convert_cell(&Data::Bool(true), &markers), Value::Bool(true));
        assert_eq!(convert_cell(&Data::String("N/A".to_string()), &markers), Value::Null);
        assert_eq!(convert_cell(&Data::Empty, &markers), Value::Null);
    }

    #[test]
    fn integral_float_headers_print_as_integers() {
        assert_eq!(cell_to_header_string(&Data::Float(2024.0)), "2024");
        assert_eq!(cell_to_header_string(&Data::String("id".to_string())), "id");
    }
}

//! Caller-supplied type overrides.
//!
//! An [`OverrideSpec`] maps column names to a [`ColumnOverride`]. Overridden columns are
//! converted before automatic inference and are never classified afterwards. A failed
//! conversion keeps the column as text and emits a warning diagnostic; it never aborts the
//! batch.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, InferenceError, InferenceResult};
use crate::observability::{ColumnOutcome, Emitter, Severity, TypeSource};
use crate::types::{DataSet, DataType, Schema, Value};

use super::convert::{CategoryPool, cast_column, coerce_chunk};
use super::datetime::{parse_with_format, parse_with_formats};

/// Explicit type assignment for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOverride", into = "RawOverride")]
pub enum ColumnOverride {
    /// Cast the whole column to a type.
    Cast(DataType),
    /// Parse the column as datetimes, with an explicit format or the candidate formats.
    DateTime { format: Option<String> },
}

impl ColumnOverride {
    /// Datetime override with an explicit strftime format.
    pub fn datetime_with_format(format: impl Into<String>) -> Self {
        Self::DateTime {
            format: Some(format.into()),
        }
    }

    /// The type this override asks for.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Cast(dt) => *dt,
            Self::DateTime { .. } => DataType::DateTime,
        }
    }
}

/// Wire shape: `"int8"` or `{"type": "datetime", "format": "%Y-%m-%d"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawOverride {
    Name(String),
    Directive {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
}

impl TryFrom<RawOverride> for ColumnOverride {
    type Error = InferenceError;

    fn try_from(raw: RawOverride) -> Result<Self, Self::Error> {
        let (kind, format) = match raw {
            RawOverride::Name(kind) => (kind, None),
            RawOverride::Directive { kind, format } => (kind, format),
        };
        match (kind.parse::<DataType>()?, format) {
            (DataType::DateTime, format) => Ok(Self::DateTime { format }),
            (dt, None) => Ok(Self::Cast(dt)),
            (dt, Some(_)) => Err(InferenceError::UnsupportedType {
                name: format!("{dt} with a format (formats apply to datetime only)"),
            }),
        }
    }
}

impl From<ColumnOverride> for RawOverride {
    fn from(value: ColumnOverride) -> Self {
        match value {
            ColumnOverride::Cast(dt) => Self::Name(dt.as_str().to_string()),
            ColumnOverride::DateTime { format: None } => Self::Name("datetime".to_string()),
            ColumnOverride::DateTime { format } => Self::Directive {
                kind: "datetime".to_string(),
                format,
            },
        }
    }
}

/// Mapping from column name to its override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideSpec {
    columns: BTreeMap<String, ColumnOverride>,
}

impl OverrideSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object such as `{"age": "int8", "joined": {"type": "datetime",
    /// "format": "%d/%m/%Y"}}`. Unknown type names are rejected with
    /// [`InferenceError::UnsupportedType`].
    pub fn from_json(json: &str) -> InferenceResult<Self> {
        let raw: BTreeMap<String, RawOverride> = serde_json::from_str(json)?;
        let columns = raw
            .into_iter()
            .map(|(column, spec)| Ok((column, ColumnOverride::try_from(spec)?)))
            .collect::<InferenceResult<_>>()?;
        Ok(Self { columns })
    }

    /// Add or replace the override for `column`.
    pub fn with(mut self, column: impl Into<String>, spec: ColumnOverride) -> Self {
        self.columns.insert(column.into(), spec);
        self
    }

    /// Add an override by type name, rejecting names outside the allowed set.
    pub fn with_type_name(self, column: impl Into<String>, type_name: &str) -> InferenceResult<Self> {
        let dt: DataType = type_name.parse()?;
        let spec = match dt {
            DataType::DateTime => ColumnOverride::DateTime { format: None },
            other => ColumnOverride::Cast(other),
        };
        Ok(self.with(column, spec))
    }

    pub fn get(&self, column: &str) -> Option<&ColumnOverride> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ColumnOverride> {
        self.columns.iter()
    }

    /// Fail if any override names a column that `schema` does not have.
    pub fn validate_against(&self, schema: &Schema) -> InferenceResult<()> {
        match self.columns.keys().find(|c| schema.index_of(c).is_none()) {
            Some(column) => Err(InferenceError::UnknownColumn {
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Apply `spec` to column `idx`, falling back to text when the conversion fails.
pub(crate) fn apply_override(
    dataset: &mut DataSet,
    idx: usize,
    spec: &ColumnOverride,
    emitter: &mut Emitter<'_>,
) -> DataType {
    let name = dataset.schema.fields[idx].name.clone();
    let mut pool = CategoryPool::default();

    let datetime_format = match spec {
        ColumnOverride::DateTime { format } => Some(format.as_deref()),
        ColumnOverride::Cast(DataType::DateTime) => Some(None),
        ColumnOverride::Cast(_) => None,
    };

    let attempt = {
        let values: Vec<&Value> = dataset.rows.iter().map(|row| &row[idx]).collect();
        match datetime_format {
            Some(format) => {
                parse_datetime_column(&values, format).map(|(converted, coerced)| {
                    if coerced > 0 {
                        emitter.diagnostic(
                            &name,
                            Severity::Info,
                            format!("{coerced} value(s) did not match the datetime format and were set to missing"),
                        );
                    }
                    converted
                })
            }
            None => cast_column(&values, spec.data_type(), &mut pool),
        }
    };

    let (converted, data_type, source) = match attempt {
        Ok(converted) => (converted, spec.data_type(), TypeSource::Override),
        Err(err) => {
            emitter.diagnostic(
                &name,
                Severity::Warning,
                format!(
                    "could not convert to {}: {err}; keeping the column as text",
                    spec.data_type()
                ),
            );
            let values: Vec<&Value> = dataset.rows.iter().map(|row| &row[idx]).collect();
            let text = coerce_chunk(&values, DataType::Utf8, &mut pool);
            (text, DataType::Utf8, TypeSource::Fallback)
        }
    };

    for (row, value) in dataset.rows.iter_mut().zip(converted) {
        row[idx] = value;
    }
    dataset.schema.fields[idx].data_type = data_type;

    emitter.column(ColumnOutcome {
        column: name,
        data_type,
        source,
        chunks: 1,
    });
    data_type
}

/// Parse a whole column as datetimes. Returns the converted values and how many non-missing
/// cells were coerced to missing. Fails when the format is invalid or nothing parsed.
fn parse_datetime_column(
    values: &[&Value],
    format: Option<&str>,
) -> Result<(Vec<Value>, usize), ConversionError> {
    let parsed: Vec<Option<NaiveDateTime>> = match format {
        Some(f) => parse_with_format(values, f)?,
        None => parse_with_formats(values),
    };

    let present = values.iter().filter(|v| !v.is_null()).count();
    let matched = parsed.iter().filter(|p| p.is_some()).count();
    if present > 0 && matched == 0 {
        return Err(ConversionError::NoMatch {
            format: format.unwrap_or("candidate formats").to_string(),
        });
    }

    let converted = parsed
        .into_iter()
        .map(|p| p.map_or(Value::Null, Value::DateTime))
        .collect();
    Ok((converted, present - matched))
}

#[cfg(test)]
mod tests {
    use super::{ColumnOverride, OverrideSpec};
    use crate::error::InferenceError;
    use crate::types::{DataType, Field, Schema};

    #[test]
    fn parses_names_and_directives_from_json() {
        let spec = OverrideSpec::from_json(
            r#"{"age": "int8", "joined": {"type": "datetime", "format": "%d/%m/%Y"}, "note": "object"}"#,
        )
        .unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.get("age"), Some(&ColumnOverride::Cast(DataType::Int8)));
        assert_eq!(
            spec.get("joined"),
            Some(&ColumnOverride::datetime_with_format("%d/%m/%Y"))
        );
        assert_eq!(spec.get("note"), Some(&ColumnOverride::Cast(DataType::Utf8)));
    }

    #[test]
    fn plain_datetime_name_has_no_format() {
        let spec = OverrideSpec::from_json(r#"{"d": "datetime"}"#).unwrap();
        assert_eq!(spec.get("d"), Some(&ColumnOverride::DateTime { format: None }));
    }

    #[test]
    fn unknown_type_names_are_rejected() {
        let err = OverrideSpec::from_json(r#"{"a": "decimal"}"#).unwrap_err();
        assert!(matches!(err, InferenceError::UnsupportedType { name } if name == "decimal"));
        let err = OverrideSpec::new().with_type_name("a", "decimal").unwrap_err();
        assert!(matches!(err, InferenceError::UnsupportedType { name } if name == "decimal"));
    }

    #[test]
    fn format_on_non_datetime_is_rejected() {
        assert!(OverrideSpec::from_json(r#"{"a": {"type": "int8", "format": "%Y"}}"#).is_err());
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let spec = OverrideSpec::new()
            .with("a", ColumnOverride::Cast(DataType::Float32))
            .with("b", ColumnOverride::datetime_with_format("%Y"));
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"a":"float32","b":{"type":"datetime","format":"%Y"}}"#);
    }

    #[test]
    fn validate_against_reports_unknown_columns() {
        let schema = Schema::new(vec![Field::new("a", DataType::Utf8)]);
        let spec = OverrideSpec::new().with("b", ColumnOverride::Cast(DataType::Int8));
        let err = spec.validate_against(&schema).unwrap_err();
        assert_eq!(err.to_string(), "override names unknown column 'b'");
        assert!(OverrideSpec::new().validate_against(&schema).is_ok());
    }
}

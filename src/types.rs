//! Core data model types.
//!
//! Ingestion produces a [`DataSet`] whose columns are declared [`DataType::Utf8`] and hold raw
//! text or loosely typed scalars. Inference rewrites each column in place to exactly one
//! [`DataType`] and updates the matching [`Field`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// Semantic type assigned to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point number.
    Float32,
    /// 64-bit floating point number.
    Float64,
    /// Complex number with 64-bit parts.
    Complex,
    /// Timestamp without time zone.
    DateTime,
    /// Low-cardinality text.
    Category,
    /// Boolean. Only assigned through an explicit override.
    Bool,
    /// UTF-8 text (the fallback type).
    Utf8,
}

impl DataType {
    /// Canonical lowercase name, as reported in a [`crate::infer::TypeReport`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex => "complex",
            Self::DateTime => "datetime",
            Self::Category => "category",
            Self::Bool => "bool",
            Self::Utf8 => "text",
        }
    }

    /// True for the four signed integer widths.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// True for integer and floating point types.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = InferenceError;

    /// Parse a type name (case-insensitive). Accepts the canonical names plus common aliases
    /// such as `int`, `float`, `object` and `string`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" | "int" => Ok(Self::Int64),
            "float32" => Ok(Self::Float32),
            "float64" | "float" => Ok(Self::Float64),
            "complex" | "complex128" => Ok(Self::Complex),
            "datetime" | "datetime64" | "timestamp" => Ok(Self::DateTime),
            "category" => Ok(Self::Category),
            "bool" | "boolean" => Ok(Self::Bool),
            "text" | "object" | "str" | "string" | "utf8" => Ok(Self::Utf8),
            _ => Err(InferenceError::UnsupportedType { name: s.to_string() }),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = InferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

/// A complex number with `f64` parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex64 {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex64 {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl fmt::Display for Complex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.im.is_sign_negative() { '-' } else { '+' };
        write!(f, "{}{}{}j", self.re, sign, self.im.abs())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Complex(Complex64),
    DateTime(NaiveDateTime),
    /// Categorical level; equal levels within a column share one allocation.
    Category(Arc<str>),
    Bool(bool),
    Utf8(String),
}

impl Value {
    /// True for the missing marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The [`DataType`] this value is stored as, or `None` for [`Value::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Self::Null => return None,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Complex(_) => DataType::Complex,
            Self::DateTime(_) => DataType::DateTime,
            Self::Category(_) => DataType::Category,
            Self::Bool(_) => DataType::Bool,
            Self::Utf8(_) => DataType::Utf8,
        })
    }

    /// Text form of the value; borrows for string-like values, `None` for [`Value::Null`].
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Utf8(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Category(s) => Some(Cow::Borrowed(s.as_ref())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Complex(v) => write!(f, "{v}"),
            Self::DateTime(v) => {
                if v.time().num_seconds_from_midnight() == 0 && v.time().nanosecond() == 0 {
                    write!(f, "{}", v.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            Self::Category(v) => f.write_str(v.as_ref()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(v) => f.write_str(v),
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows without validation.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Create a dataset, checking that column names are unique and every row has one cell
    /// per field.
    pub fn try_new(schema: Schema, rows: Vec<Vec<Value>>) -> InferenceResult<Self> {
        let ds = Self { schema, rows };
        ds.validate()?;
        Ok(ds)
    }

    /// Build a dataset of raw [`DataType::Utf8`] columns from `(name, values)` pairs.
    ///
    /// All columns must have the same length.
    pub fn from_columns<N>(columns: Vec<(N, Vec<Value>)>) -> InferenceResult<Self>
    where
        N: Into<String>,
    {
        let row_count = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut fields = Vec::with_capacity(columns.len());
        let mut rows: Vec<Vec<Value>> = (0..row_count)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for (name, values) in columns {
            let name = name.into();
            if values.len() != row_count {
                return Err(InferenceError::SchemaMismatch {
                    message: format!(
                        "column '{name}' has {} values, expected {row_count}",
                        values.len()
                    ),
                });
            }
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            fields.push(Field::new(name, DataType::Utf8));
        }

        Self::try_new(Schema::new(fields), rows)
    }

    /// Check the table invariants: unique column names and uniform row width.
    pub fn validate(&self) -> InferenceResult<()> {
        let mut seen = HashSet::with_capacity(self.schema.fields.len());
        for name in self.schema.field_names() {
            if !seen.insert(name) {
                return Err(InferenceError::SchemaMismatch {
                    message: format!("duplicate column name '{name}'"),
                });
            }
        }

        let width = self.schema.fields.len();
        if let Some((idx, row)) = self.rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(InferenceError::SchemaMismatch {
                message: format!("row {idx} has {} cells, expected {width}", row.len()),
            });
        }
        Ok(())
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Borrow the cells of a column by name, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Declared type of a column by name.
    pub fn column_type(&self, name: &str) -> Option<DataType> {
        self.schema
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::{Complex64, DataSet, DataType, Value};

    #[test]
    fn type_names_parse_with_aliases() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Int64);
        assert_eq!("FLOAT".parse::<DataType>().unwrap(), DataType::Float64);
        assert_eq!("object".parse::<DataType>().unwrap(), DataType::Utf8);
        assert_eq!("datetime".parse::<DataType>().unwrap(), DataType::DateTime);
        assert!("decimal".parse::<DataType>().is_err());
    }

    #[test]
    fn type_names_round_trip_through_serde() {
        let json = serde_json::to_string(&DataType::Utf8).unwrap();
        assert_eq!(json, "\"text\"");
        let back: DataType = serde_json::from_str("\"int16\"").unwrap();
        assert_eq!(back, DataType::Int16);
        assert!(serde_json::from_str::<DataType>("\"varchar\"").is_err());
    }

    #[test]
    fn complex_display_uses_j_suffix() {
        assert_eq!(Complex64::new(1.0, -2.5).to_string(), "1-2.5j");
        assert_eq!(Complex64::new(0.0, 3.0).to_string(), "0+3j");
    }

    #[test]
    fn from_columns_rejects_ragged_columns() {
        let err = DataSet::from_columns(vec![
            ("a", vec![Value::Null, Value::Null]),
            ("b", vec![Value::Null]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("column 'b' has 1 values"));
    }

    #[test]
    fn try_new_rejects_duplicate_names() {
        let err = DataSet::from_columns(vec![("a", vec![Value::Null]), ("a", vec![Value::Null])])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate column name 'a'"));
    }

    #[test]
    fn column_access_by_name() {
        let ds = DataSet::from_columns(vec![(
            "x",
            vec![Value::Utf8("1".to_string()), Value::Null],
        )])
        .unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column_count(), 1);
        assert_eq!(ds.column("x").unwrap()[0], &Value::Utf8("1".to_string()));
        assert_eq!(ds.column_type("x"), Some(DataType::Utf8));
        assert!(ds.column("y").is_none());
    }
}

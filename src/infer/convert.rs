//! Cell conversion to a chosen [`DataType`].
//!
//! [`coerce_chunk`] is used once a type has been chosen automatically: cells that do not
//! convert become missing. [`cast_column`] backs explicit overrides: the first cell that does
//! not convert aborts the cast.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::types::{DataType, Value};

use super::complex::{ComplexCell, coerce_complex};
use super::datetime::parse_with_formats;
use super::numeric::{coerce_number, to_numeric_value};

/// Interns category levels so equal levels within a column share one allocation.
#[derive(Debug, Default)]
pub(crate) struct CategoryPool {
    levels: HashMap<String, Arc<str>>,
}

impl CategoryPool {
    pub(crate) fn intern(&mut self, level: &str) -> Arc<str> {
        if let Some(existing) = self.levels.get(level) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(level);
        self.levels.insert(level.to_string(), Arc::clone(&shared));
        shared
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }
}

/// Convert one cell to `target`. Missing cells stay missing.
///
/// Datetime targets only accept cells that already hold a timestamp; text is parsed at the
/// column level so every cell sees the same format.
pub(crate) fn convert_value(
    value: &Value,
    target: DataType,
    pool: &mut CategoryPool,
) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let converted = match target {
        t if t.is_numeric() => match coerce_number(value) {
            Some(n) => to_numeric_value(n, t),
            None if is_nan_text(value) => Some(Value::Null),
            None => None,
        },
        DataType::Complex => match coerce_complex(value) {
            ComplexCell::Parsed(c) => Some(Value::Complex(c)),
            ComplexCell::Missing => Some(Value::Null),
            ComplexCell::Invalid => None,
        },
        DataType::DateTime => match value {
            Value::DateTime(dt) => Some(Value::DateTime(*dt)),
            _ => None,
        },
        DataType::Category => value.as_text().map(|s| Value::Category(pool.intern(&s))),
        DataType::Bool => convert_bool(value),
        _ => value.as_text().map(|s| Value::Utf8(s.into_owned())),
    };
    converted.ok_or_else(|| ConversionError::Cast {
        raw: value.to_string(),
        target,
    })
}

/// Convert a chunk to `target`, turning failed cells into [`Value::Null`].
pub(crate) fn coerce_chunk(values: &[&Value], target: DataType, pool: &mut CategoryPool) -> Vec<Value> {
    if target == DataType::DateTime {
        return parse_with_formats(values)
            .into_iter()
            .map(|dt| dt.map_or(Value::Null, Value::DateTime))
            .collect();
    }
    values
        .iter()
        .map(|v| convert_value(v, target, pool).unwrap_or(Value::Null))
        .collect()
}

/// Convert every cell to `target`, failing on the first cell that does not convert.
pub(crate) fn cast_column(
    values: &[&Value],
    target: DataType,
    pool: &mut CategoryPool,
) -> Result<Vec<Value>, ConversionError> {
    values
        .iter()
        .map(|v| convert_value(v, target, pool))
        .collect()
}

fn is_nan_text(value: &Value) -> bool {
    matches!(value, Value::Utf8(_) | Value::Category(_))
        && value
            .as_text()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("nan"))
}

fn convert_bool(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Utf8(_) | Value::Category(_) => value
            .as_text()
            .and_then(|s| parse_bool(&s).ok())
            .map(Value::Bool),
        other => match coerce_number(other)?.as_integral()? {
            0 => Some(Value::Bool(false)),
            1 => Some(Value::Bool(true)),
            _ => None,
        },
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

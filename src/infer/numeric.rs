//! Numeric coercion and minimal-width type selection.

use crate::types::{DataType, Value};

/// Magnitude bound under which fractional columns are stored as `float32`.
pub const FLOAT32_LIMIT: f64 = 3.4e38;

/// Signed integer widths in selection order, with their inclusive bounds.
const INTEGER_LADDER: [(DataType, i64, i64); 4] = [
    (DataType::Int8, i8::MIN as i64, i8::MAX as i64),
    (DataType::Int16, i16::MIN as i64, i16::MAX as i64),
    (DataType::Int32, i32::MIN as i64, i32::MAX as i64),
    (DataType::Int64, i64::MIN, i64::MAX),
];

/// A value that coerced to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// The value as an `i64` when it has no fractional part and fits.
    pub(crate) fn as_integral(self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i),
            Self::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Some(f as i64)
            }
            Self::Float(_) => None,
        }
    }
}

/// Coerce a cell to a number. Missing, `NaN` and unparseable cells yield `None`.
pub(crate) fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Null | Value::Complex(_) | Value::DateTime(_) => None,
        Value::Int8(v) => Some(Number::Int(i64::from(*v))),
        Value::Int16(v) => Some(Number::Int(i64::from(*v))),
        Value::Int32(v) => Some(Number::Int(i64::from(*v))),
        Value::Int64(v) => Some(Number::Int(*v)),
        Value::Float32(v) => float(f64::from(*v)),
        Value::Float64(v) => float(*v),
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Utf8(s) => parse_number(s),
        Value::Category(s) => parse_number(s),
    }
}

/// Parse trimmed text as an integer, then as a float.
pub(crate) fn parse_number(raw: &str) -> Option<Number> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    s.parse::<f64>().ok().and_then(float)
}

fn float(f: f64) -> Option<Number> {
    if f.is_nan() { None } else { Some(Number::Float(f)) }
}

/// Running statistics over the numbers seen in a chunk or column.
///
/// Missing values are never observed, so they cannot widen the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumericSummary {
    pub(crate) parsed: usize,
    all_integral: bool,
    min: i64,
    max: i64,
    max_abs: f64,
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self {
            parsed: 0,
            all_integral: true,
            min: i64::MAX,
            max: i64::MIN,
            max_abs: 0.0,
        }
    }
}

impl NumericSummary {
    pub(crate) fn observe(&mut self, n: Number) {
        self.parsed += 1;
        self.max_abs = self.max_abs.max(n.as_f64().abs());
        match n.as_integral() {
            Some(i) => {
                self.min = self.min.min(i);
                self.max = self.max.max(i);
            }
            None => self.all_integral = false,
        }
    }

    pub(crate) fn merge(&mut self, other: &Self) {
        self.parsed += other.parsed;
        self.all_integral &= other.all_integral;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.max_abs = self.max_abs.max(other.max_abs);
    }

    /// Narrowest integer width covering `[min, max]` when every value is integral, otherwise
    /// `float32` if every magnitude is below [`FLOAT32_LIMIT`], else `float64`.
    ///
    /// Returns `None` when nothing was parsed.
    pub(crate) fn select_type(&self) -> Option<DataType> {
        if self.parsed == 0 {
            return None;
        }
        if self.all_integral {
            return INTEGER_LADDER
                .iter()
                .find(|(_, lo, hi)| self.min >= *lo && self.max <= *hi)
                .map(|(dt, _, _)| *dt);
        }
        if self.max_abs < FLOAT32_LIMIT {
            Some(DataType::Float32)
        } else {
            Some(DataType::Float64)
        }
    }
}

/// Store `n` as `target`. Returns `None` when it does not fit an integer width or `target` is
/// not numeric.
pub(crate) fn to_numeric_value(n: Number, target: DataType) -> Option<Value> {
    match target {
        DataType::Int8 => n.as_integral().and_then(|i| i8::try_from(i).ok()).map(Value::Int8),
        DataType::Int16 => n.as_integral().and_then(|i| i16::try_from(i).ok()).map(Value::Int16),
        DataType::Int32 => n.as_integral().and_then(|i| i32::try_from(i).ok()).map(Value::Int32),
        DataType::Int64 => n.as_integral().map(Value::Int64),
        DataType::Float32 => Some(Value::Float32(n.as_f64() as f32)),
        DataType::Float64 => Some(Value::Float64(n.as_f64())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{NumericSummary, Number, coerce_number, parse_number, to_numeric_value};
    use crate::types::{DataType, Value};

    fn summary_of(values: &[&str]) -> NumericSummary {
        let mut s = NumericSummary::default();
        for v in values {
            if let Some(n) = parse_number(v) {
                s.observe(n);
            }
        }
        s
    }

    #[test]
    fn parse_number_handles_ints_floats_and_nan() {
        assert_eq!(parse_number(" 42 "), Some(Number::Int(42)));
        assert_eq!(parse_number("200.5"), Some(Number::Float(200.5)));
        assert_eq!(parse_number("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn loose_scalars_coerce() {
        assert_eq!(coerce_number(&Value::Bool(true)), Some(Number::Int(1)));
        assert_eq!(coerce_number(&Value::Float64(f64::NAN)), None);
        assert_eq!(coerce_number(&Value::Int16(-5)), Some(Number::Int(-5)));
        assert_eq!(coerce_number(&Value::Null), None);
    }

    #[test]
    fn integer_ladder_picks_narrowest_width() {
        assert_eq!(summary_of(&["-128", "127"]).select_type(), Some(DataType::Int8));
        assert_eq!(summary_of(&["-129", "0"]).select_type(), Some(DataType::Int16));
        assert_eq!(summary_of(&["40000"]).select_type(), Some(DataType::Int32));
        assert_eq!(summary_of(&["3000000000"]).select_type(), Some(DataType::Int64));
        // Integral floats count as integers.
        assert_eq!(summary_of(&["3.0", "4"]).select_type(), Some(DataType::Int8));
    }

    #[test]
    fn fractional_values_pick_float_width() {
        assert_eq!(summary_of(&["1.5", "2"]).select_type(), Some(DataType::Float32));
        assert_eq!(summary_of(&["1.5", "1e39"]).select_type(), Some(DataType::Float64));
        assert_eq!(summary_of(&["0.5", "inf"]).select_type(), Some(DataType::Float64));
    }

    #[test]
    fn empty_summary_selects_nothing() {
        assert_eq!(summary_of(&["x", ""]).select_type(), None);
    }

    #[test]
    fn merge_widens_range() {
        let mut a = summary_of(&["1", "2"]);
        let b = summary_of(&["-1000"]);
        a.merge(&b);
        assert_eq!(a.parsed, 3);
        assert_eq!(a.select_type(), Some(DataType::Int16));
    }

    #[test]
    fn conversion_respects_width() {
        assert_eq!(to_numeric_value(Number::Int(5), DataType::Int8), Some(Value::Int8(5)));
        assert_eq!(to_numeric_value(Number::Int(500), DataType::Int8), None);
        assert_eq!(to_numeric_value(Number::Float(2.5), DataType::Int32), None);
        assert_eq!(
            to_numeric_value(Number::Float(2.5), DataType::Float32),
            Some(Value::Float32(2.5))
        );
    }
}

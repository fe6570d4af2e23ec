//! Complex number parsing in the `a+bj` notation.

use crate::types::{Complex64, Value};

/// Result of coercing a single cell to a complex number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ComplexCell {
    Missing,
    Parsed(Complex64),
    Invalid,
}

/// Coerce a cell. Text `NaN` counts as missing; timestamps are invalid.
pub(crate) fn coerce_complex(value: &Value) -> ComplexCell {
    let parsed = match value {
        Value::Null => return ComplexCell::Missing,
        Value::DateTime(_) => return ComplexCell::Invalid,
        Value::Complex(c) => Some(*c),
        Value::Bool(b) => Some(Complex64::new(f64::from(u8::from(*b)), 0.0)),
        Value::Int8(v) => Some(Complex64::new(f64::from(*v), 0.0)),
        Value::Int16(v) => Some(Complex64::new(f64::from(*v), 0.0)),
        Value::Int32(v) => Some(Complex64::new(f64::from(*v), 0.0)),
        Value::Int64(v) => Some(Complex64::new(*v as f64, 0.0)),
        Value::Float32(v) => Some(Complex64::new(f64::from(*v), 0.0)),
        Value::Float64(v) => Some(Complex64::new(*v, 0.0)),
        Value::Utf8(s) => parse_complex(s),
        Value::Category(s) => parse_complex(s),
    };
    match parsed {
        Some(c) if c.re.is_nan() || c.im.is_nan() => ComplexCell::Missing,
        Some(c) => ComplexCell::Parsed(c),
        None => ComplexCell::Invalid,
    }
}

/// Parse `re`, `imj` or `re±imj` (optionally parenthesized, `j` or `J` suffix).
pub(crate) fn parse_complex(raw: &str) -> Option<Complex64> {
    let mut s = raw.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        s = inner.trim();
    }
    if s.is_empty() {
        return None;
    }

    let Some(body) = s.strip_suffix(['j', 'J']) else {
        return parse_part(s).map(|re| Complex64::new(re, 0.0));
    };

    // Split at the last sign that is not leading and not an exponent sign.
    let bytes = body.as_bytes();
    let split = body
        .char_indices()
        .rev()
        .find(|&(i, c)| (c == '+' || c == '-') && i > 0 && !matches!(bytes[i - 1], b'e' | b'E'))
        .map(|(i, _)| i);

    match split {
        Some(i) => Some(Complex64::new(parse_part(&body[..i])?, parse_imag(&body[i..])?)),
        None => Some(Complex64::new(0.0, parse_imag(body)?)),
    }
}

fn parse_imag(s: &str) -> Option<f64> {
    match s {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        _ => parse_part(s),
    }
}

fn parse_part(s: &str) -> Option<f64> {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return None;
    }
    s.parse::<f64>().ok()
}

//! Format-directed datetime parsing.
//!
//! [`parse_with_formats`] tries [`COMMON_DATE_FORMATS`] in order and returns the result of the
//! first format that parses at least one value. The first format with any success wins, even
//! when a later format would cover more of the column. If no format matches anything, values
//! are parsed one by one with a permissive set of layouts.

use chrono::format::{Item, Numeric, Parsed, StrftimeItems, parse_and_remainder};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::ConversionError;
use crate::types::Value;

/// Candidate date formats, tried in order.
pub const COMMON_DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%Y年%m月%d日",
    "%m/%d/%y",
];

/// Layouts tried per value once no candidate format matched the column.
const PERMISSIVE_FORMATS: [&str; 17] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y年%m月%d日",
    "%m/%d/%y",
];

/// Parse `values` with the first candidate format that matches at least one of them.
///
/// The result has the same length as `values`; `None` marks a missing or unparseable cell.
pub fn parse_with_formats(values: &[&Value]) -> Vec<Option<NaiveDateTime>> {
    for format in COMMON_DATE_FORMATS {
        let parsed: Vec<Option<NaiveDateTime>> =
            values.iter().map(|v| parse_value(v, format)).collect();
        if parsed.iter().any(Option::is_some) {
            return parsed;
        }
    }
    values.iter().map(|v| parse_permissive(v)).collect()
}

/// Parse `values` strictly against an explicit strftime `format`.
///
/// Unparseable cells become `None`. Fails only when `format` itself is invalid.
pub fn parse_with_format(
    values: &[&Value],
    format: &str,
) -> Result<Vec<Option<NaiveDateTime>>, ConversionError> {
    validate_format(format)?;
    Ok(values.iter().map(|v| parse_value(v, format)).collect())
}

/// Check that `format` is a usable strftime pattern.
pub fn validate_format(format: &str) -> Result<(), ConversionError> {
    let invalid = format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if invalid {
        return Err(ConversionError::InvalidFormat {
            format: format.to_string(),
        });
    }
    Ok(())
}

fn parse_value(value: &Value, format: &str) -> Option<NaiveDateTime> {
    match value {
        Value::Null => None,
        Value::DateTime(dt) => Some(*dt),
        other => {
            let text = other.as_text()?;
            parse_str(text.trim(), format)
        }
    }
}

fn parse_permissive(value: &Value) -> Option<NaiveDateTime> {
    let text = match value {
        Value::Null => return None,
        Value::DateTime(dt) => return Some(*dt),
        other => other.as_text()?,
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    PERMISSIVE_FORMATS
        .iter()
        .find_map(|format| parse_str(text, format))
}

/// Parse one string, accepting either a full date-time or a bare date (midnight).
///
/// `%Y` only matches a four-digit year.
pub(crate) fn parse_str(text: &str, format: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    let parsed = NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })?;
    has_four_digit_years(text, format).then_some(parsed)
}

/// chrono reads `%Y` as one to four digits; check each year field spans exactly four.
fn has_four_digit_years(text: &str, format: &str) -> bool {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches!(item, Item::Numeric(Numeric::Year, _)))
        .all(|(at, _)| {
            let mut scratch = Parsed::new();
            parse_and_remainder(&mut scratch, text, items[..at].iter()).is_ok_and(|rest| {
                let rest = rest.trim_start();
                let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
                digits == 4
            })
        })
}

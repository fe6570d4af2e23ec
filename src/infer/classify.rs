//! Automatic column classification.
//!
//! A column is split into fixed-size chunks. Pass one records a [`ChunkVerdict`] per chunk
//! (numeric → complex → datetime → category → text, first acceptance wins). The verdicts are
//! then resolved to one column type and pass two converts the column chunk by chunk in place.

use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;

use crate::observability::{ColumnOutcome, Emitter, Severity, TypeSource};
use crate::types::{DataSet, DataType, Value};

use super::complex::{ComplexCell, coerce_complex};
use super::convert::{CategoryPool, coerce_chunk};
use super::datetime::parse_with_formats;
use super::numeric::{NumericSummary, coerce_number};

/// Acceptance thresholds shared by every chunk of every column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Thresholds {
    /// Minimum fraction of a chunk that must coerce to numbers.
    pub numeric: f64,
    /// Distinct-value ratio below which text is categorical.
    pub category_cutoff: f64,
}

/// The kind a chunk voted for, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum VerdictKind {
    Numeric,
    Complex,
    DateTime,
    Category,
    Text,
    /// Every cell was missing.
    Empty,
}

const VOTING_KINDS: [VerdictKind; 5] = [
    VerdictKind::Numeric,
    VerdictKind::Complex,
    VerdictKind::DateTime,
    VerdictKind::Category,
    VerdictKind::Text,
];

/// Outcome of classifying one chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChunkVerdict {
    pub kind: VerdictKind,
    /// Numbers seen in the chunk, kept even when the chunk did not vote numeric.
    pub numeric: NumericSummary,
}

impl ChunkVerdict {
    /// The type this chunk would get on its own.
    pub(crate) fn candidate(&self) -> DataType {
        match self.kind {
            VerdictKind::Numeric => self.numeric.select_type().unwrap_or(DataType::Utf8),
            other => kind_type(other),
        }
    }
}

fn kind_type(kind: VerdictKind) -> DataType {
    match kind {
        VerdictKind::Complex => DataType::Complex,
        VerdictKind::DateTime => DataType::DateTime,
        VerdictKind::Category => DataType::Category,
        VerdictKind::Numeric | VerdictKind::Text | VerdictKind::Empty => DataType::Utf8,
    }
}

/// Classify one chunk.
pub(crate) fn classify_chunk(values: &[&Value], thresholds: &Thresholds) -> ChunkVerdict {
    let mut numeric = NumericSummary::default();
    let mut missing = 0usize;
    for v in values {
        if v.is_null() {
            missing += 1;
        } else if let Some(n) = coerce_number(v) {
            numeric.observe(n);
        }
    }
    let verdict = |kind| ChunkVerdict { kind, numeric };

    if missing == values.len() {
        return verdict(VerdictKind::Empty);
    }

    let len = values.len() as f64;
    if numeric.parsed > 0 && numeric.parsed as f64 / len >= thresholds.numeric {
        return verdict(VerdictKind::Numeric);
    }

    if is_complex_chunk(values) {
        return verdict(VerdictKind::Complex);
    }

    if parse_with_formats(values).iter().any(Option::is_some) {
        return verdict(VerdictKind::DateTime);
    }

    let distinct: HashSet<Cow<'_, str>> = values.iter().filter_map(|v| v.as_text()).collect();
    if (distinct.len() as f64 / len) < thresholds.category_cutoff {
        verdict(VerdictKind::Category)
    } else {
        verdict(VerdictKind::Text)
    }
}

/// Every non-missing cell parses as complex and at least one does.
fn is_complex_chunk(values: &[&Value]) -> bool {
    let mut any = false;
    for v in values {
        match coerce_complex(v) {
            ComplexCell::Invalid => return false,
            ComplexCell::Parsed(_) => any = true,
            ComplexCell::Missing => {}
        }
    }
    any
}

/// Column-wide decision derived from chunk verdicts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub data_type: DataType,
    /// False when non-empty chunks voted for different kinds.
    pub unanimous: bool,
    /// Non-zero vote counts in priority order.
    pub votes: Vec<(VerdictKind, usize)>,
}

/// Resolve chunk verdicts to a single column type.
///
/// Empty chunks do not vote. Unanimous kinds win outright; otherwise a kind needs a strict
/// majority of the votes, and without one the column is text. Numeric widths are re-selected
/// from the merged summary of every chunk so the type covers all numbers in the column.
pub(crate) fn resolve(verdicts: &[ChunkVerdict]) -> Resolution {
    let votes: Vec<(VerdictKind, usize)> = VOTING_KINDS
        .iter()
        .map(|kind| (*kind, verdicts.iter().filter(|v| v.kind == *kind).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    let total: usize = votes.iter().map(|(_, n)| n).sum();
    let winner = votes
        .iter()
        .find(|(_, n)| n * 2 > total)
        .map(|(kind, _)| *kind);

    let data_type = match winner {
        Some(VerdictKind::Numeric) => {
            let mut merged = NumericSummary::default();
            for v in verdicts {
                merged.merge(&v.numeric);
            }
            merged.select_type().unwrap_or(DataType::Utf8)
        }
        Some(kind) => kind_type(kind),
        None => DataType::Utf8,
    };

    Resolution {
        data_type,
        unanimous: votes.len() <= 1,
        votes,
    }
}

/// Classify and convert column `idx` of `dataset` in place.
pub(crate) fn classify_column(
    dataset: &mut DataSet,
    idx: usize,
    thresholds: &Thresholds,
    chunk_size: usize,
    emitter: &mut Emitter<'_>,
) -> DataType {
    let name = dataset.schema.fields[idx].name.clone();
    let ranges = chunk_ranges(dataset.row_count(), chunk_size);

    let table: &DataSet = dataset;
    let verdicts: Vec<ChunkVerdict> = ranges
        .iter()
        .map(|range| {
            let chunk = column_chunk(table, idx, range.clone());
            let verdict = classify_chunk(&chunk, thresholds);
            emitter.chunk(&name, range.clone(), verdict.candidate());
            verdict
        })
        .collect();

    let resolution = resolve(&verdicts);
    let data_type = resolution.data_type;
    if !resolution.unanimous {
        let split = resolution
            .votes
            .iter()
            .map(|(kind, n)| format!("{kind:?}={n}"))
            .collect::<Vec<_>>()
            .join(", ");
        emitter.diagnostic(
            &name,
            Severity::Warning,
            format!("chunks disagreed ({split}); column stored as {data_type}"),
        );
    }

    let mut pool = CategoryPool::default();
    for range in &ranges {
        let converted = {
            let chunk = column_chunk(dataset, idx, range.clone());
            coerce_chunk(&chunk, data_type, &mut pool)
        };
        for (row, value) in dataset.rows[range.clone()].iter_mut().zip(converted) {
            row[idx] = value;
        }
    }
    dataset.schema.fields[idx].data_type = data_type;

    emitter.column(ColumnOutcome {
        column: name,
        data_type,
        source: TypeSource::Inferred,
        chunks: ranges.len(),
    });
    data_type
}

fn column_chunk(dataset: &DataSet, idx: usize, range: Range<usize>) -> Vec<&Value> {
    dataset.rows[range].iter().map(|row| &row[idx]).collect()
}

/// Split `row_count` rows into consecutive ranges of at most `chunk_size` rows.
pub(crate) fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    if row_count == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(row_count.div_ceil(chunk_size));
    let mut start = 0usize;
    while start < row_count {
        let end = (start + chunk_size).min(row_count);
        out.push(start..end);
        start = end;
    }
    out
}

use std::collections::BTreeMap;

use crate::constants;
use crate::error::{EngineError, Result};
use crate::numeric::parse_number;
use crate::registry;
use crate::snapshot::{NeighborhoodSummary, Snapshot};
use crate::types::{CleanRecord, FieldView};

/// One page of filtered rows plus the total match count before paging.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: usize,
}

/// Read-only search over a dataset table.
///
/// `text_query` matches when its lowercased form is a substring of the
/// lowercased string form of any field. `field_filters` are exact-match,
/// case-insensitive, AND-composed with the text query. Negative offset or
/// limit clamp to 0; `limit == 0` means unlimited; an offset past the end
/// yields an empty page with `total` still correct.
pub fn filter_rows<T: FieldView + Clone>(
    rows: &[T],
    text_query: Option<&str>,
    field_filters: &BTreeMap<String, String>,
    offset: i64,
    limit: i64,
) -> Page<T> {
    let query = text_query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let matching: Vec<&T> = rows
        .iter()
        .filter(|row| {
            let fields = row.fields();

            if let Some(q) = &query {
                let hit = fields
                    .iter()
                    .any(|(_, v)| v.to_lowercase().contains(q.as_str()));
                if !hit {
                    return false;
                }
            }

            field_filters.iter().all(|(name, expected)| {
                fields
                    .iter()
                    .any(|(n, v)| *n == name.as_str() && v.eq_ignore_ascii_case(expected))
            })
        })
        .collect();

    let total = matching.len();
    let offset = offset.max(0) as usize;
    let limit = limit.max(0) as usize;

    let rows = matching
        .into_iter()
        .skip(offset)
        .take(if limit == 0 { usize::MAX } else { limit })
        .cloned()
        .collect();

    Page { rows, total }
}

/// Sums every numerically-coercible field across all rows. Fields that
/// never coerce are omitted entirely, not zeroed.
pub fn summarize_numeric<T: FieldView>(rows: &[T]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        for (name, value) in row.fields() {
            if let Some(v) = parse_number(&value) {
                *sums.entry(name.to_string()).or_insert(0.0) += v;
            }
        }
    }
    sums
}

/// Reads one metric off a summary, failing for names outside the fixed
/// list. Defined-but-absent values (densities without population) read
/// as 0.
pub fn metric_value(summary: &NeighborhoodSummary, metric: &str) -> Result<f64> {
    if !constants::is_known_metric(metric) {
        return Err(EngineError::UnknownMetric(metric.to_string()));
    }
    Ok(summary.metrics.get(metric).copied().unwrap_or(0.0))
}

/// Rows of one dataset table. An unknown slug is a client error; a known
/// slug with no rows in the current snapshot is an empty table.
pub fn dataset_rows<'a>(snapshot: &'a Snapshot, slug: &str) -> Result<&'a [CleanRecord]> {
    if !registry::is_known_slug(slug) {
        return Err(EngineError::UnknownDataset(slug.to_string()));
    }
    Ok(snapshot
        .datasets
        .get(slug)
        .map(|rows| rows.as_slice())
        .unwrap_or(&[]))
}

/// Summary for one normalized bairro key.
pub fn summary_for<'a>(snapshot: &'a Snapshot, key: &str) -> Result<&'a NeighborhoodSummary> {
    snapshot
        .summaries
        .get(key)
        .ok_or_else(|| EngineError::UnknownBairro(key.to_string()))
}

//! Local query engine.
//!
//! Executes a [`QueryRequest`] over an in-memory row set with the same
//! semantics the screening backend applies: case-insensitive search over
//! code and name, inclusive range filters, long-bull year ranges, opaque
//! text filters, stable sorting and page slicing.

use std::cmp::Ordering;

use crate::columns::{Columns, FilterKind, SortKind};
use crate::models::{FilterRange, FilterValue, QueryRequest, QueryResponse, Row, SortDir};

/// Long-bull ratings span one to five years ("长牛1年" .. "长牛5年").
const BULL_YEARS: std::ops::RangeInclusive<i64> = 1..=5;

/// Case-insensitive substring match against code or name.
pub fn matches_search(row: &Row, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    row.code.to_lowercase().contains(&needle) || row.name.to_lowercase().contains(&needle)
}

fn bound_f64(bound: &Option<FilterValue>) -> Option<f64> {
    bound.as_ref().and_then(FilterValue::as_f64)
}

fn bull_label_matches(row: &Row, range: &FilterRange) -> Option<bool> {
    let min = match &range.min {
        None => *BULL_YEARS.start(),
        Some(v) if v.is_blank() => *BULL_YEARS.start(),
        Some(v) => v.as_f64()? as i64,
    };
    let max = match &range.max {
        None => *BULL_YEARS.end(),
        Some(v) if v.is_blank() => *BULL_YEARS.end(),
        Some(v) => v.as_f64()? as i64,
    };
    let labels: Vec<String> = BULL_YEARS
        .filter(|y| (min..=max).contains(y))
        .map(|y| format!("长牛{y}年"))
        .collect();
    if labels.is_empty() {
        // No year in range: the backend adds no condition.
        return Some(true);
    }
    let label = row.text("bull_label").unwrap_or_default();
    Some(labels.contains(&label))
}

/// Whether `row` passes the filter on `key`.
pub fn matches_filter(row: &Row, key: &str, range: &FilterRange, kind: FilterKind) -> bool {
    if key == "bull_label"
        && let Some(matched) = bull_label_matches(row, range)
    {
        return matched;
    }

    match kind {
        FilterKind::Text => {
            let needle = match &range.min {
                Some(v) if !v.is_blank() => v.to_string().to_lowercase(),
                _ => return true,
            };
            row.text(key)
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        }
        FilterKind::Numeric => {
            let min = bound_f64(&range.min);
            let max = bound_f64(&range.max);
            if min.is_none() && max.is_none() {
                return true;
            }
            let Some(value) = row.numeric(key) else {
                return false;
            };
            min.is_none_or(|m| value >= m) && max.is_none_or(|m| value <= m)
        }
    }
}

/// Compares two rows on one column.
///
/// Numeric: missing or non-numeric values compare as negative infinity.
/// Lexicographic: missing values compare as the empty string.
pub fn compare_rows(a: &Row, b: &Row, key: &str, kind: SortKind) -> Ordering {
    match kind {
        SortKind::Numeric => {
            let va = a.numeric(key).unwrap_or(f64::NEG_INFINITY);
            let vb = b.numeric(key).unwrap_or(f64::NEG_INFINITY);
            va.total_cmp(&vb)
        }
        SortKind::Lexicographic => {
            let va = a.text(key).unwrap_or_default();
            let vb = b.text(key).unwrap_or_default();
            va.cmp(&vb)
        }
    }
}

/// Stable sort: rows with equal keys keep their relative order in both directions.
pub fn sort_rows(rows: &mut [Row], key: &str, kind: SortKind, dir: SortDir) {
    rows.sort_by(|a, b| {
        let ord = compare_rows(a, b, key, kind);
        if dir.is_ascending() { ord } else { ord.reverse() }
    });
}

/// Runs a query over `rows`, returning the requested page and the match count.
pub fn execute(rows: &[Row], req: &QueryRequest, columns: &Columns) -> QueryResponse {
    let search = req.search.as_deref().unwrap_or("");
    let mut matched: Vec<Row> = rows
        .iter()
        .filter(|row| matches_search(row, search))
        .filter(|row| {
            req.filters.iter().flatten().all(|(key, range)| {
                let kind = columns
                    .get(key)
                    .map(|c| c.filter_kind())
                    .unwrap_or(FilterKind::Numeric);
                matches_filter(row, key, range, kind)
            })
        })
        .cloned()
        .collect();

    match req.sort_key.as_deref() {
        Some(key) => {
            let kind = columns
                .get(key)
                .map(|c| c.sort_kind())
                .unwrap_or(SortKind::Numeric);
            sort_rows(&mut matched, key, kind, req.sort_dir);
        }
        None => sort_rows(&mut matched, "code", SortKind::Lexicographic, SortDir::Asc),
    }

    let total = matched.len() as u64;
    let page = req.page.max(1) as usize;
    let start = (page - 1).saturating_mul(req.page_size);
    let data = matched
        .into_iter()
        .skip(start)
        .take(req.page_size)
        .collect();

    QueryResponse {
        data,
        total,
        page: Some(req.page),
        page_size: Some(req.page_size),
    }
}

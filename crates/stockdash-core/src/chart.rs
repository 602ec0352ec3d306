//! History chart loader.
//!
//! One chart is open at a time. Opening a chart always refetches; a
//! response for a chart that has since been closed or replaced is ignored.

use chrono::NaiveDate;
use tracing::debug;

use crate::backend::Backend;
use crate::columns::ColumnDef;
use crate::error::ApiError;
use crate::models::HistoryResponse;

/// What to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTarget {
    pub code: String,
    pub field_key: String,
    pub field_label: String,
    pub suffix: String,
}

impl ChartTarget {
    pub fn for_column(code: &str, column: &ColumnDef) -> Self {
        Self {
            code: code.to_string(),
            field_key: column.key.clone(),
            field_label: column.label.clone(),
            suffix: column.suffix_str().to_string(),
        }
    }
}

/// `GET /history/{code}` to run for the open chart.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub generation: u64,
    pub code: String,
}

/// One metric over time. `None` values are gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub target: ChartTarget,
    /// Stock name from the history response.
    pub name: String,
    pub points: Vec<(String, Option<f64>)>,
}

impl ChartSeries {
    pub fn from_history(target: ChartTarget, history: HistoryResponse) -> Self {
        let points = history
            .history
            .iter()
            .map(|entry| (entry.date.clone(), entry.numeric(&target.field_key)))
            .collect();
        Self {
            target,
            name: history.name,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(|(_, v)| v.is_none())
    }

    /// Contiguous runs of present values as `(index, value)` pairs.
    ///
    /// A line is drawn within a run, never across a gap.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, (_, value)) in self.points.iter().enumerate() {
            match value {
                Some(v) => current.push((i as f64, *v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Min and max over present values.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|(_, v)| *v)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// First and last parseable dates, for axis labels.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self
            .points
            .iter()
            .filter_map(|(d, _)| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let first = dates.next()?;
        let last = dates.last().unwrap_or(first);
        Some((first, last))
    }

    /// Latest present value.
    pub fn last_value(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChartState {
    #[default]
    Idle,
    Loading(ChartTarget),
    Ready(ChartSeries),
    Failed {
        target: ChartTarget,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct ChartLoader {
    state: ChartState,
    generation: u64,
}

impl ChartLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, ChartState::Idle)
    }

    /// Shows the loading state and returns the history fetch to run.
    pub fn open(&mut self, target: ChartTarget) -> HistoryRequest {
        self.generation += 1;
        debug!(code = %target.code, field = %target.field_key, "open chart");
        let request = HistoryRequest {
            generation: self.generation,
            code: target.code.clone(),
        };
        self.state = ChartState::Loading(target);
        request
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.state = ChartState::Idle;
    }

    /// Applies a history response. Returns false when it was stale.
    pub fn apply(&mut self, generation: u64, result: Result<HistoryResponse, ApiError>) -> bool {
        if generation != self.generation || !matches!(self.state, ChartState::Loading(_)) {
            return false;
        }
        let ChartState::Loading(target) = std::mem::take(&mut self.state) else {
            return false;
        };
        self.state = match result {
            Ok(history) => ChartState::Ready(ChartSeries::from_history(target, history)),
            Err(e) => ChartState::Failed {
                target,
                message: e.to_string(),
            },
        };
        true
    }
}

/// Opens a chart and waits for its data.
pub async fn load(loader: &mut ChartLoader, backend: &dyn Backend, target: ChartTarget) {
    let request = loader.open(target);
    let result = backend.history(&request.code).await;
    loader.apply(request.generation, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::columns::Columns;
    use crate::models::{HistoryEntry, Row};
    use serde_json::json;

    fn entry(date: &str, value: serde_json::Value) -> HistoryEntry {
        let mut e = HistoryEntry {
            date: date.to_string(),
            ..HistoryEntry::default()
        };
        e.fields.insert("PEG".into(), value);
        e
    }

    fn target() -> ChartTarget {
        ChartTarget {
            code: "00700".into(),
            field_key: "PEG".into(),
            field_label: "PEG".into(),
            suffix: String::new(),
        }
    }

    fn series() -> ChartSeries {
        ChartSeries::from_history(
            target(),
            HistoryResponse {
                name: "腾讯控股".into(),
                history: vec![
                    entry("2024-01-02", json!(1.0)),
                    entry("2024-01-03", json!("N/A")),
                    entry("2024-01-04", json!("1.5")),
                    entry("2024-01-05", json!(2.0)),
                    entry("2024-01-08", json!(null)),
                ],
            },
        )
    }

    #[test]
    fn unparseable_values_are_gaps_not_zero() {
        let s = series();
        let values: Vec<Option<f64>> = s.points.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![Some(1.0), None, Some(1.5), Some(2.0), None]);
        assert_eq!(s.segments(), vec![vec![(0.0, 1.0)], vec![(2.0, 1.5), (3.0, 2.0)]]);
        assert_eq!(s.bounds(), Some((1.0, 2.0)));
        assert_eq!(s.last_value(), Some(2.0));
    }

    #[test]
    fn date_range_spans_the_series() {
        let (first, last) = series().date_range().unwrap();
        assert_eq!(first.to_string(), "2024-01-02");
        assert_eq!(last.to_string(), "2024-01-08");
    }

    #[test]
    fn stale_response_is_ignored() {
        let mut loader = ChartLoader::new();
        let first = loader.open(target());
        let second = loader.open(target());
        assert!(!loader.apply(first.generation, Err(ApiError::Transport("late".into()))));
        assert!(matches!(loader.state(), ChartState::Loading(_)));

        assert!(loader.apply(second.generation, Err(ApiError::Transport("down".into()))));
        assert!(matches!(loader.state(), ChartState::Failed { .. }));

        let third = loader.open(target());
        loader.close();
        assert!(!loader.apply(third.generation, Ok(HistoryResponse::default())));
        assert!(!loader.is_open());
    }

    #[tokio::test]
    async fn loads_from_backend_every_time() {
        let cols = Columns::builtin();
        let backend = MemoryBackend::new(vec![Row::new("00700", "腾讯控股")], cols.clone());
        backend.set_history("00700", vec![entry("2024-01-02", json!(0.8))]);

        let mut loader = ChartLoader::new();
        let peg = cols.get("PEG").unwrap();
        load(&mut loader, &backend, ChartTarget::for_column("00700", peg)).await;
        let ChartState::Ready(s) = loader.state() else {
            panic!("expected ready, got {:?}", loader.state());
        };
        assert_eq!(s.name, "腾讯控股");
        assert_eq!(s.points.len(), 1);

        backend.set_history("00700", vec![]);
        load(&mut loader, &backend, ChartTarget::for_column("00700", peg)).await;
        let ChartState::Ready(s) = loader.state() else {
            panic!("expected ready");
        };
        assert!(s.is_empty());
    }
}

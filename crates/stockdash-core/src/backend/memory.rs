//! In-process backend.
//!
//! Holds a fixed row set plus mutable templates, schedule and a simulated
//! background task. Queries go through [`crate::query::execute`], so
//! paging, filtering and sorting behave like the real service.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use super::Backend;
use super::demo::{demo_history, demo_rows};
use crate::columns::Columns;
use crate::error::ApiError;
use crate::models::{
    ActionReply, FilterTemplate, HistoryEntry, HistoryResponse, QueryRequest, QueryResponse, Row,
    Schedule, TaskStatus,
};
use crate::query;

/// Rows in the `--demo` data set.
pub const DEMO_ROW_COUNT: usize = 180;
/// Steps a simulated task takes from start to finish.
const TASK_STEPS: u64 = 5;

#[derive(Debug, Default)]
struct State {
    templates: BTreeMap<String, FilterTemplate>,
    schedule: Schedule,
    status: TaskStatus,
    history: HashMap<String, Vec<HistoryEntry>>,
    query_failures: VecDeque<ApiError>,
}

/// Backend double that answers from memory.
#[derive(Debug)]
pub struct MemoryBackend {
    rows: Vec<Row>,
    columns: Columns,
    state: Mutex<State>,
    queries: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(rows: Vec<Row>, columns: Columns) -> Self {
        Self {
            rows,
            columns,
            state: Mutex::new(State::default()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Deterministic demo data with generated history for every code.
    pub fn demo() -> Self {
        let rows = demo_rows(DEMO_ROW_COUNT);
        let backend = Self::new(rows, Columns::builtin());
        {
            let mut state = backend.lock();
            for row in &backend.rows {
                state
                    .history
                    .insert(row.code.clone(), demo_history(&row.code));
            }
        }
        backend
    }

    /// Replaces the history returned for `code`.
    pub fn set_history(&self, code: &str, history: Vec<HistoryEntry>) {
        self.lock().history.insert(code.to_string(), history);
    }

    /// Makes the next `query_stocks` call fail with `error`.
    pub fn fail_next_query(&self, error: ApiError) {
        self.lock().query_failures.push_back(error);
    }

    /// Number of `query_stocks` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start_task(&self, message: &str) -> ActionReply {
        let mut state = self.lock();
        if state.status.is_running {
            return ActionReply::rejected("任务已在运行中");
        }
        state.status = TaskStatus {
            is_running: true,
            current: 0,
            total: TASK_STEPS,
            message: message.to_string(),
        };
        info!(task = message, "simulated task started");
        ActionReply::ok(format!("{message}已启动"))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query_stocks(&self, req: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = self.lock().query_failures.pop_front() {
            debug!(%error, "injected query failure");
            return Err(error);
        }
        Ok(query::execute(&self.rows, req, &self.columns))
    }

    async fn history(&self, code: &str) -> Result<HistoryResponse, ApiError> {
        // Unknown codes get an empty series named after the code.
        let name = self
            .rows
            .iter()
            .find(|r| r.code == code)
            .map_or_else(|| code.to_string(), |r| r.name.clone());
        let history = self.lock().history.get(code).cloned().unwrap_or_default();
        Ok(HistoryResponse { name, history })
    }

    async fn templates(&self) -> Result<Vec<FilterTemplate>, ApiError> {
        Ok(self.lock().templates.values().cloned().collect())
    }

    async fn save_template(&self, template: &FilterTemplate) -> Result<ActionReply, ApiError> {
        let name = template.name.trim();
        if name.is_empty() {
            return Ok(ActionReply::rejected("模版名称不能为空"));
        }
        if template.filters.is_empty() {
            return Ok(ActionReply::rejected("筛选条件不能为空"));
        }
        let stored = FilterTemplate {
            name: name.to_string(),
            filters: template.filters.clone(),
        };
        self.lock().templates.insert(stored.name.clone(), stored);
        Ok(ActionReply::ok("模版保存成功"))
    }

    async fn delete_template(&self, name: &str) -> Result<ActionReply, ApiError> {
        match self.lock().templates.remove(name) {
            Some(_) => Ok(ActionReply::ok("模版删除成功")),
            None => Ok(ActionReply::rejected("模版不存在")),
        }
    }

    async fn schedule(&self) -> Result<Schedule, ApiError> {
        Ok(self.lock().schedule.clone())
    }

    async fn set_schedule(&self, schedule: &Schedule) -> Result<ActionReply, ApiError> {
        if let Err(e) = schedule.validate() {
            return Ok(ActionReply::rejected(e.to_string()));
        }
        self.lock().schedule = schedule.clone();
        Ok(ActionReply::ok(format!("定时任务已更新: {schedule}")))
    }

    async fn trigger_crawl(&self) -> Result<ActionReply, ApiError> {
        Ok(self.start_task("数据抓取"))
    }

    async fn stop_crawl(&self) -> Result<ActionReply, ApiError> {
        let mut state = self.lock();
        if !state.status.is_running {
            return Ok(ActionReply::rejected("没有正在运行的任务"));
        }
        state.status.is_running = false;
        state.status.message = "任务已停止".to_string();
        Ok(ActionReply::ok("已发送停止信号"))
    }

    async fn recalculate(&self) -> Result<ActionReply, ApiError> {
        Ok(self.start_task("指标重算"))
    }

    async fn restart(&self) -> Result<ActionReply, ApiError> {
        let mut state = self.lock();
        state.status = TaskStatus::default();
        Ok(ActionReply::ok("服务重启中"))
    }

    /// Each poll advances a running task by one step.
    async fn status(&self) -> Result<TaskStatus, ApiError> {
        let mut state = self.lock();
        let status = &mut state.status;
        if status.is_running {
            status.current += 1;
            if status.current >= status.total {
                status.is_running = false;
                status.message = "任务完成".to_string();
            }
        }
        Ok(status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterMap, FilterRange, SortDir};

    fn backend(n: usize) -> MemoryBackend {
        let rows = (0..n)
            .map(|i| Row::new(format!("{i:05}"), format!("stock {i}")).with("PEG", i as f64))
            .collect();
        MemoryBackend::new(rows, Columns::builtin())
    }

    fn page(page: u32) -> QueryRequest {
        QueryRequest {
            page,
            page_size: 50,
            sort_key: None,
            sort_dir: SortDir::Asc,
            filters: None,
            search: None,
        }
    }

    #[tokio::test]
    async fn pages_through_the_row_set() {
        let b = backend(120);
        let sizes = [
            b.query_stocks(&page(1)).await.unwrap().data.len(),
            b.query_stocks(&page(2)).await.unwrap().data.len(),
            b.query_stocks(&page(3)).await.unwrap().data.len(),
        ];
        assert_eq!(sizes, [50, 50, 20]);
        assert_eq!(b.query_count(), 3);
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let b = backend(5);
        b.fail_next_query(ApiError::Transport("boom".into()));
        assert!(b.query_stocks(&page(1)).await.is_err());
        assert_eq!(b.query_stocks(&page(1)).await.unwrap().total, 5);
    }

    #[tokio::test]
    async fn templates_round_trip_and_reject_bad_input() {
        let b = backend(1);
        let mut filters = FilterMap::new();
        filters.insert("PEG".into(), FilterRange::numeric(Some(0.0), Some(0.5)));

        let blank = FilterTemplate {
            name: "  ".into(),
            filters: filters.clone(),
        };
        let reply = b.save_template(&blank).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message, "模版名称不能为空");

        let good = FilterTemplate {
            name: "cheap".into(),
            filters,
        };
        assert!(b.save_template(&good).await.unwrap().success);
        assert_eq!(b.templates().await.unwrap(), vec![good]);

        assert!(b.delete_template("cheap").await.unwrap().success);
        let missing = b.delete_template("cheap").await.unwrap();
        assert_eq!(missing.into_result(), Err(ApiError::Rejected("模版不存在".into())));
    }

    #[tokio::test]
    async fn simulated_task_runs_to_completion() {
        let b = backend(1);
        assert!(b.trigger_crawl().await.unwrap().success);
        assert!(!b.recalculate().await.unwrap().success);

        let mut polls = 0;
        while b.status().await.unwrap().is_running {
            polls += 1;
            assert!(polls < 10);
        }
        assert_eq!(polls as u64, TASK_STEPS - 1);
        assert!(!b.stop_crawl().await.unwrap().success);
    }

    #[tokio::test]
    async fn history_for_unknown_code_is_empty() {
        let b = backend(1);
        let h = b.history("99999").await.unwrap();
        assert_eq!(h.name, "99999");
        assert!(h.history.is_empty());
        assert_eq!(b.history("00000").await.unwrap().name, "stock 0");
    }

    #[tokio::test]
    async fn demo_backend_serves_history() {
        let b = MemoryBackend::demo();
        assert_eq!(b.rows().len(), DEMO_ROW_COUNT);
        let h = b.history("00700").await.unwrap();
        assert_eq!(h.name, "腾讯控股");
        assert!(!h.history.is_empty());
    }
}

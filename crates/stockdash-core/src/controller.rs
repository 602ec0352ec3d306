//! Table view controller.
//!
//! Owns the query state (search, sort, filters), the pagination cursor and
//! the loaded rows. The controller does no I/O: every operation that needs
//! data returns a [`FetchRequest`], the caller runs it against a
//! [`Backend`] and feeds the outcome back through
//! [`TableController::apply`].
//!
//! Each query-state change bumps a generation counter. Responses carry the
//! generation they were issued under and are dropped when it no longer
//! matches, so a slow page fetch can never append rows to a newer result.

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::columns::{Columns, FilterKind, SortKind};
use crate::error::{ApiError, FilterError};
use crate::models::{
    FilterMap, FilterRange, FilterValue, QueryRequest, QueryResponse, Row, SortDir, parse_number,
};
use crate::query;

/// Active sort column.
#[derive(Debug, Clone, PartialEq)]
pub struct SortState {
    pub key: String,
    pub dir: SortDir,
    pub kind: SortKind,
}

/// Everything that shapes the result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Trimmed search text, empty when unset.
    pub search: String,
    pub sort: Option<SortState>,
    pub filters: FilterMap,
}

/// Pagination cursor. `page` is the next page to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub page: u32,
    pub page_size: usize,
    pub has_more: bool,
    pub is_loading: bool,
}

impl Cursor {
    fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            has_more: true,
            is_loading: false,
        }
    }
}

/// Where sort changes are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Sort is part of the query; changing it refetches from page 1.
    #[default]
    Server,
    /// Loaded rows are re-sorted in place without a fetch.
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page of a new query; replaces rows.
    Reset,
    /// Subsequent page; appends rows.
    Page,
}

/// A query the caller must run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub kind: FetchKind,
    pub query: QueryRequest,
}

impl FetchRequest {
    /// Pairs this request with its outcome.
    pub fn complete(self, result: Result<QueryResponse, ApiError>) -> FetchResponse {
        FetchResponse {
            generation: self.generation,
            kind: self.kind,
            result,
        }
    }
}

/// Outcome of a [`FetchRequest`].
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub generation: u64,
    pub kind: FetchKind,
    pub result: Result<QueryResponse, ApiError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// Issued under an older generation; state untouched.
    Stale,
}

pub struct TableController {
    columns: Columns,
    query: QueryState,
    cursor: Cursor,
    sort_mode: SortMode,
    generation: u64,
    rows: Vec<Row>,
    total: Option<u64>,
    /// Reset fetch failure, shown in place of rows.
    error: Option<ApiError>,
    /// Page fetch failure, shown as a retry notice below the rows.
    page_error: Option<ApiError>,
}

impl TableController {
    pub fn new(columns: Columns, page_size: usize) -> Self {
        Self {
            columns,
            query: QueryState::default(),
            cursor: Cursor::new(page_size.max(1)),
            sort_mode: SortMode::default(),
            generation: 0,
            rows: Vec::new(),
            total: None,
            error: None,
            page_error: None,
        }
    }

    pub fn with_sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Match count reported by the last successful fetch.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn page_error(&self) -> Option<&ApiError> {
        self.page_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.cursor.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more
    }

    /// True when `apply` re-sorts every loaded row, so an appended page
    /// may land anywhere in `rows()`.
    pub fn sorts_locally(&self) -> bool {
        self.sort_mode == SortMode::Client && self.query.sort.is_some()
    }

    /// True once a short page has been received: every match is loaded.
    pub fn all_loaded(&self) -> bool {
        !self.cursor.has_more && self.error.is_none()
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Starts over from page 1 with the current query state.
    pub fn reset_and_query(&mut self) -> FetchRequest {
        self.generation += 1;
        self.rows.clear();
        self.total = None;
        self.error = None;
        self.page_error = None;
        self.cursor.page = 1;
        self.cursor.has_more = true;
        self.cursor.is_loading = true;
        debug!(generation = self.generation, "reset query");
        self.request(FetchKind::Reset)
    }

    /// Requests the next page, or `None` when exhausted or already loading.
    pub fn load_next_page(&mut self) -> Option<FetchRequest> {
        if !self.cursor.has_more || self.cursor.is_loading {
            return None;
        }
        self.cursor.is_loading = true;
        self.page_error = None;
        debug!(page = self.cursor.page, "load next page");
        Some(self.request(FetchKind::Page))
    }

    /// Same query, fresh data.
    pub fn refresh(&mut self) -> FetchRequest {
        self.reset_and_query()
    }

    /// Sets or clears the filter on `key`.
    ///
    /// Blank bounds count as unset; both unset removes the filter. On error
    /// the query state is unchanged and nothing is fetched.
    pub fn set_filter(
        &mut self,
        key: &str,
        min: Option<&str>,
        max: Option<&str>,
    ) -> Result<FetchRequest, FilterError> {
        let column = self
            .columns
            .get(key)
            .ok_or_else(|| FilterError::UnknownColumn(key.to_string()))?;
        let min = min.map(str::trim).filter(|s| !s.is_empty());
        let max = max.map(str::trim).filter(|s| !s.is_empty());

        let range = match column.filter_kind() {
            FilterKind::Text => min.map(FilterRange::text),
            FilterKind::Numeric => {
                let parse = |raw: Option<&str>| -> Result<Option<f64>, FilterError> {
                    raw.map(|s| {
                        parse_number(s).ok_or_else(|| FilterError::InvalidNumber {
                            column: key.to_string(),
                            value: s.to_string(),
                        })
                    })
                    .transpose()
                };
                let (lo, hi) = (parse(min)?, parse(max)?);
                if let (Some(lo), Some(hi)) = (lo, hi)
                    && lo > hi
                {
                    return Err(FilterError::InvertedRange {
                        column: key.to_string(),
                        min: lo,
                        max: hi,
                    });
                }
                (lo.is_some() || hi.is_some()).then(|| FilterRange::numeric(lo, hi))
            }
        };

        match range {
            Some(range) => {
                self.query.filters.insert(key.to_string(), range);
            }
            None => {
                self.query.filters.remove(key);
            }
        }
        Ok(self.reset_and_query())
    }

    /// Replaces all filters, e.g. from a template. Inactive ranges are dropped.
    pub fn apply_filters(&mut self, filters: FilterMap) -> FetchRequest {
        self.query.filters = filters
            .into_iter()
            .filter(|(_, range)| range.is_active())
            .collect();
        self.reset_and_query()
    }

    pub fn clear_filters(&mut self) -> FetchRequest {
        self.query.filters.clear();
        self.reset_and_query()
    }

    /// Sorts by `key`: the same key flips direction, a new key starts ascending.
    ///
    /// Returns the fetch to run, or `None` in [`SortMode::Client`] where
    /// the loaded rows are re-sorted in place.
    pub fn set_sort(
        &mut self,
        key: &str,
        kind: SortKind,
    ) -> Result<Option<FetchRequest>, FilterError> {
        let column = self
            .columns
            .get(key)
            .ok_or_else(|| FilterError::UnknownColumn(key.to_string()))?;
        if column.no_sort {
            return Err(FilterError::NotSortable(key.to_string()));
        }

        let dir = match &self.query.sort {
            Some(current) if current.key == key => current.dir.flip(),
            _ => SortDir::Asc,
        };
        self.query.sort = Some(SortState {
            key: key.to_string(),
            dir,
            kind,
        });

        match self.sort_mode {
            SortMode::Server => Ok(Some(self.reset_and_query())),
            SortMode::Client => {
                query::sort_rows(&mut self.rows, key, kind, dir);
                Ok(None)
            }
        }
    }

    /// Returns to the backend's default order.
    pub fn clear_sort(&mut self) -> Option<FetchRequest> {
        self.query.sort = None;
        match self.sort_mode {
            SortMode::Server => Some(self.reset_and_query()),
            SortMode::Client => {
                query::sort_rows(&mut self.rows, "code", SortKind::Lexicographic, SortDir::Asc);
                None
            }
        }
    }

    pub fn set_search(&mut self, text: &str) -> FetchRequest {
        self.query.search = text.trim().to_string();
        self.reset_and_query()
    }

    /// Applies a completed fetch.
    pub fn apply(&mut self, response: FetchResponse) -> Applied {
        if response.generation != self.generation {
            debug!(
                got = response.generation,
                current = self.generation,
                "discarding stale response"
            );
            return Applied::Stale;
        }
        self.cursor.is_loading = false;

        match (response.kind, response.result) {
            (kind, Ok(resp)) => {
                let received = resp.data.len();
                match kind {
                    FetchKind::Reset => self.rows = resp.data,
                    FetchKind::Page => self.rows.extend(resp.data),
                }
                if self.sort_mode == SortMode::Client
                    && let Some(sort) = &self.query.sort
                {
                    query::sort_rows(&mut self.rows, &sort.key, sort.kind, sort.dir);
                }
                if received < self.cursor.page_size {
                    self.cursor.has_more = false;
                }
                if received > 0 {
                    self.cursor.page += 1;
                }
                self.total = Some(resp.total);
                debug!(received, loaded = self.rows.len(), total = resp.total, "page applied");
            }
            (FetchKind::Reset, Err(e)) => {
                warn!(error = %e, "query failed");
                self.rows.clear();
                self.cursor.has_more = false;
                self.error = Some(e);
            }
            (FetchKind::Page, Err(e)) => {
                warn!(error = %e, page = self.cursor.page, "page fetch failed");
                self.page_error = Some(e);
            }
        }
        Applied::Applied
    }

    fn request(&self, kind: FetchKind) -> FetchRequest {
        let filters = (!self.query.filters.is_empty()).then(|| self.query.filters.clone());
        let search = (!self.query.search.is_empty()).then(|| self.query.search.clone());
        let (sort_key, sort_dir) = match (&self.query.sort, self.sort_mode) {
            (Some(sort), SortMode::Server) => (Some(sort.key.clone()), sort.dir),
            _ => (None, SortDir::Asc),
        };
        FetchRequest {
            generation: self.generation,
            kind,
            query: QueryRequest {
                page: self.cursor.page,
                page_size: self.cursor.page_size,
                sort_key,
                sort_dir,
                filters,
                search,
            },
        }
    }
}

/// Text form of an active filter bound, for editing.
pub fn bound_text(bound: &Option<FilterValue>) -> String {
    bound.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Runs `request` against `backend` and applies the result.
pub async fn fetch(
    controller: &mut TableController,
    backend: &dyn Backend,
    request: FetchRequest,
) -> Applied {
    let result = backend.query_stocks(&request.query).await;
    controller.apply(request.complete(result))
}

/// Fetches every remaining page. Used by the CLI `--all` mode.
pub async fn fetch_all(controller: &mut TableController, backend: &dyn Backend) {
    while let Some(request) = controller.load_next_page() {
        fetch(controller, backend, request).await;
        if controller.page_error().is_some() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::fmt::{Badge, format_cell};

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new(format!("{i:06}"), format!("stock {i}")).with("PEG", i as f64 / 100.0))
            .collect()
    }

    fn setup(n: usize) -> (TableController, MemoryBackend) {
        let backend = MemoryBackend::new(rows(n), Columns::builtin());
        (TableController::new(Columns::builtin(), 50), backend)
    }

    #[tokio::test]
    async fn pages_120_rows_as_50_50_20() {
        let (mut ctl, backend) = setup(120);
        let req = ctl.reset_and_query();
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.rows().len(), 50);
        assert!(ctl.has_more());

        let req = ctl.load_next_page().unwrap();
        assert_eq!(req.query.page, 2);
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.rows().len(), 100);
        assert!(ctl.has_more());

        let req = ctl.load_next_page().unwrap();
        assert_eq!(req.query.page, 3);
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.rows().len(), 120);
        assert!(!ctl.has_more());
        assert!(ctl.all_loaded());
        assert!(ctl.load_next_page().is_none());
        assert_eq!(backend.query_count(), 3);
    }

    #[tokio::test]
    async fn exact_multiple_needs_an_empty_page_to_finish() {
        let (mut ctl, backend) = setup(100);
        let req = ctl.reset_and_query();
        fetch(&mut ctl, &backend, req).await;
        let req = ctl.load_next_page().unwrap();
        fetch(&mut ctl, &backend, req).await;
        assert!(ctl.has_more());

        let req = ctl.load_next_page().unwrap();
        fetch(&mut ctl, &backend, req).await;
        assert!(!ctl.has_more());
        assert_eq!(ctl.rows().len(), 100);
        assert_eq!(ctl.cursor().page, 3);
    }

    #[test]
    fn no_second_page_request_while_loading() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let _reset = ctl.reset_and_query();
        assert!(ctl.load_next_page().is_none());

        ctl.apply(FetchResponse {
            generation: ctl.generation(),
            kind: FetchKind::Reset,
            result: Ok(QueryResponse {
                data: rows(50),
                total: 120,
                ..QueryResponse::default()
            }),
        });
        let first = ctl.load_next_page();
        assert!(first.is_some());
        assert!(ctl.load_next_page().is_none());
    }

    #[test]
    fn stale_page_is_discarded_after_reset() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let reset = ctl.reset_and_query();
        ctl.apply(reset.complete(Ok(QueryResponse {
            data: rows(50),
            total: 120,
            ..QueryResponse::default()
        })));
        let stale_page = ctl.load_next_page().unwrap();

        let fresh = ctl.set_search("stock 1");
        assert_eq!(
            ctl.apply(stale_page.complete(Ok(QueryResponse {
                data: rows(50),
                total: 120,
                ..QueryResponse::default()
            }))),
            Applied::Stale
        );
        assert!(ctl.rows().is_empty());
        assert!(ctl.is_loading());

        let applied = ctl.apply(fresh.complete(Ok(QueryResponse {
            data: rows(3),
            total: 3,
            ..QueryResponse::default()
        })));
        assert_eq!(applied, Applied::Applied);
        assert_eq!(ctl.rows().len(), 3);
    }

    #[tokio::test]
    async fn peg_filter_shows_only_cheap_rows_with_badge() {
        let backend = MemoryBackend::new(
            vec![
                Row::new("A", "a").with("PEG", 0.3),
                Row::new("B", "b").with("PEG", 0.6),
                Row::new("C", "c").with("PEG", 1.2),
                Row::new("D", "d").with("PEG", "N/A"),
            ],
            Columns::builtin(),
        );
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let req = ctl.set_filter("PEG", Some("0"), Some("0.5")).unwrap();
        assert_eq!(
            req.query.filters.as_ref().unwrap()["PEG"],
            FilterRange::numeric(Some(0.0), Some(0.5))
        );
        fetch(&mut ctl, &backend, req).await;

        let codes: Vec<&str> = ctl.rows().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A"]);
        let peg = ctl.columns().get("PEG").unwrap();
        assert_eq!(format_cell(peg, &ctl.rows()[0]).badge, Some(Badge::VeryLow));
    }

    #[tokio::test]
    async fn search_matches_code_substring() {
        let backend = MemoryBackend::new(
            vec![
                Row::new("600519", "贵州茅台"),
                Row::new("000001", "平安银行"),
                Row::new("300600", "瑞特股份"),
            ],
            Columns::builtin(),
        );
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let req = ctl.set_search("  600 ");
        assert_eq!(req.query.search.as_deref(), Some("600"));
        fetch(&mut ctl, &backend, req).await;
        assert!(ctl.rows().iter().all(|r| r.code.contains("600")));
        assert_eq!(ctl.rows().len(), 2);
    }

    #[test]
    fn sort_toggles_and_resets_direction() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let first = ctl.set_sort("PEG", SortKind::Numeric).unwrap().unwrap();
        assert_eq!(first.query.sort_dir, SortDir::Asc);
        let second = ctl.set_sort("PEG", SortKind::Numeric).unwrap().unwrap();
        assert_eq!(second.query.sort_dir, SortDir::Desc);
        let third = ctl.set_sort("PEG", SortKind::Numeric).unwrap().unwrap();
        assert_eq!(third.query.sort_dir, SortDir::Asc);

        ctl.set_sort("PEG", SortKind::Numeric).unwrap();
        let other = ctl.set_sort("市盈率", SortKind::Numeric).unwrap().unwrap();
        assert_eq!(other.query.sort_key.as_deref(), Some("市盈率"));
        assert_eq!(other.query.sort_dir, SortDir::Asc);

        let cleared = ctl.clear_sort().unwrap();
        assert_eq!(cleared.query.sort_key, None);
    }

    #[test]
    fn client_sort_mode_resorts_without_fetching() {
        let mut ctl = TableController::new(Columns::builtin(), 50).with_sort_mode(SortMode::Client);
        let reset = ctl.reset_and_query();
        ctl.apply(reset.complete(Ok(QueryResponse {
            data: vec![
                Row::new("A", "a").with("PEG", 2.0),
                Row::new("B", "b"),
                Row::new("C", "c").with("PEG", 1.0),
            ],
            total: 3,
            ..QueryResponse::default()
        })));
        let generation = ctl.generation();
        assert!(ctl.set_sort("PEG", SortKind::Numeric).unwrap().is_none());
        assert_eq!(ctl.generation(), generation);
        let codes: Vec<&str> = ctl.rows().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "C", "A"]);

        ctl.set_sort("PEG", SortKind::Numeric).unwrap();
        let codes: Vec<&str> = ctl.rows().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "C", "B"]);
        assert!(ctl.sorts_locally());

        ctl.clear_sort();
        assert!(!ctl.sorts_locally());
    }

    #[test]
    fn invalid_filters_leave_state_untouched() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let generation = ctl.generation();
        assert!(matches!(
            ctl.set_filter("PEG", Some("abc"), None),
            Err(FilterError::InvalidNumber { .. })
        ));
        assert!(matches!(
            ctl.set_filter("PEG", Some("2"), Some("1")),
            Err(FilterError::InvertedRange { .. })
        ));
        assert!(matches!(
            ctl.set_filter("nope", Some("1"), None),
            Err(FilterError::UnknownColumn(_))
        ));
        assert!(matches!(
            ctl.set_sort("所属行业", SortKind::Lexicographic),
            Err(FilterError::NotSortable(_))
        ));
        assert!(ctl.query().filters.is_empty());
        assert!(ctl.query().sort.is_none());
        assert_eq!(ctl.generation(), generation);
    }

    #[test]
    fn text_filter_keeps_min_and_blank_clears() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        ctl.set_filter("所属行业", Some("医药"), Some("ignored")).unwrap();
        assert_eq!(ctl.query().filters["所属行业"], FilterRange::text("医药"));

        ctl.set_filter("所属行业", Some("  "), None).unwrap();
        assert!(ctl.query().filters.is_empty());

        ctl.set_filter("PEG", Some("1"), None).unwrap();
        ctl.set_filter("PEG", None, None).unwrap();
        assert!(ctl.query().filters.is_empty());
    }

    #[tokio::test]
    async fn clearing_filters_restores_total() {
        let (mut ctl, backend) = setup(30);
        let req = ctl.reset_and_query();
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.total(), Some(30));

        let req = ctl.set_filter("PEG", None, Some("0.09")).unwrap();
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.total(), Some(10));

        let req = ctl.clear_filters();
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.total(), Some(30));
    }

    #[tokio::test]
    async fn reset_failure_replaces_rows_with_error() {
        let (mut ctl, backend) = setup(10);
        let req = ctl.reset_and_query();
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.rows().len(), 10);

        backend.fail_next_query(ApiError::Transport("connection refused".into()));
        let req = ctl.refresh();
        fetch(&mut ctl, &backend, req).await;
        assert!(ctl.rows().is_empty());
        assert!(matches!(ctl.error(), Some(ApiError::Transport(_))));
        assert!(!ctl.all_loaded());
    }

    #[tokio::test]
    async fn page_failure_keeps_rows_and_allows_retry() {
        let (mut ctl, backend) = setup(120);
        let req = ctl.reset_and_query();
        fetch(&mut ctl, &backend, req).await;

        backend.fail_next_query(ApiError::Transport("timeout".into()));
        let req = ctl.load_next_page().unwrap();
        fetch(&mut ctl, &backend, req).await;
        assert_eq!(ctl.rows().len(), 50);
        assert!(ctl.page_error().is_some());
        assert!(ctl.has_more());

        let retry = ctl.load_next_page().unwrap();
        assert_eq!(retry.query.page, 2);
        assert!(ctl.page_error().is_none());
        fetch(&mut ctl, &backend, retry).await;
        assert_eq!(ctl.rows().len(), 100);
    }

    #[tokio::test]
    async fn fetch_all_drains_every_page() {
        let (mut ctl, backend) = setup(175);
        let req = ctl.reset_and_query();
        fetch(&mut ctl, &backend, req).await;
        fetch_all(&mut ctl, &backend).await;
        assert_eq!(ctl.rows().len(), 175);
        assert!(ctl.all_loaded());
    }

    #[test]
    fn template_filters_drop_inactive_ranges() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        let mut filters = FilterMap::new();
        filters.insert("PEG".into(), FilterRange::numeric(Some(0.0), Some(0.5)));
        filters.insert("市盈率".into(), FilterRange::default());
        let req = ctl.apply_filters(filters);
        assert_eq!(req.query.filters.unwrap().len(), 1);
        assert_eq!(bound_text(&ctl.query().filters["PEG"].max), "0.5");
    }
}

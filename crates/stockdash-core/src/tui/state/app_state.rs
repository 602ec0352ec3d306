//! Main application state.

use crate::chart::ChartLoader;
use crate::columns::ColumnDef;
use crate::controller::{Applied, FetchKind, FetchResponse, TableController};
use crate::models::TaskStatus;
use crate::templates::TemplateManager;
use crate::view::stocks::footer_for;
use crate::view::{TableViewModel, append_rows, build_stock_view, decorate, empty_view};

use super::{InputMode, PopupState, StockTableState};

/// Main application state.
pub struct AppState {
    /// Query state, cursor and loaded rows.
    pub table: TableController,
    /// Rendered projection of `table`.
    pub view: TableViewModel<String>,
    /// Row/column cursor.
    pub stocks: StockTableState,
    /// Input mode.
    pub input_mode: InputMode,
    /// Text input buffer (search, template name).
    pub input: String,
    /// Active popup state. Only one popup can be open at a time.
    pub popup: PopupState,
    pub chart: ChartLoader,
    pub templates: TemplateManager,
    /// Last polled task status.
    pub task: Option<TaskStatus>,
    /// Last status poll error, cleared by the next successful poll.
    pub poll_error: Option<String>,
    /// Temporary status message shown in the footer (e.g., why an action was blocked).
    pub status_message: Option<String>,
    /// Backend label for the header.
    pub backend_name: String,
}

impl AppState {
    pub fn new(table: TableController, backend_name: String) -> Self {
        let view = build_stock_view(&table);
        Self {
            table,
            view,
            stocks: StockTableState::default(),
            input_mode: InputMode::Normal,
            input: String::new(),
            popup: PopupState::None,
            chart: ChartLoader::new(),
            templates: TemplateManager::new(),
            task: None,
            poll_error: None,
            status_message: None,
            backend_name,
        }
    }

    /// Rebuilds the view from the controller after a query-state change.
    pub fn rebuild_view(&mut self) {
        self.view = build_stock_view(&self.table);
    }

    /// Refreshes only the footer, e.g. when a page request starts.
    pub fn rebuild_footer(&mut self) {
        self.view.footer = footer_for(&self.table);
    }

    /// Applies a query result and updates the view incrementally for pages.
    ///
    /// A page under a local sort is merged into the sorted rows, so the
    /// view is rebuilt instead of appended to.
    pub fn apply_fetch(&mut self, response: FetchResponse) -> Applied {
        let kind = response.kind;
        let before = self.table.rows().len();
        let applied = self.table.apply(response);
        if applied == Applied::Stale {
            return applied;
        }

        match kind {
            FetchKind::Page if !self.table.sorts_locally() && self.table.rows().len() >= before => {
                let columns = self.table.columns();
                let view = std::mem::replace(&mut self.view, empty_view(columns, String::new()));
                let view = append_rows(view, &self.table.rows()[before..], columns);
                self.view = decorate(view, &self.table);
            }
            _ => self.rebuild_view(),
        }
        applied
    }

    /// Clamps the row cursor to the loaded rows, following the tracked code.
    pub fn resolve_selection(&mut self) {
        let codes: Vec<&str> = self.view.rows.iter().map(|r| r.id.as_str()).collect();
        self.stocks.resolve_selection(&codes);
    }

    /// Column under the column cursor.
    pub fn current_column(&self) -> Option<&ColumnDef> {
        self.table.columns().as_slice().get(self.stocks.column)
    }

    /// Codes of the loaded rows, in display order.
    pub fn row_codes(&self) -> Vec<&str> {
        self.view.rows.iter().map(|r| r.id.as_str()).collect()
    }

    /// Code of the selected row.
    pub fn selected_code(&self) -> Option<&str> {
        self.view.rows.get(self.stocks.selected).map(|r| r.id.as_str())
    }

    pub fn is_task_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| t.is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{Columns, SortKind};
    use crate::controller::SortMode;
    use crate::models::{QueryResponse, Row};

    fn page(range: std::ops::Range<usize>, total: u64) -> QueryResponse {
        QueryResponse {
            data: range
                .map(|i| Row::new(format!("{i:05}"), format!("s{i}")))
                .collect(),
            total,
            ..QueryResponse::default()
        }
    }

    #[test]
    fn page_results_are_appended_to_the_view() {
        let mut state = AppState::new(TableController::new(Columns::builtin(), 2), "memory".into());
        let reset = state.table.reset_and_query();
        state.apply_fetch(reset.complete(Ok(page(0..2, 3))));
        assert_eq!(state.row_codes(), vec!["00000", "00001"]);

        let next = state.table.load_next_page().unwrap();
        state.apply_fetch(next.complete(Ok(page(2..3, 3))));
        assert_eq!(state.row_codes(), vec!["00000", "00001", "00002"]);
        assert_eq!(state.view.title, "Stocks 3/3");
        assert_eq!(state.view.footer, crate::view::TableFooter::AllLoaded);
    }

    #[test]
    fn page_under_client_sort_is_merged_into_the_view() {
        let table = TableController::new(Columns::builtin(), 2).with_sort_mode(SortMode::Client);
        let mut state = AppState::new(table, "memory".into());
        let reset = state.table.reset_and_query();
        state.apply_fetch(reset.complete(Ok(QueryResponse {
            data: vec![
                Row::new("A", "a").with("PEG", 5.0),
                Row::new("B", "b").with("PEG", 6.0),
            ],
            total: 3,
            ..QueryResponse::default()
        })));
        assert!(state.table.set_sort("PEG", SortKind::Numeric).unwrap().is_none());
        state.rebuild_view();
        assert_eq!(state.row_codes(), vec!["A", "B"]);

        let next = state.table.load_next_page().unwrap();
        state.apply_fetch(next.complete(Ok(QueryResponse {
            data: vec![Row::new("C", "c").with("PEG", 1.0)],
            total: 3,
            ..QueryResponse::default()
        })));
        assert_eq!(state.row_codes(), vec!["C", "A", "B"]);
        assert_eq!(state.view.title, "Stocks 3/3");
    }
}

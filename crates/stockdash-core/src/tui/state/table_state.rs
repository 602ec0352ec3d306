//! Selection state for the stock table.

use ratatui::widgets::TableState as RatatuiTableState;

/// Rows from the end of the loaded set at which the next page is requested.
pub const LOAD_AHEAD: usize = 5;

/// Row and column cursor over the stock table.
#[derive(Debug, Default)]
pub struct StockTableState {
    pub selected: usize,
    /// Code of the selected stock; keeps the cursor on it across reloads.
    pub tracked_code: Option<String>,
    /// Selected column index (into the full column list).
    pub column: usize,
    /// First visible metric column (code and name stay pinned).
    pub column_offset: usize,
    pub ratatui_state: RatatuiTableState,
}

impl StockTableState {
    /// Moves the row cursor and drops the tracked code; the next
    /// `resolve_selection` clamps the index to the loaded rows.
    fn move_to(&mut self, selected: usize) {
        self.selected = selected;
        self.tracked_code = None;
    }

    pub fn select_up(&mut self) {
        self.move_to(self.selected.saturating_sub(1));
    }

    pub fn select_down(&mut self) {
        self.move_to(self.selected.saturating_add(1));
    }

    pub fn page_up(&mut self, rows: usize) {
        self.move_to(self.selected.saturating_sub(rows));
    }

    pub fn page_down(&mut self, rows: usize) {
        self.move_to(self.selected.saturating_add(rows));
    }

    pub fn home(&mut self) {
        self.move_to(0);
    }

    pub fn end(&mut self) {
        self.move_to(usize::MAX);
    }

    /// Resolve `selected` from the tracked code, clamped to the row count.
    pub fn resolve_selection(&mut self, codes: &[&str]) {
        if let Some(tracked) = &self.tracked_code {
            if let Some(idx) = codes.iter().position(|c| *c == tracked.as_str()) {
                self.selected = idx;
            } else {
                self.tracked_code = None;
            }
        }

        if !codes.is_empty() {
            self.selected = self.selected.min(codes.len() - 1);
            self.tracked_code = Some(codes[self.selected].to_string());
        } else {
            self.selected = 0;
            self.tracked_code = None;
        }

        self.ratatui_state.select(Some(self.selected));
    }

    /// Moves the column cursor, keeping it within `count` columns.
    pub fn column_left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    pub fn column_right(&mut self, count: usize) {
        if self.column + 1 < count {
            self.column += 1;
        }
    }

    /// True when the cursor is close enough to the end to prefetch.
    pub fn near_end(&self, loaded: usize) -> bool {
        loaded == 0 || self.selected.saturating_add(LOAD_AHEAD) >= loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_tracked_code() {
        let mut s = StockTableState::default();
        s.resolve_selection(&["A", "B", "C"]);
        s.select_down();
        s.select_down();
        s.resolve_selection(&["A", "B", "C"]);
        assert_eq!(s.tracked_code.as_deref(), Some("C"));

        s.resolve_selection(&["C", "A"]);
        assert_eq!(s.selected, 0);

        s.end();
        s.resolve_selection(&["C", "A"]);
        assert_eq!(s.selected, 1);

        s.resolve_selection(&[]);
        assert_eq!(s.selected, 0);
        assert!(s.tracked_code.is_none());
    }

    #[test]
    fn paging_moves_clamp_to_loaded_rows() {
        let codes = ["A", "B", "C", "D", "E"];
        let mut s = StockTableState::default();
        s.resolve_selection(&codes);
        s.page_down(3);
        s.resolve_selection(&codes);
        assert_eq!(s.tracked_code.as_deref(), Some("D"));

        s.page_down(10);
        s.resolve_selection(&codes);
        assert_eq!(s.selected, 4);

        s.page_up(2);
        assert!(s.tracked_code.is_none());
        s.resolve_selection(&codes);
        assert_eq!(s.tracked_code.as_deref(), Some("C"));

        s.home();
        s.select_up();
        s.resolve_selection(&codes);
        assert_eq!(s.selected, 0);
    }

    #[test]
    fn near_end_triggers_within_lookahead() {
        let mut s = StockTableState::default();
        assert!(!s.near_end(50));
        s.selected = 44;
        assert!(!s.near_end(50));
        s.selected = 45;
        assert!(s.near_end(50));
    }
}

//! UI-agnostic view model types.
//!
//! These types represent presentation data without any dependency on a specific
//! rendering framework. The TUI maps them to ratatui styles, the HTML
//! projection maps them to CSS classes.

use unicode_width::UnicodeWidthStr;

use crate::fmt::{Badge, CellClass, FormattedCell};

/// A single table cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewCell {
    pub text: String,
    pub class: CellClass,
    pub badge: Option<Badge>,
}

impl ViewCell {
    pub fn plain(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    /// Display width in terminal columns, badge included.
    pub fn width(&self) -> usize {
        let badge = self.badge.map(|b| b.label().width() + 1).unwrap_or(0);
        self.text.width() + badge
    }
}

impl From<FormattedCell> for ViewCell {
    fn from(cell: FormattedCell) -> Self {
        Self {
            text: cell.text,
            class: cell.class,
            badge: cell.badge,
        }
    }
}

/// One table row, parameterized by entity ID type.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow<Id> {
    pub id: Id,
    pub cells: Vec<ViewCell>,
}

/// What to show below the last row.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TableFooter {
    #[default]
    None,
    Loading,
    /// More pages are available on scroll.
    More,
    /// Every matching row is loaded.
    AllLoaded,
    /// The query matched nothing.
    Empty,
    /// A page fetch failed; rows above are still valid.
    Retry(String),
    /// The query failed; shown instead of rows.
    Error(String),
}

/// Complete table ready to be rendered by any frontend.
#[derive(Debug, Clone, PartialEq)]
pub struct TableViewModel<Id> {
    pub title: String,
    /// Column keys, parallel to `headers`.
    pub keys: Vec<String>,
    pub headers: Vec<String>,
    /// Minimum display width per column.
    pub widths: Vec<u16>,
    pub rows: Vec<ViewRow<Id>>,
    pub sort_column: Option<usize>,
    pub sort_ascending: bool,
    pub footer: TableFooter,
}

impl<Id> TableViewModel<Id> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widens columns to fit the given rows' content.
    pub fn fit_widths(&mut self, max: u16) {
        for row in &self.rows {
            for (w, cell) in self.widths.iter_mut().zip(&row.cells) {
                let needed = (cell.width() as u16).min(max);
                if needed > *w {
                    *w = needed;
                }
            }
        }
    }
}

/// Header width in terminal columns.
pub fn header_width(label: &str) -> u16 {
    label.width() as u16
}

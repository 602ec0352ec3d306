//! Stock table view model.

use crate::columns::Columns;
use crate::controller::TableController;
use crate::fmt::{format_cell, format_count};
use crate::models::Row;
use crate::view::common::{TableFooter, TableViewModel, ViewCell, ViewRow, header_width};

/// Narrowest column, so numbers like `-1,234.56` fit under short labels.
const MIN_WIDTH: u16 = 8;
/// Widest column; longer text is truncated by the renderer.
const MAX_WIDTH: u16 = 24;

/// Formats one row across all columns. The row ID is the stock code.
pub fn stock_row(columns: &Columns, row: &Row) -> ViewRow<String> {
    ViewRow {
        id: row.code.clone(),
        cells: columns
            .iter()
            .map(|c| ViewCell::from(format_cell(c, row)))
            .collect(),
    }
}

/// Headers only, no rows.
pub fn empty_view(columns: &Columns, title: String) -> TableViewModel<String> {
    TableViewModel {
        title,
        keys: columns.iter().map(|c| c.key.clone()).collect(),
        headers: columns.iter().map(|c| c.label.clone()).collect(),
        widths: columns
            .iter()
            .map(|c| header_width(&c.label).clamp(MIN_WIDTH, MAX_WIDTH))
            .collect(),
        rows: Vec::new(),
        sort_column: None,
        sort_ascending: true,
        footer: TableFooter::None,
    }
}

/// Returns `model` with its rows replaced by `rows`.
pub fn replace_rows(
    mut model: TableViewModel<String>,
    rows: &[Row],
    columns: &Columns,
) -> TableViewModel<String> {
    model.rows = rows.iter().map(|r| stock_row(columns, r)).collect();
    model.fit_widths(MAX_WIDTH);
    model
}

/// Returns `model` with `rows` added after the existing ones.
pub fn append_rows(
    mut model: TableViewModel<String>,
    rows: &[Row],
    columns: &Columns,
) -> TableViewModel<String> {
    model.rows.extend(rows.iter().map(|r| stock_row(columns, r)));
    model.fit_widths(MAX_WIDTH);
    model
}

pub fn footer_for(ctl: &TableController) -> TableFooter {
    if let Some(e) = ctl.error() {
        return TableFooter::Error(e.to_string());
    }
    if let Some(e) = ctl.page_error() {
        return TableFooter::Retry(e.to_string());
    }
    if ctl.is_loading() {
        return TableFooter::Loading;
    }
    match (ctl.rows().is_empty(), ctl.has_more()) {
        (true, false) => TableFooter::Empty,
        (false, false) => TableFooter::AllLoaded,
        (_, true) if ctl.total().is_some() => TableFooter::More,
        _ => TableFooter::None,
    }
}

/// Sets title, sort marker and footer from the controller's state.
pub fn decorate(mut model: TableViewModel<String>, ctl: &TableController) -> TableViewModel<String> {
    let loaded = ctl.rows().len() as u64;
    model.title = match ctl.total() {
        Some(total) => format!("Stocks {}/{}", format_count(loaded), format_count(total)),
        None => "Stocks".to_string(),
    };
    match &ctl.query().sort {
        Some(sort) => {
            model.sort_column = ctl.columns().position(&sort.key);
            model.sort_ascending = sort.dir.is_ascending();
        }
        None => {
            model.sort_column = None;
            model.sort_ascending = true;
        }
    }
    model.footer = footer_for(ctl);
    model
}

/// Projects the controller's state into a table. Pure: the controller is not modified.
pub fn build_stock_view(ctl: &TableController) -> TableViewModel<String> {
    let columns = ctl.columns();
    let model = replace_rows(empty_view(columns, String::new()), ctl.rows(), columns);
    decorate(model, ctl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ColumnDef, SortKind};
    use crate::controller::FetchKind;
    use crate::error::ApiError;
    use crate::fmt::{Badge, CellClass, PLACEHOLDER};
    use crate::models::QueryResponse;

    fn columns() -> Columns {
        Columns::new(vec![
            ColumnDef::new("PEG", "PEG"),
            ColumnDef::new("股息率TTM(%)", "股息率").suffix("%"),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row::new("00700", "腾讯控股").with("PEG", 0.4).with("股息率TTM(%)", "N/A"),
            Row::new("00005", "汇丰控股").with("PEG", -1.5).with("股息率TTM(%)", 6.1),
        ]
    }

    #[test]
    fn rows_render_placeholders_badges_and_suffixes() {
        let cols = columns();
        let model = replace_rows(empty_view(&cols, "t".into()), &rows(), &cols);
        assert_eq!(model.headers, vec!["代码", "名称", "PEG", "股息率"]);

        let first = &model.rows[0];
        assert_eq!(first.id, "00700");
        assert_eq!(first.cells[2].text, "0.40");
        assert_eq!(first.cells[2].badge, Some(Badge::VeryLow));
        assert_eq!(first.cells[3].text, PLACEHOLDER);
        assert_eq!(first.cells[3].class, CellClass::Placeholder);

        let second = &model.rows[1];
        assert_eq!(second.cells[2].class, CellClass::Negative);
        assert_eq!(second.cells[2].badge, None);
        assert_eq!(second.cells[3].text, "6.10%");
    }

    #[test]
    fn append_keeps_existing_rows() {
        let cols = columns();
        let all = rows();
        let model = replace_rows(empty_view(&cols, "t".into()), &all[..1], &cols);
        let model = append_rows(model, &all[1..], &cols);
        let ids: Vec<&str> = model.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["00700", "00005"]);
    }

    #[test]
    fn controller_projection_tracks_sort_and_footer() {
        let mut ctl = TableController::new(columns(), 50);
        let req = ctl.set_sort("PEG", SortKind::Numeric).unwrap().unwrap();
        assert_eq!(build_stock_view(&ctl).footer, TableFooter::Loading);

        ctl.apply(req.complete(Ok(QueryResponse {
            data: rows(),
            total: 2,
            ..QueryResponse::default()
        })));
        let view = build_stock_view(&ctl);
        assert_eq!(view.title, "Stocks 2/2");
        assert_eq!(view.sort_column, Some(2));
        assert!(view.sort_ascending);
        assert_eq!(view.footer, TableFooter::AllLoaded);
    }

    #[test]
    fn failed_reset_shows_error_footer() {
        let mut ctl = TableController::new(columns(), 50);
        let req = ctl.reset_and_query();
        assert_eq!(req.kind, FetchKind::Reset);
        ctl.apply(req.complete(Err(ApiError::Transport("refused".into()))));
        let view = build_stock_view(&ctl);
        assert!(view.rows.is_empty());
        assert!(matches!(view.footer, TableFooter::Error(ref m) if m.contains("refused")));
    }
}

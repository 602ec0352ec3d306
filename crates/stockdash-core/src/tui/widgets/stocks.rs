//! Stock table widget.
//! Thin TUI wrapper over [`crate::view::build_stock_view`].

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use crate::fmt::truncate;
use crate::tui::state::AppState;
use crate::tui::style::Styles;
use crate::view::{TableFooter, ViewCell};

/// Code and name stay visible while metric columns scroll.
const PINNED: usize = 2;
const COLUMN_SPACING: u16 = 1;

/// Picks which columns fit in `available` cells.
///
/// Pinned columns always show; scrollable ones start at `offset`, which is
/// moved so that `selected` is visible. Returns the adjusted offset and
/// the visible column indices.
pub fn visible_columns(
    widths: &[u16],
    offset: usize,
    selected: usize,
    available: u16,
) -> (usize, Vec<usize>) {
    let pinned = PINNED.min(widths.len());
    let cost = |i: usize| widths[i] + COLUMN_SPACING;
    let pinned_width: u16 = (0..pinned).map(cost).sum();
    let room = available.saturating_sub(pinned_width);

    let mut offset = offset.max(pinned);
    if selected >= pinned {
        offset = offset.min(selected);
        while offset < selected && (offset..=selected).map(cost).sum::<u16>() > room {
            offset += 1;
        }
    }

    let mut visible: Vec<usize> = (0..pinned).collect();
    let mut used = 0u16;
    for i in offset..widths.len() {
        used += cost(i);
        if used > room && visible.len() > pinned {
            break;
        }
        visible.push(i);
    }
    (offset, visible)
}

fn cell_line(cell: &ViewCell, width: u16) -> Line<'static> {
    let text = truncate(&cell.text, width as usize);
    let mut spans = vec![Span::styled(text, Styles::from_cell_class(cell.class))];
    if let Some(badge) = cell.badge {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(badge.label(), Styles::badge(badge)));
    }
    Line::from(spans)
}

fn footer_line(footer: &TableFooter) -> Option<Line<'static>> {
    let line = match footer {
        TableFooter::None => return None,
        TableFooter::Loading => Line::from(Span::styled("Loading...", Styles::dim())),
        TableFooter::More => Line::from(Span::styled("Scroll down for more", Styles::dim())),
        TableFooter::AllLoaded => Line::from(Span::styled("All data shown", Styles::dim())),
        TableFooter::Empty => Line::from(Span::styled("No stocks match", Styles::dim())),
        TableFooter::Retry(e) => Line::from(vec![
            Span::styled(format!("Failed to load more: {e}. "), Styles::critical()),
            Span::styled("Scroll down to retry", Styles::help_key()),
        ]),
        TableFooter::Error(e) => Line::from(Span::styled(format!("Error: {e}"), Styles::critical())),
    };
    Some(line)
}

pub fn render_stocks(frame: &mut Frame, area: Rect, state: &mut AppState) {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(state.view.title.clone())
        .borders(Borders::ALL)
        .style(Styles::default());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
    if let Some(line) = footer_line(&state.view.footer) {
        frame.render_widget(Paragraph::new(line), chunks[1]);
    }

    if let TableFooter::Error(_) = state.view.footer {
        return;
    }

    let vm = &state.view;
    let (offset, visible) = visible_columns(
        &vm.widths,
        state.stocks.column_offset,
        state.stocks.column,
        chunks[0].width,
    );
    state.stocks.column_offset = offset;

    // Header
    let header_cells: Vec<Cell> = visible
        .iter()
        .map(|&i| {
            let mut label = vm.headers[i].clone();
            if vm.sort_column == Some(i) {
                label.push(if vm.sort_ascending { '↑' } else { '↓' });
            }
            let style = if i == state.stocks.column {
                Styles::table_header().patch(Styles::selected_cell())
            } else {
                Styles::table_header()
            };
            Cell::from(Span::styled(label, style))
        })
        .collect();
    let header = Row::new(header_cells).style(Styles::table_header());

    let widths: Vec<Constraint> = visible
        .iter()
        .map(|&i| Constraint::Length(vm.widths[i]))
        .collect();

    // Rows
    let selected_row = state.stocks.selected;
    let rows: Vec<Row> = vm
        .rows
        .iter()
        .enumerate()
        .map(|(r, vr)| {
            let cells = visible.iter().map(|&i| {
                let cell = Cell::from(cell_line(&vr.cells[i], vm.widths[i]));
                if r == selected_row && i == state.stocks.column {
                    cell.style(Styles::selected_cell())
                } else {
                    cell
                }
            });
            Row::new(cells)
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .row_highlight_style(Styles::selected());

    frame.render_stateful_widget(table, chunks[0], &mut state.stocks.ratatui_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_columns_always_show() {
        let widths = [6, 8, 10, 10, 10, 10];
        // 7 + 9 pinned, 11 per metric column.
        let (offset, visible) = visible_columns(&widths, 0, 0, 40);
        assert_eq!(offset, 2);
        assert_eq!(visible, vec![0, 1, 2, 3]);
    }

    #[test]
    fn offset_follows_selected_column() {
        let widths = [6, 8, 10, 10, 10, 10];
        let (offset, visible) = visible_columns(&widths, 2, 5, 40);
        assert_eq!(offset, 4);
        assert_eq!(visible, vec![0, 1, 4, 5]);

        let (offset, visible) = visible_columns(&widths, 4, 3, 40);
        assert_eq!(offset, 3);
        assert_eq!(visible, vec![0, 1, 3, 4]);
    }

    #[test]
    fn narrow_terminal_still_shows_one_metric() {
        let widths = [6, 8, 10];
        let (_, visible) = visible_columns(&widths, 0, 2, 10);
        assert_eq!(visible, vec![0, 1, 2]);
    }
}

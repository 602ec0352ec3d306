//! Header bar: clock, backend, active query and task progress.

use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, Paragraph};

use crate::controller::QueryState;
use crate::fmt::format_progress;
use crate::tui::state::AppState;
use crate::tui::style::{Styles, Theme};

/// One-line summary of search, filters and sort, e.g. `/600 PEG[0..0.5] ↑PEG`.
pub fn query_summary(query: &QueryState) -> String {
    let mut parts = Vec::new();
    if !query.search.is_empty() {
        parts.push(format!("/{}", query.search));
    }
    for (key, range) in &query.filters {
        parts.push(format!("{key}[{range}]"));
    }
    if let Some(sort) = &query.sort {
        let arrow = if sort.dir.is_ascending() { '↑' } else { '↓' };
        parts.push(format!("{arrow}{}", sort.key));
    }
    parts.join(" ")
}

/// Renders the header bar.
pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::horizontal([
        Constraint::Length(21), // Time
        Constraint::Length(12), // Backend
        Constraint::Min(20),    // Query
        Constraint::Length(36), // Task
    ])
    .split(area);

    let time = Local::now().format(" %Y-%m-%d %H:%M:%S").to_string();
    frame.render_widget(Paragraph::new(time).style(Styles::header()), chunks[0]);

    let backend = format!(" {} ", state.backend_name.to_uppercase());
    frame.render_widget(Paragraph::new(backend).style(Styles::header()), chunks[1]);

    let summary = query_summary(state.table.query());
    let query = if summary.is_empty() {
        Line::from(Span::styled(" all stocks", Styles::header()))
    } else {
        Line::from(Span::styled(format!(" {summary}"), Styles::header()))
    };
    frame.render_widget(Paragraph::new(query).style(Styles::header()), chunks[2]);

    render_task(frame, chunks[3], state);
}

fn render_task(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(err) = &state.poll_error {
        let line = Line::from(Span::styled(format!(" status: {err}"), Styles::critical()));
        frame.render_widget(Paragraph::new(line).style(Styles::header()), area);
        return;
    }
    match &state.task {
        Some(task) if task.is_running => {
            let gauge = Gauge::default()
                .gauge_style(Styles::header().fg(Theme::FAVORABLE))
                .ratio(task.progress())
                .label(format_progress(task));
            frame.render_widget(gauge, area);
        }
        Some(task) => {
            let text = if task.message.is_empty() {
                " idle".to_string()
            } else {
                format!(" {}", task.message)
            };
            frame.render_widget(Paragraph::new(text).style(Styles::header()), area);
        }
        None => frame.render_widget(Paragraph::new(" status: -").style(Styles::header()), area),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{Columns, SortKind};
    use crate::controller::TableController;

    #[test]
    fn summary_lists_search_filters_and_sort() {
        let mut ctl = TableController::new(Columns::builtin(), 50);
        assert_eq!(query_summary(ctl.query()), "");

        ctl.set_search("600");
        ctl.set_filter("PEG", Some("0"), Some("0.5")).unwrap();
        ctl.set_sort("PEG", SortKind::Numeric).unwrap();
        ctl.set_sort("PEG", SortKind::Numeric).unwrap();
        assert_eq!(query_summary(ctl.query()), "/600 PEG[0..0.5] ↓PEG");
    }
}

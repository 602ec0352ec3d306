//! Help popup with key bindings and column descriptions.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::columns::Columns;
use crate::tui::style::Styles;

use super::popup::{open_popup, popup_rect};

const KEYS: &[(&str, &str)] = &[
    ("↑/↓ j/k", "move row (loads more near the end)"),
    ("PgUp/PgDn", "move 20 rows"),
    ("g/G Home/End", "first / last row"),
    ("←/→ h/l", "move column"),
    ("s", "sort by column (again to reverse)"),
    ("S", "clear sort"),
    ("/", "search by code or name"),
    ("f", "filter current column"),
    ("F", "clear all filters"),
    ("c Enter", "history chart for current column"),
    ("t", "filter templates"),
    ("r", "reload"),
    ("C", "start crawl"),
    ("X", "stop running task"),
    ("M", "recalculate metrics"),
    ("!", "restart backend"),
    ("P", "crawl schedule"),
    ("q", "quit"),
];

fn help_content(columns: &Columns) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Keys", Styles::section_header()))];
    for (key, what) in KEYS {
        lines.push(Line::from(vec![
            Span::styled(format!("{key:>14}  "), Styles::help_key()),
            Span::raw(what.to_string()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Columns", Styles::section_header())));
    for column in columns.iter().filter(|c| c.desc.is_some()) {
        let desc = column.desc.clone().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("{:>14}  ", column.label), Styles::help_key()),
            Span::raw(desc),
        ]));
    }
    lines
}

/// Renders the help popup centered on screen with scroll support.
pub fn render_help(frame: &mut Frame, area: Rect, columns: &Columns, scroll: &mut usize) {
    let popup_area = popup_rect(area, 60, (40, 80), (10, 30));
    let inner = open_popup(frame, popup_area, "Help");
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

    let content = help_content(columns);
    let max_scroll = content.len().saturating_sub(chunks[0].height as usize);
    if *scroll > max_scroll {
        *scroll = max_scroll;
    }

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .scroll((*scroll as u16, 0));
    frame.render_widget(paragraph, chunks[0]);

    let scroll_info = if max_scroll > 0 {
        format!(" [{}/{}]", *scroll + 1, max_scroll + 1)
    } else {
        String::new()
    };
    let footer = Line::from(vec![
        Span::styled("Press ", Styles::help()),
        Span::styled("?", Styles::help_key()),
        Span::styled(" or ", Styles::help()),
        Span::styled("Esc", Styles::help_key()),
        Span::styled(" to close, ", Styles::help()),
        Span::styled("↑↓", Styles::help_key()),
        Span::styled(" to scroll", Styles::help()),
        Span::styled(scroll_info, Styles::help()),
    ]);
    frame.render_widget(Paragraph::new(footer), chunks[1]);
}

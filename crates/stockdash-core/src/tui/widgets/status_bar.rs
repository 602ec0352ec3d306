//! Bottom line: search input, status message, or key hints.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::state::{AppState, InputMode};
use crate::tui::style::Styles;

pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let line = match state.input_mode {
        InputMode::Search => Line::from(vec![
            Span::styled("Search: ", Styles::section_header()),
            Span::styled(format!("{}_", state.input), Styles::input()),
            Span::styled("   Enter apply  Esc cancel", Styles::help()),
        ]),
        _ => match &state.status_message {
            Some(msg) => Line::from(Span::styled(msg.clone(), Styles::section_header())),
            None => {
                let column = state
                    .current_column()
                    .map(|c| c.label.clone())
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled(format!("[{column}] "), Styles::help_key()),
                    Span::styled("s", Styles::help_key()),
                    Span::styled(" sort  ", Styles::help()),
                    Span::styled("f", Styles::help_key()),
                    Span::styled(" filter  ", Styles::help()),
                    Span::styled("/", Styles::help_key()),
                    Span::styled(" search  ", Styles::help()),
                    Span::styled("c", Styles::help_key()),
                    Span::styled(" chart  ", Styles::help()),
                    Span::styled("t", Styles::help_key()),
                    Span::styled(" templates  ", Styles::help()),
                    Span::styled("?", Styles::help_key()),
                    Span::styled(" help", Styles::help()),
                ])
            }
        },
    };
    frame.render_widget(Paragraph::new(line), area);
}

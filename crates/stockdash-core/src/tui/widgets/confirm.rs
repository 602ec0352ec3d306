//! Confirmation and message popups.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::ops::Action;
use crate::tui::style::Styles;

use super::popup::{key_hints, open_popup, popup_rect};

/// Renders a centered quit confirmation popup.
pub fn render_quit_confirm(frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 50, (40, 60), (7, 9));
    let inner = open_popup(frame, popup_area, "Exit stockdash");

    let content = vec![
        Line::from(Span::styled(
            "Are you sure you want to quit?",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        key_hints(&[("Enter/q", "quit"), ("Esc/n", "cancel")]),
    ];
    let paragraph = Paragraph::new(content).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Asks before a control action is sent.
pub fn render_action_confirm(frame: &mut Frame, area: Rect, action: Action) {
    let popup_area = popup_rect(area, 50, (44, 70), (7, 9));
    let inner = open_popup(frame, popup_area, action.label());

    let content = vec![
        Line::from(Span::styled(action.confirm_prompt(), Styles::section_header())),
        Line::from(""),
        key_hints(&[("Enter/y", "confirm"), ("Esc/n", "cancel")]),
    ];
    let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Blocking message; any key dismisses it.
pub fn render_message(frame: &mut Frame, area: Rect, title: &str, text: &str, is_error: bool) {
    let popup_area = popup_rect(area, 50, (40, 80), (7, 12));
    let inner = open_popup(frame, popup_area, title);

    let style = if is_error {
        Styles::critical()
    } else {
        Styles::success()
    };
    let content = vec![
        Line::from(Span::styled(text.to_string(), style)),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Styles::help())),
    ];
    let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

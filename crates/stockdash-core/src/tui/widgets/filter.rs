//! Column range filter popup.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::state::{FilterForm, RangeField};
use crate::tui::style::Styles;

use super::popup::{error_line, key_hints, open_popup, popup_rect};

fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let value = if focused {
        Span::styled(format!("{value}_"), Styles::input())
    } else {
        Span::raw(value.to_string())
    };
    let label_style = if focused {
        Styles::section_header()
    } else {
        Styles::help()
    };
    Line::from(vec![Span::styled(label, label_style), value])
}

pub fn render_filter(frame: &mut Frame, area: Rect, form: &FilterForm) {
    let popup_area = popup_rect(area, 50, (40, 70), (9, 11));
    let inner = open_popup(frame, popup_area, &format!("Filter: {}", form.label));

    let mut lines = Vec::new();
    if form.text_only {
        lines.push(field_line("Contains: ", &form.min, true));
    } else {
        lines.push(field_line("Min: ", &form.min, form.focus == RangeField::Min));
        lines.push(field_line("Max: ", &form.max, form.focus == RangeField::Max));
    }
    lines.push(Line::from(Span::styled(
        "Leave both empty to remove the filter",
        Styles::dim(),
    )));
    if let Some(err) = &form.error {
        lines.push(error_line(err));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(key_hints(&[
        ("Enter", "apply"),
        ("Tab", "switch"),
        ("^U", "clear"),
        ("Esc", "cancel"),
    ]));
    frame.render_widget(Paragraph::new(lines), inner);
}

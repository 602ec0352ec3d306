//! Crawl schedule editor popup.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::state::{ScheduleField, ScheduleForm};
use crate::tui::style::Styles;

use super::popup::{error_line, key_hints, open_popup, popup_rect};

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Display name for a `day_of_week` value (`0` = Monday).
pub fn day_name(day: &str) -> &'static str {
    day.parse::<usize>()
        .ok()
        .and_then(|d| DAY_NAMES.get(d).copied())
        .unwrap_or("?")
}

fn row(label: &'static str, value: String, focused: bool) -> Line<'static> {
    let (label_style, value_style) = if focused {
        (Styles::section_header(), Styles::input())
    } else {
        (Styles::help(), Styles::default())
    };
    Line::from(vec![
        Span::styled(format!("{label:>8}: "), label_style),
        Span::styled(value, value_style),
    ])
}

pub fn render_schedule(frame: &mut Frame, area: Rect, form: &ScheduleForm) {
    let popup_area = popup_rect(area, 50, (40, 64), (11, 13));
    let inner = open_popup(frame, popup_area, "Crawl schedule");

    if !form.loaded {
        let text = Line::from(Span::styled("Loading schedule...", Styles::dim()));
        frame.render_widget(Paragraph::new(text), inner);
        return;
    }

    let kind = if form.weekly { "weekly" } else { "daily" };
    let mut lines = vec![
        row("Repeat", format!("{kind} (space toggles)"), form.focus == ScheduleField::Kind),
        row("Hour", form.hour.clone(), form.focus == ScheduleField::Hour),
        row("Minute", form.minute.clone(), form.focus == ScheduleField::Minute),
    ];
    if form.weekly {
        lines.push(row(
            "Day",
            format!("{} ({})", form.day_of_week, day_name(&form.day_of_week)),
            form.focus == ScheduleField::Day,
        ));
    }
    lines.push(Line::from(""));
    if let Some(err) = &form.error {
        lines.push(error_line(err));
    }
    lines.push(key_hints(&[("Enter", "save"), ("Tab", "next"), ("Esc", "cancel")]));
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_names_start_on_monday() {
        assert_eq!(day_name("0"), "Mon");
        assert_eq!(day_name("6"), "Sun");
        assert_eq!(day_name("7"), "?");
        assert_eq!(day_name(""), "?");
    }
}

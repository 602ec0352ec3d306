//! Shared popup chrome.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear};

use crate::tui::style::Styles;

/// Centered rect: `percent` of the width clamped to `width`, height clamped to `height`.
pub fn popup_rect(area: Rect, percent: u16, width: (u16, u16), height: (u16, u16)) -> Rect {
    let w = (area.width * percent / 100)
        .clamp(width.0, width.1)
        .min(area.width);
    let h = (area.height * 80 / 100)
        .clamp(height.0, height.1)
        .min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

/// Clears `popup_area`, draws the bordered block, and returns the inner area.
pub fn open_popup(frame: &mut Frame, popup_area: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Styles::popup_border());
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    inner
}

/// Key hint line: `Enter → apply   Esc → cancel`.
pub fn key_hints(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (i, (key, what)) in hints.iter().enumerate() {
        let key = if i == 0 {
            key.to_string()
        } else {
            format!("   {key}")
        };
        spans.push(Span::styled(key, Styles::help_key()));
        spans.push(Span::styled(format!(" → {what}"), Styles::help()));
    }
    Line::from(spans)
}

/// Error line shown under a form.
pub fn error_line(error: &str) -> Line<'static> {
    Line::from(Span::styled(format!("Error: {error}"), Styles::critical()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        let r = popup_rect(area, 50, (40, 60), (7, 9));
        assert_eq!((r.x, r.y, r.width, r.height), (25, 15, 50, 9));

        let tiny = Rect::new(0, 0, 30, 5);
        let r = popup_rect(tiny, 50, (40, 60), (7, 9));
        assert_eq!((r.width, r.height), (30, 5));
    }
}

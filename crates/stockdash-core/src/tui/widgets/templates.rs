//! Filter template list popup.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use crate::models::FilterMap;
use crate::templates::TemplateManager;
use crate::tui::state::InputMode;
use crate::tui::style::Styles;

use super::popup::{key_hints, open_popup, popup_rect};

/// `PEG[0..0.5], 市盈率[<=15]`
pub fn filters_summary(filters: &FilterMap) -> String {
    filters
        .iter()
        .map(|(key, range)| format!("{key}[{range}]"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_templates(
    frame: &mut Frame,
    area: Rect,
    templates: &TemplateManager,
    input_mode: InputMode,
    input: &str,
) {
    let popup_area = popup_rect(area, 60, (44, 100), (10, 30));
    let inner = open_popup(frame, popup_area, "Filter templates");
    let chunks = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(inner);

    if templates.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No saved templates. Press n to save the current filters.",
            Styles::dim(),
        )));
        frame.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = templates
            .templates()
            .iter()
            .map(|t| {
                ListItem::new(Line::from(vec![
                    Span::styled(t.name.clone(), Styles::help_key()),
                    Span::styled(format!("  {}", filters_summary(&t.filters)), Styles::help()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Styles::selected())
            .highlight_symbol("> ");
        let mut list_state = ListState::default().with_selected(Some(templates.selected_index()));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);
    }

    if input_mode == InputMode::TemplateName {
        let line = Line::from(vec![
            Span::styled("Name: ", Styles::section_header()),
            Span::styled(format!("{input}_"), Styles::input()),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[1]);
        frame.render_widget(
            Paragraph::new(key_hints(&[("Enter", "save"), ("Esc", "cancel")])),
            chunks[2],
        );
    } else {
        frame.render_widget(
            Paragraph::new(key_hints(&[
                ("Enter", "apply"),
                ("n", "save current"),
                ("d", "delete"),
                ("Esc", "close"),
            ])),
            chunks[2],
        );
    }
}

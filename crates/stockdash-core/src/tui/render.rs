//! Main rendering logic for TUI.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use super::state::{AppState, PopupState};
use super::widgets::{
    render_action_confirm, render_chart, render_filter, render_header, render_help,
    render_message, render_quit_confirm, render_schedule, render_status_bar, render_stocks,
    render_templates,
};

/// Main render function.
pub fn render(frame: &mut Frame, state: &mut AppState) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(5),    // Stock table
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_header(frame, chunks[0], state);
    render_stocks(frame, chunks[1], state);
    render_status_bar(frame, chunks[2], state);

    // Popups are rendered last to overlay everything.
    match &mut state.popup {
        PopupState::None => {}
        PopupState::Help { scroll } => render_help(frame, area, state.table.columns(), scroll),
        PopupState::QuitConfirm => render_quit_confirm(frame, area),
        PopupState::Confirm(action) => render_action_confirm(frame, area, *action),
        PopupState::Message {
            title,
            text,
            is_error,
        } => render_message(frame, area, title, text, *is_error),
        PopupState::Chart => render_chart(frame, area, state.chart.state()),
        PopupState::Templates => {
            render_templates(frame, area, &state.templates, state.input_mode, &state.input)
        }
        PopupState::Filter(form) => render_filter(frame, area, form),
        PopupState::Schedule(form) => render_schedule(frame, area, form),
    }
}

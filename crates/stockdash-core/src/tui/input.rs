//! Input handling and keybindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::chart::{ChartTarget, HistoryRequest};
use crate::controller::FetchRequest;
use crate::models::{FilterMap, Schedule};
use crate::ops::Action;
use crate::templates;

use super::state::{AppState, FilterForm, InputMode, PopupState, ScheduleForm};

/// Rows moved by PageUp/PageDown.
const PAGE_STEP: usize = 20;

/// Result of handling a key event. Anything beyond `None`/`Quit` is backend
/// work the app runs off the UI thread.
#[derive(Debug, PartialEq)]
pub enum KeyAction {
    /// No action, continue.
    None,
    /// Quit the application.
    Quit,
    /// Run a stock query.
    Fetch(FetchRequest),
    /// Load history for the chart popup.
    OpenChart(HistoryRequest),
    LoadTemplates,
    SaveTemplate { name: String, filters: FilterMap },
    DeleteTemplate(String),
    /// Run a confirmed control action.
    RunAction(Action),
    LoadSchedule,
    SaveSchedule(Schedule),
}

/// Navigation action for unified scroll/selection dispatch.
enum NavAction {
    Up,
    Down,
    PageUp(usize),
    PageDown(usize),
    Home,
    End,
}

/// Dispatches a navigation action to the help scroll, the template list
/// or the stock table. Moving down the table near the loaded end requests
/// the next page.
fn dispatch_navigation(state: &mut AppState, action: NavAction) -> KeyAction {
    match &mut state.popup {
        PopupState::Help { scroll } => {
            match action {
                NavAction::Up => *scroll = scroll.saturating_sub(1),
                NavAction::Down => *scroll = scroll.saturating_add(1),
                NavAction::PageUp(n) => *scroll = scroll.saturating_sub(n),
                NavAction::PageDown(n) => *scroll = scroll.saturating_add(n),
                NavAction::Home => *scroll = 0,
                NavAction::End => {}
            }
            KeyAction::None
        }
        PopupState::Templates => {
            match action {
                NavAction::Up | NavAction::PageUp(_) | NavAction::Home => {
                    state.templates.select_prev()
                }
                NavAction::Down | NavAction::PageDown(_) | NavAction::End => {
                    state.templates.select_next()
                }
            }
            KeyAction::None
        }
        PopupState::None => {
            let downward = matches!(
                action,
                NavAction::Down | NavAction::PageDown(_) | NavAction::End
            );
            let nav = &mut state.stocks;
            match action {
                NavAction::Up => nav.select_up(),
                NavAction::Down => nav.select_down(),
                NavAction::PageUp(n) => nav.page_up(n),
                NavAction::PageDown(n) => nav.page_down(n),
                NavAction::Home => nav.home(),
                NavAction::End => nav.end(),
            }
            state.resolve_selection();
            if downward {
                load_more(state)
            } else {
                KeyAction::None
            }
        }
        _ => KeyAction::None,
    }
}

/// Requests the next page when the cursor is close to the end of the loaded rows.
fn load_more(state: &mut AppState) -> KeyAction {
    if !state.stocks.near_end(state.view.rows.len()) {
        return KeyAction::None;
    }
    match state.table.load_next_page() {
        Some(request) => {
            state.rebuild_footer();
            KeyAction::Fetch(request)
        }
        None => KeyAction::None,
    }
}

/// Handles key input and updates state.
pub fn handle_key(state: &mut AppState, key: KeyEvent) -> KeyAction {
    if matches!(state.popup, PopupState::QuitConfirm) {
        return handle_quit_confirm(state, key);
    }
    match state.input_mode {
        InputMode::Search => return handle_search_mode(state, key),
        InputMode::TemplateName => return handle_template_name_mode(state, key),
        InputMode::Normal => {}
    }
    match &state.popup {
        PopupState::None => handle_normal_mode(state, key),
        PopupState::Help { .. } => handle_help(state, key),
        PopupState::Confirm(action) => {
            let action = *action;
            handle_confirm(state, key, action)
        }
        PopupState::Message { .. } => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        PopupState::Chart => handle_chart(state, key),
        PopupState::Templates => handle_templates(state, key),
        PopupState::Filter(_) => handle_filter_form(state, key),
        PopupState::Schedule(_) => handle_schedule_form(state, key),
        PopupState::QuitConfirm => KeyAction::None,
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_quit_confirm(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Char('y') => {
            state.popup = PopupState::None;
            KeyAction::Quit
        }
        _ if is_ctrl_c(&key) => {
            state.popup = PopupState::None;
            KeyAction::Quit
        }
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Handles keys in normal mode.
fn handle_normal_mode(state: &mut AppState, key: KeyEvent) -> KeyAction {
    state.status_message = None;
    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            state.popup = PopupState::QuitConfirm;
            KeyAction::None
        }
        _ if is_ctrl_c(&key) => KeyAction::Quit,

        // Row navigation
        KeyCode::Up | KeyCode::Char('k') => dispatch_navigation(state, NavAction::Up),
        KeyCode::Down | KeyCode::Char('j') => dispatch_navigation(state, NavAction::Down),
        KeyCode::PageUp => dispatch_navigation(state, NavAction::PageUp(PAGE_STEP)),
        KeyCode::PageDown => dispatch_navigation(state, NavAction::PageDown(PAGE_STEP)),
        KeyCode::Home | KeyCode::Char('g') => dispatch_navigation(state, NavAction::Home),
        KeyCode::End | KeyCode::Char('G') => dispatch_navigation(state, NavAction::End),

        // Column cursor
        KeyCode::Left | KeyCode::Char('h') => {
            state.stocks.column_left();
            KeyAction::None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            let count = state.table.columns().len();
            state.stocks.column_right(count);
            KeyAction::None
        }

        // Sorting
        KeyCode::Char('s') => sort_current_column(state),
        KeyCode::Char('S') => {
            let request = state.table.clear_sort();
            state.rebuild_view();
            request.map_or(KeyAction::None, KeyAction::Fetch)
        }

        // Search and filters
        KeyCode::Char('/') => {
            state.input_mode = InputMode::Search;
            state.input = state.table.query().search.clone();
            KeyAction::None
        }
        KeyCode::Char('f') => open_filter(state),
        KeyCode::Char('F') => {
            let request = state.table.clear_filters();
            state.rebuild_view();
            KeyAction::Fetch(request)
        }
        KeyCode::Char('r') => {
            let request = state.table.refresh();
            state.rebuild_view();
            KeyAction::Fetch(request)
        }

        // Chart
        KeyCode::Char('c') | KeyCode::Enter => open_chart(state),

        // Templates
        KeyCode::Char('t') => {
            state.popup = PopupState::Templates;
            KeyAction::LoadTemplates
        }

        // Operational controls, all confirmed first
        KeyCode::Char('C') => confirm(state, Action::TriggerCrawl),
        KeyCode::Char('X') => confirm(state, Action::StopCrawl),
        KeyCode::Char('M') => confirm(state, Action::Recalculate),
        KeyCode::Char('!') => confirm(state, Action::Restart),
        KeyCode::Char('P') => {
            state.popup = PopupState::Schedule(ScheduleForm::loading());
            KeyAction::LoadSchedule
        }

        // Help
        KeyCode::Char('?') | KeyCode::F(1) => {
            state.popup = PopupState::Help { scroll: 0 };
            KeyAction::None
        }

        _ => KeyAction::None,
    }
}

fn confirm(state: &mut AppState, action: Action) -> KeyAction {
    state.popup = PopupState::Confirm(action);
    KeyAction::None
}

fn sort_current_column(state: &mut AppState) -> KeyAction {
    let Some((key, kind)) = state
        .current_column()
        .map(|c| (c.key.clone(), c.sort_kind()))
    else {
        return KeyAction::None;
    };
    match state.table.set_sort(&key, kind) {
        Ok(request) => {
            state.rebuild_view();
            request.map_or(KeyAction::None, KeyAction::Fetch)
        }
        Err(e) => {
            state.status_message = Some(e.to_string());
            KeyAction::None
        }
    }
}

fn open_filter(state: &mut AppState) -> KeyAction {
    let Some(column) = state.current_column() else {
        return KeyAction::None;
    };
    if matches!(column.key.as_str(), "code" | "name") {
        state.status_message = Some("Use / to search by code or name".to_string());
        return KeyAction::None;
    }
    let text_only = column.filter_kind() == crate::columns::FilterKind::Text;
    let form = FilterForm::new(
        &column.key,
        &column.label,
        text_only,
        state.table.query().filters.get(&column.key),
    );
    state.popup = PopupState::Filter(form);
    KeyAction::None
}

fn open_chart(state: &mut AppState) -> KeyAction {
    let Some(code) = state.selected_code().map(str::to_string) else {
        return KeyAction::None;
    };
    let Some(column) = state.current_column() else {
        return KeyAction::None;
    };
    if !column.is_chartable() {
        state.status_message = Some(format!("{} has no history chart", column.label));
        return KeyAction::None;
    }
    let target = ChartTarget::for_column(&code, column);
    let request = state.chart.open(target);
    state.popup = PopupState::Chart;
    KeyAction::OpenChart(request)
}

fn handle_help(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::F(1) => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        KeyCode::Up | KeyCode::Char('k') => dispatch_navigation(state, NavAction::Up),
        KeyCode::Down | KeyCode::Char('j') => dispatch_navigation(state, NavAction::Down),
        KeyCode::PageUp => dispatch_navigation(state, NavAction::PageUp(PAGE_STEP)),
        KeyCode::PageDown => dispatch_navigation(state, NavAction::PageDown(PAGE_STEP)),
        KeyCode::Home => dispatch_navigation(state, NavAction::Home),
        _ => KeyAction::None,
    }
}

fn handle_confirm(state: &mut AppState, key: KeyEvent, action: Action) -> KeyAction {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
            state.popup = PopupState::None;
            state.status_message = Some(format!("{}...", action.label()));
            KeyAction::RunAction(action)
        }
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

fn handle_chart(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') | KeyCode::Enter => {
            state.chart.close();
            state.popup = PopupState::None;
        }
        _ => {}
    }
    KeyAction::None
}

fn handle_templates(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('t') => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        KeyCode::Up | KeyCode::Char('k') => dispatch_navigation(state, NavAction::Up),
        KeyCode::Down | KeyCode::Char('j') => dispatch_navigation(state, NavAction::Down),
        KeyCode::Enter => {
            let Some(template) = state.templates.selected() else {
                return KeyAction::None;
            };
            let filters = template.filters.clone();
            let name = template.name.clone();
            let request = state.table.apply_filters(filters);
            state.rebuild_view();
            state.popup = PopupState::None;
            state.status_message = Some(format!("Applied template '{name}'"));
            KeyAction::Fetch(request)
        }
        KeyCode::Char('n') => {
            state.input_mode = InputMode::TemplateName;
            state.input.clear();
            KeyAction::None
        }
        KeyCode::Char('d') => match state.templates.selected() {
            Some(template) => KeyAction::DeleteTemplate(template.name.clone()),
            None => KeyAction::None,
        },
        _ => KeyAction::None,
    }
}

fn handle_filter_form(state: &mut AppState, key: KeyEvent) -> KeyAction {
    let PopupState::Filter(form) = &mut state.popup else {
        return KeyAction::None;
    };
    match key.code {
        KeyCode::Esc => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        KeyCode::Tab | KeyCode::BackTab => {
            form.toggle_focus();
            KeyAction::None
        }
        KeyCode::Backspace => {
            form.backspace();
            KeyAction::None
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.clear();
            KeyAction::None
        }
        KeyCode::Char(c) => {
            form.push(c);
            KeyAction::None
        }
        KeyCode::Enter => {
            let key = form.key.clone();
            let (min, max) = (form.min.clone(), form.max.clone());
            let max = (!form.text_only).then_some(max.as_str());
            match state.table.set_filter(&key, Some(min.as_str()), max) {
                Ok(request) => {
                    state.popup = PopupState::None;
                    state.rebuild_view();
                    KeyAction::Fetch(request)
                }
                Err(e) => {
                    if let PopupState::Filter(form) = &mut state.popup {
                        form.error = Some(e.to_string());
                    }
                    KeyAction::None
                }
            }
        }
        _ => KeyAction::None,
    }
}

fn handle_schedule_form(state: &mut AppState, key: KeyEvent) -> KeyAction {
    let PopupState::Schedule(form) = &mut state.popup else {
        return KeyAction::None;
    };
    match key.code {
        KeyCode::Esc => {
            state.popup = PopupState::None;
            KeyAction::None
        }
        _ if !form.loaded => KeyAction::None,
        KeyCode::Tab => {
            form.next_field();
            KeyAction::None
        }
        KeyCode::Backspace => {
            form.backspace();
            KeyAction::None
        }
        KeyCode::Char(c) => {
            form.push(c);
            KeyAction::None
        }
        KeyCode::Enter => {
            let parsed = form
                .to_schedule()
                .and_then(|s| s.validate().map(|()| s).map_err(|e| e.to_string()));
            match parsed {
                Ok(schedule) => KeyAction::SaveSchedule(schedule),
                Err(e) => {
                    form.error = Some(e);
                    KeyAction::None
                }
            }
        }
        _ => KeyAction::None,
    }
}

fn handle_search_mode(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.input_mode = InputMode::Normal;
            state.input.clear();
            KeyAction::None
        }
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
            let text = std::mem::take(&mut state.input);
            let request = state.table.set_search(&text);
            state.rebuild_view();
            KeyAction::Fetch(request)
        }
        KeyCode::Backspace => {
            state.input.pop();
            KeyAction::None
        }
        KeyCode::Char(c) => {
            state.input.push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

fn handle_template_name_mode(state: &mut AppState, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.input_mode = InputMode::Normal;
            state.input.clear();
            KeyAction::None
        }
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
            let name = std::mem::take(&mut state.input);
            match templates::validate(&name, &state.table.query().filters) {
                Ok(template) => KeyAction::SaveTemplate {
                    name: template.name,
                    filters: template.filters,
                },
                Err(e) => {
                    state.popup = PopupState::error(e.to_string());
                    KeyAction::None
                }
            }
        }
        KeyCode::Backspace => {
            state.input.pop();
            KeyAction::None
        }
        KeyCode::Char(c) => {
            state.input.push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

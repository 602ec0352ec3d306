//! Application state management.

mod app_state;
mod forms;
mod table_state;

pub use app_state::*;
pub use forms::*;
pub use table_state::*;

use crate::ops::Action;

/// Input mode for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Editing the search text (`/`).
    Search,
    /// Typing a name for a new template.
    TemplateName,
}

/// Active popup state. Only one popup can be open at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PopupState {
    /// No popup is open.
    #[default]
    None,
    /// Help popup with scroll offset.
    Help { scroll: usize },
    /// Quit confirmation dialog.
    QuitConfirm,
    /// Confirmation before a control action is sent.
    Confirm(Action),
    /// Blocking message; any key dismisses it.
    Message {
        title: String,
        text: String,
        is_error: bool,
    },
    /// History chart for one stock and metric.
    Chart,
    /// Template list (`t`).
    Templates,
    /// Range editor for one column.
    Filter(FilterForm),
    /// Crawl schedule editor.
    Schedule(ScheduleForm),
}

impl PopupState {
    /// Returns true if any popup is open (excluding None).
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Message {
            title: "Error".to_string(),
            text: text.into(),
            is_error: true,
        }
    }

    pub fn info(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            title: title.into(),
            text: text.into(),
            is_error: false,
        }
    }
}

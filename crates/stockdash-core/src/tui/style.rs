//! Color scheme and styles.

use ratatui::style::{Color, Modifier, Style};

use crate::fmt::{Badge, CellClass};

/// Terminal palette.
pub struct Theme;

impl Theme {
    // Background colors
    pub const BG: Color = Color::Reset;
    pub const HEADER_BG: Color = Color::Blue;
    pub const SELECTED_BG: Color = Color::DarkGray;

    // Foreground colors
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const HEADER_FG: Color = Color::White;

    // Value colors
    pub const NEGATIVE: Color = Color::Red;
    pub const TEXT: Color = Color::Cyan;
    pub const FAVORABLE: Color = Color::Green;
    pub const UNFAVORABLE: Color = Color::Yellow;

    pub const CHART_LINE: Color = Color::Cyan;
    pub const ACCENT: Color = Color::Yellow;
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Theme::FG).bg(Theme::BG)
    }

    /// Header bar style.
    pub fn header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected row style.
    pub fn selected() -> Style {
        Style::default()
            .bg(Theme::SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected cell within the selected row.
    pub fn selected_cell() -> Style {
        Style::default()
            .fg(Theme::ACCENT)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }

    /// Table header style.
    pub fn table_header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Dimmed text style.
    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    pub fn critical() -> Style {
        Style::default()
            .fg(Theme::NEGATIVE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Theme::FAVORABLE)
    }

    /// Search and form input style.
    pub fn input() -> Style {
        Style::default()
            .fg(Theme::FG)
            .add_modifier(Modifier::UNDERLINED)
    }

    /// Section header style for popups.
    pub fn section_header() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Help text style.
    pub fn help() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    /// Help key style (highlighted keys in help line).
    pub fn help_key() -> Style {
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)
    }

    /// Popup border style.
    pub fn popup_border() -> Style {
        Style::default().fg(Color::Cyan)
    }

    /// Maps a UI-agnostic [`CellClass`] to a ratatui [`Style`].
    pub fn from_cell_class(class: CellClass) -> Style {
        match class {
            CellClass::Normal => Self::default(),
            CellClass::Placeholder => Self::dim(),
            CellClass::Negative => Style::default().fg(Theme::NEGATIVE),
            CellClass::Text => Style::default().fg(Theme::TEXT),
        }
    }

    pub fn badge(badge: Badge) -> Style {
        let fg = if badge.is_favorable() {
            Theme::FAVORABLE
        } else {
            Theme::UNFAVORABLE
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }
}

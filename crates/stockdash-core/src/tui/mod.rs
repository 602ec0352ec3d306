//! Terminal dashboard for the stock screener.
//!
//! A paginated stock table with per-column sort and range filters, history
//! charts, filter templates, and operational controls, driven by the same
//! controllers the CLI uses.

mod app;
mod event;
mod input;
mod render;
pub(crate) mod state;
pub(crate) mod style;
mod widgets;

pub use app::App;
pub use state::{AppState, PopupState};

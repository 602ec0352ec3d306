//! TUI widgets.

mod chart;
mod confirm;
mod filter;
mod header;
mod help;
mod popup;
mod schedule;
mod status_bar;
mod stocks;
mod templates;

pub use chart::render_chart;
pub use confirm::{render_action_confirm, render_message, render_quit_confirm};
pub use filter::render_filter;
pub use header::render_header;
pub use help::render_help;
pub use schedule::render_schedule;
pub use status_bar::render_status_bar;
pub use stocks::render_stocks;
pub use templates::render_templates;

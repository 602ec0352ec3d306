//! Declarative view models.
//!
//! Rendering is a pure projection of controller state: `stocks` builds a
//! [`TableViewModel`] from a `TableController`, and frontends (TUI, CLI,
//! `html`) only map view models to output.

pub mod common;
pub mod html;
pub mod stocks;

pub use common::{TableFooter, TableViewModel, ViewCell, ViewRow};
pub use stocks::{append_rows, build_stock_view, decorate, empty_view, replace_rows};

//! stockdash-core — client library for the stock screening dashboard.
//!
//! Provides:
//! - `models` — wire types (rows, query requests, templates, schedule, status)
//! - `columns` — static column definitions and their filter kinds
//! - `fmt` — cell formatting (numbers, placeholders, valuation badges)
//! - `query` — local query engine (search, range filters, sort, paging)
//! - `controller` — table view controller (query state, pagination cursor)
//! - `chart` — history chart loader
//! - `templates` — filter template manager
//! - `ops` — operational controls and the status poller
//! - `view` — UI-agnostic view models and their HTML projection
//! - `backend` — backend abstraction with HTTP and in-memory implementations
//!
//! With `tui` feature (default):
//! - `tui` — terminal dashboard (ratatui/crossterm)

pub mod backend;
pub mod chart;
pub mod columns;
pub mod config;
pub mod controller;
pub mod error;
pub mod fmt;
pub mod models;
pub mod ops;
pub mod query;
pub mod templates;
pub mod view;

#[cfg(feature = "tui")]
pub mod tui;

/// Crate version with the git SHA it was built from.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STOCKDASH_GIT_SHA"), ")");

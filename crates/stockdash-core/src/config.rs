//! Client configuration.
//!
//! The binary fills this from command-line flags and `STOCKDASH_*`
//! environment variables; library users build it directly.

use std::path::PathBuf;
use std::time::Duration;

use crate::columns::Columns;
use crate::error::ConfigError;

/// Default backend API root.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
/// Rows requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Upper bound the backend accepts for `page_size`.
pub const MAX_PAGE_SIZE: usize = 1000;
/// Task status poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
/// Lower bound for the poll period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    /// API root, e.g. `http://host:8000/api` (no trailing slash).
    pub base_url: String,
    pub page_size: usize,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Optional JSON column file; built-in columns when `None`.
    pub columns_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            columns_path: None,
        }
    }
}

impl Config {
    /// Normalizes the base URL and checks ranges.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.base_url));
        }
        self.base_url = url;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSize {
                got: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.poll_interval < MIN_POLL_INTERVAL {
            return Err(ConfigError::PollInterval {
                got_ms: self.poll_interval.as_millis() as u64,
                min_ms: MIN_POLL_INTERVAL.as_millis() as u64,
            });
        }
        Ok(self)
    }

    /// Resolves the column set for this session.
    pub fn load_columns(&self) -> Result<Columns, ConfigError> {
        match &self.columns_path {
            Some(path) => Columns::from_json_file(path),
            None => Ok(Columns::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let cfg = Config {
            base_url: "http://localhost:8000/api/".into(),
            ..Config::default()
        }
        .validated()
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn rejects_bad_values() {
        let bad_url = Config {
            base_url: "localhost:8000".into(),
            ..Config::default()
        };
        assert!(matches!(bad_url.validated(), Err(ConfigError::BaseUrl(_))));

        let bad_page = Config {
            page_size: 0,
            ..Config::default()
        };
        assert!(matches!(bad_page.validated(), Err(ConfigError::PageSize { .. })));

        let bad_poll = Config {
            poll_interval: Duration::from_millis(10),
            ..Config::default()
        };
        assert!(matches!(bad_poll.validated(), Err(ConfigError::PollInterval { .. })));
    }

    #[test]
    fn builtin_columns_without_path() {
        let cols = Config::default().load_columns().unwrap();
        assert!(cols.get("PEG").is_some());
    }
}

//! Backend abstraction for the screening service.
//!
//! This module defines the `Backend` trait that lets the controllers, the
//! TUI and the CLI work against different sources through one interface:
//! - `HttpBackend`: the real service over HTTP (feature `http`)
//! - `MemoryBackend`: an in-process double that executes queries locally,
//!   used by `--demo` and by tests

mod demo;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use demo::{demo_history, demo_rows};
#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use memory::{DEMO_ROW_COUNT, MemoryBackend};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{
    ActionReply, FilterTemplate, HistoryResponse, QueryRequest, QueryResponse, Schedule,
    TaskStatus,
};

/// Request/response contract of the screening backend.
///
/// Every method is a single round-trip with no retries. Mutating endpoints
/// return the raw [`ActionReply`]; callers decide whether `success: false`
/// is an error (see [`ActionReply::into_result`]).
///
/// The trait is object-safe and designed to be shared as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and the header bar.
    fn name(&self) -> &str;

    /// `POST /stocks/query`.
    async fn query_stocks(&self, req: &QueryRequest) -> Result<QueryResponse, ApiError>;

    /// `GET /history/{code}`.
    async fn history(&self, code: &str) -> Result<HistoryResponse, ApiError>;

    /// `GET /templates`, sorted by name.
    async fn templates(&self) -> Result<Vec<FilterTemplate>, ApiError>;

    /// `POST /templates`: create or overwrite by name.
    async fn save_template(&self, template: &FilterTemplate) -> Result<ActionReply, ApiError>;

    /// `DELETE /templates/{name}`.
    async fn delete_template(&self, name: &str) -> Result<ActionReply, ApiError>;

    /// `GET /schedule`.
    async fn schedule(&self) -> Result<Schedule, ApiError>;

    /// `POST /schedule`.
    async fn set_schedule(&self, schedule: &Schedule) -> Result<ActionReply, ApiError>;

    /// `GET /trigger_crawl`.
    async fn trigger_crawl(&self) -> Result<ActionReply, ApiError>;

    /// `POST /stop_crawl`.
    async fn stop_crawl(&self) -> Result<ActionReply, ApiError>;

    /// `POST /recalculate`.
    async fn recalculate(&self) -> Result<ActionReply, ApiError>;

    /// `POST /restart`. The service reloads itself; the reply may never arrive.
    async fn restart(&self) -> Result<ActionReply, ApiError>;

    /// `GET /status`.
    async fn status(&self) -> Result<TaskStatus, ApiError>;
}

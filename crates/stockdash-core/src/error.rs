//! Error types shared by the backend, controllers and CLI.

/// Errors from backend requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an HTTP error status.
    #[error("server error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// The server answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The body could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Rejected filter input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {column}: '{value}' is not a number")]
    InvalidNumber { column: String, value: String },

    #[error("column {column}: min {min} is greater than max {max}")]
    InvertedRange { column: String, min: f64, max: f64 },

    #[error("column {0} is not sortable")]
    NotSortable(String),
}

/// Rejected template input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("template name must not be empty")]
    EmptyName,

    #[error("template must contain at least one active filter")]
    NoFilters,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Rejected schedule input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("hour must be 0-23, got {0}")]
    Hour(u8),

    #[error("minute must be 0-59, got {0}")]
    Minute(u8),

    #[error("day of week must be 0-6, got '{0}'")]
    DayOfWeek(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Invalid client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base url '{0}': must start with http:// or https://")]
    BaseUrl(String),

    #[error("page size must be between 1 and {max}, got {got}")]
    PageSize { got: usize, max: usize },

    #[error("poll interval must be at least {min_ms}ms, got {got_ms}ms")]
    PollInterval { got_ms: u64, min_ms: u64 },

    #[error("failed to read column file {path}: {source}")]
    ColumnsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse column file {path}: {source}")]
    ColumnsParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("column file {0} defines no columns")]
    ColumnsEmpty(String),
}

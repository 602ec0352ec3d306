//! Wire types exchanged with the screening backend.
//!
//! Rows and history entries keep their metric columns as raw JSON values:
//! the backend mixes numbers, numeric strings and "N/A"-style sentinels in
//! the same column, so interpretation happens on read via [`CellValue`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ScheduleError};

/// Strings the backend uses to mean "no data".
pub const NOT_AVAILABLE: &[&str] = &["N/A", "-", "--", "nan", "NaN", "None", "null"];

/// Returns true for empty text or a not-available sentinel.
pub fn is_missing_text(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || NOT_AVAILABLE.contains(&s)
}

/// Interprets a raw JSON value as a number.
///
/// Numbers and numeric strings (with optional thousands separators) parse;
/// sentinels, non-finite values and everything else return `None`.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parses a user- or server-provided numeric string.
pub fn parse_number(s: &str) -> Option<f64> {
    if is_missing_text(s) {
        return None;
    }
    let cleaned: String = s.trim().chars().filter(|&c| c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A cell value after interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Absent, null, empty, or a not-available sentinel.
    Missing,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Missing,
            Some(Value::Number(n)) => match n.as_f64().filter(|v| v.is_finite()) {
                Some(v) => CellValue::Number(v),
                None => CellValue::Missing,
            },
            Some(Value::String(s)) => {
                if is_missing_text(s) {
                    CellValue::Missing
                } else if let Some(v) = parse_number(s) {
                    CellValue::Number(v)
                } else {
                    CellValue::Text(s.clone())
                }
            }
            Some(Value::Bool(b)) => CellValue::Text(b.to_string()),
            Some(other) => CellValue::Text(other.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// Stock rows
// ---------------------------------------------------------------------------

/// One stock record as returned by `POST /stocks/query`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    /// Listed in the Southbound Stock Connect ("港股通").
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_ggt: bool,
    /// Metric columns keyed by column key.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl Row {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder used by tests and the demo data set.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Interprets the value stored under `key`.
    ///
    /// `code`, `name` and `date` resolve to the fixed fields.
    pub fn value(&self, key: &str) -> CellValue {
        match key {
            "code" => CellValue::Text(self.code.clone()),
            "name" => CellValue::Text(self.name.clone()),
            "date" if !is_missing_text(&self.date) => CellValue::Text(self.date.clone()),
            "date" => CellValue::Missing,
            _ => CellValue::from_json(self.fields.get(key)),
        }
    }

    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.value(key).as_f64()
    }

    /// Raw text of a field for substring matching, `None` when missing.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.value(key) {
            CellValue::Missing => None,
            CellValue::Number(v) => Some(v.to_string()),
            CellValue::Text(s) => Some(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Sort direction on the wire (`"asc"` / `"desc"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn flip(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDir::Asc
    }
}

/// One bound of a range filter.
///
/// Numeric columns carry numbers; the opaque text columns carry the
/// substring to match in `min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FilterValue::Number(v) => Some(*v),
            FilterValue::Text(s) => parse_number(s),
        }
    }

    /// True for an empty text bound, which the backend treats as unset.
    pub fn is_blank(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(v) => write!(f, "{v}"),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

/// Inclusive range filter on one column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterRange {
    #[serde(default)]
    pub min: Option<FilterValue>,
    #[serde(default)]
    pub max: Option<FilterValue>,
}

impl FilterRange {
    pub fn numeric(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min: min.map(FilterValue::Number),
            max: max.map(FilterValue::Number),
        }
    }

    pub fn text(needle: impl Into<String>) -> Self {
        Self {
            min: Some(FilterValue::Text(needle.into())),
            max: None,
        }
    }

    /// At least one bound is set and non-blank.
    pub fn is_active(&self) -> bool {
        let set = |b: &Option<FilterValue>| b.as_ref().is_some_and(|v| !v.is_blank());
        set(&self.min) || set(&self.max)
    }
}

impl fmt::Display for FilterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(FilterValue::Text(s)), None) => write!(f, "~{s}"),
            (Some(min), Some(max)) => write!(f, "{min}..{max}"),
            (Some(min), None) => write!(f, ">={min}"),
            (None, Some(max)) => write!(f, "<={max}"),
            (None, None) => f.write_str("*"),
        }
    }
}

/// Active filters keyed by column key.
pub type FilterMap = BTreeMap<String, FilterRange>;

/// Body of `POST /stocks/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub page: u32,
    pub page_size: usize,
    pub sort_key: Option<String>,
    pub sort_dir: SortDir,
    pub filters: Option<FilterMap>,
    pub search: Option<String>,
}

/// Response of `POST /stocks/query`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One dated history record (`GET /history/{code}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl HistoryEntry {
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(value_as_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

// ---------------------------------------------------------------------------
// Templates, schedule, status
// ---------------------------------------------------------------------------

/// Named, server-persisted set of range filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterTemplate {
    pub name: String,
    #[serde(default)]
    pub filters: FilterMap,
}

/// `{success, message}` reply of mutating endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReply {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

fn default_success() -> bool {
    true
}

impl ActionReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Maps `success: false` to [`ApiError::Rejected`].
    pub fn into_result(self) -> Result<String, ApiError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(ApiError::Rejected(self.message))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    #[default]
    Daily,
    Weekly,
}

/// Crawl schedule (`GET/POST /schedule`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub hour: u8,
    pub minute: u8,
    #[serde(rename = "type", default)]
    pub kind: ScheduleKind,
    /// Cron day of week, "0" (Monday) through "6".
    #[serde(default = "default_day_of_week", deserialize_with = "string_or_number")]
    pub day_of_week: String,
}

fn default_day_of_week() -> String {
    "5".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            hour: 17,
            minute: 0,
            kind: ScheduleKind::Daily,
            day_of_week: default_day_of_week(),
        }
    }
}

impl Schedule {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.hour > 23 {
            return Err(ScheduleError::Hour(self.hour));
        }
        if self.minute > 59 {
            return Err(ScheduleError::Minute(self.minute));
        }
        if self.kind == ScheduleKind::Weekly {
            match self.day_of_week.trim().parse::<u8>() {
                Ok(d) if d <= 6 => {}
                _ => return Err(ScheduleError::DayOfWeek(self.day_of_week.clone())),
            }
        }
        Ok(())
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScheduleKind::Daily => write!(f, "daily at {:02}:{:02}", self.hour, self.minute),
            ScheduleKind::Weekly => write!(
                f,
                "weekly on day {} at {:02}:{:02}",
                self.day_of_week, self.hour, self.minute
            ),
        }
    }
}

/// Background task progress (`GET /status`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub message: String,
}

impl TaskStatus {
    /// Completion ratio in `[0, 1]`; 0 when the total is unknown.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.current as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

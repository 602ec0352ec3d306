//! Cell formatting shared by the TUI, the CLI table output and the HTML view.
//!
//! All pure formatting functions (no ratatui styles, no UI layout) live here.
//! Presentation classes ([`CellClass`], [`Badge`]) are mapped to colors by
//! each frontend.

use crate::columns::{ColumnDef, PRICE_KEY};
use crate::models::{CellValue, Row, TaskStatus};

/// Muted text shown for missing values.
pub const PLACEHOLDER: &str = "-";

/// Presentation class of a formatted cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellClass {
    #[default]
    Normal,
    /// Missing value, rendered muted.
    Placeholder,
    /// Negative number.
    Negative,
    /// Non-numeric text.
    Text,
}

/// Qualitative decoration for valuation and quality metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    VeryLow,
    Low,
    High,
    Solid,
    Weak,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Badge::VeryLow => "极低估",
            Badge::Low => "低估",
            Badge::High => "高估",
            Badge::Solid => "优",
            Badge::Weak => "差",
        }
    }

    /// CSS class used by the HTML projection.
    pub fn css_class(self) -> &'static str {
        match self {
            Badge::VeryLow => "badge-very-low",
            Badge::Low => "badge-low",
            Badge::High => "badge-high",
            Badge::Solid => "badge-solid",
            Badge::Weak => "badge-weak",
        }
    }

    /// True for badges that flag an attractive value.
    pub fn is_favorable(self) -> bool {
        matches!(self, Badge::VeryLow | Badge::Low | Badge::Solid)
    }
}

/// A cell ready for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormattedCell {
    pub text: String,
    pub class: CellClass,
    pub badge: Option<Badge>,
}

impl FormattedCell {
    pub fn placeholder() -> Self {
        Self {
            text: PLACEHOLDER.to_string(),
            class: CellClass::Placeholder,
            badge: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Inserts `,` every three digits of an unsigned digit string.
pub fn with_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a number with two decimals and thousands separators.
///
/// `1234567.891` → `"1,234,567.89"`, `-0.004` → `"0.00"`.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return PLACEHOLDER.to_string();
    }
    if v.abs() < 0.005 {
        return "0.00".to_string();
    }
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, with_thousands(int_part), frac_part)
}

/// Formats an integer count with thousands separators.
pub fn format_count(n: u64) -> String {
    with_thousands(&n.to_string())
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// Bands for a "lower is cheaper" metric: `[very_low, low)` upper bounds and
/// the `high` lower bound.
struct Bands {
    very_low: f64,
    low: f64,
    high: f64,
}

impl Bands {
    fn classify(&self, v: f64) -> Option<Badge> {
        if v <= 0.0 {
            None
        } else if v < self.very_low {
            Some(Badge::VeryLow)
        } else if v < self.low {
            Some(Badge::Low)
        } else if v >= self.high {
            Some(Badge::High)
        } else {
            None
        }
    }
}

const PEG_BANDS: Bands = Bands {
    very_low: 0.5,
    low: 0.67,
    high: 2.0,
};
const PRICE_TO_VALUE_BANDS: Bands = Bands {
    very_low: 0.5,
    low: 0.67,
    high: 1.5,
};
const PE_BANDS: Bands = Bands {
    very_low: 8.0,
    low: 12.0,
    high: 40.0,
};
const PB_BANDS: Bands = Bands {
    very_low: 0.7,
    low: 1.0,
    high: 8.0,
};

/// Badge for a metric value, if the metric is badged and the value is in a band.
///
/// Fair-value metrics are judged by the ratio of the row's latest price to
/// the value; the rest by the value itself.
pub fn badge_for(key: &str, value: f64, row: &Row) -> Option<Badge> {
    match key {
        "PEG" | "PEGY" => PEG_BANDS.classify(value),
        "市盈率" => PE_BANDS.classify(value),
        "市净率" => PB_BANDS.classify(value),
        "合理股价" | "格雷厄姆数" => {
            if value <= 0.0 {
                return None;
            }
            let price = row.numeric(PRICE_KEY)?;
            PRICE_TO_VALUE_BANDS.classify(price / value)
        }
        "净现比" => {
            if value >= 1.0 {
                Some(Badge::Solid)
            } else if value < 0.0 {
                Some(Badge::Weak)
            } else {
                None
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Formats one row's value for one column.
pub fn format_cell(column: &ColumnDef, row: &Row) -> FormattedCell {
    match row.value(&column.key) {
        CellValue::Missing => FormattedCell::placeholder(),
        CellValue::Number(v) => {
            let digits = format_number(v);
            let class = if v < 0.0 && digits != "0.00" {
                CellClass::Negative
            } else {
                CellClass::Normal
            };
            FormattedCell {
                text: format!("{}{}", digits, column.suffix_str()),
                class,
                badge: badge_for(&column.key, v, row),
            }
        }
        CellValue::Text(s) => FormattedCell {
            text: normalize_for_display(&s),
            class: CellClass::Text,
            badge: None,
        },
    }
}

/// Progress line for a background task: `"30/120 (25%) crawling"`.
pub fn format_progress(status: &TaskStatus) -> String {
    if status.total == 0 {
        return status.message.clone();
    }
    format!(
        "{}/{} ({:.0}%) {}",
        format_count(status.current),
        format_count(status.total),
        status.progress() * 100.0,
        status.message
    )
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Escapes text for inclusion in HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate string to at most `max_chars` characters with an ellipsis (`…`).
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Normalize text for single-line display: control whitespace becomes a
/// space and runs of spaces collapse into one.
pub fn normalize_for_display(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        let ch = if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch };
        if ch == ' ' {
            if !prev_space {
                result.push(ch);
            }
            prev_space = true;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Columns;

    #[test]
    fn numbers_have_two_decimals_and_separators() {
        assert_eq!(format_number(1234567.891), "1,234,567.89");
        assert_eq!(format_number(12.0), "12.00");
        assert_eq!(format_number(-1500.5), "-1,500.50");
        assert_eq!(format_number(999.999), "1,000.00");
    }

    #[test]
    fn tiny_magnitudes_render_as_zero() {
        assert_eq!(format_number(0.004), "0.00");
        assert_eq!(format_number(-0.0049), "0.00");
        assert_eq!(format_number(0.0), "0.00");
    }

    #[test]
    fn missing_values_render_as_placeholder() {
        let cols = Columns::builtin();
        let peg = cols.get("PEG").unwrap();
        for raw in [serde_json::json!(null), "N/A".into(), "".into(), "nan".into()] {
            let row = Row::new("00001", "长和").with("PEG", raw);
            let cell = format_cell(peg, &row);
            assert_eq!(cell.text, PLACEHOLDER);
            assert_eq!(cell.class, CellClass::Placeholder);
        }
        let cell = format_cell(peg, &Row::new("00001", "长和"));
        assert_eq!(cell.class, CellClass::Placeholder);
        assert!(!cell.text.contains("NaN"));
    }

    #[test]
    fn suffix_and_negative_class() {
        let cols = Columns::builtin();
        let change = cols.get("昨涨跌幅").unwrap();
        let row = Row::new("00005", "汇丰控股").with("昨涨跌幅", -2.346);
        let cell = format_cell(change, &row);
        assert_eq!(cell.text, "-2.35%");
        assert_eq!(cell.class, CellClass::Negative);

        let row = Row::new("00005", "汇丰控股").with("昨涨跌幅", -0.001);
        let cell = format_cell(change, &row);
        assert_eq!(cell.text, "0.00%");
        assert_eq!(cell.class, CellClass::Normal);
    }

    #[test]
    fn peg_badges() {
        let row = Row::default();
        assert_eq!(badge_for("PEG", 0.3, &row), Some(Badge::VeryLow));
        assert_eq!(badge_for("PEG", 0.6, &row), Some(Badge::Low));
        assert_eq!(badge_for("PEG", 1.0, &row), None);
        assert_eq!(badge_for("PEG", 2.5, &row), Some(Badge::High));
        assert_eq!(badge_for("PEG", -0.2, &row), None);
    }

    #[test]
    fn fair_value_badge_uses_price_ratio() {
        let row = Row::new("00700", "腾讯控股").with(PRICE_KEY, 40.0);
        assert_eq!(badge_for("合理股价", 100.0, &row), Some(Badge::VeryLow));
        assert_eq!(badge_for("合理股价", 65.0, &row), Some(Badge::Low));
        assert_eq!(badge_for("格雷厄姆数", 20.0, &row), Some(Badge::High));
        assert_eq!(badge_for("合理股价", 100.0, &Row::default()), None);
    }

    #[test]
    fn text_values_pass_through() {
        let cols = Columns::builtin();
        let industry = cols.get("所属行业").unwrap();
        let row = Row::new("01177", "中国生物制药").with("所属行业", "医药\n生物");
        let cell = format_cell(industry, &row);
        assert_eq!(cell.text, "医药 生物");
        assert_eq!(cell.class, CellClass::Text);
    }

    #[test]
    fn html_escaping() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("腾讯控股有限公司", 4), "腾讯控…");
        assert_eq!(truncate("abc", 5), "abc");
    }

    #[test]
    fn progress_line() {
        let status = TaskStatus {
            is_running: true,
            current: 1500,
            total: 3000,
            message: "crawling".into(),
        };
        assert_eq!(format_progress(&status), "1,500/3,000 (50%) crawling");
    }
}

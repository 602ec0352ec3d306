//! Column definitions.
//!
//! The column list is static for a session: either the built-in set that
//! mirrors the backend's table layout, or a JSON file in the same shape
//! (`[{"key": ..., "label": ..., "suffix": "%", "no_chart": true}, ...]`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Columns matched as opaque text (substring on `min`, `max` ignored).
pub const TEXT_FILTER_COLUMNS: &[&str] = &["所属行业", "bull_label"];

/// Key of the latest price, the reference for price/value ratios.
pub const PRICE_KEY: &str = "昨收";

/// How a column is compared when sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKind {
    /// Missing or non-numeric values sort as negative infinity.
    #[default]
    Numeric,
    /// Missing values sort as the empty string.
    Lexicographic,
}

/// How a column's filter bounds are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Numeric,
    Text,
}

/// Static metadata for one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default)]
    pub no_chart: bool,
    #[serde(default)]
    pub no_sort: bool,
}

impl ColumnDef {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            desc: None,
            tip: None,
            suffix: None,
            no_chart: false,
            no_sort: false,
        }
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        if !desc.is_empty() {
            self.desc = Some(desc.to_string());
        }
        self
    }

    pub fn no_chart(mut self) -> Self {
        self.no_chart = true;
        self
    }

    pub fn no_sort(mut self) -> Self {
        self.no_sort = true;
        self
    }

    pub fn filter_kind(&self) -> FilterKind {
        if TEXT_FILTER_COLUMNS.contains(&self.key.as_str()) {
            FilterKind::Text
        } else {
            FilterKind::Numeric
        }
    }

    pub fn sort_kind(&self) -> SortKind {
        match self.key.as_str() {
            "code" | "name" | "date" => SortKind::Lexicographic,
            _ if self.filter_kind() == FilterKind::Text => SortKind::Lexicographic,
            _ => SortKind::Numeric,
        }
    }

    pub fn is_chartable(&self) -> bool {
        !self.no_chart && self.sort_kind() == SortKind::Numeric
    }

    pub fn suffix_str(&self) -> &str {
        self.suffix.as_deref().unwrap_or("")
    }
}

/// Ordered column set for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    defs: Vec<ColumnDef>,
}

impl Default for Columns {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Columns {
    /// Wraps a list of metric columns, prepending `code` and `name` when absent.
    pub fn new(defs: Vec<ColumnDef>) -> Self {
        let mut all = Vec::with_capacity(defs.len() + 2);
        if !defs.iter().any(|c| c.key == "code") {
            all.push(ColumnDef::new("code", "代码").no_chart());
        }
        if !defs.iter().any(|c| c.key == "name") {
            all.push(ColumnDef::new("name", "名称").no_chart());
        }
        all.extend(defs);
        Self { defs: all }
    }

    /// Loads metric columns from a JSON array file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ColumnsIo {
            path: shown.clone(),
            source,
        })?;
        let defs: Vec<ColumnDef> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ColumnsParse {
                path: shown.clone(),
                source,
            })?;
        if defs.is_empty() {
            return Err(ConfigError::ColumnsEmpty(shown));
        }
        debug!(path = %shown, count = defs.len(), "loaded column definitions");
        Ok(Self::new(defs))
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDef> {
        self.defs.iter().find(|c| c.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.defs.iter().position(|c| c.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef> {
        self.defs.iter()
    }

    pub fn as_slice(&self) -> &[ColumnDef] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Built-in layout, matching the backend's default column config.
    pub fn builtin() -> Self {
        let pct = "%";
        let defs = vec![
            ColumnDef::new("所属行业", "行业").desc("公司所属行业板块").no_sort().no_chart(),
            ColumnDef::new("bull_label", "长牛评级").desc("长牛分级筛选").no_chart(),
            ColumnDef::new("trend_analysis.r_squared", "趋势R²").desc("对应周期的拟合度").no_chart(),
            ColumnDef::new("ma_strategy.benchmark_return", "基准回报%")
                .desc("同期持股不动回报")
                .suffix(pct)
                .no_chart(),
            ColumnDef::new("ma_strategy.total_return", "策略回报%")
                .desc("MA乖离率策略回测总回报")
                .suffix(pct)
                .no_chart(),
            ColumnDef::new("ma_strategy.win_rate", "胜率%").desc("策略交易胜率").suffix(pct).no_chart(),
            ColumnDef::new("ma_strategy.buy_bias", "买入阈值").desc("最佳买入偏离度").suffix(pct).no_chart(),
            ColumnDef::new("ma_strategy.sell_bias", "卖出阈值").desc("最佳卖出偏离度").suffix(pct).no_chart(),
            ColumnDef::new(PRICE_KEY, "最新").desc("最新价格"),
            ColumnDef::new("昨涨跌幅", "涨跌%").desc("日涨跌幅").suffix(pct),
            ColumnDef::new("昨成交量", "成交量").desc("日成交量(股)"),
            ColumnDef::new("昨换手率", "换手%").desc("交易活跃度").suffix(pct),
            ColumnDef::new("近一周涨跌幅", "周涨跌%").desc("短期动量").suffix(pct),
            ColumnDef::new("近一月涨跌幅", "月涨跌%").desc("中期动量").suffix(pct),
            ColumnDef::new("市盈率", "市盈率(PE)").desc("回本年限"),
            ColumnDef::new("PEG", "PEG").desc("成长估值比"),
            ColumnDef::new("PEGY", "PEGY").desc("股息修正PEG"),
            ColumnDef::new("合理股价", "合理股价").desc("格雷厄姆估值"),
            ColumnDef::new("格雷厄姆数", "格雷厄姆数").desc("价值上限"),
            ColumnDef::new("净现比", "净现比").desc("盈利含金量"),
            ColumnDef::new("市现率", "市现率").desc("现金流估值"),
            ColumnDef::new("财务杠杆", "财务杠杆").desc("权益乘数"),
            ColumnDef::new("总资产周转率", "周转率").desc("营运能力"),
            ColumnDef::new("基本每股收益同比增长率", "EPS同比%").desc("盈利增速").suffix(pct),
            ColumnDef::new("营业收入同比增长率", "营收同比%").desc("规模增速").suffix(pct),
            ColumnDef::new("营业利润率同比增长率", "利润率同比%").desc("获利能力变动").suffix(pct),
            ColumnDef::new("基本每股收益(元)", "EPS(元)").desc("每股所获利润"),
            ColumnDef::new("每股净资产(元)", "BPS(元)").desc("每股归属权益"),
            ColumnDef::new("每股经营现金流(元)", "每股现金流").desc("每股进账现金"),
            ColumnDef::new("市净率", "市净率(PB)").desc("净资产溢价"),
            ColumnDef::new("股息率TTM(%)", "股息率%").desc("分红回报率").suffix(pct),
            ColumnDef::new("每股股息TTM(港元)", "每股股息").desc("每股分到的钱"),
            ColumnDef::new("派息比率(%)", "派息比%").desc("分红慷慨度").suffix(pct),
            ColumnDef::new("营业总收入", "营收").desc("总生意额"),
            ColumnDef::new("营业总收入滚动环比增长(%)", "营收环比%").desc("营收短期趋势").suffix(pct),
            ColumnDef::new("净利润", "净利润").desc("最终落袋利润"),
            ColumnDef::new("净利润滚动环比增长(%)", "净利环比%").desc("净利短期趋势").suffix(pct),
            ColumnDef::new("销售净利率(%)", "净利率%").desc("产品暴利程度").suffix(pct),
            ColumnDef::new("股东权益回报率(%)", "ROE%").desc("净资产收益率").suffix(pct),
            ColumnDef::new("总资产回报率(%)", "ROA%").desc("总资产收益率").suffix(pct),
            ColumnDef::new("总市值(港元)", "总市值"),
            ColumnDef::new("港股市值(港元)", "港股市值"),
            ColumnDef::new("法定股本(股)", "法定股本").no_sort().no_chart(),
            ColumnDef::new("已发行股本(股)", "发行股本").no_sort().no_chart(),
            ColumnDef::new("已发行股本-H股(股)", "H股股本").no_sort().no_chart(),
            ColumnDef::new("每手股", "每手股").no_sort().no_chart(),
        ];
        Self::new(defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_starts_with_identity_columns() {
        let cols = Columns::builtin();
        assert_eq!(cols.as_slice()[0].key, "code");
        assert_eq!(cols.as_slice()[1].key, "name");
        assert!(cols.get("PEG").is_some());
    }

    #[test]
    fn text_columns_are_designated() {
        let cols = Columns::builtin();
        assert_eq!(cols.get("所属行业").unwrap().filter_kind(), FilterKind::Text);
        assert_eq!(cols.get("bull_label").unwrap().filter_kind(), FilterKind::Text);
        assert_eq!(cols.get("PEG").unwrap().filter_kind(), FilterKind::Numeric);
        assert_eq!(cols.get("name").unwrap().sort_kind(), SortKind::Lexicographic);
        assert_eq!(cols.get("市盈率").unwrap().sort_kind(), SortKind::Numeric);
    }

    #[test]
    fn chartable_excludes_flagged_and_text_columns() {
        let cols = Columns::builtin();
        assert!(cols.get("PEG").unwrap().is_chartable());
        assert!(!cols.get("ma_strategy.win_rate").unwrap().is_chartable());
        assert!(!cols.get("code").unwrap().is_chartable());
    }

    #[test]
    fn loads_backend_shaped_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"key": "PEG", "label": "PEG", "desc": "成长估值比", "tip": ""}},
               {{"key": "昨涨跌幅", "label": "涨跌%", "suffix": "%", "no_chart": false}}]"#
        )
        .unwrap();
        let cols = Columns::from_json_file(file.path()).unwrap();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols.get("昨涨跌幅").unwrap().suffix_str(), "%");
        assert_eq!(cols.position("PEG"), Some(2));
    }

    #[test]
    fn empty_column_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(matches!(
            Columns::from_json_file(file.path()),
            Err(ConfigError::ColumnsEmpty(_))
        ));
    }
}

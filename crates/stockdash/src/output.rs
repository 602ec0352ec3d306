//! Plain-text output for one-shot commands.

use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use stockdash_core::chart::ChartSeries;
use stockdash_core::fmt::{PLACEHOLDER, format_number, truncate};
use stockdash_core::models::{FilterMap, FilterTemplate};
use stockdash_core::view::{TableFooter, TableViewModel, ViewCell};

const COLUMN_SPACING: &str = "  ";

/// Left-aligns `text` to `width` terminal columns, truncating if needed.
fn pad(text: &str, width: usize) -> String {
    let mut text = text.to_string();
    if text.width() > width {
        let mut chars = width;
        while chars > 0 {
            text = truncate(&text, chars);
            if text.width() <= width {
                break;
            }
            chars -= 1;
        }
    }
    let fill = width.saturating_sub(text.width());
    text.push_str(&" ".repeat(fill));
    text
}

fn cell_text(cell: &ViewCell) -> String {
    match cell.badge {
        Some(badge) => format!("{} {}", cell.text, badge.label()),
        None => cell.text.clone(),
    }
}

fn footer_text(footer: &TableFooter) -> Option<String> {
    match footer {
        TableFooter::None | TableFooter::Loading => None,
        TableFooter::More => Some("More rows available (use --page or --all)".to_string()),
        TableFooter::AllLoaded => Some("All data shown".to_string()),
        TableFooter::Empty => Some("No stocks match".to_string()),
        TableFooter::Retry(e) => Some(format!("Failed to load more: {e}")),
        TableFooter::Error(e) => Some(format!("Error: {e}")),
    }
}

/// Aligned text table with title, sort marker and footer.
pub fn render_text(model: &TableViewModel<String>) -> String {
    let widths: Vec<usize> = model.widths.iter().map(|w| *w as usize).collect();
    let mut out = String::new();
    let _ = writeln!(out, "{}", model.title);

    let header: Vec<String> = model
        .headers
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let label = match model.sort_column {
                Some(col) if col == i => {
                    format!("{label}{}", if model.sort_ascending { "↑" } else { "↓" })
                }
                _ => label.clone(),
            };
            pad(&label, widths[i] + 1)
        })
        .collect();
    let _ = writeln!(out, "{}", header.join(COLUMN_SPACING).trim_end());

    for row in &model.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(&cell_text(cell), w + 1))
            .collect();
        let _ = writeln!(out, "{}", cells.join(COLUMN_SPACING).trim_end());
    }

    if let Some(footer) = footer_text(&model.footer) {
        let _ = writeln!(out, "{footer}");
    }
    out
}

pub fn filters_text(filters: &FilterMap) -> String {
    filters
        .iter()
        .map(|(key, range)| format!("{key} {range}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_templates(templates: &[FilterTemplate]) -> String {
    if templates.is_empty() {
        return "No saved templates\n".to_string();
    }
    let width = templates.iter().map(|t| t.name.width()).max().unwrap_or(0);
    let mut out = String::new();
    for t in templates {
        let _ = writeln!(out, "{}  {}", pad(&t.name, width), filters_text(&t.filters));
    }
    out
}

/// One `date value` line per point; gaps print as the placeholder.
pub fn render_series(series: &ChartSeries) -> String {
    let target = &series.target;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {}",
        target.code, series.name, target.field_label
    );
    for (date, value) in &series.points {
        let value = match value {
            Some(v) => format!("{}{}", format_number(*v), target.suffix),
            None => PLACEHOLDER.to_string(),
        };
        let _ = writeln!(out, "{date}  {value}");
    }
    match (series.bounds(), series.last_value()) {
        (Some((lo, hi)), Some(last)) => {
            let _ = writeln!(
                out,
                "min {}  max {}  latest {}",
                format_number(lo),
                format_number(hi),
                format_number(last)
            );
        }
        _ => {
            let _ = writeln!(out, "No data for this field");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdash_core::chart::ChartTarget;
    use stockdash_core::columns::{ColumnDef, Columns};
    use stockdash_core::controller::TableController;
    use stockdash_core::models::{FilterRange, QueryResponse, Row};
    use stockdash_core::view::build_stock_view;

    #[test]
    fn pad_handles_wide_characters() {
        assert_eq!(pad("腾讯", 6), "腾讯  ");
        assert_eq!(pad("abcdef", 4), "abc…");
        assert_eq!(pad("腾讯控股", 5).width(), 5);
    }

    #[test]
    fn text_table_shows_rows_and_footer() {
        let columns = Columns::new(vec![ColumnDef::new("PEG", "PEG")]);
        let mut ctl = TableController::new(columns, 50);
        let req = ctl.reset_and_query();
        ctl.apply(req.complete(Ok(QueryResponse {
            data: vec![Row::new("00700", "腾讯控股").with("PEG", 0.4)],
            total: 1,
            ..QueryResponse::default()
        })));

        let text = render_text(&build_stock_view(&ctl));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Stocks 1/1");
        assert!(lines[1].starts_with("代码"));
        assert!(lines[2].starts_with("00700"));
        assert!(lines[2].contains("0.40"));
        assert_eq!(lines[3], "All data shown");
    }

    #[test]
    fn series_prints_gaps_as_placeholder() {
        let series = ChartSeries {
            target: ChartTarget {
                code: "00700".into(),
                field_key: "PE".into(),
                field_label: "市盈率".into(),
                suffix: String::new(),
            },
            name: "腾讯控股".into(),
            points: vec![
                ("2024-01-01".into(), Some(10.0)),
                ("2024-01-02".into(), None),
                ("2024-01-03".into(), Some(12.5)),
            ],
        };
        let text = render_series(&series);
        assert!(text.contains("2024-01-02  -"));
        assert!(text.contains("latest 12.50"));
    }

    #[test]
    fn filters_text_lists_each_range() {
        let mut filters = FilterMap::new();
        filters.insert("PEG".into(), FilterRange::numeric(None, Some(0.5)));
        filters.insert("所属行业".into(), FilterRange::text("银行"));
        assert_eq!(filters_text(&filters), "PEG <=0.5, 所属行业 ~银行");
    }
}

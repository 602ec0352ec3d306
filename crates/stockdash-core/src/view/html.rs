//! HTML projection of a [`TableViewModel`].
//!
//! Emits a self-contained `<table>` fragment. Every piece of text goes
//! through [`escape_html`]; styling is left to CSS classes.

use std::fmt::Write;

use crate::fmt::{CellClass, escape_html};
use crate::view::common::{TableFooter, TableViewModel, ViewCell};

fn cell_class(class: CellClass) -> &'static str {
    match class {
        CellClass::Normal => "num",
        CellClass::Placeholder => "na",
        CellClass::Negative => "num negative",
        CellClass::Text => "text",
    }
}

fn write_cell(out: &mut String, cell: &ViewCell) {
    let _ = write!(
        out,
        "<td class=\"{}\">{}",
        cell_class(cell.class),
        escape_html(&cell.text)
    );
    if let Some(badge) = cell.badge {
        let _ = write!(
            out,
            " <span class=\"badge {}\">{}</span>",
            badge.css_class(),
            badge.label()
        );
    }
    out.push_str("</td>");
}

pub fn render_table<Id: std::fmt::Display>(model: &TableViewModel<Id>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<table class=\"stock-table\">\n<caption>{}</caption>",
        escape_html(&model.title)
    );

    out.push_str("<thead><tr>");
    for (i, (key, header)) in model.keys.iter().zip(&model.headers).enumerate() {
        let sort = match model.sort_column {
            Some(col) if col == i && model.sort_ascending => " aria-sort=\"ascending\"",
            Some(col) if col == i => " aria-sort=\"descending\"",
            _ => "",
        };
        let _ = write!(
            out,
            "<th data-key=\"{}\"{}>{}</th>",
            escape_html(key),
            sort,
            escape_html(header)
        );
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for row in &model.rows {
        let _ = write!(out, "<tr data-id=\"{}\">", escape_html(&row.id.to_string()));
        for cell in &row.cells {
            write_cell(&mut out, cell);
        }
        out.push_str("</tr>\n");
    }

    let cols = model.headers.len().max(1);
    let footer = match &model.footer {
        TableFooter::None => None,
        TableFooter::Loading => Some(("loading", "Loading…".to_string())),
        TableFooter::More => Some(("more", "Scroll for more".to_string())),
        TableFooter::AllLoaded => Some(("done", "All data shown".to_string())),
        TableFooter::Empty => Some(("empty", "No matching stocks".to_string())),
        TableFooter::Retry(msg) => Some(("retry", format!("Failed to load more: {msg}"))),
        TableFooter::Error(msg) => Some(("error", format!("Query failed: {msg}"))),
    };
    if let Some((class, text)) = footer {
        let _ = writeln!(
            out,
            "<tr class=\"footer {class}\"><td colspan=\"{cols}\">{}</td></tr>",
            escape_html(&text)
        );
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ColumnDef, Columns};
    use crate::models::Row;
    use crate::view::stocks::{empty_view, replace_rows};

    #[test]
    fn text_is_escaped() {
        let cols = Columns::new(vec![ColumnDef::new("所属行业", "行业"), ColumnDef::new("PEG", "PEG")]);
        let rows = vec![
            Row::new("<b>", "A&B \"Co\"")
                .with("所属行业", "<script>alert(1)</script>")
                .with("PEG", 0.3),
        ];
        let mut model = replace_rows(empty_view(&cols, "T<1>".into()), &rows, &cols);
        model.footer = TableFooter::Error("<oops>".into());
        let html = render_table(&model);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("A&amp;B &quot;Co&quot;"));
        assert!(html.contains("data-id=\"&lt;b&gt;\""));
        assert!(html.contains("<caption>T&lt;1&gt;</caption>"));
        assert!(html.contains("badge badge-very-low"));
        assert!(html.contains("Query failed: &lt;oops&gt;"));
    }

    #[test]
    fn sorted_header_is_marked() {
        let cols = Columns::new(vec![ColumnDef::new("PEG", "PEG")]);
        let mut model = empty_view(&cols, "t".into());
        model.sort_column = Some(2);
        model.sort_ascending = false;
        let html = render_table(&model);
        assert!(html.contains("<th data-key=\"PEG\" aria-sort=\"descending\">PEG</th>"));
    }
}

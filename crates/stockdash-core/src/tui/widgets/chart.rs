//! History chart popup.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};

use crate::chart::{ChartSeries, ChartState};
use crate::fmt::format_number;
use crate::tui::style::{Styles, Theme};

use super::popup::{error_line, key_hints, open_popup, popup_rect};

/// Y-axis bounds with 5% padding; a flat series gets a band around its value.
pub fn padded_bounds(lo: f64, hi: f64) -> [f64; 2] {
    if (hi - lo).abs() < f64::EPSILON {
        let padding = (hi.abs() * 0.05).max(1.0);
        [lo - padding, hi + padding]
    } else {
        let padding = (hi - lo) * 0.05;
        [lo - padding, hi + padding]
    }
}

fn value_label(v: f64, suffix: &str) -> String {
    format!("{}{suffix}", format_number(v))
}

pub fn render_chart(frame: &mut Frame, area: Rect, state: &ChartState) {
    let popup_area = popup_rect(area, 80, (50, 140), (14, 40));
    match state {
        ChartState::Idle => {}
        ChartState::Loading(target) => {
            let inner = open_popup(frame, popup_area, &format!("{} {}", target.code, target.field_label));
            let text = Paragraph::new(Line::from(Span::styled("Loading history...", Styles::dim())))
                .alignment(Alignment::Center);
            frame.render_widget(text, inner);
        }
        ChartState::Failed { target, message } => {
            let inner = open_popup(frame, popup_area, &format!("{} {}", target.code, target.field_label));
            let lines = vec![
                error_line(message),
                Line::from(""),
                key_hints(&[("Esc", "close"), ("c", "close")]),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
        }
        ChartState::Ready(series) => render_series(frame, popup_area, series),
    }
}

fn render_series(frame: &mut Frame, popup_area: Rect, series: &ChartSeries) {
    let target = &series.target;
    let title = format!("{} {} · {}", target.code, series.name, target.field_label);
    let inner = open_popup(frame, popup_area, &title);
    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(1)]).split(inner);

    let latest = series
        .last_value()
        .map(|v| value_label(v, &target.suffix))
        .unwrap_or_else(|| "-".to_string());
    let footer = Line::from(vec![
        Span::styled("latest ", Styles::help()),
        Span::styled(latest, Styles::help_key()),
        Span::styled(format!("   {} points   ", series.points.len()), Styles::help()),
        Span::styled("Esc", Styles::help_key()),
        Span::styled(" close", Styles::help()),
    ]);
    frame.render_widget(Paragraph::new(footer), chunks[1]);

    let Some((lo, hi)) = series.bounds() else {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No numeric history for this metric",
            Styles::dim(),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(empty, chunks[0]);
        return;
    };

    let segments = series.segments();
    let datasets: Vec<Dataset> = segments
        .iter()
        .map(|points| {
            let graph = if points.len() == 1 {
                GraphType::Scatter
            } else {
                GraphType::Line
            };
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(graph)
                .style(Style::default().fg(Theme::CHART_LINE))
                .data(points)
        })
        .collect();

    let x_max = series.points.len().saturating_sub(1).max(1) as f64;
    let x_labels = match series.date_range() {
        Some((first, last)) => vec![
            Span::styled(first.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(last.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        ],
        None => vec![Span::raw("")],
    };
    let y_bounds = padded_bounds(lo, hi);
    let y_labels = vec![
        Span::styled(value_label(lo, &target.suffix), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value_label(f64::midpoint(lo, hi), &target.suffix)),
        Span::styled(value_label(hi, &target.suffix), Style::default().add_modifier(Modifier::BOLD)),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(Styles::dim())
                .labels(x_labels)
                .labels_alignment(Alignment::Left)
                .bounds([0.0, x_max]),
        )
        .y_axis(
            Axis::default()
                .style(Styles::dim())
                .labels(y_labels)
                .bounds(y_bounds),
        );
    frame.render_widget(chart, chunks[0]);
}

//! PNG charts for a finished report.
//!
//! * Bar chart of the top titles on a log-scaled count axis, one random
//!   colour per bar, each bar labelled with its exact count.
//! * Line chart of the cumulative run history kept in
//!   `line_graph_data.csv`.
//!
//! Both render through the plotters bitmap backend.

use std::collections::HashSet;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rand::Rng;

use views_core::error::{Result, ViewsError};
use views_core::formatting::format_count;
use views_core::models::{ChartOrientation, HistoryRow, ViewRecord};

pub const BAR_CHART_FILE: &str = "pageviews_plot.png";
pub const LINE_CHART_FILE: &str = "line_graph.png";

const BAR_CHART_TITLE: &str = "Wikipedia Pageviews for Edited Pages (Log Scale)";
const LINE_CHART_TITLE: &str = "Total Views Over Time (Daily)";

fn chart_err(e: impl std::fmt::Display) -> ViewsError {
    ViewsError::Chart(e.to_string())
}

// ── Data preparation ──────────────────────────────────────────────────────────

/// The first `n` records (records arrive ranked).
pub fn top_n(records: &[ViewRecord], n: usize) -> &[ViewRecord] {
    &records[..records.len().min(n)]
}

/// Smallest power of ten strictly greater than `max`, never below 10.
pub fn log_ceiling(max: u64) -> u64 {
    let mut ceiling: u64 = 10;
    while ceiling <= max {
        match ceiling.checked_mul(10) {
            Some(next) => ceiling = next,
            None => return u64::MAX,
        }
    }
    ceiling
}

/// `count` pairwise-distinct random colours.
pub fn distinct_colors<R: Rng>(count: usize, rng: &mut R) -> Vec<RGBColor> {
    let mut seen = HashSet::with_capacity(count);
    let mut colors = Vec::with_capacity(count);
    while colors.len() < count {
        let rgb: (u8, u8, u8) = (rng.random(), rng.random(), rng.random());
        if seen.insert(rgb) {
            colors.push(RGBColor(rgb.0, rgb.1, rgb.2));
        }
    }
    colors
}

/// History rows as `(days since earliest date, total)` points in file
/// order, plus the earliest date. `None` for empty history.
pub fn history_points(rows: &[HistoryRow]) -> Option<(NaiveDate, Vec<(i32, f64)>)> {
    let origin = rows.iter().map(|r| r.date).min()?;
    let points = rows
        .iter()
        .map(|r| {
            let offset = (r.date - origin).num_days();
            (i32::try_from(offset).unwrap_or(i32::MAX), r.total_views as f64)
        })
        .collect();
    Some((origin, points))
}

// ── Bar chart ─────────────────────────────────────────────────────────────────

/// Draw the top `top` records as a bar chart at `path`.
pub fn draw_bar_chart(
    records: &[ViewRecord],
    top: usize,
    orientation: ChartOrientation,
    path: &Path,
) -> Result<()> {
    let records = top_n(records, top);
    if records.is_empty() {
        return Err(ViewsError::Chart("no records to plot".to_string()));
    }

    let colors = distinct_colors(records.len(), &mut rand::rng());
    match orientation {
        ChartOrientation::Vertical => draw_vertical_bars(records, &colors, path),
        ChartOrientation::Horizontal => draw_horizontal_bars(records, &colors, path),
    }
}

fn draw_vertical_bars(records: &[ViewRecord], colors: &[RGBColor], path: &Path) -> Result<()> {
    let n = records.len() as u32;
    let max = records.iter().map(|r| r.views).max().unwrap_or(1);
    let ceiling = log_ceiling(max) as f64;
    let width = (records.len() as u32 * 60).max(1200);

    let root = BitMapBackend::new(path, (width, 900)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(BAR_CHART_TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(260)
        .y_label_area_size(100)
        .build_cartesian_2d((0u32..n).into_segmented(), (1f64..ceiling).log_scale())
        .map_err(chart_err)?;

    let title_at = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => records
            .get(*i as usize)
            .map(|r| r.title.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(records.len())
        .x_label_formatter(&title_at)
        .x_label_style(
            ("sans-serif", 13)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_formatter(&|y| format_count(y.round() as u64))
        .x_desc("Page Title")
        .y_desc("Total Views (log scale)")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(records.iter().zip(colors).enumerate().map(|(i, (r, color))| {
            let i = i as u32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 1.0),
                    (SegmentValue::Exact(i + 1), r.views as f64),
                ],
                color.filled(),
            );
            bar.set_margin(0, 0, 15, 15);
            bar
        }))
        .map_err(chart_err)?;

    let label_style = TextStyle::from(("sans-serif", 13).into_font())
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(records.iter().enumerate().map(|(i, r)| {
            Text::new(
                format_count(r.views),
                (SegmentValue::CenterOf(i as u32), r.views as f64),
                label_style.clone(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

fn draw_horizontal_bars(records: &[ViewRecord], colors: &[RGBColor], path: &Path) -> Result<()> {
    let n = records.len() as u32;
    let max = records.iter().map(|r| r.views).max().unwrap_or(1);
    let ceiling = log_ceiling(max) as f64;
    let height = (records.len() as u32 * 40).max(800);

    // Highest count goes on the top row.
    let row_of = |i: usize| n - 1 - i as u32;

    let root = BitMapBackend::new(path, (1400, height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(BAR_CHART_TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(320)
        .build_cartesian_2d((1f64..ceiling).log_scale(), (0u32..n).into_segmented())
        .map_err(chart_err)?;

    let title_at = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(row) => (n - 1)
            .checked_sub(*row)
            .and_then(|i| records.get(i as usize))
            .map(|r| r.title.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(records.len())
        .y_label_formatter(&title_at)
        .x_label_formatter(&|x| format_count(x.round() as u64))
        .y_desc("Page Title")
        .x_desc("Total Views (log scale)")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(records.iter().zip(colors).enumerate().map(|(i, (r, color))| {
            let row = row_of(i);
            let mut bar = Rectangle::new(
                [
                    (1.0, SegmentValue::Exact(row)),
                    (r.views as f64, SegmentValue::Exact(row + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))
        .map_err(chart_err)?;

    let label_style = TextStyle::from(("sans-serif", 13).into_font())
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart
        .draw_series(records.iter().enumerate().map(|(i, r)| {
            Text::new(
                format!(" {}", format_count(r.views)),
                (r.views as f64, SegmentValue::CenterOf(row_of(i))),
                label_style.clone(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

// ── Line chart ────────────────────────────────────────────────────────────────

/// Draw total views over time from the run history at `path`.
pub fn draw_line_chart(history: &[HistoryRow], path: &Path) -> Result<()> {
    let Some((origin, points)) = history_points(history) else {
        return Err(ViewsError::Chart("history is empty".to_string()));
    };

    let last_day = points.iter().map(|p| p.0).max().unwrap_or(0);
    let max_views = points.iter().map(|p| p.1).fold(0f64, f64::max);
    let y_top = if max_views > 0.0 { max_views * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(LINE_CHART_TITLE, ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(-1i32..last_day + 1, 0f64..y_top)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|d| {
            (origin + Duration::days(i64::from(*d)))
                .format("%Y-%m-%d")
                .to_string()
        })
        .y_label_formatter(&|y| format_count(y.round() as u64))
        .x_desc("Date")
        .y_desc("Total Views")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))
        .map_err(chart_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 4, BLUE.filled())),
        )
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

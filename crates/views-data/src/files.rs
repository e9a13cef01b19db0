//! Flat files a report leaves behind.
//!
//! * `pageviews.csv` – header plus one `title,views` row per reported
//!   title, rewritten on every run.
//! * `line_graph_data.csv` – headerless `YYYY-MM-DD,total` rows, one
//!   appended per run that draws the line chart.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, warn};

use views_core::error::{Result, ViewsError};
use views_core::models::{HistoryRow, ViewRecord};

pub const RESULTS_FILE: &str = "pageviews.csv";
pub const HISTORY_FILE: &str = "line_graph_data.csv";

const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d";

// ── Results CSV ───────────────────────────────────────────────────────────────

/// Quote a field if it holds a comma, a quote or a line break; embedded
/// quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render `records` as the results CSV body.
pub fn render_results_csv(records: &[ViewRecord]) -> String {
    let mut out = String::from("Page Title,Total Views\n");
    for record in records {
        out.push_str(&escape_field(&record.title));
        out.push(',');
        out.push_str(&record.views.to_string());
        out.push('\n');
    }
    out
}

/// Overwrite `path` with the results CSV for `records`.
pub fn write_results_csv(path: &Path, records: &[ViewRecord]) -> Result<()> {
    fs::write(path, render_results_csv(records)).map_err(|source| ViewsError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = records.len(), "results CSV written");
    Ok(())
}

// ── History CSV ───────────────────────────────────────────────────────────────

/// Append one `date,total` line, creating the file if needed.
pub fn append_history_row(path: &Path, row: &HistoryRow) -> Result<()> {
    let to_write_err = |source| ViewsError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_write_err)?;

    writeln!(
        file,
        "{},{}",
        row.date.format(HISTORY_DATE_FORMAT),
        row.total_views
    )
    .map_err(to_write_err)
}

/// Parse a single history line. Blank or malformed lines yield `None`.
pub fn parse_history_line(line: &str) -> Option<HistoryRow> {
    let (date, total) = line.trim().split_once(',')?;
    let date = NaiveDate::parse_from_str(date.trim(), HISTORY_DATE_FORMAT).ok()?;
    let total_views = total.trim().parse::<u64>().ok()?;
    Some(HistoryRow { date, total_views })
}

/// Read every well-formed row of the history file, in file order.
///
/// A missing file reads as empty history.
pub fn read_history(path: &Path) -> Result<Vec<HistoryRow>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ViewsError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_history_line(line) {
            Some(row) => rows.push(row),
            None => warn!(
                path = %path.display(),
                line = idx + 1,
                "skipping malformed history line"
            ),
        }
    }
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

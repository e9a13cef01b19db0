//! Console report table.
//!
//! Lays the ranked records out as a bordered [`ratatui::widgets::Table`],
//! renders it into an off-screen [`Buffer`] and flattens the buffer into
//! plain text lines, so the report prints the same whether or not stdout
//! is a terminal.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    text::Line,
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use views_core::formatting::format_count;
use views_core::models::ViewRecord;

/// Titles wider than this many columns are cut with an ellipsis.
pub const DEFAULT_MAX_TITLE_WIDTH: usize = 60;

const HEADERS: [&str; 3] = ["Rank", "Page Title", "Total Views"];

/// Render `records` (already ranked) as table lines.
pub fn render_report_table(records: &[ViewRecord], max_title_width: usize) -> Vec<String> {
    let titles: Vec<String> = records
        .iter()
        .map(|r| truncate_to_width(&r.title, max_title_width))
        .collect();
    let counts: Vec<String> = records.iter().map(|r| format_count(r.views)).collect();

    let rank_width = column_width(HEADERS[0], (1..=records.len()).map(|i| i.to_string().len()));
    let title_width = column_width(HEADERS[1], titles.iter().map(|t| t.width()));
    let views_width = column_width(HEADERS[2], counts.iter().map(|c| c.len()));

    let header = Row::new([
        Cell::from(HEADERS[0]),
        Cell::from(HEADERS[1]),
        Cell::from(Line::from(HEADERS[2]).alignment(Alignment::Right)),
    ]);

    let rows: Vec<Row> = titles
        .into_iter()
        .zip(counts)
        .enumerate()
        .map(|(i, (title, count))| {
            Row::new([
                Cell::from(Line::from((i + 1).to_string()).alignment(Alignment::Right)),
                Cell::from(title),
                Cell::from(Line::from(count).alignment(Alignment::Right)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(rank_width),
        Constraint::Length(title_width),
        Constraint::Length(views_width),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(Block::default().borders(Borders::ALL));

    // Two border columns plus the two gaps between three columns.
    let width = rank_width + title_width + views_width + 2 + 4;
    let height = u16::try_from(records.len() + 3).unwrap_or(u16::MAX);
    let area = Rect::new(0, 0, width, height);

    let mut buf = Buffer::empty(area);
    table.render(area, &mut buf);
    buffer_lines(&buf)
}

/// `Pages included` / `Total combined views` summary lines.
pub fn render_summary(pages: usize, total_views: u64) -> [String; 2] {
    [
        format!("Pages included: {pages}"),
        format!("Total combined views: {}", format_count(total_views)),
    ]
}

/// Cut `text` to at most `max_width` display columns, ending in `…` when
/// anything was removed.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn column_width(header: &str, cells: impl Iterator<Item = usize>) -> u16 {
    let widest = cells.fold(header.width(), usize::max);
    u16::try_from(widest).unwrap_or(u16::MAX)
}

/// Flatten a buffer into trimmed text lines. Cells hidden behind a
/// double-width glyph are skipped.
fn buffer_lines(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        let mut skip = 0usize;
        for x in area.left()..area.right() {
            let symbol = buf[(x, y)].symbol();
            if skip == 0 {
                line.push_str(symbol);
            }
            skip = symbol.width().max(skip).saturating_sub(1);
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

// ── Tests ─────────────────────────────────────────────────────────────────────

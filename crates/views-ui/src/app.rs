//! Report presentation and the optional chart stages.
//!
//! [`App`] prints the ranked table and summary for a finished
//! [`ReportOutcome`], then walks the two optional stages in order: bar
//! chart, then line chart. Whether a stage runs is decided by a
//! [`StageGate`]: command-line flags ([`FlagGate`]) or yes/no prompts
//! ([`PromptGate`]). Declining the bar chart ends the run in either mode.
//! Chart failures are logged; by then the report itself is already on
//! disk.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use crossterm::style::Stylize;
use tracing::{error, info, warn};

use views_core::models::{ChartOrientation, HistoryRow};
use views_core::settings::Settings;
use views_core::time_utils::TimezoneHandler;
use views_data::files::{append_history_row, read_history, HISTORY_FILE};
use views_runtime::orchestrator::ReportOutcome;

use crate::charts::{self, BAR_CHART_FILE, LINE_CHART_FILE};
use crate::table_view::{self, DEFAULT_MAX_TITLE_WIDTH};

// ── Stage gating ──────────────────────────────────────────────────────────────

/// Optional stages that follow the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BarChart,
    LineChart,
}

impl Stage {
    /// Question asked by [`PromptGate`].
    pub fn question(self) -> &'static str {
        match self {
            Stage::BarChart => "Do you want to show the bar chart (y/n)? ",
            Stage::LineChart => {
                "Do you want to see a line graph of total views over time (y/n)? "
            }
        }
    }
}

/// Decides whether an optional stage runs.
pub trait StageGate {
    /// `true` to run `stage`.
    fn allow(&mut self, stage: Stage) -> bool;
}

/// Non-interactive gate driven by `--bar-chart` / `--line-chart`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagGate {
    pub bar_chart: bool,
    pub line_chart: bool,
}

impl StageGate for FlagGate {
    fn allow(&mut self, stage: Stage) -> bool {
        match stage {
            Stage::BarChart => self.bar_chart,
            Stage::LineChart => self.line_chart,
        }
    }
}

/// Interactive gate: asks each stage's question and runs it only on `y`.
pub struct PromptGate<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptGate<io::StdinLock<'static>, io::Stdout> {
    /// Gate reading from stdin and prompting on stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StageGate for PromptGate<R, W> {
    fn allow(&mut self, stage: Stage) -> bool {
        if write!(self.output, "\n{}", stage.question())
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                warn!(error = %e, "failed to read answer; treating as no");
                false
            }
        }
    }
}

/// `y` in any case, surrounding whitespace ignored. Anything else is no.
pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

// ── ChartOptions ──────────────────────────────────────────────────────────────

/// Where and how charts are drawn.
pub struct ChartOptions {
    pub output_dir: PathBuf,
    pub orientation: ChartOrientation,
    /// Bars in the bar chart.
    pub top: usize,
    /// Dates history rows in the user's timezone.
    pub timezone: TimezoneHandler,
}

impl ChartOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            orientation: settings.chart_orientation(),
            top: settings.top as usize,
            timezone: TimezoneHandler::new(&settings.timezone),
        }
    }
}

/// Files the chart stages produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StagesRun {
    pub bar_chart: Option<PathBuf>,
    pub line_chart: Option<PathBuf>,
    /// Set when the line stage appended a history row.
    pub history_row: Option<HistoryRow>,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Console front end for one report run.
pub struct App<G, W> {
    gate: G,
    out: W,
    options: ChartOptions,
}

impl<G: StageGate, W: Write> App<G, W> {
    pub fn new(gate: G, out: W, options: ChartOptions) -> Self {
        Self { gate, out, options }
    }

    /// Print the report, then run whichever chart stages the gate allows.
    /// The line chart is only offered after the bar chart was accepted.
    pub fn present(&mut self, outcome: &ReportOutcome, now: DateTime<Utc>) -> io::Result<StagesRun> {
        self.print_report(outcome)?;

        let mut run = StagesRun::default();

        if !self.gate.allow(Stage::BarChart) {
            return Ok(run);
        }
        run.bar_chart = self.bar_chart_stage(outcome)?;

        if self.gate.allow(Stage::LineChart) {
            let (row, path) = self.line_chart_stage(outcome, now)?;
            run.history_row = row;
            run.line_chart = path;
        }

        Ok(run)
    }

    /// Table, failures and summary.
    pub fn print_report(&mut self, outcome: &ReportOutcome) -> io::Result<()> {
        for title in &outcome.failed {
            writeln!(self.out, "{} {} - Error fetching views", "x".red(), title)?;
        }

        for line in table_view::render_report_table(&outcome.records, DEFAULT_MAX_TITLE_WIDTH) {
            writeln!(self.out, "{line}")?;
        }

        let [pages, total] =
            table_view::render_summary(outcome.pages_included(), outcome.total_views());
        writeln!(self.out)?;
        writeln!(self.out, "{}", pages.bold())?;
        writeln!(self.out, "{}", total.bold())?;
        writeln!(
            self.out,
            "Results saved to {}",
            outcome.results_path.display()
        )?;
        self.out.flush()
    }

    fn bar_chart_stage(&mut self, outcome: &ReportOutcome) -> io::Result<Option<PathBuf>> {
        let path = self.options.output_dir.join(BAR_CHART_FILE);
        match charts::draw_bar_chart(
            &outcome.records,
            self.options.top,
            self.options.orientation,
            &path,
        ) {
            Ok(()) => {
                info!(path = %path.display(), "bar chart saved");
                writeln!(self.out, "Bar chart saved to {}", path.display())?;
                Ok(Some(path))
            }
            Err(e) => {
                error!(error = %e, "bar chart failed");
                Ok(None)
            }
        }
    }

    /// Append today's total to the history file, re-read the whole history
    /// and plot it.
    fn line_chart_stage(
        &mut self,
        outcome: &ReportOutcome,
        now: DateTime<Utc>,
    ) -> io::Result<(Option<HistoryRow>, Option<PathBuf>)> {
        let history_path = self.options.output_dir.join(HISTORY_FILE);
        let row = HistoryRow {
            date: self.options.timezone.today(now),
            total_views: outcome.total_views(),
        };

        if let Err(e) = append_history_row(&history_path, &row) {
            error!(error = %e, "could not record history");
            return Ok((None, None));
        }

        let history = match read_history(&history_path) {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "could not read history");
                return Ok((Some(row), None));
            }
        };

        let path = self.options.output_dir.join(LINE_CHART_FILE);
        match charts::draw_line_chart(&history, &path) {
            Ok(()) => {
                info!(path = %path.display(), points = history.len(), "line chart saved");
                writeln!(self.out, "Line chart saved to {}", path.display())?;
                Ok((Some(row), Some(path)))
            }
            Err(e) => {
                error!(error = %e, "line chart failed");
                Ok((Some(row), None))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, ViewsError};
use crate::models::ChartOrientation;
use crate::time_utils::TimezoneHandler;

/// Client identifier sent as `User-Agent` on every request.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "wikiviews/",
    env!("CARGO_PKG_VERSION"),
    " (Wikipedia pageview report)"
);

/// MediaWiki action API serving `list=usercontribs`.
pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Wikimedia REST base for per-article pageview series.
pub const DEFAULT_METRICS_URL: &str =
    "https://wikimedia.org/api/rest_v1/metrics/pageviews/per-article";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Total Wikipedia pageviews for every page a user has edited
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wikiviews",
    about = "Total Wikipedia pageviews for every page a user has edited",
    version
)]
pub struct Settings {
    /// Username whose contributions are reported (remembered between runs)
    #[arg(long)]
    pub user: Option<String>,

    /// Page title to leave out of the report (repeatable)
    #[arg(long = "exclude", value_name = "TITLE")]
    pub exclude: Vec<String>,

    /// Wikimedia project the pageviews are counted on
    #[arg(long, default_value = "en.wikipedia.org")]
    pub project: String,

    /// MediaWiki action API endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-article pageviews endpoint
    #[arg(long, default_value = DEFAULT_METRICS_URL)]
    pub metrics_url: String,

    /// Access method counted
    #[arg(long, default_value = "all-access", value_parser = ["all-access", "desktop", "mobile-app", "mobile-web"])]
    pub access: String,

    /// Agent class counted ("user" for human readers only)
    #[arg(long, default_value = "all-agents", value_parser = ["all-agents", "user", "spider", "automated"])]
    pub agent: String,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Pause between remote requests in milliseconds
    #[arg(long, default_value = "500")]
    pub request_delay_ms: u64,

    /// HTTP timeout in seconds (1-600)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,

    /// Directory for pageviews.csv, line_graph_data.csv and the charts
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Render the bar chart of the top pages
    #[arg(long)]
    pub bar_chart: bool,

    /// Record today's total and render the line chart of totals over time
    #[arg(long, requires = "bar_chart")]
    pub line_chart: bool,

    /// Ask before each chart instead of using --bar-chart / --line-chart
    #[arg(long)]
    pub interactive: bool,

    /// Bar chart orientation
    #[arg(long, default_value = "vertical", value_parser = ["vertical", "horizontal"])]
    pub orientation: String,

    /// Number of pages shown in the bar chart (1-100)
    #[arg(long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top: u32,

    /// Timezone used to date history rows (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Report parameters remembered between runs in `~/.wikiviews/last_used.json`.
///
/// Only the "who and what" of a report is remembered; endpoints, delays and
/// output locations are per-invocation.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// `~/.wikiviews/last_used.json`, or `./.wikiviews/...` without a home
    /// directory.
    pub fn config_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::config_path_in(&home)
    }

    /// Same layout under an arbitrary base directory.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".wikiviews").join("last_used.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read params from `path`. A missing or unreadable file yields the
    /// empty set; nothing here is worth failing a run over.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable last-used file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Write to a sibling `.tmp` file and rename it over `path`, so a
    /// reader never sees half a document.
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, body)?;
        std::fs::rename(&staging, path)
    }

    pub fn clear() -> io::Result<()> {
        Self::clear_at(&Self::config_path())
    }

    /// Remove the file at `path`; absence is not an error.
    pub fn clear_at(path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments against the default last-used file.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(std::env::args_os().collect(), &LastUsedParams::config_path())
    }

    /// Parse `args`, fill every remembered option the command line left at
    /// its default from `config_path`, resolve `auto` values and write the
    /// merged parameters back.
    ///
    /// With `--clear` the file is deleted and nothing is remembered or
    /// saved for this run.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not delete last-used file");
            }
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        if settings.user.is_none() {
            settings.user = last.user;
        }
        remember(&matches, "exclude", &mut settings.exclude, last.exclude);
        remember(&matches, "project", &mut settings.project, last.project);
        remember(&matches, "access", &mut settings.access, last.access);
        remember(&matches, "agent", &mut settings.agent, last.agent);
        remember(&matches, "orientation", &mut settings.orientation, last.orientation);
        remember(&matches, "timezone", &mut settings.timezone, last.timezone);

        let settings = Self::resolve_auto_values(settings);

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!(error = %e, "could not save last-used parameters");
        }

        settings
    }

    /// Replace `auto` timezone with the detected one and unknown names with
    /// UTC. `--debug` wins over `--log-level`.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        } else if !TimezoneHandler::validate_timezone(&settings.timezone) {
            tracing::warn!(timezone = %settings.timezone, "unknown timezone, using UTC");
            settings.timezone = "UTC".to_string();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The configured username, or a configuration error when none was
    /// given on this run or any previous one.
    pub fn username(&self) -> Result<&str> {
        match self.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Ok(user),
            _ => Err(ViewsError::Config(
                "no username given; pass --user <NAME>".to_string(),
            )),
        }
    }

    /// Titles that must never appear in the report.
    pub fn exclusion_set(&self) -> BTreeSet<String> {
        self.exclude.iter().cloned().collect()
    }

    /// Parsed bar chart orientation.
    pub fn chart_orientation(&self) -> ChartOrientation {
        ChartOrientation::from_name(&self.orientation)
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            user: s.user.clone(),
            exclude: Some(s.exclude.clone()),
            project: Some(s.project.clone()),
            access: Some(s.access.clone()),
            agent: Some(s.agent.clone()),
            orientation: Some(s.orientation.clone()),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Overwrite `slot` with the remembered value unless `arg` was typed on
/// the command line.
fn remember<T>(matches: &clap::ArgMatches, arg: &str, slot: &mut T, saved: Option<T>) {
    let typed = matches.value_source(arg) == Some(clap::parser::ValueSource::CommandLine);
    if let (false, Some(value)) = (typed, saved) {
        *slot = value;
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

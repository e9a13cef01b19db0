//! Report orchestrator.
//!
//! Runs the fetch → aggregate → report pipeline against any [`WikiApi`]:
//! lists the user's contributions, totals views for every non-excluded
//! title one request at a time, ranks the survivors and rewrites the
//! results CSV. Presentation (table, charts) is left to the UI layer.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use views_core::error::Result;
use views_core::models::{ContributionMap, ViewRecord};
use views_core::settings::Settings;
use views_data::client::WikiApi;
use views_data::contributions::fetch_contributions;
use views_data::files::{write_results_csv, RESULTS_FILE};
use views_data::pageviews::total_views;

// ── ReportConfig ──────────────────────────────────────────────────────────────

/// Everything the pipeline needs besides the API itself.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Whose contributions are reported.
    pub user: String,
    /// Titles never queried or reported.
    pub exclusions: BTreeSet<String>,
    /// Slept between contribution pages, before aggregation and after
    /// every pageviews request.
    pub request_delay: Duration,
    /// Directory receiving `pageviews.csv`.
    pub output_dir: PathBuf,
}

impl ReportConfig {
    /// Build a report configuration from resolved settings.
    ///
    /// Fails only when no usable username is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            user: settings.username()?.to_string(),
            exclusions: settings.exclusion_set(),
            request_delay: Duration::from_millis(settings.request_delay_ms),
            output_dir: settings.output_dir.clone(),
        })
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(RESULTS_FILE)
    }
}

// ── ReportOutcome ─────────────────────────────────────────────────────────────

/// Result of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ReportOutcome {
    /// Titles with a positive total, highest first.
    pub records: Vec<ViewRecord>,
    /// Titles whose view lookup failed.
    pub failed: Vec<String>,
    /// Distinct titles returned by the contributions listing.
    pub contributions: usize,
    /// Titles skipped because they are in the exclusion set.
    pub excluded: usize,
    /// Titles that resolved to zero views.
    pub zero_views: usize,
    /// Where the results CSV was written.
    pub results_path: PathBuf,
}

impl ReportOutcome {
    /// Sum of views across all reported records.
    pub fn total_views(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.views))
    }

    pub fn pages_included(&self) -> usize {
        self.records.len()
    }
}

/// Order records by views descending; equal counts fall back to title
/// order so the output is stable between runs.
pub fn sort_records(records: &mut [ViewRecord]) {
    records.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.title.cmp(&b.title)));
}

// ── ReportOrchestrator ────────────────────────────────────────────────────────

/// Sequential report pipeline over a [`WikiApi`].
pub struct ReportOrchestrator<A> {
    api: A,
    config: ReportConfig,
}

impl<A: WikiApi> ReportOrchestrator<A> {
    pub fn new(api: A, config: ReportConfig) -> Self {
        Self { api, config }
    }

    /// Run the whole pipeline with `now` as the reference instant for view
    /// windows.
    ///
    /// Remote failures never abort the run; only a failed CSV write is
    /// returned as an error.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReportOutcome> {
        let contribs =
            fetch_contributions(&self.api, &self.config.user, self.config.request_delay).await;
        info!(titles = contribs.len(), "contributions collected");

        self.pause().await;

        let mut outcome = self.aggregate(&contribs, now).await;
        sort_records(&mut outcome.records);

        let path = self.config.results_path();
        write_results_csv(&path, &outcome.records)?;
        info!(
            path = %path.display(),
            pages = outcome.pages_included(),
            failed = outcome.failed.len(),
            "report written"
        );
        outcome.results_path = path;

        Ok(outcome)
    }

    /// Query views for each contributed title and split the results into
    /// reported, failed and zero-view buckets. Records come back unsorted.
    pub async fn aggregate(&self, contribs: &ContributionMap, now: DateTime<Utc>) -> ReportOutcome {
        let mut outcome = ReportOutcome {
            contributions: contribs.len(),
            ..ReportOutcome::default()
        };

        for (title, first_edit) in contribs {
            if self.config.exclusions.contains(title) {
                debug!(title = %title, "excluded");
                outcome.excluded += 1;
                continue;
            }

            match total_views(&self.api, title, first_edit, now).await {
                Ok(0) => {
                    debug!(title = %title, "no views in window; dropped");
                    outcome.zero_views += 1;
                }
                Ok(views) => outcome.records.push(ViewRecord::new(title.clone(), views)),
                Err(_) => outcome.failed.push(title.clone()),
            }

            self.pause().await;
        }

        outcome
    }

    async fn pause(&self) {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

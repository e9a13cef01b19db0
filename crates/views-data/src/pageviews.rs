//! View aggregator: turns a first-edit timestamp into a month-aligned
//! window and sums the daily views the metrics API returns for it.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use views_core::error::{Result, ViewsError};
use views_core::models::{DailyViews, ViewWindow};
use views_core::time_utils::{first_of_month, next_month};

use crate::client::WikiApi;

/// Format of `usercontribs` timestamps.
pub const EDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a contribution timestamp such as `2024-01-15T00:00:00Z`.
pub fn parse_edit_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, EDIT_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ViewsError::TimestampParse(raw.to_string()))
}

/// Month-aligned window from the first edit up to "now".
///
/// `start` is the first day of the first edit's month. `end` is the first
/// day of the month after `now`, so the current month is always covered
/// and the window spans at least one whole month. A first edit that lies
/// after `now` still gets a one-month window.
pub fn view_window(first_edit: DateTime<Utc>, now: DateTime<Utc>) -> ViewWindow {
    let start = first_of_month(first_edit.date_naive());
    let end = next_month(now.date_naive()).max(next_month(start));
    ViewWindow { start, end }
}

/// Sum of `views` over all buckets.
pub fn sum_views(items: &[DailyViews]) -> u64 {
    items
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(item.views))
}

/// Total views for `title` since the month of `first_edit`.
///
/// Both a bad timestamp and a failed request are returned as errors; the
/// caller decides whether the title is skipped.
pub async fn total_views<A>(
    api: &A,
    title: &str,
    first_edit: &str,
    now: DateTime<Utc>,
) -> Result<u64>
where
    A: WikiApi + ?Sized,
{
    let started = match parse_edit_timestamp(first_edit) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(title, timestamp = first_edit, "unparseable first-edit timestamp");
            return Err(e);
        }
    };

    let window = view_window(started, now);
    debug!(
        title,
        start = %window.start_param(),
        end = %window.end_param(),
        "querying daily views"
    );

    match api.daily_views(title, &window).await {
        Ok(items) => Ok(sum_views(&items)),
        Err(e) => {
            warn!(title, error = %e, "Error fetching views");
            Err(e)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page title → earliest edit timestamp (ISO-8601 UTC, e.g.
/// `"2024-01-15T00:00:00Z"`) for one user.
///
/// Titles are unique by construction; iteration is in title order.
pub type ContributionMap = BTreeMap<String, String>;

/// A single edit event as returned by `list=usercontribs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Title of the edited page.
    pub title: String,
    /// Edit time in `%Y-%m-%dT%H:%M:%SZ` form.
    pub timestamp: String,
}

/// One bucket of the per-article daily views series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyViews {
    /// Bucket timestamp as sent by the service (`YYYYMMDD00`).
    #[serde(default)]
    pub timestamp: String,
    /// Number of views in the bucket.
    pub views: u64,
}

/// Total views for one edited page over its view window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    /// Page title as reported by the contributions listing.
    pub title: String,
    /// Sum of daily views; always strictly positive in a report.
    pub views: u64,
}

impl ViewRecord {
    pub fn new(title: impl Into<String>, views: u64) -> Self {
        Self {
            title: title.into(),
            views,
        }
    }
}

/// Inclusive month-aligned date range used for a pageviews query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    /// First day of the month containing the first edit.
    pub start: NaiveDate,
    /// First day of the month after "now".
    pub end: NaiveDate,
}

impl ViewWindow {
    /// Start boundary in the `YYYYMM01` form the metrics API expects.
    pub fn start_param(&self) -> String {
        self.start.format("%Y%m01").to_string()
    }

    /// End boundary in the `YYYYMM01` form the metrics API expects.
    pub fn end_param(&self) -> String {
        self.end.format("%Y%m01").to_string()
    }
}

/// One line of the cumulative `line_graph_data.csv` history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Calendar date of the run.
    pub date: NaiveDate,
    /// Sum of all view totals reported on that run.
    pub total_views: u64,
}

/// Bar chart layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartOrientation {
    /// Titles along the x axis, bars growing upwards.
    #[default]
    Vertical,
    /// Titles along the y axis, bars growing to the right.
    Horizontal,
}

impl ChartOrientation {
    /// Map a CLI name to an orientation. Unknown names fall back to
    /// [`ChartOrientation::Vertical`].
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "horizontal" => ChartOrientation::Horizontal,
            _ => ChartOrientation::Vertical,
        }
    }
}

impl std::fmt::Display for ChartOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartOrientation::Vertical => write!(f, "vertical"),
            ChartOrientation::Horizontal => write!(f, "horizontal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_window_params() {
        let window = ViewWindow {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        };
        assert_eq!(window.start_param(), "20240101");
        assert_eq!(window.end_param(), "20240701");
    }

    #[test]
    fn test_view_window_params_force_day_one() {
        // Even a mid-month date renders with day 01.
        let window = ViewWindow {
            start: NaiveDate::from_ymd_opt(2023, 11, 17).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };
        assert_eq!(window.start_param(), "20231101");
        assert_eq!(window.end_param(), "20240201");
    }

    #[test]
    fn test_daily_views_deserialize() {
        let item: DailyViews =
            serde_json::from_str(r#"{"project":"en.wikipedia","timestamp":"2024010100","views":42}"#)
                .unwrap();
        assert_eq!(item.views, 42);
        assert_eq!(item.timestamp, "2024010100");
    }

    #[test]
    fn test_contribution_deserialize_ignores_extra_fields() {
        let c: Contribution = serde_json::from_str(
            r#"{"userid":1,"user":"X","ns":0,"title":"Storror","timestamp":"2024-01-15T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(c.title, "Storror");
        assert_eq!(c.timestamp, "2024-01-15T00:00:00Z");
    }

    #[test]
    fn test_orientation_from_name() {
        assert_eq!(
            ChartOrientation::from_name("horizontal"),
            ChartOrientation::Horizontal
        );
        assert_eq!(
            ChartOrientation::from_name("VERTICAL"),
            ChartOrientation::Vertical
        );
        assert_eq!(
            ChartOrientation::from_name("diagonal"),
            ChartOrientation::Vertical
        );
    }

    #[test]
    fn test_orientation_display() {
        assert_eq!(ChartOrientation::Horizontal.to_string(), "horizontal");
        assert_eq!(ChartOrientation::default().to_string(), "vertical");
    }
}

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// IANA name of the host timezone, or `"UTC"` when it cannot be read.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Maps UTC instants onto calendar dates in the user's timezone.
///
/// Remote timestamps are all UTC; only the date stamped on a history row
/// is taken in local time, so that a run at 23:30 in Honolulu is recorded
/// under the day the user saw on the clock.
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Unknown names degrade to UTC with a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                timezone = tz_name,
                "unknown timezone; history dates will use UTC"
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Calendar date of `now` in the configured timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.default_tz).date_naive()
    }

    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }
}

// ── Month arithmetic ──────────────────────────────────────────────────────────

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month, so `with_day(1)` cannot fail.
    date.with_day(1).unwrap_or(date)
}

/// First day of the month following the one containing `date`.
///
/// December rolls over to January of the next year.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_else(|| first_of_month(date))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── get_system_timezone ───────────────────────────────────────────────────

    #[test]
    fn test_get_system_timezone_not_empty() {
        assert!(!get_system_timezone().is_empty());
    }

    // ── TimezoneHandler ───────────────────────────────────────────────────────

    #[test]
    fn test_handler_invalid_timezone_falls_back_to_utc() {
        let handler = TimezoneHandler::new("Not/AZone");
        let now = Utc.with_ymd_and_hms(2025, 11, 5, 23, 30, 0).unwrap();
        assert_eq!(handler.today(now), ymd(2025, 11, 5));
    }

    #[test]
    fn test_handler_today_in_utc() {
        let handler = TimezoneHandler::new("UTC");
        let now = Utc.with_ymd_and_hms(2025, 11, 5, 23, 30, 0).unwrap();
        assert_eq!(handler.today(now), ymd(2025, 11, 5));
    }

    #[test]
    fn test_handler_today_crosses_midnight_east() {
        // 23:30 UTC is already the next day in Tokyo (UTC+9).
        let handler = TimezoneHandler::new("Asia/Tokyo");
        let now = Utc.with_ymd_and_hms(2025, 11, 5, 23, 30, 0).unwrap();
        assert_eq!(handler.today(now), ymd(2025, 11, 6));
    }

    #[test]
    fn test_handler_today_crosses_midnight_west() {
        // 03:00 UTC is still the previous evening in New York.
        let handler = TimezoneHandler::new("America/New_York");
        let now = Utc.with_ymd_and_hms(2025, 11, 6, 3, 0, 0).unwrap();
        assert_eq!(handler.today(now), ymd(2025, 11, 5));
    }

    #[test]
    fn test_validate_timezone() {
        assert!(TimezoneHandler::validate_timezone("Europe/Berlin"));
        assert!(!TimezoneHandler::validate_timezone("Mars/Olympus_Mons"));
    }

    // ── Month arithmetic ──────────────────────────────────────────────────────

    #[test]
    fn test_first_of_month() {
        assert_eq!(first_of_month(ymd(2024, 2, 29)), ymd(2024, 2, 1));
        assert_eq!(first_of_month(ymd(2024, 2, 1)), ymd(2024, 2, 1));
    }

    #[test]
    fn test_next_month_mid_year() {
        assert_eq!(next_month(ymd(2024, 6, 10)), ymd(2024, 7, 1));
    }

    #[test]
    fn test_next_month_from_month_end() {
        // The 31st has no counterpart in February; the result is still the 1st.
        assert_eq!(next_month(ymd(2024, 1, 31)), ymd(2024, 2, 1));
    }

    #[test]
    fn test_next_month_december_rolls_year() {
        assert_eq!(next_month(ymd(2024, 12, 15)), ymd(2025, 1, 1));
    }
}

//! Date-range helpers for report periods.
//!
//! All reports run against a configured IANA timezone (the bot's users
//! live in one place); records carry UTC instants and are converted at
//! the edges.

use anyhow::Result;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "Asia/Kuala_Lumpur".
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

/// Today's date in the given timezone.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Sunday-start week containing `day` (inclusive bounds).
pub fn week_range(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let week = day.week(Weekday::Sun);
    (week.first_day(), week.last_day())
}

/// Calendar month containing `day` (inclusive bounds).
pub fn month_range(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let last = (first + Months::new(1)).pred_opt().unwrap_or(first);
    (first, last)
}

pub fn days_in_month(day: NaiveDate) -> u32 {
    month_range(day).1.day()
}

/// Start of the rolling 30-day window ending at `day` (inclusive).
pub fn last_30_days_start(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(29)).unwrap_or(day)
}

/// 7-day bucket within the month: days 1-7 are week 1, 8-14 week 2, ...
pub fn week_of_month(day: NaiveDate) -> u32 {
    (day.day() + 6) / 7
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kuala_Lumpur;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_today_in_timezone() {
        // 18:00 UTC on the 29th is already the 30th in Kuala Lumpur.
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 18, 0, 0).unwrap();
        assert_eq!(today_in(Kuala_Lumpur, now), d(2026, 8, 30));
    }

    #[test]
    fn test_week_range_starts_sunday() {
        // 2026-08-26 is a Wednesday.
        let (start, end) = week_range(d(2026, 8, 26));
        assert_eq!(start, d(2026, 8, 23));
        assert_eq!(end, d(2026, 8, 29));
        assert_eq!(start.weekday(), Weekday::Sun);

        // A Sunday is its own week start.
        let (start, _) = week_range(d(2026, 8, 23));
        assert_eq!(start, d(2026, 8, 23));
    }

    #[test]
    fn test_month_range_and_days() {
        assert_eq!(month_range(d(2026, 2, 14)), (d(2026, 2, 1), d(2026, 2, 28)));
        assert_eq!(month_range(d(2024, 2, 14)).1, d(2024, 2, 29));
        assert_eq!(days_in_month(d(2026, 8, 30)), 31);
    }

    #[test]
    fn test_last_30_days_window() {
        assert_eq!(last_30_days_start(d(2026, 8, 30)), d(2026, 8, 1));
    }

    #[test]
    fn test_week_of_month_buckets() {
        assert_eq!(week_of_month(d(2026, 8, 1)), 1);
        assert_eq!(week_of_month(d(2026, 8, 7)), 1);
        assert_eq!(week_of_month(d(2026, 8, 8)), 2);
        assert_eq!(week_of_month(d(2026, 8, 31)), 5);
    }

    #[test]
    fn test_parse_tz() {
        assert!(parse_tz("Asia/Kuala_Lumpur").is_ok());
        assert!(parse_tz("Mars/Olympus").is_err());
    }
}

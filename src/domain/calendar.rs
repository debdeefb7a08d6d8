//! Latest closed trading session resolution.
//!
//! A session's bars are treated as final only after the daily cutoff hour
//! (18:00 local by default). Exchange holidays are not modelled.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};

pub const DEFAULT_CUTOFF_HOUR: u32 = 18;

/// Most recent trading day whose data is considered settled at `now`.
///
/// Rules, first match wins:
/// - Saturday → Friday
/// - Sunday → Friday
/// - Monday before the cutoff → previous Friday
/// - any other weekday before the cutoff → yesterday
/// - weekday at or after the cutoff → today
pub fn latest_trade_day(now: NaiveDateTime, cutoff_hour: u32) -> NaiveDate {
    let today = now.date();
    let before_cutoff = now.hour() < cutoff_hour;

    let days_back = match today.weekday() {
        Weekday::Sat => 1,
        Weekday::Sun => 2,
        Weekday::Mon if before_cutoff => 3,
        _ if before_cutoff => 1,
        _ => 0,
    };

    today - Duration::days(days_back)
}

/// Latest trade day for the local wall clock.
pub fn latest_trade_day_now(cutoff_hour: u32) -> NaiveDate {
    latest_trade_day(chrono::Local::now().naive_local(), cutoff_hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Week of 2025-04-14 (Mon) .. 2025-04-20 (Sun).

    #[test]
    fn saturday_resolves_to_friday() {
        assert_eq!(latest_trade_day(at(2025, 4, 19, 9), 18), date(2025, 4, 18));
        assert_eq!(latest_trade_day(at(2025, 4, 19, 22), 18), date(2025, 4, 18));
    }

    #[test]
    fn sunday_resolves_to_friday() {
        assert_eq!(latest_trade_day(at(2025, 4, 20, 9), 18), date(2025, 4, 18));
        assert_eq!(latest_trade_day(at(2025, 4, 20, 20), 18), date(2025, 4, 18));
    }

    #[test]
    fn monday_before_cutoff_resolves_to_previous_friday() {
        assert_eq!(latest_trade_day(at(2025, 4, 21, 10), 18), date(2025, 4, 18));
        assert_eq!(latest_trade_day(at(2025, 4, 21, 17), 18), date(2025, 4, 18));
    }

    #[test]
    fn monday_after_cutoff_is_today() {
        assert_eq!(latest_trade_day(at(2025, 4, 21, 18), 18), date(2025, 4, 21));
    }

    #[test]
    fn weekday_morning_resolves_to_yesterday() {
        assert_eq!(latest_trade_day(at(2025, 4, 15, 9), 18), date(2025, 4, 14));
    }

    #[test]
    fn weekday_evening_is_today() {
        assert_eq!(latest_trade_day(at(2025, 4, 16, 19), 18), date(2025, 4, 16));
    }

    #[test]
    fn friday_morning_resolves_to_thursday() {
        assert_eq!(latest_trade_day(at(2025, 4, 18, 0), 18), date(2025, 4, 17));
    }

    #[test]
    fn custom_cutoff_hour() {
        assert_eq!(latest_trade_day(at(2025, 4, 16, 16), 15), date(2025, 4, 16));
        assert_eq!(latest_trade_day(at(2025, 4, 16, 14), 15), date(2025, 4, 15));
    }

    #[test]
    fn crosses_month_boundary() {
        // 2025-09-01 is a Monday.
        assert_eq!(latest_trade_day(at(2025, 9, 1, 8), 18), date(2025, 8, 29));
    }
}

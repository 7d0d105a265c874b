//! ISO-week boundary math for the weekly aggregate jobs
//!
//! Weeks run Monday 00:00 UTC to the following Monday 00:00 UTC,
//! half-open. Aggregate rows are keyed by the Monday date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The most recent fully elapsed week relative to `now`:
/// `[previous Monday 00:00, this Monday 00:00)`.
pub fn previous_week_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let this_monday = week_start(now.date_naive());
    let prev_monday = this_monday - Duration::days(7);
    (start_of_day(prev_monday), start_of_day(this_monday))
}

/// The week containing `now`: `[Monday 00:00, next Monday 00:00)`.
pub fn current_week_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = week_start(now.date_naive());
    (start_of_day(monday), start_of_day(monday + Duration::days(7)))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

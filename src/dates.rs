//! Calendar windows used to scope orders.
//!
//! Every window is computed from an explicit `now` in the bot's local
//! timezone and returned as inclusive UTC bounds, ending at `.999` of the
//! last second so it lines up with millisecond timestamps.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Inclusive `[start, end]` instant range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

fn start_of_day() -> NaiveTime {
    NaiveTime::MIN
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// Resolve a local wall-clock time on `date` to UTC
///
/// Ambiguous times take the earliest instant; times inside a DST gap fall
/// back to reading the wall clock as UTC.
fn local_to_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

fn range_between<Tz: TimeZone>(tz: &Tz, first: NaiveDate, last: NaiveDate) -> DateRange {
    DateRange {
        start: local_to_utc(tz, first, start_of_day()),
        end: local_to_utc(tz, last, end_of_day()),
    }
}

/// Local midnight through 23:59:59.999 of the day containing `now`
pub fn day_range<Tz: TimeZone>(now: &DateTime<Tz>) -> DateRange {
    let today = now.date_naive();
    range_between(&now.timezone(), today, today)
}

/// Sunday 00:00:00.000 through Saturday 23:59:59.999 of the week containing `now`
pub fn week_range<Tz: TimeZone>(now: &DateTime<Tz>) -> DateRange {
    let today = now.date_naive();
    let sunday = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let saturday = sunday + Duration::days(6);
    range_between(&now.timezone(), sunday, saturday)
}

/// First through last calendar day of the month containing `now`
pub fn month_range<Tz: TimeZone>(now: &DateTime<Tz>) -> DateRange {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let next_month_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_month_first
        .and_then(|d| d.pred_opt())
        .unwrap_or(today);
    range_between(&now.timezone(), first, last)
}

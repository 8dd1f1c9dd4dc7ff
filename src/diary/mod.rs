//! Voice entries, extracted events and the counters they move.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings (see
//! [`timestamp`]) so that SQL range filters can compare them as text. "Days"
//! are always local days under the configured UTC offset.

pub mod calendar;
pub mod entries;
pub mod events;
pub mod stats;
pub mod types;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Fixed-width UTC timestamp, e.g. `2026-03-10T08:15:00.000Z`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp back into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The local calendar day `at` falls on.
pub fn local_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// Years whose timestamps keep the fixed four-digit width.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Whether `day` can be stored and compared as timestamp text.
pub fn is_storable_day(day: NaiveDate) -> bool {
    YEAR_RANGE.contains(&day.year())
}

/// UTC instants bounding local `day`: `[start, end)`. `None` if either end
/// falls outside what chrono can represent.
pub fn day_bounds(
    day: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = day
        .and_time(NaiveTime::MIN)
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?
        .and_utc();
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_as_text() {
        let a = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let b = a + Duration::milliseconds(1);
        assert!(timestamp(a) < timestamp(b));
        assert_eq!(timestamp(a), "2026-03-10T00:00:00.000Z");
        assert_eq!(parse_timestamp(&timestamp(b)), Some(b));
    }

    #[test]
    fn local_day_respects_offset() {
        let late = Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(local_day(late, utc), NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(local_day(late, plus_two), NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
    }

    #[test]
    fn day_bounds_cover_one_local_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let (start, end) = day_bounds(day, plus_two).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 10, 22, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn day_bounds_at_the_edge_of_time_is_none() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(day_bounds(NaiveDate::MAX, utc).is_none());
        assert!(day_bounds(NaiveDate::MIN, plus_two).is_none());
        assert!(day_bounds(NaiveDate::from_ymd_opt(9999, 12, 31).unwrap(), utc).is_some());
    }

    #[test]
    fn storable_days_have_four_digit_years() {
        assert!(is_storable_day(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()));
        assert!(!is_storable_day(NaiveDate::from_ymd_opt(10000, 1, 1).unwrap()));
        assert!(!is_storable_day(NaiveDate::from_ymd_opt(0, 12, 31).unwrap()));
    }
}

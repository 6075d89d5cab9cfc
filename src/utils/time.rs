use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Storage format for timestamps. Fixed width, so lexical order matches
/// chronological order in SQL comparisons.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Also accepts values without fractional seconds
/// and RFC 3339 strings with an offset (converted to local wall-clock time).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local).naive_local())
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999 always exists
    date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
}

/// `date` moved back by `days`, stopping at the earliest representable day.
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Timestamp used when logging against a date other than today: keep the
/// current time of day so ordering within that day stays meaningful.
pub fn timestamp_on(date: NaiveDate) -> NaiveDateTime {
    date.and_time(now().time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_roundtrip_and_sort_lexically() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_milli_opt(23, 5, 0, 10)
            .unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        let (sa, sb) = (format_timestamp(a), format_timestamp(b));
        assert_eq!(sa, "2024-01-09T23:05:00.010");
        assert!(sa < sb);
        assert_eq!(parse_timestamp(&sa), Some(a));
    }

    #[test]
    fn parses_timestamp_without_millis() {
        let ts = parse_timestamp("2024-03-01T07:30:00").unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-01T07:30:00.000");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn days_before_saturates_at_the_calendar_start() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(days_before(d, 1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(days_before(d, u64::from(u32::MAX)), NaiveDate::MIN);
    }

    #[test]
    fn day_bounds_are_inclusive() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_timestamp(start_of_day(d)), "2024-02-29T00:00:00.000");
        assert_eq!(format_timestamp(end_of_day(d)), "2024-02-29T23:59:59.999");
    }
}

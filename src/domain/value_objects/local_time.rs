use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// Parses an IANA timezone name, e.g. `Europe/Amsterdam`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

/// Resolves a subscriber timezone with a configured fallback. UTC is the last
/// resort when even the fallback name is invalid.
pub fn resolve_timezone(name: &str, fallback: &str) -> Tz {
    parse_timezone(name)
        .or_else(|| parse_timezone(fallback))
        .unwrap_or(chrono_tz::UTC)
}

/// Local wall-clock `HH:mm` for the given instant in the given timezone.
pub fn local_hh_mm(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant.with_timezone(&timezone).format("%H:%M").to_string()
}

/// Local calendar date for the given instant in the given timezone.
pub fn local_date(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    instant.with_timezone(&timezone).date_naive()
}

/// Local calendar date one day ahead, used by the evening look-ahead slot.
pub fn local_date_tomorrow(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    local_date(instant, timezone)
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| local_date(instant, timezone))
}

/// Strict 24-hour `HH:mm` check: both fields zero-padded, hours 00-23,
/// minutes 00-59.
pub fn is_valid_hh_mm(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn local_clock_follows_subscriber_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 5, 30, 0).unwrap();
        assert_eq!(local_hh_mm(instant, chrono_tz::Europe::Moscow), "08:30");
        assert_eq!(local_hh_mm(instant, chrono_tz::UTC), "05:30");
    }

    #[test]
    fn local_date_crosses_midnight_per_timezone() {
        // 23:30 UTC is already the next day in Moscow (UTC+3).
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 23, 30, 0).unwrap();
        assert_eq!(
            local_date(instant, chrono_tz::Europe::Moscow),
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );
        assert_eq!(
            local_date(instant, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn tomorrow_is_one_day_ahead_in_local_terms() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap();
        assert_eq!(
            local_date_tomorrow(instant, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );
    }

    #[test]
    fn accepts_strict_hh_mm_only() {
        assert!(is_valid_hh_mm("08:30"));
        assert!(is_valid_hh_mm("00:00"));
        assert!(is_valid_hh_mm("23:59"));

        assert!(!is_valid_hh_mm("8:3"));
        assert!(!is_valid_hh_mm("8:30"));
        assert!(!is_valid_hh_mm("24:00"));
        assert!(!is_valid_hh_mm("12:60"));
        assert!(!is_valid_hh_mm("12-30"));
        assert!(!is_valid_hh_mm(""));
    }

    #[test]
    fn invalid_timezone_falls_back() {
        assert_eq!(
            resolve_timezone("Not/AZone", "Europe/Amsterdam"),
            chrono_tz::Europe::Amsterdam
        );
        assert_eq!(resolve_timezone("garbage", "also garbage"), chrono_tz::UTC);
    }
}

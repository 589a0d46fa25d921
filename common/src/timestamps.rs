//! Timestamp helpers. Timestamps are stored as nanoseconds since the Unix
//! epoch in `*_ns` columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampParseError {
    #[error("'{0}' is not an RFC 3339 timestamp or YYYY-MM-DD date")]
    Malformed(String),
    #[error("'{0}' is outside the representable nanosecond range")]
    OutOfRange(String),
}

pub fn get_timestamp_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Parse a filter timestamp into epoch nanoseconds.
///
/// Accepted forms, all interpreted as UTC when no offset is given:
/// - RFC 3339 (`2024-05-01T10:00:00Z`, `2024-05-01T12:00:00+02:00`)
/// - naive date-time (`2024-05-01T10:00:00`)
/// - date (`2024-05-01`, start of day)
pub fn parse_timestamp_ns(raw: &str) -> Result<i64, TimestampParseError> {
    let utc = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        naive.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| TimestampParseError::Malformed(raw.to_string()))?
            .and_utc()
    } else {
        return Err(TimestampParseError::Malformed(raw.to_string()));
    };

    utc.timestamp_nanos_opt()
        .ok_or_else(|| TimestampParseError::OutOfRange(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAY_FIRST_2024_NS: i64 = 1_714_521_600_000_000_000;

    #[test]
    fn test_parse_date_is_start_of_day() {
        assert_eq!(parse_timestamp_ns("2024-05-01").unwrap(), MAY_FIRST_2024_NS);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp_ns("2024-05-01T02:00:00+02:00").unwrap(),
            MAY_FIRST_2024_NS
        );
        assert_eq!(
            parse_timestamp_ns("2024-05-01T00:00:00Z").unwrap(),
            MAY_FIRST_2024_NS
        );
    }

    #[test]
    fn test_parse_naive_datetime() {
        assert_eq!(
            parse_timestamp_ns("2024-05-01T00:00:01").unwrap(),
            MAY_FIRST_2024_NS + 1_000_000_000
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            parse_timestamp_ns("yesterday"),
            Err(TimestampParseError::Malformed("yesterday".to_string()))
        );
        assert!(matches!(
            parse_timestamp_ns("3000-01-01"),
            Err(TimestampParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_now_is_positive() {
        assert!(get_timestamp_ns() > MAY_FIRST_2024_NS);
    }
}

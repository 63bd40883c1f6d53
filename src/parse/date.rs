use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date {0:?}: expected YYYY-MM-DD, YYYY-MM-DD HH:MM or YYYY-MM-DDTHH:MM:SS")]
pub struct DateParseError(pub String);

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a user-supplied date or date-time. A bare date means midnight.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, DateParseError> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DateParseError(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime("2010-06-15").unwrap();
        assert_eq!(dt.to_string(), "2010-06-15 00:00:00");
    }

    #[test]
    fn test_parse_with_time() {
        assert_eq!(
            parse_datetime("2010-06-15 09:30").unwrap().to_string(),
            "2010-06-15 09:30:00"
        );
        assert_eq!(
            parse_datetime("2010-06-15T09:30:15").unwrap().to_string(),
            "2010-06-15 09:30:15"
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_datetime("2010-02-30").is_err());
        assert!(parse_datetime("yesterday").is_err());
    }
}

use chrono::{DateTime, NaiveDate};

/// Parse a calendar date from either `YYYY-MM-DD` or a full RFC 3339 timestamp.
///
/// Returns `None` for blank or unparseable input.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

pub fn parse_optional_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_calendar_date)
}

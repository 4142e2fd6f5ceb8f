//! Wall-clock timestamps as the API sends them.
//!
//! The backend mixes `2025-06-16T09:00:00`, `2025-06-16 09:00:00` and full
//! RFC 3339 strings. Offsets are dropped and the wall time is kept, which is
//! what the schedule grid displays.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn parse(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub fn format(dt: &NaiveDateTime) -> String {
    dt.format(FORMAT).to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(dt))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        let expected = NaiveDateTime::parse_from_str("2025-06-16 09:00", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(parse("2025-06-16T09:00:00"), Some(expected));
        assert_eq!(parse("2025-06-16 09:00:00"), Some(expected));
        assert_eq!(parse("2025-06-16T09:00:00.000Z"), Some(expected));
        assert_eq!(parse("2025-06-16T09:00:00-03:00"), Some(expected));
        assert_eq!(parse("2025-06-16T09:00"), Some(expected));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("16/06/2025 09:00").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_format() {
        let dt = parse("2025-06-16 09:30").unwrap();
        assert_eq!(format(&dt), "2025-06-16T09:30:00");
    }
}

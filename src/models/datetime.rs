//! Timestamps as the task service emits them (`2025-12-25 13:25:24.224975`),
//! with RFC 3339 accepted as well.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

const BACKEND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn parse(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, BACKEND_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, ISO_FORMAT))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// `M/D/YYYY`, or `N/A` when there is no timestamp.
pub fn format_date(value: Option<NaiveDateTime>) -> String {
    match value {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn format_date_time(value: Option<NaiveDateTime>) -> String {
    match value {
        Some(dt) => dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.format(BACKEND_FORMAT).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub mod option {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn parses_backend_format() {
        let dt = parse("2025-12-25 13:25:24.224975").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.nanosecond(), 224_975_000);
    }

    #[test]
    fn parses_without_fraction_and_iso_forms() {
        assert!(parse("2025-12-25 13:25:24").is_some());
        assert!(parse("2025-12-25T13:25:24.5").is_some());
        assert!(parse("2025-12-25T13:25:24Z").is_some());
        assert!(parse("yesterday").is_none());
    }

    #[test]
    fn formats_like_the_dashboard() {
        let dt = parse("2025-01-05 09:03:07").unwrap();
        assert_eq!(format_date(Some(dt)), "1/5/2025");
        assert_eq!(format_date_time(Some(dt)), "1/5/2025, 9:03:07 AM");
        assert_eq!(format_date(None), "N/A");
    }
}

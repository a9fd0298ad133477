// Lenient deserializers for fields the backend is inconsistent about
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Identifier sent either as a string or a number
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

pub fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

/// RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC), or a bare date.
/// Anything unparseable becomes `None` rather than failing the whole record.
pub fn datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => return Ok(None),
    };
    Ok(parse_datetime(&raw))
}

pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "id")]
        id: String,
        #[serde(default, deserialize_with = "opt_id")]
        parent: Option<String>,
        #[serde(default, deserialize_with = "datetime")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn accepts_numeric_and_string_ids() {
        let row: Row = serde_json::from_str(r#"{"id": 7, "parent": "p-1"}"#).unwrap();
        assert_eq!(row.id, "7");
        assert_eq!(row.parent.as_deref(), Some("p-1"));

        let row: Row = serde_json::from_str(r#"{"id": "abc", "parent": null}"#).unwrap();
        assert_eq!(row.id, "abc");
        assert!(row.parent.is_none());
        assert!(row.at.is_none());
    }

    #[test]
    fn parses_common_timestamp_forms() {
        let dt = parse_datetime("2024-03-01T10:20:30Z").unwrap();
        assert_eq!((dt.year(), dt.hour()), (2024, 10));
        let dt = parse_datetime("2024-03-01T10:20:30.123456").unwrap();
        assert_eq!(dt.minute(), 20);
        let dt = parse_datetime("2024-03-01").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour()), (3, 1, 0));
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn garbage_timestamp_does_not_fail_record() {
        let row: Row = serde_json::from_str(r#"{"id": 1, "at": "soon"}"#).unwrap();
        assert!(row.at.is_none());
    }
}

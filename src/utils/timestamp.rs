//! Timestamp and duration conversions between the host framework's loose
//! representations and what Azure Monitor expects.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::{PluginError, Result};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses a caller supplied timestamp.
///
/// Accepts RFC 3339 strings, offset-less ISO-8601 strings (read as UTC),
/// integer epoch seconds given as a number or numeric string, and
/// `{seconds, nanos}` maps.
pub fn parse_timestamp(key: &str, value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_str(key, raw.trim()),
        Value::Number(number) => {
            let seconds = number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
                .ok_or_else(|| PluginError::invalid(key, "timestamp out of range"))?;
            from_epoch(key, seconds, 0)
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
                .ok_or_else(|| PluginError::invalid(key, "timestamp map requires seconds"))?;
            let nanos = map.get("nanos").and_then(Value::as_u64).unwrap_or(0);
            let nanos = u32::try_from(nanos)
                .map_err(|_| PluginError::invalid(key, "nanos out of range"))?;
            from_epoch(key, seconds, nanos)
        }
        _ => Err(PluginError::invalid(key, "expected an ISO-8601 string or epoch seconds")),
    }
}

fn parse_str(key: &str, raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(seconds) = raw.parse::<i64>() {
        return from_epoch(key, seconds, 0);
    }

    Err(PluginError::invalid(key, format!("unrecognised timestamp {:?}", raw)))
}

fn from_epoch(key: &str, seconds: i64, nanos: u32) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, nanos)
        .single()
        .ok_or_else(|| PluginError::invalid(key, "timestamp out of range"))
}

/// Formats a timestamp the way Azure's `timespan` parameter expects it.
pub fn to_iso8601(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Converts a bucket width in seconds to an ISO-8601 duration using the
/// largest unit that divides it evenly.
pub fn period_to_iso8601(seconds: u32) -> String {
    match seconds {
        s if s % 86_400 == 0 => format!("P{}D", s / 86_400),
        s if s % 3_600 == 0 => format!("PT{}H", s / 3_600),
        s if s % 60 == 0 => format!("PT{}M", s / 60),
        s => format!("PT{}S", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_accepted_forms() {
        let expected = utc("2024-03-01T12:30:00Z");

        assert_eq!(parse_timestamp("start", &json!("2024-03-01T12:30:00Z")).unwrap(), expected);
        assert_eq!(parse_timestamp("start", &json!("2024-03-01T21:30:00+09:00")).unwrap(), expected);
        assert_eq!(parse_timestamp("start", &json!("2024-03-01T12:30:00")).unwrap(), expected);
        assert_eq!(parse_timestamp("start", &json!("2024-03-01 12:30:00")).unwrap(), expected);
        assert_eq!(parse_timestamp("start", &json!(1709296200)).unwrap(), expected);
        assert_eq!(parse_timestamp("start", &json!("1709296200")).unwrap(), expected);
        assert_eq!(
            parse_timestamp("start", &json!({ "seconds": 1709296200, "nanos": 0 })).unwrap(),
            expected
        );
    }

    #[test]
    fn test_rejected_forms_name_the_key() {
        let err = parse_timestamp("end", &json!("yesterday")).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("end"));

        assert!(parse_timestamp("end", &json!(true)).is_err());
        assert!(parse_timestamp("end", &json!({ "nanos": 5 })).is_err());
    }

    #[test]
    fn test_iso8601_output() {
        assert_eq!(to_iso8601(&utc("2024-03-01T12:30:45.123Z")), "2024-03-01T12:30:45Z");
    }

    #[test]
    fn test_period_durations() {
        assert_eq!(period_to_iso8601(60), "PT1M");
        assert_eq!(period_to_iso8601(300), "PT5M");
        assert_eq!(period_to_iso8601(3600), "PT1H");
        assert_eq!(period_to_iso8601(43_200), "PT12H");
        assert_eq!(period_to_iso8601(86_400), "P1D");
        assert_eq!(period_to_iso8601(90), "PT90S");
    }
}

//! Time utilities: message timestamps rendered in the user's timezone.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Convert a millisecond epoch timestamp to UTC. `None` when out of range.
pub fn millis_to_utc(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(timestamp).single()
}

/// Format a message timestamp as `YYYY-MM-DD HH:MM:SS` in `tz`.
pub fn format_local_millis(timestamp: i64, tz: Tz) -> String {
    match millis_to_utc(timestamp) {
        Some(dt) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("<invalid timestamp {timestamp}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kolkata() {
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        // 2026-02-20 18:29:00 UTC is 23:59 IST (UTC+5:30)
        let ts = Utc
            .with_ymd_and_hms(2026, 2, 20, 18, 29, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_local_millis(ts, tz), "2026-02-20 23:59:00");
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(millis_to_utc(i64::MIN).is_none());
        assert!(format_local_millis(i64::MIN, chrono_tz::UTC).starts_with("<invalid"));
    }
}

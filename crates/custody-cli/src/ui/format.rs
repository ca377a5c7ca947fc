//! String formatting helpers.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// First 8 characters of a UUID.
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Format a datetime for display.
pub fn format_datetime(dt: &DateTime<Utc>, pretty: bool) -> String {
    if pretty {
        dt.format("%Y-%m-%d %H:%M UTC").to_string()
    } else {
        dt.to_rfc3339()
    }
}

/// Format a coordinate pair.
pub fn format_location(latitude: f64, longitude: f64) -> String {
    format!("{:.5},{:.5}", latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_short_id() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        assert_eq!(short_id(&id), "1b4e28ba");
    }

    #[test]
    fn test_format_datetime() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        assert_eq!(format_datetime(&dt, true), "2024-06-01 09:30 UTC");
        assert_eq!(format_datetime(&dt, false), "2024-06-01T09:30:00+00:00");
    }

    #[test]
    fn test_format_location() {
        assert_eq!(format_location(-33.9, 151.2), "-33.90000,151.20000");
    }
}

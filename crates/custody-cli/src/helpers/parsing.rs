//! Parsing helpers for IDs, datetimes, and hex bytes.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::CliError;

/// Parse a full UUID, naming what it identifies in the error.
pub fn parse_id(value: &str, what: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        CliError::invalid_input(format!("Invalid {} ID: {} (expected a UUID)", what, value))
            .into()
    })
}

/// Parse a datetime string (ISO-8601 or YYYY-MM-DD).
pub fn parse_datetime(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| CliError::invalid_input(format!("Invalid date value: {}", value)))?;
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    Err(CliError::invalid_input(format!(
        "Invalid date/time (expected ISO-8601 or YYYY-MM-DD): {}",
        value
    ))
    .into())
}

/// Parse hex text into bytes. Whitespace is ignored.
pub fn parse_hex(value: &str) -> anyhow::Result<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact)
        .map_err(|e| CliError::invalid_input(format!("Invalid hex value: {}", e)).into())
}

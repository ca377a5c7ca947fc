//! Row types for database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crypto::SealedBlob;
use crate::custody::SampleStatus;
use crate::error::{CustodyError, Result};
use crate::storage::types::{CustodyTransfer, Location, Sample};

pub(super) const SAMPLE_COLUMNS: &str =
    "id, name, status, notes, created_at, updated_at, deleted_at";

pub(super) const TRANSFER_COLUMNS: &str =
    "id, sample_id, transferred_by, received_by, timestamp, latitude, longitude, signature";

/// Raw row data from the samples table, before parsing into domain types.
#[derive(Debug)]
pub struct SampleRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl SampleRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            notes: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            deleted_at: row.get(6)?,
        })
    }
}

impl TryFrom<SampleRow> for Sample {
    type Error = CustodyError;

    fn try_from(row: SampleRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "sample")?;
        let status: SampleStatus = row
            .status
            .parse()
            .map_err(|_| CustodyError::Persistence(format!("Invalid status: {}", row.status)))?;
        let created_at = parse_timestamp(&row.created_at)?;
        let updated_at = parse_timestamp(&row.updated_at)?;
        let deleted_at = row
            .deleted_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(Sample {
            id,
            name: row.name,
            status,
            notes: row.notes,
            created_at,
            updated_at,
            deleted_at,
        })
    }
}

/// Raw row data from the custody_transfers table.
#[derive(Debug)]
pub struct TransferRow {
    pub id: String,
    pub sample_id: String,
    pub transferred_by: String,
    pub received_by: String,
    pub timestamp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub signature: String,
}

impl TransferRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sample_id: row.get(1)?,
            transferred_by: row.get(2)?,
            received_by: row.get(3)?,
            timestamp: row.get(4)?,
            latitude: row.get(5)?,
            longitude: row.get(6)?,
            signature: row.get(7)?,
        })
    }
}

impl TryFrom<TransferRow> for CustodyTransfer {
    type Error = CustodyError;

    fn try_from(row: TransferRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "transfer")?;
        let sample_id = parse_uuid(&row.sample_id, "sample")?;
        let timestamp = parse_timestamp(&row.timestamp)?;
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            (None, None) => None,
            _ => {
                return Err(CustodyError::Persistence(format!(
                    "Transfer {} has a partial location",
                    id
                )))
            }
        };
        // A bad signature column is data corruption, not a store failure.
        let sealed_signature = SealedBlob::from_base64(&row.signature)?;

        Ok(CustodyTransfer {
            id,
            sample_id,
            transferred_by: row.transferred_by,
            received_by: row.received_by,
            timestamp,
            location,
            sealed_signature,
        })
    }
}

/// Fixed-width RFC 3339 in UTC so that text ordering matches time ordering.
pub(super) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| CustodyError::Persistence(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc))
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| CustodyError::Persistence(format!("Invalid {} UUID: {}", what, e)))
}

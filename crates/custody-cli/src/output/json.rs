//! JSON output formatting.

use custody_core::storage::{CustodyTransfer, Sample};

/// Convert a sample to JSON for output.
pub fn sample_json(sample: &Sample) -> serde_json::Value {
    serde_json::json!({
        "id": sample.id,
        "name": sample.name,
        "status": sample.status,
        "notes": sample.notes,
        "created_at": sample.created_at,
        "updated_at": sample.updated_at,
        "deleted_at": sample.deleted_at,
    })
}

pub fn samples_json(samples: &[Sample]) -> Vec<serde_json::Value> {
    samples.iter().map(sample_json).collect()
}

/// Convert a transfer to JSON. The signature stays sealed.
pub fn transfer_json(transfer: &CustodyTransfer) -> serde_json::Value {
    serde_json::json!({
        "id": transfer.id,
        "sample_id": transfer.sample_id,
        "transferred_by": transfer.transferred_by,
        "received_by": transfer.received_by,
        "timestamp": transfer.timestamp,
        "location": transfer.location,
        "sealed_signature": transfer.sealed_signature.to_base64(),
    })
}

pub fn transfers_json(transfers: &[CustodyTransfer]) -> Vec<serde_json::Value> {
    transfers.iter().map(transfer_json).collect()
}

/// Print a JSON value on one line.
pub fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

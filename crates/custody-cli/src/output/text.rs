//! Text and table output formatting.

use custody_core::storage::{CustodyTransfer, Sample};

use crate::ui::{format_datetime, format_location, kv, print, receipt, short_id, status, table, UiContext};

/// Print a single sample.
pub fn print_sample(ctx: &UiContext, sample: &Sample) {
    let pretty = ctx.mode.is_pretty();
    print(ctx, &kv(ctx, "ID", &sample.id.to_string()));
    print(ctx, &kv(ctx, "Name", &sample.name));
    print(ctx, &kv(ctx, "Status", &status(ctx, sample.status)));
    if let Some(notes) = sample.notes.as_deref() {
        print(ctx, &kv(ctx, "Notes", notes));
    }
    print(
        ctx,
        &kv(ctx, "Created", &format_datetime(&sample.created_at, pretty)),
    );
    print(
        ctx,
        &kv(ctx, "Updated", &format_datetime(&sample.updated_at, pretty)),
    );
    if let Some(deleted_at) = sample.deleted_at.as_ref() {
        print(ctx, &kv(ctx, "Deleted", &format_datetime(deleted_at, pretty)));
    }
}

/// Print samples as a table.
pub fn print_sample_list(ctx: &UiContext, samples: &[Sample]) {
    let pretty = ctx.mode.is_pretty();
    let rows: Vec<Vec<String>> = samples
        .iter()
        .map(|sample| {
            let id = if pretty {
                short_id(&sample.id)
            } else {
                sample.id.to_string()
            };
            vec![
                id,
                status(ctx, sample.status),
                format_datetime(&sample.created_at, pretty),
                sample.name.clone(),
            ]
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    print(ctx, &table(ctx, &["ID", "Status", "Created", "Name"], &rows));
}

/// Print the transfer history of a sample, oldest first.
pub fn print_history(ctx: &UiContext, transfers: &[CustodyTransfer]) {
    let pretty = ctx.mode.is_pretty();
    let rows: Vec<Vec<String>> = transfers
        .iter()
        .map(|transfer| {
            let location = transfer
                .location
                .map(|l| format_location(l.latitude, l.longitude))
                .unwrap_or_else(|| "-".to_string());
            vec![
                transfer.id.to_string(),
                format_datetime(&transfer.timestamp, pretty),
                transfer.transferred_by.clone(),
                transfer.received_by.clone(),
                location,
            ]
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    print(
        ctx,
        &table(ctx, &["Transfer", "When", "From", "To", "Location"], &rows),
    );
}

/// Print the receipt for a newly recorded transfer.
pub fn print_transfer_receipt(ctx: &UiContext, transfer: &CustodyTransfer) {
    let mut items = vec![
        ("Transfer ID", transfer.id.to_string()),
        ("Sample ID", transfer.sample_id.to_string()),
        ("From", transfer.transferred_by.clone()),
        ("To", transfer.received_by.clone()),
        (
            "Timestamp",
            format_datetime(&transfer.timestamp, ctx.mode.is_pretty()),
        ),
    ];
    if let Some(location) = transfer.location {
        items.push((
            "Location",
            format_location(location.latitude, location.longitude),
        ));
    }
    print(ctx, &receipt(ctx, "Transfer recorded", &items));
}

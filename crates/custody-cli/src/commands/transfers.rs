//! `transfer`, `history`, and `signature`.

use custody_core::custody::TransferRequest;
use custody_core::storage::Location;

use crate::app::AppContext;
use crate::cli::{HistoryArgs, SignatureArgs, TransferArgs};
use crate::commands::codec::write_plaintext;
use crate::helpers::{parse_datetime, parse_id, read_signature};
use crate::output::{print_history, print_json, print_transfer_receipt, transfer_json, transfers_json};
use crate::ui::{hint, print};

pub fn handle_transfer(ctx: &AppContext, args: &TransferArgs) -> anyhow::Result<()> {
    let sample_id = parse_id(&args.sample_id, "sample")?;
    let from = args.from.clone().unwrap_or_else(|| ctx.cli().user.clone());

    let mut request = TransferRequest::new(sample_id, from);
    if let Some(to) = args.to.as_deref() {
        request = request.received_by(to);
    }
    if let Some(signature) = read_signature(args)? {
        request = request.signature(signature);
    }
    if let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) {
        request = request.location(Location::new(latitude, longitude)?);
    }
    if let Some(at) = args.at.as_deref() {
        request = request.at(parse_datetime(at)?);
    }

    let transfer = ctx.service()?.create_transfer(request)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&transfer_json(&transfer));
    }
    if ctx.quiet() {
        println!("{}", transfer.id);
        return Ok(());
    }
    print_transfer_receipt(ui, &transfer);
    Ok(())
}

pub fn handle_history(ctx: &AppContext, args: &HistoryArgs) -> anyhow::Result<()> {
    let sample_id = parse_id(&args.sample_id, "sample")?;
    let transfers = ctx.service()?.transfer_history(&sample_id)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::Value::Array(transfers_json(&transfers)));
    }
    if transfers.is_empty() {
        if !ctx.quiet() {
            print(ui, "No transfers recorded.");
            print(
                ui,
                &hint(ui, "custody transfer <sample-id> --to <user> --signature <text>"),
            );
        }
        return Ok(());
    }
    print_history(ui, &transfers);
    Ok(())
}

pub fn handle_signature(ctx: &AppContext, args: &SignatureArgs) -> anyhow::Result<()> {
    let transfer_id = parse_id(&args.transfer_id, "transfer")?;
    let signature = ctx
        .service()?
        .open_signature(&ctx.actor(), &transfer_id)?;
    write_plaintext(ctx, &signature, args.hex)
}

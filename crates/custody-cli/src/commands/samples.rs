//! `sample` subcommands and `result`.

use custody_core::custody::SampleStatus;
use custody_core::storage::{Sample, SampleFilter};
use custody_core::CustodyStore;

use crate::app::AppContext;
use crate::cli::{ResultArgs, SampleSubcommand};
use crate::errors::CliError;
use crate::helpers::parse_id;
use crate::output::{print_json, print_sample, print_sample_list, sample_json, samples_json};
use crate::ui::{hint, print, receipt, status};

pub fn handle_sample(ctx: &AppContext, command: &SampleSubcommand) -> anyhow::Result<()> {
    match command {
        SampleSubcommand::Create { name } => {
            let sample = ctx.service()?.create_sample(name)?;
            show_receipt(ctx, "Sample registered", &sample)
        }
        SampleSubcommand::Show { id } => {
            let id = parse_id(id, "sample")?;
            let sample = ctx.service()?.sample(&id)?;
            if ctx.ui().mode.is_json() {
                return print_json(&sample_json(&sample));
            }
            print_sample(ctx.ui(), &sample);
            Ok(())
        }
        SampleSubcommand::List { status, all, limit } => {
            handle_list(ctx, status.as_deref(), *all, *limit)
        }
        SampleSubcommand::Submit { id } => {
            let id = parse_id(id, "sample")?;
            let sample = ctx.service()?.mark_submitted(&id)?;
            show_receipt(ctx, "Sample submitted", &sample)
        }
        SampleSubcommand::Delete { id } => {
            let id = parse_id(id, "sample")?;
            ctx.service()?.delete_sample(&id)?;
            let ui = ctx.ui();
            if ui.mode.is_json() {
                return print_json(&serde_json::json!({ "id": id, "deleted": true }));
            }
            if !ctx.quiet() {
                print(
                    ui,
                    &receipt(ui, "Sample deleted", &[("ID", id.to_string())]),
                );
            }
            Ok(())
        }
    }
}

fn handle_list(
    ctx: &AppContext,
    status_filter: Option<&str>,
    all: bool,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let mut filter = SampleFilter::new();
    if let Some(value) = status_filter {
        let parsed: SampleStatus = value.parse().map_err(|_| {
            CliError::invalid_input(format!(
                "Unknown status: {} (expected one of: {})",
                value,
                SampleStatus::ALL.map(|s| s.as_str()).join(", ")
            ))
        })?;
        filter = filter.status(parsed);
    }
    if all {
        filter = filter.include_deleted();
    }
    if let Some(limit) = limit {
        filter = filter.limit(limit);
    }

    let samples = ctx.open_store()?.list_samples(&filter)?;

    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&serde_json::Value::Array(samples_json(&samples)));
    }
    if samples.is_empty() {
        if !ctx.quiet() {
            print(ui, "No samples found.");
            print(ui, &hint(ui, "custody sample create <name>"));
        }
        return Ok(());
    }
    print_sample_list(ui, &samples);
    Ok(())
}

pub fn handle_result(ctx: &AppContext, args: &ResultArgs) -> anyhow::Result<()> {
    let id = parse_id(&args.sample_id, "sample")?;
    let sample = ctx.service()?.set_final_status(
        &ctx.actor(),
        &id,
        &args.status,
        args.notes.as_deref(),
    )?;
    show_receipt(ctx, "Result recorded", &sample)
}

fn show_receipt(ctx: &AppContext, title: &str, sample: &Sample) -> anyhow::Result<()> {
    let ui = ctx.ui();
    if ui.mode.is_json() {
        return print_json(&sample_json(sample));
    }
    if ctx.quiet() {
        println!("{}", sample.id);
        return Ok(());
    }
    let mut items = vec![
        ("ID", sample.id.to_string()),
        ("Name", sample.name.clone()),
        ("Status", status(ui, sample.status)),
    ];
    if let Some(notes) = sample.notes.as_deref() {
        items.push(("Notes", notes.to_string()));
    }
    print(ui, &receipt(ui, title, &items));
    Ok(())
}

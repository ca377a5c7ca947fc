//! Custody CLI - chain-of-custody tracking with sealed signatures
//!
//! Thin command-line driver over `custody-core`: the envelope codec and
//! every custody state-machine operation against a local SQLite file.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{codec, init, maintenance, samples, transfers};
use crate::errors::{error_hint, exit_code};
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let hint = error_hint(&e);
        print_error(ctx.ui(), &e.to_string(), hint.as_deref());
        std::process::exit(exit_code(&e));
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    // The master secret is fatal-if-missing for everything that touches
    // samples or sealed values.
    if !matches!(cli.command, Commands::Init(_) | Commands::Check) {
        ctx.secret()?;
    }

    match &cli.command {
        Commands::Init(args) => init::handle_init(ctx, args),
        Commands::Seal(args) => codec::handle_seal(ctx, args),
        Commands::Open(args) => codec::handle_open(ctx, args),
        Commands::Sample(command) => samples::handle_sample(ctx, command),
        Commands::Transfer(args) => transfers::handle_transfer(ctx, args),
        Commands::History(args) => transfers::handle_history(ctx, args),
        Commands::Result(args) => samples::handle_result(ctx, args),
        Commands::Signature(args) => transfers::handle_signature(ctx, args),
        Commands::Check => maintenance::handle_check(ctx),
    }
}

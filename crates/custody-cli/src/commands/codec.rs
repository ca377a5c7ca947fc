//! `seal` and `open`: the envelope codec on its own.

use std::io::Write;

use custody_core::crypto::{open_text, seal_to_text};

use crate::app::AppContext;
use crate::cli::{OpenArgs, SealArgs};
use crate::helpers::{read_stdin_bytes, read_stdin_text};

pub fn handle_seal(ctx: &AppContext, args: &SealArgs) -> anyhow::Result<()> {
    let secret = ctx.secret()?;
    let plaintext = match args.text.as_deref() {
        Some(text) => text.as_bytes().to_vec(),
        None => read_stdin_bytes()?,
    };

    let sealed = seal_to_text(&plaintext, &secret)?;

    if ctx.ui().mode.is_json() {
        crate::output::print_json(&serde_json::json!({ "sealed": sealed }))?;
    } else {
        println!("{}", sealed);
    }
    Ok(())
}

pub fn handle_open(ctx: &AppContext, args: &OpenArgs) -> anyhow::Result<()> {
    let secret = ctx.secret()?;
    let text = match args.blob.as_deref() {
        Some(blob) => blob.to_string(),
        None => read_stdin_text()?,
    };

    let plaintext = open_text(&text, &secret)?;
    write_plaintext(ctx, &plaintext, args.hex)
}

/// Write decrypted bytes as JSON, hex, or raw.
pub fn write_plaintext(ctx: &AppContext, plaintext: &[u8], as_hex: bool) -> anyhow::Result<()> {
    if ctx.ui().mode.is_json() {
        crate::output::print_json(&serde_json::json!({ "hex": hex::encode(plaintext) }))?;
    } else if as_hex {
        println!("{}", hex::encode(plaintext));
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(plaintext)?;
        stdout.flush()?;
    }
    Ok(())
}

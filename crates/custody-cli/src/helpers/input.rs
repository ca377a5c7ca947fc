//! Reading input values from flags, files, or stdin.

use std::io::Read;

use crate::cli::TransferArgs;
use crate::errors::CliError;

use super::parsing::parse_hex;

/// Read all of stdin as bytes.
pub fn read_stdin_bytes() -> anyhow::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(buffer)
}

/// Read all of stdin as UTF-8 text, trimmed.
pub fn read_stdin_text() -> anyhow::Result<String> {
    let bytes = read_stdin_bytes()?;
    let text = String::from_utf8(bytes)
        .map_err(|_| CliError::invalid_input("stdin is not valid UTF-8"))?;
    Ok(text.trim().to_string())
}

/// Signature bytes from whichever `--signature*` flag was given.
///
/// Returns `None` when no flag was given; the core reports the missing
/// signature.
pub fn read_signature(args: &TransferArgs) -> anyhow::Result<Option<Vec<u8>>> {
    if let Some(text) = args.signature.as_deref() {
        return Ok(Some(text.as_bytes().to_vec()));
    }
    if let Some(hex_text) = args.signature_hex.as_deref() {
        return parse_hex(hex_text).map(Some);
    }
    if let Some(path) = args.signature_file.as_deref() {
        let bytes = std::fs::read(path).map_err(|e| {
            CliError::invalid_input(format!("Failed to read signature file {}: {}", path, e))
        })?;
        return Ok(Some(bytes));
    }
    Ok(None)
}

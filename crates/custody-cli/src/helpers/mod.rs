//! Input and parsing helper functions for the CLI.
//!
//! - Reading values from flags, files, or stdin (`input`)
//! - ID, datetime, and hex parsing (`parsing`)

mod input;
mod parsing;

pub use input::{read_signature, read_stdin_bytes, read_stdin_text};
pub use parsing::{parse_datetime, parse_hex, parse_id};

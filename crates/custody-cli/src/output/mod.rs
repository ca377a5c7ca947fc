//! Output formatting for samples and transfers.
//!
//! JSON output is stable for scripts; text output follows the UI mode.

mod json;
mod text;

pub use json::{print_json, sample_json, samples_json, transfer_json, transfers_json};
pub use text::{print_history, print_sample, print_sample_list, print_transfer_receipt};

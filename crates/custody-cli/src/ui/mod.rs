//! UI primitives for the custody CLI.
//!
//! - **Context**: Environment detection (TTY, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badges and status colors
//! - **Render**: Tables, receipts, hints, errors
//! - **Format**: IDs, timestamps, coordinates

mod context;
pub mod format;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::OutputMode;
pub use theme::Badge;

pub use render::{badge, hint, kv, print, print_error, receipt, status, table};

pub use format::{format_datetime, format_location, short_id};

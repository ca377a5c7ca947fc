//! Application-level utilities for the custody CLI.
//!
//! - Application context for unified CLI + config handling
//! - Path resolution for config and database files

mod context;
mod resolver;

pub use context::AppContext;
pub use resolver::resolve_config_path;

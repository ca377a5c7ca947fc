//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes. Core errors that reach `main`
//! through `anyhow` are classified the same way.

use std::fmt;

use custody_core::CustodyError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, database)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, .. } => write!(f, "{}", message),
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }

    fn hint(&self) -> Option<&str> {
        match self {
            CliError::NotFound { hint, .. } => Some(hint),
            CliError::InvalidInput(_) => None,
        }
    }
}

/// Exit code for a core error.
pub fn core_exit_code(err: &CustodyError) -> i32 {
    match err {
        e if e.is_not_found() => exit_codes::NOT_FOUND,
        e if e.is_validation() => exit_codes::INVALID_INPUT,
        CustodyError::MalformedBlob(_) => exit_codes::INVALID_INPUT,
        CustodyError::Authentication | CustodyError::PermissionDenied(_) => {
            exit_codes::AUTH_FAILED
        }
        _ => exit_codes::GENERAL,
    }
}

/// Exit code for any error that reached `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if let Some(core) = err.downcast_ref::<CustodyError>() {
        return core_exit_code(core);
    }
    exit_codes::GENERAL
}

/// Contextual hint for an error, if one applies.
pub fn error_hint(err: &anyhow::Error) -> Option<String> {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.hint().map(String::from);
    }

    let core = err.downcast_ref::<CustodyError>()?;
    let hint = match core {
        CustodyError::SampleNotFound(_) => "Run `custody sample list` to find sample IDs.",
        CustodyError::TransferNotFound(_) => {
            "Run `custody history <sample-id>` to find transfer IDs."
        }
        CustodyError::PermissionDenied(_) => "Re-run with `--role admin` as a reviewer.",
        CustodyError::Authentication => {
            "Check that ENCRYPTION_KEY matches the key used when the value was sealed."
        }
        CustodyError::Config(_) => "Set ENCRYPTION_KEY to a non-empty secret.",
        CustodyError::InvalidTransition { .. } => {
            "Run `custody sample show <id>` to see the current status."
        }
        _ => return None,
    };
    Some(hint.to_string())
}

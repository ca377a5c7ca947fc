//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error
/// - 2: Invalid input (also what clap uses for usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Generic failure (store errors, integrity failures, missing secret).
    pub const GENERAL: i32 = 1;

    /// Invalid user input, including disallowed status transitions.
    pub const INVALID_INPUT: i32 = 2;

    /// Resource not found (config, database, sample, transfer).
    pub const NOT_FOUND: i32 = 3;

    /// Sealed value failed authentication, or the caller lacks the role.
    pub const AUTH_FAILED: i32 = 4;
}

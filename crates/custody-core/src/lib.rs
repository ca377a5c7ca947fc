//! # Custody Core
//!
//! Core library for chain-of-custody tracking of physical samples, with
//! envelope encryption for sensitive fields at rest.
//!
//! This crate provides the codec, the custody state machine, and storage
//! abstractions independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: seal and open individual field values (AES-256-GCM, PBKDF2)
//! - **custody**: sample statuses, actors, and the custody service
//! - **storage**: store trait and the SQLite implementation
//! - **error**: the crate-wide error type

pub mod crypto;
pub mod custody;
pub mod error;
pub mod storage;

pub use error::{CustodyError, Result};
pub use storage::CustodyStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

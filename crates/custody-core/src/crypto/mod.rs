//! Envelope encryption for sensitive fields at rest.
//!
//! - **PBKDF2-HMAC-SHA256** derives a per-record key from the master secret
//!   and a per-record random salt
//! - **AES-256-GCM** (16-byte nonce) encrypts and authenticates the value
//! - Derived keys are zeroized on drop; the master secret lives in a
//!   `secrecy` box and never appears in `Debug` output
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the database (sealed columns are opaque without the secret)
//! - Tampering with stored values (tag verification fails)
//! - Offline brute-force of a weak master secret (slow KDF)
//!
//! We do NOT defend against:
//! - Compromise of the running process or its environment
//! - Key rotation (a changed master secret cannot open old records)

pub mod blob;
pub mod envelope;
pub mod key;
pub mod random;
pub mod secret;

pub use blob::{SealedBlob, IV_LENGTH, MIN_BLOB_LENGTH, SALT_LENGTH, TAG_LENGTH};
pub use envelope::{open, open_text, seal, seal_to_text, seal_with};
pub use key::{derive_key, DerivedKey, KDF_ITERATIONS};
pub use random::{OsRandom, RandomSource};
pub use secret::{MasterSecret, ENCRYPTION_KEY_ENV};

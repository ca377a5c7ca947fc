//! The process-wide master secret.
//!
//! Loaded once at startup, held for the life of the process, and handed to
//! the envelope codec by reference. It is never logged and never written
//! alongside sealed data.

use secrecy::{ExposeSecret, SecretBox};

use crate::error::{CustodyError, Result};

/// Environment variable holding the master secret.
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";

/// Master secret used to derive per-record keys.
pub struct MasterSecret {
    inner: SecretBox<[u8]>,
}

impl MasterSecret {
    /// Build a master secret from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::Config` if the value is empty or only whitespace.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes: Vec<u8> = bytes.into();
        validate_secret(&bytes)?;
        Ok(Self {
            inner: SecretBox::new(bytes.into_boxed_slice()),
        })
    }

    /// Load the master secret from `ENCRYPTION_KEY`.
    ///
    /// Absence is a startup failure, not a per-call failure: callers should
    /// do this once and abort if it errors.
    pub fn from_env() -> Result<Self> {
        Self::from_env_var(ENCRYPTION_KEY_ENV)
    }

    /// Load the master secret from the named environment variable.
    pub fn from_env_var(name: &str) -> Result<Self> {
        let value = std::env::var(name)
            .map_err(|_| CustodyError::Config(format!("{} is not set", name)))?;
        Self::new(value).map_err(|_| CustodyError::Config(format!("{} is empty", name)))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn validate_secret(bytes: &[u8]) -> Result<()> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CustodyError::Config(
            "Master secret cannot be empty".to_string(),
        ));
    }
    Ok(())
}

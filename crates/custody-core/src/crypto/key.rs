//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! Every sealed value carries its own random salt, so every sealed value is
//! encrypted under its own derived key. The iteration count is fixed: it is
//! not recorded in the blob, and changing it breaks every existing record.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::{CustodyError, Result};

/// PBKDF2 iteration count.
///
/// Part of the at-rest format contract. Seal and open become measurably
/// slower per call; that cost bounds offline guessing of a weak master
/// secret.
pub const KDF_ITERATIONS: u32 = 100_000;

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256).
pub const KEY_LENGTH: usize = 32;

/// Minimum salt length accepted by [`derive_key`].
const MIN_SALT_LENGTH: usize = 16;

/// A symmetric key derived from the master secret and a per-record salt.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate cipher setup.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from the master secret and a salt.
///
/// Same secret + salt always yields the same key; a different salt yields an
/// unrelated key.
///
/// # Examples
///
/// ```
/// use custody_core::crypto::derive_key;
///
/// let salt = [7u8; 64];
/// let key = derive_key(b"master-secret", &salt).unwrap();
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_key(secret: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    if secret.is_empty() {
        return Err(CustodyError::Crypto(
            "Master secret cannot be empty".to_string(),
        ));
    }

    if salt.len() < MIN_SALT_LENGTH {
        return Err(CustodyError::Crypto(format!(
            "Salt must be at least {} bytes",
            MIN_SALT_LENGTH
        )));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(secret, salt, KDF_ITERATIONS, &mut key_bytes);

    Ok(DerivedKey::from_bytes(key_bytes))
}

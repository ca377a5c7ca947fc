//! Fixed-offset layout of a sealed value.
//!
//! ```text
//! offset  0   16                     80   96
//!         | IV | salt                 | tag | ciphertext ...
//!           16B        64B             16B   variable
//! ```
//!
//! Stored in text columns as standard padded base64. Byte order and field
//! lengths are a compatibility contract with every record already sealed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CustodyError, Result};

/// Initialization vector length in bytes.
pub const IV_LENGTH: usize = 16;

/// Per-record salt length in bytes.
pub const SALT_LENGTH: usize = 64;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

const SALT_OFFSET: usize = IV_LENGTH;
const TAG_OFFSET: usize = SALT_OFFSET + SALT_LENGTH;
const CIPHERTEXT_OFFSET: usize = TAG_OFFSET + TAG_LENGTH;

/// Smallest valid blob: all fixed fields and an empty ciphertext.
pub const MIN_BLOB_LENGTH: usize = CIPHERTEXT_OFFSET;

/// One encrypted value, split into its fields.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedBlob {
    pub iv: [u8; IV_LENGTH],
    pub salt: [u8; SALT_LENGTH],
    pub tag: [u8; TAG_LENGTH],
    pub ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Serialize as `IV ‖ salt ‖ tag ‖ ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_BLOB_LENGTH + self.ciphertext.len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the concatenated layout.
    ///
    /// # Errors
    ///
    /// Returns `CustodyError::MalformedBlob` if `bytes` is shorter than
    /// [`MIN_BLOB_LENGTH`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_BLOB_LENGTH {
            return Err(CustodyError::MalformedBlob(format!(
                "expected at least {} bytes, got {}",
                MIN_BLOB_LENGTH,
                bytes.len()
            )));
        }

        let mut iv = [0u8; IV_LENGTH];
        let mut salt = [0u8; SALT_LENGTH];
        let mut tag = [0u8; TAG_LENGTH];
        iv.copy_from_slice(&bytes[..SALT_OFFSET]);
        salt.copy_from_slice(&bytes[SALT_OFFSET..TAG_OFFSET]);
        tag.copy_from_slice(&bytes[TAG_OFFSET..CIPHERTEXT_OFFSET]);

        Ok(Self {
            iv,
            salt,
            tag,
            ciphertext: bytes[CIPHERTEXT_OFFSET..].to_vec(),
        })
    }

    /// Render for a text column.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parse a text column value.
    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CustodyError::MalformedBlob(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Total encoded length in bytes.
    pub fn len(&self) -> usize {
        MIN_BLOB_LENGTH + self.ciphertext.len()
    }

    /// True when the ciphertext is empty (the sealed plaintext was empty).
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

impl std::fmt::Debug for SealedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBlob")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

//! Envelope codec: seal and open individual field values.
//!
//! Each seal draws a fresh IV and a fresh salt, derives a one-off key from
//! the master secret and that salt, and encrypts with AES-256-GCM using a
//! 16-byte nonce. The result is a [`SealedBlob`].

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use zeroize::Zeroize;

use super::blob::{SealedBlob, IV_LENGTH, SALT_LENGTH, TAG_LENGTH};
use super::key::derive_key;
use super::random::{OsRandom, RandomSource};
use super::secret::MasterSecret;
use crate::error::{CustodyError, Result};

/// AES-256-GCM with a 128-bit nonce and 128-bit tag.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Seal `plaintext` under `secret` using the OS random source.
///
/// # Examples
///
/// ```
/// use custody_core::crypto::{open, seal, MasterSecret};
///
/// let secret = MasterSecret::new("doc-test-secret").unwrap();
/// let blob = seal(b"signature bytes", &secret).unwrap();
/// assert_eq!(open(&blob, &secret).unwrap(), b"signature bytes");
/// ```
pub fn seal(plaintext: &[u8], secret: &MasterSecret) -> Result<SealedBlob> {
    seal_with(&OsRandom, plaintext, secret)
}

/// Seal `plaintext` drawing IV and salt from `rng`.
pub fn seal_with(
    rng: &dyn RandomSource,
    plaintext: &[u8],
    secret: &MasterSecret,
) -> Result<SealedBlob> {
    let mut iv = [0u8; IV_LENGTH];
    let mut salt = [0u8; SALT_LENGTH];
    rng.fill(&mut iv)?;
    rng.fill(&mut salt)?;

    let cipher = cipher_for(secret, &salt)?;

    let mut ciphertext = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut ciphertext)
        .map_err(|_| CustodyError::Crypto("Encryption failed".to_string()))?;

    let mut tag_bytes = [0u8; TAG_LENGTH];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedBlob {
        iv,
        salt,
        tag: tag_bytes,
        ciphertext,
    })
}

/// Open a sealed value.
///
/// # Errors
///
/// Returns `CustodyError::Authentication` if the tag does not verify. That
/// covers tampering, corruption, and a wrong master secret. No plaintext is
/// returned in that case. The failure is final: do not retry with other
/// secrets.
pub fn open(blob: &SealedBlob, secret: &MasterSecret) -> Result<Vec<u8>> {
    let cipher = cipher_for(secret, &blob.salt)?;

    let mut buffer = blob.ciphertext.clone();
    let verified = cipher.decrypt_in_place_detached(
        GenericArray::from_slice(&blob.iv),
        b"",
        &mut buffer,
        GenericArray::from_slice(&blob.tag),
    );

    match verified {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(CustodyError::Authentication)
        }
    }
}

/// Seal and render straight to the base64 text column form.
pub fn seal_to_text(plaintext: &[u8], secret: &MasterSecret) -> Result<String> {
    Ok(seal(plaintext, secret)?.to_base64())
}

/// Parse a base64 text column value and open it.
///
/// # Errors
///
/// `CustodyError::MalformedBlob` for undecodable or short input, otherwise
/// as [`open`].
pub fn open_text(text: &str, secret: &MasterSecret) -> Result<Vec<u8>> {
    let blob = SealedBlob::from_base64(text)?;
    open(&blob, secret)
}

fn cipher_for(secret: &MasterSecret, salt: &[u8]) -> Result<Aes256Gcm16> {
    let key = derive_key(secret.expose(), salt)?;
    Aes256Gcm16::new_from_slice(key.as_bytes())
        .map_err(|e| CustodyError::Crypto(format!("Cipher setup failed: {}", e)))
}

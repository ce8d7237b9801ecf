//! AES-256-GCM authenticated encryption for versioned store files
//!
//! Blob format: `nonce (12) | ciphertext | auth tag (16)`
//! The caller supplies associated data (the file header) which is
//! authenticated but not stored in the blob.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::DerivedKey;
use crate::error::{Result, VaultError};

/// GCM nonce length (96 bits)
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key`, binding `aad` into the tag
pub fn encrypt(plaintext: &[u8], key: &DerivedKey, aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext_with_tag.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext_with_tag);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`]
///
/// Fails with [`VaultError::AuthenticationFailed`] for a wrong key, a
/// different `aad`, or any damage to the blob.
pub fn decrypt(blob: &[u8], key: &DerivedKey, aad: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::AuthenticationFailed)?;

    let (nonce, ciphertext_with_tag) = blob.split_at(NONCE_LEN);
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext_with_tag,
                aad,
            },
        )
        .map_err(|_| VaultError::AuthenticationFailed)
}

//! Fernet tokens (AES-128-CBC + HMAC-SHA256)
//!
//! Token layout before base64url encoding:
//! `0x80 | timestamp (u64 BE) | IV (16) | ciphertext (PKCS7) | HMAC-SHA256 (32)`
//!
//! The first half of the 32-byte key signs, the second half encrypts. Tokens
//! written here open with any conforming Fernet implementation and vice versa.

use aes::Aes128;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use tracing::trace;

use super::DerivedKey;
use crate::error::{Result, VaultError};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

const VERSION: u8 = 0x80;
const IV_LEN: usize = 16;
const HMAC_LEN: usize = 32;
const BLOCK_LEN: usize = 16;
/// Version byte plus timestamp
const HEADER_LEN: usize = 1 + 8;
/// Header, IV, at least one cipher block, and the MAC
const MIN_TOKEN_LEN: usize = HEADER_LEN + IV_LEN + BLOCK_LEN + HMAC_LEN;

/// Encrypt `plaintext` into an encoded Fernet token
///
/// A fresh random IV is drawn for every call, so the same plaintext never
/// produces the same token twice.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let timestamp = chrono::Utc::now().timestamp().max(0) as u64;

    encrypt_with(plaintext, key, iv, timestamp)
}

fn encrypt_with(
    plaintext: &[u8],
    key: &DerivedKey,
    iv: [u8; IV_LEN],
    timestamp: u64,
) -> Result<Vec<u8>> {
    let (signing_key, encryption_key) = split_key(key);

    let ciphertext = Aes128CbcEnc::new_from_slices(encryption_key, &iv)
        .map_err(|e| VaultError::Encryption(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token = Vec::with_capacity(HEADER_LEN + IV_LEN + ciphertext.len() + HMAC_LEN);
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(&iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = HmacSha256::new_from_slice(signing_key)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    trace!(
        plaintext_len = plaintext.len(),
        token_len = token.len(),
        "sealed fernet token"
    );

    Ok(URL_SAFE.encode(&token).into_bytes())
}

/// Verify and decrypt an encoded Fernet token
///
/// Every failure - bad encoding, truncation, wrong version, MAC mismatch or
/// bad padding - is reported as [`VaultError::AuthenticationFailed`].
pub fn decrypt(encoded: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let token = URL_SAFE
        .decode(encoded)
        .map_err(|_| VaultError::AuthenticationFailed)?;

    if token.len() < MIN_TOKEN_LEN || token[0] != VERSION {
        return Err(VaultError::AuthenticationFailed);
    }

    let (signed, tag) = token.split_at(token.len() - HMAC_LEN);
    let (signing_key, encryption_key) = split_key(key);

    let mut mac =
        HmacSha256::new_from_slice(signing_key).map_err(|_| VaultError::AuthenticationFailed)?;
    mac.update(signed);
    mac.verify_slice(tag)
        .map_err(|_| VaultError::AuthenticationFailed)?;

    let iv = &signed[HEADER_LEN..HEADER_LEN + IV_LEN];
    let ciphertext = &signed[HEADER_LEN + IV_LEN..];
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(VaultError::AuthenticationFailed);
    }

    Aes128CbcDec::new_from_slices(encryption_key, iv)
        .map_err(|_| VaultError::AuthenticationFailed)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::AuthenticationFailed)
}

fn split_key(key: &DerivedKey) -> (&[u8], &[u8]) {
    key.as_bytes().split_at(16)
}

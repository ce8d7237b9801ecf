//! On-disk layouts of the token file
//!
//! Legacy (default), byte-compatible with existing stores:
//! `salt (16) | fernet token`
//!
//! Versioned:
//! `"TKV" | version (1) | iterations (u32 BE) | salt (16) | nonce | ciphertext | tag`
//! The 24-byte header is authenticated as AES-GCM associated data.

use serde::{Deserialize, Serialize};

use crate::crypto::{Salt, SALT_LEN};
use crate::error::{Result, VaultError};

const MAGIC: &[u8; 3] = b"TKV";
const CURRENT_VERSION: u8 = 1;
const VERSIONED_HEADER_LEN: usize = MAGIC.len() + 1 + 4 + SALT_LEN;
const MAX_ITERATIONS: u32 = 100_000_000;

/// Store file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Salt followed by a Fernet token, no header
    #[default]
    Legacy,
    /// Tagged header with the KDF round count, AES-256-GCM payload
    #[serde(rename = "v1")]
    Versioned,
}

impl std::fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Versioned => f.write_str("v1"),
        }
    }
}

impl std::str::FromStr for StoreFormat {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "v1" | "versioned" => Ok(Self::Versioned),
            other => Err(VaultError::Settings(format!("unknown store format: {}", other))),
        }
    }
}

/// Salt and ciphertext as read from, or about to be written to, the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedToken {
    pub salt: Salt,
    /// KDF round count recorded in the file; `None` for the legacy layout
    pub iterations: Option<u32>,
    /// Cipher output, not validated until decryption
    pub blob: Vec<u8>,
}

impl StoreFormat {
    /// Bytes authenticated alongside the ciphertext; empty for legacy files
    pub fn header(&self, salt: &Salt, iterations: u32) -> Vec<u8> {
        match self {
            Self::Legacy => Vec::new(),
            Self::Versioned => {
                let mut header = Vec::with_capacity(VERSIONED_HEADER_LEN);
                header.extend_from_slice(MAGIC);
                header.push(CURRENT_VERSION);
                header.extend_from_slice(&iterations.to_be_bytes());
                header.extend_from_slice(salt.as_bytes());
                header
            }
        }
    }

    /// Serialize a sealed token into the file contents for this layout
    pub fn encode(&self, sealed: &SealedToken) -> Vec<u8> {
        let mut bytes = match self {
            Self::Legacy => sealed.salt.as_bytes().to_vec(),
            Self::Versioned => {
                self.header(&sealed.salt, sealed.iterations.unwrap_or_default())
            }
        };
        bytes.extend_from_slice(&sealed.blob);
        bytes
    }

    /// Split file contents into salt and blob
    ///
    /// Only the framing is checked here; the blob itself is left to the
    /// cipher's integrity check.
    pub fn decode(&self, bytes: &[u8]) -> Result<SealedToken> {
        match self {
            Self::Legacy => {
                if bytes.len() < SALT_LEN {
                    return Err(VaultError::CorruptStore);
                }
                let (salt, blob) = bytes.split_at(SALT_LEN);
                Ok(SealedToken {
                    salt: Salt::from_slice(salt).ok_or(VaultError::CorruptStore)?,
                    iterations: None,
                    blob: blob.to_vec(),
                })
            }
            Self::Versioned => {
                if bytes.len() < VERSIONED_HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
                    return Err(VaultError::CorruptStore);
                }
                let version = bytes[MAGIC.len()];
                if version != CURRENT_VERSION {
                    return Err(VaultError::UnsupportedFormat(version));
                }

                let (iterations, rest) = bytes[MAGIC.len() + 1..].split_at(4);
                let iterations = iterations
                    .try_into()
                    .map(u32::from_be_bytes)
                    .map_err(|_| VaultError::CorruptStore)?;
                if iterations == 0 || iterations > MAX_ITERATIONS {
                    return Err(VaultError::CorruptStore);
                }

                let (salt, blob) = rest.split_at(SALT_LEN);
                Ok(SealedToken {
                    salt: Salt::from_slice(salt).ok_or(VaultError::CorruptStore)?,
                    iterations: Some(iterations),
                    blob: blob.to_vec(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(iterations: Option<u32>) -> SealedToken {
        SealedToken {
            salt: Salt::from_bytes([0x11; SALT_LEN]),
            iterations,
            blob: b"ciphertext+tag".to_vec(),
        }
    }

    #[test]
    fn test_legacy_layout_is_salt_then_blob() {
        let bytes = StoreFormat::Legacy.encode(&sealed(None));

        assert_eq!(bytes.len(), SALT_LEN + 14);
        assert_eq!(&bytes[..SALT_LEN], &[0x11; SALT_LEN]);
        assert_eq!(&bytes[SALT_LEN..], b"ciphertext+tag");

        let decoded = StoreFormat::Legacy.decode(&bytes).unwrap();
        assert_eq!(decoded, sealed(None));
    }

    #[test]
    fn test_legacy_accepts_empty_blob() {
        let decoded = StoreFormat::Legacy.decode(&[0u8; SALT_LEN]).unwrap();
        assert!(decoded.blob.is_empty());
    }

    #[test]
    fn test_legacy_short_file_is_corrupt() {
        let result = StoreFormat::Legacy.decode(&[0u8; SALT_LEN - 1]);
        assert!(matches!(result, Err(VaultError::CorruptStore)));
    }

    #[test]
    fn test_versioned_header_layout() {
        let bytes = StoreFormat::Versioned.encode(&sealed(Some(600_000)));

        assert_eq!(&bytes[..3], b"TKV");
        assert_eq!(bytes[3], 1);
        assert_eq!(&bytes[4..8], &600_000u32.to_be_bytes());
        assert_eq!(&bytes[8..24], &[0x11; SALT_LEN]);
        assert_eq!(&bytes[24..], b"ciphertext+tag");

        let decoded = StoreFormat::Versioned.decode(&bytes).unwrap();
        assert_eq!(decoded, sealed(Some(600_000)));
    }

    #[test]
    fn test_versioned_rejects_bad_framing() {
        let good = StoreFormat::Versioned.encode(&sealed(Some(1_000)));

        let mut bad_magic = good.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            StoreFormat::Versioned.decode(&bad_magic),
            Err(VaultError::CorruptStore)
        ));

        let mut future = good.clone();
        future[3] = 9;
        assert!(matches!(
            StoreFormat::Versioned.decode(&future),
            Err(VaultError::UnsupportedFormat(9))
        ));

        let mut zero_rounds = good.clone();
        zero_rounds[4..8].copy_from_slice(&0u32.to_be_bytes());
        assert!(matches!(
            StoreFormat::Versioned.decode(&zero_rounds),
            Err(VaultError::CorruptStore)
        ));

        assert!(matches!(
            StoreFormat::Versioned.decode(&good[..VERSIONED_HEADER_LEN - 1]),
            Err(VaultError::CorruptStore)
        ));
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("legacy".parse::<StoreFormat>().unwrap(), StoreFormat::Legacy);
        assert_eq!("V1".parse::<StoreFormat>().unwrap(), StoreFormat::Versioned);
        assert!("v2".parse::<StoreFormat>().is_err());
        assert_eq!(StoreFormat::Versioned.to_string(), "v1");
    }

    #[test]
    fn test_format_serde_names() {
        let json = serde_json::to_string(&StoreFormat::Versioned).unwrap();
        assert_eq!(json, "\"v1\"");
        let parsed: StoreFormat = serde_json::from_str("\"legacy\"").unwrap();
        assert_eq!(parsed, StoreFormat::Legacy);
    }
}

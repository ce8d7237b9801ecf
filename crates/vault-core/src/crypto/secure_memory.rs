//! Key and secret holders that wipe themselves on drop

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::KEY_LEN;

/// Symmetric key derived from the user's password - zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Create from a slice (must be exactly 32 bytes)
    #[cfg(test)]
    pub(crate) fn from_slice(slice: &[u8]) -> Option<Self> {
        let key: [u8; KEY_LEN] = slice.try_into().ok()?;
        Some(Self { key })
    }

    /// Parse the padded base64url text form Fernet implementations print
    #[cfg(test)]
    pub(crate) fn from_fernet_key(encoded: &str) -> Option<Self> {
        use base64::{engine::general_purpose::URL_SAFE, Engine as _};

        let raw = zeroize::Zeroizing::new(URL_SAFE.decode(encoded.trim()).ok()?);
        Self::from_slice(&raw)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Password or token text held only for the length of one operation
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

//! Credential type definitions

use std::path::PathBuf;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Result of the setup flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// A new token file was written
    Created { path: PathBuf },
    /// An existing file was kept because the user did not confirm replacing it
    Declined,
}

/// Decrypted token - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DecryptedToken {
    value: String,
}

impl DecryptedToken {
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the token (use carefully - never log or persist it)
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for DecryptedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedToken")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

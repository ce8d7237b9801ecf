//! Error types for vault-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Input rejected before any key is derived
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty password")]
    EmptyPassword,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("empty token")]
    EmptySecret,
}

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Cancelled")]
    UserCancelled,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no token file at {}. Run --setup first", path.display())]
    NotFound { path: PathBuf },

    /// Wrong password and damaged ciphertext are deliberately the same error.
    #[error("wrong password")]
    AuthenticationFailed,

    #[error("token file is corrupt")]
    CorruptStore,

    #[error("unsupported token file format version {0}")]
    UnsupportedFormat(u8),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

//! # vault-core
//!
//! Password-protected storage for a single API token:
//! - PBKDF2-HMAC-SHA256 key derivation (600,000 rounds)
//! - Fernet (default) and AES-256-GCM authenticated encryption
//! - A salt-prefixed store file written with owner-only permissions
//! - Setup and unlock flows driven through a pluggable prompt capability

pub mod crypto;
pub mod storage;
pub mod credential;
pub mod error;
pub mod prompt;
pub mod settings;

pub use error::{VaultError, ValidationError, Result};
pub use crypto::{derive_key, DerivedKey, KdfParams, Salt, SecretString};
pub use storage::{SealedToken, SecureStore, StoreFormat};
pub use credential::{CredentialManager, DecryptedToken, SetupOutcome};
pub use prompt::{PromptKind, PromptOutcome, SecretPrompt};
pub use settings::{ApiSettings, PromptBackend, Settings, SettingsManager};

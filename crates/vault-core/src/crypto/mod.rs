//! Cryptographic primitives for the token store
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from passwords
//! - Fernet tokens (the default store cipher)
//! - AES-256-GCM for versioned store files
//! - Secure memory handling with zeroize

pub mod encryption;
pub mod fernet;
mod key_derivation;
mod secure_memory;

pub use key_derivation::{derive_key, KdfParams, Salt, DEFAULT_ITERATIONS};
pub use secure_memory::{DerivedKey, SecretString};

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes
pub const KEY_LEN: usize = 32;

//! Persistence of the encrypted token
//!
//! A single file holds the salt and the authenticated ciphertext. The layout
//! is chosen by [`StoreFormat`]; the file itself is handled by [`SecureStore`].

mod format;
mod secure_file;

pub use format::{SealedToken, StoreFormat};
pub use secure_file::{SecureStore, STORE_FILE_NAME};

//! Setup and unlock flows for the protected token

mod manager;
mod types;

pub use manager::CredentialManager;
pub use types::*;

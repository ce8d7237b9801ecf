//! Credential manager: setup and unlock of the protected token

use tracing::{debug, info};
use zeroize::Zeroizing;

use super::types::{DecryptedToken, SetupOutcome};
use crate::crypto::{derive_key, encryption, fernet, KdfParams, Salt, SecretString};
use crate::error::{Result, ValidationError, VaultError};
use crate::prompt::{PromptKind, PromptOutcome, SecretPrompt};
use crate::storage::{SealedToken, SecureStore, StoreFormat};

const SET_PASSWORD_TITLE: &str = "Set password for API token";
const CONFIRM_PASSWORD_TITLE: &str = "Confirm password";
const SECRET_TITLE: &str = "Paste your API token: ";
const UNLOCK_TITLE: &str = "Unlock API token";

/// Orchestrates key derivation, encryption and the store file
///
/// Holds no password or token between calls; every unlock asks again.
pub struct CredentialManager {
    store: SecureStore,
    kdf: KdfParams,
}

impl CredentialManager {
    pub fn new(store: SecureStore) -> Self {
        Self {
            store,
            kdf: KdfParams::default(),
        }
    }

    /// Override the PBKDF2 parameters used for new stores
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn store(&self) -> &SecureStore {
        &self.store
    }

    /// Capture a password and token, encrypt the token and write the store
    ///
    /// Validation and prompt failures happen before anything touches disk,
    /// so an existing store is left byte-for-byte unchanged.
    pub fn setup(&self, prompt: &mut dyn SecretPrompt) -> Result<SetupOutcome> {
        if self.store.exists() {
            let question = format!(
                "Token file already exists at {}. Replace?",
                self.store.path().display()
            );
            if !prompt.confirm(&question)? {
                info!("Kept existing token file at {:?}", self.store.path());
                return Ok(SetupOutcome::Declined);
            }
        }

        let password = capture(prompt, PromptKind::Password, SET_PASSWORD_TITLE)?;
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }

        let confirmation = capture(prompt, PromptKind::Password, CONFIRM_PASSWORD_TITLE)?;
        if password.expose() != confirmation.expose() {
            return Err(ValidationError::PasswordMismatch.into());
        }

        let secret = capture(prompt, PromptKind::Secret, SECRET_TITLE)?;
        let token = SecretString::new(secret.expose().trim().to_string());
        if token.is_empty() {
            return Err(ValidationError::EmptySecret.into());
        }

        let sealed = self.seal(&password, &token)?;
        self.store.write(&sealed)?;

        info!("Token encrypted and saved to {:?}", self.store.path());
        Ok(SetupOutcome::Created {
            path: self.store.path().to_path_buf(),
        })
    }

    /// Ask for the password once and decrypt the stored token
    ///
    /// A wrong password and a damaged file both end in
    /// [`VaultError::AuthenticationFailed`], and only after the password
    /// prompt, so the two cannot be told apart.
    pub fn unlock(&self, prompt: &mut dyn SecretPrompt) -> Result<DecryptedToken> {
        let sealed = match self.store.read() {
            Ok(sealed) => Some(sealed),
            Err(VaultError::CorruptStore) => None,
            Err(e) => return Err(e),
        };

        let password = capture(prompt, PromptKind::Password, UNLOCK_TITLE)?;
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }

        let token = sealed
            .ok_or(VaultError::AuthenticationFailed)
            .and_then(|sealed| self.open(&sealed, &password));

        match &token {
            Ok(_) => info!("Token unlocked from {:?}", self.store.path()),
            Err(_) => debug!("Token unlock failed"),
        }
        token
    }

    fn seal(&self, password: &SecretString, token: &SecretString) -> Result<SealedToken> {
        let format = self.store.format();
        let salt = Salt::generate();
        let key = derive_key(password.expose().as_bytes(), &salt, &self.kdf);

        let (iterations, blob) = match format {
            StoreFormat::Legacy => (None, fernet::encrypt(token.expose().as_bytes(), &key)?),
            StoreFormat::Versioned => {
                let header = format.header(&salt, self.kdf.iterations);
                let blob = encryption::encrypt(token.expose().as_bytes(), &key, &header)?;
                (Some(self.kdf.iterations), blob)
            }
        };

        debug!(
            "Sealed {} byte blob with {} format, {} rounds",
            blob.len(),
            format,
            self.kdf.iterations
        );
        Ok(SealedToken {
            salt,
            iterations,
            blob,
        })
    }

    fn open(&self, sealed: &SealedToken, password: &SecretString) -> Result<DecryptedToken> {
        let format = self.store.format();
        let kdf = sealed
            .iterations
            .map(KdfParams::with_iterations)
            .unwrap_or(self.kdf);
        let key = derive_key(password.expose().as_bytes(), &sealed.salt, &kdf);

        let plaintext = Zeroizing::new(match format {
            StoreFormat::Legacy => fernet::decrypt(&sealed.blob, &key)?,
            StoreFormat::Versioned => {
                let header = format.header(&sealed.salt, kdf.iterations);
                encryption::decrypt(&sealed.blob, &key, &header)?
            }
        });

        let value = std::str::from_utf8(&plaintext)
            .map_err(|_| VaultError::AuthenticationFailed)?
            .to_string();
        Ok(DecryptedToken::new(value))
    }
}

fn capture(prompt: &mut dyn SecretPrompt, kind: PromptKind, title: &str) -> Result<SecretString> {
    match prompt.prompt(kind, title)? {
        PromptOutcome::Value(value) => Ok(SecretString::new(value)),
        PromptOutcome::Cancelled => {
            debug!("{:?} prompt cancelled", kind);
            Err(VaultError::UserCancelled)
        }
    }
}

//! Owner-only token file
//!
//! The file is always replaced whole: contents go to a sibling temp file
//! created with mode 0600, which is then renamed over the target. A failed
//! write leaves any previous file untouched.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{SealedToken, StoreFormat};
use crate::error::{Result, VaultError};

/// Default store file name inside the application config directory
pub const STORE_FILE_NAME: &str = "api-token.enc";

/// The single persisted token file
#[derive(Debug, Clone)]
pub struct SecureStore {
    path: PathBuf,
    format: StoreFormat,
}

impl SecureStore {
    /// Create a store at `path` using the legacy layout
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: StoreFormat::default(),
        }
    }

    pub fn with_format(mut self, format: StoreFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist salt and blob, replacing any existing file
    pub fn write(&self, sealed: &SealedToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                restrict_permissions(parent, 0o700)?;
                debug!("Created store directory {:?}", parent);
            }
        }

        let contents = self.format.encode(sealed);
        let temp_path = self.temp_path();

        if let Err(e) = write_private(&temp_path, &contents)
            .and_then(|_| fs::rename(&temp_path, &self.path))
        {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(
            "Wrote {} byte token file ({} format) to {:?}",
            contents.len(),
            self.format,
            self.path
        );
        Ok(())
    }

    /// Load the salt and blob, failing with `NotFound` when setup never ran
    pub fn read(&self) -> Result<SealedToken> {
        let bytes = fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VaultError::NotFound {
                path: self.path.clone(),
            },
            _ => VaultError::Io(e),
        })?;

        debug!("Read {} byte token file from {:?}", bytes.len(), self.path);
        self.format.decode(&bytes)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| STORE_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // A leftover temp file keeps its old mode, so set it explicitly
    restrict_permissions(path, 0o600)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Salt, SALT_LEN};
    use tempfile::TempDir;

    fn sealed(byte: u8) -> SealedToken {
        SealedToken {
            salt: Salt::from_bytes([byte; SALT_LEN]),
            iterations: Some(1_000),
            blob: vec![byte; 40],
        }
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = SecureStore::new(temp_dir.path().join(STORE_FILE_NAME));

        store.write(&sealed(1)).unwrap();

        let read = store.read().unwrap();
        assert_eq!(read.salt, sealed(1).salt);
        assert_eq!(read.blob, sealed(1).blob);
        assert_eq!(read.iterations, None);

        let bytes = fs::read(store.path()).unwrap();
        assert_eq!(bytes.len(), SALT_LEN + 40);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.enc");
        let store = SecureStore::new(&path);

        match store.read() {
            Err(VaultError::NotFound { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!store.exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = SecureStore::new(temp_dir.path().join("a/b/token-vault").join(STORE_FILE_NAME));

        store.write(&sealed(2)).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_overwrite_replaces_contents_and_cleans_temp() {
        let temp_dir = TempDir::new().unwrap();
        let store = SecureStore::new(temp_dir.path().join(STORE_FILE_NAME));

        store.write(&sealed(3)).unwrap();
        store.write(&sealed(4)).unwrap();

        assert_eq!(store.read().unwrap().blob, vec![4u8; 40]);
        assert!(!store.temp_path().exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_versioned_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SecureStore::new(temp_dir.path().join(STORE_FILE_NAME))
            .with_format(StoreFormat::Versioned);

        store.write(&sealed(5)).unwrap();
        assert_eq!(store.read().unwrap(), sealed(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = SecureStore::new(temp_dir.path().join("cfg").join(STORE_FILE_NAME));

        store.write(&sealed(6)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let dir_mode = fs::metadata(temp_dir.path().join("cfg"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_tightens_loose_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = SecureStore::new(temp_dir.path().join(STORE_FILE_NAME));
        store.write(&sealed(7)).unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.write(&sealed(8)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

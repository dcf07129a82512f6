//! Secure Credential Storage backed by plain files

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File-based secure storage implementation
///
/// Each key is stored as one file directly under `root`. Writes go to a
/// sibling temporary file which is then renamed over the target, so a crash
/// never leaves a half-written credential behind. On Unix the file is
/// restricted to the owner.
pub struct FileSecureStore {
    root: PathBuf,
}

impl FileSecureStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Split a file path into a store rooted at its parent and the key
    /// naming the file.
    pub fn for_file(path: &Path) -> Result<(Self, String)> {
        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                BridgeError::OperationFailed(format!(
                    "Credential path has no file name: {}",
                    path.display()
                ))
            })?
            .to_string();

        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok((Self::new(root), key))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid secret key: {:?}",
                key
            )));
        }
        Ok(self.root.join(key))
    }

    #[cfg(unix)]
    async fn restrict_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn restrict_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if !self.root.as_os_str().is_empty() {
            fs::create_dir_all(&self.root).await?;
        }

        let tmp_path = self.root.join(format!(".{}.tmp", key));
        fs::write(&tmp_path, value).await?;
        Self::restrict_permissions(&tmp_path).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!(key = key, "Stored secret on disk");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(key = key, "Retrieved secret from disk");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = key, "Secret not found on disk");
                Ok(None)
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = key, "Deleted secret from disk");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = key, "Secret not found (already deleted)");
                Ok(())
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

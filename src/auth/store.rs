use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Blob holding the pending authorization `state`.
pub const STATE: &str = "state";
/// Blob holding the pending PKCE verifier.
pub const VERIFIER: &str = "verifier";
/// Blob holding the most recent identity token.
pub const ID_TOKEN: &str = "id_token";
/// Blob holding the serialized OAuth token set.
pub const TOKEN: &str = "token";

/// Every blob name the launcher writes.
pub const ALL_BLOBS: [&str; 4] = [STATE, VERIFIER, ID_TOKEN, TOKEN];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no cached {name}")]
    NotFound { name: String },
    #[error("invalid blob name: {0:?}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage for the small named text blobs the launcher caches between runs.
///
/// The launcher is a single-shot process, so implementations need no
/// cross-process locking.
pub trait CredentialStore: Send + Sync {
    fn put(&self, name: &str, content: &str) -> Result<(), StoreError>;
    fn get(&self, name: &str) -> Result<String, StoreError>;
    fn remove(&self, name: &str) -> Result<(), StoreError>;
}

/// File-backed store: one file per blob under a per-user config directory.
///
/// # Example
/// ```no_run
/// use jxlaunch::auth::{CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// store.put("state", "abcdefghijkl")?;
/// assert_eq!(store.get("state")?, "abcdefghijkl");
/// # Ok::<(), jxlaunch::auth::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_config_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn blob_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.base_dir.join(name))
    }

    fn ensure_parent(path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn put(&self, name: &str, content: &str) -> Result<(), StoreError> {
        let path = self.blob_path(name)?;
        Self::ensure_parent(&path)?;
        fs::write(&path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<String, StoreError> {
        let path = self.blob_path(name)?;
        match fs::read_to_string(&path) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let path = self.blob_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

/// Volatile store, handy for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn put(&self, name: &str, content: &str) -> Result<(), StoreError> {
        if !is_valid_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<String, StoreError> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name);
        Ok(())
    }
}

/// `<config dir>/jxlaunch`, e.g. `~/.config/jxlaunch` on Linux.
pub fn default_config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "jxlaunch")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".jxlaunch"))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

//! Secure key-value storage for session credentials
//!
//! The `SecureStore` trait models the device's encrypted, persistent
//! key-value store. On a real device the host application injects its
//! platform keychain behind this trait; this crate ships a file-backed
//! implementation for desktop/CI use and an in-memory one for tests.
//!
//! The file store keeps a JSON map on disk. All writes use atomic
//! temp-file + rename to prevent corruption on crash, and the file is
//! written with 0600 permissions since it holds bearer tokens. A tokio
//! Mutex serializes concurrent writes from request-time refresh and
//! login/logout flows.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Scoped, persistent, encrypted-at-rest key-value storage.
///
/// `get` is infallible (absence is the only miss condition); `set` and
/// `delete` may fail on persistence. Uses `Pin<Box<dyn Future>>` return
/// types for dyn-compatibility (`Arc<dyn SecureStore>`).
pub trait SecureStore: Send + Sync {
    /// Read a value, or None if the key has never been set (or was deleted).
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

    /// Write a value, overwriting any previous value for the key.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Remove a key. Deleting an absent key is a no-op.
    fn delete<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// File-backed secure store.
///
/// The Mutex serializes all access. Reads acquire the lock briefly to
/// clone the value, so token attachment doesn't block on a concurrent
/// persist.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Load the store from the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}` (cold start with no
    /// session). The client treats the missing-token case as
    /// unauthenticated, not as an error.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let entries: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), entries = entries.len(), "loaded credential store");
            entries
        } else {
            info!(path = %path.display(), "credential file not found, starting empty");
            let entries = HashMap::new();
            // Create the empty file so future loads don't need the cold-start path
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl SecureStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            state.get(key).cloned()
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.insert(key.to_owned(), value);
            debug!(key, "stored credential entry");
            write_atomic(&self.path, &state).await
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.remove(key).is_some() {
                debug!(key, "deleted credential entry");
                write_atomic(&self.path, &state).await?;
            }
            Ok(())
        })
    }
}

/// In-memory secure store for tests and keychain-less hosts.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            state.get(key).cloned()
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.insert(key.to_owned(), value);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.remove(key);
            Ok(())
        })
    }
}

/// Write the store contents to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. This prevents corruption if the process crashes mid-write.
/// Sets file permissions to 0600 (owner read/write only) since the file
/// contains bearer tokens.
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing credential store: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credential store");
    Ok(())
}

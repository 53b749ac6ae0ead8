//! Key/value local storage.
//!
//! The storefront keeps a handful of values outside the CMS: the auth token,
//! the cached user profile, shop filter state and the guest cart. They are
//! stored as strings under fixed [`keys`], behind the [`LocalStore`] trait:
//!
//! - [`MemoryStore`] - process-local map, for tests and one-off tools
//! - [`FileStore`] - a JSON object on disk, used by the CLI
//! - [`SessionStore`] - the per-visitor `tower-sessions` session, used by the server

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

/// Storage keys shared by every front end.
pub mod keys {
    /// Bearer token issued by the CMS on login.
    pub const TOKEN: &str = "token";

    /// Cached [`zone7_core::user::UserProfile`].
    pub const USER: &str = zone7_core::user::UserProfile::STORAGE_KEY;

    /// Persisted [`zone7_core::filters::ShopFilters`].
    pub const SHOP_FILTERS: &str = zone7_core::filters::ShopFilters::STORAGE_KEY;

    /// Pre-login [`zone7_core::cart::GuestCart`].
    pub const GUEST_CART: &str = "guestCart";
}

/// Errors raised by a [`LocalStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// String key/value storage with JSON helpers.
pub trait LocalStore: Send + Sync {
    /// Read a raw value.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Write a raw value, replacing any previous one.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read and deserialize a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the stored value is not valid
    /// JSON for `T`.
    fn get_json<T>(&self, key: &str) -> impl Future<Output = Result<Option<T>, StoreError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            match self.get(key).await? {
                Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
                None => Ok(None),
            }
        }
    }

    /// Serialize and write a JSON value.
    fn set_json<T>(&self, key: &str, value: &T) -> impl Future<Output = Result<(), StoreError>> + Send
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value);
        async move { self.set(key, raw?).await }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename, so a crash never leaves a half-written state file behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_owned(), value);
        self.write_all(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Store scoped to one visitor's server-side session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Session,
}

impl SessionStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl LocalStore for SessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.session.get::<String>(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.session.insert(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.session.remove::<String>(key).await?;
        Ok(())
    }
}

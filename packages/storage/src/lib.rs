//! JSON documents stored under string keys.
//!
//! Boards keep one document per collection (`bays.json`, `heldJobs.json`, ...).
//! The bytes live in an `object_store` backend: a local directory normally,
//! or process memory for tests.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object_store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where documents end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// One file per key below `root`. The directory is created on open.
    Filesystem(PathBuf),
    /// Lost when the last [`Storage`] clone is dropped.
    Memory,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Filesystem(_) => "filesystem",
            Backend::Memory => "memory",
        }
    }
}

pub const DEFAULT_FS_ROOT: &str = "./data/board";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Folder prepended to every key, so several workshops can share a root.
    pub prefix: Option<String>,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory,
            prefix: None,
        }
    }

    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Filesystem(root.into()),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = trimmed(prefix.into());
        self
    }

    /// Reads `STORAGE_BACKEND` (`filesystem`/`fs` or `memory`/`mem`, default
    /// filesystem), `STORAGE_FS_ROOT` (default `./data/board`) and
    /// `STORAGE_PREFIX`.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let var = |name: &str| get(name).and_then(trimmed);

        let mut cfg = match var("STORAGE_BACKEND").map(|b| b.to_ascii_lowercase()).as_deref() {
            None | Some("filesystem" | "fs") => Self::filesystem(
                var("STORAGE_FS_ROOT").unwrap_or_else(|| DEFAULT_FS_ROOT.to_string()),
            ),
            Some("memory" | "mem") => Self::memory(),
            Some(other) => {
                return Err(StorageError::InvalidConfig(format!(
                    "STORAGE_BACKEND={other} is not one of filesystem, memory"
                )));
            }
        };
        cfg.prefix = var("STORAGE_PREFIX");
        Ok(cfg)
    }
}

/// Handle to an open backend. Clones read and write the same documents.
#[derive(Clone)]
pub struct Storage {
    backend: &'static str,
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("backend", &self.backend)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(cfg: StorageConfig) -> Result<Self, StorageError> {
        let backend = cfg.backend.name();
        let store: Arc<dyn ObjectStore> = match cfg.backend {
            Backend::Filesystem(root) => {
                std::fs::create_dir_all(&root)?;
                Arc::new(object_store::local::LocalFileSystem::new_with_prefix(root)?)
            }
            Backend::Memory => Arc::new(InMemory::new()),
        };
        let prefix = cfg
            .prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            backend,
            store,
            prefix,
        })
    }

    pub fn from_env() -> Result<Self, StorageError> {
        Self::new(StorageConfig::from_env()?)
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    fn path_for(&self, key: &str) -> Result<Path, StorageError> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(StorageError::InvalidConfig("empty object key".into()));
        }
        Ok(match &self.prefix {
            Some(prefix) => Path::from(format!("{prefix}/{key}")),
            None => Path::from(key),
        })
    }

    pub async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        self.store.put(&path, PutPayload::from(bytes)).await?;
        Ok(())
    }

    /// `None` when nothing was ever written under `key`.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        let path = self.path_for(key)?;
        let Some(found) = not_found_as_none(self.store.get(&path).await)? else {
            return Ok(None);
        };
        Ok(Some(found.bytes().await?))
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(not_found_as_none(self.store.head(&path).await)?.is_some())
    }

    /// Deleting a key that is not there succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        not_found_as_none(self.store.delete(&path).await)?;
        Ok(())
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec(value)?;
        self.put_bytes(key, encoded.into()).await?;
        tracing::debug!(key, backend = self.backend, "document written");
        Ok(())
    }

    /// A missing key is `Ok(None)`. A document that does not decode as `T`
    /// is [`StorageError::Json`].
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_bytes(key).await? {
            Some(raw) => {
                let value = serde_json::from_slice(&raw)?;
                tracing::debug!(key, backend = self.backend, "document read");
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

fn not_found_as_none<T>(res: object_store::Result<T>) -> Result<Option<T>, StorageError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn trimmed(s: String) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[tokio::test]
    async fn bytes_in_memory() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory())?;
        storage.put_bytes("hello.txt", Bytes::from("hi")).await?;
        assert_eq!(storage.get_bytes("hello.txt").await?, Some(Bytes::from("hi")));
        assert_eq!(storage.backend(), "memory");
        Ok(())
    }

    #[tokio::test]
    async fn missing_key_is_none() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory())?;
        let got: Option<Vec<String>> = storage.get_json("bays.json").await?;
        assert!(got.is_none());
        assert!(!storage.exists("bays.json").await?);
        storage.delete("bays.json").await?;
        Ok(())
    }

    #[tokio::test]
    async fn prefixed_files_on_disk() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let storage = Storage::new(StorageConfig::filesystem(dir.path()).with_prefix("/shop-a/"))?;

        let bays = vec!["BAY-01".to_string(), "BAY-02".to_string()];
        storage.put_json("bays.json", &bays).await?;
        let got: Option<Vec<String>> = storage.get_json("bays.json").await?;
        assert_eq!(got, Some(bays));
        assert!(dir.path().join("shop-a").join("bays.json").exists());

        storage.delete("bays.json").await?;
        assert!(!storage.exists("bays.json").await?);
        Ok(())
    }

    #[tokio::test]
    async fn clones_share_documents() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory())?;
        let other = storage.clone();
        storage.put_json("jobs.json", &[1, 2, 3]).await?;
        let got: Option<Vec<u32>> = other.get_json("jobs.json").await?;
        assert_eq!(got, Some(vec![1, 2, 3]));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_shape_is_a_json_error() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory())?;
        storage.put_json("bins.json", "text").await?;
        let got = storage.get_json::<Vec<u32>>("bins.json").await;
        assert!(matches!(got, Err(StorageError::Json(_))));
        Ok(())
    }

    #[test]
    fn empty_key_is_rejected() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory())?;
        assert!(matches!(storage.path_for("/"), Err(StorageError::InvalidConfig(_))));
        Ok(())
    }

    #[test]
    fn config_from_vars() -> Result<(), StorageError> {
        let cfg = StorageConfig::from_lookup(lookup(&[]))?;
        assert_eq!(cfg, StorageConfig::filesystem(DEFAULT_FS_ROOT));

        let cfg = StorageConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", " Mem "),
            ("STORAGE_PREFIX", "workshop-1/"),
        ]))?;
        assert_eq!(cfg.backend, Backend::Memory);
        assert_eq!(cfg.prefix.as_deref(), Some("workshop-1/"));

        let err = StorageConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "s3")]));
        assert!(matches!(err, Err(StorageError::InvalidConfig(_))));
        Ok(())
    }
}

//! Directory-backed key/value store, one JSON file per key.
//!
//! File names are the BLAKE3 hex of the key, so any key text is safe to store.
//! Each file carries the original key next to the value; a file whose key
//! does not match (or that fails to decode) reads as absent and lets a lookup
//! chain fall through to the next tier.


use std::fmt;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::StorageError;
use crate::chain::{
    AsyncLookupSource, AsyncRefreshSink, LookupSource, RefreshSink, TierError, TierResult,
};
use crate::hashing::{hash_key_hex, hash_to_u64};

const ENTRY_EXTENSION: &str = "json";

#[derive(Serialize)]
struct EntryRef<'a, V> {
    key: &'a str,
    value: &'a V,
}

#[derive(Deserialize)]
struct Entry<V> {
    key: String,
    value: V,
}

/// Persistent store of `V` values keyed by string.
pub struct DiskStore<V> {
    root: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> DiskStore<V> {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::Io(format!("Failed to create directory {:?}: {}", root, e))
        })?;
        if !root.is_dir() {
            return Err(StorageError::Io(format!("{:?} is not a directory", root)));
        }
        Ok(Self {
            root,
            _value: PhantomData,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file that holds `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", hash_key_hex(key), ENTRY_EXTENSION))
    }

    /// Removes `key`; returns `true` if it existed.
    pub fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(format!("Failed to delete key: {}", e))),
        }
    }

    fn write_encoded(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(key);
        let mut file = NamedTempFile::new_in(&self.root)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to create temp file: {}", e)))?;
        file.write_all(bytes)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        file.flush()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        file.persist(&path)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to persist {:?}: {}", path, e)))?;

        debug!(key_hash = hash_to_u64(key.as_bytes()), "stored entry");
        Ok(path)
    }
}

impl<V: Serialize> DiskStore<V> {
    /// Writes `value` under `key`, replacing any previous value atomically.
    pub fn put(&self, key: &str, value: &V) -> Result<PathBuf, StorageError> {
        let bytes = encode(key, value)?;
        self.write_encoded(key, &bytes)
    }
}

impl<V: DeserializeOwned> DiskStore<V> {
    /// Reads `key`. Missing, corrupt and mismatched entries are `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<V>, StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "Failed to read {:?}: {}",
                    path, e
                )));
            }
        };

        let entry: Entry<V> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to decode entry at {:?}: {}", path, e);
                return Ok(None);
            }
        };

        if entry.key != key {
            warn!(
                key_hash = hash_to_u64(key.as_bytes()),
                found_hash = hash_to_u64(entry.key.as_bytes()),
                "Key mismatch in stored entry"
            );
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    /// `true` only when [`Self::get`] would return a value.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".to_string()));
    }
    Ok(())
}

fn encode<V: Serialize>(key: &str, value: &V) -> Result<Vec<u8>, StorageError> {
    validate_key(key)?;
    serde_json::to_vec(&EntryRef { key, value })
    .map_err(|e| StorageError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl<V> Clone for DiskStore<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> fmt::Debug for DiskStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskStore")
            .field("root", &self.root)
            .finish()
    }
}

impl<V> LookupSource<String, V> for DiskStore<V>
where
    V: DeserializeOwned,
{
    fn lookup(&self, request: &String) -> TierResult<Option<V>> {
        Ok(self.get(request)?)
    }
}

impl<V> RefreshSink<String, V> for DiskStore<V>
where
    V: Serialize,
{
    fn refresh(&self, request: &String, value: &V) -> TierResult<()> {
        self.put(request, value)?;
        Ok(())
    }
}

#[async_trait]
impl<V> AsyncLookupSource<String, V> for DiskStore<V>
where
    V: DeserializeOwned + Send + Sync + 'static,
{
    async fn lookup(&self, request: &String) -> TierResult<Option<V>> {
        let store = self.clone();
        let key = request.clone();

        let found = tokio::task::spawn_blocking(move || store.get(&key))
            .await
            .map_err(|e| TierError::unavailable(format!("disk read task failed: {}", e)))??;
        Ok(found)
    }
}

#[async_trait]
impl<V> AsyncRefreshSink<String, V> for DiskStore<V>
where
    V: Serialize + Send + Sync + 'static,
{
    async fn refresh(&self, request: &String, value: &V) -> TierResult<()> {
        let bytes = encode(request, value)?;
        let store = self.clone();
        let key = request.clone();

        tokio::task::spawn_blocking(move || store.write_encoded(&key, &bytes))
            .await
            .map_err(|e| TierError::unavailable(format!("disk write task failed: {}", e)))??;
        Ok(())
    }
}

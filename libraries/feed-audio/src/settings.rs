//! Persisted settings
//!
//! The coordinator persists exactly one value, the global audio flag, through
//! a string key-value store. Two stores are provided: an in-memory map and a
//! JSON file on disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use feed_audio::settings::{JsonFileSettingsStore, SettingsStore};
//! # async fn example() -> feed_audio::Result<()> {
//! let store = JsonFileSettingsStore::new("/data/app/settings.json");
//! store.set("media.audio_enabled", "true").await?;
//! assert_eq!(store.get("media.audio_enabled").await?.as_deref(), Some("true"));
//! # Ok(())
//! # }
//! ```

use crate::error::{FocusError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

/// String key-value persistence
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value; `Ok(None)` if the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Encode the audio flag for storage
pub fn encode_flag(enabled: bool) -> &'static str {
    if enabled {
        "true"
    } else {
        "false"
    }
}

/// Decode a stored audio flag
///
/// Anything other than `"true"`/`"false"` decodes as `false`.
pub fn decode_flag(key: &str, raw: &str) -> bool {
    match raw.trim() {
        "true" => true,
        "false" => false,
        other => {
            warn!("Unrecognized value {:?} for setting {}, treating as false", other, key);
            false
        }
    }
}

/// In-process settings store
///
/// Nothing survives a restart. Useful for tests and for sessions that should
/// not persist the audio flag.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate one value
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        store
    }

    /// Synchronous read, for assertions
    pub fn value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings stored as a flat JSON object of strings
///
/// A missing file reads as empty. Writes rewrite the whole file; concurrent
/// writes through the same store are serialized.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    write_lock: AsyncMutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                FocusError::Persistence(format!(
                    "Corrupt settings file '{}': {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&values)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

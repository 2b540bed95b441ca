//! # Toggle Persistence
//!
//! Masks are persisted as one integer per channel-set identity in a
//! key/value preference store, under `<prefix><identity>`.
//!
//! [`PreferenceStore`] is the seam to whatever the host uses for developer
//! preferences. Three backends ship with the crate:
//!
//! - [`MemoryPreferences`]: process-local map, nothing survives a restart
//! - [`FilePreferences`]: a flat TOML table on disk
//! - [`NullPreferences`]: no backing store at all; reads yield the default
//!
//! [`ToggleStore`] wraps a backend and never lets its failures escape. The
//! first failed read or write is logged and the store switches to
//! in-memory-only operation for the rest of the process.

use crate::constants::PREF_KEY_PREFIX;
use crate::error::{PreferenceError, PreferenceResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Key/value integer preferences
pub trait PreferenceStore: Send + Sync {
    fn get_int(&self, key: &str, default: u32) -> PreferenceResult<u32>;

    fn set_int(&self, key: &str, value: u32) -> PreferenceResult<()>;

    /// Every key currently stored. Backends that cannot enumerate return nothing.
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Preferences held in process memory
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, u32>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_int(&self, key: &str, default: u32) -> PreferenceResult<u32> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).copied().unwrap_or(default))
    }

    fn set_int(&self, key: &str, value: u32) -> PreferenceResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.keys().cloned().collect()
    }
}

/// No backing store: every read returns the caller's default and writes are dropped
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPreferences;

impl PreferenceStore for NullPreferences {
    fn get_int(&self, _key: &str, default: u32) -> PreferenceResult<u32> {
        Ok(default)
    }

    fn set_int(&self, _key: &str, _value: u32) -> PreferenceResult<()> {
        Ok(())
    }
}

/// Preferences stored as a flat TOML table (`key = integer`).
///
/// The file is read once on [`FilePreferences::open`] and rewritten in full on
/// every [`PreferenceStore::set_int`].
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, i64>>,
}

impl FilePreferences {
    /// Open the file at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> PreferenceResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| PreferenceError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str::<BTreeMap<String, i64>>(&content).map_err(|source| {
                PreferenceError::Parse {
                    path: path.clone(),
                    source,
                }
            })?
        } else {
            BTreeMap::new()
        };

        debug!("Opened preference file {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, values: &BTreeMap<String, i64>) -> PreferenceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(values)?;
        fs::write(&self.path, content).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn get_int(&self, key: &str, default: u32) -> PreferenceResult<u32> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        match values.get(key) {
            Some(&value) => u32::try_from(value).map_err(|_| PreferenceError::OutOfRange {
                key: key.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }

    fn set_int(&self, key: &str, value: u32) -> PreferenceResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), i64::from(value));
        self.write_file(&values)
    }

    fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.keys().cloned().collect()
    }
}

/// Loads and saves one mask per channel-set identity
pub struct ToggleStore {
    backend: Arc<dyn PreferenceStore>,
    prefix: String,
    degraded: AtomicBool,
}

impl ToggleStore {
    /// Store over `backend` using the default `ppref_` key prefix
    pub fn new(backend: Arc<dyn PreferenceStore>) -> Self {
        Self::with_prefix(backend, PREF_KEY_PREFIX)
    }

    pub fn with_prefix(backend: Arc<dyn PreferenceStore>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Store that remembers nothing beyond the registry's own memory
    pub fn detached() -> Self {
        Self::new(Arc::new(NullPreferences))
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPreferences::new()))
    }

    /// Store that starts in in-memory-only mode, for when the backend could not be opened
    pub fn degraded(prefix: impl Into<String>) -> Self {
        let store = Self::with_prefix(Arc::new(NullPreferences), prefix);
        store.degraded.store(true, Ordering::Release);
        store
    }

    /// Full preference key of `identity`
    pub fn key(&self, identity: &str) -> String {
        format!("{}{}", self.prefix, identity)
    }

    /// True once a backend failure switched this store to in-memory-only mode
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Persisted mask for `identity`, or 0 when nothing is stored or the backend fails
    pub fn load(&self, identity: &str) -> u32 {
        if self.is_degraded() {
            return 0;
        }
        let key = self.key(identity);
        match self.backend.get_int(&key, 0) {
            Ok(mask) => mask,
            Err(e) => {
                self.degrade(&key, &e);
                0
            }
        }
    }

    /// Persist `mask` for `identity`. Failures degrade the store instead of returning.
    pub fn save(&self, identity: &str, mask: u32) {
        if self.is_degraded() {
            return;
        }
        let key = self.key(identity);
        if let Err(e) = self.backend.set_int(&key, mask) {
            self.degrade(&key, &e);
        }
    }

    /// Identities with a persisted value under this store's prefix
    pub fn persisted_identities(&self) -> Vec<String> {
        if self.is_degraded() {
            return Vec::new();
        }
        self.backend
            .keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .filter(|identity| !identity.is_empty())
            .collect()
    }

    fn degrade(&self, key: &str, error: &PreferenceError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!("Preference store failed on {}: {}; toggles are now in-memory only", key, error);
        }
    }
}

impl std::fmt::Debug for ToggleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleStore")
            .field("prefix", &self.prefix)
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}

//! Key/value persistence for view state.
//!
//! Four independently-keyed JSON blobs, one per state slice. Reads treat
//! absent and corrupt identically (defaults win); the distinction is kept
//! observable through [`SliceOutcome`] so the caller can log corruption.
//! Writes never propagate as state-mutation failures: a failed write is
//! recorded on the store and picked up for logging afterwards.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage keys, one per persisted state slice.
pub mod keys {
    /// Filter blob.
    pub const FILTER: &str = "filter";
    /// One-table display toggle.
    pub const SHOW_ONE_TABLE: &str = "show_one_table";
    /// Dashboard visibility toggle.
    pub const SHOW_DASHBOARD: &str = "show_dashboard";
    /// Sort state blob.
    pub const SORT_ORDER: &str = "sort_order";
}

/// Minimal string store contract.
pub trait KeyValueStore {
    /// Stored value for `key`, `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. Failures are swallowed here and surfaced
    /// through [`KeyValueStore::take_write_error`].
    fn set(&mut self, key: &str, value: &str);

    /// The most recent write failure, cleared by taking it.
    fn take_write_error(&mut self) -> Option<String> {
        None
    }
}

/// Outcome of rehydrating one typed slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceOutcome<T> {
    /// Key present and decoded.
    Loaded(T),
    /// Key absent; defaults apply.
    Missing,
    /// Key present but undecodable; defaults apply.
    Corrupt {
        /// Decoder message, for the diagnostics log.
        details: String,
    },
}

impl<T: Default> SliceOutcome<T> {
    /// Collapse to a usable value, substituting defaults where needed.
    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::Missing | Self::Corrupt { .. } => T::default(),
        }
    }
}

impl<T> SliceOutcome<T> {
    /// Collapse to a usable value with an explicit fallback, for slices
    /// whose resting default is not `T::default()`.
    #[must_use]
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::Missing | Self::Corrupt { .. } => default,
        }
    }

    /// Decoder details when the stored blob was corrupt.
    #[must_use]
    pub fn corrupt_details(&self) -> Option<&str> {
        match self {
            Self::Corrupt { details } => Some(details),
            _ => None,
        }
    }
}

/// Read and decode one slice.
pub fn load_slice<T, S>(store: &S, key: &str) -> SliceOutcome<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        None => SliceOutcome::Missing,
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => SliceOutcome::Loaded(value),
            Err(err) => SliceOutcome::Corrupt {
                details: err.to_string(),
            },
        },
    }
}

/// Encode and store one slice.
pub fn store_slice<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    if let Ok(raw) = serde_json::to_string(value) {
        store.set(key, &raw);
    }
}

// ──────────────────── in-memory store ────────────────────

/// HashMap-backed store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
    write_error: Option<String>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, for failure-path tests.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.fail_writes {
            self.write_error = Some(format!("injected write failure for key {key}"));
            return;
        }
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn take_write_error(&mut self) -> Option<String> {
        self.write_error.take()
    }
}

// ──────────────────── file-backed store ────────────────────

/// Directory-backed store: one `<key>.json` file per key, written atomically
/// (temp file, fsync, rename).
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_error: Option<String>,
}

impl FileStore {
    /// Store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_error: None,
        }
    }

    /// Backing file for one key.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn write_atomic(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(err) = self.write_atomic(key, value) {
            self.write_error = Some(format!("{key}: {err}"));
        }
    }

    fn take_write_error(&mut self) -> Option<String> {
        self.write_error.take()
    }
}

//! Durable storage for the license registry.
//!
//! The registry mirrors its whole state through a [`LicenseStore`] after every
//! mutation. The on-disk format is a pretty-printed JSON array:
//!
//! ```json
//! [
//!   {
//!     "key": "EyesShield-550e8400-e29b-41d4-a716-446655440000",
//!     "expiryDate": "2025-01-01T12:00:00Z"
//!   }
//! ]
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::errors::{LicenseError, LicenseResult};
use crate::registry::License;

/// Persistence collaborator for [`crate::registry::Registry`].
pub trait LicenseStore: Send + Sync {
    /// Read the persisted licenses.
    ///
    /// Returns:
    /// - `Ok(Some(licenses))` if stored state exists and is well formed.
    /// - `Ok(None)` if nothing has been stored yet.
    /// - `Err(_)` if the state cannot be read or is malformed.
    fn load(&self) -> LicenseResult<Option<Vec<License>>>;

    /// Replace the persisted state with `licenses`.
    fn save(&self, licenses: &[License]) -> LicenseResult<()>;

    /// Human-readable location, used in log messages.
    fn location(&self) -> String;
}

/// Stores licenses in a single JSON file, rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LicenseStore for JsonFileStore {
    fn load(&self) -> LicenseResult<Option<Vec<License>>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LicenseError::StorageError(e)),
        };

        let licenses: Vec<License> = serde_json::from_str(&data)?;
        debug!(
            "Read {} licenses from {}",
            licenses.len(),
            self.path.display()
        );
        Ok(Some(licenses))
    }

    fn save(&self, licenses: &[License]) -> LicenseResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(licenses)?;
        fs::write(&self.path, json)?;
        debug!("Wrote {} licenses to {}", licenses.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store holding the serialized JSON, for tests and embedding.
///
/// Clones share the same contents, so a test can keep a handle to inspect
/// what the registry wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Arc<Mutex<Option<String>>>,
    saves: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw (possibly malformed) persisted content.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::default();
        *store.lock() = Some(contents.into());
        store
    }

    /// The last content written, if any.
    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LicenseStore for MemoryStore {
    fn load(&self) -> LicenseResult<Option<Vec<License>>> {
        match self.lock().as_deref() {
            Some(data) => Ok(Some(serde_json::from_str(data)?)),
            None => Ok(None),
        }
    }

    fn save(&self, licenses: &[License]) -> LicenseResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LicenseError::StorageError(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "memory store is read-only",
            )));
        }

        let json = serde_json::to_string_pretty(licenses)?;
        *self.lock() = Some(json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<License> {
        vec![License {
            key: "EyesShield-550e8400-e29b-41d4-a716-446655440000".to_string(),
            expiry_date: Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap(),
        }]
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("licenses.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("licenses.json"));

        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn file_store_writes_expected_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("licenses.json"));
        store.save(&sample()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"key\""));
        assert!(raw.contains("\"expiryDate\": \"2030-01-02T03:04:05Z\""));
    }

    #[test]
    fn file_store_accepts_millisecond_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licenses.json");
        fs::write(
            &path,
            r#"[{"key":"EyesShield-a","expiryDate":"2030-01-02T03:04:05.000Z"}]"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded[0].expiry_date, sample()[0].expiry_date);
    }

    #[test]
    fn malformed_content_is_an_error() {
        for raw in ["not json", r#"{"key":"x"}"#, r#"[{"key":"x"}]"#] {
            let store = MemoryStore::with_contents(raw);
            assert!(
                matches!(store.load(), Err(LicenseError::SerializationError(_))),
                "expected '{raw}' to be rejected"
            );
        }
    }

    #[test]
    fn memory_store_counts_saves_and_can_fail() {
        let store = MemoryStore::new();
        store.save(&sample()).unwrap();
        assert_eq!(store.save_count(), 1);

        store.set_fail_writes(true);
        assert!(matches!(
            store.save(&sample()),
            Err(LicenseError::StorageError(_))
        ));
        assert_eq!(store.save_count(), 1);
    }
}

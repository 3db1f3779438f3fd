//! File-backed coordinate cache
//!
//! Keeps the cache table in a JSON file, by default in the XDG data
//! directory (~/.local/share/geo-distance/). Entries are loaded once on open
//! and the file is rewritten after every insert.

use crate::config::defaults::{APP_DIR_NAME, CACHE_FILE_NAME};
use crate::error::{Error, Result};
use crate::store::{CacheEntry, CacheStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// JSON file cache store
#[derive(Debug)]
pub struct JsonCacheStore {
    entries: Mutex<Vec<CacheEntry>>,
    path: PathBuf,
}

impl JsonCacheStore {
    /// Get the default cache file path
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join(APP_DIR_NAME).join(CACHE_FILE_NAME))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }

    /// Open the cache at the default path
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open the cache at a specific path
    ///
    /// A missing file is an empty cache; it is created on first insert.
    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Store(format!("Failed to read cache file: {}", e))
            })?;

            serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("Failed to parse cache file: {}", e))
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: Mutex::new(entries),
            path,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn save(&self, entries: &[CacheEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("Failed to create cache directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(entries)?;

        fs::write(&self.path, content).map_err(|e| {
            Error::Store(format!("Failed to write cache file: {}", e))
        })?;

        Ok(())
    }
}

impl CacheStore for JsonCacheStore {
    fn find(&self, search: &str, country: &str) -> Result<Option<CacheEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Store("Cache lock poisoned".to_string()))?;

        Ok(entries
            .iter()
            .find(|e| e.search == search && e.country == country)
            .cloned())
    }

    fn insert(&self, entry: CacheEntry) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Store("Cache lock poisoned".to_string()))?;

        entries.push(entry);
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinates;
    use tempfile::TempDir;

    fn create_test_store() -> (JsonCacheStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache").join("coordinate_cache.json");
        let store = JsonCacheStore::open(path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_empty_store() {
        let (store, _temp) = create_test_store();
        assert!(store.is_empty());
        assert!(store.find("Berlin", "DE").unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_insert_persists() {
        let (store, _temp) = create_test_store();
        store
            .insert(CacheEntry::new("Berlin", "DE", Coordinates::new(52.52, 13.405), "provider:openstreetmap"))
            .unwrap();
        assert!(store.path().exists());

        let reopened = JsonCacheStore::open(store.path().to_path_buf()).unwrap();
        assert_eq!(reopened.len(), 1);

        let hit = reopened.find("Berlin", "DE").unwrap().unwrap();
        assert_eq!(hit.geo_lat, 52.52);
        assert_eq!(hit.geo_long, 13.405);
        assert_eq!(hit.provenance, "provider:openstreetmap");
    }

    #[test]
    fn test_exact_match_only() {
        let (store, _temp) = create_test_store();
        store
            .insert(CacheEntry::new("Main St 1", "", Coordinates::new(1.0, 2.0), "p"))
            .unwrap();

        assert!(store.find("Main St 1", "").unwrap().is_some());
        assert!(store.find("main st 1", "").unwrap().is_none());
        assert!(store.find("Main St 1", "US").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(&path, "not json").unwrap();
        assert!(JsonCacheStore::open(path).is_err());
    }
}

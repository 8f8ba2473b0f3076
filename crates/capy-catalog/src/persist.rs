//! Flat key/value settings stored as a JSON object on disk.

use crate::error::Result;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// String keyed JSON store. Every write is flushed to disk immediately.
#[derive(Debug, Default)]
pub struct JsonStore {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl JsonStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring corrupt store {}: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };

        Self {
            path: Some(path),
            values,
        }
    }

    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read and decode `key`. Values that fail to decode read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Store key '{}' has unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.insert(key, value)?;
        self.flush()
    }

    /// Like `set` but without writing to disk. Call `flush` afterwards.
    pub fn insert<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        self.flush()
    }

    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.values)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = JsonStore::open(&path);
        store.set("list", &vec!["a", "b"]).unwrap();
        store.set("version", &"1.0").unwrap();
        store.remove("version").unwrap();

        let reopened = JsonStore::open(&path);
        assert_eq!(reopened.get::<Vec<String>>("list").unwrap(), ["a", "b"]);
        assert!(!reopened.contains("version"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonStore::open(&path);
        assert!(!store.contains("list"));
    }

    #[test]
    fn test_wrong_shape_reads_none() {
        let mut store = JsonStore::in_memory();
        store.set("flag", &true).unwrap();
        assert_eq!(store.get::<String>("flag"), None);
        assert_eq!(store.get::<bool>("flag"), Some(true));
    }
}

use crate::error::{DashboardError, Result};
use crate::schema::Dataset;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_KEY: &str = "mos_data_v1";

/// Persistence seam for the session's dataset.
///
/// `load` never fails: a missing, unparsable or non-array entry reads as `None`
/// and the caller falls back to baseline data.
pub trait DatasetStore {
    /// Key the dataset is persisted under.
    fn key(&self) -> &str;
    fn load(&self) -> Option<Dataset>;
    fn save(&mut self, dataset: &Dataset) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Decodes a persisted value, returning `None` for anything that is not a JSON
/// array of records.
pub fn decode_persisted(raw: &str) -> Option<Dataset> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Persisted dataset is not valid JSON, ignoring it: {}", e);
            return None;
        }
    };

    if !value.is_array() {
        warn!("Persisted dataset is not an array, ignoring it");
        return None;
    }

    match serde_json::from_value::<Dataset>(value) {
        Ok(dataset) => Some(dataset),
        Err(e) => {
            warn!("Persisted dataset has malformed records, ignoring it: {}", e);
            None
        }
    }
}

/// Key-value store held in memory, the stand-in for browser local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    key: String,
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: HashMap::new(),
        }
    }

    /// Seeds the entry with an arbitrary raw value, valid or not.
    pub fn with_raw(key: impl Into<String>, raw: impl Into<String>) -> Self {
        let key = key.into();
        let mut entries = HashMap::new();
        entries.insert(key.clone(), raw.into());
        Self { key, entries }
    }

    pub fn raw(&self) -> Option<&str> {
        self.entries.get(&self.key).map(String::as_str)
    }
}

impl DatasetStore for MemoryStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Option<Dataset> {
        self.raw().and_then(decode_persisted)
    }

    fn save(&mut self, dataset: &Dataset) -> Result<()> {
        let json = serde_json::to_string(dataset)?;
        self.entries.insert(self.key.clone(), json);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.remove(&self.key);
        Ok(())
    }
}

/// Stores the dataset as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    key: String,
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            key: key.to_string(),
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetStore for JsonFileStore {
    fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Option<Dataset> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode_persisted(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No persisted dataset at {}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Could not read {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&mut self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers never observe a partially written file.
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(dataset)?;
        fs::write(&tmp, json).map_err(|e| {
            DashboardError::Storage(format!("writing {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            DashboardError::Storage(format!("replacing {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DashboardError::Storage(format!(
                "removing {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

//! Durable user preferences shared by every list screen.
//!
//! Only the page size is remembered today. The store is an injected service
//! so tests get an isolated instance instead of touching the user's file.

use crate::config::ConfigError;
use log::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Preference key holding the page size of list screens.
pub const PAGE_SIZE_KEY: &str = "carbure:page-size";

/// Page sizes offered by list screens.
pub const PAGE_SIZES: &[u32] = &[10, 25, 50, 100];

/// Page size used when no preference has been stored.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Key/value storage surviving across screens and runs.
///
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String) -> Result<(), ConfigError>;

    /// Return the remembered page size if it is still a supported one.
    ///
    fn page_size(&self) -> Option<u32> {
        self.get(PAGE_SIZE_KEY)
            .and_then(|value| value.parse().ok())
            .filter(|size| PAGE_SIZES.contains(size))
    }

    fn set_page_size(&self, size: u32) -> Result<(), ConfigError> {
        self.set(PAGE_SIZE_KEY, size.to_string())
    }
}

/// Preferences kept in memory for the lifetime of the process.
///
#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), ConfigError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
        Ok(())
    }
}

/// Preferences stored as a YAML map in a single file.
///
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Open the preference file at the given path. A missing file yields an
    /// empty store; it is created on the first write.
    ///
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
                path: path.clone(),
                message: format!("IO error: {}", e),
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&contents)
                    .map_err(|e| ConfigError::DeserializationFailed(e.to_string()))?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Loaded {} preference(s) from {}", values.len(), path.display());
        Ok(FilePreferences {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(values)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::CreateDirectoryFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        fs::write(&self.path, content).map_err(|e| ConfigError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), ConfigError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = values.clone();
        updated.insert(key.to_owned(), value);
        self.write(&updated)?;
        *values = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_page_size_round_trip() {
        let preferences = MemoryPreferences::new();
        assert_eq!(preferences.page_size(), None);
        preferences.set_page_size(50).unwrap();
        assert_eq!(preferences.page_size(), Some(50));
        assert_eq!(preferences.get(PAGE_SIZE_KEY).as_deref(), Some("50"));
    }

    #[test]
    fn unsupported_stored_page_size_is_ignored() {
        let preferences = MemoryPreferences::new();
        preferences.set(PAGE_SIZE_KEY, "33".into()).unwrap();
        assert_eq!(preferences.page_size(), None);
        preferences.set(PAGE_SIZE_KEY, "lots".into()).unwrap();
        assert_eq!(preferences.page_size(), None);
    }

    #[test]
    fn file_preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.yml");

        let preferences = FilePreferences::open(&path).unwrap();
        assert_eq!(preferences.page_size(), None);
        preferences.set_page_size(25).unwrap();
        assert!(path.exists());

        let reopened = FilePreferences::open(&path).unwrap();
        assert_eq!(reopened.page_size(), Some(25));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(PAGE_SIZE_KEY));
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let preferences = FilePreferences::open(blocker.join("preferences.yml")).unwrap();
        assert!(matches!(
            preferences.set_page_size(25),
            Err(ConfigError::SaveFailed { .. })
        ));
        assert_eq!(preferences.page_size(), None);
    }

    #[test]
    fn file_preferences_reject_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.yml");
        fs::write(&path, "- not\n- a map\n").unwrap();
        assert!(matches!(
            FilePreferences::open(&path),
            Err(ConfigError::DeserializationFailed(_))
        ));
    }
}

//! Filesystem-backed loader and profile store for the tester.
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use flagquest_game::constants::RULES_CONFIG_NAME;
use flagquest_game::{CountryCatalog, DataLoader, PlayerStorage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Serves the bundled catalog and, optionally, a rules override file.
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    rules_path: Option<PathBuf>,
}

impl AssetLoader {
    #[must_use]
    pub const fn new(rules_path: Option<PathBuf>) -> Self {
        Self { rules_path }
    }
}

impl DataLoader for AssetLoader {
    type Error = StorageError;

    fn load_catalog(&self) -> Result<CountryCatalog, Self::Error> {
        Ok(CountryCatalog::builtin().clone())
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let (path, raw) = match (&self.rules_path, config_name) {
            (Some(path), RULES_CONFIG_NAME) => {
                let raw = fs::read_to_string(path).map_err(|err| StorageError::io(path, err))?;
                (path.clone(), raw)
            }
            _ => (PathBuf::from(config_name), "{}".to_string()),
        };
        serde_json::from_str(&raw).map_err(|source| StorageError::Parse { path, source })
    }
}

/// Where the player record lives during a run.
#[derive(Debug)]
pub enum ProfileStore {
    /// Fresh for every simulation; optionally seeded with a record.
    Memory(RefCell<Option<String>>),
    /// `<dir>/<key>.json`, shared by every simulation of the run.
    Disk(PathBuf),
}

impl ProfileStore {
    #[must_use]
    pub const fn memory(seed: Option<String>) -> Self {
        Self::Memory(RefCell::new(seed))
    }

    fn path_for(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{key}.json"))
    }
}

impl PlayerStorage for ProfileStore {
    type Error = StorageError;

    fn save_record(&self, key: &str, raw: &str) -> Result<(), Self::Error> {
        match self {
            Self::Memory(slot) => {
                *slot.borrow_mut() = Some(raw.to_string());
                Ok(())
            }
            Self::Disk(dir) => {
                fs::create_dir_all(dir).map_err(|err| StorageError::io(dir, err))?;
                let path = Self::path_for(dir, key);
                fs::write(&path, raw).map_err(|err| StorageError::io(&path, err))
            }
        }
    }

    fn load_record(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match self {
            Self::Memory(slot) => Ok(slot.borrow().clone()),
            Self::Disk(dir) => {
                let path = Self::path_for(dir, key);
                match fs::read_to_string(&path) {
                    Ok(raw) => Ok(Some(raw)),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                    Err(err) => Err(StorageError::io(&path, err)),
                }
            }
        }
    }

    fn delete_record(&self, key: &str) -> Result<(), Self::Error> {
        match self {
            Self::Memory(slot) => {
                slot.borrow_mut().take();
                Ok(())
            }
            Self::Disk(dir) => {
                let path = Self::path_for(dir, key);
                match fs::remove_file(&path) {
                    Err(err) if err.kind() != io::ErrorKind::NotFound => {
                        Err(StorageError::io(&path, err))
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagquest_game::RulesConfig;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "flagquest-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn disk_store_round_trips_and_deletes() {
        let dir = temp_dir("disk");
        let store = ProfileStore::Disk(dir.clone());
        assert_eq!(store.load_record("flagquest_user").unwrap(), None);
        store.save_record("flagquest_user", r#"{"xp":5}"#).unwrap();
        assert_eq!(
            store.load_record("flagquest_user").unwrap().as_deref(),
            Some(r#"{"xp":5}"#)
        );
        store.delete_record("flagquest_user").unwrap();
        store.delete_record("flagquest_user").unwrap();
        assert_eq!(store.load_record("flagquest_user").unwrap(), None);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn rules_file_overrides_defaults() {
        let dir = temp_dir("rules");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rules.json");
        fs::write(&path, r#"{"timed_seconds": 20}"#).unwrap();

        let rules: RulesConfig = AssetLoader::new(Some(path.clone()))
            .load_config(RULES_CONFIG_NAME)
            .unwrap();
        assert_eq!(rules.timed_seconds, 20);
        assert_eq!(rules.questions_per_session, 10);

        let defaults: RulesConfig = AssetLoader::default().load_config(RULES_CONFIG_NAME).unwrap();
        assert_eq!(defaults, RulesConfig::default());

        fs::write(&path, "{oops").unwrap();
        let broken: Result<RulesConfig, _> =
            AssetLoader::new(Some(path)).load_config(RULES_CONFIG_NAME);
        assert!(matches!(broken, Err(StorageError::Parse { .. })));
        let _ = fs::remove_dir_all(dir);
    }
}

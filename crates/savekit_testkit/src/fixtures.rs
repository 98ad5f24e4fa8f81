//! Test fixtures: scratch save directories and sample record types.

use savekit_core::{BackendId, BackendRegistry, Config, RegistryBuilder};
use savekit_storage::InMemoryKeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A player profile, the canonical small record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Best score.
    pub score: u32,
}

impl Profile {
    /// Creates a profile.
    pub fn new(name: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Player-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Master volume, 0 to 100.
    pub volume: u8,
    /// Whether the game runs fullscreen.
    pub fullscreen: bool,
    /// UI language tag.
    pub language: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            volume: 80,
            fullscreen: true,
            language: "en".to_string(),
        }
    }
}

/// Progress through the game, with nested collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    /// Last checkpoint reached.
    pub checkpoint: String,
    /// Items carried.
    pub inventory: Vec<String>,
    /// Total play time in seconds.
    pub play_time_secs: u64,
}

impl PlayerProgress {
    /// A mid-game sample.
    pub fn sample() -> Self {
        Self {
            checkpoint: "forest_gate".to_string(),
            inventory: vec!["sword".to_string(), "lantern".to_string()],
            play_time_secs: 5_400,
        }
    }
}

/// A scratch save root with automatic cleanup.
pub struct TempSaveDir {
    config: Config,
    _temp_dir: TempDir,
}

impl TempSaveDir {
    /// Creates an empty scratch root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            config: Config::with_root(temp_dir.path()),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the root directory.
    pub fn path(&self) -> &Path {
        self.config.root()
    }

    /// Returns a configuration rooted here.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Returns the path a plain file backend uses for `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.config
            .saves_dir()
            .join(format!("{key}.{}", self.config.file_extension))
    }

    /// Returns the path an encrypted file backend uses for `key`.
    pub fn encrypted_record_path(&self, key: &str) -> PathBuf {
        self.config
            .encrypted_saves_dir()
            .join(format!("{key}.{}", self.config.file_extension))
    }

    /// Reads the raw contents of a plain record file.
    pub fn read_record(&self, key: &str) -> String {
        fs::read_to_string(self.record_path(key)).expect("Failed to read record file")
    }

    /// Overwrites a plain record file with `contents`, bypassing any backend.
    pub fn write_raw(&self, key: &str, contents: &str) {
        let path = self.record_path(key);
        fs::create_dir_all(path.parent().expect("record path has a parent"))
            .expect("Failed to create saves directory");
        fs::write(path, contents).expect("Failed to write record file");
    }

    /// Builds a registry with all four standard backends over this root.
    ///
    /// Both key/value backends share the returned in-memory store.
    pub fn full_registry<T>(&self) -> (BackendRegistry<T>, Arc<InMemoryKeyValueStore>)
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let registry = RegistryBuilder::new(self.config())
            .json_file(BackendId::JSON_FILE)
            .key_value(BackendId::KEY_VALUE, Arc::clone(&store))
            .encrypted_json_file(BackendId::ENCRYPTED_FILE)
            .encrypted_key_value(BackendId::ENCRYPTED_KEY_VALUE, Arc::clone(&store))
            .encryption_from_config()
            .expect("Failed to open encryption key")
            .build()
            .expect("Failed to build registry");
        (registry, store)
    }
}

impl Default for TempSaveDir {
    fn default() -> Self {
        Self::new()
    }
}

//! SaveKit configuration.

use std::path::{Path, PathBuf};

/// Directory name appended to the platform data directory by default.
const APP_DIR: &str = "savekit";

/// Configuration for where and how records are persisted.
///
/// ```text
/// <root>/
/// ├─ Saves/                  # JsonFileBackend records, one <key>.json per key
/// │  └─ profile.json
/// ├─ EncryptedSaves/         # encrypted file records, same layout
/// │  └─ profile.json
/// ├─ encryption_key.dat      # base64 AES-256 key, created on first use
/// └─ encryption_key.dat.lock # advisory lock guarding key generation
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory holding everything SaveKit writes.
    pub root: PathBuf,

    /// Name of the record directory under `root`.
    pub saves_dir_name: String,

    /// Name of the encrypted record directory under `root`.
    pub encrypted_dir_name: String,

    /// Extension of record files, without the leading dot.
    pub file_extension: String,

    /// Name of the key file under `root`.
    pub key_file_name: String,

    /// Whether file records are written as indented JSON.
    pub pretty_json: bool,

    /// Prefix for key/value entries, if any.
    pub kv_namespace: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let root = dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR));
        Self::with_root(root)
    }
}

impl Config {
    /// Creates a configuration rooted at the platform data directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration rooted at `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            saves_dir_name: "Saves".to_string(),
            encrypted_dir_name: "EncryptedSaves".to_string(),
            file_extension: savekit_storage::DEFAULT_EXTENSION.to_string(),
            key_file_name: "encryption_key.dat".to_string(),
            pretty_json: true,
            kv_namespace: None,
        }
    }

    /// Sets the record directory name.
    #[must_use]
    pub fn saves_dir_name(mut self, name: impl Into<String>) -> Self {
        self.saves_dir_name = name.into();
        self
    }

    /// Sets the encrypted record directory name.
    #[must_use]
    pub fn encrypted_dir_name(mut self, name: impl Into<String>) -> Self {
        self.encrypted_dir_name = name.into();
        self
    }

    /// Sets the record file extension.
    #[must_use]
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Sets the key file name.
    #[must_use]
    pub fn key_file_name(mut self, name: impl Into<String>) -> Self {
        self.key_file_name = name.into();
        self
    }

    /// Sets whether file records are indented.
    #[must_use]
    pub fn pretty_json(mut self, value: bool) -> Self {
        self.pretty_json = value;
        self
    }

    /// Sets the key/value namespace.
    #[must_use]
    pub fn kv_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.kv_namespace = Some(namespace.into());
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding file records.
    #[must_use]
    pub fn saves_dir(&self) -> PathBuf {
        self.root.join(&self.saves_dir_name)
    }

    /// Returns the directory holding encrypted file records.
    #[must_use]
    pub fn encrypted_saves_dir(&self) -> PathBuf {
        self.root.join(&self.encrypted_dir_name)
    }

    /// Returns the path of the encryption key file.
    #[must_use]
    pub fn key_file(&self) -> PathBuf {
        self.root.join(&self.key_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let config = Config::with_root("/data/game");
        assert_eq!(config.saves_dir(), PathBuf::from("/data/game/Saves"));
        assert_eq!(
            config.encrypted_saves_dir(),
            PathBuf::from("/data/game/EncryptedSaves")
        );
        assert_eq!(
            config.key_file(),
            PathBuf::from("/data/game/encryption_key.dat")
        );
        assert_eq!(config.file_extension, "json");
        assert!(config.pretty_json);
        assert!(config.kv_namespace.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::with_root("/tmp/x")
            .saves_dir_name("slots")
            .file_extension("sav")
            .pretty_json(false)
            .kv_namespace("prefs");

        assert_eq!(config.saves_dir(), PathBuf::from("/tmp/x/slots"));
        assert_eq!(config.file_extension, "sav");
        assert!(!config.pretty_json);
        assert_eq!(config.kv_namespace.as_deref(), Some("prefs"));
    }

    #[test]
    fn default_root_ends_with_app_dir() {
        assert!(Config::default().root().ends_with(APP_DIR));
    }
}

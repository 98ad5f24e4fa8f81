//! String key/value stores consumed by [`crate::KeyValueBackend`].

use crate::error::{StorageError, StorageResult};
use crate::file::persist_atomically;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flat store of string values addressed by string keys.
///
/// This is the capability a preferences store offers: no checksums, no
/// namespacing, no enumeration. Writes may be buffered until
/// [`flush`](Self::flush).
pub trait KeyValueStore: Send + Sync {
    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Returns the value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    /// Returns true if `key` has a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn has_key(&self, key: &str) -> StorageResult<bool>;

    /// Removes `key`. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the removal.
    fn delete_key(&self, key: &str) -> StorageResult<()>;

    /// Makes all buffered writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    fn flush(&self) -> StorageResult<()>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_string(key, value)
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_string(key)
    }

    fn has_key(&self, key: &str) -> StorageResult<bool> {
        (**self).has_key(key)
    }

    fn delete_key(&self, key: &str) -> StorageResult<()> {
        (**self).delete_key(key)
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }
}

/// A process-local key/value store.
///
/// Nothing survives the process; `flush` is a no-op. Useful for tests
/// and for sharing one store between several backends.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a sorted copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn has_key(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn delete_key(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// A key/value store persisted as a single JSON object on disk.
///
/// Reads and writes hit an in-memory map; [`flush`](KeyValueStore::flush)
/// rewrites the whole file through a temporary file and a rename, so the
/// file on disk is always either the old map or the new one. Flushes are
/// serialized; a flush returns only once a snapshot at least as new as its
/// caller's writes is on disk.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    dirty: AtomicBool,
    flush_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`, loading existing entries if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if the file is not a JSON object of
    /// strings, or an I/O error if it cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                StorageError::corrupted(path.display().to_string(), e.to_string())
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened key/value store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> io::Result<()> {
        let text = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)?
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        persist_atomically(dir, &self.path, &text)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.write().insert(key.to_owned(), value.to_owned());
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn has_key(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn delete_key(&self, key: &str) -> StorageResult<()> {
        if self.entries.write().remove(key).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let _guard = self.flush_lock.lock();
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.persist() {
            self.dirty.store(true, Ordering::Release);
            tracing::error!(path = %self.path.display(), error = %e, "failed to flush key/value store");
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), "flushed key/value store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_set_get_delete() {
        let store = InMemoryKeyValueStore::new();
        store.set_string("volume", "80").unwrap();

        assert!(store.has_key("volume").unwrap());
        assert_eq!(store.get_string("volume").unwrap().as_deref(), Some("80"));

        store.delete_key("volume").unwrap();
        assert!(!store.has_key("volume").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn memory_delete_missing_is_noop() {
        let store = InMemoryKeyValueStore::new();
        assert!(store.delete_key("missing").is_ok());
    }

    #[test]
    fn file_store_persists_on_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        {
            let store = FileKeyValueStore::open(&path).unwrap();
            store.set_string("volume", "80").unwrap();
            assert!(!path.exists());
            store.flush().unwrap();
        }

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get_string("volume").unwrap().as_deref(), Some("80"));
    }

    #[test]
    fn file_store_unflushed_writes_are_lost() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        {
            let store = FileKeyValueStore::open(&path).unwrap();
            store.set_string("a", "1").unwrap();
            store.flush().unwrap();
            store.set_string("b", "2").unwrap();
        }

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert!(reopened.has_key("a").unwrap());
        assert!(!reopened.has_key("b").unwrap());
    }

    #[test]
    fn file_store_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.set_string("a", "1").unwrap();
        store.flush().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        let result = FileKeyValueStore::open(&path);
        assert!(matches!(result, Err(StorageError::Corrupted { .. })));
    }

    #[test]
    fn file_store_concurrent_flushes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = Arc::new(FileKeyValueStore::open(&path).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for round in 0..25 {
                        store
                            .set_string(&format!("w{writer}_{round}"), "1")
                            .unwrap();
                        store.flush().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert!(reopened.has_key("w0_24").unwrap());
        assert!(reopened.has_key("w3_24").unwrap());
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn shared_through_arc() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let handle = Arc::clone(&store);
        handle.set_string("k", "v").unwrap();
        assert_eq!(store.len(), 1);
    }
}

//! Backend over a string key/value store.

use crate::backend::{validate_key, Backend};
use crate::error::{StorageError, StorageResult};
use crate::kv_store::KeyValueStore;
use parking_lot::Mutex;
use savekit_codec::{Codec, CodecError, JsonCodec};
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// Name of the entry listing every key the backend has stored.
pub const INDEX_ENTRY: &str = "__savekit_keys__";

/// Joins a namespace and a key. Keys may never contain it, so
/// `<namespace>/<key>` cannot be produced by any other backend's key.
pub const NAMESPACE_SEPARATOR: char = '/';

/// A backend storing serialized values in a [`KeyValueStore`].
///
/// # Integrity
///
/// Unlike [`crate::JsonFileBackend`], entries carry **no checksum**. The
/// store is trusted to return exactly what was written; a value that no
/// longer deserializes is still reported as [`StorageError::Corrupted`],
/// but silent bit-level damage that happens to stay valid JSON is not
/// detected. This weaker guarantee is deliberate and should not be relied
/// on for tamper detection.
///
/// # Namespacing
///
/// The store is shared and flat. With a namespace set, entries are stored
/// under `<namespace>/<key>`. [`validate_key`] rejects `/`, so a backend
/// without a namespace never reaches into a namespaced one, and two
/// namespaces only meet if they are equal. Either way an index entry tracks
/// every key this backend wrote, so [`delete_all`](Backend::delete_all)
/// removes only those.
///
/// # Failed writes
///
/// `save` reads the index before touching the entry, so an unreadable
/// index fails the save without leaving an untracked entry behind.
#[derive(Debug)]
pub struct KeyValueBackend<T, S, C = JsonCodec> {
    store: S,
    namespace: Option<String>,
    codec: C,
    index_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> KeyValueBackend<T, S, JsonCodec> {
    /// Creates a backend writing compact JSON into `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_codec(store, JsonCodec::compact())
    }
}

impl<T, S, C> KeyValueBackend<T, S, C> {
    /// Creates a backend using a custom codec.
    #[must_use]
    pub fn with_codec(store: S, codec: C) -> Self {
        Self {
            store,
            namespace: None,
            codec,
            index_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Prefixes every entry with `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Returns the namespace, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the store key used for `key`.
    #[must_use]
    pub fn entry_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}{NAMESPACE_SEPARATOR}{key}"),
            None => key.to_owned(),
        }
    }

    fn index_key(&self) -> String {
        self.entry_key(INDEX_ENTRY)
    }

    fn check_key(key: &str) -> StorageResult<()> {
        validate_key(key)?;
        if key == INDEX_ENTRY {
            return Err(StorageError::invalid_key(key, "key is reserved"));
        }
        Ok(())
    }
}

impl<T, S, C> KeyValueBackend<T, S, C>
where
    S: KeyValueStore,
{
    /// Lists every key this backend has stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if the index entry is unreadable.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_index()?.into_iter().collect())
    }

    fn read_index(&self) -> StorageResult<BTreeSet<String>> {
        let index_key = self.index_key();
        match self.store.get_string(&index_key)? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| StorageError::corrupted(index_key, e.to_string())),
            None => Ok(BTreeSet::new()),
        }
    }

    fn write_index(&self, index: &BTreeSet<String>) -> StorageResult<()> {
        let index_key = self.index_key();
        if index.is_empty() {
            return self.store.delete_key(&index_key);
        }
        let text = serde_json::to_string(index).map_err(|e| {
            StorageError::serialization(&index_key, CodecError::encoding_failed(e.to_string()))
        })?;
        self.store.set_string(&index_key, &text)
    }
}

impl<T, S, C> Backend<T> for KeyValueBackend<T, S, C>
where
    S: KeyValueStore,
    C: Codec<T>,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        Self::check_key(key)?;
        let text = self
            .codec
            .encode(value)
            .map_err(|e| StorageError::serialization(key, e))?;

        let entry = self.entry_key(key);
        let _guard = self.index_lock.lock();
        let mut index = self.read_index()?;

        self.store.set_string(&entry, &text)?;
        if index.insert(key.to_owned()) {
            self.write_index(&index)?;
        }
        self.store.flush()?;

        tracing::debug!(entry = %entry, "saved key/value entry");
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        Self::check_key(key)?;
        let entry = self.entry_key(key);
        if !self.store.has_key(&entry)? {
            tracing::debug!(entry = %entry, "no key/value entry");
            return Ok(None);
        }

        let Some(text) = self.store.get_string(&entry)? else {
            return Ok(None);
        };

        self.codec.decode(&text).map(Some).map_err(|e| {
            tracing::warn!(entry = %entry, error = %e, "key/value entry failed to deserialize");
            StorageError::corrupted(key, e.to_string())
        })
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        Self::check_key(key)?;
        let entry = self.entry_key(key);
        let _guard = self.index_lock.lock();
        let mut index = self.read_index()?;

        self.store.delete_key(&entry)?;
        if index.remove(key) {
            self.write_index(&index)?;
        }
        self.store.flush()?;

        tracing::debug!(entry = %entry, "deleted key/value entry");
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Self::check_key(key)?;
        self.store.has_key(&self.entry_key(key))
    }

    fn delete_all(&self) -> StorageResult<()> {
        let _guard = self.index_lock.lock();
        let index = self.read_index()?;
        for key in &index {
            self.store.delete_key(&self.entry_key(key))?;
        }
        self.store.delete_key(&self.index_key())?;
        self.store.flush()?;

        tracing::debug!(namespace = ?self.namespace, count = index.len(), "deleted all key/value entries");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "key-value"
    }
}

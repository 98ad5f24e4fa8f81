//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};
use std::sync::Arc;

/// A single storage medium for values of type `T`.
///
/// # Outcomes
///
/// - `load` returns `Ok(None)` when nothing was ever saved under the key
/// - `load` returns [`StorageError::Corrupted`] when something was saved but
///   can no longer be read back; it never returns a partially recovered value
/// - Medium failures surface as [`StorageError::Unavailable`]
///
/// # Invariants
///
/// - `save` fully overwrites any previous value for the key
/// - `save` followed by `load` on the same thread observes the new value
/// - `delete` on a missing key is a no-op
/// - `delete_all` only touches keys in this backend's own namespace
/// - Backends must be `Send + Sync` so they can be shared
///
/// # Implementors
///
/// - [`super::JsonFileBackend`] - Checksummed text files
/// - [`super::KeyValueBackend`] - Entries in a string key/value store
/// - [`super::InMemoryBackend`] - For testing
pub trait Backend<T>: Send + Sync {
    /// Persists `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid, the value cannot be
    /// serialized, or the medium rejects the write. Implementations
    /// document what state a failed write leaves behind.
    fn save(&self, key: &str, value: &T) -> StorageResult<()>;

    /// Loads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if stored data fails validation
    /// and [`StorageError::Unavailable`] if the medium cannot be read.
    fn load(&self, key: &str) -> StorageResult<Option<T>>;

    /// Removes the value stored under `key`. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects the removal.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Returns true if a value is stored under `key`.
    ///
    /// This does not validate the stored data; a subsequent `load` may
    /// still report [`StorageError::Corrupted`].
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be queried.
    fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Removes every value this backend has stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects a removal.
    fn delete_all(&self) -> StorageResult<()>;

    /// Short name of the storage medium, used in logs and summaries.
    fn kind(&self) -> &'static str;
}

impl<T, B> Backend<T> for Box<B>
where
    B: Backend<T> + ?Sized,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        (**self).load(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        (**self).exists(key)
    }

    fn delete_all(&self) -> StorageResult<()> {
        (**self).delete_all()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

impl<T, B> Backend<T> for Arc<B>
where
    B: Backend<T> + ?Sized,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        (**self).load(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        (**self).exists(key)
    }

    fn delete_all(&self) -> StorageResult<()> {
        (**self).delete_all()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// Checks that `key` is usable as a storage identifier.
///
/// Keys become file names, so anything that could escape the save
/// directory is rejected.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first problem found.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "key is empty"));
    }
    if key.contains(['/', '\\']) {
        return Err(StorageError::invalid_key(key, "key contains a path separator"));
    }
    if key.contains("..") {
        return Err(StorageError::invalid_key(key, "key contains '..'"));
    }
    if key.contains('\0') {
        return Err(StorageError::invalid_key(key, "key contains a NUL byte"));
    }
    Ok(())
}

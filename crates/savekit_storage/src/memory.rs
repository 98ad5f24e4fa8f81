//! In-memory storage backend for testing.

use crate::backend::{validate_key, Backend};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory backend holding values directly.
///
/// Nothing is serialized, so this backend never reports corruption.
/// Suitable for:
/// - Unit tests
/// - Ephemeral saves that don't need persistence
///
/// # Example
///
/// ```rust
/// use savekit_storage::{Backend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.save("level", &5u32).unwrap();
/// assert_eq!(backend.load("level").unwrap(), Some(5));
/// ```
#[derive(Debug)]
pub struct InMemoryBackend<T> {
    values: RwLock<HashMap<String, T>>,
}

impl<T> Default for InMemoryBackend<T> {
    fn default() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> InMemoryBackend<T> {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl<T> Backend<T> for InMemoryBackend<T>
where
    T: Clone + Send + Sync,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        validate_key(key)?;
        self.values.write().insert(key.to_owned(), value.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        validate_key(key)?;
        Ok(self.values.read().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.values.write().remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.values.read().contains_key(key))
    }

    fn delete_all(&self) -> StorageResult<()> {
        self.values.write().clear();
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

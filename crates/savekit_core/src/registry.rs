//! Fan-out over several backends for one record type.

use crate::aggregate::{AggregateResult, OutcomeSet};
use crate::id::BackendId;
use savekit_storage::{Backend, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fmt;

/// Holds named backends for one record type and fans operations out to them.
///
/// Backends are independent: a failure in one never stops the others from
/// being attempted, and nothing is rolled back. Write operations return an
/// [`OutcomeSet`] so callers see exactly which backends accepted the write.
///
/// # Example
///
/// ```rust
/// use savekit_core::{BackendId, BackendRegistry};
/// use savekit_storage::{InMemoryBackend, InMemoryKeyValueStore, KeyValueBackend};
///
/// let mut registry: BackendRegistry<u32> = BackendRegistry::new();
/// registry.register(BackendId::new("memory"), InMemoryBackend::new());
/// registry.register(BackendId::KEY_VALUE, KeyValueBackend::new(InMemoryKeyValueStore::new()));
///
/// let outcomes = registry.save("level", &5u32);
/// assert!(outcomes.all_succeeded());
///
/// let loaded = registry.load("level");
/// assert_eq!(loaded.get("memory"), Some(&5));
/// assert_eq!(loaded.get("key-value"), Some(&5));
/// ```
pub struct BackendRegistry<T> {
    backends: BTreeMap<BackendId, Box<dyn Backend<T>>>,
}

impl<T> Default for BackendRegistry<T> {
    fn default() -> Self {
        Self {
            backends: BTreeMap::new(),
        }
    }
}

impl<T> BackendRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under `id`, returning the backend it replaced.
    pub fn register<B>(&mut self, id: BackendId, backend: B) -> Option<Box<dyn Backend<T>>>
    where
        B: Backend<T> + 'static,
    {
        self.register_boxed(id, Box::new(backend))
    }

    /// Registers an already boxed backend under `id`, returning the backend
    /// it replaced.
    pub fn register_boxed(
        &mut self,
        id: BackendId,
        backend: Box<dyn Backend<T>>,
    ) -> Option<Box<dyn Backend<T>>> {
        tracing::debug!(%id, kind = backend.kind(), "registering backend");
        self.backends.insert(id, backend)
    }

    /// Registers `backend` under `id` unless the identity is taken.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if `id` is already registered.
    pub fn try_register<B>(&mut self, id: BackendId, backend: B) -> StorageResult<()>
    where
        B: Backend<T> + 'static,
    {
        if self.backends.contains_key(&id) {
            return Err(StorageError::configuration(format!(
                "backend identity '{id}' is already registered"
            )));
        }
        self.register(id, backend);
        Ok(())
    }

    /// Removes the backend registered under `id`.
    pub fn unregister(&mut self, id: &str) -> Option<Box<dyn Backend<T>>> {
        let removed = self.backends.remove(id);
        if removed.is_some() {
            tracing::debug!(id, "unregistered backend");
        }
        removed
    }

    /// Returns true if a backend is registered under `id`.
    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    /// Returns the registered identities, in order.
    pub fn ids(&self) -> impl Iterator<Item = &BackendId> {
        self.backends.keys()
    }

    /// Returns the backend registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Backend<T>> {
        self.backends.get(id).map(|b| &**b)
    }

    /// Returns the number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns true if no backend is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Saves `value` under `key` in every backend.
    pub fn save(&self, key: &str, value: &T) -> OutcomeSet {
        self.fan_out("save", |backend| backend.save(key, value))
    }

    /// Loads `key` from every backend that has it.
    ///
    /// Backends reporting the key absent, corrupted or unreachable are left
    /// out of the result; this call itself never fails. Use
    /// [`load_report`](Self::load_report) to see why a backend is missing.
    pub fn load(&self, key: &str) -> AggregateResult<T> {
        let mut result = AggregateResult::new();
        for (id, backend) in &self.backends {
            match backend.exists(key) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(%id, key, error = %e, "exists check failed, skipping backend");
                    continue;
                }
            }
            match backend.load(key) {
                Ok(Some(value)) => result.insert(id.clone(), value),
                Ok(None) => {}
                Err(e) => tracing::warn!(%id, key, error = %e, "load failed, skipping backend"),
            }
        }
        result
    }

    /// Loads `key` from every backend, keeping each backend's raw outcome.
    pub fn load_report(&self, key: &str) -> AggregateResult<StorageResult<Option<T>>> {
        let mut result = AggregateResult::new();
        for (id, backend) in &self.backends {
            result.insert(id.clone(), backend.load(key));
        }
        result
    }

    /// Deletes `key` from every backend.
    pub fn delete(&self, key: &str) -> OutcomeSet {
        self.fan_out("delete", |backend| backend.delete(key))
    }

    /// Deletes every value from every backend.
    pub fn delete_all(&self) -> OutcomeSet {
        self.fan_out("delete_all", |backend| backend.delete_all())
    }

    /// Returns true if any backend has `key`.
    ///
    /// A backend whose check fails counts as not having it.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.backends
            .values()
            .any(|backend| backend.exists(key).unwrap_or(false))
    }

    /// Saves `value` to the backend registered under `id` only.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] for an unregistered identity,
    /// otherwise propagates the backend's save error.
    pub fn save_to(&self, id: &str, key: &str, value: &T) -> StorageResult<()> {
        match self.backends.get(id) {
            Some(backend) => backend.save(key, value),
            None => Err(StorageError::configuration(format!(
                "no backend registered as '{id}'"
            ))),
        }
    }

    /// Loads `key` from the backend registered under `id`.
    ///
    /// An unregistered identity yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Propagates the backend's load error.
    pub fn load_from(&self, id: &str, key: &str) -> StorageResult<Option<T>> {
        match self.backends.get(id) {
            Some(backend) => backend.load(key),
            None => Ok(None),
        }
    }

    /// Returns true if the backend registered under `id` has `key`.
    #[must_use]
    pub fn exists_in(&self, id: &str, key: &str) -> bool {
        self.backends
            .get(id)
            .is_some_and(|backend| backend.exists(key).unwrap_or(false))
    }

    /// Deletes `key` from the backend registered under `id`.
    ///
    /// An unregistered identity is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates the backend's delete error.
    pub fn delete_from(&self, id: &str, key: &str) -> StorageResult<()> {
        match self.backends.get(id) {
            Some(backend) => backend.delete(key),
            None => Ok(()),
        }
    }

    /// Deletes every value from the backend registered under `id`.
    ///
    /// An unregistered identity is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error.
    pub fn delete_all_from(&self, id: &str) -> StorageResult<()> {
        match self.backends.get(id) {
            Some(backend) => backend.delete_all(),
            None => Ok(()),
        }
    }

    fn fan_out<F>(&self, op: &'static str, mut f: F) -> OutcomeSet
    where
        F: FnMut(&dyn Backend<T>) -> StorageResult<()>,
    {
        let mut outcomes = AggregateResult::new();
        for (id, backend) in &self.backends {
            let outcome = f(&**backend);
            if let Err(e) = &outcome {
                tracing::warn!(%id, op, error = %e, "backend failed during fan-out");
            }
            outcomes.insert(id.clone(), outcome);
        }
        outcomes
    }
}

impl<T> fmt::Debug for BackendRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.backends.iter().map(|(id, b)| (id.as_str(), b.kind())))
            .finish()
    }
}

impl<T> fmt::Display for BackendRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendRegistry<{}> [", std::any::type_name::<T>())?;
        for (i, (id, backend)) in self.backends.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id} ({})", backend.kind())?;
        }
        f.write_str("]")
    }
}

//! Per-backend results of a registry fan-out.

use crate::id::BackendId;
use savekit_storage::{StorageError, StorageResult};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// Values produced by a fan-out, keyed by the backend that produced them.
///
/// Built fresh for every registry call and read-only afterwards.
///
/// - For `load`, `V` is the record type and only backends that returned a
///   value appear.
/// - For `save`, `delete` and `delete_all`, `V` is `StorageResult<()>` and
///   every registered backend appears (see [`OutcomeSet`]).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<V> {
    entries: BTreeMap<BackendId, V>,
}

/// Per-backend outcome of a fan-out write.
pub type OutcomeSet = AggregateResult<StorageResult<()>>;

impl<V> Default for AggregateResult<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> AggregateResult<V> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: BackendId, value: V) {
        self.entries.insert(id, value);
    }

    /// Returns the value produced by `id`, if it produced one.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    /// Returns true if `id` produced a value.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the identities present, in order.
    pub fn ids(&self) -> impl Iterator<Item = &BackendId> {
        self.entries.keys()
    }

    /// Iterates over `(identity, value)` pairs, in identity order.
    pub fn iter(&self) -> btree_map::Iter<'_, BackendId, V> {
        self.entries.iter()
    }

    /// Returns the number of backends present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no backend is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the result, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<BackendId, V> {
        self.entries
    }
}

impl AggregateResult<StorageResult<()>> {
    /// Returns true if every backend succeeded (vacuously true when empty).
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.entries.values().all(Result::is_ok)
    }

    /// Returns the identities of backends that succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &BackendId> {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(id, _)| id)
    }

    /// Returns the backends that failed with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&BackendId, &StorageError)> {
        self.entries
            .iter()
            .filter_map(|(id, outcome)| outcome.as_ref().err().map(|e| (id, e)))
    }
}

impl<V> IntoIterator for AggregateResult<V> {
    type Item = (BackendId, V);
    type IntoIter = btree_map::IntoIter<BackendId, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a AggregateResult<V> {
    type Item = (&'a BackendId, &'a V);
    type IntoIter = btree_map::Iter<'a, BackendId, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<V> fmt::Display for AggregateResult<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AggregateResult[")?;
        for (i, id) in self.entries.keys().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}

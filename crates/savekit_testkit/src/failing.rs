//! A backend that fails on demand.

use savekit_storage::{Backend, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Wraps a backend and fails selected operations with
/// [`StorageError::Unavailable`], counting every call it sees.
///
/// Failure switches can be flipped while the backend is registered.
pub struct FailingBackend<B> {
    inner: B,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    calls: AtomicUsize,
}

impl<B> FailingBackend<B> {
    /// Wraps `inner` with all operations succeeding.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Wraps `inner` failing every operation.
    pub fn always_failing(inner: B) -> Self {
        let backend = Self::new(inner);
        backend.set_fail_writes(true);
        backend.set_fail_reads(true);
        backend
    }

    /// Makes `save`, `delete` and `delete_all` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `load` and `exists` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of operations attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn check(&self, key: &str, flag: &AtomicBool) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                key,
                io::Error::new(io::ErrorKind::Other, "injected failure"),
            ));
        }
        Ok(())
    }
}

impl<T, B> Backend<T> for FailingBackend<B>
where
    B: Backend<T>,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        self.check(key, &self.fail_writes)?;
        self.inner.save(key, value)
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        self.check(key, &self.fail_reads)?;
        self.inner.load(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.check(key, &self.fail_writes)?;
        self.inner.delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        self.check(key, &self.fail_reads)?;
        self.inner.exists(key)
    }

    fn delete_all(&self) -> StorageResult<()> {
        self.check("*", &self.fail_writes)?;
        self.inner.delete_all()
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

//! Backend decorator that encrypts records before they reach the medium.

use crate::crypto::EncryptionService;
use savekit_codec::{Codec, JsonCodec};
use savekit_storage::{Backend, StorageError, StorageResult};
use std::marker::PhantomData;
use std::sync::Arc;

/// Wraps a text backend so that only ciphertext is ever persisted.
///
/// Values are encoded with `C`, encrypted by the shared
/// [`EncryptionService`], and handed to the inner backend as a base64
/// string. Any inner [`Backend<String>`] works: a checksummed file backend
/// gives integrity checks on top of confidentiality.
///
/// ```rust
/// use std::sync::Arc;
/// use savekit_core::crypto::{EncryptionKey, EncryptionService};
/// use savekit_core::EncryptingBackend;
/// use savekit_storage::{Backend, InMemoryBackend};
///
/// let service = Arc::new(EncryptionService::from_key(EncryptionKey::generate()));
/// let backend = EncryptingBackend::new(InMemoryBackend::<String>::new(), service);
///
/// backend.save("gold", &250u32).unwrap();
/// assert_eq!(backend.load("gold").unwrap(), Some(250));
/// ```
pub struct EncryptingBackend<T, B, C = JsonCodec> {
    inner: B,
    service: Arc<EncryptionService>,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, B> EncryptingBackend<T, B, JsonCodec> {
    /// Wraps `inner`, encoding values as compact JSON.
    #[must_use]
    pub fn new(inner: B, service: Arc<EncryptionService>) -> Self {
        Self::with_codec(inner, service, JsonCodec::compact())
    }
}

impl<T, B, C> EncryptingBackend<T, B, C> {
    /// Wraps `inner`, encoding values with `codec`.
    #[must_use]
    pub fn with_codec(inner: B, service: Arc<EncryptionService>, codec: C) -> Self {
        Self {
            inner,
            service,
            codec,
            _marker: PhantomData,
        }
    }

    /// Returns the wrapped backend.
    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Returns the shared encryption service.
    #[must_use]
    pub fn service(&self) -> &Arc<EncryptionService> {
        &self.service
    }
}

impl<T, B, C> Backend<T> for EncryptingBackend<T, B, C>
where
    B: Backend<String>,
    C: Codec<T>,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        let plaintext = self
            .codec
            .encode(value)
            .map_err(|e| StorageError::serialization(key, e))?;
        let ciphertext = self
            .service
            .encrypt(&plaintext)
            .map_err(|e| StorageError::configuration(format!("cannot encrypt '{key}': {e}")))?;
        self.inner.save(key, &ciphertext)
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        let ciphertext = match self.inner.load(key)? {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(None),
        };

        let plaintext = self.service.decrypt(&ciphertext).map_err(|e| {
            tracing::warn!(key, error = %e, "failed to decrypt record");
            StorageError::corrupted(key, e.to_string())
        })?;

        self.codec
            .decode(&plaintext)
            .map(Some)
            .map_err(|e| StorageError::corrupted(key, e.to_string()))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key)
    }

    fn delete_all(&self) -> StorageResult<()> {
        self.inner.delete_all()
    }

    fn kind(&self) -> &'static str {
        "encrypted"
    }
}

impl<T, B: std::fmt::Debug, C> std::fmt::Debug for EncryptingBackend<T, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptingBackend")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

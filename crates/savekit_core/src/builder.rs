//! Assembles a [`BackendRegistry`] from a [`Config`].

use crate::config::Config;
use crate::id::BackendId;
use crate::registry::BackendRegistry;
use savekit_codec::JsonCodec;
use savekit_storage::{Backend, JsonFileBackend, KeyValueBackend, KeyValueStore, StorageError, StorageResult};
#[cfg(feature = "encryption")]
use savekit_storage::NAMESPACE_SEPARATOR;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[cfg(feature = "encryption")]
use crate::crypto::EncryptionService;
#[cfg(feature = "encryption")]
use crate::encrypting::EncryptingBackend;
#[cfg(feature = "encryption")]
use savekit_codec::RawText;
#[cfg(feature = "encryption")]
use std::sync::Arc;

/// Namespace segment separating encrypted key/value entries from plain ones.
#[cfg(feature = "encryption")]
const ENCRYPTED_NAMESPACE: &str = "encrypted";

struct BuildContext<'a> {
    config: &'a Config,
    #[cfg(feature = "encryption")]
    service: Option<&'a Arc<EncryptionService>>,
}

type Factory<T> = Box<dyn FnOnce(&BuildContext<'_>) -> StorageResult<Box<dyn Backend<T>>>>;

/// Builder for a registry wired according to a [`Config`].
///
/// Backends are constructed in [`build`](Self::build), so the encryption
/// service may be supplied before or after the backends that need it.
///
/// # Example
///
/// ```rust,no_run
/// use savekit_core::{BackendId, Config, RegistryBuilder};
/// use savekit_storage::InMemoryKeyValueStore;
///
/// let registry = RegistryBuilder::<Vec<u32>>::new(Config::with_root("/tmp/game"))
///     .json_file(BackendId::JSON_FILE)
///     .key_value(BackendId::KEY_VALUE, InMemoryKeyValueStore::new())
///     .encrypted_json_file(BackendId::ENCRYPTED_FILE)
///     .encryption_from_config()
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.len(), 3);
/// ```
pub struct RegistryBuilder<T> {
    config: Config,
    factories: Vec<(BackendId, Factory<T>)>,
    #[cfg(feature = "encryption")]
    service: Option<Arc<EncryptionService>>,
}

impl<T> RegistryBuilder<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// Creates a builder with no backends.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            factories: Vec::new(),
            #[cfg(feature = "encryption")]
            service: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adds a checksummed JSON file backend writing to the saves directory.
    #[must_use]
    pub fn json_file(self, id: impl Into<BackendId>) -> Self {
        self.with_factory(id, |ctx| {
            let codec = json_codec(ctx.config);
            let backend: JsonFileBackend<T, JsonCodec> =
                JsonFileBackend::with_codec(ctx.config.saves_dir(), codec)
                    .with_extension(&ctx.config.file_extension);
            Ok(Box::new(backend))
        })
    }

    /// Adds a key/value backend over `store`.
    ///
    /// Entries are namespaced with the configured namespace, if any.
    #[must_use]
    pub fn key_value<S>(self, id: impl Into<BackendId>, store: S) -> Self
    where
        S: KeyValueStore + 'static,
    {
        self.with_factory(id, move |ctx| {
            let mut backend: KeyValueBackend<T, S> = KeyValueBackend::new(store);
            if let Some(namespace) = &ctx.config.kv_namespace {
                backend = backend.with_namespace(namespace);
            }
            Ok(Box::new(backend))
        })
    }

    /// Adds any other backend.
    #[must_use]
    pub fn backend<B>(self, id: impl Into<BackendId>, backend: B) -> Self
    where
        B: Backend<T> + 'static,
    {
        self.with_factory(id, move |_| Ok(Box::new(backend)))
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if an identity was used twice
    /// or an encrypted backend was requested without an encryption service.
    pub fn build(self) -> StorageResult<BackendRegistry<T>> {
        let ctx = BuildContext {
            config: &self.config,
            #[cfg(feature = "encryption")]
            service: self.service.as_ref(),
        };

        let mut registry = BackendRegistry::new();
        for (id, factory) in self.factories {
            if registry.is_registered(id.as_str()) {
                return Err(StorageError::configuration(format!(
                    "backend identity '{id}' is configured twice"
                )));
            }
            let backend = factory(&ctx)?;
            registry.register_boxed(id, backend);
        }

        tracing::info!(
            root = %self.config.root.display(),
            backends = registry.len(),
            "built backend registry"
        );
        Ok(registry)
    }

    fn with_factory<F>(mut self, id: impl Into<BackendId>, factory: F) -> Self
    where
        F: FnOnce(&BuildContext<'_>) -> StorageResult<Box<dyn Backend<T>>> + 'static,
    {
        self.factories.push((id.into(), Box::new(factory)));
        self
    }
}

#[cfg(feature = "encryption")]
impl<T> RegistryBuilder<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// Uses `service` for every encrypted backend.
    #[must_use]
    pub fn encryption(mut self, service: Arc<EncryptionService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Opens the encryption service from the configured key file,
    /// generating a key on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the key file is unusable.
    pub fn encryption_from_config(self) -> StorageResult<Self> {
        let key_file = self.config.key_file();
        let service = EncryptionService::open(&key_file).map_err(|e| {
            StorageError::configuration(format!(
                "cannot open encryption key {}: {e}",
                key_file.display()
            ))
        })?;
        Ok(self.encryption(Arc::new(service)))
    }

    /// Adds an encrypted, checksummed file backend writing to the
    /// encrypted saves directory.
    #[must_use]
    pub fn encrypted_json_file(self, id: impl Into<BackendId>) -> Self {
        self.with_factory(id, |ctx| {
            let service = require_service(ctx)?;
            let inner: JsonFileBackend<String, RawText> =
                JsonFileBackend::with_codec(ctx.config.encrypted_saves_dir(), RawText)
                    .with_extension(&ctx.config.file_extension);
            let backend: EncryptingBackend<T, _> = EncryptingBackend::new(inner, service);
            Ok(Box::new(backend))
        })
    }

    /// Adds an encrypted key/value backend over `store`.
    ///
    /// Entries live under the namespace `<namespace>/encrypted`, or
    /// `encrypted` when no namespace is configured. Keys cannot contain `/`,
    /// so no plain key/value backend on the same store can address them.
    #[must_use]
    pub fn encrypted_key_value<S>(self, id: impl Into<BackendId>, store: S) -> Self
    where
        S: KeyValueStore + 'static,
    {
        self.with_factory(id, move |ctx| {
            let service = require_service(ctx)?;
            let namespace = match &ctx.config.kv_namespace {
                Some(namespace) => format!("{namespace}{NAMESPACE_SEPARATOR}{ENCRYPTED_NAMESPACE}"),
                None => ENCRYPTED_NAMESPACE.to_string(),
            };
            let inner: KeyValueBackend<String, S, RawText> =
                KeyValueBackend::with_codec(store, RawText).with_namespace(namespace);
            let backend: EncryptingBackend<T, _> = EncryptingBackend::new(inner, service);
            Ok(Box::new(backend))
        })
    }
}

#[cfg(feature = "encryption")]
fn require_service(ctx: &BuildContext<'_>) -> StorageResult<Arc<EncryptionService>> {
    ctx.service.cloned().ok_or_else(|| {
        StorageError::configuration("encrypted backend requested without an encryption service")
    })
}

fn json_codec(config: &Config) -> JsonCodec {
    if config.pretty_json {
        JsonCodec::pretty()
    } else {
        JsonCodec::compact()
    }
}

impl<T> std::fmt::Debug for RegistryBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("config", &self.config)
            .field(
                "backends",
                &self.factories.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

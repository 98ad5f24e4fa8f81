//! # SaveKit Core
//!
//! Backend registry and encryption layer for SaveKit.
//!
//! This crate provides:
//! - [`BackendRegistry`] for fanning one record out to several backends
//! - [`AggregateResult`] / [`OutcomeSet`] for per-backend results
//! - [`EncryptingBackend`] and the [`crypto`] module (feature `encryption`)
//! - [`Config`] and [`RegistryBuilder`] for wiring a registry from settings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use savekit_core::{BackendId, Config, RegistryBuilder};
//!
//! let registry = RegistryBuilder::<u32>::new(Config::default())
//!     .json_file(BackendId::JSON_FILE)
//!     .build()
//!     .unwrap();
//!
//! let outcomes = registry.save("high_score", &9000);
//! for (id, error) in outcomes.failures() {
//!     eprintln!("{id} rejected the save: {error}");
//! }
//!
//! let loaded = registry.load("high_score");
//! assert_eq!(loaded.get("json-file"), Some(&9000));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod builder;
mod config;
mod error;
mod id;
mod registry;

#[cfg(feature = "encryption")]
pub mod crypto;
#[cfg(feature = "encryption")]
mod encrypting;

pub use aggregate::{AggregateResult, OutcomeSet};
pub use builder::RegistryBuilder;
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use id::BackendId;
pub use registry::BackendRegistry;

#[cfg(feature = "encryption")]
pub use crypto::{EncryptionKey, EncryptionService, KeySource};
#[cfg(feature = "encryption")]
pub use encrypting::EncryptingBackend;

// Re-export storage types for convenience
pub use savekit_storage::{Backend, StorageError, StorageResult};

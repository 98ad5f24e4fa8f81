//! # SaveKit Storage
//!
//! Storage backend trait and implementations for SaveKit.
//!
//! A [`Backend`] is one storage medium for one record type. Backends know
//! how to put text somewhere and get it back; the [`savekit_codec::Codec`]
//! they are built with decides what that text looks like.
//!
//! ## Design Principles
//!
//! - Absence is `Ok(None)`, never an error and never a default value
//! - Unreadable data is [`StorageError::Corrupted`]; no partial recovery
//! - An inaccessible medium is [`StorageError::Unavailable`]
//! - Backends are `Send + Sync` and take `&self`
//!
//! ## Available Backends
//!
//! - [`JsonFileBackend`] - One checksummed text file per key
//! - [`KeyValueBackend`] - Entries in a [`KeyValueStore`], no checksum
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use savekit_storage::{Backend, InMemoryKeyValueStore, KeyValueBackend};
//!
//! let backend = KeyValueBackend::new(InMemoryKeyValueStore::new());
//! backend.save("volume", &80u8).unwrap();
//! assert_eq!(backend.load("volume").unwrap(), Some(80));
//! assert_eq!(backend.load("missing").unwrap(), None::<u8>);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod key_value;
mod kv_store;
mod memory;
mod record;

pub use backend::{validate_key, Backend};
pub use error::{StorageError, StorageResult};
pub use file::{JsonFileBackend, DEFAULT_EXTENSION};
pub use key_value::{KeyValueBackend, INDEX_ENTRY, NAMESPACE_SEPARATOR};
pub use kv_store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
pub use memory::InMemoryBackend;
pub use record::{checksum, PersistedRecord, CHECKSUM_SEPARATOR};

//! Error types for storage operations.

use savekit_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// A key that was never saved is *not* an error: loads report it as
/// `Ok(None)`. Everything here means something went wrong with data that
/// was (or should have been) there.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key cannot be used as a storage identifier.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// Stored data exists but failed validation.
    ///
    /// Covers checksum mismatches, malformed records, decryption failures
    /// and values that no longer deserialize.
    #[error("data for key {key:?} is corrupted: {reason}")]
    Corrupted {
        /// The key whose data is unreadable.
        key: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The storage medium could not be accessed for this key.
    #[error("storage unavailable for key {key:?}: {source}")]
    Unavailable {
        /// The key being accessed.
        key: String,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// An I/O error not tied to a single key.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The value could not be serialized for saving.
    #[error("failed to serialize value for key {key:?}: {source}")]
    Serialization {
        /// The key being saved.
        key: String,
        /// The codec failure.
        #[source]
        source: CodecError,
    },

    /// Backends were wired together incorrectly.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the misconfiguration.
        message: String,
    },
}

impl StorageError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    /// Creates a corrupted data error.
    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unavailable medium error.
    pub fn unavailable(key: impl Into<String>, source: io::Error) -> Self {
        Self::Unavailable {
            key: key.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialization(key: impl Into<String>, source: CodecError) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true if stored data failed validation.
    #[must_use]
    pub fn is_corrupted(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }

    /// Returns true if the medium itself was inaccessible.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }

    /// Returns true if retrying the same operation may succeed.
    ///
    /// Corrupted data stays corrupted; an unavailable medium may come back.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_unavailable()
    }
}

//! Error types for SaveKit core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the encryption service.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key file exists but does not hold a usable key.
    #[error("invalid key file {}: {message}", path.display())]
    KeyFile {
        /// Path of the key file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed.
    ///
    /// Wrong key, truncated or tampered record, or bad padding.
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a key file error.
    pub fn key_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::KeyFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }
}

//! Encryption at rest for record text.
//!
//! Only available with the `encryption` feature (on by default).
//!
//! ## Security Model
//!
//! - AES-256 in CBC mode with PKCS#7 padding
//! - Fresh random 16-byte IV per encryption, stored ahead of the ciphertext
//! - One key per key file, generated on first use under an exclusive lock
//! - Keys are zeroized on drop and redacted from `Debug` output
//! - No authentication tag: tampering is not reliably detected
//!
//! ## Usage
//!
//! ```rust
//! use savekit_core::crypto::{EncryptionKey, EncryptionService};
//!
//! let service = EncryptionService::from_key(EncryptionKey::generate());
//!
//! let ciphertext = service.encrypt("secret data").unwrap();
//! assert_eq!(service.decrypt(&ciphertext).unwrap(), "secret data");
//! ```

mod key;
mod service;

pub use key::{lock_path, EncryptionKey, KeySource, KEY_SIZE};
pub use service::{CipherRecord, EncryptionService, BLOCK_SIZE, IV_SIZE};

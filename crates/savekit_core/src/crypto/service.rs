//! AES-256-CBC encryption of record text.

use super::key::{load_or_generate, EncryptionKey, KeySource};
use crate::error::{CoreError, CoreResult};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use std::path::{Path, PathBuf};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Size of an AES block in bytes.
pub const BLOCK_SIZE: usize = 16;

/// An encrypted record: a random IV followed by PKCS#7-padded ciphertext.
///
/// Serialized as `base64(iv || ciphertext)` using the standard alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherRecord {
    iv: [u8; IV_SIZE],
    ciphertext: Vec<u8>,
}

impl CipherRecord {
    /// Returns the initialization vector.
    #[must_use]
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Returns the ciphertext, without the IV.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Encodes the record as base64 text.
    #[must_use]
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(IV_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(bytes)
    }

    /// Parses base64 text produced by [`to_base64`](Self::to_base64).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DecryptionFailed`] if the text is not base64,
    /// is shorter than one IV plus one block, or the ciphertext is not a
    /// whole number of blocks.
    pub fn from_base64(text: &str) -> CoreResult<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CoreError::decryption_failed(format!("not valid base64: {e}")))?;

        if bytes.len() < IV_SIZE + BLOCK_SIZE {
            return Err(CoreError::decryption_failed("ciphertext too short"));
        }
        if (bytes.len() - IV_SIZE) % BLOCK_SIZE != 0 {
            return Err(CoreError::decryption_failed(
                "ciphertext is not a whole number of blocks",
            ));
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[..IV_SIZE]);
        Ok(Self {
            iv,
            ciphertext: bytes[IV_SIZE..].to_vec(),
        })
    }
}

/// Encrypts and decrypts record text with a single process-wide key.
///
/// One service is shared (behind an `Arc`) by every encrypting backend of
/// a registry. The key is loaded from, or generated into, a key file on
/// construction and never leaves the service.
///
/// Records carry no authentication tag. Tampering usually surfaces as a
/// padding or UTF-8 failure on decrypt, but is not guaranteed to.
pub struct EncryptionService {
    key: EncryptionKey,
    key_path: Option<PathBuf>,
    source: KeySource,
}

impl EncryptionService {
    /// Opens the service using the key file at `key_path`.
    ///
    /// If the file does not exist a fresh key is generated and written
    /// there. Concurrent first use from several processes yields one key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key file cannot be read or created, or
    /// exists but does not hold a base64-encoded 32-byte key.
    pub fn open(key_path: impl AsRef<Path>) -> CoreResult<Self> {
        let key_path = key_path.as_ref();
        let (key, source) = load_or_generate(key_path)?;
        Ok(Self {
            key,
            key_path: Some(key_path.to_path_buf()),
            source,
        })
    }

    /// Creates a service from a caller-supplied key, with no key file.
    #[must_use]
    pub fn from_key(key: EncryptionKey) -> Self {
        Self {
            key,
            key_path: None,
            source: KeySource::Provided,
        }
    }

    /// Returns where the key came from.
    #[must_use]
    pub fn key_source(&self) -> KeySource {
        self.source
    }

    /// Returns the key file path, if the service was opened from one.
    #[must_use]
    pub fn key_path(&self) -> Option<&Path> {
        self.key_path.as_deref()
    }

    /// Encrypts bytes under a fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher cannot be initialized.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> CoreResult<CipherRecord> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let cipher = Aes256CbcEnc::new_from_slices(self.key.as_bytes(), &iv)
            .map_err(|e| CoreError::encryption_failed(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(CipherRecord { iv, ciphertext })
    }

    /// Decrypts a record back to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DecryptionFailed`] on bad padding, which is
    /// the usual symptom of a wrong key or a tampered record.
    pub fn decrypt_record(&self, record: &CipherRecord) -> CoreResult<Vec<u8>> {
        let cipher = Aes256CbcDec::new_from_slices(self.key.as_bytes(), &record.iv)
            .map_err(|e| CoreError::decryption_failed(e.to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&record.ciphertext)
            .map_err(|_| CoreError::decryption_failed("invalid padding"))
    }

    /// Encrypts text, returning `base64(iv || ciphertext)`.
    ///
    /// Encrypting the same text twice yields different output.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher cannot be initialized.
    pub fn encrypt(&self, plaintext: &str) -> CoreResult<String> {
        self.encrypt_bytes(plaintext.as_bytes())
            .map(|record| record.to_base64())
    }

    /// Decrypts text produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DecryptionFailed`] if the input is malformed,
    /// fails to decrypt, or does not decrypt to UTF-8.
    pub fn decrypt(&self, ciphertext: &str) -> CoreResult<String> {
        let record = CipherRecord::from_base64(ciphertext)?;
        let plaintext = self.decrypt_record(&record)?;
        String::from_utf8(plaintext)
            .map_err(|_| CoreError::decryption_failed("plaintext is not valid UTF-8"))
    }
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &self.key)
            .field("key_path", &self.key_path)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_SIZE;
    use tempfile::tempdir;

    fn service() -> EncryptionService {
        EncryptionService::from_key(EncryptionKey::generate())
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let service = service();
        let plaintext = r#"{"name":"Hero","level":3}"#;

        let encrypted = service.encrypt(plaintext).unwrap();
        assert_ne!(encrypted, plaintext);
        assert_eq!(service.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_is_one_block() {
        let service = service();
        let encrypted = service.encrypt_bytes(b"").unwrap();
        assert_eq!(encrypted.ciphertext().len(), BLOCK_SIZE);

        let text = service.encrypt("").unwrap();
        assert_eq!(service.decrypt(&text).unwrap(), "");
    }

    #[test]
    fn unique_iv_per_encryption() {
        let service = service();
        let first = service.encrypt("same text").unwrap();
        let second = service.encrypt("same text").unwrap();

        assert_ne!(first, second);
        assert_eq!(service.decrypt(&first).unwrap(), service.decrypt(&second).unwrap());
    }

    #[test]
    fn layout_is_iv_then_padded_blocks() {
        let service = service();
        let encrypted = service.encrypt("0123456789abcdef").unwrap();
        let bytes = STANDARD.decode(&encrypted).unwrap();

        // 16 bytes of plaintext pad to two blocks
        assert_eq!(bytes.len(), IV_SIZE + 2 * BLOCK_SIZE);
    }

    #[test]
    fn known_key_and_record_decrypt() {
        let key_bytes = [0x11u8; KEY_SIZE];
        let service = EncryptionService::from_key(EncryptionKey::from_bytes(&key_bytes).unwrap());

        let record = service.encrypt_bytes(b"portable").unwrap();
        let text = record.to_base64();

        let other = EncryptionService::from_key(EncryptionKey::from_bytes(&key_bytes).unwrap());
        assert_eq!(other.decrypt(&text).unwrap(), "portable");
        assert_eq!(CipherRecord::from_base64(&text).unwrap(), record);
    }

    #[test]
    fn malformed_input_is_rejected() {
        let service = service();

        assert!(matches!(
            service.decrypt("%%% not base64 %%%"),
            Err(CoreError::DecryptionFailed { .. })
        ));
        // Shorter than IV plus one block
        assert!(matches!(
            service.decrypt(&STANDARD.encode([0u8; 20])),
            Err(CoreError::DecryptionFailed { .. })
        ));
        // Ciphertext not block aligned
        assert!(matches!(
            service.decrypt(&STANDARD.encode([0u8; IV_SIZE + BLOCK_SIZE + 3])),
            Err(CoreError::DecryptionFailed { .. })
        ));
    }

    #[test]
    fn truncated_record_fails() {
        let service = service();
        let encrypted = service.encrypt("a record long enough for two blocks").unwrap();
        let mut bytes = STANDARD.decode(&encrypted).unwrap();
        bytes.truncate(bytes.len() - BLOCK_SIZE / 2);

        assert!(service.decrypt(&STANDARD.encode(&bytes)).is_err());
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let encrypted = service().encrypt("top secret save").unwrap();

        // Without an authentication tag a wrong key may occasionally pass
        // the padding check, but never yields the original text.
        match service().decrypt(&encrypted) {
            Ok(text) => assert_ne!(text, "top secret save"),
            Err(e) => assert!(matches!(e, CoreError::DecryptionFailed { .. })),
        }
    }

    #[test]
    fn open_reuses_key_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("encryption_key.dat");

        let first = EncryptionService::open(&path).unwrap();
        assert_eq!(first.key_source(), KeySource::Generated);
        assert_eq!(first.key_path(), Some(path.as_path()));
        let encrypted = first.encrypt("persisted").unwrap();
        drop(first);

        let second = EncryptionService::open(&path).unwrap();
        assert_eq!(second.key_source(), KeySource::Loaded);
        assert_eq!(second.decrypt(&encrypted).unwrap(), "persisted");
    }

    #[test]
    fn debug_hides_key() {
        let service = EncryptionService::from_key(EncryptionKey::from_bytes(&[0xAB; KEY_SIZE]).unwrap());
        let debug = format!("{service:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
        assert_eq!(service.key_source(), KeySource::Provided);
    }
}

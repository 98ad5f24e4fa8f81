//! Encryption key and its on-disk file.

use crate::error::{CoreError, CoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fs2::FileExt;
use rand::RngCore;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Encryption key for AES-256.
///
/// The key is automatically zeroized when dropped for security.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Generates a new random encryption key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CoreError::invalid_key_size(bytes.len(), KEY_SIZE));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Returns the key as a byte slice.
    ///
    /// Only the encryption service reads raw key material.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Where the service's key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Read from an existing key file.
    Loaded,
    /// Generated and written to a new key file.
    Generated,
    /// Supplied directly by the caller.
    Provided,
}

/// Returns the path of the lock file guarding `key_path`.
#[must_use]
pub fn lock_path(key_path: &Path) -> PathBuf {
    let mut name = key_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Loads the key at `path`, generating and persisting one if absent.
///
/// Generation is race-free across processes:
/// 1. An exclusive advisory lock on `<path>.lock` is held throughout
/// 2. A new key is written and synced to a temp file next to the key file,
///    then linked into place without clobbering, so the key file never exists
///    half-written and an existing key is never overwritten; if another
///    writer got there first, its key is read
///
/// An empty or undecodable key file is an error rather than a reason to
/// generate a new key: data encrypted under the old key would become
/// unreadable.
pub(crate) fn load_or_generate(path: &Path) -> CoreResult<(EncryptionKey, KeySource)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let lock = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;

    let result = load_or_generate_locked(path);
    FileExt::unlock(&lock)?;
    result
}

fn load_or_generate_locked(path: &Path) -> CoreResult<(EncryptionKey, KeySource)> {
    if let Some(key) = read_key_file(path)? {
        tracing::debug!(path = %path.display(), "loaded encryption key");
        return Ok((key, KeySource::Loaded));
    }

    let key = EncryptionKey::generate();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(key.to_base64().as_bytes())?;
    temp.as_file().sync_all()?;

    match temp.persist_noclobber(path) {
        Ok(_) => {}
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            let key = read_key_file(path)?
                .ok_or_else(|| CoreError::key_file(path, "key file vanished during creation"))?;
            return Ok((key, KeySource::Loaded));
        }
        Err(e) => return Err(e.error.into()),
    }

    tracing::info!(path = %path.display(), "generated new encryption key");
    Ok((key, KeySource::Generated))
}

/// Reads a base64 key file. Returns `Ok(None)` if the file does not exist.
fn read_key_file(path: &Path) -> CoreResult<Option<EncryptionKey>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => Zeroizing::new(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let encoded = text.trim();
    if encoded.is_empty() {
        return Err(CoreError::key_file(path, "key file is empty"));
    }

    let bytes = Zeroizing::new(
        STANDARD
            .decode(encoded)
            .map_err(|e| CoreError::key_file(path, format!("not valid base64: {e}")))?,
    );
    EncryptionKey::from_bytes(&bytes)
        .map(Some)
        .map_err(|e| CoreError::key_file(path, e.to_string()))
}

//! Checksummed JSON file backend.

use crate::backend::{validate_key, Backend};
use crate::error::{StorageError, StorageResult};
use crate::record::PersistedRecord;
use savekit_codec::{Codec, JsonCodec};
use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default extension for record files.
pub const DEFAULT_EXTENSION: &str = "json";

/// A backend storing one checksummed text file per key.
///
/// Files live at `<dir>/<key>.<ext>` and hold the serialized value
/// followed by a SHA-256 checksum (see [`crate::PersistedRecord`]).
/// Any mismatch between the two is reported as
/// [`StorageError::Corrupted`] rather than a value.
///
/// # Durability
///
/// - Writes go to a uniquely named temporary file which is synced and then
///   renamed over the target, so a failed save leaves the previous file
///   untouched and concurrent saves of one key never share a temp file
/// - Temporary files are dot-files without the record extension, so
///   `keys` and `delete_all` never see them
/// - The directory is created on the first write and never removed
///
/// # Example
///
/// ```no_run
/// use savekit_storage::{Backend, JsonFileBackend};
///
/// let backend: JsonFileBackend<Vec<u32>> = JsonFileBackend::new("saves");
/// backend.save("scores", &vec![10, 20, 30]).unwrap();
/// assert_eq!(backend.load("scores").unwrap(), Some(vec![10, 20, 30]));
/// ```
#[derive(Debug)]
pub struct JsonFileBackend<T, C = JsonCodec> {
    dir: PathBuf,
    extension: String,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileBackend<T, JsonCodec> {
    /// Creates a backend writing indented JSON files into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_codec(dir, JsonCodec::pretty())
    }
}

impl<T, C> JsonFileBackend<T, C> {
    /// Creates a backend using a custom codec.
    #[must_use]
    pub fn with_codec(dir: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            codec,
            _marker: PhantomData,
        }
    }

    /// Sets the file extension (without the leading dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Returns the directory holding the record files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the record file extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the path of the file for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for keys that are not safe file names.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{}", self.extension)))
    }

    /// Lists the keys that currently have a record file, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .record_files()?
            .into_iter()
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_owned)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Checks the record for `key` without deserializing it.
    ///
    /// Returns `Ok(None)` if there is no record, otherwise whether the
    /// checksum matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn verify(&self, key: &str) -> StorageResult<Option<bool>> {
        Ok(self
            .read_record(key)?
            .map(|contents| PersistedRecord::parse(&contents).is_ok_and(|r| r.verify())))
    }

    fn read_record(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(path = %path.display(), "record file is not valid UTF-8");
                Err(StorageError::corrupted(key, "record is not valid UTF-8"))
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read record");
                Err(StorageError::unavailable(key, e))
            }
        }
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        persist_atomically(&self.dir, path, contents)?;
        self.sync_directory()
    }

    fn record_files(&self) -> StorageResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let is_record = entry.file_type()?.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str());
            if is_record {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Syncs the directory so a rename is durable.
    #[cfg(unix)]
    fn sync_directory(&self) -> io::Result<()> {
        File::open(&self.dir)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> io::Result<()> {
        // NTFS journals metadata; directory handles cannot be fsynced
        Ok(())
    }
}

/// Writes `contents` to a fresh temp file in `dir` and renames it to `path`.
///
/// The temp file is removed if any step fails.
pub(crate) fn persist_atomically(dir: &Path, path: &Path, contents: &str) -> io::Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

impl<T, C> Backend<T> for JsonFileBackend<T, C>
where
    C: Codec<T>,
{
    fn save(&self, key: &str, value: &T) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let payload = self
            .codec
            .encode(value)
            .map_err(|e| StorageError::serialization(key, e))?;
        let record = PersistedRecord::seal(payload);

        self.write_atomic(&path, &record.to_contents())
            .map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to write record");
                StorageError::unavailable(key, e)
            })?;

        tracing::debug!(path = %path.display(), "saved record");
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(contents) = self.read_record(key)? else {
            tracing::debug!(key, "no record file");
            return Ok(None);
        };

        let record = PersistedRecord::parse(&contents).map_err(|reason| {
            tracing::warn!(key, reason, "malformed record file");
            StorageError::corrupted(key, reason)
        })?;

        if !record.verify() {
            tracing::warn!(key, "record checksum mismatch");
            return Err(StorageError::corrupted(key, "checksum mismatch"));
        }

        self.codec
            .decode(record.payload())
            .map(Some)
            .map_err(|e| {
                tracing::warn!(key, error = %e, "verified record failed to deserialize");
                StorageError::corrupted(key, e.to_string())
            })
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "deleted record");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::unavailable(key, e)),
        }
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn delete_all(&self) -> StorageResult<()> {
        let files = self.record_files()?;
        let count = files.len();
        for path in files {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::debug!(dir = %self.dir.display(), count, "deleted all records");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "json-file"
    }
}

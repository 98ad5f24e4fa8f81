//! Checksummed record format used by the file backend.
//!
//! ```text
//! <payload>\n---CHECKSUM---\n<base64(sha256(payload))>
//! ```
//!
//! The hash function is fixed: changing it invalidates every existing file.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Line separating the payload from its checksum.
pub const CHECKSUM_SEPARATOR: &str = "\n---CHECKSUM---\n";

/// Computes the checksum stored alongside `payload`.
#[must_use]
pub fn checksum(payload: &str) -> String {
    STANDARD.encode(Sha256::digest(payload.as_bytes()))
}

/// A payload paired with the checksum it was saved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    payload: String,
    checksum: String,
}

impl PersistedRecord {
    /// Creates a record for `payload` with a freshly computed checksum.
    #[must_use]
    pub fn seal(payload: String) -> Self {
        let checksum = checksum(&payload);
        Self { payload, checksum }
    }

    /// Parses file contents into a record.
    ///
    /// The contents must split into exactly two parts on
    /// [`CHECKSUM_SEPARATOR`]. No attempt is made to recover anything
    /// from malformed contents.
    ///
    /// # Errors
    ///
    /// Returns a description of the format problem.
    pub fn parse(contents: &str) -> Result<Self, &'static str> {
        let mut parts = contents.split(CHECKSUM_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(payload), Some(checksum), None) => Ok(Self {
                payload: payload.to_owned(),
                checksum: checksum.to_owned(),
            }),
            (_, None, _) => Err("checksum separator missing"),
            _ => Err("checksum separator appears more than once"),
        }
    }

    /// Returns true if the stored checksum matches the payload.
    #[must_use]
    pub fn verify(&self) -> bool {
        checksum(&self.payload).as_bytes() == self.checksum.as_bytes()
    }

    /// Returns the payload text.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the stored checksum.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Consumes the record, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> String {
        self.payload
    }

    /// Renders the record as file contents.
    #[must_use]
    pub fn to_contents(&self) -> String {
        let mut out = String::with_capacity(
            self.payload.len() + CHECKSUM_SEPARATOR.len() + self.checksum.len(),
        );
        out.push_str(&self.payload);
        out.push_str(CHECKSUM_SEPARATOR);
        out.push_str(&self.checksum);
        out
    }
}

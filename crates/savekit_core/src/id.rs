//! Backend identities.

use std::borrow::{Borrow, Cow};
use std::fmt;

/// Identifies one backend inside a [`crate::BackendRegistry`].
///
/// Identities are chosen by the caller at registration time and are
/// independent of the backend's implementation type, so two backends of
/// the same kind (say, two save directories) can be registered side by
/// side.
///
/// ```rust
/// use savekit_core::BackendId;
///
/// const CLOUD_MIRROR: BackendId = BackendId::new_static("cloud-mirror");
/// assert_eq!(CLOUD_MIRROR.as_str(), "cloud-mirror");
/// assert_eq!(BackendId::from("local"), BackendId::new("local"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackendId(Cow<'static, str>);

impl BackendId {
    /// Conventional identity for a plain JSON file backend.
    pub const JSON_FILE: Self = Self::new_static("json-file");
    /// Conventional identity for a plain key/value backend.
    pub const KEY_VALUE: Self = Self::new_static("key-value");
    /// Conventional identity for an encrypted JSON file backend.
    pub const ENCRYPTED_FILE: Self = Self::new_static("encrypted-file");
    /// Conventional identity for an encrypted key/value backend.
    pub const ENCRYPTED_KEY_VALUE: Self = Self::new_static("encrypted-key-value");

    /// Creates an identity from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates an identity from a static string, usable in constants.
    #[must_use]
    pub const fn new_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for BackendId {
    fn from(id: &'static str) -> Self {
        Self::new_static(id)
    }
}

impl From<String> for BackendId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for BackendId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BackendId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn owned_and_static_compare_equal() {
        assert_eq!(BackendId::new("json-file".to_string()), BackendId::JSON_FILE);
    }

    #[test]
    fn lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(BackendId::KEY_VALUE, 1);
        assert_eq!(map.get("key-value"), Some(&1));
    }

    #[test]
    fn ordered_by_name() {
        let mut ids = vec![BackendId::KEY_VALUE, BackendId::ENCRYPTED_FILE, BackendId::JSON_FILE];
        ids.sort();
        assert_eq!(
            ids.iter().map(BackendId::as_str).collect::<Vec<_>>(),
            vec!["encrypted-file", "json-file", "key-value"]
        );
    }
}

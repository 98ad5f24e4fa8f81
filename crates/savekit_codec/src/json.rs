//! JSON codec backed by `serde_json`.

use crate::error::{CodecError, CodecResult};
use crate::Codec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes any serde type as JSON text.
///
/// File records are written indented so they stay readable on disk;
/// key/value entries use the compact form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Creates a codec producing compact, single-line JSON.
    #[must_use]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }

    /// Creates a codec producing indented JSON.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Returns true if this codec indents its output.
    #[must_use]
    pub const fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> CodecResult<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        text.map_err(|e| CodecError::encoding_failed(e.to_string()))
    }

    fn decode(&self, text: &str) -> CodecResult<T> {
        serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }
}

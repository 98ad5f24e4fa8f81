//! # SaveKit Codec
//!
//! Text codecs for SaveKit.
//!
//! Every storage backend persists *text*. A [`Codec`] is the only piece that
//! knows how a record type turns into that text and back, so backends stay
//! independent of the serialization library.
//!
//! ## Available Codecs
//!
//! - [`JsonCodec`] - JSON via `serde_json`, for any serde type
//! - [`RawText`] - Identity codec for `String` payloads (e.g. ciphertext)
//!
//! ## Usage
//!
//! ```
//! use savekit_codec::{Codec, JsonCodec};
//!
//! let codec = JsonCodec::compact();
//! let text = codec.encode(&vec![1, 2, 3]).unwrap();
//! assert_eq!(text, "[1,2,3]");
//!
//! let decoded: Vec<i32> = codec.decode(&text).unwrap();
//! assert_eq!(decoded, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;

pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;

/// Converts values of type `T` to text and back.
///
/// Implementations must be deterministic for a given value so that
/// checksums computed over the text are reproducible.
pub trait Codec<T>: Send + Sync {
    /// Encodes a value to text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the value cannot be represented.
    fn encode(&self, value: &T) -> CodecResult<String>;

    /// Decodes a value from text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecodingFailed`] on malformed input.
    fn decode(&self, text: &str) -> CodecResult<T>;
}

/// Stores `String` payloads verbatim.
///
/// Used for backends sitting under an encryption layer, where the payload
/// is already text and quoting it as a JSON string would only add noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawText;

impl Codec<String> for RawText {
    fn encode(&self, value: &String) -> CodecResult<String> {
        Ok(value.clone())
    }

    fn decode(&self, text: &str) -> CodecResult<String> {
        Ok(text.to_owned())
    }
}

//! Raw codec - pass-through for binary data.
//!
//! Used when a payload is already serialized or is opaque binary that must
//! reach the backend untouched. Provides zero-copy operations where
//! possible.
//!
//! # Example
//!
//! ```
//! use chanwire::codec::RawCodec;
//! use bytes::Bytes;
//!
//! let data = b"binary payload";
//! let serialized = RawCodec::serialize(data);
//! assert_eq!(&serialized[..], data);
//!
//! // Zero-copy with Bytes
//! let bytes = Bytes::from_static(b"zero copy");
//! let passed = RawCodec::serialize_bytes(bytes.clone());
//! assert_eq!(passed.as_ptr(), bytes.as_ptr()); // Same memory
//! ```

use bytes::Bytes;

/// Raw codec that passes bytes through without transformation.
///
/// This is the simplest codec - it does not perform any serialization.
/// Use this when you have raw binary data that should be sent as-is.
pub struct RawCodec;

impl RawCodec {
    /// Serialize raw bytes (copies data into Bytes).
    ///
    /// For truly zero-copy, use `serialize_bytes` with an existing `Bytes`
    /// value.
    #[inline]
    pub fn serialize(data: &[u8]) -> Bytes {
        Bytes::copy_from_slice(data)
    }

    /// Serialize Bytes (true zero-copy, just returns the input).
    #[inline]
    pub fn serialize_bytes(data: Bytes) -> Bytes {
        data
    }

    /// Deserialize - returns a reference to the input (zero-copy).
    #[inline]
    pub fn deserialize(data: &[u8]) -> &[u8] {
        data
    }

    /// Deserialize Bytes - returns a reference to the data (zero-copy).
    #[inline]
    pub fn deserialize_bytes(data: &Bytes) -> &[u8] {
        data
    }
}

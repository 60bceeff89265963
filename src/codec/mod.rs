//! Codec module - serialization/deserialization for payloads.
//!
//! This module provides the two encode paths of the invocation layer:
//!
//! - [`RawCodec`] - Pass-through for raw bytes (zero-copy)
//! - [`JsonCodec`] - JSON using `serde_json` (the typed wire format)
//!
//! # Design
//!
//! Codecs are implemented as marker structs with static methods rather than
//! trait objects. The caller picks the codec explicitly at the call site;
//! there is no runtime inspection of the payload shape.
//!
//! # Example
//!
//! ```
//! use chanwire::codec::{JsonCodec, RawCodec};
//!
//! // JSON codec for structured data
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! // Raw codec for binary data
//! let raw = RawCodec::serialize(b"binary data");
//! assert_eq!(RawCodec::deserialize(&raw), b"binary data");
//! ```

mod json;
mod raw;

pub use json::JsonCodec;
pub use raw::RawCodec;

//! JSON codec using `serde_json`.
//!
//! The typed invocation path always carries UTF-8 JSON bytes on the wire,
//! so this codec is the symmetric encode/decode pair for it: values are
//! serialized to compact JSON and decoded back from the response bytes.
//!
//! # Example
//!
//! ```
//! use chanwire::codec::JsonCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     id: u32,
//!     content: String,
//! }
//!
//! let msg = Message { id: 42, content: "hello".to_string() };
//! let encoded = JsonCodec::encode(&msg).unwrap();
//! let decoded: Message = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use crate::error::Result;

/// JSON codec for structured data.
///
/// Produces compact (non-pretty) JSON so the encoded form is byte-stable
/// for a given value and field order.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        id: u32,
        name: String,
        active: bool,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = TestStruct {
            id: 42,
            name: "test".to_string(),
            active: true,
        };

        let encoded = JsonCodec::encode(&original).unwrap();
        let decoded: TestStruct = JsonCodec::decode(&encoded).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_is_compact_utf8() {
        let original = TestStruct {
            id: 1,
            name: "x".to_string(),
            active: false,
        };

        let encoded = JsonCodec::encode(&original).unwrap();
        let text = std::str::from_utf8(&encoded).unwrap();

        // Compact form: no whitespace, fields in declaration order.
        assert_eq!(text, r#"{"id":1,"name":"x","active":false}"#);
    }

    #[test]
    fn test_encode_decode_primitives() {
        let s = "hello world";
        let encoded = JsonCodec::encode(s).unwrap();
        let decoded: String = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, s);

        let n: i64 = 12345;
        let encoded = JsonCodec::encode(&n).unwrap();
        let decoded: i64 = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, n);

        let b = true;
        let encoded = JsonCodec::encode(&b).unwrap();
        let decoded: bool = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, b);
    }

    #[test]
    fn test_encode_decode_collections() {
        let vec = vec![1, 2, 3, 4, 5];
        let encoded = JsonCodec::encode(&vec).unwrap();
        let decoded: Vec<i32> = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, vec);

        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert("key1".to_string(), 100);
        map.insert("key2".to_string(), 200);

        let encoded = JsonCodec::encode(&map).unwrap();
        let decoded: HashMap<String, i32> = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_encode_decode_option() {
        let some_val: Option<i32> = Some(42);
        let encoded = JsonCodec::encode(&some_val).unwrap();
        let decoded: Option<i32> = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, some_val);

        let none_val: Option<i32> = None;
        let encoded = JsonCodec::encode(&none_val).unwrap();
        assert_eq!(encoded, b"null");
        let decoded: Option<i32> = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, none_val);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let invalid = b"not valid json";
        let result: Result<TestStruct> = JsonCodec::decode(invalid);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_error_on_wrong_shape() {
        let encoded = JsonCodec::encode(&[1, 2, 3]).unwrap();
        let result: Result<TestStruct> = JsonCodec::decode(&encoded);
        assert!(result.is_err());
    }
}

//! MessagePack codec using `rmp-serde`.
//!
//! Structs are always written in map form (`to_vec_named`), so peers written in other languages
//! see field names rather than positions.
//!
//! # Example
//!
//! ```
//! use clusterwire::codec::MsgPackCodec;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Chat {
//!     room: String,
//!     text: String,
//! }
//!
//! let msg = Chat { room: "lobby".into(), text: "hi".into() };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! assert_eq!(MsgPackCodec::decode::<Chat>(&encoded).unwrap(), msg);
//! ```

use bytes::Bytes;

use crate::error::Result;

/// MessagePack codec for structured payloads.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes (struct-as-map).
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Encode straight into a `Bytes` ready for a data frame.
    #[inline]
    pub fn encode_bytes<T: serde::Serialize>(value: &T) -> Result<Bytes> {
        Self::encode(value).map(Bytes::from)
    }

    /// Decode MsgPack bytes to a value.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterwireError;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Login {
        uid: i64,
        token: String,
        remember: bool,
    }

    #[test]
    fn test_struct_roundtrip() {
        let login = Login {
            uid: 1001,
            token: "abc".to_string(),
            remember: true,
        };

        let encoded = MsgPackCodec::encode(&login).unwrap();
        assert_eq!(MsgPackCodec::decode::<Login>(&encoded).unwrap(), login);
    }

    #[test]
    fn test_struct_is_written_as_map() {
        let encoded = MsgPackCodec::encode(&Login {
            uid: 1,
            token: String::new(),
            remember: false,
        })
        .unwrap();

        // fixmap with 3 entries, not fixarray (0x93)
        assert_eq!(encoded[0], 0x83);
    }

    #[test]
    fn test_encode_bytes() {
        let bytes = MsgPackCodec::encode_bytes(&Some(7i32)).unwrap();
        assert_eq!(MsgPackCodec::decode::<Option<i32>>(&bytes).unwrap(), Some(7));
    }

    #[test]
    fn test_none_is_nil() {
        assert_eq!(MsgPackCodec::encode(&None::<i32>).unwrap(), vec![0xc0]);
    }

    #[test]
    fn test_decode_error() {
        let result = MsgPackCodec::decode::<Login>(b"definitely not msgpack");
        assert!(matches!(result, Err(ClusterwireError::MsgPackDecode(_))));
    }
}

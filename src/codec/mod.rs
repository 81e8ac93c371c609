//! Payload codec for data frames.
//!
//! Data-frame payloads are opaque to the wire protocol. Handlers that want structured values
//! use [`MsgPackCodec`], which is what [`Request::parse`](crate::handler::Request::parse) and
//! [`Request::respond`](crate::handler::Request::respond) go through.
//!
//! # Example
//!
//! ```
//! use clusterwire::codec::MsgPackCodec;
//!
//! let encoded = MsgPackCodec::encode(&("room-7", 3u32)).unwrap();
//! let decoded: (String, u32) = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, ("room-7".to_string(), 3));
//! ```

mod msgpack;

pub use msgpack::MsgPackCodec;

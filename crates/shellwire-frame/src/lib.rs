//! Length-prefixed, typed message framing.
//!
//! Every message travels as one frame:
//! - A 4-byte little-endian payload length
//! - A 4-byte little-endian message kind (one bit per kind)
//! - Exactly `length` payload bytes
//!
//! Partial frames stay buffered; callers only ever see complete frames.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod kind;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use kind::MessageKind;

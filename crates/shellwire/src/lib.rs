//! IPC between a UI shell process and its content processes.
//!
//! A UI process binds one session socket; every content process it spawns
//! connects back to it. Traffic is a stream of typed, length-prefixed frames
//! whose payloads are either fixed little-endian structs or serialized script
//! values.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix socket transport and session socket naming
//! - [`frame`]: frame header, message kinds and codecs
//! - [`value`]: the script value codec
//! - [`endpoint`]: channels, content-process lifecycle and the event loop
//!   glue (behind the `endpoint` feature)

/// Re-export transport types.
pub mod transport {
    pub use shellwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use shellwire_frame::*;
}

/// Re-export value codec types.
pub mod value {
    pub use shellwire_value::*;
}

/// Re-export endpoint types (requires `endpoint` feature).
#[cfg(feature = "endpoint")]
pub mod endpoint {
    pub use shellwire_endpoint::*;
}

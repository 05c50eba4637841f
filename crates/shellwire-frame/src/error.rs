use crate::kind::MessageKind;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header names a message kind outside the closed set.
    #[error("unknown message kind 0x{0:x}")]
    UnknownKind(u32),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A kind that carries no payload arrived with one.
    #[error("{kind} frame must have an empty payload, got {len} bytes")]
    UnexpectedPayload { kind: MessageKind, len: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

use shellwire_frame::MessageKind;

use crate::page::PageId;
use crate::process::{ProcessId, ProcessState};

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] shellwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] shellwire_frame::FrameError),

    /// Value encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] shellwire_value::CodecError),

    /// A frame payload did not match the schema of its kind.
    #[error("malformed {kind} payload: {reason}")]
    Malformed { kind: MessageKind, reason: String },

    /// The page was destroyed or its process is gone.
    #[error("page {0} is dead")]
    PageDead(PageId),

    /// No content process with this id was ever registered.
    #[error("unknown content process {0}")]
    UnknownProcess(ProcessId),

    /// A lifecycle transition that the state machine does not allow.
    #[error("content process {process}: invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        process: ProcessId,
        from: ProcessState,
        to: ProcessState,
    },

    /// I/O outside the frame layer (runtime setup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EndpointError {
    pub(crate) fn malformed(kind: MessageKind, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EndpointError>;

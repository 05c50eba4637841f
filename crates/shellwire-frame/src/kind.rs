//! The closed set of message kinds.
//!
//! Each kind occupies its own bit on the wire. Adding a kind means adding a
//! variant here, a payload type and a handler method on the endpoint side.

use std::fmt;

use crate::error::FrameError;

/// Message kind carried in every frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// UI → content: load a script module by name.
    RequireModule = 0x01,
    /// Both directions: a named channel event.
    ChannelEvent = 0x02,
    /// Content → UI: scroll/resize notification. UI → content: scroll-to.
    Scroll = 0x04,
    /// Content → UI: init complete. UI → content: ready reply.
    Init = 0x08,
    /// UI → content: evaluate a script. Content → UI: evaluation result.
    Eval = 0x10,
    /// Content → UI: a log record.
    Log = 0x20,
    /// Content → UI: a page was created.
    PageCreated = 0x40,
    /// UI → content: terminate immediately.
    Crash = 0x80,
}

impl MessageKind {
    /// Every kind, in wire-value order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::RequireModule,
        MessageKind::ChannelEvent,
        MessageKind::Scroll,
        MessageKind::Init,
        MessageKind::Eval,
        MessageKind::Log,
        MessageKind::PageCreated,
        MessageKind::Crash,
    ];

    /// The wire value of this kind.
    pub fn wire_value(self) -> u32 {
        self as u32
    }

    /// Look up a kind by wire value.
    pub fn from_wire(value: u32) -> Result<Self, FrameError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_value() == value)
            .ok_or(FrameError::UnknownKind(value))
    }

    /// Human-readable kind name, used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::RequireModule => "require-module",
            MessageKind::ChannelEvent => "channel-event",
            MessageKind::Scroll => "scroll",
            MessageKind::Init => "init",
            MessageKind::Eval => "eval",
            MessageKind::Log => "log",
            MessageKind::PageCreated => "page-created",
            MessageKind::Crash => "crash",
        }
    }

    /// Whether frames of this kind carry a payload at all.
    ///
    /// `Init` and `Crash` must have an empty payload.
    pub fn has_payload(self) -> bool {
        !matches!(self, MessageKind::Init | MessageKind::Crash)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = FrameError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_wire(value)
    }
}

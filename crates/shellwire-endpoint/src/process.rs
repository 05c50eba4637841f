//! Content-process identity and lifecycle states.

use std::fmt;

use serde::Serialize;

/// UI-side identifier of one content process, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProcessId(pub(crate) u64);

impl ProcessId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content-{}", self.0)
    }
}

/// Lifecycle of one content process as seen from the UI.
///
/// ```text
/// Spawned -> Connected -> Ready -> Closed
///    \           \          \
///     `-----------`----------`---> Crashed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// Registered, no socket yet.
    Spawned,
    /// Socket accepted, init not yet received.
    Connected,
    /// Init received; traffic flows directly.
    Ready,
    /// Shut down in an orderly way.
    Closed,
    /// Lost unexpectedly or crashed on request.
    Crashed,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Closed | ProcessState::Crashed)
    }

    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        match (self, next) {
            (Spawned, Connected) | (Connected, Ready) => true,
            (from, Closed | Crashed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProcessState::Spawned => "spawned",
            ProcessState::Connected => "connected",
            ProcessState::Ready => "ready",
            ProcessState::Closed => "closed",
            ProcessState::Crashed => "crashed",
        }
    }
}

//! Unix domain socket transport between the UI process and content processes.
//!
//! The UI process binds one per-session socket before any content process is
//! spawned; each content process connects to it exactly once. This is the
//! lowest layer of shellwire. Everything else builds on top of the
//! [`IpcStream`] type provided here.

pub mod error;
pub mod session;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use session::{session_socket_path, SOCKET_PREFIX};
pub use traits::IpcStream;

#[cfg(unix)]
pub use uds::UnixDomainSocket;

#[cfg(all(unix, feature = "async"))]
pub use uds::AsyncUnixListener;

//! Channels and content-process lifecycle for the shellwire protocol.
//!
//! The UI process owns a [`UiProcess`]; each content process owns a
//! [`ContentProcess`]. Both expose named [`Channel`]s whose events cross the
//! process boundary as `ChannelEvent` frames. Everything here is
//! single-threaded: state lives in `Rc`/`RefCell` and is driven by one event
//! loop per process (see [`runtime`], feature `async`).
//!
//! ```
//! use shellwire_endpoint::UiProcess;
//!
//! let ui = UiProcess::new();
//! let id = ui.register_process();
//! let channel = ui.require_web_module("wm").unwrap();
//! channel.add_handler("ping", |_page, args| println!("ping {args:?}"));
//! assert_eq!(ui.process(id).unwrap().held_frames(), 1);
//! ```

pub mod callback;
pub mod channel;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod outbox;
pub mod page;
pub mod process;
#[cfg(all(unix, feature = "async"))]
pub mod runtime;
pub mod signal;
pub mod ui;

pub use callback::CallbackRegistry;
pub use channel::{Channel, ChannelRegistry, EventSink};
pub use config::{default_socket_dir, HostConfig};
pub use content::{ContentProcess, WebEngine, SIGNAL_READY};
pub use dispatch::{dispatch, MessageHandler, Side};
pub use endpoint::{Endpoint, EndpointStatus, FrameSink};
pub use error::{EndpointError, Result};
pub use message::{
    ChannelEvent, EvalReply, EvalRequest, EvalResult, LogLevel, LogRecord, PageCreated,
    RequireModule, ScrollNotify, ScrollSubtype, ScrollTo,
};
pub use outbox::Outbox;
pub use page::{Page, PageId, PageTable};
pub use process::{ProcessId, ProcessState};
pub use signal::{Handler, HandlerId, SignalTable};
pub use ui::{ContentHandle, EvalOutcome, UiProcess};

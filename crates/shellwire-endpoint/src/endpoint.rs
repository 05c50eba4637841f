//! The send half of one side of a connection.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use shellwire_frame::{Frame, MessageKind};
use tracing::{debug, trace, warn};

/// Where an endpoint's outbound frames go.
///
/// A sink hands the frame back when it can no longer deliver, which closes
/// the endpoint.
pub trait FrameSink {
    fn send_frame(&self, frame: Frame) -> std::result::Result<(), Frame>;
}

/// Connection status of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    /// No sink yet; frames queue in submission order.
    Disconnected,
    Connected,
    /// Terminal. Frames are dropped.
    Closed,
}

/// Ordered, non-blocking frame output for one side of a connection.
pub struct Endpoint {
    name: String,
    status: Cell<EndpointStatus>,
    sink: RefCell<Option<Box<dyn FrameSink>>>,
    pending: RefCell<VecDeque<Frame>>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Cell::new(EndpointStatus::Disconnected),
            sink: RefCell::new(None),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> EndpointStatus {
        self.status.get()
    }

    /// Connect the endpoint and flush anything queued while disconnected.
    ///
    /// Attaching to a closed endpoint drops the sink.
    pub fn attach(&self, sink: Box<dyn FrameSink>) {
        if self.status.get() == EndpointStatus::Closed {
            debug!(endpoint = %self.name, "attach after close ignored");
            return;
        }
        *self.sink.borrow_mut() = Some(sink);
        self.status.set(EndpointStatus::Connected);

        let pending: Vec<Frame> = self.pending.borrow_mut().drain(..).collect();
        if !pending.is_empty() {
            debug!(endpoint = %self.name, count = pending.len(), "flushing queued frames");
        }
        for frame in pending {
            self.send(frame);
        }
    }

    /// Submit a frame. Never blocks.
    pub fn send(&self, frame: Frame) {
        match self.status.get() {
            EndpointStatus::Disconnected => {
                trace!(endpoint = %self.name, kind = %frame.kind, "queued until connected");
                self.pending.borrow_mut().push_back(frame);
            }
            EndpointStatus::Closed => {
                debug!(endpoint = %self.name, kind = %frame.kind, "dropped frame on closed endpoint");
            }
            EndpointStatus::Connected => {
                if frame.kind != MessageKind::Log {
                    debug!(
                        endpoint = %self.name,
                        kind = %frame.kind,
                        len = frame.payload.len(),
                        "send"
                    );
                }
                let result = match self.sink.borrow().as_ref() {
                    Some(sink) => sink.send_frame(frame),
                    None => Err(frame),
                };
                if let Err(frame) = result {
                    warn!(endpoint = %self.name, kind = %frame.kind, "connection gone, closing endpoint");
                    self.close();
                }
            }
        }
    }

    /// Close for good, dropping the sink and anything still queued.
    pub fn close(&self) {
        self.status.set(EndpointStatus::Closed);
        self.sink.borrow_mut().take();
        self.pending.borrow_mut().clear();
    }
}

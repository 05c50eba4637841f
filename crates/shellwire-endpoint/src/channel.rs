//! Named bidirectional event channels.
//!
//! A channel is opened by name on either side. Emitting encodes a
//! `ChannelEvent` frame and hands it to the owning process, which decides
//! where it goes. Inbound events for a name are delivered to that channel's
//! handlers; events for names nobody opened are dropped.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use shellwire_frame::Frame;
use shellwire_value::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::message::{encode_channel_event, ChannelEvent};
use crate::page::{Page, PageId};
use crate::signal::{HandlerId, SignalTable};

/// Routes encoded channel events from a process to its peer(s).
pub trait EventSink {
    /// `page` is the page the event concerns, if any. The UI side uses it to
    /// pick the content process; `None` there means every process.
    fn send_event(&self, page: Option<PageId>, frame: Frame) -> Result<()>;
}

struct ChannelInner {
    name: String,
    handlers: SignalTable,
    sink: Weak<dyn EventSink>,
}

/// Handle to a named channel. Clones share handlers.
#[derive(Clone)]
pub struct Channel(Rc<ChannelInner>);

impl Channel {
    fn new(name: &str, sink: Weak<dyn EventSink>) -> Self {
        Self(Rc::new(ChannelInner {
            name: name.to_owned(),
            handlers: SignalTable::new(),
            sink,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Register a handler for `event` arriving from the peer.
    pub fn add_handler(
        &self,
        event: &str,
        handler: impl Fn(Option<&Page>, &[Value]) + 'static,
    ) -> HandlerId {
        self.0.handlers.add(event, handler)
    }

    pub fn remove_handler(&self, event: &str, id: HandlerId) -> bool {
        self.0.handlers.remove(event, id)
    }

    /// Send `event` with `args` to the peer.
    ///
    /// Fails if the arguments cannot be serialized or the page is dead.
    pub fn emit(&self, page: Option<&Page>, event: &str, args: &[Value]) -> Result<()> {
        if let Some(page) = page {
            page.ensure_alive()?;
        }
        let page_id = page.map(Page::id);
        let frame = encode_channel_event(&self.0.name, event, page_id, args)?;
        match self.0.sink.upgrade() {
            Some(sink) => sink.send_event(page_id, frame),
            None => {
                warn!(channel = %self.0.name, event, "process gone, event dropped");
                Ok(())
            }
        }
    }

    pub(crate) fn deliver(&self, page: Option<&Page>, event: &str, args: &[Value]) -> usize {
        self.0.handlers.emit(page, event, args)
    }

    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Channel").field(&self.0.name).finish()
    }
}

/// The channels one process has opened.
pub struct ChannelRegistry {
    channels: RefCell<BTreeMap<String, Channel>>,
    sink: Weak<dyn EventSink>,
}

impl ChannelRegistry {
    pub fn new(sink: Weak<dyn EventSink>) -> Self {
        Self {
            channels: RefCell::new(BTreeMap::new()),
            sink,
        }
    }

    /// Open `name`, or return the already open channel of that name.
    pub fn open(&self, name: &str) -> Channel {
        self.channels
            .borrow_mut()
            .entry(name.to_owned())
            .or_insert_with(|| Channel::new(name, Weak::clone(&self.sink)))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Channel> {
        self.channels.borrow().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.channels.borrow().keys().cloned().collect()
    }

    /// Hand an inbound event to its channel. Returns `false` when no channel
    /// of that name is open.
    pub fn deliver(&self, page: Option<&Page>, event: &ChannelEvent) -> bool {
        let Some(channel) = self.get(&event.channel) else {
            debug!(
                channel = %event.channel,
                event = %event.event,
                "event for unopened channel dropped"
            );
            return false;
        };
        let handled = channel.deliver(page, &event.event, &event.args);
        if handled == 0 {
            debug!(channel = %event.channel, event = %event.event, "no handler for event");
        }
        true
    }
}

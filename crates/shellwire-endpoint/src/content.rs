//! The content side: one per content process.
//!
//! Until the UI answers our init, outbound traffic that depends on the UI
//! having loaded its modules (page announcements, channel events, scroll
//! notifications) is held, together with local `page-created` signals, and
//! replayed in order once the reply arrives.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use shellwire_frame::{Frame, DEFAULT_MAX_PAYLOAD};
use shellwire_value::Value;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelRegistry, EventSink};
use crate::dispatch::{dispatch, MessageHandler, Side};
use crate::endpoint::{Endpoint, EndpointStatus, FrameSink};
use crate::error::Result;
use crate::message::{
    init_frame, ChannelEvent, EvalReply, EvalRequest, EvalResult, LogLevel, LogRecord,
    PageCreated, RequireModule, ScrollNotify, ScrollSubtype, ScrollTo,
};
use crate::outbox::Outbox;
use crate::page::{Page, PageId, PageTable};
use crate::signal::SignalTable;

/// Local signal emitted for every page, including pages created before the
/// UI was ready.
pub const SIGNAL_PAGE_CREATED: &str = "page-created";
/// Local signal emitted once the UI has answered init and held traffic has
/// been replayed.
pub const SIGNAL_READY: &str = "ready";

/// The engine hosting pages in a content process.
pub trait WebEngine {
    /// Load a script module requested by the UI.
    fn load_module(&self, name: &str) -> std::result::Result<(), String>;

    /// Run `script` in `page`. `source` labels the script in diagnostics.
    fn evaluate(
        &self,
        page: &Page,
        script: &str,
        source: &str,
        no_return: bool,
    ) -> std::result::Result<Value, String>;

    fn scroll_to(&self, page: &Page, h: i32, v: i32) {
        debug!(page = %page.id(), h, v, "scroll-to not supported by engine");
    }

    /// Terminate the process immediately. The default kills it with
    /// `SIGKILL`.
    fn crash(&self) {
        kill_self();
    }
}

#[cfg(unix)]
fn kill_self() {
    // SAFETY: kill(2) on our own pid has no memory-safety preconditions.
    unsafe {
        libc::kill(libc::getpid(), libc::SIGKILL);
    }
    std::process::abort();
}

#[cfg(not(unix))]
fn kill_self() {
    std::process::abort();
}

enum Deferred {
    Frame(Frame),
    PageCreated(Page),
}

/// Protocol state of one content process.
pub struct ContentProcess<E> {
    engine: E,
    endpoint: Endpoint,
    ready: Outbox<Deferred>,
    channels: ChannelRegistry,
    pages: PageTable,
    signals: SignalTable,
    pid: i32,
    max_payload: Cell<usize>,
}

impl<E: WebEngine + 'static> ContentProcess<E> {
    pub fn new(engine: E) -> Rc<Self> {
        Self::with_pid(engine, std::process::id() as i32)
    }

    /// Like [`ContentProcess::new`] but announcing pages under `pid`.
    pub fn with_pid(engine: E, pid: i32) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn EventSink> = this.clone();
            Self {
                engine,
                endpoint: Endpoint::new("ui"),
                ready: Outbox::new(),
                channels: ChannelRegistry::new(sink),
                pages: PageTable::new(),
                signals: SignalTable::new(),
                pid,
                max_payload: Cell::new(DEFAULT_MAX_PAYLOAD),
            }
        })
    }

    /// Largest payload the UI accepts; larger frames are refused up front.
    pub fn set_max_payload(&self, max: usize) {
        self.max_payload.set(max);
    }

    fn check_size(&self, frame: &Frame) -> Result<()> {
        frame.check_size(self.max_payload.get())?;
        Ok(())
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Attach the UI connection and report init complete.
    pub fn connect(&self, sink: Box<dyn FrameSink>) {
        self.endpoint.attach(sink);
        self.endpoint.send(init_frame());
        info!(pid = self.pid, "connected to ui, init sent");
    }

    /// Whether the UI has answered our init.
    pub fn is_ready(&self) -> bool {
        self.ready.is_open()
    }

    pub fn link_status(&self) -> EndpointStatus {
        self.endpoint.status()
    }

    /// The engine created a page.
    pub fn page_created(&self, id: PageId) -> Page {
        let page = Page::new(id, self.pid, None);
        self.pages.insert(page.clone());
        debug!(page = %id, "page created");
        self.defer(Deferred::Frame(
            PageCreated {
                page: id,
                pid: self.pid,
            }
            .to_frame(),
        ));
        self.defer(Deferred::PageCreated(page.clone()));
        page
    }

    /// The engine destroyed a page; its handles become dead.
    pub fn page_destroyed(&self, id: PageId) -> bool {
        self.pages.remove(id).is_some()
    }

    pub fn page(&self, id: PageId) -> Option<Page> {
        self.pages.resolve(Some(id))
    }

    pub fn pages(&self) -> &PageTable {
        &self.pages
    }

    pub fn open_channel(&self, name: &str) -> Channel {
        self.channels.open(name)
    }

    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.channels.get(name)
    }

    /// Report a scroll position or size change of `page`.
    pub fn notify_scroll(&self, page: Option<&Page>, h: i32, v: i32, subtype: ScrollSubtype) {
        let frame = ScrollNotify {
            h,
            v,
            page: page.map(Page::id),
            subtype,
        }
        .to_frame();
        self.defer(Deferred::Frame(frame));
    }

    /// Forward a log record to the UI process.
    pub fn log(&self, level: LogLevel, target: &str, message: &str) -> Result<()> {
        let frame = LogRecord {
            level,
            target: target.to_owned(),
            message: message.to_owned(),
        }
        .to_frame()?;
        self.check_size(&frame)?;
        self.endpoint.send(frame);
        Ok(())
    }

    /// Local signals (`page-created`).
    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Process one inbound frame from the UI.
    pub fn handle_frame(&self, frame: &Frame) -> Result<()> {
        dispatch(Side::Content, self, frame)
    }

    /// Close the connection after everything already sent is written.
    pub fn shutdown(&self) {
        info!("closing connection to ui");
        self.endpoint.close();
    }

    pub fn connection_lost(&self) {
        if self.endpoint.status() == EndpointStatus::Closed {
            debug!("connection to ui closed");
        } else {
            warn!("connection to ui lost");
            self.endpoint.close();
        }
    }

    fn defer(&self, item: Deferred) {
        if let Some(item) = self.ready.hold(item) {
            self.release(item);
        }
    }

    fn release(&self, item: Deferred) {
        match item {
            Deferred::Frame(frame) => self.endpoint.send(frame),
            Deferred::PageCreated(page) if page.is_alive() => {
                self.signals.emit(Some(&page), SIGNAL_PAGE_CREATED, &[]);
            }
            Deferred::PageCreated(page) => {
                debug!(page = %page.id(), "page destroyed before ready, signal skipped");
            }
        }
    }
}

impl<E: WebEngine + 'static> MessageHandler for ContentProcess<E> {
    fn on_init(&self) -> Result<()> {
        if self.ready.is_open() {
            debug!("duplicate init reply ignored");
            return Ok(());
        }
        let held = self.ready.open();
        info!(replayed = held.len(), "ui ready");
        for item in held {
            self.release(item);
        }
        self.signals.emit(None, SIGNAL_READY, &[]);
        Ok(())
    }

    fn on_require_module(&self, msg: RequireModule) -> Result<()> {
        match self.engine.load_module(&msg.name) {
            Ok(()) => info!(module = %msg.name, "module loaded"),
            Err(err) => warn!(module = %msg.name, error = %err, "module failed to load"),
        }
        Ok(())
    }

    fn on_channel_event(&self, msg: ChannelEvent) -> Result<()> {
        let page = self.pages.resolve(msg.page);
        self.channels.deliver(page.as_ref(), &msg);
        Ok(())
    }

    fn on_eval_request(&self, msg: EvalRequest) -> Result<()> {
        let result = match self.pages.resolve(Some(msg.page)) {
            None => EvalResult::PageGone,
            Some(page) => {
                match self
                    .engine
                    .evaluate(&page, &msg.script, &msg.source, msg.no_return)
                {
                    Ok(_) if msg.no_return => EvalResult::Value(Value::Nil),
                    Ok(value) => EvalResult::Value(value),
                    Err(err) => EvalResult::Error(err),
                }
            }
        };
        let reply = EvalReply {
            page: msg.page,
            callback: msg.callback,
            result,
        };
        let encoded = reply.to_frame().and_then(|frame| {
            self.check_size(&frame)?;
            Ok(frame)
        });
        let frame = match encoded {
            Ok(frame) => frame,
            Err(err) => {
                warn!(source = %msg.source, error = %err, "eval result not sendable");
                EvalReply {
                    result: EvalResult::Error(err.to_string()),
                    ..reply
                }
                .to_frame()?
            }
        };
        self.endpoint.send(frame);
        Ok(())
    }

    fn on_scroll_to(&self, msg: ScrollTo) -> Result<()> {
        match self.pages.resolve(Some(msg.page)) {
            Some(page) => self.engine.scroll_to(&page, msg.h, msg.v),
            None => debug!(page = %msg.page, "scroll-to for unknown page"),
        }
        Ok(())
    }

    fn on_crash(&self) -> Result<()> {
        warn!("crash requested by ui");
        self.engine.crash();
        Ok(())
    }
}

impl<E: WebEngine + 'static> EventSink for ContentProcess<E> {
    fn send_event(&self, _page: Option<PageId>, frame: Frame) -> Result<()> {
        self.check_size(&frame)?;
        self.defer(Deferred::Frame(frame));
        Ok(())
    }
}

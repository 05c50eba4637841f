//! The UI side: one coordinator for every content process.
//!
//! [`UiProcess`] owns the channel registry, the required module list, the
//! page table and the pending eval callbacks. Each content process gets a
//! [`ContentHandle`] whose traffic is held until the process reports init
//! complete.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use shellwire_frame::{Frame, DEFAULT_MAX_PAYLOAD};
use shellwire_value::Value;
use tracing::{debug, error, info, trace, warn};

use crate::callback::CallbackRegistry;
use crate::channel::{Channel, ChannelRegistry, EventSink};
use crate::dispatch::{dispatch, MessageHandler, Side};
use crate::endpoint::{Endpoint, EndpointStatus, FrameSink};
use crate::error::{EndpointError, Result};
use crate::message::{
    crash_frame, init_frame, ChannelEvent, EvalReply, EvalRequest, EvalResult, LogLevel,
    LogRecord, PageCreated, RequireModule, ScrollNotify, ScrollTo,
};
use crate::outbox::Outbox;
use crate::page::{Page, PageId, PageTable};
use crate::process::{ProcessId, ProcessState};
use crate::signal::SignalTable;

/// Local signal emitted when a content process announces a page.
pub const SIGNAL_PAGE_CREATED: &str = "page-created";
/// Local signal emitted on scroll notifications, args `[h, v, subtype]`.
pub const SIGNAL_SCROLL: &str = "scroll";
/// Local signal emitted when a content process ends, args `[id, state]`.
pub const SIGNAL_PROCESS_EXIT: &str = "process-exit";

/// UI-side state for one content process.
pub struct ContentHandle {
    id: ProcessId,
    endpoint: Endpoint,
    state: Cell<ProcessState>,
    outbox: Outbox<Frame>,
    pid: Cell<Option<i32>>,
}

impl ContentHandle {
    fn new(id: ProcessId) -> Self {
        Self {
            id,
            endpoint: Endpoint::new(id.to_string()),
            state: Cell::new(ProcessState::Spawned),
            outbox: Outbox::new(),
            pid: Cell::new(None),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn state(&self) -> ProcessState {
        self.state.get()
    }

    /// OS pid, once the process has announced a page.
    pub fn pid(&self) -> Option<i32> {
        self.pid.get()
    }

    pub fn link_status(&self) -> EndpointStatus {
        self.endpoint.status()
    }

    /// Frames waiting for init complete.
    pub fn held_frames(&self) -> usize {
        self.outbox.held_len()
    }

    fn transition(&self, next: ProcessState) -> Result<()> {
        let from = self.state.get();
        if !from.can_transition_to(next) {
            return Err(EndpointError::InvalidTransition {
                process: self.id,
                from,
                to: next,
            });
        }
        info!(process = %self.id, from = from.name(), to = next.name(), "content process state");
        self.state.set(next);
        Ok(())
    }

    /// Send now if ready, otherwise hold until init complete.
    fn send_held(&self, frame: Frame) {
        if let Some(frame) = self.outbox.hold(frame) {
            self.endpoint.send(frame);
        }
    }
}

/// How an eval request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Value(Value),
    /// The script raised; carries the error message.
    Error(String),
    /// The content process no longer has the page.
    PageGone,
    /// The content process ended before replying.
    ProcessLost,
}

struct PendingEval {
    process: ProcessId,
    callback: Box<dyn FnOnce(EvalOutcome)>,
}

/// Coordinator for all content processes of one UI process.
pub struct UiProcess {
    channels: ChannelRegistry,
    modules: RefCell<Vec<(String, Frame)>>,
    processes: RefCell<BTreeMap<ProcessId, Rc<ContentHandle>>>,
    pages: PageTable,
    evals: CallbackRegistry<PendingEval>,
    signals: SignalTable,
    next_process: Cell<u64>,
    max_payload: Cell<usize>,
}

impl UiProcess {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn EventSink> = this.clone();
            Self {
                channels: ChannelRegistry::new(sink),
                modules: RefCell::new(Vec::new()),
                processes: RefCell::new(BTreeMap::new()),
                pages: PageTable::new(),
                evals: CallbackRegistry::new(),
                signals: SignalTable::new(),
                next_process: Cell::new(0),
                max_payload: Cell::new(DEFAULT_MAX_PAYLOAD),
            }
        })
    }

    /// Largest payload the content processes accept. Frames above it are
    /// refused before they are queued.
    pub fn set_max_payload(&self, max: usize) {
        self.max_payload.set(max);
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload.get()
    }

    fn check_size(&self, frame: &Frame) -> Result<()> {
        frame.check_size(self.max_payload.get())?;
        Ok(())
    }

    /// Track a newly spawned content process.
    ///
    /// Every module required so far is queued for it.
    pub fn register_process(&self) -> ProcessId {
        let id = ProcessId(self.next_process.get() + 1);
        self.next_process.set(id.0);

        let handle = Rc::new(ContentHandle::new(id));
        for (_, frame) in self.modules.borrow().iter() {
            handle.send_held(frame.clone());
        }
        self.processes.borrow_mut().insert(id, handle);
        info!(process = %id, "content process registered");
        id
    }

    /// Attach the connection accepted for `id`.
    pub fn connect_process(&self, id: ProcessId, sink: Box<dyn FrameSink>) -> Result<()> {
        let handle = self.handle(id)?;
        handle.transition(ProcessState::Connected)?;
        handle.endpoint.attach(sink);
        Ok(())
    }

    pub fn process(&self, id: ProcessId) -> Option<Rc<ContentHandle>> {
        self.processes.borrow().get(&id).cloned()
    }

    /// Every process ever registered, terminal ones included.
    pub fn processes(&self) -> Vec<Rc<ContentHandle>> {
        self.processes.borrow().values().cloned().collect()
    }

    fn handle(&self, id: ProcessId) -> Result<Rc<ContentHandle>> {
        self.process(id).ok_or(EndpointError::UnknownProcess(id))
    }

    fn live_handles(&self) -> Vec<Rc<ContentHandle>> {
        self.processes
            .borrow()
            .values()
            .filter(|handle| !handle.state().is_terminal())
            .cloned()
            .collect()
    }

    /// Process one inbound frame from `id`.
    ///
    /// Frames from a process that already ended are ignored. An error means
    /// the peer violated the protocol and the connection should be dropped.
    pub fn handle_frame(&self, id: ProcessId, frame: &Frame) -> Result<()> {
        let handle = self.handle(id)?;
        if handle.state().is_terminal() {
            debug!(process = %id, kind = %frame.kind, "frame from ended process ignored");
            return Ok(());
        }
        trace!(process = %id, kind = %frame.kind, len = frame.payload.len(), "recv");
        let receiver = UiReceiver {
            ui: self,
            handle: &handle,
        };
        dispatch(Side::Ui, &receiver, frame)
    }

    /// Load a script module in every current and future content process,
    /// exactly once each, and open the channel of the same name.
    pub fn require_web_module(&self, name: &str) -> Result<Channel> {
        if self.modules.borrow().iter().any(|(module, _)| module == name) {
            return Ok(self.channels.open(name));
        }
        let frame = RequireModule {
            name: name.to_owned(),
        }
        .to_frame()?;
        self.check_size(&frame)?;
        self.modules
            .borrow_mut()
            .push((name.to_owned(), frame.clone()));
        for handle in self.live_handles() {
            handle.send_held(frame.clone());
        }
        info!(module = name, "web module required");
        Ok(self.channels.open(name))
    }

    /// Modules required so far, in order.
    pub fn modules(&self) -> Vec<String> {
        self.modules
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn open_channel(&self, name: &str) -> Channel {
        self.channels.open(name)
    }

    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.names()
    }

    /// Evaluate `script` in `page`; `callback` runs with the outcome.
    ///
    /// Returns the callback id sent along with the request.
    pub fn eval_script(
        &self,
        page: &Page,
        script: &str,
        source: &str,
        no_return: bool,
        callback: impl FnOnce(EvalOutcome) + 'static,
    ) -> Result<u64> {
        let handle = self.page_owner(page)?;
        let id = self.evals.register(PendingEval {
            process: handle.id,
            callback: Box::new(callback),
        });
        let request = EvalRequest {
            no_return,
            script: script.to_owned(),
            source: source.to_owned(),
            page: page.id(),
            callback: id,
        };
        let encoded = request.to_frame().and_then(|frame| {
            self.check_size(&frame)?;
            Ok(frame)
        });
        match encoded {
            Ok(frame) => {
                handle.send_held(frame);
                Ok(id)
            }
            Err(err) => {
                self.evals.take(id);
                Err(err)
            }
        }
    }

    /// Ask the content process hosting `page` to scroll it.
    pub fn scroll_to(&self, page: &Page, h: i32, v: i32) -> Result<()> {
        let handle = self.page_owner(page)?;
        let frame = ScrollTo {
            page: page.id(),
            h,
            v,
        }
        .to_frame()?;
        self.check_size(&frame)?;
        handle.send_held(frame);
        Ok(())
    }

    fn page_owner(&self, page: &Page) -> Result<Rc<ContentHandle>> {
        page.ensure_alive()?;
        let owner = page.owner().ok_or(EndpointError::PageDead(page.id()))?;
        let handle = self.handle(owner)?;
        if handle.state().is_terminal() {
            return Err(EndpointError::PageDead(page.id()));
        }
        Ok(handle)
    }

    /// Terminate a content process: `Crash` goes out immediately and the
    /// process is treated as crashed from now on.
    pub fn crash(&self, id: ProcessId) -> Result<()> {
        let handle = self.handle(id)?;
        if handle.state().is_terminal() {
            debug!(process = %id, "crash requested for ended process");
            return Ok(());
        }
        warn!(process = %id, "crashing content process");
        handle.endpoint.send(crash_frame());
        self.retire(&handle, ProcessState::Crashed)
    }

    /// Orderly shutdown of one content process.
    pub fn close_process(&self, id: ProcessId) -> Result<()> {
        let handle = self.handle(id)?;
        if handle.state().is_terminal() {
            return Ok(());
        }
        self.retire(&handle, ProcessState::Closed)
    }

    /// The connection of `id` went away.
    pub fn connection_lost(&self, id: ProcessId) {
        let Some(handle) = self.process(id) else {
            return;
        };
        if handle.state().is_terminal() {
            debug!(process = %id, state = handle.state().name(), "connection closed");
            return;
        }
        warn!(process = %id, state = handle.state().name(), "connection lost");
        if let Err(err) = self.retire(&handle, ProcessState::Crashed) {
            error!(process = %id, error = %err, "failed to retire content process");
        }
    }

    fn retire(&self, handle: &ContentHandle, state: ProcessState) -> Result<()> {
        handle.transition(state)?;
        handle.endpoint.close();
        let dropped = handle.outbox.open().len();
        if dropped > 0 {
            debug!(process = %handle.id, dropped, "held frames discarded");
        }

        let pages = self.pages.remove_owned_by(handle.id);
        let lost = self.evals.take_matching(|pending| pending.process == handle.id);
        for (_, pending) in lost {
            (pending.callback)(EvalOutcome::ProcessLost);
        }
        info!(
            process = %handle.id,
            state = state.name(),
            pages = pages.len(),
            "content process ended"
        );
        self.signals.emit(
            None,
            SIGNAL_PROCESS_EXIT,
            &[Value::Integer(handle.id.get() as i64), Value::from(state.name())],
        );
        Ok(())
    }

    pub fn page(&self, id: PageId) -> Option<Page> {
        self.pages.resolve(Some(id))
    }

    pub fn pages(&self) -> &PageTable {
        &self.pages
    }

    /// Local lifecycle signals (`page-created`, `scroll`, `process-exit`).
    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Eval callbacks still waiting for a reply.
    pub fn pending_evals(&self) -> usize {
        self.evals.len()
    }
}

impl EventSink for UiProcess {
    fn send_event(&self, page: Option<PageId>, frame: Frame) -> Result<()> {
        self.check_size(&frame)?;
        match page {
            Some(id) => {
                let page = self.pages.resolve(Some(id)).ok_or(EndpointError::PageDead(id))?;
                self.page_owner(&page)?.send_held(frame);
            }
            None => {
                for handle in self.live_handles() {
                    handle.send_held(frame.clone());
                }
            }
        }
        Ok(())
    }
}

struct UiReceiver<'a> {
    ui: &'a UiProcess,
    handle: &'a ContentHandle,
}

impl MessageHandler for UiReceiver<'_> {
    fn on_init(&self) -> Result<()> {
        self.handle.transition(ProcessState::Ready)?;
        let held = self.handle.outbox.open();
        debug!(process = %self.handle.id, count = held.len(), "flushing held frames");
        for frame in held {
            self.handle.endpoint.send(frame);
        }
        self.handle.endpoint.send(init_frame());
        Ok(())
    }

    fn on_page_created(&self, msg: PageCreated) -> Result<()> {
        let page = Page::new(msg.page, msg.pid, Some(self.handle.id));
        self.ui.pages.insert(page.clone());
        self.handle.pid.set(Some(msg.pid));
        debug!(process = %self.handle.id, page = %msg.page, pid = msg.pid, "page created");
        self.ui.signals.emit(Some(&page), SIGNAL_PAGE_CREATED, &[]);
        Ok(())
    }

    fn on_channel_event(&self, msg: ChannelEvent) -> Result<()> {
        let page = self.ui.pages.resolve(msg.page);
        self.ui.channels.deliver(page.as_ref(), &msg);
        Ok(())
    }

    fn on_scroll_notify(&self, msg: ScrollNotify) -> Result<()> {
        let page = self.ui.pages.resolve(msg.page);
        self.ui.signals.emit(
            page.as_ref(),
            SIGNAL_SCROLL,
            &[
                Value::from(msg.h),
                Value::from(msg.v),
                Value::from(msg.subtype.name()),
            ],
        );
        Ok(())
    }

    fn on_eval_reply(&self, msg: EvalReply) -> Result<()> {
        let process = self.handle.id;
        let Some(pending) = self
            .ui
            .evals
            .take_if(msg.callback, |pending| pending.process == process)
        else {
            warn!(%process, callback = msg.callback, "eval reply for a callback this process does not own");
            return Ok(());
        };
        let outcome = match msg.result {
            EvalResult::PageGone => {
                let owned = self
                    .ui
                    .pages
                    .get(msg.page)
                    .is_some_and(|page| page.owner() == Some(process));
                if owned {
                    self.ui.pages.remove(msg.page);
                }
                EvalOutcome::PageGone
            }
            EvalResult::Value(value) => EvalOutcome::Value(value),
            EvalResult::Error(message) => EvalOutcome::Error(message),
        };
        (pending.callback)(outcome);
        Ok(())
    }

    fn on_log(&self, msg: LogRecord) -> Result<()> {
        let process = self.handle.id;
        let origin = msg.target.as_str();
        let message = msg.message.as_str();
        match msg.level {
            LogLevel::Fatal | LogLevel::Error => error!(%process, origin, "{message}"),
            LogLevel::Warn => warn!(%process, origin, "{message}"),
            LogLevel::Info => info!(%process, origin, "{message}"),
            LogLevel::Verbose => debug!(%process, origin, "{message}"),
            LogLevel::Debug => trace!(%process, origin, "{message}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use shellwire_frame::{FrameError, MessageKind};

    use super::*;

    #[derive(Clone, Default)]
    struct Wire(Rc<RefCell<VecDeque<Frame>>>);

    impl FrameSink for Wire {
        fn send_frame(&self, frame: Frame) -> std::result::Result<(), Frame> {
            self.0.borrow_mut().push_back(frame);
            Ok(())
        }
    }

    impl Wire {
        fn kinds(&self) -> Vec<MessageKind> {
            self.0.borrow_mut().drain(..).map(|f| f.kind).collect()
        }
    }

    fn connected(ui: &UiProcess) -> (ProcessId, Wire) {
        let id = ui.register_process();
        let wire = Wire::default();
        ui.connect_process(id, Box::new(wire.clone())).unwrap();
        (id, wire)
    }

    fn announce_page(ui: &UiProcess, id: ProcessId, page: u64) -> Page {
        let frame = PageCreated {
            page: PageId::new(page).unwrap(),
            pid: 4242,
        }
        .to_frame();
        ui.handle_frame(id, &frame).unwrap();
        ui.page(PageId::new(page).unwrap()).unwrap()
    }

    #[test]
    fn traffic_held_until_init() {
        let ui = UiProcess::new();
        let (id, wire) = connected(&ui);

        ui.require_web_module("mymod").unwrap();
        assert!(wire.kinds().is_empty());
        assert_eq!(ui.process(id).unwrap().held_frames(), 1);

        ui.handle_frame(id, &init_frame()).unwrap();
        assert_eq!(wire.kinds(), [MessageKind::RequireModule, MessageKind::Init]);
        assert_eq!(ui.process(id).unwrap().state(), ProcessState::Ready);

        ui.require_web_module("other").unwrap();
        assert_eq!(wire.kinds(), [MessageKind::RequireModule]);
    }

    #[test]
    fn require_is_idempotent() {
        let ui = UiProcess::new();
        let a = ui.require_web_module("wm").unwrap();
        let b = ui.require_web_module("wm").unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(ui.modules(), ["wm"]);

        let (id, wire) = connected(&ui);
        ui.handle_frame(id, &init_frame()).unwrap();
        assert_eq!(wire.kinds(), [MessageKind::RequireModule, MessageKind::Init]);
    }

    #[test]
    fn second_init_is_a_protocol_error() {
        let ui = UiProcess::new();
        let (id, _wire) = connected(&ui);
        ui.handle_frame(id, &init_frame()).unwrap();
        assert!(matches!(
            ui.handle_frame(id, &init_frame()),
            Err(EndpointError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn page_events_route_to_owner() {
        let ui = UiProcess::new();
        let (first, first_wire) = connected(&ui);
        let (second, second_wire) = connected(&ui);
        ui.handle_frame(first, &init_frame()).unwrap();
        ui.handle_frame(second, &init_frame()).unwrap();
        first_wire.kinds();
        second_wire.kinds();

        let page = announce_page(&ui, second, 9);
        assert_eq!(page.owner(), Some(second));
        assert_eq!(ui.process(second).unwrap().pid(), Some(4242));

        let channel = ui.open_channel("foo");
        channel.emit(Some(&page), "hello", &[]).unwrap();
        assert!(first_wire.kinds().is_empty());
        assert_eq!(second_wire.kinds(), [MessageKind::ChannelEvent]);

        channel.emit(None, "all", &[]).unwrap();
        assert_eq!(first_wire.kinds(), [MessageKind::ChannelEvent]);
        assert_eq!(second_wire.kinds(), [MessageKind::ChannelEvent]);
    }

    #[test]
    fn oversized_emit_is_refused_and_process_stays_ready() {
        let ui = UiProcess::new();
        ui.set_max_payload(1024);
        let (id, wire) = connected(&ui);
        ui.handle_frame(id, &init_frame()).unwrap();
        let page = announce_page(&ui, id, 1);
        wire.kinds();

        let big = Value::from("x".repeat(4096).as_str());
        let channel = ui.open_channel("foo");
        assert!(matches!(
            channel.emit(Some(&page), "blob", std::slice::from_ref(&big)),
            Err(EndpointError::Frame(FrameError::PayloadTooLarge { max: 1024, .. }))
        ));
        assert!(matches!(
            channel.emit(None, "blob", std::slice::from_ref(&big)),
            Err(EndpointError::Frame(FrameError::PayloadTooLarge { .. }))
        ));
        assert!(matches!(
            ui.eval_script(&page, &"x".repeat(4096), "test", false, |_| {}),
            Err(EndpointError::Frame(FrameError::PayloadTooLarge { .. }))
        ));
        assert_eq!(ui.pending_evals(), 0);
        assert!(wire.kinds().is_empty());

        let handle = ui.process(id).unwrap();
        assert_eq!(handle.state(), ProcessState::Ready);
        assert_eq!(handle.link_status(), EndpointStatus::Connected);
        channel.emit(Some(&page), "small", &[Value::from(1)]).unwrap();
        assert_eq!(wire.kinds(), [MessageKind::ChannelEvent]);
    }

    #[test]
    fn eval_reply_resolves_callback() {
        let ui = UiProcess::new();
        let (id, wire) = connected(&ui);
        ui.handle_frame(id, &init_frame()).unwrap();
        let page = announce_page(&ui, id, 1);
        wire.kinds();

        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        let callback = ui
            .eval_script(&page, "1 + 1", "test", false, move |outcome| {
                *slot.borrow_mut() = Some(outcome);
            })
            .unwrap();
        let sent = wire.0.borrow_mut().pop_front().unwrap();
        let request = EvalRequest::decode(&sent.payload).unwrap();
        assert_eq!(request.callback, callback);
        assert_eq!(request.script, "1 + 1");

        let reply = EvalReply {
            page: page.id(),
            callback,
            result: EvalResult::Value(Value::from(2)),
        };
        ui.handle_frame(id, &reply.to_frame().unwrap()).unwrap();
        assert_eq!(*seen.borrow(), Some(EvalOutcome::Value(Value::from(2))));
        assert_eq!(ui.pending_evals(), 0);
    }

    #[test]
    fn eval_reply_from_another_process_is_ignored() {
        let ui = UiProcess::new();
        let (owner, owner_wire) = connected(&ui);
        let (other, _other_wire) = connected(&ui);
        ui.handle_frame(owner, &init_frame()).unwrap();
        ui.handle_frame(other, &init_frame()).unwrap();
        let page = announce_page(&ui, owner, 1);
        owner_wire.kinds();

        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        let callback = ui
            .eval_script(&page, "document.title", "test", false, move |outcome| {
                *slot.borrow_mut() = Some(outcome);
            })
            .unwrap();
        assert_eq!(owner_wire.kinds(), [MessageKind::Eval]);

        let gone = EvalReply {
            page: page.id(),
            callback,
            result: EvalResult::PageGone,
        };
        ui.handle_frame(other, &gone.to_frame().unwrap()).unwrap();
        assert_eq!(*seen.borrow(), None);
        assert!(page.is_alive());
        assert_eq!(ui.pending_evals(), 1);

        let reply = EvalReply {
            page: page.id(),
            callback,
            result: EvalResult::Value(Value::from("title")),
        };
        ui.handle_frame(owner, &reply.to_frame().unwrap()).unwrap();
        assert_eq!(*seen.borrow(), Some(EvalOutcome::Value(Value::from("title"))));
        assert_eq!(ui.pending_evals(), 0);
    }

    #[test]
    fn crash_is_sent_immediately_and_releases_state() {
        let ui = UiProcess::new();
        let (id, wire) = connected(&ui);
        ui.handle_frame(id, &init_frame()).unwrap();
        let page = announce_page(&ui, id, 1);
        wire.kinds();

        let lost = Rc::new(Cell::new(false));
        let flag = Rc::clone(&lost);
        ui.eval_script(&page, "x", "t", false, move |outcome| {
            flag.set(outcome == EvalOutcome::ProcessLost);
        })
        .unwrap();

        let exits = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&exits);
        ui.signals().add(SIGNAL_PROCESS_EXIT, move |_, args| {
            log.borrow_mut().push(args.to_vec());
        });

        ui.crash(id).unwrap();
        assert_eq!(wire.kinds(), [MessageKind::Eval, MessageKind::Crash]);
        assert!(lost.get());
        assert!(!page.is_alive());
        assert_eq!(ui.process(id).unwrap().state(), ProcessState::Crashed);
        assert_eq!(
            *exits.borrow(),
            [vec![Value::Integer(1), Value::from("crashed")]]
        );

        // Late frames and the eventual disconnect change nothing.
        ui.handle_frame(id, &init_frame()).unwrap();
        ui.connection_lost(id);
        assert!(wire.kinds().is_empty());
        assert_eq!(exits.borrow().len(), 1);
        assert!(matches!(
            ui.eval_script(&page, "x", "t", false, |_| {}),
            Err(EndpointError::PageDead(_))
        ));
    }

    #[test]
    fn unknown_process_is_an_error() {
        let ui = UiProcess::new();
        assert!(matches!(
            ui.handle_frame(ProcessId(7), &init_frame()),
            Err(EndpointError::UnknownProcess(ProcessId(7)))
        ));
    }
}

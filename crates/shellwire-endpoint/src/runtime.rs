//! Running processes on a single-threaded tokio loop.
//!
//! Every connection gets one reader task and one writer task, both spawned
//! with [`tokio::task::spawn_local`], so this module must be driven from
//! inside a [`LocalSet`]. [`block_on_local`] sets one up.

use std::cell::RefCell;
use std::future::Future;
use std::path::Path;
use std::rc::Rc;

use futures_util::{SinkExt, StreamExt};
use shellwire_frame::{Frame, FrameCodec, FrameConfig, MessageKind};
use shellwire_transport::{AsyncUnixListener, UnixDomainSocket};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle, LocalSet};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace, warn};

use crate::content::{ContentProcess, WebEngine};
use crate::endpoint::FrameSink;
use crate::error::{EndpointError, Result};
use crate::process::ProcessId;
use crate::ui::UiProcess;

/// [`FrameSink`] feeding a connection's writer task.
pub struct ChannelSink(mpsc::UnboundedSender<Frame>);

impl FrameSink for ChannelSink {
    fn send_frame(&self, frame: Frame) -> std::result::Result<(), Frame> {
        self.0.send(frame).map_err(|err| err.0)
    }
}

/// Writer tasks that must finish before the process exits.
///
/// A writer ends once its sink is dropped and everything queued is written,
/// so closing the endpoints and then [`WriterTasks::join_all`] flushes every
/// connection.
#[derive(Default)]
pub struct WriterTasks(RefCell<Vec<JoinHandle<()>>>);

impl WriterTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, writer: JoinHandle<()>) {
        let mut writers = self.0.borrow_mut();
        writers.retain(|writer| !writer.is_finished());
        writers.push(writer);
    }

    /// Writers not yet known to have finished.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Wait for every writer pushed so far.
    pub async fn join_all(&self) {
        let writers = std::mem::take(&mut *self.0.borrow_mut());
        for writer in writers {
            if let Err(err) = writer.await {
                warn!(error = %err, "writer task did not finish cleanly");
            }
        }
    }
}

/// A running connection.
pub struct Connection {
    pub sink: ChannelSink,
    /// Completes once the sink is dropped and the queue is written, or on
    /// the first write error.
    pub writer: JoinHandle<()>,
}

type CloseSlot<C> = Rc<RefCell<Option<C>>>;

fn finish<C: FnOnce(Option<EndpointError>)>(slot: &CloseSlot<C>, failure: Option<EndpointError>) {
    let close = slot.borrow_mut().take();
    if let Some(close) = close {
        close(failure);
    }
}

/// Start the reader and writer tasks for `stream`.
///
/// `on_frame` sees inbound frames in arrival order; an error from it drops
/// the connection. `on_close` runs exactly once, when reading stops or a
/// write fails, with the error that ended the connection, if any.
/// Dropping the returned sink ends the writer after it has written
/// everything already submitted.
pub fn spawn_connection<F, C>(
    stream: UnixStream,
    name: String,
    config: &FrameConfig,
    mut on_frame: F,
    on_close: C,
) -> Connection
where
    F: FnMut(Frame) -> Result<()> + 'static,
    C: FnOnce(Option<EndpointError>) + 'static,
{
    let (read_half, write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    let codec = FrameCodec::new(config);
    let on_close: CloseSlot<C> = Rc::new(RefCell::new(Some(on_close)));

    let reader_name = name.clone();
    let reader_close = Rc::clone(&on_close);
    let mut framed_read = FramedRead::new(read_half, codec.clone());
    let reader = task::spawn_local(async move {
        let mut failure = None;
        while let Some(next) = framed_read.next().await {
            let result = next.map_err(EndpointError::from).and_then(|frame| {
                if frame.kind != MessageKind::Log {
                    debug!(
                        connection = %reader_name,
                        kind = %frame.kind,
                        len = frame.payload.len(),
                        "recv"
                    );
                }
                on_frame(frame)
            });
            if let Err(err) = result {
                warn!(connection = %reader_name, error = %err, "dropping connection");
                failure = Some(err);
                break;
            }
        }
        debug!(connection = %reader_name, "reader finished");
        finish(&reader_close, failure);
    });

    let mut framed_write = FramedWrite::new(write_half, codec);
    let writer = task::spawn_local(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(err) = framed_write.send(frame).await {
                warn!(connection = %name, error = %err, "write failed, dropping connection");
                reader.abort();
                finish(&on_close, Some(err.into()));
                break;
            }
        }
        trace!(connection = %name, "writer finished");
    });

    Connection {
        sink: ChannelSink(tx),
        writer,
    }
}

/// Register an accepted content-process connection with `ui`.
///
/// The connection's writer is added to `writers`.
pub fn attach_content(
    ui: &Rc<UiProcess>,
    stream: UnixStream,
    config: &FrameConfig,
    writers: &WriterTasks,
) -> Result<ProcessId> {
    let id = ui.register_process();
    let reader = Rc::clone(ui);
    let closer = Rc::clone(ui);
    let connection = spawn_connection(
        stream,
        id.to_string(),
        config,
        move |frame| reader.handle_frame(id, &frame),
        move |_| closer.connection_lost(id),
    );
    writers.push(connection.writer);
    ui.connect_process(id, Box::new(connection.sink))?;
    Ok(id)
}

/// Accept content processes until the listener fails.
///
/// Outbound payloads are limited to `config.max_payload_size`.
pub async fn serve(
    listener: AsyncUnixListener,
    ui: Rc<UiProcess>,
    config: FrameConfig,
    writers: Rc<WriterTasks>,
) -> Result<()> {
    ui.set_max_payload(config.max_payload_size);
    info!(path = ?listener.path(), "accepting content processes");
    loop {
        let stream = listener.accept().await?;
        let id = attach_content(&ui, stream, &config, &writers)?;
        debug!(process = %id, "content process attached");
    }
}

/// Connect to the UI process's session socket.
///
/// Must be called from within a runtime.
pub fn connect_ui(path: impl AsRef<Path>) -> Result<UnixStream> {
    let stream = UnixDomainSocket::connect(path)?;
    Ok(stream.into_async()?)
}

/// Run `content` over `stream` until the UI goes away.
///
/// Returns the error that ended the connection, if it was not a clean close.
pub async fn run_content<E: WebEngine + 'static>(
    stream: UnixStream,
    content: Rc<ContentProcess<E>>,
    config: FrameConfig,
) -> Result<()> {
    let (done_tx, done_rx) = oneshot::channel();
    content.set_max_payload(config.max_payload_size);
    let reader = Rc::clone(&content);
    let closer = Rc::clone(&content);
    let connection = spawn_connection(
        stream,
        "ui".to_string(),
        &config,
        move |frame| reader.handle_frame(&frame),
        move |failure| {
            closer.connection_lost();
            let _ = done_tx.send(failure);
        },
    );
    content.connect(Box::new(connection.sink));

    let failure = done_rx.await.ok().flatten();
    // Our own queue is closed by now; let it finish writing.
    if let Err(err) = connection.writer.await {
        warn!(error = %err, "writer task did not finish cleanly");
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Drive `future` to completion on a current-thread runtime with a
/// [`LocalSet`].
pub fn block_on_local<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(LocalSet::new().block_on(&runtime, future))
}

#[cfg(test)]
mod tests {
    use shellwire_frame::FrameError;

    use super::*;
    use crate::message::init_frame;

    #[tokio::test(flavor = "current_thread")]
    async fn frames_flow_both_ways() {
        LocalSet::new()
            .run_until(async {
                let (a, b) = UnixStream::pair().unwrap();
                let received = Rc::new(RefCell::new(Vec::new()));
                let log = Rc::clone(&received);
                let (closed_tx, closed_rx) = oneshot::channel();

                let _left = spawn_connection(
                    a,
                    "left".into(),
                    &FrameConfig::default(),
                    move |frame| {
                        log.borrow_mut().push(frame.kind);
                        Ok(())
                    },
                    move |failure| {
                        let _ = closed_tx.send(failure.is_none());
                    },
                );
                let right = spawn_connection(
                    b,
                    "right".into(),
                    &FrameConfig::default(),
                    |_| Ok(()),
                    |_| {},
                );

                right.sink.send_frame(init_frame()).unwrap();
                right
                    .sink
                    .send_frame(Frame::empty(MessageKind::Crash))
                    .unwrap();
                let writers = WriterTasks::new();
                writers.push(right.writer);
                drop(right.sink);
                writers.join_all().await;
                assert!(writers.is_empty());

                assert!(closed_rx.await.unwrap(), "clean close");
                assert_eq!(*received.borrow(), [MessageKind::Init, MessageKind::Crash]);
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn write_failure_closes_without_waiting_for_peer() {
        LocalSet::new()
            .run_until(async {
                let (a, _b) = UnixStream::pair().unwrap();
                let (closed_tx, closed_rx) = oneshot::channel();
                let config = FrameConfig {
                    max_payload_size: 16,
                };

                let connection = spawn_connection(
                    a,
                    "small".into(),
                    &config,
                    |_| Ok(()),
                    move |failure| {
                        let _ = closed_tx.send(failure);
                    },
                );
                connection
                    .sink
                    .send_frame(Frame::new(MessageKind::ChannelEvent, vec![0u8; 64]))
                    .unwrap();

                let failure = closed_rx.await.unwrap();
                assert!(matches!(
                    failure,
                    Some(EndpointError::Frame(FrameError::PayloadTooLarge { size: 64, max: 16 }))
                ));
                connection.writer.await.unwrap();
            })
            .await;
    }
}

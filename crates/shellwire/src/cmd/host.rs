use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use shellwire_endpoint::runtime::{block_on_local, serve, WriterTasks};
use shellwire_endpoint::{default_socket_dir, HostConfig, UiProcess};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cmd::HostArgs;
use crate::exit::{endpoint_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, EventOutput, OutputFormat};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum Stop {
    Interrupted,
    CountReached,
}

pub fn run(args: HostArgs, format: OutputFormat) -> CliResult<i32> {
    let defaults = HostConfig::default();
    let config = HostConfig {
        socket_dir: args.socket_dir.clone().unwrap_or_else(default_socket_dir),
        max_payload_size: args.max_payload.unwrap_or(defaults.max_payload_size),
        ..defaults
    };
    block_on_local(host(args, config, format))
        .map_err(|err| endpoint_error("runtime setup failed", err))?
}

async fn host(args: HostArgs, config: HostConfig, format: OutputFormat) -> CliResult<i32> {
    let socket = config
        .bind(args.path.as_deref())
        .map_err(|err| endpoint_error("bind failed", err))?;
    let path = socket.path().to_path_buf();
    let listener = socket
        .into_async()
        .map_err(|err| transport_error("listen failed", err))?;
    info!(path = %path.display(), "session socket ready");

    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    install_ctrlc_handler(stop_tx.clone())?;

    let ui = UiProcess::new();
    ui.set_max_payload(config.max_payload_size);
    for module in &args.require {
        ui.require_web_module(module)
            .map_err(|err| endpoint_error("require failed", err))?;
    }

    let printed = Rc::new(Cell::new(0usize));
    for spec in &args.on {
        let printed = Rc::clone(&printed);
        let stop = stop_tx.clone();
        let count = args.count;
        let channel_name = spec.channel.clone();
        let event_name = spec.event.clone();
        ui.open_channel(&spec.channel)
            .add_handler(&spec.event, move |page, values| {
                let out = EventOutput::new(&channel_name, &event_name, page, values);
                print_event(&out, format);
                printed.set(printed.get() + 1);
                if count.is_some_and(|count| printed.get() >= count) {
                    let _ = stop.send(Stop::CountReached);
                }
            });
    }

    let writers = Rc::new(WriterTasks::new());
    let stopped = tokio::select! {
        result = serve(listener, Rc::clone(&ui), config.frame_config(), Rc::clone(&writers)) => {
            result.map_err(|err| endpoint_error("serve failed", err))?;
            None
        }
        stop = stop_rx.recv() => stop,
    };
    info!(reason = ?stopped, events = printed.get(), "shutting down");

    for handle in ui.processes() {
        if !handle.state().is_terminal() {
            let _ = ui.close_process(handle.id());
        }
    }
    if tokio::time::timeout(FLUSH_TIMEOUT, writers.join_all())
        .await
        .is_err()
    {
        warn!(timeout = ?FLUSH_TIMEOUT, "content connections did not flush in time");
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(stop: mpsc::UnboundedSender<Stop>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        let _ = stop.send(Stop::Interrupted);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

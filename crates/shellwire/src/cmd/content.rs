use std::rc::Rc;

use shellwire_endpoint::runtime::{block_on_local, connect_ui, run_content};
use shellwire_endpoint::{ContentProcess, Page, PageId, WebEngine, SIGNAL_READY};
use shellwire_frame::FrameConfig;
use shellwire_value::Value;
use tracing::{debug, info};

use crate::cmd::ContentArgs;
use crate::exit::{endpoint_error, CliError, CliResult, SUCCESS, USAGE};

/// Engine without a script runtime: modules are accepted and every script
/// evaluates to its own source text.
struct EchoEngine;

impl WebEngine for EchoEngine {
    fn load_module(&self, name: &str) -> Result<(), String> {
        debug!(module = name, "echo engine has nothing to load");
        Ok(())
    }

    fn evaluate(
        &self,
        page: &Page,
        script: &str,
        source: &str,
        _no_return: bool,
    ) -> Result<Value, String> {
        debug!(page = %page.id(), source, "evaluating");
        Ok(Value::from(script))
    }

    fn scroll_to(&self, page: &Page, h: i32, v: i32) {
        info!(page = %page.id(), h, v, "scroll-to");
    }
}

pub fn run(args: ContentArgs) -> CliResult<i32> {
    block_on_local(content(args)).map_err(|err| endpoint_error("runtime setup failed", err))?
}

async fn content(args: ContentArgs) -> CliResult<i32> {
    let stream = connect_ui(&args.path).map_err(|err| endpoint_error("connect failed", err))?;
    let process = ContentProcess::new(EchoEngine);

    for id in &args.pages {
        let id = PageId::new(*id).ok_or_else(|| CliError::new(USAGE, "page id 0 is reserved"))?;
        process.page_created(id);
    }
    for spec in &args.emit {
        let values: Vec<Value> = spec.args.iter().map(Value::from_json).collect();
        process
            .open_channel(&spec.channel)
            .emit(None, &spec.event, &values)
            .map_err(|err| endpoint_error("emit failed", err))?;
    }
    if args.exit_after_ready {
        let weak = Rc::downgrade(&process);
        process.signals().add(SIGNAL_READY, move |_, _| {
            if let Some(process) = weak.upgrade() {
                process.shutdown();
            }
        });
    }

    run_content(stream, process, FrameConfig::default())
        .await
        .map_err(|err| endpoint_error("connection failed", err))?;
    Ok(SUCCESS)
}

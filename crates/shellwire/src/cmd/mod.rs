use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod content;
pub mod decode;
pub mod doctor;
pub mod host;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a UI process and print channel events from content processes.
    Host(HostArgs),
    /// Connect to a UI process as a content process.
    Content(ContentArgs),
    /// Decode a serialized value buffer and print it.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Host(args) => host::run(args, format),
        Command::Content(args) => content::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
    }
}

/// `CHANNEL:EVENT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    pub channel: String,
    pub event: String,
}

/// `CHANNEL:EVENT[:JSON]`; a JSON array supplies one argument per element.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitSpec {
    pub channel: String,
    pub event: String,
    pub args: Vec<serde_json::Value>,
}

fn split_event(spec: &str) -> Result<(String, String, Option<&str>), String> {
    let mut parts = spec.splitn(3, ':');
    let channel = parts.next().unwrap_or_default();
    let event = parts.next().unwrap_or_default();
    if channel.is_empty() || event.is_empty() {
        return Err(format!("expected CHANNEL:EVENT, got {spec:?}"));
    }
    Ok((channel.to_string(), event.to_string(), parts.next()))
}

fn parse_event_spec(spec: &str) -> Result<EventSpec, String> {
    match split_event(spec)? {
        (channel, event, None) => Ok(EventSpec { channel, event }),
        (_, _, Some(_)) => Err(format!("expected CHANNEL:EVENT, got {spec:?}")),
    }
}

fn parse_emit_spec(spec: &str) -> Result<EmitSpec, String> {
    let (channel, event, json) = split_event(spec)?;
    let args = match json {
        None => Vec::new(),
        Some(text) => match serde_json::from_str(text) {
            Ok(serde_json::Value::Array(items)) => items,
            Ok(value) => vec![value],
            Err(err) => return Err(format!("invalid JSON arguments: {err}")),
        },
    };
    Ok(EmitSpec {
        channel,
        event,
        args,
    })
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Socket path to bind. Default: a fresh session socket in the runtime
    /// directory.
    pub path: Option<PathBuf>,
    /// Directory for the session socket when no path is given.
    #[arg(long, value_name = "DIR", env = "SHELLWIRE_SOCKET_DIR")]
    pub socket_dir: Option<PathBuf>,
    /// Script module to load in every content process (repeatable).
    #[arg(long = "require", value_name = "MODULE")]
    pub require: Vec<String>,
    /// Print events arriving on CHANNEL:EVENT (repeatable).
    #[arg(long = "on", value_name = "CHANNEL:EVENT", value_parser = parse_event_spec)]
    pub on: Vec<EventSpec>,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Maximum frame payload accepted from content processes, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ContentArgs {
    /// Session socket of the UI process.
    pub path: PathBuf,
    /// Announce a page with this id before init completes (repeatable).
    #[arg(long = "page", value_name = "ID")]
    pub pages: Vec<u64>,
    /// Emit CHANNEL:EVENT[:JSON] once the UI is ready (repeatable).
    #[arg(long = "emit", value_name = "CHANNEL:EVENT[:JSON]", value_parser = parse_emit_spec)]
    pub emit: Vec<EmitSpec>,
    /// Disconnect as soon as the UI has answered init.
    #[arg(long)]
    pub exit_after_ready: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded buffer (whitespace ignored).
    #[arg(conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read the raw buffer from a file instead.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

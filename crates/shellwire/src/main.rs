mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "shellwire",
    version,
    about = "UI and content process IPC over Unix sockets"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_subcommand() {
        let cli = Cli::try_parse_from([
            "shellwire",
            "host",
            "/tmp/test.sock",
            "--require",
            "wm",
            "--require",
            "tabs",
            "--on",
            "wm:ping",
            "--count",
            "2",
        ])
        .expect("host args should parse");

        let Command::Host(args) = cli.command else {
            panic!("expected host command");
        };
        assert_eq!(args.require, ["wm", "tabs"]);
        assert_eq!(args.on.len(), 1);
        assert_eq!(args.count, Some(2));
    }

    #[test]
    fn rejects_malformed_event_spec() {
        let err = Cli::try_parse_from(["shellwire", "host", "--on", "no-colon"])
            .expect_err("bad --on should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn decode_rejects_hex_and_file_together() {
        let err = Cli::try_parse_from(["shellwire", "decode", "00", "--file", "/tmp/x"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_content_subcommand() {
        let cli = Cli::try_parse_from([
            "shellwire",
            "content",
            "/tmp/test.sock",
            "--page",
            "1",
            "--emit",
            "wm:ping:42",
            "--exit-after-ready",
        ])
        .expect("content args should parse");
        assert!(matches!(cli.command, Command::Content(_)));
    }
}

use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use shellwire_endpoint::{Page, ProcessId};
use shellwire_value::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A channel event as printed by `host --on`.
#[derive(Debug, Serialize)]
pub struct EventOutput<'a> {
    pub process: Option<u64>,
    pub channel: &'a str,
    pub event: &'a str,
    pub page: Option<u64>,
    pub args: Vec<serde_json::Value>,
    pub timestamp: String,
}

impl<'a> EventOutput<'a> {
    pub fn new(channel: &'a str, event: &'a str, page: Option<&Page>, args: &[Value]) -> Self {
        Self {
            process: page.and_then(Page::owner).map(ProcessId::get),
            channel,
            event,
            page: page.map(|page| page.id().get()),
            args: args.iter().map(value_json).collect(),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_event(out: &EventOutput<'_>, format: OutputFormat) {
    let args = serde_json::Value::Array(out.args.clone());
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "EVENT", "PAGE", "ARGS"])
                .add_row(vec![
                    out.channel.to_string(),
                    out.event.to_string(),
                    optional(out.page),
                    args.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}:{} page={} args={}",
                out.channel,
                out.event,
                optional(out.page),
                args
            );
        }
        OutputFormat::Raw => {
            println!("{args}");
        }
    }
    let _ = std::io::stdout().flush();
}

/// Print decoded values, one per row.
pub fn print_values(values: &[Value], format: OutputFormat) {
    let json: Vec<serde_json::Value> = values.iter().map(value_json).collect();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::Value::Array(json));
        }
        OutputFormat::Pretty => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TYPE", "VALUE"]);
            for (i, (value, json)) in values.iter().zip(&json).enumerate() {
                table.add_row(vec![
                    (i + 1).to_string(),
                    value.type_name().to_string(),
                    json.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Raw => {
            for value in &json {
                println!("{value}");
            }
        }
    }
}

/// JSON rendering of a value; functions cannot cross the wire and print as
/// `null`.
pub fn value_json(value: &Value) -> serde_json::Value {
    value.to_json().unwrap_or(serde_json::Value::Null)
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

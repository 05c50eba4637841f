//! Payload schemas, one per message kind and direction.
//!
//! Fixed-size kinds (`Scroll` from content, `PageCreated`) use little-endian
//! struct layouts. Everything else is a serialized value sequence.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use shellwire_frame::{Frame, MessageKind};
use shellwire_value::Value;

use crate::error::{EndpointError, Result};
use crate::page::PageId;

fn page_value(page: Option<PageId>) -> Value {
    Value::Integer(PageId::to_wire(page) as i64)
}

struct Fields<'a> {
    kind: MessageKind,
    values: std::vec::IntoIter<Value>,
    what: &'a str,
}

impl<'a> Fields<'a> {
    fn decode(kind: MessageKind, payload: &[u8], what: &'a str) -> Result<Self> {
        let values = shellwire_value::decode(payload)?;
        Ok(Self {
            kind,
            values: values.into_iter(),
            what,
        })
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn next(&mut self, field: &str) -> Result<Value> {
        self.values.next().ok_or_else(|| {
            EndpointError::malformed(self.kind, format!("{} is missing {field}", self.what))
        })
    }

    fn string(&mut self, field: &str) -> Result<String> {
        match self.next(field)? {
            Value::String(bytes) => String::from_utf8(bytes.to_vec()).map_err(|_| {
                EndpointError::malformed(self.kind, format!("{field} is not valid UTF-8"))
            }),
            other => Err(self.wrong_type(field, "string", &other)),
        }
    }

    fn integer(&mut self, field: &str) -> Result<i64> {
        let value = self.next(field)?;
        value
            .as_integer()
            .ok_or_else(|| self.wrong_type(field, "integer", &value))
    }

    fn int32(&mut self, field: &str) -> Result<i32> {
        let raw = self.integer(field)?;
        i32::try_from(raw)
            .map_err(|_| EndpointError::malformed(self.kind, format!("{field} out of range")))
    }

    fn page(&mut self, field: &str) -> Result<Option<PageId>> {
        Ok(PageId::new(self.integer(field)? as u64))
    }

    fn boolean(&mut self, field: &str) -> Result<bool> {
        let value = self.next(field)?;
        value
            .as_bool()
            .ok_or_else(|| self.wrong_type(field, "boolean", &value))
    }

    fn reference(&mut self, field: &str) -> Result<u64> {
        let value = self.next(field)?;
        value
            .as_ref_id()
            .ok_or_else(|| self.wrong_type(field, "reference", &value))
    }

    fn rest(self) -> Vec<Value> {
        self.values.collect()
    }

    fn finish(self) -> Result<()> {
        if self.values.len() == 0 {
            Ok(())
        } else {
            Err(EndpointError::malformed(
                self.kind,
                format!("{} has {} trailing values", self.what, self.values.len()),
            ))
        }
    }

    fn wrong_type(&self, field: &str, expected: &str, got: &Value) -> EndpointError {
        EndpointError::malformed(
            self.kind,
            format!("{field}: expected {expected}, got {}", got.type_name()),
        )
    }
}

fn codec_frame(kind: MessageKind, values: &[Value]) -> Result<Frame> {
    Ok(Frame::new(kind, shellwire_value::encode(values)?))
}

/// UI → content: load a script module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireModule {
    pub name: String,
}

impl RequireModule {
    pub fn to_frame(&self) -> Result<Frame> {
        if self.name.is_empty() || self.name.contains('\0') {
            return Err(EndpointError::malformed(
                MessageKind::RequireModule,
                "module name must be non-empty and contain no NUL",
            ));
        }
        let mut buf = BytesMut::with_capacity(self.name.len() + 1);
        buf.put_slice(self.name.as_bytes());
        buf.put_u8(0);
        Ok(Frame::new(MessageKind::RequireModule, buf.freeze()))
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::RequireModule;
        let name = match payload.split_last() {
            Some((0, name)) if !name.is_empty() && !name.contains(&0) => name,
            _ => return Err(EndpointError::malformed(kind, "expected one NUL-terminated name")),
        };
        let name = std::str::from_utf8(name)
            .map_err(|_| EndpointError::malformed(kind, "module name is not valid UTF-8"))?;
        Ok(Self {
            name: name.to_owned(),
        })
    }
}

/// Both directions: a named channel event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub page: Option<PageId>,
    pub args: Vec<Value>,
}

impl ChannelEvent {
    pub fn to_frame(&self) -> Result<Frame> {
        encode_channel_event(&self.channel, &self.event, self.page, &self.args)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut fields = Fields::decode(MessageKind::ChannelEvent, payload, "channel event")?;
        Ok(Self {
            channel: fields.string("channel")?,
            event: fields.string("event")?,
            page: fields.page("page_id")?,
            args: fields.rest(),
        })
    }
}

/// Encode a channel event without taking ownership of the arguments.
pub fn encode_channel_event(
    channel: &str,
    event: &str,
    page: Option<PageId>,
    args: &[Value],
) -> Result<Frame> {
    let mut values = Vec::with_capacity(args.len() + 3);
    values.push(Value::from(channel));
    values.push(Value::from(event));
    values.push(page_value(page));
    values.extend(args.iter().cloned());
    codec_frame(MessageKind::ChannelEvent, &values)
}

/// What a scroll notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum ScrollSubtype {
    DocResize = 0,
    WinResize = 1,
    Scroll = 2,
}

impl ScrollSubtype {
    pub fn name(self) -> &'static str {
        match self {
            ScrollSubtype::DocResize => "docresize",
            ScrollSubtype::WinResize => "winresize",
            ScrollSubtype::Scroll => "scroll",
        }
    }

    fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(ScrollSubtype::DocResize),
            1 => Some(ScrollSubtype::WinResize),
            2 => Some(ScrollSubtype::Scroll),
            _ => None,
        }
    }
}

/// Content → UI: scroll position or size change of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollNotify {
    pub h: i32,
    pub v: i32,
    pub page: Option<PageId>,
    pub subtype: ScrollSubtype,
}

impl ScrollNotify {
    pub const WIRE_SIZE: usize = 20;

    pub fn to_frame(&self) -> Frame {
        let mut buf = BytesMut::with_capacity(Self::WIRE_SIZE);
        buf.put_i32_le(self.h);
        buf.put_i32_le(self.v);
        buf.put_u64_le(PageId::to_wire(self.page));
        buf.put_u32_le(self.subtype as u32);
        Frame::new(MessageKind::Scroll, buf.freeze())
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::Scroll;
        if payload.len() != Self::WIRE_SIZE {
            return Err(EndpointError::malformed(
                kind,
                format!("expected {} bytes, got {}", Self::WIRE_SIZE, payload.len()),
            ));
        }
        let h = payload.get_i32_le();
        let v = payload.get_i32_le();
        let page = PageId::new(payload.get_u64_le());
        let raw = payload.get_u32_le();
        let subtype = ScrollSubtype::from_wire(raw)
            .ok_or_else(|| EndpointError::malformed(kind, format!("unknown subtype {raw}")))?;
        Ok(Self { h, v, page, subtype })
    }
}

/// UI → content: scroll a page to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTo {
    pub page: PageId,
    pub h: i32,
    pub v: i32,
}

impl ScrollTo {
    pub fn to_frame(&self) -> Result<Frame> {
        codec_frame(
            MessageKind::Scroll,
            &[
                page_value(Some(self.page)),
                Value::from(self.h),
                Value::from(self.v),
            ],
        )
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::Scroll;
        let mut fields = Fields::decode(kind, payload, "scroll-to")?;
        let page = fields
            .page("page_id")?
            .ok_or_else(|| EndpointError::malformed(kind, "scroll-to needs a page"))?;
        let h = fields.int32("h")?;
        let v = fields.int32("v")?;
        fields.finish()?;
        Ok(Self { page, h, v })
    }
}

/// UI → content: evaluate a script in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub no_return: bool,
    pub script: String,
    pub source: String,
    pub page: PageId,
    /// UI-side callback id echoed back in the reply.
    pub callback: u64,
}

impl EvalRequest {
    pub fn to_frame(&self) -> Result<Frame> {
        codec_frame(
            MessageKind::Eval,
            &[
                Value::from(self.no_return),
                Value::from(self.script.as_str()),
                Value::from(self.source.as_str()),
                page_value(Some(self.page)),
                Value::Ref(self.callback),
            ],
        )
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::Eval;
        let mut fields = Fields::decode(kind, payload, "eval request")?;
        let no_return = fields.boolean("no_return")?;
        let script = fields.string("script")?;
        let source = fields.string("source")?;
        let page = fields
            .page("page_id")?
            .ok_or_else(|| EndpointError::malformed(kind, "eval request needs a page"))?;
        let callback = fields.reference("callback")?;
        fields.finish()?;
        Ok(Self {
            no_return,
            script,
            source,
            page,
            callback,
        })
    }
}

/// Result carried by an eval reply.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    /// The page no longer exists in the content process.
    PageGone,
    Value(Value),
    Error(String),
}

/// Content → UI: outcome of an [`EvalRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReply {
    pub page: PageId,
    pub callback: u64,
    pub result: EvalResult,
}

impl EvalReply {
    pub fn to_frame(&self) -> Result<Frame> {
        let mut values = vec![page_value(Some(self.page)), Value::Ref(self.callback)];
        match &self.result {
            EvalResult::PageGone => {}
            EvalResult::Value(value) => values.push(value.clone()),
            EvalResult::Error(message) => {
                values.push(Value::Nil);
                values.push(Value::from(message.as_str()));
            }
        }
        codec_frame(MessageKind::Eval, &values)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::Eval;
        let mut fields = Fields::decode(kind, payload, "eval reply")?;
        let page = fields
            .page("page_id")?
            .ok_or_else(|| EndpointError::malformed(kind, "eval reply needs a page"))?;
        let callback = fields.reference("callback")?;
        let result = match fields.len() {
            0 => EvalResult::PageGone,
            1 => EvalResult::Value(fields.next("value")?),
            2 => {
                if !fields.next("value")?.is_nil() {
                    return Err(EndpointError::malformed(
                        kind,
                        "error reply must carry nil as its value",
                    ));
                }
                EvalResult::Error(fields.string("error")?)
            }
            n => {
                return Err(EndpointError::malformed(
                    kind,
                    format!("eval reply has {} values", n + 2),
                ))
            }
        };
        Ok(Self {
            page,
            callback,
            result,
        })
    }
}

/// Severity of a forwarded log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Fatal = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Verbose = 4,
    Debug = 5,
}

impl LogLevel {
    fn from_wire(value: i64) -> Option<Self> {
        Some(match value {
            0 => LogLevel::Fatal,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Verbose,
            5 => LogLevel::Debug,
            _ => return None,
        })
    }
}

/// Content → UI: a log record to surface in the UI process's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

impl LogRecord {
    pub fn to_frame(&self) -> Result<Frame> {
        codec_frame(
            MessageKind::Log,
            &[
                Value::Integer(self.level as i64),
                Value::from(self.target.as_str()),
                Value::from(self.message.as_str()),
            ],
        )
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::Log;
        let mut fields = Fields::decode(kind, payload, "log record")?;
        let raw = fields.integer("level")?;
        let level = LogLevel::from_wire(raw)
            .ok_or_else(|| EndpointError::malformed(kind, format!("unknown log level {raw}")))?;
        let target = fields.string("target")?;
        let message = fields.string("message")?;
        fields.finish()?;
        Ok(Self {
            level,
            target,
            message,
        })
    }
}

/// Content → UI: a page now exists in the sending process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCreated {
    pub page: PageId,
    pub pid: i32,
}

impl PageCreated {
    pub const WIRE_SIZE: usize = 12;

    pub fn to_frame(&self) -> Frame {
        let mut buf = BytesMut::with_capacity(Self::WIRE_SIZE);
        buf.put_u64_le(self.page.get());
        buf.put_i32_le(self.pid);
        Frame::new(MessageKind::PageCreated, buf.freeze())
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self> {
        let kind = MessageKind::PageCreated;
        if payload.len() != Self::WIRE_SIZE {
            return Err(EndpointError::malformed(
                kind,
                format!("expected {} bytes, got {}", Self::WIRE_SIZE, payload.len()),
            ));
        }
        let page = PageId::new(payload.get_u64_le())
            .ok_or_else(|| EndpointError::malformed(kind, "page id 0"))?;
        let pid = payload.get_i32_le();
        Ok(Self { page, pid })
    }
}

/// An `Init` frame (both directions).
pub fn init_frame() -> Frame {
    Frame::empty(MessageKind::Init)
}

/// A `Crash` frame.
pub fn crash_frame() -> Frame {
    Frame::empty(MessageKind::Crash)
}

#[cfg(test)]
mod tests {
    use shellwire_value::Table;

    use super::*;

    fn page(n: u64) -> PageId {
        PageId::new(n).unwrap()
    }

    #[test]
    fn require_module_is_nul_terminated() {
        let frame = RequireModule {
            name: "mymod".into(),
        }
        .to_frame()
        .unwrap();
        assert_eq!(frame.payload.as_ref(), b"mymod\0");
        assert_eq!(RequireModule::decode(&frame.payload).unwrap().name, "mymod");

        for bad in [&b"mymod"[..], &b"\0"[..], &b"a\0b\0"[..], &b""[..]] {
            assert!(RequireModule::decode(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn channel_event_carries_page_and_args() {
        let mut table = Table::new();
        table.set("k", "v").unwrap();
        let event = ChannelEvent {
            channel: "wm".into(),
            event: "ping".into(),
            page: Some(page(9)),
            args: vec![Value::from(42), Value::from(table)],
        };
        let frame = event.to_frame().unwrap();
        assert_eq!(frame.kind, MessageKind::ChannelEvent);
        assert_eq!(ChannelEvent::decode(&frame.payload).unwrap(), event);
    }

    #[test]
    fn channel_event_without_page_is_zero() {
        let frame = encode_channel_event("wm", "ping", None, &[]).unwrap();
        let values = shellwire_value::decode(&frame.payload).unwrap();
        assert_eq!(values[2], Value::Integer(0));
        assert_eq!(ChannelEvent::decode(&frame.payload).unwrap().page, None);
    }

    #[test]
    fn channel_event_rejects_wrong_shape() {
        let payload = shellwire_value::encode(&[Value::from("wm")]).unwrap();
        assert!(matches!(
            ChannelEvent::decode(&payload),
            Err(EndpointError::Malformed { .. })
        ));
        let payload =
            shellwire_value::encode(&[Value::from(1), Value::from("e"), Value::from(0)]).unwrap();
        assert!(ChannelEvent::decode(&payload).is_err());
    }

    #[test]
    fn scroll_notify_layout() {
        let notify = ScrollNotify {
            h: -3,
            v: 250,
            page: Some(page(0x0102)),
            subtype: ScrollSubtype::WinResize,
        };
        let frame = notify.to_frame();
        assert_eq!(frame.payload.len(), ScrollNotify::WIRE_SIZE);
        assert_eq!(&frame.payload[..4], &(-3i32).to_le_bytes());
        assert_eq!(&frame.payload[8..16], &0x0102u64.to_le_bytes());
        assert_eq!(&frame.payload[16..], &1u32.to_le_bytes());
        assert_eq!(ScrollNotify::decode(&frame.payload).unwrap(), notify);

        let mut bad = frame.payload.to_vec();
        bad[16] = 7;
        assert!(ScrollNotify::decode(&bad).is_err());
        assert!(ScrollNotify::decode(&bad[..19]).is_err());
    }

    #[test]
    fn scroll_to_uses_codec() {
        let request = ScrollTo {
            page: page(4),
            h: 0,
            v: 900,
        };
        let frame = request.to_frame().unwrap();
        assert_eq!(
            shellwire_value::decode(&frame.payload).unwrap(),
            vec![Value::Integer(4), Value::Integer(0), Value::Integer(900)]
        );
        assert_eq!(ScrollTo::decode(&frame.payload).unwrap(), request);
    }

    #[test]
    fn eval_request_shape() {
        let request = EvalRequest {
            no_return: false,
            script: "1 + 1".into(),
            source: "test.js".into(),
            page: page(2),
            callback: 17,
        };
        let frame = request.to_frame().unwrap();
        assert_eq!(
            shellwire_value::decode(&frame.payload).unwrap(),
            vec![
                Value::Boolean(false),
                Value::from("1 + 1"),
                Value::from("test.js"),
                Value::Integer(2),
                Value::Ref(17),
            ]
        );
        assert_eq!(EvalRequest::decode(&frame.payload).unwrap(), request);
    }

    #[test]
    fn eval_reply_variants() {
        for result in [
            EvalResult::PageGone,
            EvalResult::Value(Value::from(2)),
            EvalResult::Value(Value::Nil),
            EvalResult::Error("test.js: ReferenceError".into()),
        ] {
            let reply = EvalReply {
                page: page(2),
                callback: 17,
                result,
            };
            let frame = reply.to_frame().unwrap();
            assert_eq!(EvalReply::decode(&frame.payload).unwrap(), reply);
        }

        let odd = shellwire_value::encode(&[
            Value::Integer(2),
            Value::Ref(1),
            Value::from(true),
            Value::from("err"),
        ])
        .unwrap();
        assert!(EvalReply::decode(&odd).is_err());
    }

    #[test]
    fn log_record_levels() {
        let record = LogRecord {
            level: LogLevel::Warn,
            target: "content".into(),
            message: "hello".into(),
        };
        let frame = record.to_frame().unwrap();
        assert_eq!(LogRecord::decode(&frame.payload).unwrap(), record);

        let bad = shellwire_value::encode(&[Value::Integer(9), Value::from("t"), Value::from("m")])
            .unwrap();
        assert!(LogRecord::decode(&bad).is_err());
    }

    #[test]
    fn page_created_layout() {
        let created = PageCreated {
            page: page(77),
            pid: 4242,
        };
        let frame = created.to_frame();
        assert_eq!(frame.payload.len(), PageCreated::WIRE_SIZE);
        assert_eq!(PageCreated::decode(&frame.payload).unwrap(), created);
        assert!(PageCreated::decode(&[0u8; 12]).is_err());
        assert!(PageCreated::decode(&[1u8; 8]).is_err());
    }
}

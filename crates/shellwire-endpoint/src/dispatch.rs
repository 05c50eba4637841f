//! Decoding inbound frames and routing them to a handler by kind.

use shellwire_frame::{Frame, MessageKind};
use tracing::debug;

use crate::error::Result;
use crate::message::{
    ChannelEvent, EvalReply, EvalRequest, LogRecord, PageCreated, RequireModule, ScrollNotify,
    ScrollTo,
};

/// Which end of the connection a frame is being received on.
///
/// `Scroll` and `Eval` carry different payloads in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ui,
    Content,
}

fn ignored(kind: MessageKind) -> Result<()> {
    debug!(%kind, "no handler for message kind, ignored");
    Ok(())
}

/// Per-kind handlers. Anything not overridden is logged and ignored.
pub trait MessageHandler {
    fn on_require_module(&self, _msg: RequireModule) -> Result<()> {
        ignored(MessageKind::RequireModule)
    }

    fn on_channel_event(&self, _msg: ChannelEvent) -> Result<()> {
        ignored(MessageKind::ChannelEvent)
    }

    fn on_scroll_notify(&self, _msg: ScrollNotify) -> Result<()> {
        ignored(MessageKind::Scroll)
    }

    fn on_scroll_to(&self, _msg: ScrollTo) -> Result<()> {
        ignored(MessageKind::Scroll)
    }

    fn on_init(&self) -> Result<()> {
        ignored(MessageKind::Init)
    }

    fn on_eval_request(&self, _msg: EvalRequest) -> Result<()> {
        ignored(MessageKind::Eval)
    }

    fn on_eval_reply(&self, _msg: EvalReply) -> Result<()> {
        ignored(MessageKind::Eval)
    }

    fn on_log(&self, _msg: LogRecord) -> Result<()> {
        ignored(MessageKind::Log)
    }

    fn on_page_created(&self, _msg: PageCreated) -> Result<()> {
        ignored(MessageKind::PageCreated)
    }

    fn on_crash(&self) -> Result<()> {
        ignored(MessageKind::Crash)
    }
}

/// Decode `frame` as received on `side` and call the matching handler.
///
/// A payload that does not match its kind's schema is an error; the caller
/// treats it as a protocol violation.
pub fn dispatch<H: MessageHandler + ?Sized>(side: Side, handler: &H, frame: &Frame) -> Result<()> {
    let payload = &frame.payload[..];
    match (frame.kind, side) {
        (MessageKind::RequireModule, _) => handler.on_require_module(RequireModule::decode(payload)?),
        (MessageKind::ChannelEvent, _) => handler.on_channel_event(ChannelEvent::decode(payload)?),
        (MessageKind::Scroll, Side::Ui) => handler.on_scroll_notify(ScrollNotify::decode(payload)?),
        (MessageKind::Scroll, Side::Content) => handler.on_scroll_to(ScrollTo::decode(payload)?),
        (MessageKind::Init, _) => handler.on_init(),
        (MessageKind::Eval, Side::Ui) => handler.on_eval_reply(EvalReply::decode(payload)?),
        (MessageKind::Eval, Side::Content) => handler.on_eval_request(EvalRequest::decode(payload)?),
        (MessageKind::Log, _) => handler.on_log(LogRecord::decode(payload)?),
        (MessageKind::PageCreated, _) => handler.on_page_created(PageCreated::decode(payload)?),
        (MessageKind::Crash, _) => handler.on_crash(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use shellwire_value::Value;

    use super::*;
    use crate::error::EndpointError;
    use crate::message::ScrollSubtype;
    use crate::page::PageId;

    #[derive(Default)]
    struct Trace(RefCell<Vec<&'static str>>);

    impl MessageHandler for Trace {
        fn on_scroll_notify(&self, _msg: ScrollNotify) -> Result<()> {
            self.0.borrow_mut().push("scroll-notify");
            Ok(())
        }

        fn on_scroll_to(&self, _msg: ScrollTo) -> Result<()> {
            self.0.borrow_mut().push("scroll-to");
            Ok(())
        }

        fn on_init(&self) -> Result<()> {
            self.0.borrow_mut().push("init");
            Ok(())
        }
    }

    #[test]
    fn scroll_decodes_per_side() {
        let page = PageId::new(1).unwrap();
        let notify = ScrollNotify {
            h: 1,
            v: 2,
            page: Some(page),
            subtype: ScrollSubtype::Scroll,
        }
        .to_frame();
        let to = ScrollTo {
            page,
            h: 3,
            v: 4,
        }
        .to_frame()
        .unwrap();

        let trace = Trace::default();
        dispatch(Side::Ui, &trace, &notify).unwrap();
        dispatch(Side::Content, &trace, &to).unwrap();
        assert_eq!(*trace.0.borrow(), ["scroll-notify", "scroll-to"]);

        // A content-bound scroll payload is not a valid notification.
        assert!(dispatch(Side::Ui, &trace, &to).is_err());
    }

    #[test]
    fn unhandled_kinds_are_ignored() {
        let trace = Trace::default();
        let frame = ChannelEvent {
            channel: "foo".into(),
            event: "ping".into(),
            page: None,
            args: vec![Value::from(1)],
        }
        .to_frame()
        .unwrap();
        dispatch(Side::Content, &trace, &frame).unwrap();
        dispatch(Side::Ui, &trace, &crate::message::init_frame()).unwrap();
        assert_eq!(*trace.0.borrow(), ["init"]);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let trace = Trace::default();
        let frame = Frame::new(MessageKind::PageCreated, &b"short"[..]);
        assert!(matches!(
            dispatch(Side::Ui, &trace, &frame),
            Err(EndpointError::Malformed {
                kind: MessageKind::PageCreated,
                ..
            })
        ));
    }
}

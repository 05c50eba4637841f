use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::kind::MessageKind;

/// Frame header: length (4) + kind (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// One typed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// What the payload means.
    pub kind: MessageKind,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: MessageKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// A frame with no payload (`Init`, `Crash`).
    pub fn empty(kind: MessageKind) -> Self {
        Self::new(kind, Bytes::new())
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Fail with [`FrameError::PayloadTooLarge`] if a peer limited to
    /// `max_payload` bytes would reject this frame.
    pub fn check_size(&self, max_payload: usize) -> Result<()> {
        check_payload_size(self.payload.len(), max_payload)
    }
}

pub(crate) fn check_payload_size(size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(FrameError::PayloadTooLarge { size, max });
    }
    Ok(())
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬─────────────────┐
/// │ Length       │ Kind         │ Payload         │
/// │ (4B LE)      │ (4B LE)      │ (Length bytes)  │
/// └──────────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_frame(kind: MessageKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    check_payload_size(payload.len(), u32::MAX as usize)?;
    check_empty(kind, payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_u32_le(kind.wire_value());
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly one frame's bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut header = &src[..HEADER_SIZE];
    let payload_len = header.get_u32_le() as usize;
    let kind = MessageKind::from_wire(header.get_u32_le())?;

    check_payload_size(payload_len, max_payload)?;
    check_empty(kind, payload_len)?;

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { kind, payload }))
}

fn check_empty(kind: MessageKind, len: usize) -> Result<()> {
    if !kind.has_payload() && len != 0 {
        return Err(FrameError::UnexpectedPayload { kind, len });
    }
    Ok(())
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut buf = BytesMut::new();
        encode_frame(MessageKind::PageCreated, b"abc", &mut buf).unwrap();

        assert_eq!(&buf[..4], &3u32.to_le_bytes());
        assert_eq!(&buf[4..8], &0x40u32.to_le_bytes());
        assert_eq!(&buf[8..], b"abc");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"hello, shellwire!";

        encode_frame(MessageKind::ChannelEvent, payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(frame.kind, MessageKind::ChannelEvent);
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x05, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3, "partial header must stay buffered");
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(MessageKind::Log, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_decode_unknown_kind() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(0);
        buf.put_u32_le(0x300);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::UnknownKind(0x300))));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1024 * 1024 * 32);
        buf.put_u32_le(MessageKind::Eval.wire_value());

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_check_size_against_peer_limit() {
        let frame = Frame::new(MessageKind::ChannelEvent, vec![0u8; 4096]);
        assert!(frame.check_size(4096).is_ok());
        assert!(matches!(
            frame.check_size(1024),
            Err(FrameError::PayloadTooLarge {
                size: 4096,
                max: 1024
            })
        ));
        assert!(Frame::empty(MessageKind::Init).check_size(0).is_ok());
    }

    #[test]
    fn test_empty_kinds_reject_payload() {
        let mut buf = BytesMut::new();
        let err = encode_frame(MessageKind::Crash, b"x", &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::UnexpectedPayload { .. }));
        assert!(buf.is_empty());

        buf.put_u32_le(1);
        buf.put_u32_le(MessageKind::Init.wire_value());
        buf.put_u8(0);
        let err = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnexpectedPayload {
                kind: MessageKind::Init,
                len: 1
            }
        ));
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(MessageKind::Init, b"", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame, Frame::empty(MessageKind::Init));
    }

    #[test]
    fn test_every_split_point_yields_same_frames() {
        let mut wire = BytesMut::new();
        encode_frame(MessageKind::RequireModule, b"mymod\0", &mut wire).unwrap();
        encode_frame(MessageKind::Init, b"", &mut wire).unwrap();
        encode_frame(MessageKind::ChannelEvent, &[7u8; 300], &mut wire).unwrap();
        let wire = wire.freeze();

        let mut whole = BytesMut::from(wire.as_ref());
        let mut expected = Vec::new();
        while let Some(frame) = decode_frame(&mut whole, DEFAULT_MAX_PAYLOAD).unwrap() {
            expected.push(frame);
        }
        assert_eq!(expected.len(), 3);

        for split in 0..=wire.len() {
            let mut buf = BytesMut::new();
            let mut got = Vec::new();
            for chunk in [&wire[..split], &wire[split..]] {
                buf.extend_from_slice(chunk);
                while let Some(frame) = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap() {
                    got.push(frame);
                }
            }
            assert_eq!(got, expected, "split at {split}");
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(MessageKind::Log, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4);
    }
}

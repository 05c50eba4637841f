//! Binary encoding of value sequences.
//!
//! Each value is a one-byte tag followed by its body:
//!
//! | tag  | type      | body                                   |
//! |------|-----------|----------------------------------------|
//! | 0x00 | nil       | none                                   |
//! | 0x01 | boolean   | 1 byte, 0 or 1                         |
//! | 0x02 | reference | u64 LE                                 |
//! | 0x03 | number    | f64 LE                                 |
//! | 0x04 | string    | u32 LE length, then the bytes          |
//! | 0x05 | table     | key/value pairs, then the 0xFF marker  |
//! | 0x06 | integer   | i64 LE                                 |
//!
//! Positional table entries are written as integer keys and land back in
//! the positional part on decode.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::table::{Table, TableKey};
use crate::value::Value;

const TAG_NIL: u8 = 0x00;
const TAG_BOOLEAN: u8 = 0x01;
const TAG_REF: u8 = 0x02;
const TAG_NUMBER: u8 = 0x03;
const TAG_STRING: u8 = 0x04;
const TAG_TABLE: u8 = 0x05;
const TAG_INTEGER: u8 = 0x06;
const TAG_END: u8 = 0xFF;

/// Deepest table nesting accepted in either direction.
pub const MAX_DEPTH: usize = 128;

/// Encode a sequence of values.
pub fn encode(values: &[Value]) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode_into(values, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the encoding of `values` to `dst`.
///
/// On error `dst` is left as it was before the call.
pub fn encode_into(values: &[Value], dst: &mut BytesMut) -> Result<()> {
    let start = dst.len();
    let result = values
        .iter()
        .try_for_each(|value| encode_value(value, dst, start, 0));
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

fn encode_value(value: &Value, dst: &mut BytesMut, start: usize, depth: usize) -> Result<()> {
    match value {
        Value::Nil => dst.put_u8(TAG_NIL),
        Value::Boolean(b) => {
            dst.put_u8(TAG_BOOLEAN);
            dst.put_u8(u8::from(*b));
        }
        Value::Ref(id) => {
            dst.put_u8(TAG_REF);
            dst.put_u64_le(*id);
        }
        Value::Number(n) => {
            dst.put_u8(TAG_NUMBER);
            dst.put_f64_le(*n);
        }
        Value::Integer(i) => {
            dst.put_u8(TAG_INTEGER);
            dst.put_i64_le(*i);
        }
        Value::String(s) => {
            let len = u32::try_from(s.len()).map_err(|_| CodecError::StringTooLong(s.len()))?;
            dst.put_u8(TAG_STRING);
            dst.put_u32_le(len);
            dst.put_slice(s);
        }
        Value::Table(table) => {
            if depth >= MAX_DEPTH {
                return Err(CodecError::TooDeep {
                    offset: dst.len() - start,
                    max: MAX_DEPTH,
                });
            }
            dst.put_u8(TAG_TABLE);
            for (key, item) in table.pairs() {
                encode_value(&key.to_value(), dst, start, depth + 1)?;
                encode_value(item, dst, start, depth + 1)?;
            }
            dst.put_u8(TAG_END);
        }
        Value::Function(_) => return Err(CodecError::Unsupported(value.type_name())),
    }
    Ok(())
}

/// Decode every value in `src`.
pub fn decode(src: &[u8]) -> Result<Vec<Value>> {
    let mut reader = Reader { src, pos: 0 };
    let mut values = Vec::new();
    while reader.pos < src.len() {
        values.push(reader.value(0)?);
    }
    Ok(values)
}

struct Reader<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.src.len() - self.pos;
        if remaining < n {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n - remaining,
            });
        }
        let out = &self.src[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        let offset = self.pos;
        let [tag] = self.array::<1>()?;
        let value = match tag {
            TAG_NIL => Value::Nil,
            TAG_BOOLEAN => match self.array::<1>()? {
                [0] => Value::Boolean(false),
                [1] => Value::Boolean(true),
                [byte] => {
                    return Err(CodecError::InvalidBoolean {
                        offset: offset + 1,
                        byte,
                    })
                }
            },
            TAG_REF => Value::Ref(u64::from_le_bytes(self.array()?)),
            TAG_NUMBER => Value::Number(f64::from_le_bytes(self.array()?)),
            TAG_INTEGER => Value::Integer(i64::from_le_bytes(self.array()?)),
            TAG_STRING => {
                let len = u32::from_le_bytes(self.array()?) as usize;
                Value::String(Bytes::copy_from_slice(self.take(len)?))
            }
            TAG_TABLE => {
                if depth >= MAX_DEPTH {
                    return Err(CodecError::TooDeep {
                        offset,
                        max: MAX_DEPTH,
                    });
                }
                Value::Table(self.table(depth + 1)?)
            }
            TAG_END => return Err(CodecError::UnexpectedEnd { offset }),
            tag => return Err(CodecError::UnknownTag { offset, tag }),
        };
        Ok(value)
    }

    fn table(&mut self, depth: usize) -> Result<Table> {
        let mut table = Table::new();
        loop {
            match self.peek() {
                Some(TAG_END) => {
                    self.pos += 1;
                    return Ok(table);
                }
                None => {
                    return Err(CodecError::Truncated {
                        offset: self.pos,
                        needed: 1,
                    })
                }
                Some(_) => {}
            }

            let key_offset = self.pos;
            let key = self.value(depth)?;
            let key = TableKey::from_value(&key).map_err(|reason| CodecError::InvalidKey {
                offset: key_offset,
                reason,
            })?;
            let value = self.value(depth)?;
            table.set_key(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Function;

    fn roundtrip(values: Vec<Value>) {
        let bytes = encode(&values).unwrap();
        assert_eq!(decode(&bytes).unwrap(), values);
    }

    #[test]
    fn empty_sequence() {
        assert!(encode(&[]).unwrap().is_empty());
        assert_eq!(decode(&[]).unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn scalar_sequence_preserves_count_and_order() {
        roundtrip(vec![
            Value::Nil,
            Value::from(true),
            Value::from(false),
            Value::from(42),
            Value::from(-1.25),
            Value::from(f64::INFINITY),
            Value::from(""),
            Value::from(&b"nul\0inside\xfe"[..]),
            Value::Ref(u64::MAX),
            Value::Nil,
        ]);
    }

    #[test]
    fn nested_tables() {
        let mut inner = Table::from_array(vec![1.into(), 2.into()]);
        inner.set("deep", Table::new()).unwrap();
        let mut outer = Table::new();
        outer.set("inner", inner).unwrap();
        outer.set(true, "yes").unwrap();
        outer.set(0.5, "half").unwrap();
        outer.push("first");

        roundtrip(vec![Value::from(outer), Value::from("after")]);
    }

    #[test]
    fn integer_and_number_stay_distinct() {
        roundtrip(vec![Value::Integer(3), Value::Number(3.0)]);
    }

    #[test]
    fn wire_layout_of_string() {
        let bytes = encode(&[Value::from("ab")]).unwrap();
        assert_eq!(bytes.as_ref(), &[TAG_STRING, 2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn function_is_unsupported() {
        let f = Function::new(|_| Vec::new());
        let mut table = Table::new();
        table.set("cb", f.clone()).unwrap();

        assert_eq!(
            encode(&[Value::from(1), Value::from(f)]),
            Err(CodecError::Unsupported("function"))
        );
        assert_eq!(
            encode(&[Value::from(table)]),
            Err(CodecError::Unsupported("function"))
        );
    }

    #[test]
    fn encode_into_restores_buffer_on_error() {
        let mut dst = BytesMut::from(&b"keep"[..]);
        let f = Function::new(|_| Vec::new());
        assert!(encode_into(&[Value::from("x"), Value::from(f)], &mut dst).is_err());
        assert_eq!(dst.as_ref(), b"keep");
    }

    #[test]
    fn truncated_buffers_rejected_at_every_cut() {
        let mut table = Table::from_array(vec!["a".into(), 7.into()]);
        table.set("k", 1.5).unwrap();
        table.set("s", "hello").unwrap();
        let bytes = encode(&[Value::from(table)]).unwrap();

        for cut in 1..bytes.len() {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, CodecError::Truncated { .. }),
                "cut {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn truncated_reports_offset() {
        let err = decode(&[TAG_INTEGER, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                offset: 1,
                needed: 6
            }
        );
    }

    #[test]
    fn unknown_tag_rejected() {
        let err = decode(&[TAG_NIL, 0x42]).unwrap_err();
        assert_eq!(err, CodecError::UnknownTag { offset: 1, tag: 0x42 });
    }

    #[test]
    fn stray_end_marker_rejected() {
        assert_eq!(
            decode(&[TAG_END]).unwrap_err(),
            CodecError::UnexpectedEnd { offset: 0 }
        );
    }

    #[test]
    fn bad_boolean_rejected() {
        assert_eq!(
            decode(&[TAG_BOOLEAN, 2]).unwrap_err(),
            CodecError::InvalidBoolean { offset: 1, byte: 2 }
        );
    }

    #[test]
    fn invalid_keys_rejected() {
        let nil_key = [TAG_TABLE, TAG_NIL, TAG_BOOLEAN, 1, TAG_END];
        assert_eq!(
            decode(&nil_key).unwrap_err(),
            CodecError::InvalidKey {
                offset: 1,
                reason: "nil key"
            }
        );

        let mut nan_key = vec![TAG_TABLE, TAG_NUMBER];
        nan_key.extend_from_slice(&f64::NAN.to_le_bytes());
        nan_key.extend_from_slice(&[TAG_NIL, TAG_END]);
        assert!(matches!(
            decode(&nan_key).unwrap_err(),
            CodecError::InvalidKey { reason: "NaN key", .. }
        ));

        let table_key = [TAG_TABLE, TAG_TABLE, TAG_END, TAG_NIL, TAG_END];
        assert!(matches!(
            decode(&table_key).unwrap_err(),
            CodecError::InvalidKey { offset: 1, .. }
        ));
    }

    #[test]
    fn positional_entries_reassemble_from_any_order() {
        // {[2] = "b", [1] = "a"} written by a peer in hash order.
        let mut bytes = vec![TAG_TABLE];
        for (index, text) in [(2i64, b'b'), (1, b'a')] {
            bytes.push(TAG_INTEGER);
            bytes.extend_from_slice(&index.to_le_bytes());
            bytes.extend_from_slice(&[TAG_STRING, 1, 0, 0, 0, text]);
        }
        bytes.push(TAG_END);

        let values = decode(&bytes).unwrap();
        let table = values[0].as_table().unwrap();
        assert_eq!(table.array(), &[Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn depth_limit_enforced() {
        fn nest(levels: usize) -> Value {
            let mut value = Value::from(Table::new());
            for _ in 1..levels {
                let mut t = Table::new();
                t.push(value);
                value = Value::from(t);
            }
            value
        }

        roundtrip(vec![nest(MAX_DEPTH)]);
        assert!(matches!(
            encode(&[nest(MAX_DEPTH + 1)]),
            Err(CodecError::TooDeep { .. })
        ));

        let mut bytes = Vec::new();
        for _ in 0..=MAX_DEPTH {
            bytes.extend_from_slice(&[TAG_TABLE, TAG_INTEGER]);
            bytes.extend_from_slice(&1i64.to_le_bytes());
        }
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::TooDeep { max: MAX_DEPTH, .. }));
    }
}

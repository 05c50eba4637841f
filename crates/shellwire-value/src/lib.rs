//! Script values and their wire encoding.
//!
//! A serialized value buffer is a plain concatenation of tagged values.
//! Decoding a buffer always yields the same number of values, in the same
//! order, that were encoded into it.
//!
//! ```
//! use shellwire_value::{decode, encode, Table, Value};
//!
//! let mut table = Table::from_array(vec![Value::from("a"), Value::from("b")]);
//! table.set("answer", 42).unwrap();
//!
//! let bytes = encode(&[Value::from(true), Value::Table(table.clone())]).unwrap();
//! let values = decode(&bytes).unwrap();
//! assert_eq!(values, vec![Value::from(true), Value::Table(table)]);
//! ```

pub mod codec;
pub mod error;
#[cfg(feature = "json")]
pub mod json;
pub mod table;
pub mod value;

pub use codec::{decode, encode, encode_into, MAX_DEPTH};
pub use error::{CodecError, Result};
pub use table::{Table, TableKey};
pub use value::{Function, Value};

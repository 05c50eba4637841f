/// Errors produced while encoding or decoding values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The value has no wire representation.
    #[error("cannot serialize value of type {0}")]
    Unsupported(&'static str),

    /// The buffer ended inside a value.
    #[error("truncated buffer at offset {offset}: need {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    /// A type tag outside the supported set.
    #[error("unknown type tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { offset: usize, tag: u8 },

    /// A boolean byte other than 0 or 1.
    #[error("invalid boolean byte 0x{byte:02x} at offset {offset}")]
    InvalidBoolean { offset: usize, byte: u8 },

    /// A table key that cannot index a table.
    #[error("invalid table key at offset {offset}: {reason}")]
    InvalidKey { offset: usize, reason: &'static str },

    /// A table-end marker where a value was expected.
    #[error("unexpected table end marker at offset {offset}")]
    UnexpectedEnd { offset: usize },

    /// Tables nested deeper than the codec allows.
    #[error("nesting deeper than {max} levels at offset {offset}")]
    TooDeep { offset: usize, max: usize },

    /// A string longer than the 32-bit length prefix can express.
    #[error("string of {0} bytes exceeds the 4 GiB limit")]
    StringTooLong(usize),

    /// A table key rejected while building a table locally.
    #[error("invalid table key: {0}")]
    BadKey(&'static str),
}

pub type Result<T> = std::result::Result<T, CodecError>;

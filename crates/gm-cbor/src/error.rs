/// Errors raised while reading or writing a map-encoded record.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CborError {
    #[error("buffer underrun: needed {needed} byte(s), {available} available")]
    BufferUnderrun { needed: usize, available: usize },

    #[error("expected major type {expected:#04x}, found {found:#04x}")]
    TypeMismatch { expected: u8, found: u8 },

    #[error("invalid additional info byte {0:#04x}")]
    InvalidAdditionalInfo(u8),

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("text of {len} byte(s) does not fit in a buffer of {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("length {0} exceeds the maximum a string header can carry")]
    LengthOverflow(usize),

    #[error("map has {0} field(s), more than a map header can carry")]
    TooManyFields(usize),

    #[error("text is not valid UTF-8")]
    InvalidUtf8,

    #[error("unknown field key {0}")]
    UnknownKey(u64),

    #[error("missing required field key {0}")]
    MissingField(u64),
}

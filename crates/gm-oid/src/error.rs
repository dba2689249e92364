/// Errors raised while parsing or converting object ids.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OidError {
    #[error("invalid hex length: expected {expected}, got {actual}")]
    InvalidHexLength { expected: usize, actual: usize },

    #[error("invalid hex character '{character}' at position {position}")]
    InvalidHex { position: usize, character: char },

    #[error("invalid oid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

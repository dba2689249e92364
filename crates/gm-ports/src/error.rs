/// The closed error taxonomy shared by every layer of the core.
///
/// Each variant is one of a fixed set of kinds; layers do not invent new
/// kinds, they wrap an existing one with [`GmError::context`] as it crosses
/// a boundary. `Display` renders the full context chain, innermost last.
#[derive(Debug, thiserror::Error)]
pub enum GmError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("unknown error: {0}")]
    Unknown(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("I/O failed: {0}")]
    IoFailed(#[source] std::io::Error),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("path too long: {0}")]
    PathTooLong(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("invalid utf-8: {0}")]
    InvalidUtf8(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid edge type: {0}")]
    InvalidEdgeType(u16),

    #[error("corrupt storage: {0}")]
    CorruptStorage(String),

    /// A context string wrapping a lower-level error, forming a chain.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<GmError>,
    },
}

impl GmError {
    /// Wrap this error with a short description of what the caller was
    /// trying to do, forming a chain the way each layer enriches the error
    /// it propagates.
    pub fn context(self, context: impl Into<String>) -> Self {
        GmError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// `true` for kinds the propagation policy treats as locally
    /// recoverable (NotFound and AlreadyExists); every other kind is
    /// fatal to the operation that produced it.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GmError::NotFound(_) | GmError::AlreadyExists(_) => true,
            GmError::Context { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Render the full context chain as a single string, innermost error
    /// last. This is the `error_format` the specification hands to
    /// external callers.
    pub fn format_chain(&self) -> String {
        format!("{self}")
    }
}

impl From<std::io::Error> for GmError {
    fn from(err: std::io::Error) -> Self {
        GmError::IoFailed(err)
    }
}

/// Extension trait adding `.context(..)` to any `Result<T, GmError>`.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, GmError>;
}

impl<T> ResultExt<T> for Result<T, GmError> {
    fn context(self, context: impl Into<String>) -> Result<T, GmError> {
        self.map_err(|e| e.context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chain_renders_innermost_last() {
        let err = GmError::NotFound("ref".into()).context("journal append failed");
        assert_eq!(err.to_string(), "journal append failed: not found: ref");
    }

    #[test]
    fn not_found_is_recoverable() {
        assert!(GmError::NotFound("x".into()).is_recoverable());
        assert!(GmError::NotFound("x".into())
            .context("outer")
            .is_recoverable());
    }

    #[test]
    fn invalid_argument_is_fatal() {
        assert!(!GmError::InvalidArgument("x".into()).is_recoverable());
    }
}

//! A narrow, self-delimiting byte-level codec for small fixed-field maps.
//!
//! This is not a general CBOR implementation: it reuses CBOR's major-type
//! and length-prefix conventions for four item kinds (unsigned integers,
//! byte strings, text strings, and small maps) because edge records need
//! exactly those, and nothing else. Callers frame a record as a map header
//! followed by `(key: uint, value)` pairs in writer-chosen order; there is
//! no generic value type and no support for nested containers.

mod constants;
mod error;
mod reader;
mod writer;

pub use constants::{MAX_MAP_FIELDS, MAX_STRING_LEN};
pub use error::CborError;
pub use reader::Reader;
pub use writer::Writer;

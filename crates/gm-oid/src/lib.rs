//! Object identifiers for git-mind: a fixed 20-byte blob hash, its hex
//! rendering, and the shard-prefix helper the cache tree layout uses to
//! keep directory fan-out bounded.

mod error;
pub mod hex;
mod oid;

pub use error::OidError;
pub use oid::{shard_prefix, ObjectId, MAX_SHARD_PREFIX_CHARS, OID_SIZE};

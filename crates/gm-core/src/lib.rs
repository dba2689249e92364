//! The three inbound ports (§4.J) external callers (a CLI, a hook, a
//! server) use to drive the core: appending edges to the journal,
//! requesting cache rebuilds, and answering fanout/fanin queries.
//!
//! Nothing in this crate implements new domain logic -- it validates
//! inputs the way a driving adapter would and delegates straight through
//! to `gm_journal` and `gm_cache`. Grounded on `core/include/gitmind/*.h`'s
//! port headers, which are themselves thin wrappers over the same
//! `core/src/{journal,cache}/*.c` this workspace's lower crates already
//! implement.

mod cache_build_port;
mod cache_query_port;
mod context;
mod journal_port;

pub use cache_build_port::CacheBuildPort;
pub use cache_query_port::{CacheQueryPort, QueryResult, Stats};
pub use context::PortContext;
pub use journal_port::JournalCommandPort;

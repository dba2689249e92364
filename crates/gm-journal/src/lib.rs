//! The append-only edge journal: one log per branch, materialized as
//! commits on `refs/gitmind/edges/<branch>`.
//!
//! Grounded on `git-ref::files::transaction`'s compare-and-set commit
//! protocol for the writer side, and on `git-ref`'s reverse-chronological
//! commit walk for the reader side -- both generalized here to work
//! through `gm_ports::RepositoryPort` rather than a concrete on-disk
//! store, since the journal itself never touches a filesystem or object
//! database directly.

mod reader;
mod writer;

pub use reader::{read, read_attributed};
pub use writer::append;

/// The reference namespace every branch's journal lives under.
pub const JOURNAL_REF_PREFIX: &str = "refs/gitmind/edges/";

/// The path, inside a journal commit's tree, at which the concatenated
/// CBOR payload blob is stored. See `SPEC_FULL.md`'s "commit payload
/// carrier" decision: the payload is a tree blob, not the commit message.
pub const JOURNAL_PAYLOAD_PATH: &str = "edges.cbor";

/// The full reference name for a branch's journal.
pub fn journal_ref_name(branch: &str) -> String {
    format!("{JOURNAL_REF_PREFIX}{branch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_name_is_prefixed_by_branch() {
        assert_eq!(journal_ref_name("main"), "refs/gitmind/edges/main");
    }
}

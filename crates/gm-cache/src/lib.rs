//! The sharded bitmap cache: a per-branch index from OID to the set of
//! edge-ids touching it as source (fanout) or target (fanin), materialized
//! as commits on `refs/gitmind/cache/<branch>` and rebuilt from the
//! journal.
//!
//! Grounded on `core/src/cache/*.c`: the shard-prefix tree layout
//! (`gm-oid::ObjectId::prefix`, reused rather than reimplemented here), the
//! leaf-blob magic/version header (`bitmap.rs`), the rebuild pass
//! (`rebuild.rs`), meta persistence and fallback (`meta.rs`), staleness
//! (`stale.rs`), and fanout/fanin lookup with journal-scan fallback
//! (`query.rs`).

pub mod bitmap;
pub mod meta;
pub mod query;
pub mod rebuild;
pub mod stale;

/// The reference namespace a branch's current cache lives under.
pub const CACHE_REF_PREFIX: &str = "refs/gitmind/cache/";

/// Default shard-prefix width in bits; 8 bits renders as 2 hex characters.
pub const DEFAULT_SHARD_BITS: u32 = 8;

/// Cache metadata/leaf-blob format version.
pub const CACHE_FORMAT_VERSION: u16 = 1;

/// Maximum length in bytes of a branch name as recorded in cache metadata.
/// A branch at or beyond this length fails `rebuild` with
/// [`gm_ports::GmError::InvalidArgument`] before any side effect.
pub const GM_CACHE_BRANCH_NAME_SIZE: usize = 256;

/// The full reference name for a branch's current cache.
pub fn cache_ref_name(branch: &str) -> String {
    format!("{CACHE_REF_PREFIX}{branch}")
}

/// The glob pattern matching a branch's legacy timestamped cache snapshots.
pub fn legacy_cache_glob(branch: &str) -> String {
    format!("{CACHE_REF_PREFIX}{branch}/*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_name_is_prefixed_by_branch() {
        assert_eq!(cache_ref_name("main"), "refs/gitmind/cache/main");
    }

    #[test]
    fn legacy_glob_is_nested_under_the_branch_ref() {
        assert_eq!(legacy_cache_glob("main"), "refs/gitmind/cache/main/*");
    }
}

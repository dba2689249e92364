//! Fanout/fanin lookups: serve from the cache when possible, fall back to a
//! direct journal scan when the cache is missing, stale-looking at read
//! time, or simply does not have a blob for the requested OID.
//!
//! Grounded on `core/src/cache/query.c`'s two-path lookup (cache hit vs
//! journal fallback) and `core/src/cache/stats.c`'s tree-size accounting.

use gm_oid::ObjectId;
use gm_ports::{GmError, RepositoryPort, VisitControl};

use crate::meta::{load_meta, resolve_cache_commit};

/// Journal-scan fallback refuses to walk more than this many edges; a
/// journal larger than this without a usable cache is considered a setup
/// problem, not something to eat the latency of silently.
pub const JOURNAL_SCAN_LIMIT: usize = 100_000;

/// Which side of an edge a query matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Fanout,
    Fanin,
}

impl Direction {
    fn suffix(self) -> &'static str {
        match self {
            Direction::Fanout => "forward",
            Direction::Fanin => "reverse",
        }
    }
}

/// The result of a fanout/fanin lookup: the matching edge-ids in ascending
/// order, and whether they came from the cache or a journal-scan fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub edge_ids: Vec<u32>,
    pub from_cache: bool,
}

impl QueryResult {
    pub fn count(&self) -> usize {
        self.edge_ids.len()
    }
}

/// Edge-ids of edges whose source is `oid`.
pub fn query_fanout(
    repo: &dyn RepositoryPort,
    branch: &str,
    oid: ObjectId,
) -> Result<QueryResult, GmError> {
    query(repo, branch, oid, Direction::Fanout)
}

/// Edge-ids of edges whose target is `oid`.
pub fn query_fanin(
    repo: &dyn RepositoryPort,
    branch: &str,
    oid: ObjectId,
) -> Result<QueryResult, GmError> {
    query(repo, branch, oid, Direction::Fanin)
}

fn query(
    repo: &dyn RepositoryPort,
    branch: &str,
    oid: ObjectId,
    direction: Direction,
) -> Result<QueryResult, GmError> {
    if let Some(result) = try_cache(repo, branch, oid, direction)? {
        return Ok(result);
    }
    journal_scan(repo, branch, oid, direction)
}

/// Attempt the cache path. `Ok(None)` means the cache could not answer
/// (absent, stale-looking meta, missing blob, or a corrupt blob) and the
/// caller should fall back to a journal scan; this is never itself an
/// error the caller surfaces.
fn try_cache(
    repo: &dyn RepositoryPort,
    branch: &str,
    oid: ObjectId,
    direction: Direction,
) -> Result<Option<QueryResult>, GmError> {
    let meta = match load_meta(repo, branch) {
        Ok(meta) => meta,
        Err(_) => return Ok(None),
    };
    let (commit, _is_legacy) = match resolve_cache_commit(repo, branch) {
        Ok(resolved) => resolved,
        Err(_) => return Ok(None),
    };

    let prefix = oid.prefix(meta.shard_bits);
    let path = if prefix.is_empty() {
        format!("{}.{}", oid.to_hex(), direction.suffix())
    } else {
        format!("{}/{}.{}", prefix, oid.to_hex(), direction.suffix())
    };

    let blob = match repo.commit_read_blob(commit.oid, &path) {
        Ok(blob) => blob,
        Err(_) => return Ok(None),
    };
    let bitmap = match crate::bitmap::deserialize(&blob) {
        Ok(bitmap) => bitmap,
        Err(_) => return Ok(None),
    };

    Ok(Some(QueryResult {
        edge_ids: bitmap.iter().collect(),
        from_cache: true,
    }))
}

fn journal_scan(
    repo: &dyn RepositoryPort,
    branch: &str,
    oid: ObjectId,
    direction: Direction,
) -> Result<QueryResult, GmError> {
    let mut edge_ids = Vec::new();
    let mut scanned: usize = 0;
    let mut limit_exceeded = false;

    match gm_journal::read(repo, Some(branch), &mut |edge| {
        let ordinal = scanned as u32;
        scanned += 1;
        if scanned > JOURNAL_SCAN_LIMIT {
            limit_exceeded = true;
            return VisitControl::Halt;
        }
        let matches = match direction {
            Direction::Fanout => edge.src_oid == oid,
            Direction::Fanin => edge.tgt_oid == oid,
        };
        if matches {
            edge_ids.push(ordinal);
        }
        VisitControl::Continue
    }) {
        Ok(()) => {}
        Err(GmError::NotFound(_)) => {}
        Err(err) => return Err(err),
    }

    if limit_exceeded {
        return Err(GmError::InvalidState(format!(
            "journal scan fallback exceeded the {JOURNAL_SCAN_LIMIT}-edge sanity limit"
        )));
    }

    Ok(QueryResult {
        edge_ids,
        from_cache: false,
    })
}

/// Cached edge count and the recursive byte size of the cache tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub edge_count: u64,
    pub cache_size_bytes: u64,
}

/// `edge_count` comes from cache meta; `cache_size_bytes` is the recursive
/// size of the cache commit's tree, or (when that walk fails) an estimate
/// proportional to `edge_count` -- two leaf blobs per edge at roughly the
/// size of one bitmap header plus a handful of compressed-run bytes.
pub fn stats(repo: &dyn RepositoryPort, branch: &str) -> Result<Stats, GmError> {
    let meta = load_meta(repo, branch)?;
    let (commit, _is_legacy) = resolve_cache_commit(repo, branch)?;

    let cache_size_bytes = repo
        .commit_tree_size(commit.oid)
        .unwrap_or_else(|_| estimate_tree_size(meta.edge_count));

    Ok(Stats {
        edge_count: meta.edge_count,
        cache_size_bytes,
    })
}

const ESTIMATED_BYTES_PER_EDGE: u64 = 24;

fn estimate_tree_size(edge_count: u64) -> u64 {
    edge_count * ESTIMATED_BYTES_PER_EDGE
}

//! Cache metadata: the small header describing what a cache commit was
//! built from, carried in the commit's human-readable message.
//!
//! Grounded on `core/src/cache/meta.c`'s `gm_cache_meta_t` plus the legacy
//! timestamped-ref fallback it falls back to when the primary reference is
//! absent.

use gm_oid::ObjectId;
use gm_ports::{GmError, ReferenceTip, RepositoryPort, ResultExt};

use crate::{cache_ref_name, legacy_cache_glob, CACHE_FORMAT_VERSION, DEFAULT_SHARD_BITS};

/// Cache metadata carried by a cache commit. Only `branch` and
/// `journal_tip_oid` are semantically load-bearing (the stale detector and
/// query engine depend on them); the rest are informational and may be
/// synthesized on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMeta {
    pub version: u16,
    pub shard_bits: u32,
    pub branch: String,
    pub journal_tip_oid: ObjectId,
    pub journal_tip_hex: String,
    pub journal_tip_time: u64,
    pub edge_count: u64,
    pub build_time_ms: u64,
    /// `true` when this meta came from a legacy timestamped-ref snapshot
    /// rather than the branch's primary cache reference.
    pub is_legacy: bool,
}

/// Render a cache commit's message: `key=value` lines in the stable order
/// `version, shard_bits, branch, journal_tip_oid, journal_tip_time,
/// edge_count, build_time_ms`. Used by the rebuilder; [`parse_message`] is
/// its inverse.
pub fn format_message(meta: &CacheMeta) -> String {
    format!(
        "version={}\nshard_bits={}\nbranch={}\njournal_tip_oid={}\njournal_tip_time={}\nedge_count={}\nbuild_time_ms={}\n",
        meta.version,
        meta.shard_bits,
        meta.branch,
        meta.journal_tip_hex,
        meta.journal_tip_time,
        meta.edge_count,
        meta.build_time_ms,
    )
}

/// Parse a cache commit message written by [`format_message`]. Returns
/// `None` when any required key is missing or malformed -- the caller then
/// treats the commit as predating the persisted-meta format and falls back
/// to synthesizing meta from current repository state.
fn parse_message(message: &str) -> Option<CacheMeta> {
    let mut version = None;
    let mut shard_bits = None;
    let mut branch = None;
    let mut journal_tip_hex: Option<String> = None;
    let mut journal_tip_time = None;
    let mut edge_count = None;
    let mut build_time_ms = None;

    for line in message.lines() {
        let (key, value) = line.split_once('=')?;
        match key {
            "version" => version = value.parse::<u16>().ok(),
            "shard_bits" => shard_bits = value.parse::<u32>().ok(),
            "branch" => branch = Some(value.to_string()),
            "journal_tip_oid" => journal_tip_hex = Some(value.to_string()),
            "journal_tip_time" => journal_tip_time = value.parse::<u64>().ok(),
            "edge_count" => edge_count = value.parse::<u64>().ok(),
            "build_time_ms" => build_time_ms = value.parse::<u64>().ok(),
            _ => {}
        }
    }

    let journal_tip_hex = journal_tip_hex?;
    let journal_tip_oid = if journal_tip_hex.is_empty() {
        ObjectId::ZERO
    } else {
        ObjectId::from_hex(&journal_tip_hex).ok()?
    };

    Some(CacheMeta {
        version: version?,
        shard_bits: shard_bits?,
        branch: branch?,
        journal_tip_oid,
        journal_tip_hex,
        journal_tip_time: journal_tip_time?,
        edge_count: edge_count?,
        build_time_ms: build_time_ms?,
        is_legacy: false,
    })
}

/// Load the cache metadata for `branch`.
///
/// Resolves the primary cache reference; if absent, falls back to the most
/// recent legacy timestamped snapshot under `refs/gitmind/cache/<branch>/*`
/// (the one with the largest commit time). Fails with
/// [`GmError::NotFound`] when neither exists.
///
/// When the resolved commit's message parses as a persisted-meta record
/// (see [`format_message`]), that record is returned verbatim. Otherwise
/// (legacy snapshots always, and any primary commit predating the
/// persisted-meta format) the fields are synthesized per the data model:
/// default version/shard_bits, the branch as given, the commit's own time
/// as `journal_tip_time`, the *current* journal tip resolved fresh, and
/// zero for `edge_count`/`build_time_ms`.
pub fn load_meta(repo: &dyn RepositoryPort, branch: &str) -> Result<CacheMeta, GmError> {
    let (commit, is_legacy) = resolve_cache_commit(repo, branch)?;

    if !is_legacy {
        if let Ok(message) = repo.commit_read_message(commit.oid) {
            if let Some(parsed) = parse_message(&message) {
                return Ok(parsed);
            }
        }
    }

    Ok(synthesize_meta(repo, branch, &commit, is_legacy)?)
}

pub(crate) fn resolve_cache_commit(
    repo: &dyn RepositoryPort,
    branch: &str,
) -> Result<(ReferenceTip, bool), GmError> {
    let tip = repo
        .reference_tip(&cache_ref_name(branch))
        .context("load cache meta failed")?;
    if tip.has_target {
        return Ok((tip, false));
    }

    let legacy = repo
        .reference_glob_latest(&legacy_cache_glob(branch))
        .context("load cache meta failed")?;
    if legacy.has_target {
        return Ok((legacy, true));
    }

    Err(GmError::NotFound(format!("cache for branch {branch}")))
}

fn synthesize_meta(
    repo: &dyn RepositoryPort,
    branch: &str,
    commit: &ReferenceTip,
    is_legacy: bool,
) -> Result<CacheMeta, GmError> {
    let journal_tip = repo
        .reference_tip(&gm_journal::journal_ref_name(branch))
        .context("load cache meta failed")?;
    let (journal_tip_oid, journal_tip_hex) = if journal_tip.has_target {
        (journal_tip.oid, journal_tip.oid.to_hex())
    } else {
        (ObjectId::ZERO, String::new())
    };

    Ok(CacheMeta {
        version: CACHE_FORMAT_VERSION,
        shard_bits: DEFAULT_SHARD_BITS,
        branch: branch.to_string(),
        journal_tip_oid,
        journal_tip_hex,
        journal_tip_time: commit.commit_time,
        edge_count: 0,
        build_time_ms: 0,
        is_legacy,
    })
}

//! The cache rebuilder: scans the journal, assigns edge-ids, and
//! materializes forward/reverse bitmaps as a tree committed to
//! `refs/gitmind/cache/<branch>`.
//!
//! Grounded on `core/src/cache/rebuild.c`'s temp-workspace-then-commit
//! pipeline, the same shape `gm-journal::writer` uses for its own payload
//! blob -- both stage files under a `FsTempPort`-issued directory, ask the
//! repository port to build a tree from it, and commit that tree.

use std::path::Path;
use std::time::Instant;

use gm_edge::EdgeMap;
use gm_oid::ObjectId;
use gm_ports::{
    canonical_repo_id, CryptoPort, FsTempPort, GmError, LogLevel, NewCommit, ReferenceUpdate,
    RepositoryPort, ResultExt, TelemetryPorts, VisitControl,
};

use crate::meta::{format_message, load_meta, CacheMeta};
use crate::{cache_ref_name, CACHE_FORMAT_VERSION, GM_CACHE_BRANCH_NAME_SIZE};

/// Fixed bucket count for the forward/reverse edge-maps built during a
/// rebuild; matches the source's own constant.
const EDGE_MAP_BUCKETS: usize = 1024;

/// What a successful rebuild produced, for callers (and telemetry) that
/// want the numbers without re-loading meta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub edge_count: u64,
    pub build_time_ms: u64,
    pub tree_size_bytes: u64,
}

/// Rebuild `branch`'s cache from its journal.
///
/// When `force_full` is `false`, the rebuild (internally `rebuild_resume`)
/// starts edge-id assignment from the prior cache's `edge_count` instead of
/// zero, but still re-scans the entire journal -- this extends the id
/// space rather than truly skipping already-seen commits. A genuinely
/// incremental, commit-delta rebuild is not implemented.
///
/// Fails with [`GmError::InvalidArgument`] before any side effect when
/// `branch`'s length meets or exceeds [`GM_CACHE_BRANCH_NAME_SIZE`].
pub fn rebuild(
    repo: &dyn RepositoryPort,
    fs_temp: &dyn FsTempPort,
    crypto: &dyn CryptoPort,
    telemetry: &TelemetryPorts<'_>,
    branch: &str,
    force_full: bool,
) -> Result<RebuildOutcome, GmError> {
    if branch.len() >= GM_CACHE_BRANCH_NAME_SIZE {
        return Err(GmError::InvalidArgument(format!(
            "branch name {} bytes meets or exceeds the {GM_CACHE_BRANCH_NAME_SIZE}-byte limit",
            branch.len()
        )));
    }

    let mode = if force_full { "full" } else { "resume" };
    let start = Instant::now();
    telemetry.logger.log(
        LogLevel::Info,
        "cache",
        "rebuild_start",
        &[("branch", branch), ("mode", mode)],
    );

    match rebuild_inner(repo, fs_temp, crypto, branch, force_full) {
        Ok(outcome) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let edge_count_str = outcome.edge_count.to_string();
            let tags = [("branch", branch), ("mode", mode)];
            telemetry
                .metrics
                .timing_ms("cache.rebuild.duration_ms", duration_ms, &tags);
            telemetry
                .metrics
                .counter_add("cache.edges_processed_total", outcome.edge_count, &tags);
            telemetry
                .metrics
                .gauge_set("cache.tree_size_bytes", outcome.tree_size_bytes as f64, &tags);
            telemetry.logger.log(
                LogLevel::Info,
                "cache",
                "rebuild_ok",
                &[
                    ("branch", branch),
                    ("mode", mode),
                    ("edge_count", edge_count_str.as_str()),
                    ("duration_ms", duration_ms.to_string().as_str()),
                ],
            );
            Ok(outcome)
        }
        Err(err) => {
            let code = err.to_string();
            telemetry.diagnostics.emit(
                "cache",
                "rebuild_failed",
                &[("branch", branch), ("code", code.as_str())],
            );
            telemetry.logger.log(
                LogLevel::Error,
                "cache",
                "rebuild_failed",
                &[("branch", branch), ("mode", mode), ("code", code.as_str())],
            );
            Err(err)
        }
    }
}

fn rebuild_inner(
    repo: &dyn RepositoryPort,
    fs_temp: &dyn FsTempPort,
    crypto: &dyn CryptoPort,
    branch: &str,
    force_full: bool,
) -> Result<RebuildOutcome, GmError> {
    let start = Instant::now();

    let repo_id = canonical_repo_id(repo, fs_temp, crypto).context("rebuild prep failed")?;
    let temp_dir = fs_temp
        .make_temp_dir(repo_id, "cache", true)
        .context("rebuild prep failed")?;

    let outcome = (|| {
        let starting_edge_id = if force_full {
            0u32
        } else {
            match load_meta(repo, branch) {
                Ok(meta) => meta.edge_count as u32,
                Err(_) => 0,
            }
        };

        let (forward, reverse, edge_count) =
            scan_journal(repo, branch, starting_edge_id).context("rebuild edge map failed")?;

        let shard_bits = crate::DEFAULT_SHARD_BITS;
        write_bitmaps(fs_temp, &temp_dir, &forward, shard_bits, "forward")
            .context("rebuild collect write failed")?;
        write_bitmaps(fs_temp, &temp_dir, &reverse, shard_bits, "reverse")
            .context("rebuild collect write failed")?;

        let tree = repo
            .build_tree_from_directory(&temp_dir)
            .context("rebuild collect write failed")?;

        let journal_tip = repo
            .reference_tip(&gm_journal::journal_ref_name(branch))
            .context("rebuild meta failed")?;
        let (journal_tip_oid, journal_tip_hex) = if journal_tip.has_target {
            (journal_tip.oid, journal_tip.oid.to_hex())
        } else {
            (ObjectId::ZERO, String::new())
        };

        let build_time_ms = start.elapsed().as_millis() as u64;
        let meta = CacheMeta {
            version: CACHE_FORMAT_VERSION,
            shard_bits,
            branch: branch.to_string(),
            journal_tip_oid,
            journal_tip_hex,
            journal_tip_time: journal_tip.commit_time,
            edge_count: edge_count as u64,
            build_time_ms,
            is_legacy: false,
        };

        let ref_name = cache_ref_name(branch);
        let prior_tip = repo.reference_tip(&ref_name).context("rebuild meta failed")?;
        let parents: Vec<ObjectId> = if prior_tip.has_target {
            vec![prior_tip.oid]
        } else {
            vec![]
        };
        let message = format_message(&meta);
        let commit = repo
            .commit_create(NewCommit {
                tree,
                message: &message,
                parents: &parents,
            })
            .context("rebuild meta failed")?;

        // Concurrent rebuilds race at this final update; the loser's work
        // is silently discarded, so no compare-and-set is applied here.
        repo.reference_update(ReferenceUpdate {
            ref_name: &ref_name,
            target: commit,
            expected_old: None,
            log_message: &message,
            force: true,
        })
        .context("rebuild meta failed")?;

        // `commit_tree_size` takes a commit OID, not a tree OID (matching
        // every other caller, e.g. query.rs's stats()); measuring from the
        // bare tree here would error or mis-measure against a real
        // git-backed port.
        let tree_size_bytes = repo.commit_tree_size(commit).unwrap_or(0);

        Ok(RebuildOutcome {
            edge_count: edge_count as u64,
            build_time_ms,
            tree_size_bytes,
        })
    })();

    let _ = fs_temp.remove_tree(&temp_dir);
    outcome
}

/// Scan the journal, assigning each edge the next 32-bit id starting from
/// `starting_edge_id` in the order the reader enumerates them
/// (reverse-chronological commit order, encoded order within a commit). An
/// absent journal (branch never appended to) is not an error: it yields
/// empty maps.
fn scan_journal(
    repo: &dyn RepositoryPort,
    branch: &str,
    starting_edge_id: u32,
) -> Result<(EdgeMap, EdgeMap, u32), GmError> {
    let mut forward = EdgeMap::new(EDGE_MAP_BUCKETS);
    let mut reverse = EdgeMap::new(EDGE_MAP_BUCKETS);
    let mut next_id = starting_edge_id;

    match gm_journal::read(repo, Some(branch), &mut |edge| {
        forward.add(edge.src_oid, next_id);
        reverse.add(edge.tgt_oid, next_id);
        next_id += 1;
        VisitControl::Continue
    }) {
        Ok(()) => {}
        Err(GmError::NotFound(_)) => {}
        Err(err) => return Err(err),
    }

    Ok((forward, reverse, next_id))
}

fn write_bitmaps(
    fs_temp: &dyn FsTempPort,
    temp_dir: &Path,
    map: &EdgeMap,
    shard_bits: u32,
    suffix: &str,
) -> Result<(), GmError> {
    let mut write_err = None;
    map.visit(|oid, bitmap| {
        match write_one_bitmap(fs_temp, temp_dir, oid, bitmap, shard_bits, suffix) {
            Ok(()) => VisitControl::Continue,
            Err(err) => {
                write_err = Some(err);
                VisitControl::Halt
            }
        }
    });
    match write_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn write_one_bitmap(
    fs_temp: &dyn FsTempPort,
    temp_dir: &Path,
    oid: &ObjectId,
    bitmap: &roaring::RoaringBitmap,
    shard_bits: u32,
    suffix: &str,
) -> Result<(), GmError> {
    let prefix = oid.prefix(shard_bits);
    let filename = format!("{}.{}", oid.to_hex(), suffix);

    let leaf_path = if prefix.is_empty() {
        fs_temp.path_join_under_base(temp_dir, &[&filename])?
    } else {
        let prefix_dir = fs_temp.path_join_under_base(temp_dir, &[&prefix])?;
        std::fs::create_dir_all(&prefix_dir).map_err(GmError::from)?;
        fs_temp.path_join_under_base(&prefix_dir, &[&filename])?
    };

    let bytes = crate::bitmap::serialize(bitmap)?;
    std::fs::write(&leaf_path, bytes).map_err(GmError::from)?;
    Ok(())
}

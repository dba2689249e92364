use std::path::Path;
use std::time::Instant;

use gm_edge::EdgeRecord;
use gm_oid::ObjectId;
use gm_ports::{
    canonical_repo_id, CryptoPort, FsTempPort, GmError, LogLevel, NewCommit, ReferenceUpdate,
    RepositoryPort, ResultExt, TelemetryPorts,
};

use crate::{journal_ref_name, JOURNAL_PAYLOAD_PATH};

/// Append one or more edge records, in order, to the current branch's
/// journal (`refs/gitmind/edges/<branch>`, where `<branch>` is whatever
/// `HEAD` currently points at).
///
/// `records` may freely interleave [`EdgeRecord::Basic`] and
/// [`EdgeRecord::Attributed`] entries; they are encoded into a single
/// concatenated payload and committed together as one journal entry, so
/// the append is all-or-nothing: any encoding failure aborts before a
/// single byte reaches the repository port.
///
/// Fails with [`GmError::InvalidArgument`] before any side effect when
/// `records` is empty.
pub fn append(
    repo: &dyn RepositoryPort,
    fs_temp: &dyn FsTempPort,
    crypto: &dyn CryptoPort,
    telemetry: &TelemetryPorts<'_>,
    records: &[EdgeRecord],
) -> Result<(), GmError> {
    if records.is_empty() {
        return Err(GmError::InvalidArgument(
            "append requires at least one edge".to_string(),
        ));
    }

    let start = Instant::now();
    let count_str = records.len().to_string();
    telemetry.logger.log(
        LogLevel::Info,
        "journal",
        "journal_append_start",
        &[("count", count_str.as_str())],
    );

    match append_inner(repo, fs_temp, crypto, telemetry, records) {
        Ok(branch) => {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let tags = [("branch", branch.as_str())];
            telemetry
                .metrics
                .counter_add("journal.append.edges_total", records.len() as u64, &tags);
            telemetry
                .metrics
                .timing_ms("journal.append.duration_ms", elapsed_ms, &tags);
            telemetry.logger.log(
                LogLevel::Info,
                "journal",
                "journal_append_ok",
                &[("branch", branch.as_str()), ("count", count_str.as_str())],
            );
            Ok(())
        }
        Err(err) => {
            let message = err.to_string();
            telemetry.logger.log(
                LogLevel::Error,
                "journal",
                "journal_append_failed",
                &[("error", message.as_str())],
            );
            Err(err)
        }
    }
}

fn append_inner(
    repo: &dyn RepositoryPort,
    fs_temp: &dyn FsTempPort,
    crypto: &dyn CryptoPort,
    telemetry: &TelemetryPorts<'_>,
    records: &[EdgeRecord],
) -> Result<String, GmError> {
    let payload = encode_payload(records)?;

    let branch = repo.head_branch().context("journal append failed")?;
    let ref_name = journal_ref_name(&branch);

    let repo_id =
        canonical_repo_id(repo, fs_temp, crypto).context("journal append failed")?;
    let temp_dir = fs_temp
        .make_temp_dir(repo_id, "journal", true)
        .context("journal append failed")?;

    let outcome = stage_tree(fs_temp, repo, &temp_dir, &payload).and_then(|tree| {
        commit_with_retry(repo, telemetry, &branch, &ref_name, tree, records.len())
    });

    // Best-effort cleanup: a failure here is logged by the port itself,
    // never surfaced as the operation's result.
    let _ = fs_temp.remove_tree(&temp_dir);

    outcome?;
    Ok(branch)
}

fn encode_payload(records: &[EdgeRecord]) -> Result<Vec<u8>, GmError> {
    let mut payload = Vec::new();
    for record in records {
        let bytes = match record {
            EdgeRecord::Basic(edge) => gm_edge::encode_basic(edge)?,
            EdgeRecord::Attributed(attributed) => gm_edge::encode_attributed(attributed)?,
        };
        payload.extend(bytes);
    }
    Ok(payload)
}

fn stage_tree(
    fs_temp: &dyn FsTempPort,
    repo: &dyn RepositoryPort,
    temp_dir: &Path,
    payload: &[u8],
) -> Result<ObjectId, GmError> {
    let file_path = fs_temp
        .path_join_under_base(temp_dir, &[JOURNAL_PAYLOAD_PATH])
        .context("journal append failed")?;
    std::fs::write(&file_path, payload)
        .map_err(GmError::from)
        .context("journal append failed")?;
    repo.build_tree_from_directory(temp_dir)
        .context("journal append failed")
}

/// Create the journal commit and apply its compare-and-set reference
/// update, retrying exactly once on a concurrent (non-fast-forward)
/// writer. A `journal_nff_retry` diagnostic is emitted the moment the
/// first attempt loses the race, whether or not the retry goes on to
/// succeed.
fn commit_with_retry(
    repo: &dyn RepositoryPort,
    telemetry: &TelemetryPorts<'_>,
    branch: &str,
    ref_name: &str,
    tree: ObjectId,
    edge_count: usize,
) -> Result<(), GmError> {
    let message = format!("journal: {edge_count} edge(s)");
    let mut retried = false;
    loop {
        let tip = repo
            .reference_tip(ref_name)
            .context("journal append failed")?;
        let parents: Vec<ObjectId> = if tip.has_target { vec![tip.oid] } else { vec![] };
        let commit = repo
            .commit_create(NewCommit {
                tree,
                message: &message,
                parents: &parents,
            })
            .context("journal append failed")?;

        let update = ReferenceUpdate {
            ref_name,
            target: commit,
            expected_old: if tip.has_target { Some(tip.oid) } else { None },
            log_message: &message,
            force: false,
        };

        match repo.reference_update(update) {
            Ok(()) => return Ok(()),
            Err(err) if !retried && err.is_recoverable() => {
                telemetry
                    .diagnostics
                    .emit("journal", "journal_nff_retry", &[("branch", branch)]);
                retried = true;
            }
            Err(err) => return Err(err.context("journal append failed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_edge::{Confidence, Edge, RelType};
    use gm_oid::ObjectId as Oid;
    use gm_ports::{Ulid, VisitControl};
    use gm_testkit::{FakeCrypto, FakeDiagnostics, FakeFsTemp, FakeLogger, FakeMetrics, FakeRepository};

    fn sample_record(src: u8, tgt: u8) -> EdgeRecord {
        let crypto = FakeCrypto::new();
        let ulid = Ulid::generate_with_timestamp(&crypto, 1_700_000_000_000).unwrap();
        EdgeRecord::Basic(Edge {
            src_oid: Oid::from_array([src; 20]),
            tgt_oid: Oid::from_array([tgt; 20]),
            src_sha: Oid::ZERO,
            tgt_sha: Oid::ZERO,
            rel_type: RelType::References,
            confidence: Confidence::MAX,
            timestamp: 1_700_000_000_000,
            src_path: "A".to_string(),
            tgt_path: "B".to_string(),
            ulid,
        })
    }

    struct Fixture {
        repo: FakeRepository,
        fs_temp: FakeFsTemp,
        crypto: FakeCrypto,
        logger: FakeLogger,
        metrics: FakeMetrics,
        diagnostics: FakeDiagnostics,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                repo: FakeRepository::new("main"),
                fs_temp: FakeFsTemp::new().unwrap(),
                crypto: FakeCrypto::new(),
                logger: FakeLogger::new(),
                metrics: FakeMetrics::new(),
                diagnostics: FakeDiagnostics::new(),
            }
        }

        fn telemetry(&self) -> TelemetryPorts<'_> {
            TelemetryPorts::new(&self.logger, &self.metrics, &self.diagnostics)
        }
    }

    #[test]
    fn empty_batch_is_rejected_before_any_write() {
        let fx = Fixture::new();
        let telemetry = fx.telemetry();
        let err = append(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, &[]).unwrap_err();
        assert!(matches!(err, GmError::InvalidArgument(_)));
        let tip = fx.repo.reference_tip("refs/gitmind/edges/main").unwrap();
        assert!(!tip.has_target);
    }

    #[test]
    fn append_then_walk_reads_back_the_commit() {
        let fx = Fixture::new();
        let telemetry = fx.telemetry();
        let record = sample_record(0x11, 0x22);
        append(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, &[record]).unwrap();

        let tip = fx.repo.reference_tip("refs/gitmind/edges/main").unwrap();
        assert!(tip.has_target);

        let blob = fx
            .repo
            .commit_read_blob(tip.oid, JOURNAL_PAYLOAD_PATH)
            .unwrap();
        let (decoded, consumed) = gm_edge::decode_one(&blob).unwrap();
        assert_eq!(consumed, blob.len());
        assert_eq!(decoded.edge().src_oid, Oid::from_array([0x11; 20]));

        assert_eq!(fx.metrics.counter_total("journal.append.edges_total"), 1);
        assert!(fx.logger.contains_event("journal", "journal_append_ok"));
    }

    #[test]
    fn second_append_chains_on_first_as_parent() {
        let fx = Fixture::new();
        let telemetry = fx.telemetry();
        append(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, &[sample_record(0x11, 0x22)])
            .unwrap();
        let first_tip = fx.repo.reference_tip("refs/gitmind/edges/main").unwrap().oid;

        append(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, &[sample_record(0x33, 0x44)])
            .unwrap();
        let second_tip = fx.repo.reference_tip("refs/gitmind/edges/main").unwrap().oid;

        assert_eq!(fx.repo.commit_parent_count(second_tip).unwrap(), 1);
        let mut seen = Vec::new();
        fx.repo
            .walk_commits("refs/gitmind/edges/main", &mut |oid| {
                seen.push(oid);
                Ok(VisitControl::Continue)
            })
            .unwrap();
        assert_eq!(seen, vec![second_tip, first_tip]);
    }

    #[test]
    fn non_fast_forward_retries_once_then_succeeds() {
        use std::cell::Cell;
        use std::path::{Path, PathBuf};
        use gm_ports::{OwnedBlob, ReferenceTip};

        struct FlakyRepo<'a> {
            inner: &'a FakeRepository,
            failures_left: Cell<u32>,
        }

        impl<'a> RepositoryPort for FlakyRepo<'a> {
            fn repository_path(&self, kind: gm_ports::RepoPathKind) -> Result<PathBuf, GmError> {
                self.inner.repository_path(kind)
            }
            fn head_branch(&self) -> Result<String, GmError> {
                self.inner.head_branch()
            }
            fn build_tree_from_directory(&self, path: &Path) -> Result<ObjectId, GmError> {
                self.inner.build_tree_from_directory(path)
            }
            fn reference_tip(&self, ref_name: &str) -> Result<ReferenceTip, GmError> {
                self.inner.reference_tip(ref_name)
            }
            fn reference_glob_latest(&self, pattern: &str) -> Result<ReferenceTip, GmError> {
                self.inner.reference_glob_latest(pattern)
            }
            fn commit_read_blob(&self, commit: ObjectId, path: &str) -> Result<OwnedBlob, GmError> {
                self.inner.commit_read_blob(commit, path)
            }
            fn commit_read_message(&self, commit: ObjectId) -> Result<String, GmError> {
                self.inner.commit_read_message(commit)
            }
            fn walk_commits(
                &self,
                ref_name: &str,
                visitor: &mut dyn FnMut(ObjectId) -> Result<VisitControl, GmError>,
            ) -> Result<(), GmError> {
                self.inner.walk_commits(ref_name, visitor)
            }
            fn commit_tree_size(&self, commit: ObjectId) -> Result<u64, GmError> {
                self.inner.commit_tree_size(commit)
            }
            fn commit_create(&self, commit: NewCommit<'_>) -> Result<ObjectId, GmError> {
                self.inner.commit_create(commit)
            }
            fn reference_update(&self, update: ReferenceUpdate<'_>) -> Result<(), GmError> {
                let left = self.failures_left.get();
                if left > 0 {
                    self.failures_left.set(left - 1);
                    return Err(GmError::AlreadyExists(format!(
                        "{} is not a fast-forward",
                        update.ref_name
                    )));
                }
                self.inner.reference_update(update)
            }
            fn resolve_blob_at_head(&self, path: &str) -> Result<ObjectId, GmError> {
                self.inner.resolve_blob_at_head(path)
            }
            fn resolve_blob_at_commit(&self, commit: ObjectId, path: &str) -> Result<ObjectId, GmError> {
                self.inner.resolve_blob_at_commit(commit, path)
            }
            fn commit_parent_count(&self, commit: ObjectId) -> Result<usize, GmError> {
                self.inner.commit_parent_count(commit)
            }
        }

        let fx = Fixture::new();
        let flaky = FlakyRepo {
            inner: &fx.repo,
            failures_left: Cell::new(1),
        };
        let telemetry = fx.telemetry();

        append(&flaky, &fx.fs_temp, &fx.crypto, &telemetry, &[sample_record(0x11, 0x22)]).unwrap();

        assert_eq!(fx.diagnostics.count_of("journal_nff_retry"), 1);
        assert!(fx.repo.reference_tip("refs/gitmind/edges/main").unwrap().has_target);
    }

    #[test]
    fn detached_head_fails_with_invalid_state() {
        let fx = Fixture::new();
        fx.repo.set_head_branch("");
        let telemetry = fx.telemetry();
        let err = append(
            &fx.repo,
            &fx.fs_temp,
            &fx.crypto,
            &telemetry,
            &[sample_record(0x11, 0x22)],
        )
        .unwrap_err();
        assert!(matches!(err, GmError::Context { .. }));
    }
}

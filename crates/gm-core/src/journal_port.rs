//! The journal command port: `append`/`append_attributed`, validating
//! inputs and delegating to `gm_journal::append` (§4.D).
//!
//! Grounded on `core/include/gitmind/journal.h`'s `gm_journal_append`
//! entry point, which takes an edge array alongside an explicit count --
//! a C calling convention this port preserves at the signature level (so
//! a caller passing a mismatched count is rejected before any I/O) even
//! though a Rust slice already knows its own length.

use gm_edge::{AttributedEdge, Edge, EdgeRecord};
use gm_ports::GmError;

use crate::context::PortContext;

/// Appends edges to the current branch's journal.
///
/// Owns no state beyond the [`PortContext`] it was constructed with;
/// [`JournalCommandPort::dispose`] is provided for symmetry with the
/// specification's port-lifecycle contract and is a no-op -- there is
/// nothing here to release.
#[derive(Clone, Copy)]
pub struct JournalCommandPort<'a> {
    ctx: PortContext<'a>,
}

impl<'a> JournalCommandPort<'a> {
    pub const fn new(ctx: PortContext<'a>) -> Self {
        Self { ctx }
    }

    /// Append `edges[..count]` as basic (unattributed) records, in order,
    /// to the current branch's journal.
    ///
    /// Fails with [`GmError::InvalidArgument`] when `count` does not match
    /// `edges.len()`, or when `edges` is empty -- both checked before any
    /// side effect.
    pub fn append(&self, edges: &[Edge], count: usize) -> Result<(), GmError> {
        validate_count(edges.len(), count)?;
        let records: Vec<EdgeRecord> = edges.iter().cloned().map(EdgeRecord::Basic).collect();
        gm_journal::append(
            self.ctx.repo,
            self.ctx.fs_temp,
            self.ctx.crypto,
            &self.ctx.telemetry,
            &records,
        )
    }

    /// Append `edges[..count]` as attributed records, in order, to the
    /// current branch's journal.
    ///
    /// Same validation as [`Self::append`].
    pub fn append_attributed(
        &self,
        edges: &[AttributedEdge],
        count: usize,
    ) -> Result<(), GmError> {
        validate_count(edges.len(), count)?;
        let records: Vec<EdgeRecord> = edges
            .iter()
            .cloned()
            .map(EdgeRecord::Attributed)
            .collect();
        gm_journal::append(
            self.ctx.repo,
            self.ctx.fs_temp,
            self.ctx.crypto,
            &self.ctx.telemetry,
            &records,
        )
    }

    /// Idempotent, tolerates being called any number of times: there is no
    /// owned resource to release.
    pub fn dispose(&self) {}
}

fn validate_count(actual_len: usize, count: usize) -> Result<(), GmError> {
    if count != actual_len {
        return Err(GmError::InvalidArgument(format!(
            "edge count {count} does not match the {actual_len} edge(s) provided"
        )));
    }
    if count == 0 {
        return Err(GmError::InvalidArgument(
            "append requires at least one edge".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_edge::{Confidence, RelType};
    use gm_oid::ObjectId;
    use gm_ports::{TelemetryPorts, Ulid};
    use gm_testkit::{FakeCrypto, FakeDiagnostics, FakeFsTemp, FakeLogger, FakeMetrics, FakeRepository};

    fn sample_edge(src: u8, tgt: u8) -> Edge {
        let crypto = FakeCrypto::new();
        let ulid = Ulid::generate_with_timestamp(&crypto, 1_700_000_000_000).unwrap();
        Edge {
            src_oid: ObjectId::from_array([src; 20]),
            tgt_oid: ObjectId::from_array([tgt; 20]),
            src_sha: ObjectId::ZERO,
            tgt_sha: ObjectId::ZERO,
            rel_type: RelType::References,
            confidence: Confidence::MAX,
            timestamp: 1_700_000_000_000,
            src_path: "A".to_string(),
            tgt_path: "B".to_string(),
            ulid,
        }
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

        fn port(&self) -> JournalCommandPort<'_> {
            JournalCommandPort::new(PortContext::new(
                &self.repo,
                &self.fs_temp,
                &self.crypto,
                TelemetryPorts::new(&self.logger, &self.metrics, &self.diagnostics),
            ))
        }
    }

    #[test]
    fn append_mismatched_count_is_rejected_before_any_write() {
        let fx = Fixture::new();
        let edges = [sample_edge(0x11, 0x22)];
        let err = fx.port().append(&edges, 2).unwrap_err();
        assert!(matches!(err, GmError::InvalidArgument(_)));
        assert!(!fx.repo.reference_tip("refs/gitmind/edges/main").unwrap().has_target);
    }

    #[test]
    fn append_empty_is_rejected() {
        let fx = Fixture::new();
        let err = fx.port().append(&[], 0).unwrap_err();
        assert!(matches!(err, GmError::InvalidArgument(_)));
    }

    #[test]
    fn append_writes_to_the_journal() {
        let fx = Fixture::new();
        let edges = [sample_edge(0x11, 0x22)];
        fx.port().append(&edges, 1).unwrap();
        assert!(fx.repo.reference_tip("refs/gitmind/edges/main").unwrap().has_target);
    }

    #[test]
    fn append_attributed_writes_to_the_journal() {
        let fx = Fixture::new();
        let attributed = [AttributedEdge {
            edge: sample_edge(0x11, 0x22),
            attribution: gm_edge::Attribution::default_human(),
            lane: gm_edge::Lane::Default,
        }];
        fx.port().append_attributed(&attributed, 1).unwrap();
        assert!(fx.repo.reference_tip("refs/gitmind/edges/main").unwrap().has_target);
    }

    #[test]
    fn dispose_is_idempotent() {
        let fx = Fixture::new();
        let port = fx.port();
        port.dispose();
        port.dispose();
    }
}

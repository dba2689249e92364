//! The cache query port: `query_fanout`, `query_fanin`, `stats`,
//! delegating to `gm_cache::query` (§4.I).
//!
//! Grounded on `core/include/gitmind/query.h`'s three entry points. Unlike
//! the other two inbound ports, §4.I's algorithm needs only the
//! repository port -- no scratch files, no randomness, no telemetry are
//! specified for the query path -- but this port still takes a full
//! [`PortContext`] for construction symmetry with
//! [`crate::JournalCommandPort`] and [`crate::CacheBuildPort`], so a
//! caller can build all three from one context value.

use gm_oid::ObjectId;
use gm_ports::GmError;

use crate::context::PortContext;

pub use gm_cache::query::{QueryResult, Stats};

/// Answers fanout/fanin lookups and cache statistics for a branch.
#[derive(Clone, Copy)]
pub struct CacheQueryPort<'a> {
    ctx: PortContext<'a>,
}

impl<'a> CacheQueryPort<'a> {
    pub const fn new(ctx: PortContext<'a>) -> Self {
        Self { ctx }
    }

    /// Edge-ids of edges whose source is `oid`, served from `branch`'s
    /// cache when possible and falling back to a journal scan otherwise.
    pub fn query_fanout(&self, branch: &str, oid: ObjectId) -> Result<QueryResult, GmError> {
        gm_cache::query::query_fanout(self.ctx.repo, branch, oid)
    }

    /// Edge-ids of edges whose target is `oid`, symmetric to
    /// [`Self::query_fanout`].
    pub fn query_fanin(&self, branch: &str, oid: ObjectId) -> Result<QueryResult, GmError> {
        gm_cache::query::query_fanin(self.ctx.repo, branch, oid)
    }

    /// Cached edge count and the recursive byte size of `branch`'s cache
    /// tree.
    pub fn stats(&self, branch: &str) -> Result<Stats, GmError> {
        gm_cache::query::stats(self.ctx.repo, branch)
    }

    /// Idempotent, tolerates being called any number of times: there is no
    /// owned resource to release. [`QueryResult`] is an owned `Vec`, so
    /// there is no separate `result_free` to model here -- dropping the
    /// value is already idempotent and nil-safe the way the specification
    /// requires.
    pub fn dispose(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_edge::{Confidence, Edge, EdgeRecord, RelType};
    use gm_ports::{TelemetryPorts, Ulid};
    use gm_testkit::{FakeCrypto, FakeDiagnostics, FakeFsTemp, FakeLogger, FakeMetrics, FakeRepository};

    fn sample_record(src: u8, tgt: u8) -> EdgeRecord {
        let crypto = FakeCrypto::new();
        let ulid = Ulid::generate_with_timestamp(&crypto, 1_700_000_000_000).unwrap();
        EdgeRecord::Basic(Edge {
            src_oid: ObjectId::from_array([src; 20]),
            tgt_oid: ObjectId::from_array([tgt; 20]),
            src_sha: ObjectId::ZERO,
            tgt_sha: ObjectId::ZERO,
            rel_type: RelType::Implements,
            confidence: Confidence::MAX,
            timestamp: 1_700_000_000_000,
            src_path: "A".to_string(),
            tgt_path: "C".to_string(),
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
                repo: FakeRepository::new("q"),
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

        fn port(&self) -> CacheQueryPort<'_> {
            CacheQueryPort::new(PortContext::new(
                &self.repo,
                &self.fs_temp,
                &self.crypto,
                self.telemetry(),
            ))
        }
    }

    #[test]
    fn fanout_after_rebuild_is_served_from_cache() {
        let fx = Fixture::new();
        let telemetry = fx.telemetry();
        gm_journal::append(
            &fx.repo,
            &fx.fs_temp,
            &fx.crypto,
            &telemetry,
            &[sample_record(0x11, 0x22), sample_record(0x11, 0x33)],
        )
        .unwrap();
        gm_cache::rebuild::rebuild(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, "q", true)
            .unwrap();

        let result = fx
            .port()
            .query_fanout("q", ObjectId::from_array([0x11; 20]))
            .unwrap();
        assert_eq!(result.count(), 2);
        assert!(result.from_cache);

        let fanin = fx
            .port()
            .query_fanin("q", ObjectId::from_array([0x22; 20]))
            .unwrap();
        assert_eq!(fanin.count(), 1);
        assert!(fanin.from_cache);
    }

    #[test]
    fn fanout_without_a_cache_falls_back_to_journal_scan() {
        let fx = Fixture::new();
        let telemetry = fx.telemetry();
        gm_journal::append(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, &[sample_record(0x11, 0x22)])
            .unwrap();

        let result = fx
            .port()
            .query_fanout("q", ObjectId::from_array([0x11; 20]))
            .unwrap();
        assert_eq!(result.count(), 1);
        assert!(!result.from_cache);
    }

    #[test]
    fn stats_reports_the_rebuilt_edge_count() {
        let fx = Fixture::new();
        let telemetry = fx.telemetry();
        gm_journal::append(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, &[sample_record(0x11, 0x22)])
            .unwrap();
        gm_cache::rebuild::rebuild(&fx.repo, &fx.fs_temp, &fx.crypto, &telemetry, "q", true)
            .unwrap();

        let stats = fx.port().stats("q").unwrap();
        assert_eq!(stats.edge_count, 1);
    }

    #[test]
    fn dispose_is_idempotent() {
        let fx = Fixture::new();
        let port = fx.port();
        port.dispose();
        port.dispose();
    }
}

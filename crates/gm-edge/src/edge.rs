use gm_oid::ObjectId;
use gm_ports::Ulid;

use crate::confidence::Confidence;
use crate::lane::Lane;
use crate::rel_type::RelType;
use crate::source_type::SourceType;

/// A path field longer than this fails encoding with `InvalidLength`.
pub const MAX_PATH_LEN: usize = 4096;
/// An author field longer than this fails encoding with `InvalidLength`.
pub const MAX_AUTHOR_LEN: usize = 64;
/// A session-id field longer than this fails encoding with `InvalidLength`.
pub const MAX_SESSION_ID_LEN: usize = 32;

/// A typed, directed relationship between two blobs.
///
/// Identity is `(src_oid, tgt_oid, rel_type)` -- see [`Edge::identity_key`]
/// and [`Edge::identical_to`]. Paths, timestamp, confidence, and ULID are
/// informational and do not participate in *identity*, but the derived
/// `PartialEq` below (`==`) still compares every field: that full-field
/// comparison is what the codec's round-trip tests rely on to assert
/// `decode(encode(e)) == e`. Use `identical_to` when two edges should
/// compare equal regardless of path/timestamp/confidence/ULID, and `==`
/// when they must match field-for-field.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub src_oid: ObjectId,
    pub tgt_oid: ObjectId,
    /// Legacy 20-byte fields kept for backward compatibility; the codec
    /// back-fills `src_oid`/`tgt_oid` from these when the OID side is zero.
    pub src_sha: ObjectId,
    pub tgt_sha: ObjectId,
    pub rel_type: RelType,
    pub confidence: Confidence,
    pub timestamp: u64,
    pub src_path: String,
    pub tgt_path: String,
    pub ulid: Ulid,
}

impl Edge {
    /// The identity tuple two edges are compared by: OIDs when both sides
    /// are set, the legacy SHA pair otherwise.
    pub fn identity_key(&self) -> (ObjectId, ObjectId, u16) {
        if self.src_oid.is_zero() || self.tgt_oid.is_zero() {
            (self.src_sha, self.tgt_sha, self.rel_type.code())
        } else {
            (self.src_oid, self.tgt_oid, self.rel_type.code())
        }
    }

    /// Domain-level equality: identical identity regardless of path,
    /// timestamp, confidence, or ULID.
    pub fn identical_to(&self, other: &Edge) -> bool {
        self.identity_key() == other.identity_key()
    }
}

/// Provenance metadata attached to an [`AttributedEdge`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub source_type: SourceType,
    pub author: String,
    pub session_id: String,
    pub flags: u32,
}

impl Attribution {
    /// The attribution a basic (unattributed) record is read back as when a
    /// caller asks for attributed edges.
    pub fn default_human() -> Self {
        Self {
            source_type: SourceType::Human,
            author: "user@local".to_string(),
            session_id: String::new(),
            flags: 0,
        }
    }
}

/// An edge carrying provenance and an organizing lane.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedEdge {
    pub edge: Edge,
    pub attribution: Attribution,
    pub lane: Lane,
}

impl AttributedEdge {
    pub fn identical_to(&self, other: &AttributedEdge) -> bool {
        self.edge.identical_to(&other.edge)
    }
}

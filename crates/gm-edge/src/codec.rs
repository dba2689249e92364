use gm_cbor::{CborError, Reader, Writer};
use gm_oid::ObjectId;
use gm_ports::{GmError, ResultExt, Ulid, ULID_SIZE};

use crate::edge::{
    Attribution, AttributedEdge, Edge, MAX_AUTHOR_LEN, MAX_PATH_LEN, MAX_SESSION_ID_LEN,
};
use crate::confidence::Confidence;
use crate::lane::Lane;
use crate::rel_type::RelType;
use crate::source_type::SourceType;

const KEY_REL_TYPE: u64 = 0;
const KEY_CONFIDENCE: u64 = 1;
const KEY_TIMESTAMP: u64 = 2;
const KEY_SRC_PATH: u64 = 3;
const KEY_TGT_PATH: u64 = 4;
const KEY_ULID: u64 = 5;
const KEY_SRC_SHA: u64 = 6;
const KEY_TGT_SHA: u64 = 7;
const KEY_SRC_OID: u64 = 8;
const KEY_TGT_OID: u64 = 9;
const KEY_SOURCE_TYPE: u64 = 10;
const KEY_AUTHOR: u64 = 11;
const KEY_SESSION_ID: u64 = 12;
const KEY_FLAGS: u64 = 13;
const KEY_LANE: u64 = 14;

const BASIC_FIELD_COUNT: u8 = 10;
const ATTRIBUTED_FIELD_COUNT: u8 = 15;

/// A decoded record: a journal commit's payload may interleave both kinds,
/// so the reader works with this tagged variant rather than committing to
/// one shape up front.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeRecord {
    Basic(Edge),
    Attributed(AttributedEdge),
}

impl EdgeRecord {
    pub fn edge(&self) -> &Edge {
        match self {
            EdgeRecord::Basic(e) => e,
            EdgeRecord::Attributed(a) => &a.edge,
        }
    }
}

fn cbor_err(context: &str, err: CborError) -> GmError {
    let mapped = match err {
        CborError::InvalidUtf8 => GmError::InvalidUtf8(err.to_string()),
        CborError::TypeMismatch { .. } => GmError::InvalidType(err.to_string()),
        CborError::TextTooLong { len, max } => GmError::InvalidLength {
            expected: max,
            actual: len,
        },
        CborError::LengthOverflow(len) => GmError::InvalidLength {
            expected: gm_cbor::MAX_STRING_LEN,
            actual: len,
        },
        other => GmError::InvalidFormat(other.to_string()),
    };
    mapped.context(context)
}

fn preferred_oid(oid: ObjectId, sha: ObjectId) -> ObjectId {
    if oid.is_zero() {
        sha
    } else {
        oid
    }
}

fn write_common_fields(w: &mut Writer, edge: &Edge) -> Result<(), GmError> {
    if edge.src_path.len() >= MAX_PATH_LEN || edge.tgt_path.len() >= MAX_PATH_LEN {
        return Err(GmError::InvalidLength {
            expected: MAX_PATH_LEN,
            actual: edge.src_path.len().max(edge.tgt_path.len()),
        });
    }

    w.write_uint(KEY_REL_TYPE).map_err(|e| cbor_err("write rel_type key", e))?;
    w.write_uint(edge.rel_type.code() as u64)
        .map_err(|e| cbor_err("write rel_type", e))?;

    w.write_uint(KEY_CONFIDENCE).map_err(|e| cbor_err("write confidence key", e))?;
    w.write_uint(edge.confidence.to_half_bits() as u64)
        .map_err(|e| cbor_err("write confidence", e))?;

    w.write_uint(KEY_TIMESTAMP).map_err(|e| cbor_err("write timestamp key", e))?;
    w.write_uint(edge.timestamp).map_err(|e| cbor_err("write timestamp", e))?;

    w.write_uint(KEY_SRC_PATH).map_err(|e| cbor_err("write src_path key", e))?;
    w.write_text(&edge.src_path).map_err(|e| cbor_err("write src_path", e))?;

    w.write_uint(KEY_TGT_PATH).map_err(|e| cbor_err("write tgt_path key", e))?;
    w.write_text(&edge.tgt_path).map_err(|e| cbor_err("write tgt_path", e))?;

    w.write_uint(KEY_ULID).map_err(|e| cbor_err("write ulid key", e))?;
    w.write_text(edge.ulid.as_str()).map_err(|e| cbor_err("write ulid", e))?;

    w.write_uint(KEY_SRC_SHA).map_err(|e| cbor_err("write src_sha key", e))?;
    w.write_bytes(edge.src_sha.as_bytes()).map_err(|e| cbor_err("write src_sha", e))?;

    w.write_uint(KEY_TGT_SHA).map_err(|e| cbor_err("write tgt_sha key", e))?;
    w.write_bytes(edge.tgt_sha.as_bytes()).map_err(|e| cbor_err("write tgt_sha", e))?;

    // Preferred OIDs: mirror the legacy SHA into the OID slot when the OID
    // itself is unset, so a reader that only understands the OID key still
    // sees consistent bytes.
    w.write_uint(KEY_SRC_OID).map_err(|e| cbor_err("write src_oid key", e))?;
    w.write_bytes(preferred_oid(edge.src_oid, edge.src_sha).as_bytes())
        .map_err(|e| cbor_err("write src_oid", e))?;

    w.write_uint(KEY_TGT_OID).map_err(|e| cbor_err("write tgt_oid key", e))?;
    w.write_bytes(preferred_oid(edge.tgt_oid, edge.tgt_sha).as_bytes())
        .map_err(|e| cbor_err("write tgt_oid", e))?;

    Ok(())
}

/// Encode a basic (unattributed) edge record: a 10-field map.
pub fn encode_basic(edge: &Edge) -> Result<Vec<u8>, GmError> {
    let mut w = Writer::new();
    w.write_map_header(BASIC_FIELD_COUNT)
        .map_err(|e| cbor_err("write basic map header", e))?;
    write_common_fields(&mut w, edge)?;
    Ok(w.into_vec())
}

/// Encode an attributed edge record: a 15-field map adding provenance and
/// lane on top of the basic fields.
pub fn encode_attributed(attributed: &AttributedEdge) -> Result<Vec<u8>, GmError> {
    if attributed.attribution.author.len() > MAX_AUTHOR_LEN {
        return Err(GmError::InvalidLength {
            expected: MAX_AUTHOR_LEN,
            actual: attributed.attribution.author.len(),
        });
    }
    if attributed.attribution.session_id.len() > MAX_SESSION_ID_LEN {
        return Err(GmError::InvalidLength {
            expected: MAX_SESSION_ID_LEN,
            actual: attributed.attribution.session_id.len(),
        });
    }

    let mut w = Writer::new();
    w.write_map_header(ATTRIBUTED_FIELD_COUNT)
        .map_err(|e| cbor_err("write attributed map header", e))?;
    write_common_fields(&mut w, &attributed.edge)?;

    w.write_uint(KEY_SOURCE_TYPE).map_err(|e| cbor_err("write source_type key", e))?;
    w.write_uint(attributed.attribution.source_type.code() as u64)
        .map_err(|e| cbor_err("write source_type", e))?;

    w.write_uint(KEY_AUTHOR).map_err(|e| cbor_err("write author key", e))?;
    w.write_text(&attributed.attribution.author)
        .map_err(|e| cbor_err("write author", e))?;

    w.write_uint(KEY_SESSION_ID).map_err(|e| cbor_err("write session_id key", e))?;
    w.write_text(&attributed.attribution.session_id)
        .map_err(|e| cbor_err("write session_id", e))?;

    w.write_uint(KEY_FLAGS).map_err(|e| cbor_err("write flags key", e))?;
    w.write_uint(attributed.attribution.flags as u64)
        .map_err(|e| cbor_err("write flags", e))?;

    w.write_uint(KEY_LANE).map_err(|e| cbor_err("write lane key", e))?;
    w.write_uint(attributed.lane.code() as u64)
        .map_err(|e| cbor_err("write lane", e))?;

    Ok(w.into_vec())
}

#[derive(Default)]
struct RawFields {
    rel_type: Option<u64>,
    confidence: Option<u64>,
    timestamp: Option<u64>,
    src_path: Option<String>,
    tgt_path: Option<String>,
    ulid: Option<String>,
    src_sha: Option<Vec<u8>>,
    tgt_sha: Option<Vec<u8>>,
    src_oid: Option<Vec<u8>>,
    tgt_oid: Option<Vec<u8>>,
    source_type: Option<u64>,
    author: Option<String>,
    session_id: Option<String>,
    flags: Option<u64>,
    lane: Option<u64>,
}

fn require<T>(field: Option<T>, key: u64) -> Result<T, GmError> {
    field.ok_or_else(|| GmError::InvalidFormat(format!("missing required field key {key}")))
}

fn oid_from(bytes: &[u8]) -> Result<ObjectId, GmError> {
    ObjectId::from_bytes(bytes).map_err(|e| GmError::InvalidFormat(e.to_string()))
}

/// Decode one record from the front of `buf`, returning it and the number
/// of bytes consumed so callers can walk a concatenated payload.
///
/// Dispatch between the basic and attributed shapes is driven by the map
/// header's field count (10 vs. 15), which is fixed per variant -- this
/// reads as "try the attributed layout, fall back to basic" without
/// actually parsing twice.
pub fn decode_one(buf: &[u8]) -> Result<(EdgeRecord, usize), GmError> {
    let mut r = Reader::new(buf);
    let field_count = r
        .read_map_header()
        .map_err(|e| cbor_err("read record header", e))?;
    if field_count != BASIC_FIELD_COUNT && field_count != ATTRIBUTED_FIELD_COUNT {
        return Err(GmError::InvalidFormat(format!(
            "edge record has {field_count} field(s), expected {BASIC_FIELD_COUNT} or {ATTRIBUTED_FIELD_COUNT}"
        )));
    }

    let mut fields = RawFields::default();
    for _ in 0..field_count {
        let key = r.read_uint().map_err(|e| cbor_err("read field key", e))?;
        match key {
            KEY_REL_TYPE => fields.rel_type = Some(r.read_uint().map_err(|e| cbor_err("read rel_type", e))?),
            KEY_CONFIDENCE => {
                fields.confidence = Some(r.read_uint().map_err(|e| cbor_err("read confidence", e))?)
            }
            KEY_TIMESTAMP => {
                fields.timestamp = Some(r.read_uint().map_err(|e| cbor_err("read timestamp", e))?)
            }
            KEY_SRC_PATH => {
                fields.src_path =
                    Some(r.read_text(MAX_PATH_LEN).map_err(|e| cbor_err("read src_path", e))?)
            }
            KEY_TGT_PATH => {
                fields.tgt_path =
                    Some(r.read_text(MAX_PATH_LEN).map_err(|e| cbor_err("read tgt_path", e))?)
            }
            KEY_ULID => {
                fields.ulid =
                    Some(r.read_text(ULID_SIZE + 1).map_err(|e| cbor_err("read ulid", e))?)
            }
            KEY_SRC_SHA => {
                fields.src_sha = Some(
                    r.read_bytes_exact(gm_oid::OID_SIZE)
                        .map_err(|e| cbor_err("read src_sha", e))?,
                )
            }
            KEY_TGT_SHA => {
                fields.tgt_sha = Some(
                    r.read_bytes_exact(gm_oid::OID_SIZE)
                        .map_err(|e| cbor_err("read tgt_sha", e))?,
                )
            }
            KEY_SRC_OID => {
                fields.src_oid = Some(
                    r.read_bytes_exact(gm_oid::OID_SIZE)
                        .map_err(|e| cbor_err("read src_oid", e))?,
                )
            }
            KEY_TGT_OID => {
                fields.tgt_oid = Some(
                    r.read_bytes_exact(gm_oid::OID_SIZE)
                        .map_err(|e| cbor_err("read tgt_oid", e))?,
                )
            }
            KEY_SOURCE_TYPE => {
                fields.source_type =
                    Some(r.read_uint().map_err(|e| cbor_err("read source_type", e))?)
            }
            KEY_AUTHOR => {
                fields.author = Some(
                    r.read_text(MAX_AUTHOR_LEN + 1)
                        .map_err(|e| cbor_err("read author", e))?,
                )
            }
            KEY_SESSION_ID => {
                fields.session_id = Some(
                    r.read_text(MAX_SESSION_ID_LEN + 1)
                        .map_err(|e| cbor_err("read session_id", e))?,
                )
            }
            KEY_FLAGS => fields.flags = Some(r.read_uint().map_err(|e| cbor_err("read flags", e))?),
            KEY_LANE => fields.lane = Some(r.read_uint().map_err(|e| cbor_err("read lane", e))?),
            other => return Err(GmError::InvalidFormat(format!("unknown field key {other}"))),
        }
    }

    let src_sha = oid_from(&require(fields.src_sha, KEY_SRC_SHA)?)?;
    let tgt_sha = oid_from(&require(fields.tgt_sha, KEY_TGT_SHA)?)?;
    let mut src_oid = oid_from(&require(fields.src_oid, KEY_SRC_OID)?)?;
    let mut tgt_oid = oid_from(&require(fields.tgt_oid, KEY_TGT_OID)?)?;
    if src_oid.is_zero() && !src_sha.is_zero() {
        src_oid = src_sha;
    }
    if tgt_oid.is_zero() && !tgt_sha.is_zero() {
        tgt_oid = tgt_sha;
    }

    let ulid_text = require(fields.ulid, KEY_ULID)?;
    let ulid = Ulid::parse(&ulid_text)?;

    let edge = Edge {
        src_oid,
        tgt_oid,
        src_sha,
        tgt_sha,
        rel_type: RelType::from_code(require(fields.rel_type, KEY_REL_TYPE)? as u16),
        confidence: Confidence::from_half_bits(require(fields.confidence, KEY_CONFIDENCE)? as u16),
        timestamp: require(fields.timestamp, KEY_TIMESTAMP)?,
        src_path: require(fields.src_path, KEY_SRC_PATH)?,
        tgt_path: require(fields.tgt_path, KEY_TGT_PATH)?,
        ulid,
    };

    let consumed = r.offset();

    if field_count == BASIC_FIELD_COUNT {
        return Ok((EdgeRecord::Basic(edge), consumed));
    }

    let attribution = Attribution {
        source_type: SourceType::from_code(require(fields.source_type, KEY_SOURCE_TYPE)? as u16),
        author: require(fields.author, KEY_AUTHOR)?,
        session_id: require(fields.session_id, KEY_SESSION_ID)?,
        flags: require(fields.flags, KEY_FLAGS)? as u32,
    };
    let lane = Lane::from_code(require(fields.lane, KEY_LANE)? as u16);

    Ok((
        EdgeRecord::Attributed(AttributedEdge { edge, attribution, lane }),
        consumed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_testkit::FakeCrypto;

    fn sample_ulid() -> Ulid {
        let crypto = FakeCrypto::new();
        Ulid::generate_with_timestamp(&crypto, 1_700_000_000_000).unwrap()
    }

    fn sample_edge() -> Edge {
        Edge {
            src_oid: ObjectId::from_array([0x11; 20]),
            tgt_oid: ObjectId::from_array([0x22; 20]),
            src_sha: ObjectId::ZERO,
            tgt_sha: ObjectId::ZERO,
            rel_type: RelType::References,
            confidence: Confidence::MAX,
            timestamp: 1_700_000_000_000,
            src_path: "src/a.rs".to_string(),
            tgt_path: "src/b.rs".to_string(),
            ulid: sample_ulid(),
        }
    }

    #[test]
    fn basic_edge_round_trips_field_for_field() {
        let edge = sample_edge();
        let bytes = encode_basic(&edge).unwrap();
        let (record, consumed) = decode_one(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        match record {
            EdgeRecord::Basic(decoded) => assert_eq!(decoded, edge),
            EdgeRecord::Attributed(_) => panic!("expected a basic record"),
        }
    }

    #[test]
    fn attributed_edge_round_trips_field_for_field() {
        let attributed = AttributedEdge {
            edge: sample_edge(),
            attribution: Attribution {
                source_type: SourceType::AiClaude,
                author: "claude".to_string(),
                session_id: "sess-1".to_string(),
                flags: 7,
            },
            lane: Lane::Analysis,
        };
        let bytes = encode_attributed(&attributed).unwrap();
        let (record, consumed) = decode_one(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        match record {
            EdgeRecord::Attributed(decoded) => assert_eq!(decoded, attributed),
            EdgeRecord::Basic(_) => panic!("expected an attributed record"),
        }
    }

    #[test]
    fn ai_authored_edge_with_default_confidence_round_trips_field_for_field() {
        // AI_DEFAULT (0.85) is not exactly representable in binary16; this
        // pins the codec's invariant that every confidence a caller can
        // construct survives an encode/decode round trip unchanged, not
        // just the f16-exact Confidence::MAX used by the tests above.
        let mut edge = sample_edge();
        edge.confidence = Confidence::AI_DEFAULT;
        let attributed = AttributedEdge {
            edge,
            attribution: Attribution {
                source_type: SourceType::AiClaude,
                author: "claude".to_string(),
                session_id: "sess-1".to_string(),
                flags: 0,
            },
            lane: Lane::Default,
        };
        let bytes = encode_attributed(&attributed).unwrap();
        let (record, consumed) = decode_one(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        match record {
            EdgeRecord::Attributed(decoded) => assert_eq!(decoded, attributed),
            EdgeRecord::Basic(_) => panic!("expected an attributed record"),
        }
    }

    #[test]
    fn zero_oid_back_fills_from_sha_on_decode() {
        let mut edge = sample_edge();
        edge.src_oid = ObjectId::ZERO;
        edge.tgt_oid = ObjectId::ZERO;
        edge.src_sha = ObjectId::from_array([0xAA; 20]);
        edge.tgt_sha = ObjectId::from_array([0xBB; 20]);

        let bytes = encode_basic(&edge).unwrap();
        let (record, _) = decode_one(&bytes).unwrap();
        let decoded = record.edge();
        assert_eq!(decoded.src_oid, edge.src_sha);
        assert_eq!(decoded.tgt_oid, edge.tgt_sha);
    }

    #[test]
    fn concatenated_records_decode_in_order() {
        let e1 = sample_edge();
        let mut e2 = sample_edge();
        e2.rel_type = RelType::Implements;

        let mut payload = encode_basic(&e1).unwrap();
        payload.extend(encode_basic(&e2).unwrap());

        let (first, consumed) = decode_one(&payload).unwrap();
        assert_eq!(first.edge().rel_type, RelType::References);
        let (second, consumed2) = decode_one(&payload[consumed..]).unwrap();
        assert_eq!(second.edge().rel_type, RelType::Implements);
        assert_eq!(consumed + consumed2, payload.len());
    }

    #[test]
    fn path_at_max_len_is_rejected() {
        let mut edge = sample_edge();
        edge.src_path = "a".repeat(MAX_PATH_LEN);
        assert!(matches!(
            encode_basic(&edge),
            Err(GmError::InvalidLength { .. })
        ));
    }

    #[test]
    fn path_one_below_max_len_encodes() {
        let mut edge = sample_edge();
        edge.src_path = "a".repeat(MAX_PATH_LEN - 1);
        assert!(encode_basic(&edge).is_ok());
    }

    #[test]
    fn truncated_payload_is_invalid_format() {
        let edge = sample_edge();
        let bytes = encode_basic(&edge).unwrap();
        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(decode_one(truncated), Err(GmError::InvalidFormat(_)) | Err(GmError::Context { .. })));
    }

    #[test]
    fn unexpected_field_count_is_invalid_format() {
        let mut w = Writer::new();
        w.write_map_header(3).unwrap();
        w.write_uint(KEY_REL_TYPE).unwrap();
        w.write_uint(1).unwrap();
        w.write_uint(KEY_CONFIDENCE).unwrap();
        w.write_uint(0x3C00).unwrap();
        w.write_uint(KEY_TIMESTAMP).unwrap();
        w.write_uint(0).unwrap();
        let bytes = w.into_vec();
        assert!(matches!(decode_one(&bytes), Err(GmError::InvalidFormat(_))));
    }
}

//! Serialization and boolean algebra for the bitmaps stored in cache leaf
//! blobs.
//!
//! Grounded on `core/src/cache/bitmap.c`: an 8-byte magic plus a 2-byte
//! version and 2 reserved bytes precede the roaring-bitmap payload, and the
//! same source exposes `or`/`and`/`xor`/`andnot` over two bitmaps in
//! addition to plain serialize/deserialize -- kept here as public functions
//! per `SPEC_FULL.md`'s supplemented-features note, even though the
//! rebuilder itself only ever serializes single bitmaps.

use gm_ports::GmError;
use roaring::RoaringBitmap;

/// 8-byte ASCII magic every cache leaf blob starts with.
pub const MAGIC: &[u8; 8] = b"GMCACHE\0";

/// Cache leaf blob format version. Bumped if the on-disk layout changes.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2 + 2;

/// Serialize a bitmap into a cache leaf blob: magic, version, reserved
/// flags, then the roaring-bitmap's own serialized bytes.
pub fn serialize(bitmap: &RoaringBitmap) -> Result<Vec<u8>, GmError> {
    let mut out = Vec::with_capacity(HEADER_LEN + bitmap.serialized_size());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    out.extend_from_slice(&[0u8, 0u8]); // reserved flags
    bitmap
        .serialize_into(&mut out)
        .map_err(|e| GmError::InvalidFormat(format!("serialize bitmap: {e}")))?;
    Ok(out)
}

/// Deserialize a cache leaf blob, validating the magic and version.
///
/// Fails with [`GmError::InvalidFormat`] on a bad magic -- the query engine
/// is expected to treat this the same as a missing blob and fall back to a
/// journal scan.
pub fn deserialize(bytes: &[u8]) -> Result<RoaringBitmap, GmError> {
    if bytes.len() < HEADER_LEN {
        return Err(GmError::InvalidFormat(
            "cache blob shorter than header".to_string(),
        ));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(GmError::InvalidFormat("cache blob has bad magic".to_string()));
    }
    let version = u16::from_be_bytes([bytes[MAGIC.len()], bytes[MAGIC.len() + 1]]);
    if version != FORMAT_VERSION {
        return Err(GmError::InvalidFormat(format!(
            "cache blob has unsupported version {version}"
        )));
    }
    RoaringBitmap::deserialize_from(&bytes[HEADER_LEN..])
        .map_err(|e| GmError::InvalidFormat(format!("deserialize bitmap: {e}")))
}

/// The edge-ids present in either bitmap.
pub fn union_of(a: &RoaringBitmap, b: &RoaringBitmap) -> RoaringBitmap {
    a | b
}

/// The edge-ids present in both bitmaps.
pub fn intersect(a: &RoaringBitmap, b: &RoaringBitmap) -> RoaringBitmap {
    a & b
}

/// The edge-ids present in exactly one of the two bitmaps.
pub fn symmetric_difference(a: &RoaringBitmap, b: &RoaringBitmap) -> RoaringBitmap {
    a ^ b
}

/// The edge-ids present in `a` but not in `b`.
pub fn difference(a: &RoaringBitmap, b: &RoaringBitmap) -> RoaringBitmap {
    a - b
}

use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::OidError;

/// Size in bytes of an object id (the size of the blob hash the journal and
/// cache key everything on).
pub const OID_SIZE: usize = 20;

/// A 20-byte object identifier.
///
/// Equality is byte-wise. The all-zero value is the sentinel meaning
/// "unset" (see `is_zero`); it is distinct from any real blob hash in
/// practice but is not otherwise special-cased by this type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_SIZE]);

impl ObjectId {
    /// The all-zero sentinel OID.
    pub const ZERO: Self = Self([0u8; OID_SIZE]);

    /// Build an `ObjectId` from exactly `OID_SIZE` raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OidError> {
        if bytes.len() != OID_SIZE {
            return Err(OidError::InvalidLength {
                expected: OID_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; OID_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Build an `ObjectId` from exactly `OID_SIZE` raw bytes, known at
    /// compile time to be the right length.
    pub const fn from_array(bytes: [u8; OID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a 40-character lowercase-or-uppercase hex string.
    pub fn from_hex(hex: &str) -> Result<Self, OidError> {
        if hex.len() != OID_SIZE * 2 {
            return Err(OidError::InvalidHexLength {
                expected: OID_SIZE * 2,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; OID_SIZE];
        hex_decode(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; OID_SIZE] {
        &self.0
    }

    /// `true` for the all-zero sentinel ("unset").
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Lowercase 40-character hex rendering. This is the "auxiliary hex
    /// rendering" the data model calls out: informational, not identity --
    /// the binary form in `as_bytes` is authoritative.
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }

    /// The leading `bits` bits of this OID's hex rendering, rounded up to a
    /// whole nibble, clamped to 31 characters.
    ///
    /// `prefix(0) == ""`. Two OIDs sharing their leading `bits` bits always
    /// produce identical prefixes, because the prefix is computed from the
    /// hex rendering of the same raw bytes.
    pub fn prefix(&self, bits: u32) -> String {
        shard_prefix(self, bits)
    }
}

/// Maximum length (in hex characters) of a shard prefix, chosen to fit a
/// directory-name buffer comfortably below typical filesystem limits.
pub const MAX_SHARD_PREFIX_CHARS: usize = 31;

/// `prefix(oid, bits)` from the cache data model: the leading `bits` bits of
/// `oid`'s hex rendering, rounded up to a whole nibble and clamped to
/// [`MAX_SHARD_PREFIX_CHARS`].
pub fn shard_prefix(oid: &ObjectId, bits: u32) -> String {
    if bits == 0 {
        return String::new();
    }
    let mut chars = ((bits as usize) + 3) / 4;
    chars = chars.min(OID_SIZE * 2).min(MAX_SHARD_PREFIX_CHARS);
    oid.to_hex()[..chars].to_string()
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = OidError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn from_hex_round_trip() {
        let oid = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(oid.to_hex(), HEX);
    }

    #[test]
    fn zero_is_zero() {
        assert!(ObjectId::ZERO.is_zero());
        assert!(!ObjectId::from_hex(HEX).unwrap().is_zero());
    }

    #[test]
    fn prefix_zero_bits_is_empty() {
        let oid = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(oid.prefix(0), "");
    }

    #[test]
    fn prefix_eight_bits_is_two_hex_chars() {
        let oid = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(oid.prefix(8), &HEX[..2]);
    }

    #[test]
    fn prefix_twelve_bits_is_three_hex_chars() {
        let oid = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(oid.prefix(12), &HEX[..3]);
    }

    #[test]
    fn prefix_clamped_to_max() {
        let oid = ObjectId::from_hex(HEX).unwrap();
        // 20 bytes is only 40 hex chars; this just exercises the clamp path
        // without reading out of bounds.
        assert_eq!(oid.prefix(1000), &HEX[..40]);
    }

    #[test]
    fn shared_prefix_bits_share_prefix_string() {
        let a = ObjectId::from_hex("aabbcc0000000000000000000000000000000000").unwrap();
        let b = ObjectId::from_hex("aabbcc1111111111111111111111111111111111").unwrap();
        assert_eq!(a.prefix(24), b.prefix(24));
    }

    #[test]
    fn ordering_is_byte_wise() {
        let a = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let b = ObjectId::from_hex("0000000000000000000000000000000000000002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn invalid_hex_length_rejected() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert!(matches!(err, OidError::InvalidHexLength { .. }));
    }

    #[test]
    fn from_bytes_wrong_length_rejected() {
        let err = ObjectId::from_bytes(&[0u8; 3]).unwrap_err();
        assert!(matches!(err, OidError::InvalidLength { expected: 20, actual: 3 }));
    }

    #[test]
    fn debug_shows_short_hash() {
        let oid = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(format!("{:?}", oid), "ObjectId(da39a3ee)");
    }
}

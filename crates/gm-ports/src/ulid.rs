use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::CryptoPort;
use crate::error::GmError;

/// Length in bytes of a ULID's text rendering.
pub const ULID_SIZE: usize = 26;

const TIME_CHARS: usize = 10;
const RANDOM_BYTES: usize = 10;
const RANDOM_CHARS: usize = 16;

/// Crockford's Base32 alphabet: excludes I, L, O, U to avoid visual
/// confusion with 1, 1, 0, V.
const ENCODING: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Decode table: -1 for characters outside the alphabet, else the 5-bit
/// value. Built once as a `const` the way `gm-oid::hex`'s decode table is.
const DECODING: [i8; 256] = {
    let mut table = [-1i8; 256];
    let mut i = 0usize;
    while i < 32 {
        table[ENCODING[i] as usize] = i as i8;
        // Accept lowercase on decode too.
        if ENCODING[i].is_ascii_uppercase() {
            table[(ENCODING[i] as u8).to_ascii_lowercase() as usize] = i as i8;
        }
        i += 1;
    }
    table
};

/// A Universally Unique Lexicographically Sortable Identifier: a 48-bit
/// millisecond timestamp followed by 80 bits of randomness, encoded as 26
/// Crockford-Base32 characters.
///
/// ULIDs compare by plain string ordering: the fixed-width, big-endian
/// encoding of both components means lexicographic string order is
/// identical to (timestamp, randomness) order, so `Ord` is derived directly
/// from the inner string rather than decoded and compared numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ulid(String);

impl Ulid {
    /// Generate a new ULID using the current wall-clock time.
    pub fn generate(crypto: &dyn CryptoPort) -> Result<Self, GmError> {
        let timestamp_ms = current_time_ms();
        Self::generate_with_timestamp(crypto, timestamp_ms)
    }

    /// Generate a new ULID with an explicit timestamp (used by tests that
    /// need deterministic ordering, and by replay of historical edges).
    pub fn generate_with_timestamp(
        crypto: &dyn CryptoPort,
        timestamp_ms: u64,
    ) -> Result<Self, GmError> {
        let mut out = [0u8; ULID_SIZE];
        encode_time(timestamp_ms, &mut out[..TIME_CHARS]);

        let mut random_bytes = [0u8; RANDOM_BYTES];
        crypto.random_bytes(&mut random_bytes)?;
        encode_random(&random_bytes, &mut out[TIME_CHARS..]);

        // SAFETY: every byte written above came from `ENCODING`, which is
        // ASCII.
        let text = unsafe { String::from_utf8_unchecked(out.to_vec()) };
        Ok(Self(text))
    }

    /// Parse and validate a ULID string.
    pub fn parse(s: &str) -> Result<Self, GmError> {
        if !is_valid(s) {
            return Err(GmError::InvalidFormat(format!("not a valid ULID: {s}")));
        }
        Ok(Self(s.to_string()))
    }

    /// `true` when `s` is a syntactically valid ULID (right length,
    /// alphabet, and a timestamp component that fits in 48 bits).
    pub fn is_valid(s: &str) -> bool {
        is_valid(s)
    }

    /// Extract the embedded millisecond timestamp.
    pub fn timestamp_ms(&self) -> u64 {
        decode_time(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ulid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn encode_time(mut time_ms: u64, out: &mut [u8]) {
    debug_assert_eq!(out.len(), TIME_CHARS);
    for i in (0..TIME_CHARS).rev() {
        out[i] = ENCODING[(time_ms & 0x1F) as usize];
        time_ms >>= 5;
    }
}

fn encode_random(bytes: &[u8; RANDOM_BYTES], out: &mut [u8]) {
    debug_assert_eq!(out.len(), RANDOM_CHARS);
    let mut bits_available = 0u32;
    let mut bit_buffer = 0u32;
    let mut byte_index = 0usize;

    for out_char in out.iter_mut().take(RANDOM_CHARS) {
        while bits_available < 5 && byte_index < bytes.len() {
            bit_buffer = (bit_buffer << 8) | bytes[byte_index] as u32;
            bits_available += 8;
            byte_index += 1;
        }
        bits_available -= 5;
        *out_char = ENCODING[((bit_buffer >> bits_available) & 0x1F) as usize];
    }
}

fn is_valid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != ULID_SIZE {
        return false;
    }
    if bytes.iter().any(|&b| DECODING[b as usize] < 0) {
        return false;
    }
    // The time component is 50 bits of alphabet capacity but only 48 are
    // meaningful; the first character's top two bits must be zero.
    DECODING[bytes[0] as usize] < 16
}

fn decode_time(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut value = 0u64;
    for &b in &bytes[..TIME_CHARS] {
        value = (value << 5) | DECODING[b as usize] as u64;
    }
    value
}

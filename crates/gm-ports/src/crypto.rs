use crate::error::GmError;

/// SHA-256 digest size in bytes.
pub const SHA256_SIZE: usize = 32;

/// An in-progress SHA-256 computation.
///
/// Mirrors the init/update/final shape of a streaming hash context: callers
/// feed data incrementally (a journal payload assembled piece by piece, for
/// instance) and take the digest once at the end.
pub trait Sha256Stream {
    fn update(&mut self, data: &[u8]);
    fn finish(self: Box<Self>) -> [u8; SHA256_SIZE];
}

/// Cryptographic primitives the core needs: CSPRNG for ULID randomness, and
/// SHA-256 for optional repo-id hashing in telemetry tags.
///
/// Implementations are injected rather than called globally, so tests can
/// supply a deterministic backend without touching process-wide state.
pub trait CryptoPort {
    /// Fill `buf` with cryptographically secure random bytes.
    fn random_bytes(&self, buf: &mut [u8]) -> Result<(), GmError>;

    fn random_u32(&self) -> Result<u32, GmError>;

    fn random_u64(&self) -> Result<u64, GmError>;

    /// One-shot SHA-256 over a complete buffer.
    fn sha256(&self, data: &[u8]) -> Result<[u8; SHA256_SIZE], GmError>;

    /// Start a streaming SHA-256 computation.
    fn sha256_stream(&self) -> Box<dyn Sha256Stream>;
}

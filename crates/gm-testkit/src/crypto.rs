use std::cell::Cell;

use gm_ports::{CryptoPort, GmError, Sha256Stream, SHA256_SIZE};

/// A deterministic [`CryptoPort`]: randomness is a counter-derived stream,
/// not an actual CSPRNG, and the "SHA-256" is a cheap mix -- good enough to
/// exercise ULID generation and repo-hash tagging in tests without pulling
/// in a real crypto backend, and reproducible across test runs.
#[derive(Debug, Default)]
pub struct FakeCrypto {
    counter: Cell<u64>,
}

impl FakeCrypto {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_u64(&self) -> u64 {
        let v = self.counter.get();
        self.counter.set(v.wrapping_add(0x9E37_79B9_7F4A_7C15));
        v
    }
}

impl CryptoPort for FakeCrypto {
    fn random_bytes(&self, buf: &mut [u8]) -> Result<(), GmError> {
        let mut i = 0;
        while i < buf.len() {
            let word = self.next_u64().to_be_bytes();
            for &b in &word {
                if i >= buf.len() {
                    break;
                }
                buf[i] = b;
                i += 1;
            }
        }
        Ok(())
    }

    fn random_u32(&self) -> Result<u32, GmError> {
        Ok(self.next_u64() as u32)
    }

    fn random_u64(&self) -> Result<u64, GmError> {
        Ok(self.next_u64())
    }

    fn sha256(&self, data: &[u8]) -> Result<[u8; SHA256_SIZE], GmError> {
        Ok(fake_digest(data))
    }

    fn sha256_stream(&self) -> Box<dyn Sha256Stream> {
        Box::new(FakeStream(Vec::new()))
    }
}

struct FakeStream(Vec<u8>);

impl Sha256Stream for FakeStream {
    fn update(&mut self, data: &[u8]) {
        self.0.extend_from_slice(data);
    }

    fn finish(self: Box<Self>) -> [u8; SHA256_SIZE] {
        fake_digest(&self.0)
    }
}

/// FNV-1a-derived 256-bit mix. Deterministic and collision-resistant
/// enough for test fixtures; not a real digest.
fn fake_digest(data: &[u8]) -> [u8; SHA256_SIZE] {
    let mut out = [0u8; SHA256_SIZE];
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for (i, &b) in data.iter().enumerate() {
        hash ^= b as u64;
        hash ^= (i as u64).rotate_left(7);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        out[i % SHA256_SIZE] ^= (hash & 0xFF) as u8;
    }
    out
}

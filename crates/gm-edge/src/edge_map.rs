use gm_oid::ObjectId;
use gm_ports::VisitControl;
use roaring::RoaringBitmap;

/// Multiply-xor-shift mix over an OID's bytes. Not cryptographically
/// keyed -- the map only needs a well-distributed bucket index, not
/// collision resistance against an adversary.
fn hash_oid(oid: &ObjectId, bucket_count: usize) -> usize {
    let mut h: u64 = 0x9E37_79B9_7F4A_7C15;
    for chunk in oid.as_bytes().chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        h ^= u64::from_le_bytes(word);
        h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        h ^= h >> 33;
    }
    (h as usize) % bucket_count
}

struct Entry {
    oid: ObjectId,
    bitmap: RoaringBitmap,
}

/// A mutable mapping `{OID -> bitmap of edge-ids}` built during a single
/// rebuild pass: closed addressing over a fixed bucket count, chained
/// within each bucket in insertion order so [`EdgeMap::visit`] is fully
/// deterministic given a fixed sequence of [`EdgeMap::add`] calls.
///
/// Not thread-safe; used only by the single-threaded rebuild path. Owns
/// every bitmap it creates -- they are freed when the map is dropped.
pub struct EdgeMap {
    buckets: Vec<Vec<Entry>>,
}

impl EdgeMap {
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: (0..bucket_count).map(|_| Vec::new()).collect(),
        }
    }

    pub fn add(&mut self, oid: ObjectId, edge_id: u32) {
        let idx = hash_oid(&oid, self.buckets.len());
        let bucket = &mut self.buckets[idx];
        match bucket.iter_mut().find(|e| e.oid == oid) {
            Some(entry) => {
                entry.bitmap.insert(edge_id);
            }
            None => {
                let mut bitmap = RoaringBitmap::new();
                bitmap.insert(edge_id);
                bucket.push(Entry { oid, bitmap });
            }
        }
    }

    /// Visit every `(oid, bitmap)` pair in deterministic bucket/chain
    /// order; a callback returning [`VisitControl::Halt`] stops iteration
    /// early and that status propagates to the caller.
    pub fn visit<F>(&self, mut f: F) -> VisitControl
    where
        F: FnMut(&ObjectId, &RoaringBitmap) -> VisitControl,
    {
        for bucket in &self.buckets {
            for entry in bucket {
                if f(&entry.oid, &entry.bitmap) == VisitControl::Halt {
                    return VisitControl::Halt;
                }
            }
        }
        VisitControl::Continue
    }

    pub fn get(&self, oid: &ObjectId) -> Option<&RoaringBitmap> {
        let idx = hash_oid(oid, self.buckets.len());
        self.buckets[idx].iter().find(|e| &e.oid == oid).map(|e| &e.bitmap)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_accumulates_edge_ids_per_oid() {
        let mut map = EdgeMap::new(8);
        let oid = ObjectId::from_array([0x11; 20]);
        map.add(oid, 1);
        map.add(oid, 2);
        assert_eq!(map.len(), 1);
        let bitmap = map.get(&oid).unwrap();
        assert!(bitmap.contains(1));
        assert!(bitmap.contains(2));
    }

    #[test]
    fn distinct_oids_get_distinct_entries() {
        let mut map = EdgeMap::new(8);
        map.add(ObjectId::from_array([0x11; 20]), 1);
        map.add(ObjectId::from_array([0x22; 20]), 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn visit_is_deterministic_across_identical_insert_sequences() {
        let build = || {
            let mut map = EdgeMap::new(4);
            for i in 0..20u32 {
                map.add(ObjectId::from_array([i as u8; 20]), i);
            }
            map
        };
        let a = build();
        let b = build();

        let mut seen_a = Vec::new();
        a.visit(|oid, bitmap| {
            seen_a.push((*oid, bitmap.len()));
            VisitControl::Continue
        });
        let mut seen_b = Vec::new();
        b.visit(|oid, bitmap| {
            seen_b.push((*oid, bitmap.len()));
            VisitControl::Continue
        });
        assert_eq!(seen_a, seen_b);
    }

    #[test]
    fn visit_halts_on_request() {
        let mut map = EdgeMap::new(4);
        map.add(ObjectId::from_array([0x11; 20]), 1);
        map.add(ObjectId::from_array([0x22; 20]), 2);

        let mut count = 0;
        let result = map.visit(|_, _| {
            count += 1;
            VisitControl::Halt
        });
        assert_eq!(result, VisitControl::Halt);
        assert_eq!(count, 1);
    }
}

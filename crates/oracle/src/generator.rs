//! Index generation
//!
//! Oracles are assigned indexes at registration and each status request is
//! tagged with one index. Both come from an [`IndexGenerator`] so tests can
//! script them while production derives them from a seeded hash.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use surety_core::Principal;

/// Attempts per requested index before falling back to a linear scan
const DRAWS_PER_INDEX: usize = 64;

/// Source of pseudo-random indexes in `0..range`
pub trait IndexGenerator: Send + Sync + fmt::Debug {
    /// Next index for `principal`. Advances the generator.
    fn next_index(&self, principal: &Principal, range: u8) -> u8;

    /// `count` distinct indexes for `principal`, ascending.
    ///
    /// Caller guarantees `count <= range`.
    fn assign_indexes(&self, principal: &Principal, count: usize, range: u8) -> Vec<u8> {
        let count = count.min(range as usize);
        let mut picked = BTreeSet::new();

        for _ in 0..count * DRAWS_PER_INDEX {
            if picked.len() == count {
                break;
            }
            picked.insert(self.next_index(principal, range));
        }

        // Scripted generators may repeat themselves forever
        let mut fill = 0u8;
        while picked.len() < count {
            picked.insert(fill);
            fill += 1;
        }

        picked.into_iter().collect()
    }
}

/// SHA-256 over (seed, principal, nonce); the nonce rotates on every draw
pub struct HashIndexGenerator {
    seed: Vec<u8>,
    nonce: AtomicU64,
}

impl HashIndexGenerator {
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        Self {
            seed: seed.into(),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(seed.to_be_bytes().to_vec())
    }

    pub fn seed_hex(&self) -> String {
        hex::encode(&self.seed)
    }

    pub fn nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for HashIndexGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashIndexGenerator")
            .field("seed", &self.seed_hex())
            .field("nonce", &self.nonce())
            .finish()
    }
}

impl IndexGenerator for HashIndexGenerator {
    fn next_index(&self, principal: &Principal, range: u8) -> u8 {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        let mut hasher = Sha256::new();
        hasher.update(&self.seed);
        hasher.update(principal.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();

        tracing::trace!(
            principal = %principal,
            nonce,
            digest = %hex::encode(&digest[..4]),
            "Index drawn"
        );

        digest[0] % range.max(1)
    }
}

/// Replays a fixed script of indexes, cycling when exhausted
#[derive(Debug)]
pub struct FixedIndexGenerator {
    script: Vec<u8>,
    position: AtomicUsize,
}

impl FixedIndexGenerator {
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            script,
            position: AtomicUsize::new(0),
        }
    }
}

impl IndexGenerator for FixedIndexGenerator {
    fn next_index(&self, _principal: &Principal, range: u8) -> u8 {
        if self.script.is_empty() {
            return 0;
        }
        let position = self.position.fetch_add(1, Ordering::SeqCst);
        self.script[position % self.script.len()] % range.max(1)
    }
}

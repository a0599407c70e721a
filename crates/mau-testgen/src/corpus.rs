//! Seeded corpora for sweep-style tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `count` non-zero logical-table enable masks.
pub fn enable_masks(seed: u64, count: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| loop {
            let mask = rng.gen::<u8>();
            if mask != 0 {
                break mask;
            }
        })
        .collect()
}

/// `count` distinct entry indexes below `len`, ascending.
pub fn entry_indexes(seed: u64, len: usize, count: usize) -> Vec<usize> {
    assert!(count <= len, "cannot draw {} distinct indexes from {}", count, len);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indexes = rand::seq::index::sample(&mut rng, len, count).into_vec();
    indexes.sort_unstable();
    indexes
}

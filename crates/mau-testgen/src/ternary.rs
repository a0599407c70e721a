//! Ternary match-word generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator of driver-level (value, mask) pairs and search keys.
///
/// Generated values always fit the configured match width. Value bits under
/// a cleared mask bit stay random on purpose: encoders must ignore them,
/// and fixtures that accidentally depend on them should fail loudly.
#[derive(Debug)]
pub struct TernaryGen {
    rng: StdRng,
    width_mask: u64,
    dont_care_percent: u32,
}

impl TernaryGen {
    /// A generator for `width`-bit match words (width at most 64).
    pub fn new(seed: u64, width: u32) -> Self {
        assert!(width >= 1 && width <= 64, "match width {} out of range", width);
        let width_mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        TernaryGen {
            rng: StdRng::seed_from_u64(seed),
            width_mask,
            dont_care_percent: 50,
        }
    }

    /// Per-bit probability (0..=100) that a mask bit is don't-care.
    pub fn with_dont_care_percent(mut self, percent: u32) -> Self {
        assert!(percent <= 100, "percent {} out of range", percent);
        self.dont_care_percent = percent;
        self
    }

    /// Draws the next (value, mask) pair.
    pub fn next_word(&mut self) -> (u64, u64) {
        let value = self.rng.gen::<u64>() & self.width_mask;
        let mut mask = 0u64;
        let mut bit = 1u64;
        while bit & self.width_mask != 0 {
            if self.rng.gen_range(0..100) >= self.dont_care_percent {
                mask |= bit;
            }
            bit <<= 1;
        }
        (value, mask)
    }

    /// A key the (value, mask) pair is guaranteed to match; don't-care
    /// positions are filled with fresh random bits.
    pub fn matching_key(&mut self, value: u64, mask: u64) -> u64 {
        (value & mask) | (self.rng.gen::<u64>() & !mask & self.width_mask)
    }

    /// A key guaranteed to miss, or `None` for an all-don't-care word.
    pub fn missing_key(&mut self, value: u64, mask: u64) -> Option<u64> {
        let mask = mask & self.width_mask;
        if mask == 0 {
            return None;
        }
        let set: Vec<u32> = (0..64).filter(|b| mask & (1 << b) != 0).collect();
        let flip = set[self.rng.gen_range(0..set.len())];
        Some(self.matching_key(value, mask) ^ (1 << flip))
    }
}

//! 512-bit hit vectors.
//!
//! One physical TCAM bank produces one hit bit per entry. The vector is kept
//! as eight 64-bit words; word `g` is exactly the raw input of result group
//! `g` in the arbiter, so no repacking happens between search and
//! arbitration.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Hit vector of one physical bank (one bit per entry, 512 entries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitVector([u64; 8]);

impl HitVector {
    /// Number of entries covered (bits in the vector).
    pub const BITS: usize = 512;

    /// Number of 64-bit words backing the vector.
    pub const WORDS: usize = 8;

    /// All-zero vector (no hits).
    pub const fn zero() -> Self {
        HitVector([0; 8])
    }

    /// All-ones vector (every entry hit, chain identity).
    pub const fn ones() -> Self {
        HitVector([u64::MAX; 8])
    }

    /// Builds a vector with exactly the given entry indices set.
    pub fn from_indices(indices: &[usize]) -> Self {
        let mut v = HitVector::zero();
        for &i in indices {
            v.set_bit(i);
        }
        v
    }

    /// Returns the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 512`.
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < Self::BITS, "entry index {} out of range", index);
        (self.0[index / 64] >> (index % 64)) & 1 != 0
    }

    /// Sets the bit at `index`.
    pub fn set_bit(&mut self, index: usize) {
        assert!(index < Self::BITS, "entry index {} out of range", index);
        self.0[index / 64] |= 1 << (index % 64);
    }

    /// Clears the bit at `index`.
    pub fn clear_bit(&mut self, index: usize) {
        assert!(index < Self::BITS, "entry index {} out of range", index);
        self.0[index / 64] &= !(1 << (index % 64));
    }

    /// Returns the 64-bit word for result group `group` (0-7).
    pub fn group(&self, group: usize) -> u64 {
        self.0[group]
    }

    /// Returns true if no bit is set.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Counts set bits.
    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    /// Returns the indices of all set bits, ascending.
    pub fn set_indices(&self) -> Vec<usize> {
        (0..Self::BITS).filter(|&i| self.bit(i)).collect()
    }
}

impl Default for HitVector {
    fn default() -> Self {
        HitVector::zero()
    }
}

impl BitAnd for HitVector {
    type Output = HitVector;

    fn bitand(self, rhs: HitVector) -> HitVector {
        let mut out = self;
        out &= rhs;
        out
    }
}

impl BitAndAssign for HitVector {
    fn bitand_assign(&mut self, rhs: HitVector) {
        for (w, r) in self.0.iter_mut().zip(rhs.0.iter()) {
            *w &= r;
        }
    }
}

impl BitOr for HitVector {
    type Output = HitVector;

    fn bitor(self, rhs: HitVector) -> HitVector {
        let mut out = self;
        out |= rhs;
        out
    }
}

impl BitOrAssign for HitVector {
    fn bitor_assign(&mut self, rhs: HitVector) {
        for (w, r) in self.0.iter_mut().zip(rhs.0.iter()) {
            *w |= r;
        }
    }
}

impl fmt::Display for HitVector {
    /// Hex dump, most-significant word first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.0.iter().rev().enumerate() {
            if i > 0 {
                write!(f, "_")?;
            }
            write!(f, "{:016x}", w)?;
        }
        Ok(())
    }
}

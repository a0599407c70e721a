//! Hierarchical result arbitration.
//!
//! A bank's 512 hit bits are reduced in a fixed four-level tree: eight
//! 64-entry groups at L0, pairs at L1, quads at L2, all eight at L3.
//! Priorities pick the most-significant hit (higher entry index wins);
//! bitmaps OR regions together, staying 16 bits wide at every level so a
//! result slot always reports a 16-bucket occupancy map of whatever span it
//! covers. Combination never skips a level.

use crate::caps::{ResultMode, SlotWidth, ENTRIES_PER_SLOT, RESULT_SLOTS};
use crate::hitvec::HitVector;
use crate::placement::SlotBinding;
use mau_types::Vpn;
use serde::Serialize;

/// Priority of one 64-entry group: index of the highest set bit, -1 if none.
fn group_priority(word: u64) -> i32 {
    if word == 0 {
        -1
    } else {
        63 - word.leading_zeros() as i32
    }
}

/// 16-bit occupancy bitmap of one 64-entry group (4 entries per bit).
fn group_bitmap(word: u64) -> u16 {
    let mut bmp = 0u16;
    for j in 0..16 {
        if (word >> (4 * j)) & 0xf != 0 {
            bmp |= 1 << j;
        }
    }
    bmp
}

/// The higher-indexed half wins if it hit, offset by the level stride.
fn combine_priority(lo: i32, hi: i32, stride: i32) -> i32 {
    if hi >= 0 {
        hi + stride
    } else {
        lo
    }
}

/// Folds a 16-bit bitmap to 8 bits by adjacent-OR of bit pairs.
fn fold_bitmap(bmp: u16) -> u16 {
    let mut out = 0u16;
    for j in 0..8 {
        if (bmp >> (2 * j)) & 0b11 != 0 {
            out |= 1 << j;
        }
    }
    out
}

/// Halves both 16-bit maps and places the high half in the upper byte, so
/// the combined map still spreads 16 buckets over the doubled span.
fn combine_bitmap(lo: u16, hi: u16) -> u16 {
    (fold_bitmap(hi) << 8) | fold_bitmap(lo)
}

/// All four combination levels of one bank's tree, for one lookup.
///
/// Kept in the lookup snapshot for introspection; results are read out of
/// it per bound slot via [`ArbiterTrace::priority_at`] and
/// [`ArbiterTrace::bitmap_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbiterTrace {
    pub l0_priority: [i32; 8],
    pub l1_priority: [i32; 4],
    pub l2_priority: [i32; 2],
    pub l3_priority: i32,
    pub l0_bitmap: [u16; 8],
    pub l1_bitmap: [u16; 4],
    pub l2_bitmap: [u16; 2],
    pub l3_bitmap: u16,
}

/// Runs the full combination tree over a final hit vector.
pub fn combine(vector: &HitVector) -> ArbiterTrace {
    let mut l0_priority = [-1i32; 8];
    let mut l0_bitmap = [0u16; 8];
    for g in 0..RESULT_SLOTS {
        l0_priority[g] = group_priority(vector.group(g));
        l0_bitmap[g] = group_bitmap(vector.group(g));
    }

    let mut l1_priority = [-1i32; 4];
    let mut l1_bitmap = [0u16; 4];
    for i in 0..4 {
        l1_priority[i] = combine_priority(l0_priority[2 * i], l0_priority[2 * i + 1], 64);
        l1_bitmap[i] = combine_bitmap(l0_bitmap[2 * i], l0_bitmap[2 * i + 1]);
    }

    let mut l2_priority = [-1i32; 2];
    let mut l2_bitmap = [0u16; 2];
    for i in 0..2 {
        l2_priority[i] = combine_priority(l1_priority[2 * i], l1_priority[2 * i + 1], 128);
        l2_bitmap[i] = combine_bitmap(l1_bitmap[2 * i], l1_bitmap[2 * i + 1]);
    }

    let l3_priority = combine_priority(l2_priority[0], l2_priority[1], 256);
    let l3_bitmap = combine_bitmap(l2_bitmap[0], l2_bitmap[1]);

    ArbiterTrace {
        l0_priority,
        l1_priority,
        l2_priority,
        l3_priority,
        l0_bitmap,
        l1_bitmap,
        l2_bitmap,
        l3_bitmap,
    }
}

impl ArbiterTrace {
    /// Combined priority of the span `[base_slot, base_slot + width)`.
    pub fn priority_at(&self, base_slot: usize, width: SlotWidth) -> i32 {
        match width {
            SlotWidth::One => self.l0_priority[base_slot],
            SlotWidth::Two => self.l1_priority[base_slot / 2],
            SlotWidth::Four => self.l2_priority[base_slot / 4],
            SlotWidth::Eight => self.l3_priority,
        }
    }

    /// Combined bitmap of the span `[base_slot, base_slot + width)`.
    pub fn bitmap_at(&self, base_slot: usize, width: SlotWidth) -> u16 {
        match width {
            SlotWidth::One => self.l0_bitmap[base_slot],
            SlotWidth::Two => self.l1_bitmap[base_slot / 2],
            SlotWidth::Four => self.l2_bitmap[base_slot / 4],
            SlotWidth::Eight => self.l3_bitmap,
        }
    }
}

/// Final outcome of one bound result slot for one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotResult {
    pub binding: SlotBinding,
    pub hit: bool,
    /// Composed match address (priority mode) or bitmap (bitmap mode),
    /// already left-shifted by the configured amount.
    pub output: u32,
    /// Stored action payload of the winning entry (priority mode only).
    pub action: bool,
    /// Winning entry index within the bank (priority mode only).
    pub entry_index: Option<usize>,
}

/// Finalizes one bound slot from a combined tree.
///
/// `action_of` reads the stored action payload of an entry; it is consulted
/// only for the winning index of a priority-mode hit.
pub fn finalize(
    binding: &SlotBinding,
    trace: &ArbiterTrace,
    vpn: Vpn,
    shift: u32,
    action_of: impl Fn(usize) -> bool,
) -> SlotResult {
    match binding.mode {
        ResultMode::Priority => {
            let priority = trace.priority_at(binding.base_slot, binding.width);
            if priority < 0 {
                return SlotResult {
                    binding: *binding,
                    hit: false,
                    output: 0,
                    action: false,
                    entry_index: None,
                };
            }
            let entry_index = binding.base_slot * ENTRIES_PER_SLOT + priority as usize;
            let addr = (vpn.as_u32() << binding.width.address_bits()) | priority as u32;
            SlotResult {
                binding: *binding,
                hit: true,
                output: addr << shift,
                action: action_of(entry_index),
                entry_index: Some(entry_index),
            }
        }
        ResultMode::Bitmap => {
            let bitmap = trace.bitmap_at(binding.base_slot, binding.width);
            SlotResult {
                binding: *binding,
                hit: bitmap != 0,
                output: (bitmap as u32) << shift,
                action: false,
                entry_index: None,
            }
        }
    }
}

/// Splits a composed priority-mode address back into (vpn, entry offset
/// within the slot span). Inverse of the composition in [`finalize`].
pub fn decode_match_addr(addr: u32, width: SlotWidth, shift: u32) -> (u16, usize) {
    let unshifted = addr >> shift;
    let priority_mask = (1u32 << width.address_bits()) - 1;
    (
        (unshifted >> width.address_bits()) as u16,
        (unshifted & priority_mask) as usize,
    )
}

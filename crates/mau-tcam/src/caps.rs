//! Per-generation capability tables.
//!
//! Everything that differs between hardware generations is resolved here,
//! once, into a [`ChipCapabilities`] value held by the array for its whole
//! life. No other module branches on [`ChipGeneration`].
//!
//! The per-slot width tables are hardware truth carried as literal data,
//! never derived from a formula.

use crate::hitvec::HitVector;
use mau_types::ChipGeneration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entries per physical bank.
pub const ENTRIES_PER_BANK: usize = HitVector::BITS;

/// Result slots (64-entry slices) per bank.
pub const RESULT_SLOTS: usize = 8;

/// Entries covered by one result slot at width one.
pub const ENTRIES_PER_SLOT: usize = ENTRIES_PER_BANK / RESULT_SLOTS;

/// Width of a physical result combination, in 64-entry slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SlotWidth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl SlotWidth {
    /// All widths, narrowest first (the combination order).
    pub const ALL: [SlotWidth; 4] = [
        SlotWidth::One,
        SlotWidth::Two,
        SlotWidth::Four,
        SlotWidth::Eight,
    ];

    /// Number of 64-entry slices combined.
    pub const fn slices(self) -> usize {
        self as usize
    }

    /// Combination-tree level holding this width (L0-L3).
    pub const fn level(self) -> usize {
        match self {
            SlotWidth::One => 0,
            SlotWidth::Two => 1,
            SlotWidth::Four => 2,
            SlotWidth::Eight => 3,
        }
    }

    /// Bits of encoded priority in a match address at this width.
    ///
    /// A width-w result spans 64*w entries, so its priority field needs
    /// log2(64*w) bits: 6, 7, 8, 9 for widths 1, 2, 4, 8.
    pub const fn address_bits(self) -> u32 {
        match self {
            SlotWidth::One => 6,
            SlotWidth::Two => 7,
            SlotWidth::Four => 8,
            SlotWidth::Eight => 9,
        }
    }
}

impl fmt::Display for SlotWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl TryFrom<u8> for SlotWidth {
    type Error = String;

    fn try_from(w: u8) -> Result<Self, Self::Error> {
        match w {
            1 => Ok(SlotWidth::One),
            2 => Ok(SlotWidth::Two),
            4 => Ok(SlotWidth::Four),
            8 => Ok(SlotWidth::Eight),
            _ => Err(format!("invalid slot width: {} (must be 1, 2, 4 or 8)", w)),
        }
    }
}

impl From<SlotWidth> for u8 {
    fn from(w: SlotWidth) -> u8 {
        w as u8
    }
}

/// Result encoding mode of a physical result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    /// Highest matching entry wins; output is vpn plus encoded priority.
    Priority,
    /// Regional OR of the hit vector; output is a 16-bit occupancy bitmap.
    Bitmap,
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultMode::Priority => "priority",
            ResultMode::Bitmap => "bitmap",
        };
        write!(f, "{}", s)
    }
}

/// Resolved capabilities of one hardware generation.
#[derive(Debug)]
pub struct ChipCapabilities {
    pub generation: ChipGeneration,
    /// Bank rows per column (always even; chains split at rows/2).
    pub rows: usize,
    /// Bank columns per array.
    pub cols: usize,
    /// Match word width in bits.
    pub key_bits: u32,
    /// One logical table per bank, full-width priority results only.
    pub single_table: bool,
    /// Wide matches may merge across the column midpoint.
    pub midpoint_merge: bool,
    /// Bitmap result mode exists on this generation.
    pub bitmap_mode: bool,
    /// Legal combination widths per base slot. A width-w result occupies
    /// slices [base, base + w).
    pub slot_widths: [&'static [SlotWidth]; RESULT_SLOTS],
}

const CYPRESS_SLOT_WIDTHS: [&[SlotWidth]; RESULT_SLOTS] = [
    &[SlotWidth::Eight],
    &[],
    &[],
    &[],
    &[],
    &[],
    &[],
    &[],
];

const REDWOOD_SLOT_WIDTHS: [&[SlotWidth]; RESULT_SLOTS] = [
    &[
        SlotWidth::One,
        SlotWidth::Two,
        SlotWidth::Four,
        SlotWidth::Eight,
    ],
    &[SlotWidth::One],
    &[SlotWidth::One, SlotWidth::Two],
    &[SlotWidth::One],
    &[SlotWidth::One, SlotWidth::Two, SlotWidth::Four],
    &[SlotWidth::One],
    &[SlotWidth::One, SlotWidth::Two],
    &[SlotWidth::One],
];

static CYPRESS: ChipCapabilities = ChipCapabilities {
    generation: ChipGeneration::Cypress,
    rows: 8,
    cols: 1,
    key_bits: 40,
    single_table: true,
    midpoint_merge: false,
    bitmap_mode: false,
    slot_widths: CYPRESS_SLOT_WIDTHS,
};

static REDWOOD: ChipCapabilities = ChipCapabilities {
    generation: ChipGeneration::Redwood,
    rows: 12,
    cols: 2,
    key_bits: 44,
    single_table: false,
    midpoint_merge: true,
    bitmap_mode: true,
    slot_widths: REDWOOD_SLOT_WIDTHS,
};

impl ChipCapabilities {
    /// Resolves the capability table for a generation.
    pub fn for_generation(generation: ChipGeneration) -> &'static ChipCapabilities {
        match generation {
            ChipGeneration::Cypress => &CYPRESS,
            ChipGeneration::Redwood => &REDWOOD,
        }
    }

    /// Mask selecting the valid key bits.
    pub const fn key_mask(&self) -> u64 {
        if self.key_bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.key_bits) - 1
        }
    }

    /// First row of a column's upper half.
    pub const fn midpoint(&self) -> usize {
        self.rows / 2
    }

    /// Total banks in the array.
    pub const fn bank_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns true if a width-w result may sit on `base_slot`.
    pub fn width_legal_at(&self, base_slot: usize, width: SlotWidth) -> bool {
        base_slot < RESULT_SLOTS && self.slot_widths[base_slot].contains(&width)
    }

    /// Arbitration rank of a bank. Unique per (col, row) by construction,
    /// so per-ID reduction across banks can never tie.
    pub const fn bank_priority(&self, col: usize, row: usize) -> u32 {
        (col * self.rows + row) as u32
    }
}

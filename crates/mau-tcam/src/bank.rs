//! Physical TCAM banks.
//!
//! A bank is one row/column unit: 512 ternary entries, the driver-facing
//! configuration word, the logical-table bindings installed on it, and a
//! hits-mask applied before its results are finalized.

use crate::caps::{ChipCapabilities, ENTRIES_PER_BANK};
use crate::entry::TcamEntry;
use crate::error::{ModelError, ModelResult};
use crate::hitvec::HitVector;
use crate::placement::SlotBinding;
use mau_types::{Gress, Vpn};
use serde::{Deserialize, Serialize};

/// Driver-facing configuration of one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    /// Row-group identity mask (bit r set for every row of the bank's
    /// chain group). Zero means the bank stands alone.
    pub row_mask: u16,
    /// Logical tables enabled on this bank, one bit per ID.
    pub logical_mask: u8,
    /// Page number folded into every priority-mode address produced here.
    pub vpn: Vpn,
    /// Thread tag gating participation per lookup.
    pub gress: Gress,
    /// Forward the hit vector to the next row instead of finalizing.
    pub chain_out: bool,
    /// This row's arbitration is a terminal output.
    pub match_out: bool,
    /// Half of a cross-midpoint wide match.
    pub wide: bool,
    /// Opaque driver word, surfaced in diagnostics only.
    pub info: u32,
}

impl BankConfig {
    pub fn new() -> Self {
        BankConfig {
            row_mask: 0,
            logical_mask: 0,
            vpn: Vpn::default(),
            gress: Gress::Both,
            chain_out: false,
            match_out: false,
            wide: false,
            info: 0,
        }
    }

    pub fn with_row_mask(mut self, row_mask: u16) -> Self {
        self.row_mask = row_mask;
        self
    }

    pub fn with_logical_mask(mut self, logical_mask: u8) -> Self {
        self.logical_mask = logical_mask;
        self
    }

    pub fn with_vpn(mut self, vpn: Vpn) -> Self {
        self.vpn = vpn;
        self
    }

    pub fn with_gress(mut self, gress: Gress) -> Self {
        self.gress = gress;
        self
    }

    pub fn with_chain_out(mut self, chain_out: bool) -> Self {
        self.chain_out = chain_out;
        self
    }

    pub fn with_match_out(mut self, match_out: bool) -> Self {
        self.match_out = match_out;
        self
    }

    pub fn with_wide(mut self, wide: bool) -> Self {
        self.wide = wide;
        self
    }

    pub fn with_info(mut self, info: u32) -> Self {
        self.info = info;
        self
    }

    /// Field-width validation against the generation's geometry.
    pub fn validate(&self, caps: &ChipCapabilities) -> ModelResult<()> {
        let limit = (1u32 << caps.rows) - 1;
        if (self.row_mask as u32) > limit {
            return Err(ModelError::field_range(
                "row_mask",
                self.row_mask as u64,
                limit as u64,
            ));
        }
        Ok(())
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        BankConfig::new()
    }
}

/// One physical bank and its runtime state.
#[derive(Debug, Clone)]
pub struct TcamBank {
    col: usize,
    row: usize,
    config: BankConfig,
    entries: Vec<TcamEntry>,
    hits_mask: HitVector,
    bindings: Vec<SlotBinding>,
    priority: u32,
}

impl TcamBank {
    pub(crate) fn new(col: usize, row: usize, config: BankConfig, priority: u32) -> Self {
        TcamBank {
            col,
            row,
            config,
            entries: vec![TcamEntry::never_match(); ENTRIES_PER_BANK],
            hits_mask: HitVector::ones(),
            bindings: Vec::new(),
            priority,
        }
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Arbitration rank among all banks of the array.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn bindings(&self) -> &[SlotBinding] {
        &self.bindings
    }

    pub(crate) fn set_bindings(&mut self, bindings: Vec<SlotBinding>) {
        self.bindings = bindings;
    }

    pub fn hits_mask(&self) -> &HitVector {
        &self.hits_mask
    }

    pub(crate) fn set_hits_mask(&mut self, mask: HitVector) {
        self.hits_mask = mask;
    }

    /// Stores an entry, forcing bits above the match width to don't-care.
    pub(crate) fn write_entry(
        &mut self,
        index: usize,
        entry: TcamEntry,
        key_mask: u64,
    ) -> ModelResult<()> {
        if index >= ENTRIES_PER_BANK {
            return Err(ModelError::geometry(format!(
                "entry index {} out of range (bank holds {})",
                index, ENTRIES_PER_BANK
            )));
        }
        self.entries[index] = entry.widened(key_mask);
        Ok(())
    }

    pub fn entry(&self, index: usize) -> Option<&TcamEntry> {
        self.entries.get(index)
    }

    /// Stored action payload of one entry.
    pub fn action_of(&self, index: usize) -> bool {
        self.entries[index].action()
    }

    /// Raw per-entry comparison of the whole bank against a key.
    pub fn search(&self, key: u64) -> HitVector {
        let mut hits = HitVector::zero();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.matches(key) {
                hits.set_bit(i);
            }
        }
        hits
    }

    /// Multi-row duplication spread over a raw hit vector.
    ///
    /// Scans entry indices ascending; an entry without a boundary marker
    /// inherits the spread hit of its predecessor (index 0 never inherits).
    pub fn spread(&self, raw: &HitVector) -> HitVector {
        let mut out = HitVector::zero();
        let mut prev = false;
        for i in 0..ENTRIES_PER_BANK {
            let hit = raw.bit(i) || (prev && !self.entries[i].is_boundary());
            if hit {
                out.set_bit(i);
            }
            prev = hit;
        }
        out
    }
}

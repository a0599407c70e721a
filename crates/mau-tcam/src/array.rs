//! The TCAM array: banks, lifecycle, and per-table results.
//!
//! An array owns the full grid of banks of one match stage. Configuration
//! flows through three states: banks are configured, the array is installed
//! (placement and chain validation happen here), then lookups run. A lookup
//! never mutates match state; it stores a diagnostic snapshot and returns
//! the per-logical-table outcome.

use crate::bank::{BankConfig, TcamBank};
use crate::caps::ChipCapabilities;
use crate::chain::{self, BankTrace};
use crate::entry::TcamEntry;
use crate::error::{ModelError, ModelResult};
use crate::hitvec::HitVector;
use crate::placement::{self, PlacementOverrides, SlotBinding};
use mau_types::{ChipGeneration, Gress, LogicalTableId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Array-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayConfig {
    pub generation: ChipGeneration,
    /// Placement seed; bindings are a pure function of (seed, ID mask).
    #[serde(default)]
    pub seed: u64,
    /// Left shift applied to every final address/bitmap output.
    #[serde(default)]
    pub match_addr_shift: u32,
    /// Report placement overflow on restricted hardware instead of
    /// downgrading to the highest enabled ID.
    #[serde(default)]
    pub strict_placement: bool,
    #[serde(default)]
    pub overrides: PlacementOverrides,
}

impl ArrayConfig {
    pub fn new(generation: ChipGeneration) -> Self {
        ArrayConfig {
            generation,
            seed: 0,
            match_addr_shift: 0,
            strict_placement: false,
            overrides: PlacementOverrides::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_match_addr_shift(mut self, shift: u32) -> Self {
        self.match_addr_shift = shift;
        self
    }

    pub fn with_strict_placement(mut self, strict: bool) -> Self {
        self.strict_placement = strict;
        self
    }

    pub fn with_overrides(mut self, overrides: PlacementOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Lifecycle of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// No bank configured yet.
    Unconfigured,
    /// Bank configuration present but not installed (or stale after a
    /// reconfiguration); lookups are rejected.
    Configured,
    /// Installed and ready for lookups.
    Armed,
    /// At least one lookup resolved since installation.
    Resolved,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Unconfigured => "unconfigured",
            LifecycleState::Configured => "configured",
            LifecycleState::Armed => "armed",
            LifecycleState::Resolved => "resolved",
        };
        write!(f, "{}", s)
    }
}

/// Final per-logical-table outcome of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableResult {
    pub hit: bool,
    /// Composed match address (or bitmap), already shifted.
    pub address: u32,
    pub action: bool,
    /// Arbitration rank of the winning bank; -1 on miss.
    pub priority: i32,
}

impl TableResult {
    pub const fn miss() -> Self {
        TableResult {
            hit: false,
            address: 0,
            action: false,
            priority: -1,
        }
    }
}

impl Default for TableResult {
    fn default() -> Self {
        TableResult::miss()
    }
}

/// Results of one lookup, indexed by logical table ID.
///
/// All eight IDs are always present; IDs with no bound bank (or no hit)
/// report [`TableResult::miss`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupOutcome {
    results: [TableResult; LogicalTableId::COUNT],
}

impl LookupOutcome {
    pub fn result(&self, id: LogicalTableId) -> &TableResult {
        &self.results[id.as_usize()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalTableId, &TableResult)> + '_ {
        LogicalTableId::all().map(move |id| (id, self.result(id)))
    }

    /// Number of logical tables that hit.
    pub fn hit_count(&self) -> usize {
        self.results.iter().filter(|r| r.hit).count()
    }
}

/// Diagnostic snapshot of the most recent lookup.
#[derive(Debug, Clone)]
pub struct LookupTrace {
    /// Search key after truncation to the match width.
    pub key: u64,
    pub gress: Gress,
    pub banks: Vec<BankTrace>,
    pub outcome: LookupOutcome,
}

/// The TCAM array of one match stage.
#[derive(Debug)]
pub struct TcamArray {
    caps: &'static ChipCapabilities,
    config: ArrayConfig,
    banks: Vec<Option<TcamBank>>,
    state: LifecycleState,
    last: Option<LookupTrace>,
}

/// Address output is at most 9 vpn bits plus 9 priority bits wide.
const MAX_ADDR_SHIFT: u32 = 14;

impl TcamArray {
    /// Creates an empty array for one hardware generation.
    pub fn new(config: ArrayConfig) -> ModelResult<Self> {
        if config.match_addr_shift > MAX_ADDR_SHIFT {
            return Err(ModelError::field_range(
                "match_addr_shift",
                config.match_addr_shift as u64,
                MAX_ADDR_SHIFT as u64,
            ));
        }
        let caps = ChipCapabilities::for_generation(config.generation);
        Ok(TcamArray {
            caps,
            config,
            banks: vec![None; caps.bank_count()],
            state: LifecycleState::Unconfigured,
            last: None,
        })
    }

    pub fn caps(&self) -> &ChipCapabilities {
        self.caps
    }

    pub fn config(&self) -> &ArrayConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn index(&self, col: usize, row: usize) -> ModelResult<usize> {
        if col >= self.caps.cols || row >= self.caps.rows {
            return Err(ModelError::geometry(format!(
                "bank ({}, {}) outside {}x{} grid",
                col, row, self.caps.cols, self.caps.rows
            )));
        }
        Ok(col * self.caps.rows + row)
    }

    fn bank_mut(&mut self, col: usize, row: usize) -> ModelResult<&mut TcamBank> {
        let idx = self.index(col, row)?;
        self.banks[idx]
            .as_mut()
            .ok_or_else(|| ModelError::geometry(format!("bank ({}, {}) not configured", col, row)))
    }

    /// Configures (or reconfigures) one bank.
    ///
    /// Reconfiguration after installation demotes the array to
    /// `Configured`; it must be re-installed before the next lookup.
    pub fn configure(&mut self, col: usize, row: usize, config: BankConfig) -> ModelResult<()> {
        let idx = self.index(col, row)?;
        config.validate(self.caps)?;
        if config.wide && !self.caps.midpoint_merge {
            return Err(ModelError::unsupported("wide midpoint match"));
        }
        if config.row_mask != 0 && config.row_mask & (1 << row) == 0 {
            return Err(ModelError::chain_mismatch(
                col,
                format!("row mask {:#x} excludes its own row {}", config.row_mask, row),
            ));
        }

        debug!(
            "configure bank ({}, {}): tables {:#04x}, vpn {}, gress {}",
            col, row, config.logical_mask, config.vpn, config.gress
        );
        self.banks[idx] = Some(TcamBank::new(
            col,
            row,
            config,
            self.caps.bank_priority(col, row),
        ));
        self.state = LifecycleState::Configured;
        self.last = None;
        Ok(())
    }

    /// Writes one entry from a driver-level (value, mask) pair.
    pub fn write_rule(
        &mut self,
        col: usize,
        row: usize,
        index: usize,
        value: u64,
        mask: u64,
    ) -> ModelResult<()> {
        let key_mask = self.caps.key_mask();
        if value & !key_mask != 0 {
            return Err(ModelError::field_range("value", value, key_mask));
        }
        if mask & !key_mask != 0 {
            return Err(ModelError::field_range("mask", mask, key_mask));
        }
        self.write_entry(col, row, index, TcamEntry::from_value_mask(value, mask))
    }

    /// Writes one entry from a prepared register image.
    pub fn write_entry(
        &mut self,
        col: usize,
        row: usize,
        index: usize,
        entry: TcamEntry,
    ) -> ModelResult<()> {
        let key_mask = self.caps.key_mask();
        self.bank_mut(col, row)?.write_entry(index, entry, key_mask)
    }

    /// Replaces the hits-mask applied before a bank finalizes.
    pub fn set_hits_mask(&mut self, col: usize, row: usize, mask: HitVector) -> ModelResult<()> {
        self.bank_mut(col, row)?.set_hits_mask(mask);
        Ok(())
    }

    pub fn bank(&self, col: usize, row: usize) -> Option<&TcamBank> {
        let idx = self.index(col, row).ok()?;
        self.banks[idx].as_ref()
    }

    /// Bindings installed on one bank (empty before installation).
    pub fn bindings(&self, col: usize, row: usize) -> &[SlotBinding] {
        self.bank(col, row).map_or(&[], |b| b.bindings())
    }

    /// Validates chains and places logical tables; arms the array.
    pub fn install(&mut self) -> ModelResult<()> {
        if self.state == LifecycleState::Unconfigured {
            return Err(ModelError::lifecycle("install", self.state.to_string()));
        }

        for col in 0..self.caps.cols {
            self.validate_column(col)?;
        }

        let caps = self.caps;
        let cfg = self.config;
        let mut bound = 0usize;
        for bank in self.banks.iter_mut().flatten() {
            let mask = bank.config().logical_mask;
            if mask == 0 {
                if bank.config().match_out {
                    warn!(
                        "bank ({}, {}) has match-out but no logical tables; it can never hit",
                        bank.col(),
                        bank.row()
                    );
                }
                bank.set_bindings(Vec::new());
                continue;
            }
            let bindings = placement::place_tables(
                caps,
                cfg.seed,
                mask,
                cfg.overrides,
                cfg.strict_placement,
            )?;
            bound += bindings.len();
            bank.set_bindings(bindings);
        }

        self.state = LifecycleState::Armed;
        info!(
            "installed {} array: {} banks configured, {} table bindings",
            caps.generation,
            self.banks.iter().flatten().count(),
            bound
        );
        Ok(())
    }

    /// Structural chain validation for one column.
    fn validate_column(&self, col: usize) -> ModelResult<()> {
        let rows = self.caps.rows;
        let mid = self.caps.midpoint();
        let bank_at = |r: usize| self.banks[col * rows + r].as_ref();

        for r in 0..rows {
            let Some(bank) = bank_at(r) else { continue };
            let cfg = bank.config();
            if !cfg.chain_out {
                continue;
            }

            let crossing = r + 1 == mid || r == mid;
            if crossing {
                if !self.caps.midpoint_merge {
                    return Err(ModelError::unsupported("midpoint crossing"));
                }
                let partner_row = if r == mid { mid - 1 } else { mid };
                let Some(partner) = bank_at(partner_row) else {
                    return Err(ModelError::broken_chain(
                        col,
                        r,
                        format!("chain-out crosses into unconfigured row {}", partner_row),
                    ));
                };
                if !cfg.wide || !partner.config().wide {
                    return Err(ModelError::broken_chain(
                        col,
                        r,
                        "midpoint crossing requires the wide flag on both rows",
                    ));
                }
                if partner.config().chain_out {
                    return Err(ModelError::broken_chain(
                        col,
                        r,
                        "both midpoint rows chain out (crossing loop)",
                    ));
                }
                self.check_chain_pair(col, r, cfg, partner_row, partner.config())?;
            } else {
                let consumer_row = if r < mid { r + 1 } else { r - 1 };
                let Some(consumer) = bank_at(consumer_row) else {
                    return Err(ModelError::broken_chain(
                        col,
                        r,
                        format!("chain-out feeds unconfigured row {}", consumer_row),
                    ));
                };
                self.check_chain_pair(col, r, cfg, consumer_row, consumer.config())?;
            }
        }
        Ok(())
    }

    fn check_chain_pair(
        &self,
        col: usize,
        row: usize,
        cfg: &BankConfig,
        other_row: usize,
        other: &BankConfig,
    ) -> ModelResult<()> {
        if cfg.gress != other.gress {
            return Err(ModelError::chain_mismatch(
                col,
                format!(
                    "rows {} and {} disagree on gress ({} vs {})",
                    row, other_row, cfg.gress, other.gress
                ),
            ));
        }
        if cfg.row_mask != other.row_mask {
            return Err(ModelError::chain_mismatch(
                col,
                format!(
                    "rows {} and {} disagree on row mask ({:#x} vs {:#x})",
                    row, other_row, cfg.row_mask, other.row_mask
                ),
            ));
        }
        Ok(())
    }

    /// Runs one lookup and stores its diagnostic snapshot.
    ///
    /// Identical configuration and key always produce identical outcomes.
    /// Unbound banks and empty chains degrade to misses; only lifecycle
    /// misuse is an error.
    pub fn lookup(&mut self, key: u64, gress: Gress) -> ModelResult<LookupOutcome> {
        match self.state {
            LifecycleState::Armed | LifecycleState::Resolved => {}
            _ => return Err(ModelError::lifecycle("lookup", self.state.to_string())),
        }

        let caps = self.caps;
        let key = key & caps.key_mask();
        let shift = self.config.match_addr_shift;

        let mut traces: Vec<BankTrace> = Vec::new();
        for col in 0..caps.cols {
            let column = &self.banks[col * caps.rows..(col + 1) * caps.rows];
            traces.extend(chain::evaluate_column(col, column, caps, key, gress, shift));
        }

        // Per-ID reduction: the highest-ranked bank exposing an ID wins.
        // Ranks are unique, so there are no ties to break.
        let mut results = [TableResult::miss(); LogicalTableId::COUNT];
        for trace in &traces {
            let rank = caps.bank_priority(trace.col, trace.row) as i32;
            for slot in &trace.results {
                if !slot.hit {
                    continue;
                }
                let entry = &mut results[slot.binding.id.as_usize()];
                if rank > entry.priority {
                    *entry = TableResult {
                        hit: true,
                        address: slot.output,
                        action: slot.action,
                        priority: rank,
                    };
                }
            }
        }

        let outcome = LookupOutcome { results };
        debug!(
            "lookup key {:#x} gress {}: {} table hit(s)",
            key,
            gress,
            outcome.hit_count()
        );
        self.last = Some(LookupTrace {
            key,
            gress,
            banks: traces,
            outcome: outcome.clone(),
        });
        self.state = LifecycleState::Resolved;
        Ok(outcome)
    }

    /// Snapshot of the most recent lookup, if any resolved since the last
    /// (re)configuration.
    pub fn last_trace(&self) -> Option<&LookupTrace> {
        self.last.as_ref()
    }
}

//! Row chaining within a column.
//!
//! Chains build match keys wider than one physical row: every chained row
//! masks the vector handed to it with its own (spread) matches, so a hit
//! survives only if every row of the chain matched. The lower half of a
//! column chains upward (row 0 toward the midpoint), the upper half chains
//! downward, and a wide pair at the midpoint may AND the two halves
//! together before the terminal row finalizes.
//!
//! Evaluation order per lookup is fixed: local vectors, lower fold, upper
//! fold, midpoint merge, then finalization. Lookup-time oddities (no
//! matches, unbound terminals) degrade to empty results; structural
//! problems were already rejected at install time.

use crate::arbiter::{self, ArbiterTrace, SlotResult};
use crate::bank::TcamBank;
use crate::caps::ChipCapabilities;
use crate::hitvec::HitVector;
use mau_types::Gress;

/// Per-bank record of one lookup, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct BankTrace {
    pub col: usize,
    pub row: usize,
    /// Whether the bank's gress covered the lookup tag.
    pub participated: bool,
    /// Raw per-entry matches.
    pub raw: HitVector,
    /// Raw matches after multi-row duplication spread.
    pub local: HitVector,
    /// Vector chained in from the neighbor row (all-ones when none).
    pub hits_in: HitVector,
    /// Local vector masked with the chained-in vector (and the midpoint
    /// merge, where one applied).
    pub out: HitVector,
    /// Combination tree, when this row finalized.
    pub arbiter: Option<ArbiterTrace>,
    /// Per-bound-slot outcomes, when this row finalized.
    pub results: Vec<SlotResult>,
}

/// Evaluates one column of banks for one lookup.
pub(crate) fn evaluate_column(
    col: usize,
    banks: &[Option<TcamBank>],
    caps: &ChipCapabilities,
    key: u64,
    gress: Gress,
    shift: u32,
) -> Vec<BankTrace> {
    let rows = caps.rows;
    let mid = caps.midpoint();
    debug_assert_eq!(banks.len(), rows);

    let chain_out: Vec<bool> = banks
        .iter()
        .map(|b| b.as_ref().map_or(false, |b| b.config().chain_out))
        .collect();
    let wide: Vec<bool> = banks
        .iter()
        .map(|b| b.as_ref().map_or(false, |b| b.config().wide))
        .collect();

    // Local (spread) vectors of participating banks.
    let mut raw: Vec<Option<HitVector>> = vec![None; rows];
    let mut local: Vec<Option<HitVector>> = vec![None; rows];
    for (r, bank) in banks.iter().enumerate() {
        if let Some(bank) = bank {
            if bank.config().gress.covers(gress) {
                let hits = bank.search(key);
                local[r] = Some(bank.spread(&hits));
                raw[r] = Some(hits);
            }
        }
    }

    let mut hits_in: Vec<HitVector> = vec![HitVector::ones(); rows];
    let mut out: Vec<Option<HitVector>> = vec![None; rows];

    // Lower half, ascending.
    for r in 0..mid {
        let Some(vec) = local[r] else { continue };
        if r > 0 && chain_out[r - 1] {
            if let Some(prev) = out[r - 1] {
                hits_in[r] = prev;
            }
        }
        out[r] = Some(vec & hits_in[r]);
    }

    // Upper half, descending.
    for r in (mid..rows).rev() {
        let Some(vec) = local[r] else { continue };
        if r + 1 < rows && chain_out[r + 1] {
            if let Some(next) = out[r + 1] {
                hits_in[r] = next;
            }
        }
        out[r] = Some(vec & hits_in[r]);
    }

    // Midpoint merge for wide pairs.
    if caps.midpoint_merge && mid > 0 {
        let (lower, upper) = (mid - 1, mid);
        if let (Some(a), Some(b)) = (out[lower], out[upper]) {
            let merged = a & b;
            if chain_out[lower] && wide[lower] && wide[upper] {
                out[upper] = Some(merged);
            }
            if chain_out[upper] && wide[upper] && wide[lower] {
                out[lower] = Some(merged);
            }
        }
    }

    // Terminal rows finalize through the arbiter.
    let mut traces = Vec::new();
    for (r, bank) in banks.iter().enumerate() {
        let Some(bank) = bank else { continue };
        let participated = local[r].is_some();
        let out_vec = out[r].unwrap_or_else(HitVector::zero);

        let mut arbiter_trace = None;
        let mut results = Vec::new();
        if participated && bank.config().match_out && !bank.bindings().is_empty() {
            let final_vec = out_vec & *bank.hits_mask();
            let tree = arbiter::combine(&final_vec);
            results = bank
                .bindings()
                .iter()
                .map(|binding| {
                    arbiter::finalize(binding, &tree, bank.config().vpn, shift, |i| {
                        bank.action_of(i)
                    })
                })
                .collect();
            arbiter_trace = Some(tree);
        }

        traces.push(BankTrace {
            col,
            row: r,
            participated,
            raw: raw[r].unwrap_or_else(HitVector::zero),
            local: local[r].unwrap_or_else(HitVector::zero),
            hits_in: hits_in[r],
            out: out_vec,
            arbiter: arbiter_trace,
            results,
        });
    }
    traces
}

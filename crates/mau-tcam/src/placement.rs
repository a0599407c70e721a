//! Logical-table placement onto physical result slots.
//!
//! Up to eight logical tables share one physical bank; each needs its own
//! result slot assignment honoring the generation's per-slot width tables.
//! Placement must be a pure function of the array seed and the enabled-ID
//! mask so that repeated verification runs (and every bank of a chain, which
//! shares both) reproduce identical bindings.

use crate::caps::{ChipCapabilities, ResultMode, SlotWidth, RESULT_SLOTS};
use crate::error::{ModelError, ModelResult};
use mau_types::LogicalTableId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Binding of one logical table to a physical result slot.
///
/// The binding occupies slices `[base_slot, base_slot + width)` of the
/// combination tree; `base_slot` is also the offset (in 64-entry units) of
/// the entries the result covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotBinding {
    pub id: LogicalTableId,
    pub base_slot: usize,
    pub width: SlotWidth,
    pub mode: ResultMode,
}

/// Caller overrides narrowing the placement choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementOverrides {
    /// Restrict every binding to width one.
    pub force_width_one: bool,
    /// Never produce bitmap-mode bindings.
    pub priority_only: bool,
    /// Pin the highest enabled ID to base slot 0.
    pub pin_slot0: bool,
}

/// Splitmix64 draw stream over (seed, enabled mask).
///
/// The algorithm is part of the model's external contract: bindings must
/// stay bit-identical across toolchains and releases because golden-model
/// diffs depend on them, so no library RNG with an unspecified algorithm is
/// used here.
#[derive(Debug, Clone)]
struct PlacementStream(u64);

const SPLITMIX_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

impl PlacementStream {
    fn new(seed: u64, enabled: u8) -> Self {
        PlacementStream(seed ^ SPLITMIX_GAMMA.wrapping_mul(enabled as u64 + 1))
    }

    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(SPLITMIX_GAMMA);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn pick(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

/// Assigns every enabled logical table a result slot.
///
/// IDs are placed from highest to lowest. Per ID the candidate
/// (base slot, width) pairs are enumerated width-ascending then
/// base-ascending, filtered by the generation table, slot occupancy, and a
/// fit constraint reserving one slice per still-unplaced ID; one candidate
/// and (where the generation allows) a result mode are then drawn from the
/// stream. The draw order is fixed: candidate first, then mode.
///
/// On single-table hardware only the highest enabled ID is honored, bound
/// to the full-width priority slot; extra enabled IDs are an error under
/// `strict`, otherwise they are dropped with a warning.
pub fn place_tables(
    caps: &ChipCapabilities,
    seed: u64,
    enabled: u8,
    overrides: PlacementOverrides,
    strict: bool,
) -> ModelResult<Vec<SlotBinding>> {
    if enabled == 0 {
        return Ok(Vec::new());
    }

    let ids: Vec<LogicalTableId> = LogicalTableId::all()
        .filter(|id| enabled & id.bit() != 0)
        .collect();

    if caps.single_table {
        return place_single(caps, &ids, enabled, overrides, strict);
    }

    let mut stream = PlacementStream::new(seed, enabled);
    let mut free = [true; RESULT_SLOTS];
    let mut free_count = RESULT_SLOTS;
    let mut bindings = Vec::with_capacity(ids.len());

    for (placed, id) in ids.iter().rev().enumerate() {
        let remaining = ids.len() - placed - 1;
        let pin = overrides.pin_slot0 && placed == 0;

        let mut candidates: Vec<(usize, SlotWidth)> = Vec::new();
        for width in SlotWidth::ALL {
            if overrides.force_width_one && width != SlotWidth::One {
                continue;
            }
            for base in 0..RESULT_SLOTS {
                if pin && base != 0 {
                    continue;
                }
                if !caps.width_legal_at(base, width) {
                    continue;
                }
                let span = base..base + width.slices();
                if !free[span.clone()].iter().all(|&f| f) {
                    continue;
                }
                if free_count - width.slices() < remaining {
                    continue;
                }
                candidates.push((base, width));
            }
        }

        if candidates.is_empty() {
            return Err(ModelError::NoSlotAvailable { mask: enabled });
        }

        let (base_slot, width) = candidates[stream.pick(candidates.len())];
        let mode = if overrides.priority_only || !caps.bitmap_mode {
            ResultMode::Priority
        } else if stream.next() & 1 == 0 {
            ResultMode::Priority
        } else {
            ResultMode::Bitmap
        };

        for slot in base_slot..base_slot + width.slices() {
            free[slot] = false;
        }
        free_count -= width.slices();

        debug!(
            "placed table {} at slot {} width {} mode {}",
            id, base_slot, width, mode
        );
        bindings.push(SlotBinding {
            id: *id,
            base_slot,
            width,
            mode,
        });
    }

    Ok(bindings)
}

fn place_single(
    caps: &ChipCapabilities,
    ids: &[LogicalTableId],
    enabled: u8,
    overrides: PlacementOverrides,
    strict: bool,
) -> ModelResult<Vec<SlotBinding>> {
    if overrides.force_width_one {
        return Err(ModelError::unsupported(
            "width-one placement on single-table hardware",
        ));
    }

    if ids.len() > 1 {
        if strict {
            return Err(ModelError::PlacementOverflow {
                enabled: ids.len(),
                supported: 1,
            });
        }
        warn!(
            "{} logical IDs enabled on single-table hardware (mask {:#04x}), honoring ID {} only",
            ids.len(),
            enabled,
            ids[ids.len() - 1]
        );
    }

    // highest enabled ID, full-width priority slot
    let id = ids[ids.len() - 1];
    debug_assert!(caps.width_legal_at(0, SlotWidth::Eight));
    Ok(vec![SlotBinding {
        id,
        base_slot: 0,
        width: SlotWidth::Eight,
        mode: ResultMode::Priority,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::ChipCapabilities;
    use mau_types::ChipGeneration;
    use pretty_assertions::assert_eq;

    fn redwood() -> &'static ChipCapabilities {
        ChipCapabilities::for_generation(ChipGeneration::Redwood)
    }

    fn cypress() -> &'static ChipCapabilities {
        ChipCapabilities::for_generation(ChipGeneration::Cypress)
    }

    fn occupied_slices(bindings: &[SlotBinding]) -> Vec<usize> {
        let mut slices: Vec<usize> = bindings
            .iter()
            .flat_map(|b| b.base_slot..b.base_slot + b.width.slices())
            .collect();
        slices.sort_unstable();
        slices
    }

    #[test]
    fn test_empty_mask_produces_no_bindings() {
        let bindings =
            place_tables(redwood(), 7, 0, PlacementOverrides::default(), false).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_same_seed_same_bindings() {
        for mask in [0x01u8, 0x05, 0x81, 0xff] {
            let a = place_tables(redwood(), 42, mask, PlacementOverrides::default(), false)
                .unwrap();
            let b = place_tables(redwood(), 42, mask, PlacementOverrides::default(), false)
                .unwrap();
            assert_eq!(a, b, "mask {:#04x}", mask);
        }
    }

    #[test]
    fn test_bindings_legal_and_disjoint_across_seeds() {
        for seed in 0..64u64 {
            for mask in [0x03u8, 0x15, 0x7f, 0xff] {
                let bindings =
                    place_tables(redwood(), seed, mask, PlacementOverrides::default(), false)
                        .unwrap();
                assert_eq!(bindings.len(), mask.count_ones() as usize);

                let slices = occupied_slices(&bindings);
                let mut dedup = slices.clone();
                dedup.dedup();
                assert_eq!(slices, dedup, "seed {} mask {:#04x} overlap", seed, mask);

                for b in &bindings {
                    assert!(
                        redwood().width_legal_at(b.base_slot, b.width),
                        "seed {} mask {:#04x}: width {} at slot {}",
                        seed,
                        mask,
                        b.width,
                        b.base_slot
                    );
                }
            }
        }
    }

    #[test]
    fn test_ids_placed_highest_first() {
        let bindings =
            place_tables(redwood(), 9, 0b1001_0010, PlacementOverrides::default(), false)
                .unwrap();
        let ids: Vec<u8> = bindings.iter().map(|b| b.id.as_u8()).collect();
        assert_eq!(ids, vec![7, 4, 1]);
    }

    #[test]
    fn test_full_mask_packs_width_one() {
        // Eight IDs need eight slices, so every binding is width one.
        let bindings =
            place_tables(redwood(), 123, 0xff, PlacementOverrides::default(), false).unwrap();
        assert_eq!(bindings.len(), 8);
        assert!(bindings.iter().all(|b| b.width == SlotWidth::One));
        assert_eq!(occupied_slices(&bindings), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_force_width_one_override() {
        let overrides = PlacementOverrides {
            force_width_one: true,
            ..Default::default()
        };
        for seed in 0..16u64 {
            let bindings = place_tables(redwood(), seed, 0x21, overrides, false).unwrap();
            assert!(bindings.iter().all(|b| b.width == SlotWidth::One));
        }
    }

    #[test]
    fn test_priority_only_override() {
        let overrides = PlacementOverrides {
            priority_only: true,
            ..Default::default()
        };
        for seed in 0..16u64 {
            let bindings = place_tables(redwood(), seed, 0x41, overrides, false).unwrap();
            assert!(bindings.iter().all(|b| b.mode == ResultMode::Priority));
        }
    }

    #[test]
    fn test_pin_slot0_override() {
        let overrides = PlacementOverrides {
            pin_slot0: true,
            ..Default::default()
        };
        for seed in 0..16u64 {
            let bindings = place_tables(redwood(), seed, 0x90, overrides, false).unwrap();
            assert_eq!(bindings[0].id.as_u8(), 7);
            assert_eq!(bindings[0].base_slot, 0);
        }
    }

    #[test]
    fn test_single_table_honors_highest_id() {
        let bindings =
            place_tables(cypress(), 5, 0b0100_0100, PlacementOverrides::default(), false)
                .unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].id.as_u8(), 6);
        assert_eq!(bindings[0].base_slot, 0);
        assert_eq!(bindings[0].width, SlotWidth::Eight);
        assert_eq!(bindings[0].mode, ResultMode::Priority);
    }

    #[test]
    fn test_single_table_strict_overflow() {
        let err = place_tables(cypress(), 5, 0b0100_0100, PlacementOverrides::default(), true)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::PlacementOverflow {
                enabled: 2,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_single_table_single_id_ok_in_strict() {
        let bindings =
            place_tables(cypress(), 5, 0b0000_1000, PlacementOverrides::default(), true)
                .unwrap();
        assert_eq!(bindings[0].id.as_u8(), 3);
    }

    #[test]
    fn test_cypress_never_bitmap() {
        for seed in 0..32u64 {
            let bindings =
                place_tables(cypress(), seed, 0x80, PlacementOverrides::default(), false)
                    .unwrap();
            assert_eq!(bindings[0].mode, ResultMode::Priority);
        }
    }

    #[test]
    fn test_seeds_can_differ() {
        // Not a hard guarantee for any fixed pair, but across a spread of
        // seeds the draws must not collapse to one assignment.
        let all_same = (0..32u64)
            .map(|seed| {
                place_tables(redwood(), seed, 0x11, PlacementOverrides::default(), false)
                    .unwrap()
            })
            .all(|b| {
                b == place_tables(redwood(), 0, 0x11, PlacementOverrides::default(), false)
                    .unwrap()
            });
        assert!(!all_same);
    }
}

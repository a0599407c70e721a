//! Cycle-level functional model of the match-stage TCAM array.
//!
//! This crate models the ternary match path of one MAU stage the way the
//! silicon evaluates it: per-bank ternary search, multi-row duplication
//! spreading, row chaining with the midpoint merge, the per-bank priority
//! arbiter tree, and the final per-logical-table reduction. It exists to
//! produce bit-exact expected results for driver and RTL verification, so
//! every output (addresses, bitmaps, bindings) is deterministic.
//!
//! # Architecture
//!
//! ```text
//! key ──> [TcamBank search] ──> [MRD spread] ──> [row chain / midpoint]
//!                                                        │
//!              [TableResult per ID] <── [reduction] <── [arbiter + finalize]
//! ```
//!
//! # Key Components
//!
//! - [`TcamArray`]: lifecycle owner; configure, install, lookup
//! - [`TcamBank`]: one physical bank of ternary entries
//! - [`ChipCapabilities`]: per-generation geometry and feature set
//! - [`SlotBinding`]: deterministic logical-table placement result
//! - [`LookupTrace`]: per-lookup diagnostic snapshot
//!
//! The `tcam-sweep` binary replays JSON vector files through the model and
//! reports per-key, per-table outcomes.

pub mod arbiter;
pub mod array;
pub mod bank;
pub mod caps;
pub mod chain;
pub mod entry;
pub mod error;
pub mod hitvec;
pub mod placement;
pub mod sweep;

pub use arbiter::{decode_match_addr, ArbiterTrace, SlotResult};
pub use array::{
    ArrayConfig, LifecycleState, LookupOutcome, LookupTrace, TableResult, TcamArray,
};
pub use bank::{BankConfig, TcamBank};
pub use caps::{ChipCapabilities, ResultMode, SlotWidth, ENTRIES_PER_BANK, RESULT_SLOTS};
pub use chain::BankTrace;
pub use entry::TcamEntry;
pub use error::{ModelError, ModelResult};
pub use hitvec::HitVector;
pub use placement::{place_tables, PlacementOverrides, SlotBinding};

//! Seeded fixture generation for TCAM model verification tests.
//!
//! Provides:
//! - Ternary (value, mask) word generation with controlled don't-care density
//! - Search keys guaranteed to match (or miss) a generated word
//! - Enable-mask and entry-index corpora for placement and sweep tests
//!
//! Everything is driven by an explicit seed so a failing test names the
//! exact fixture that broke it. The model crates never depend on this one;
//! it is test support only.

pub mod corpus;
pub mod ternary;

pub use corpus::{enable_masks, entry_indexes};
pub use ternary::TernaryGen;

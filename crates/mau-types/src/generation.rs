//! Modeled hardware generations.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hardware generation of the modeled switch ASIC.
///
/// Behavioral differences between generations (bank geometry, match-word
/// width, placement tables, result modes) are resolved once into a
/// capability table when an array is constructed; nothing else in the model
/// branches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipGeneration {
    /// First generation: one logical table per bank, full-width priority
    /// results only, single column.
    Cypress,
    /// Current generation: shared banks, per-slot width placement, bitmap
    /// results, cross-midpoint wide merge.
    Redwood,
}

impl fmt::Display for ChipGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChipGeneration::Cypress => "cypress",
            ChipGeneration::Redwood => "redwood",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ChipGeneration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cypress" => Ok(ChipGeneration::Cypress),
            "redwood" => Ok(ChipGeneration::Redwood),
            _ => Err(ParseError::InvalidGeneration(s.to_string())),
        }
    }
}

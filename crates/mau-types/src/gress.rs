//! Ingress/egress thread tags.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline thread tag carried by lookups and physical TCAM banks.
///
/// A bank participates in a lookup only when its tag covers the lookup's
/// tag; `Both` on either side disables the gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gress {
    /// Ingress pipeline thread.
    Ingress,
    /// Egress pipeline thread.
    Egress,
    /// Both threads (no gating).
    #[default]
    Both,
}

impl Gress {
    /// Returns true if a bank tagged `self` participates in a lookup
    /// tagged `lookup`.
    pub const fn covers(self, lookup: Gress) -> bool {
        matches!(self, Gress::Both)
            || matches!(lookup, Gress::Both)
            || (self as u8) == (lookup as u8)
    }
}

impl fmt::Display for Gress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gress::Ingress => "ingress",
            Gress::Egress => "egress",
            Gress::Both => "both",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Gress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingress" => Ok(Gress::Ingress),
            "egress" => Ok(Gress::Egress),
            "both" => Ok(Gress::Both),
            _ => Err(ParseError::InvalidGress(s.to_string())),
        }
    }
}

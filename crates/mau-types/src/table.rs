//! Logical table ID type with validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Software-visible match-table identifier (0-7).
///
/// Up to eight logical tables can time-share one physical TCAM bank. The ID
/// doubles as the bit position in enable masks and as the tie-break rank on
/// restricted hardware (higher IDs win).
///
/// # Examples
///
/// ```
/// use mau_types::LogicalTableId;
///
/// let id = LogicalTableId::new(5).unwrap();
/// assert_eq!(id.as_u8(), 5);
/// assert_eq!(id.bit(), 0b0010_0000);
///
/// assert!(LogicalTableId::new(8).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LogicalTableId(u8);

impl LogicalTableId {
    /// Maximum valid ID.
    pub const MAX: u8 = 7;

    /// Number of logical table IDs per physical bank.
    pub const COUNT: usize = 8;

    /// Creates a new logical table ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is not in the valid range (0-7).
    pub const fn new(id: u8) -> Result<Self, ParseError> {
        if id <= Self::MAX {
            Ok(LogicalTableId(id))
        } else {
            Err(ParseError::InvalidTableId(id))
        }
    }

    /// Returns the ID as a u8.
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns the ID as a usize, for indexing per-table result arrays.
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Returns the ID's bit position in an 8-bit enable mask.
    pub const fn bit(&self) -> u8 {
        1 << self.0
    }

    /// Iterates all eight IDs in ascending order.
    pub fn all() -> impl Iterator<Item = LogicalTableId> {
        (0..=Self::MAX).map(LogicalTableId)
    }
}

impl fmt::Display for LogicalTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LogicalTableId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u8 = s.parse().map_err(|_| ParseError::InvalidTableId(u8::MAX))?;
        LogicalTableId::new(id)
    }
}

impl TryFrom<u8> for LogicalTableId {
    type Error = ParseError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        LogicalTableId::new(id)
    }
}

impl From<LogicalTableId> for u8 {
    fn from(id: LogicalTableId) -> u8 {
        id.0
    }
}

//! Virtual page number type with validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Virtual page number (0-511).
///
/// A 9-bit index-space identifier assigned per physical TCAM bank and folded
/// into every priority-mode match address the bank produces, above the
/// encoded-priority field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Vpn(u16);

impl Vpn {
    /// Maximum valid VPN (9-bit field).
    pub const MAX: u16 = 511;

    /// Creates a new VPN.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not fit the 9-bit field.
    pub const fn new(vpn: u16) -> Result<Self, ParseError> {
        if vpn <= Self::MAX {
            Ok(Vpn(vpn))
        } else {
            Err(ParseError::InvalidVpn(vpn))
        }
    }

    /// Returns the VPN as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the VPN as a u32, for address composition.
    pub const fn as_u32(&self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for Vpn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Vpn {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vpn: u16 = s.parse().map_err(|_| ParseError::InvalidVpn(u16::MAX))?;
        Vpn::new(vpn)
    }
}

impl TryFrom<u16> for Vpn {
    type Error = ParseError;

    fn try_from(vpn: u16) -> Result<Self, Self::Error> {
        Vpn::new(vpn)
    }
}

impl From<Vpn> for u16 {
    fn from(vpn: Vpn) -> u16 {
        vpn.0
    }
}

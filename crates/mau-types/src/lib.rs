//! Common types for the MAU pipeline functional model.
//!
//! This crate provides type-safe representations of the vocabulary shared
//! between the TCAM engine, the configuration surface, and the sweep harness:
//!
//! - [`Gress`]: ingress/egress thread tags gating lookups
//! - [`LogicalTableId`]: software-visible match-table identifiers (0-7)
//! - [`Vpn`]: virtual page numbers folded into match addresses
//! - [`ChipGeneration`]: the modeled hardware generations

mod generation;
mod gress;
mod table;
mod vpn;

pub use generation::ChipGeneration;
pub use gress::Gress;
pub use table::LogicalTableId;
pub use vpn::Vpn;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid gress tag: {0}")]
    InvalidGress(String),

    #[error("invalid chip generation: {0}")]
    InvalidGeneration(String),

    #[error("invalid logical table ID: {0} (must be 0-7)")]
    InvalidTableId(u8),

    #[error("invalid VPN: {0} (must be 0-511)")]
    InvalidVpn(u16),
}

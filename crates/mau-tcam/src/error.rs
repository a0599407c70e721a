//! Model error types.
//!
//! Configuration and placement failures abort the configure/install pass;
//! an unsatisfiable configuration must never silently diverge from silicon.
//! Lookup-time conditions (unbound bank, empty chain) are not errors at
//! all; they degrade to "no hit" so exhaustive sweeps always complete.

use thiserror::Error;

/// Error type for TCAM model operations.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// A coordinate or entry index is outside the array geometry.
    #[error("Geometry violation: {message}")]
    Geometry { message: String },

    /// A configured field value does not fit its hardware field width.
    #[error("Field out of range: {field} = {value:#x} exceeds {limit:#x}")]
    FieldRange {
        field: &'static str,
        value: u64,
        limit: u64,
    },

    /// A chain-out flag feeds a row that cannot consume it.
    #[error("Broken chain at column {col} row {row}: {reason}")]
    BrokenChain {
        col: usize,
        row: usize,
        reason: String,
    },

    /// Banks of one chain disagree on shared configuration.
    #[error("Chain mismatch in column {col}: {reason}")]
    ChainMismatch { col: usize, reason: String },

    /// The placement tables admit no slot assignment for an enabled ID.
    #[error("No result slot available for ID mask {mask:#04x}")]
    NoSlotAvailable { mask: u8 },

    /// More logical IDs enabled than the hardware generation supports.
    #[error("Placement overflow: {enabled} logical IDs enabled, hardware supports {supported}")]
    PlacementOverflow { enabled: usize, supported: usize },

    /// An operation was invoked in the wrong lifecycle state.
    #[error("Operation {operation} invalid in state {state}")]
    Lifecycle { operation: &'static str, state: String },

    /// The hardware generation does not implement the requested feature.
    #[error("Feature not supported on this generation: {feature}")]
    Unsupported { feature: String },
}

impl ModelError {
    /// Creates a geometry violation error.
    pub fn geometry(message: impl Into<String>) -> Self {
        ModelError::Geometry {
            message: message.into(),
        }
    }

    /// Creates a field range error.
    pub fn field_range(field: &'static str, value: u64, limit: u64) -> Self {
        ModelError::FieldRange {
            field,
            value,
            limit,
        }
    }

    /// Creates a broken chain error.
    pub fn broken_chain(col: usize, row: usize, reason: impl Into<String>) -> Self {
        ModelError::BrokenChain {
            col,
            row,
            reason: reason.into(),
        }
    }

    /// Creates a chain mismatch error.
    pub fn chain_mismatch(col: usize, reason: impl Into<String>) -> Self {
        ModelError::ChainMismatch {
            col,
            reason: reason.into(),
        }
    }

    /// Creates a lifecycle misuse error.
    pub fn lifecycle(operation: &'static str, state: impl Into<String>) -> Self {
        ModelError::Lifecycle {
            operation,
            state: state.into(),
        }
    }

    /// Creates an unsupported-feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        ModelError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Returns true if this error came from logical-table placement.
    pub fn is_placement(&self) -> bool {
        matches!(
            self,
            ModelError::NoSlotAvailable { .. } | ModelError::PlacementOverflow { .. }
        )
    }
}

/// Result type for TCAM model operations.
pub type ModelResult<T> = Result<T, ModelError>;

//! Error types for the Penning compiler
//!
//! Gantree: L0_Foundation → Errors
//!
//! Every crate of the workspace reports through `PenningError`.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use crate::program::CompiledProgram;
use crate::types::{IonId, NodeId, Step};
use thiserror::Error;

/// Main error type for the compiler
/// Gantree: PenningError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PenningError {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Logical input is not the expected QFT operation sequence
    /// Gantree: InvalidLogicalCircuit(String) // 입력 회로
    #[error("Invalid logical circuit: {0}")]
    InvalidLogicalCircuit(String),

    #[error("Qubit {qubit} out of range: circuit has {num_qubits} qubits")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    #[error("Invalid trap topology: {0}")]
    InvalidTopology(String),

    #[error("Node {node} out of range: trap has {num_nodes} nodes")]
    NodeOutOfRange { node: NodeId, num_nodes: usize },

    #[error("Invalid initial layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Planning Errors
    // ========================================================================
    /// No legal movement plan exists for a required co-location
    /// Gantree: TopologyInfeasible{{constraint,partial}} // 경로 불가
    #[error("Topology infeasible: {constraint}")]
    TopologyInfeasible {
        constraint: String,
        partial: Option<Box<CompiledProgram>>,
    },

    /// Two gates claim the same ion in the same step
    /// Gantree: SchedulingConflict{{step,ion}} // 충돌
    #[error("Scheduling conflict at step {step} on ion {ion}: {detail}")]
    SchedulingConflict {
        step: Step,
        ion: IonId,
        detail: String,
    },

    /// A produced candidate broke a physical invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("File error: {0}")]
    FileError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for compiler operations
pub type PenningResult<T> = Result<T, PenningError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for PenningError {
    fn from(err: serde_json::Error) -> Self {
        PenningError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for PenningError {
    fn from(err: std::io::Error) -> Self {
        PenningError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl PenningError {
    /// Build a `TopologyInfeasible` error without a partial plan
    pub fn infeasible(constraint: impl Into<String>) -> Self {
        PenningError::TopologyInfeasible {
            constraint: constraint.into(),
            partial: None,
        }
    }

    /// Attach a partial plan to a `TopologyInfeasible` error.
    /// Other variants are returned unchanged.
    pub fn with_partial(self, program: CompiledProgram) -> Self {
        match self {
            PenningError::TopologyInfeasible { constraint, .. } => {
                PenningError::TopologyInfeasible {
                    constraint,
                    partial: Some(Box::new(program)),
                }
            }
            other => other,
        }
    }

    /// Partial plan carried by a `TopologyInfeasible` error
    pub fn partial_plan(&self) -> Option<&CompiledProgram> {
        match self {
            PenningError::TopologyInfeasible { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    /// Check if a search candidate failing with this error may simply be
    /// discarded in favour of another candidate
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PenningError::TopologyInfeasible { .. }
                | PenningError::SchedulingConflict { .. }
                | PenningError::InvariantViolation(_)
        )
    }

    /// Check if error stems from the trap graph or ion placement
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            PenningError::TopologyInfeasible { .. }
                | PenningError::InvalidTopology(_)
                | PenningError::NodeOutOfRange { .. }
                | PenningError::InvalidLayout(_)
        )
    }

    /// Check if error is caused by the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PenningError::InvalidLogicalCircuit(_)
                | PenningError::QubitOutOfRange { .. }
                | PenningError::InvalidTopology(_)
                | PenningError::InvalidLayout(_)
                | PenningError::InvalidConfig(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PenningError::infeasible("no interaction node reachable for ions 1 and 0");
        assert!(err.to_string().contains("ions 1 and 0"));

        let err = PenningError::SchedulingConflict {
            step: 12,
            ion: 3,
            detail: "MS already running".into(),
        };
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains("ion 3"));
    }

    #[test]
    fn test_with_partial() {
        let program = CompiledProgram::empty(2, 2);
        let err = PenningError::infeasible("blocked").with_partial(program.clone());
        assert_eq!(err.partial_plan(), Some(&program));

        let other = PenningError::InternalError("x".into()).with_partial(program);
        assert!(other.partial_plan().is_none());
    }

    #[test]
    fn test_classification() {
        assert!(PenningError::infeasible("x").is_recoverable());
        assert!(PenningError::infeasible("x").is_topology_error());
        assert!(!PenningError::InvalidLogicalCircuit("x".into()).is_recoverable());
        assert!(PenningError::InvalidLogicalCircuit("x".into()).is_input_error());
    }
}

//! Circuit builder for logical circuits
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent construction of logical QFT-style circuits.

use crate::circuit::LogicalCircuit;
use crate::gate::LogicalGate;
use crate::types::QubitId;

/// Fluent logical circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // 빌더 패턴
pub struct CircuitBuilder {
    circuit: LogicalCircuit,
}

impl CircuitBuilder {
    /// Create a new circuit builder
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: LogicalCircuit::new(num_qubits),
        }
    }

    /// Add Hadamard gate
    pub fn h(mut self, qubit: QubitId) -> Self {
        let _ = self.circuit.add_gate(LogicalGate::Hadamard(qubit));
        self
    }

    /// Add controlled phase 2π/2^k
    pub fn cp(mut self, control: QubitId, target: QubitId, k: u32) -> Self {
        let _ = self
            .circuit
            .add_gate(LogicalGate::ControlledPhase { control, target, k });
        self
    }

    /// Add the terminal qubit reversal
    pub fn reverse_qubits(mut self) -> Self {
        let _ = self.circuit.add_gate(LogicalGate::ReverseQubits);
        self
    }

    /// Add the rotation block of one target qubit: H, then its
    /// controlled phases from the higher qubits
    pub fn qft_block(mut self, target: QubitId) -> Self {
        let n = self.circuit.num_qubits();
        self = self.h(target);
        for k in 2..=n.saturating_sub(target) {
            self = self.cp(target + k - 1, target, k as u32);
        }
        self
    }

    /// Add every QFT block and the reversal
    pub fn qft(mut self) -> Self {
        for target in 0..self.circuit.num_qubits() {
            self = self.qft_block(target);
        }
        self.reverse_qubits()
    }

    /// Build the circuit
    pub fn build(self) -> LogicalCircuit {
        self.circuit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_matches_canonical_qft() {
        let built = CircuitBuilder::new(8).qft().build();
        assert_eq!(built.gates(), LogicalCircuit::qft(8).gates());
        assert!(built.check_qft().is_ok());
    }

    #[test]
    fn test_builder_skips_invalid_gate() {
        let built = CircuitBuilder::new(2).h(0).h(5).cp(1, 0, 2).build();
        assert_eq!(built.gate_count(), 2);
    }

    #[test]
    fn test_partial_qft_is_rejected() {
        let partial = CircuitBuilder::new(3).qft_block(0).reverse_qubits().build();
        assert!(partial.check_qft().is_err());
    }
}

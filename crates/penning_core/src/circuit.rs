//! Circuit structures for the Penning compiler
//!
//! Gantree: L1_Circuit → Circuit
//!
//! `LogicalCircuit` holds the QFT operation sequence handed to the compiler;
//! `NativeCircuit` holds the ordered native gate stream produced from it.

use crate::constants::compiler::ANGLE_EPSILON;
use crate::error::{PenningError, PenningResult};
use crate::gate::{LogicalGate, NativeGate};
use crate::types::{IonId, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// LogicalCircuit
// ============================================================================

/// Logical circuit
/// Gantree: LogicalCircuit // 논리 회로
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalCircuit {
    num_qubits: usize,
    gates: Vec<LogicalGate>,
    name: Option<String>,
}

impl LogicalCircuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create from a vector of gates
    pub fn from_gates(num_qubits: usize, gates: Vec<LogicalGate>) -> PenningResult<Self> {
        let mut circuit = Self::new(num_qubits);
        circuit.add_gates(gates)?;
        Ok(circuit)
    }

    /// Canonical QFT over `n` qubits with terminal reversal
    /// Gantree: qft(n) -> Self // 표준 QFT
    ///
    /// Qubit `i` receives `H`, then `CP(2π/2^k)` controlled by qubit
    /// `i + k - 1` for `k = 2..=n-i`.
    pub fn qft(n: usize) -> Self {
        let mut gates = Vec::with_capacity(n * (n + 1) / 2 + 1);
        for target in 0..n {
            gates.push(LogicalGate::Hadamard(target));
            for k in 2..=(n - target) {
                gates.push(LogicalGate::ControlledPhase {
                    control: target + k - 1,
                    target,
                    k: k as u32,
                });
            }
        }
        gates.push(LogicalGate::ReverseQubits);

        Self {
            num_qubits: n,
            gates,
            name: Some(format!("qft_{}", n)),
        }
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Add a gate to the circuit
    pub fn add_gate(&mut self, gate: LogicalGate) -> PenningResult<()> {
        for qubit in gate.qubits() {
            if qubit >= self.num_qubits {
                return Err(PenningError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
        }
        if let LogicalGate::ControlledPhase { control, target, k } = gate {
            if control == target {
                return Err(PenningError::InvalidLogicalCircuit(format!(
                    "controlled phase on a single qubit {}",
                    control
                )));
            }
            if k == 0 || k > 52 {
                return Err(PenningError::InvalidLogicalCircuit(format!(
                    "controlled phase order {} out of range",
                    k
                )));
            }
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Add multiple gates
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = LogicalGate>) -> PenningResult<()> {
        for gate in gates {
            self.add_gate(gate)?;
        }
        Ok(())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get gates
    pub fn gates(&self) -> &[LogicalGate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of gates
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of controlled-phase gates
    pub fn count_controlled_phase(&self) -> usize {
        self.gates
            .iter()
            .filter(|g| matches!(g, LogicalGate::ControlledPhase { .. }))
            .count()
    }

    /// Whether the circuit ends with the qubit reversal
    pub fn reverses_output(&self) -> bool {
        self.gates
            .iter()
            .any(|g| matches!(g, LogicalGate::ReverseQubits))
    }

    // ========================================================================
    // QFT Validation
    // ========================================================================

    /// Check that this is the canonical QFT of its width.
    /// Returns the first offending gate index on mismatch.
    pub fn check_qft(&self) -> PenningResult<()> {
        if self.gates.is_empty() {
            return Err(PenningError::InvalidLogicalCircuit("circuit is empty".into()));
        }

        let reference = Self::qft(self.num_qubits);
        if self.gates.len() != reference.gates.len() {
            return Err(PenningError::InvalidLogicalCircuit(format!(
                "expected {} operations for a {}-qubit QFT, got {}",
                reference.gates.len(),
                self.num_qubits,
                self.gates.len()
            )));
        }

        for (idx, (got, want)) in self.gates.iter().zip(reference.gates.iter()).enumerate() {
            let same = match (got, want) {
                (LogicalGate::ControlledPhase { .. }, LogicalGate::ControlledPhase { .. }) => {
                    got.qubits() == want.qubits()
                        && (got.phase().unwrap_or(f64::NAN) - want.phase().unwrap_or(f64::NAN))
                            .abs()
                            < ANGLE_EPSILON
                }
                _ => got == want,
            };
            if !same {
                return Err(PenningError::InvalidLogicalCircuit(format!(
                    "operation {} is {} but the QFT requires {}",
                    idx, got, want
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for LogicalCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "LogicalCircuit({} qubits, {} gates{})",
            self.num_qubits,
            self.gates.len(),
            self.name
                .as_ref()
                .map(|n| format!(", {}", n))
                .unwrap_or_default()
        )?;
        for (i, gate) in self.gates.iter().enumerate() {
            writeln!(f, "  {:3}: {}", i, gate)?;
        }
        Ok(())
    }
}

// ============================================================================
// NativeCircuit
// ============================================================================

/// Ordered native gate stream
/// Gantree: NativeCircuit // 네이티브 스트림
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeCircuit {
    num_ions: usize,
    gates: Vec<NativeGate>,
    /// Output qubit `j` is read from ion `output_order[j]`
    output_order: Vec<IonId>,
}

impl NativeCircuit {
    /// Create a native circuit with identity output order
    pub fn new(num_ions: usize, gates: Vec<NativeGate>) -> Self {
        Self {
            num_ions,
            gates,
            output_order: (0..num_ions).collect(),
        }
    }

    /// Set the output order
    pub fn with_output_order(mut self, order: Vec<IonId>) -> Self {
        self.output_order = order;
        self
    }

    /// Number of ions
    pub fn num_ions(&self) -> usize {
        self.num_ions
    }

    /// Gate stream
    pub fn gates(&self) -> &[NativeGate] {
        &self.gates
    }

    /// Output order
    pub fn output_order(&self) -> &[IonId] {
        &self.output_order
    }

    /// Total gates
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// MS gate count
    pub fn count_ms(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Single-ion gate count
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Indices of MS gates in stream order
    pub fn ms_indices(&self) -> Vec<usize> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| g.is_two_qubit())
            .map(|(i, _)| i)
            .collect()
    }

    /// Gates acting on one ion, in order
    pub fn gates_on(&self, ion: QubitId) -> Vec<&NativeGate> {
        self.gates.iter().filter(|g| g.involves(ion)).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Provenance;

    #[test]
    fn test_qft_structure() {
        let qft = LogicalCircuit::qft(8);
        assert_eq!(qft.count_controlled_phase(), 28);
        assert_eq!(qft.gate_count(), 8 + 28 + 1);
        assert!(qft.reverses_output());
        assert!(qft.check_qft().is_ok());

        assert_eq!(qft.gates()[0], LogicalGate::Hadamard(0));
        assert_eq!(
            qft.gates()[1],
            LogicalGate::ControlledPhase {
                control: 1,
                target: 0,
                k: 2
            }
        );
        assert_eq!(
            qft.gates()[7],
            LogicalGate::ControlledPhase {
                control: 7,
                target: 0,
                k: 8
            }
        );
        assert_eq!(qft.gates()[8], LogicalGate::Hadamard(1));
    }

    #[test]
    fn test_add_gate_out_of_range() {
        let mut c = LogicalCircuit::new(2);
        let err = c.add_gate(LogicalGate::Hadamard(2)).unwrap_err();
        assert!(matches!(err, PenningError::QubitOutOfRange { qubit: 2, .. }));

        let err = c
            .add_gate(LogicalGate::ControlledPhase {
                control: 1,
                target: 1,
                k: 2,
            })
            .unwrap_err();
        assert!(matches!(err, PenningError::InvalidLogicalCircuit(_)));
    }

    #[test]
    fn test_check_qft_rejects() {
        assert!(LogicalCircuit::new(8).check_qft().is_err());

        let mut gates = LogicalCircuit::qft(3).gates().to_vec();
        gates.swap(1, 2);
        let shuffled = LogicalCircuit::from_gates(3, gates).unwrap();
        let err = shuffled.check_qft().unwrap_err();
        assert!(err.to_string().contains("operation 1"));

        let mut truncated = LogicalCircuit::qft(3).gates().to_vec();
        truncated.pop();
        let truncated = LogicalCircuit::from_gates(3, truncated).unwrap();
        assert!(truncated.check_qft().is_err());
    }

    #[test]
    fn test_native_circuit_counts() {
        let p = Provenance::new(0, LogicalGate::Hadamard(0));
        let circuit = NativeCircuit::new(
            2,
            vec![
                NativeGate::ry(0, 1.0, p),
                NativeGate::ms(0, 1, 0.5, p),
                NativeGate::rx(1, 1.0, p),
            ],
        )
        .with_output_order(vec![1, 0]);
        assert_eq!(circuit.count_ms(), 1);
        assert_eq!(circuit.count_1q(), 2);
        assert_eq!(circuit.ms_indices(), vec![1]);
        assert_eq!(circuit.gates_on(1).len(), 2);
        assert_eq!(circuit.output_order(), &[1, 0]);
    }
}

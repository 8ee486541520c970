//! Gate decomposer
//!
//! Gantree: L3_Decompose → Decomposer
//!
//! Lowers the logical QFT into the trap-native gate stream {RX, RY, MS}.
//! Z rotations are not native and are conjugated into X rotations.

use crate::fusion::fuse_rotations;
use log::debug;
use penning_core::compiler::{ANGLE_EPSILON, DEFAULT_NUM_IONS};
use penning_core::{
    Angle, LogicalCircuit, LogicalGate, NativeCircuit, NativeGate, PenningError, PenningResult,
    Provenance, QubitId,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Decomposer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecomposeOptions {
    /// Merge adjacent same-axis rotations per ion
    pub fuse_rotations: bool,
    /// Reject anything but the canonical QFT
    pub require_qft: bool,
    /// Required circuit width
    pub expected_qubits: Option<usize>,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            fuse_rotations: true,
            require_qft: true,
            expected_qubits: Some(DEFAULT_NUM_IONS),
        }
    }
}

impl DecomposeOptions {
    /// Set rotation fusion
    pub fn with_fusion(mut self, enabled: bool) -> Self {
        self.fuse_rotations = enabled;
        self
    }

    /// Set required width
    pub fn with_expected_qubits(mut self, n: Option<usize>) -> Self {
        self.expected_qubits = n;
        self
    }
}

/// Logical → native lowering
/// Gantree: Decomposer // 게이트 분해
#[derive(Debug, Clone, Default)]
pub struct Decomposer {
    options: DecomposeOptions,
}

impl Decomposer {
    /// Create a decomposer
    pub fn new(options: DecomposeOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &DecomposeOptions {
        &self.options
    }

    /// Validate the circuit and produce the native gate stream
    /// Gantree: decompose(LogicalCircuit) -> NativeCircuit // 분해
    pub fn decompose(&self, circuit: &LogicalCircuit) -> PenningResult<NativeCircuit> {
        self.validate(circuit)?;

        let n = circuit.num_qubits();
        let mut gates = Vec::new();
        for (index, &gate) in circuit.gates().iter().enumerate() {
            gates.extend(Self::lower(index, gate));
        }
        let lowered = gates.len();

        if self.options.fuse_rotations {
            gates = fuse_rotations(&gates, n, ANGLE_EPSILON);
        }
        debug!(
            "decomposed {} logical gates into {} native gates ({} before fusion)",
            circuit.gate_count(),
            gates.len(),
            lowered
        );

        let order = if circuit.reverses_output() {
            (0..n).rev().collect()
        } else {
            (0..n).collect()
        };
        Ok(NativeCircuit::new(n, gates).with_output_order(order))
    }

    fn validate(&self, circuit: &LogicalCircuit) -> PenningResult<()> {
        if let Some(expected) = self.options.expected_qubits {
            if circuit.num_qubits() != expected {
                return Err(PenningError::InvalidLogicalCircuit(format!(
                    "expected a {}-qubit circuit, got {} qubits",
                    expected,
                    circuit.num_qubits()
                )));
            }
        }
        if circuit.is_empty() {
            return Err(PenningError::InvalidLogicalCircuit("circuit is empty".into()));
        }
        if self.options.require_qft {
            circuit.check_qft()?;
        }
        Ok(())
    }

    /// Native gates for one logical gate
    pub fn lower(index: usize, gate: LogicalGate) -> Vec<NativeGate> {
        let tag = Provenance::new(index, gate);
        match gate {
            LogicalGate::Hadamard(q) => Self::hadamard(q, tag).to_vec(),
            LogicalGate::ControlledPhase { control, target, k } => {
                Self::controlled_phase(control, target, k, tag)
            }
            LogicalGate::ReverseQubits => Vec::new(),
        }
    }

    /// H ≅ RX(π)·RY(π/2)
    pub fn hadamard(q: QubitId, tag: Provenance) -> [NativeGate; 2] {
        [NativeGate::ry(q, FRAC_PI_2, tag), NativeGate::rx(q, PI, tag)]
    }

    /// Z(θ) ≅ RY(-π/2)·RX(θ)·RY(π/2)
    pub fn z_rotation(q: QubitId, theta: Angle, tag: Provenance) -> [NativeGate; 3] {
        [
            NativeGate::ry(q, FRAC_PI_2, tag),
            NativeGate::rx(q, theta, tag),
            NativeGate::ry(q, -FRAC_PI_2, tag),
        ]
    }

    /// CP(2π/2^k) as one MS gate between Y-basis changes, followed by a
    /// Z(π/2^k) on each qubit
    pub fn controlled_phase(
        control: QubitId,
        target: QubitId,
        k: u32,
        tag: Provenance,
    ) -> Vec<NativeGate> {
        let half = PI / 2f64.powi(k as i32);
        let mut gates = vec![
            NativeGate::ry(control, FRAC_PI_2, tag),
            NativeGate::ry(target, FRAC_PI_2, tag),
            NativeGate::ms(control, target, -half, tag),
            NativeGate::ry(control, -FRAC_PI_2, tag),
            NativeGate::ry(target, -FRAC_PI_2, tag),
        ];
        gates.extend(Self::z_rotation(control, half, tag));
        gates.extend(Self::z_rotation(target, half, tag));
        gates
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use penning_core::{CircuitBuilder, NativeKind};

    #[test]
    fn test_qft8_counts() {
        let d = Decomposer::default();
        let native = d.decompose(&LogicalCircuit::qft(8)).unwrap();
        assert_eq!(native.count_ms(), 28);
        assert_eq!(native.num_ions(), 8);
        assert_eq!(native.output_order(), &[7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_unfused_counts() {
        let d = Decomposer::new(DecomposeOptions::default().with_fusion(false));
        let native = d.decompose(&LogicalCircuit::qft(8)).unwrap();
        // 2 per H, 10 single-ion gates per CP
        assert_eq!(native.count_1q(), 8 * 2 + 28 * 10);
        assert_eq!(native.count_ms(), 28);
    }

    #[test]
    fn test_fusion_shrinks_stream() {
        let fused = Decomposer::default()
            .decompose(&LogicalCircuit::qft(8))
            .unwrap();
        let raw = Decomposer::new(DecomposeOptions::default().with_fusion(false))
            .decompose(&LogicalCircuit::qft(8))
            .unwrap();
        assert!(fused.count_1q() < raw.count_1q());
        assert_eq!(fused.count_ms(), raw.count_ms());
    }

    #[test]
    fn test_ms_phase_and_provenance() {
        let native = Decomposer::default()
            .decompose(&LogicalCircuit::qft(8))
            .unwrap();
        let first_ms = native
            .gates()
            .iter()
            .find(|g| g.kind() == NativeKind::Ms)
            .copied()
            .unwrap();
        assert_eq!(first_ms.ions(), vec![1, 0]);
        assert_relative_eq!(first_ms.angle(), -PI / 4.0, epsilon = 1e-15);
        assert_eq!(first_ms.provenance().index, 1);
    }

    #[test]
    fn test_rejects_wrong_width_and_shape() {
        let d = Decomposer::default();
        let err = d.decompose(&LogicalCircuit::qft(4)).unwrap_err();
        assert!(matches!(err, PenningError::InvalidLogicalCircuit(_)));

        let not_qft = CircuitBuilder::new(8).h(0).h(1).reverse_qubits().build();
        let err = d.decompose(&not_qft).unwrap_err();
        assert!(matches!(err, PenningError::InvalidLogicalCircuit(_)));

        let empty = LogicalCircuit::new(8);
        assert!(d.decompose(&empty).is_err());
    }

    #[test]
    fn test_relaxed_options_accept_other_widths() {
        let d = Decomposer::new(DecomposeOptions::default().with_expected_qubits(None));
        let native = d.decompose(&LogicalCircuit::qft(3)).unwrap();
        assert_eq!(native.count_ms(), 3);
    }
}

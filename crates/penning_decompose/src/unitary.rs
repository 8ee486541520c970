//! State-vector unitary composition
//!
//! Gantree: L3_Decompose → Unitary
//!
//! Dense simulation used to check that a native gate stream implements the
//! logical circuit. Qubit 0 is the most significant bit of a basis index.

use num_complex::Complex64;
use penning_core::{LogicalCircuit, LogicalGate, NativeGate};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Dense matrix stored as columns
pub type Columns = Vec<Vec<Complex64>>;

/// State vector over `n` qubits
/// Gantree: StateVector // 상태 벡터
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amps: Vec<Complex64>,
}

impl StateVector {
    /// Computational basis state |index⟩
    pub fn basis(num_qubits: usize, index: usize) -> Self {
        let mut amps = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amps[index] = Complex64::new(1.0, 0.0);
        Self { num_qubits, amps }
    }

    /// Amplitudes
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    /// Consume into amplitudes
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amps
    }

    fn mask(&self, q: usize) -> usize {
        1 << (self.num_qubits - 1 - q)
    }

    /// Apply a 2x2 matrix [[a, b], [c, d]] to qubit `q`
    fn apply_1q(&mut self, q: usize, m: [Complex64; 4]) {
        let mask = self.mask(q);
        for i0 in 0..self.amps.len() {
            if i0 & mask != 0 {
                continue;
            }
            let i1 = i0 | mask;
            let (a0, a1) = (self.amps[i0], self.amps[i1]);
            self.amps[i0] = m[0] * a0 + m[1] * a1;
            self.amps[i1] = m[2] * a0 + m[3] * a1;
        }
    }

    /// exp(-i θ/2 X)
    pub fn apply_rx(&mut self, q: usize, theta: f64) {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        self.apply_1q(q, [c, s, s, c]);
    }

    /// exp(-i θ/2 Y)
    pub fn apply_ry(&mut self, q: usize, theta: f64) {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new((theta / 2.0).sin(), 0.0);
        self.apply_1q(q, [c, -s, s, c]);
    }

    /// Hadamard
    pub fn apply_h(&mut self, q: usize) {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        self.apply_1q(q, [h, h, h, -h]);
    }

    /// exp(-i φ/2 X⊗X)
    pub fn apply_ms(&mut self, a: usize, b: usize, phi: f64) {
        let flip = self.mask(a) | self.mask(b);
        let c = Complex64::new((phi / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(phi / 2.0).sin());
        let old = self.amps.clone();
        for (i, amp) in self.amps.iter_mut().enumerate() {
            *amp = c * old[i] + s * old[i ^ flip];
        }
    }

    /// diag(1, 1, 1, e^{iλ}) on (control, target)
    pub fn apply_cp(&mut self, control: usize, target: usize, lambda: f64) {
        let both = self.mask(control) | self.mask(target);
        let phase = Complex64::from_polar(1.0, lambda);
        for (i, amp) in self.amps.iter_mut().enumerate() {
            if i & both == both {
                *amp *= phase;
            }
        }
    }

    /// Apply one native gate
    pub fn apply_native(&mut self, gate: &NativeGate) {
        match *gate {
            NativeGate::Rx { ion, angle, .. } => self.apply_rx(ion, angle),
            NativeGate::Ry { ion, angle, .. } => self.apply_ry(ion, angle),
            NativeGate::Ms { ions, phase, .. } => self.apply_ms(ions[0], ions[1], phase),
        }
    }

    /// Apply one logical gate. The reversal is skipped.
    pub fn apply_logical(&mut self, gate: &LogicalGate) {
        match *gate {
            LogicalGate::Hadamard(q) => self.apply_h(q),
            LogicalGate::ControlledPhase { control, target, .. } => {
                self.apply_cp(control, target, gate.phase().unwrap_or(0.0))
            }
            LogicalGate::ReverseQubits => {}
        }
    }
}

/// Unitary of a native gate sequence
pub fn native_unitary<'a>(
    num_qubits: usize,
    gates: impl IntoIterator<Item = &'a NativeGate> + Clone,
) -> Columns {
    (0..1usize << num_qubits)
        .map(|col| {
            let mut state = StateVector::basis(num_qubits, col);
            for gate in gates.clone() {
                state.apply_native(gate);
            }
            state.into_amplitudes()
        })
        .collect()
}

/// Unitary of a logical circuit, without its terminal reversal
pub fn logical_unitary(circuit: &LogicalCircuit) -> Columns {
    let n = circuit.num_qubits();
    (0..1usize << n)
        .map(|col| {
            let mut state = StateVector::basis(n, col);
            for gate in circuit.gates() {
                state.apply_logical(gate);
            }
            state.into_amplitudes()
        })
        .collect()
}

/// Reverse the low `n` bits of `index`
pub fn bit_reverse(index: usize, n: usize) -> usize {
    (0..n).fold(0, |acc, bit| (acc << 1) | ((index >> bit) & 1))
}

/// DFT matrix with its output bits reversed: the QFT before the final swaps
pub fn reversed_qft_matrix(n: usize) -> Columns {
    let dim = 1usize << n;
    let norm = 1.0 / (dim as f64).sqrt();
    (0..dim)
        .map(|j| {
            let mut col = vec![Complex64::new(0.0, 0.0); dim];
            for k in 0..dim {
                let angle = 2.0 * PI * ((j * k) % dim) as f64 / dim as f64;
                col[bit_reverse(k, n)] = Complex64::from_polar(norm, angle);
            }
            col
        })
        .collect()
}

/// Compare two matrices up to a global phase
pub fn equivalent_up_to_global_phase(a: &Columns, b: &Columns, eps: f64) -> bool {
    if a.len() != b.len() || a.iter().zip(b).any(|(x, y)| x.len() != y.len()) {
        return false;
    }

    // pivot on the largest entry of `a`
    let mut pivot = (0, 0);
    let mut best = 0.0;
    for (c, col) in a.iter().enumerate() {
        for (r, v) in col.iter().enumerate() {
            if v.norm() > best {
                best = v.norm();
                pivot = (c, r);
            }
        }
    }
    if best < eps {
        return b.iter().flatten().all(|v| v.norm() < eps);
    }

    let phase = b[pivot.0][pivot.1] / a[pivot.0][pivot.1];
    if (phase.norm() - 1.0).abs() > eps {
        return false;
    }
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .all(|(x, y)| (phase * x - y).norm() < eps)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposer::{DecomposeOptions, Decomposer};
    use penning_core::compiler::UNITARY_EPSILON;
    use penning_core::Provenance;

    #[test]
    fn test_bit_reverse() {
        assert_eq!(bit_reverse(0b001, 3), 0b100);
        assert_eq!(bit_reverse(0b110, 3), 0b011);
        assert_eq!(bit_reverse(5, 1), 1);
    }

    #[test]
    fn test_logical_qft_matches_dft() {
        for n in 1..=4 {
            let u = logical_unitary(&LogicalCircuit::qft(n));
            assert!(
                equivalent_up_to_global_phase(&u, &reversed_qft_matrix(n), UNITARY_EPSILON),
                "logical QFT({}) differs from DFT",
                n
            );
        }
    }

    #[test]
    fn test_hadamard_rule() {
        let tag = Provenance::new(0, LogicalGate::Hadamard(0));
        let gates = Decomposer::hadamard(0, tag);
        let native = native_unitary(1, gates.iter());
        let mut c = LogicalCircuit::new(1);
        c.add_gate(LogicalGate::Hadamard(0)).unwrap();
        assert!(equivalent_up_to_global_phase(
            &native,
            &logical_unitary(&c),
            UNITARY_EPSILON
        ));
    }

    #[test]
    fn test_controlled_phase_rule() {
        for k in 2..=5 {
            let gate = LogicalGate::ControlledPhase {
                control: 1,
                target: 0,
                k,
            };
            let native = Decomposer::lower(0, gate);
            let mut c = LogicalCircuit::new(2);
            c.add_gate(gate).unwrap();
            assert!(equivalent_up_to_global_phase(
                &native_unitary(2, native.iter()),
                &logical_unitary(&c),
                UNITARY_EPSILON
            ));
        }
    }

    #[test]
    fn test_global_phase_detection() {
        let a = vec![vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]];
        let b = vec![vec![Complex64::new(0.0, 1.0), Complex64::new(0.0, 0.0)]];
        let c = vec![vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]];
        assert!(equivalent_up_to_global_phase(&a, &b, 1e-12));
        assert!(!equivalent_up_to_global_phase(&a, &c, 1e-12));
    }

    #[test]
    fn test_qft8_native_stream_is_reversed_dft() {
        let expected = reversed_qft_matrix(8);
        for fuse in [true, false] {
            let native = Decomposer::new(DecomposeOptions::default().with_fusion(fuse))
                .decompose(&LogicalCircuit::qft(8))
                .unwrap();
            let u = native_unitary(8, native.gates().iter());
            assert!(
                equivalent_up_to_global_phase(&u, &expected, UNITARY_EPSILON),
                "fusion={} changed the unitary",
                fuse
            );
        }
    }
}

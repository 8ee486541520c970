//! # Penning Decompose
//!
//! Lowering of the logical QFT into the trap-native gate stream.
//!
//! ## Gantree Architecture
//!
//! ```text
//! penning_decompose // L3: Decompose
//!     Decomposer // H, CP → RX/RY/MS
//!         decompose() - 검증 + 분해 + 융합
//!     Fusion // 같은 축 회전 병합
//!     Unitary // 상태 벡터 검증
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use penning_core::LogicalCircuit;
//! use penning_decompose::Decomposer;
//!
//! let native = Decomposer::default()
//!     .decompose(&LogicalCircuit::qft(8))
//!     .unwrap();
//! assert_eq!(native.count_ms(), 28);
//! ```

#![warn(missing_docs)]

/// Decomposer (Gantree: L3_Decompose → Decomposer)
pub mod decomposer;

/// Rotation fusion (Gantree: L3_Decompose → Fusion)
pub mod fusion;

/// Unitary check (Gantree: L3_Decompose → Unitary)
pub mod unitary;

pub use decomposer::{DecomposeOptions, Decomposer};
pub use fusion::fuse_rotations;
pub use unitary::{
    equivalent_up_to_global_phase, logical_unitary, native_unitary, reversed_qft_matrix,
    StateVector,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::compiler::UNITARY_EPSILON;
    use penning_core::LogicalCircuit;

    #[test]
    fn test_native_matches_logical_small() {
        for n in 2..=5 {
            let circuit = LogicalCircuit::qft(n);
            let native = Decomposer::new(DecomposeOptions::default().with_expected_qubits(Some(n)))
                .decompose(&circuit)
                .unwrap();
            assert!(equivalent_up_to_global_phase(
                &native_unitary(n, native.gates().iter()),
                &logical_unitary(&circuit),
                UNITARY_EPSILON
            ));
        }
    }

    #[test]
    fn test_per_ion_order_keeps_ms_sequence() {
        let native = Decomposer::default()
            .decompose(&LogicalCircuit::qft(8))
            .unwrap();
        // ion 0 meets 1..7 in order, as the target of each controlled phase
        let partners: Vec<usize> = native
            .gates_on(0)
            .iter()
            .filter(|g| g.is_two_qubit())
            .map(|g| g.ions()[0])
            .collect();
        assert_eq!(partners, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}

//! Rotation fusion
//!
//! Gantree: L3_Decompose → Fusion
//!
//! Merges consecutive same-axis rotations on one ion and drops merged
//! rotations that reduce to a full turn. MS gates are never touched.

use penning_core::types::{is_full_turn, normalize_angle};
use penning_core::NativeGate;

/// Fuse adjacent same-axis rotations.
///
/// Two rotations are adjacent when no other gate on their ion lies between
/// them. A full-turn result is removed, which can expose the previous gate on
/// that ion to further merging.
pub fn fuse_rotations(gates: &[NativeGate], num_ions: usize, eps: f64) -> Vec<NativeGate> {
    let mut slots: Vec<Option<NativeGate>> = Vec::with_capacity(gates.len());
    // per-ion stack of live slot indices, latest on top
    let mut stacks: Vec<Vec<usize>> = vec![Vec::new(); num_ions];

    for gate in gates {
        let ions = gate.ions();
        if ions.iter().any(|&i| i >= num_ions) {
            slots.push(Some(*gate));
            continue;
        }

        if gate.is_single_qubit() {
            let ion = ions[0];
            let top = stacks[ion].last().copied();
            if let Some(top) = top {
                if let Some(prev) = slots[top] {
                    if prev.kind() == gate.kind() {
                        let merged = prev.angle() + gate.angle();
                        if is_full_turn(merged, eps) {
                            slots[top] = None;
                            stacks[ion].pop();
                        } else {
                            slots[top] = Some(prev.with_angle(normalize_angle(merged)));
                        }
                        continue;
                    }
                }
            }
            stacks[ion].push(slots.len());
            slots.push(Some(*gate));
        } else {
            let idx = slots.len();
            slots.push(Some(*gate));
            for ion in ions {
                stacks[ion].push(idx);
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use penning_core::{LogicalGate, NativeKind, Provenance};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn tag() -> Provenance {
        Provenance::new(0, LogicalGate::Hadamard(0))
    }

    #[test]
    fn test_cancel_pair() {
        let gates = vec![
            NativeGate::ry(0, -FRAC_PI_2, tag()),
            NativeGate::ry(0, FRAC_PI_2, tag()),
            NativeGate::rx(0, 0.3, tag()),
        ];
        let fused = fuse_rotations(&gates, 1, 1e-12);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].kind(), NativeKind::Rx);
    }

    #[test]
    fn test_merge_same_axis() {
        let gates = vec![
            NativeGate::rx(1, 0.25, tag()),
            NativeGate::ry(0, 1.0, tag()),
            NativeGate::rx(1, PI, tag()),
        ];
        let fused = fuse_rotations(&gates, 2, 1e-12);
        assert_eq!(fused.len(), 2);
        assert_relative_eq!(fused[0].angle(), normalize_angle(PI + 0.25), epsilon = 1e-12);
    }

    #[test]
    fn test_ms_blocks_fusion() {
        let gates = vec![
            NativeGate::ry(0, FRAC_PI_2, tag()),
            NativeGate::ms(0, 1, 0.5, tag()),
            NativeGate::ry(0, -FRAC_PI_2, tag()),
        ];
        let fused = fuse_rotations(&gates, 2, 1e-12);
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn test_cascading_cancellation() {
        let gates = vec![
            NativeGate::ry(0, 0.7, tag()),
            NativeGate::rx(0, 0.2, tag()),
            NativeGate::rx(0, -0.2, tag()),
            NativeGate::ry(0, -0.7, tag()),
        ];
        assert!(fuse_rotations(&gates, 1, 1e-12).is_empty());
    }

    #[test]
    fn test_other_ion_does_not_separate() {
        let gates = vec![
            NativeGate::ry(0, 0.5, tag()),
            NativeGate::rx(1, 0.1, tag()),
            NativeGate::ry(0, 0.5, tag()),
        ];
        let fused = fuse_rotations(&gates, 2, 1e-12);
        assert_eq!(fused.len(), 2);
        assert_relative_eq!(fused[0].angle(), 1.0, epsilon = 1e-12);
    }
}

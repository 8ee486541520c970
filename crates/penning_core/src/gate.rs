//! Gate definitions for the Penning compiler
//!
//! Gantree: L1_Circuit → Gate
//!
//! `LogicalGate` is the QFT-level instruction set; `NativeGate` is the closed
//! trap-native set {RX, RY, MS}. Every native gate keeps the logical gate it
//! came from.

use crate::topology::NodeKind;
use crate::types::{Angle, IonId, QubitId};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

// ============================================================================
// Logical Gates
// ============================================================================

/// Logical QFT operation
/// Gantree: LogicalGate // 논리 게이트
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LogicalGate {
    /// Hadamard
    Hadamard(QubitId),

    /// Controlled phase with angle 2π / 2^k
    ControlledPhase {
        /// Control qubit
        control: QubitId,
        /// Target qubit
        target: QubitId,
        /// Rotation order (k ≥ 2)
        k: u32,
    },

    /// Terminal qubit reversal, realised by relabelling outputs
    ReverseQubits,
}

impl LogicalGate {
    /// Qubits touched by this gate (empty for the reversal)
    pub fn qubits(&self) -> Vec<QubitId> {
        match *self {
            LogicalGate::Hadamard(q) => vec![q],
            LogicalGate::ControlledPhase { control, target, .. } => vec![control, target],
            LogicalGate::ReverseQubits => vec![],
        }
    }

    /// Phase angle of a controlled-phase gate
    pub fn phase(&self) -> Option<Angle> {
        match *self {
            LogicalGate::ControlledPhase { k, .. } => Some(2.0 * PI / 2f64.powi(k as i32)),
            _ => None,
        }
    }

    /// Gate name
    pub fn name(&self) -> &'static str {
        match self {
            LogicalGate::Hadamard(_) => "H",
            LogicalGate::ControlledPhase { .. } => "CP",
            LogicalGate::ReverseQubits => "REVERSE",
        }
    }
}

impl fmt::Display for LogicalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LogicalGate::Hadamard(q) => write!(f, "H q{}", q),
            LogicalGate::ControlledPhase { control, target, k } => {
                write!(f, "CP(2π/2^{}) q{}, q{}", k, control, target)
            }
            LogicalGate::ReverseQubits => write!(f, "REVERSE"),
        }
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Logical origin of a native gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Index of the logical gate in its circuit
    pub index: usize,
    /// The logical gate itself
    pub gate: LogicalGate,
}

impl Provenance {
    /// Create a provenance tag
    pub fn new(index: usize, gate: LogicalGate) -> Self {
        Self { index, gate }
    }
}

// ============================================================================
// Native Gates
// ============================================================================

/// Native gate kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeKind {
    /// X rotation
    Rx,
    /// Y rotation
    Ry,
    /// Mølmer–Sørensen entangler
    Ms,
}

impl NativeKind {
    /// Lower-case label used by the exported schedule
    pub fn label(&self) -> &'static str {
        match self {
            NativeKind::Rx => "rx",
            NativeKind::Ry => "ry",
            NativeKind::Ms => "ms",
        }
    }
}

/// Trap-native gate
/// Gantree: NativeGate // 네이티브 게이트
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NativeGate {
    /// exp(-i θ/2 X)
    Rx {
        /// Target ion
        ion: IonId,
        /// Rotation angle
        angle: Angle,
        /// Logical origin
        provenance: Provenance,
    },

    /// exp(-i θ/2 Y)
    Ry {
        /// Target ion
        ion: IonId,
        /// Rotation angle
        angle: Angle,
        /// Logical origin
        provenance: Provenance,
    },

    /// exp(-i φ/2 X⊗X)
    Ms {
        /// Participating ions
        ions: [IonId; 2],
        /// Entangling phase
        phase: Angle,
        /// Logical origin
        provenance: Provenance,
    },
}

impl NativeGate {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// X rotation
    pub fn rx(ion: IonId, angle: Angle, provenance: Provenance) -> Self {
        NativeGate::Rx {
            ion,
            angle,
            provenance,
        }
    }

    /// Y rotation
    pub fn ry(ion: IonId, angle: Angle, provenance: Provenance) -> Self {
        NativeGate::Ry {
            ion,
            angle,
            provenance,
        }
    }

    /// MS entangler on two ions
    pub fn ms(a: IonId, b: IonId, phase: Angle, provenance: Provenance) -> Self {
        NativeGate::Ms {
            ions: [a, b],
            phase,
            provenance,
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Ions involved in this gate
    /// Gantree: ions(&self) -> Vec<IonId> // 관련 이온
    pub fn ions(&self) -> Vec<IonId> {
        match *self {
            NativeGate::Rx { ion, .. } | NativeGate::Ry { ion, .. } => vec![ion],
            NativeGate::Ms { ions, .. } => ions.to_vec(),
        }
    }

    /// Check whether the gate touches `ion`
    pub fn involves(&self, ion: IonId) -> bool {
        match *self {
            NativeGate::Rx { ion: q, .. } | NativeGate::Ry { ion: q, .. } => q == ion,
            NativeGate::Ms { ions, .. } => ions.contains(&ion),
        }
    }

    /// Gate kind
    pub fn kind(&self) -> NativeKind {
        match self {
            NativeGate::Rx { .. } => NativeKind::Rx,
            NativeGate::Ry { .. } => NativeKind::Ry,
            NativeGate::Ms { .. } => NativeKind::Ms,
        }
    }

    /// Rotation angle or entangling phase
    pub fn angle(&self) -> Angle {
        match *self {
            NativeGate::Rx { angle, .. } | NativeGate::Ry { angle, .. } => angle,
            NativeGate::Ms { phase, .. } => phase,
        }
    }

    /// Logical origin
    pub fn provenance(&self) -> Provenance {
        match *self {
            NativeGate::Rx { provenance, .. }
            | NativeGate::Ry { provenance, .. }
            | NativeGate::Ms { provenance, .. } => provenance,
        }
    }

    /// Check if gate is single-ion
    pub fn is_single_qubit(&self) -> bool {
        !self.is_two_qubit()
    }

    /// Check if gate is MS
    pub fn is_two_qubit(&self) -> bool {
        matches!(self, NativeGate::Ms { .. })
    }

    /// Node kind the gate must execute on
    pub fn required_node_kind(&self) -> NodeKind {
        if self.is_two_qubit() {
            NodeKind::Interaction
        } else {
            NodeKind::Standard
        }
    }

    /// Same gate with a replaced angle (MS phase for MS)
    pub fn with_angle(&self, angle: Angle) -> Self {
        match *self {
            NativeGate::Rx { ion, provenance, .. } => NativeGate::rx(ion, angle, provenance),
            NativeGate::Ry { ion, provenance, .. } => NativeGate::ry(ion, angle, provenance),
            NativeGate::Ms {
                ions, provenance, ..
            } => NativeGate::ms(ions[0], ions[1], angle, provenance),
        }
    }

    /// Gate name
    pub fn name(&self) -> &'static str {
        match self {
            NativeGate::Rx { .. } => "RX",
            NativeGate::Ry { .. } => "RY",
            NativeGate::Ms { .. } => "MS",
        }
    }
}

impl fmt::Display for NativeGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NativeGate::Rx { ion, angle, .. } => write!(f, "RX({:.4}) ion{}", angle, ion),
            NativeGate::Ry { ion, angle, .. } => write!(f, "RY({:.4}) ion{}", angle, ion),
            NativeGate::Ms { ions, phase, .. } => {
                write!(f, "MS({:.4}) ion{}, ion{}", phase, ions[0], ions[1])
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tag() -> Provenance {
        Provenance::new(0, LogicalGate::Hadamard(0))
    }

    #[test]
    fn test_logical_phase() {
        let cp = LogicalGate::ControlledPhase {
            control: 1,
            target: 0,
            k: 2,
        };
        assert_relative_eq!(cp.phase().unwrap_or(0.0), PI / 2.0, epsilon = 1e-15);
        assert_eq!(cp.qubits(), vec![1, 0]);
        assert!(LogicalGate::Hadamard(0).phase().is_none());
        assert!(LogicalGate::ReverseQubits.qubits().is_empty());
    }

    #[test]
    fn test_native_properties() {
        let rx = NativeGate::rx(3, PI, tag());
        assert_eq!(rx.ions(), vec![3]);
        assert!(rx.is_single_qubit());
        assert_eq!(rx.required_node_kind(), NodeKind::Standard);
        assert_eq!(rx.kind(), NativeKind::Rx);

        let ms = NativeGate::ms(1, 0, -PI / 4.0, tag());
        assert_eq!(ms.ions(), vec![1, 0]);
        assert!(ms.involves(0));
        assert!(!ms.involves(2));
        assert_eq!(ms.required_node_kind(), NodeKind::Interaction);
    }

    #[test]
    fn test_with_angle_keeps_identity() {
        let ry = NativeGate::ry(2, PI / 2.0, tag());
        let merged = ry.with_angle(PI);
        assert_eq!(merged.kind(), NativeKind::Ry);
        assert_eq!(merged.ions(), vec![2]);
        assert_relative_eq!(merged.angle(), PI);
        assert_eq!(merged.provenance(), ry.provenance());
    }

    #[test]
    fn test_display() {
        let ms = NativeGate::ms(1, 0, -0.5, tag());
        assert_eq!(ms.to_string(), "MS(-0.5000) ion1, ion0");
    }
}

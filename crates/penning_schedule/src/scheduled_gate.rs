//! Placed gate representation
//!
//! Gantree: L5_Schedule → PlacedGate

use penning_core::{IonId, NativeGate, NodeId, Step};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling state of one native gate
/// Gantree: GateState // 게이트 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    /// Not yet placed
    Pending,
    /// Placed at a step
    Placed(Step),
}

impl GateState {
    /// Check for `Placed`
    pub fn is_placed(&self) -> bool {
        matches!(self, GateState::Placed(_))
    }
}

/// A native gate with its step and node
/// Gantree: PlacedGate // 배치된 게이트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedGate {
    /// Index in the native stream
    /// Gantree: index: usize // 원본 인덱스
    pub index: usize,

    /// The gate
    pub gate: NativeGate,

    /// First step
    pub step: Step,

    /// Steps the gate occupies
    pub span: usize,

    /// Node the gate runs on
    pub node: NodeId,
}

impl PlacedGate {
    /// Create a placed gate
    pub fn new(index: usize, gate: NativeGate, step: Step, span: usize, node: NodeId) -> Self {
        Self {
            index,
            gate,
            step,
            span,
            node,
        }
    }

    /// First step after the gate
    pub fn finish(&self) -> Step {
        self.step + self.span
    }

    /// Ions involved
    pub fn ions(&self) -> Vec<IonId> {
        self.gate.ions()
    }

    /// Check if the gate occupies `step`
    pub fn covers(&self, step: Step) -> bool {
        (self.step..self.finish()).contains(&step)
    }
}

impl fmt::Display for PlacedGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}-{}] {} @node{}",
            self.step,
            self.finish(),
            self.gate,
            self.node
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{LogicalGate, Provenance};

    #[test]
    fn test_window() {
        let gate = NativeGate::ms(0, 1, 0.5, Provenance::new(3, LogicalGate::Hadamard(0)));
        let placed = PlacedGate::new(7, gate, 10, 2, 4);
        assert_eq!(placed.finish(), 12);
        assert!(placed.covers(11));
        assert!(!placed.covers(12));
        assert!(placed.to_string().starts_with("[10-12]"));
        assert!(GateState::Placed(10).is_placed());
        assert!(!GateState::Pending.is_placed());
    }
}

//! Gate dependencies
//!
//! Gantree: L5_Schedule → DependencyGraph
//!
//! A native gate depends on the previous gate of each of its ions. Gate
//! indices are already a topological order.

use penning_core::NativeCircuit;

/// Per-ion predecessor graph over a native stream
/// Gantree: DependencyGraph // 의존성 그래프
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build from a native circuit
    pub fn new(circuit: &NativeCircuit) -> Self {
        let n = circuit.gate_count();
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        let mut last: Vec<Option<usize>> = vec![None; circuit.num_ions()];

        for (idx, gate) in circuit.gates().iter().enumerate() {
            for ion in gate.ions() {
                if let Some(prev) = last.get(ion).copied().flatten() {
                    if !preds[idx].contains(&prev) {
                        preds[idx].push(prev);
                        succs[prev].push(idx);
                    }
                }
                if let Some(slot) = last.get_mut(ion) {
                    *slot = Some(idx);
                }
            }
        }
        Self { preds, succs }
    }

    /// Number of gates
    pub fn len(&self) -> usize {
        self.preds.len()
    }

    /// Check if there are no gates
    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    /// Direct predecessors
    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.preds[idx]
    }

    /// Direct successors
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.succs[idx]
    }

    /// Check whether `to` transitively depends on `from`
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        if from >= to {
            return false;
        }
        let mut seen = vec![false; self.len()];
        let mut stack = vec![from];
        while let Some(cur) = stack.pop() {
            for &next in &self.succs[cur] {
                if next == to {
                    return true;
                }
                // successors have larger indices, nothing past `to` can lead back
                if next < to && !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        false
    }

    /// Check whether neither gate depends on the other
    pub fn independent(&self, a: usize, b: usize) -> bool {
        a != b && !self.reaches(a, b) && !self.reaches(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{LogicalGate, NativeGate, Provenance};

    fn tag() -> Provenance {
        Provenance::new(0, LogicalGate::Hadamard(0))
    }

    // 0: rx(0)  1: rx(2)  2: ms(0,1)  3: ms(2,3)  4: ms(1,2)
    fn circuit() -> NativeCircuit {
        NativeCircuit::new(
            4,
            vec![
                NativeGate::rx(0, 0.1, tag()),
                NativeGate::rx(2, 0.1, tag()),
                NativeGate::ms(0, 1, 0.2, tag()),
                NativeGate::ms(2, 3, 0.2, tag()),
                NativeGate::ms(1, 2, 0.2, tag()),
            ],
        )
    }

    #[test]
    fn test_predecessors() {
        let deps = DependencyGraph::new(&circuit());
        assert!(deps.predecessors(0).is_empty());
        assert_eq!(deps.predecessors(2), &[0]);
        assert_eq!(deps.predecessors(4), &[2, 3]);
        assert_eq!(deps.successors(1), &[3]);
    }

    #[test]
    fn test_reachability() {
        let deps = DependencyGraph::new(&circuit());
        assert!(deps.reaches(0, 4));
        assert!(!deps.reaches(4, 0));
        assert!(deps.independent(2, 3));
        assert!(!deps.independent(3, 4));
    }
}

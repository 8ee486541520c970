//! Scheduling strategy
//!
//! Gantree: L5_Schedule → Strategy
//!
//! The knobs the search coordinator turns: MS priority order, pinned
//! interaction nodes, settle delays and routing order per MS gate. Keys are
//! gate indices in the native stream.

use penning_core::{NativeCircuit, NodeId, PenningError, PenningResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One scheduling candidate
/// Gantree: Strategy // 스케줄 전략
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Strategy {
    /// MS gate indices in priority order
    pub ms_order: Vec<usize>,
    /// Interaction node pinned per MS gate
    pub node_preference: BTreeMap<usize, NodeId>,
    /// Extra wait before an MS gate starts
    pub settle: BTreeMap<usize, usize>,
    /// MS gates whose second ion is routed first
    pub route_second_first: BTreeSet<usize>,
}

impl Strategy {
    /// Stream-order strategy with no pins or delays
    pub fn for_circuit(circuit: &NativeCircuit) -> Self {
        Self {
            ms_order: circuit.ms_indices(),
            ..Self::default()
        }
    }

    /// Priority rank of every MS gate, indexed by gate index
    pub fn ranks(&self, num_gates: usize) -> Vec<Option<usize>> {
        let mut ranks = vec![None; num_gates];
        for (rank, &idx) in self.ms_order.iter().enumerate() {
            if let Some(slot) = ranks.get_mut(idx) {
                *slot = Some(rank);
            }
        }
        ranks
    }

    /// Settle delay of an MS gate
    pub fn settle_for(&self, idx: usize) -> usize {
        self.settle.get(&idx).copied().unwrap_or(0)
    }

    /// Swap two neighbouring entries of the MS order
    pub fn swap_adjacent(mut self, pos: usize) -> Self {
        if pos + 1 < self.ms_order.len() {
            self.ms_order.swap(pos, pos + 1);
        }
        self
    }

    /// Pin an MS gate to a node
    pub fn pin(mut self, idx: usize, node: NodeId) -> Self {
        self.node_preference.insert(idx, node);
        self
    }

    /// Set the settle delay of an MS gate (0 removes it)
    pub fn with_settle(mut self, idx: usize, steps: usize) -> Self {
        if steps == 0 {
            self.settle.remove(&idx);
        } else {
            self.settle.insert(idx, steps);
        }
        self
    }

    /// Toggle the routing order of an MS gate
    pub fn flip_route_order(mut self, idx: usize) -> Self {
        if !self.route_second_first.remove(&idx) {
            self.route_second_first.insert(idx);
        }
        self
    }

    /// Check the strategy against a circuit: the MS order must list every MS
    /// gate exactly once and every key must name an MS gate
    pub fn validate(&self, circuit: &NativeCircuit) -> PenningResult<()> {
        let ms: BTreeSet<usize> = circuit.ms_indices().into_iter().collect();
        let listed: BTreeSet<usize> = self.ms_order.iter().copied().collect();
        if listed.len() != self.ms_order.len() || listed != ms {
            return Err(PenningError::InvalidConfig(format!(
                "MS order lists {} entries for {} MS gates",
                self.ms_order.len(),
                ms.len()
            )));
        }
        let keys = self
            .node_preference
            .keys()
            .chain(self.settle.keys())
            .chain(self.route_second_first.iter());
        for idx in keys {
            if !ms.contains(idx) {
                return Err(PenningError::InvalidConfig(format!(
                    "gate {} is not an MS gate",
                    idx
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Strategy({} MS, {} pinned, {} settled, {} flipped)",
            self.ms_order.len(),
            self.node_preference.len(),
            self.settle.len(),
            self.route_second_first.len()
        )
    }
}

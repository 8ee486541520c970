//! Initial ion placement
//!
//! Gantree: L1_Circuit → InitialLayout

use crate::constants::trap;
use crate::error::{PenningError, PenningResult};
use crate::topology::TrapGraph;
use crate::types::{Coord, IonId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Starting node of every ion
/// Gantree: InitialLayout // 초기 배치
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialLayout {
    nodes: Vec<NodeId>,
}

impl InitialLayout {
    /// Create and validate a layout: distinct standard nodes of `graph`
    pub fn new(graph: &TrapGraph, nodes: Vec<NodeId>) -> PenningResult<Self> {
        if nodes.is_empty() {
            return Err(PenningError::InvalidLayout("no ions placed".into()));
        }
        let mut seen = HashSet::with_capacity(nodes.len());
        for (ion, &node) in nodes.iter().enumerate() {
            graph.check_node(node)?;
            if !graph.is_standard(node) {
                return Err(PenningError::InvalidLayout(format!(
                    "ion {} starts on interaction node {}",
                    ion,
                    graph.coord(node)
                )));
            }
            if !seen.insert(node) {
                return Err(PenningError::InvalidLayout(format!(
                    "ion {} shares node {} with another ion",
                    ion,
                    graph.coord(node)
                )));
            }
        }
        Ok(Self { nodes })
    }

    /// Layout from coordinates
    pub fn from_coords(graph: &TrapGraph, coords: &[Coord]) -> PenningResult<Self> {
        let nodes = coords
            .iter()
            .map(|&c| {
                graph.node_at(c).ok_or_else(|| {
                    PenningError::InvalidLayout(format!("no trap node at {}", c))
                })
            })
            .collect::<PenningResult<Vec<_>>>()?;
        Self::new(graph, nodes)
    }

    /// First `num_ions` standard nodes in id order
    pub fn first_standard(graph: &TrapGraph, num_ions: usize) -> PenningResult<Self> {
        let standard = graph.standard_nodes();
        if standard.len() < num_ions {
            return Err(PenningError::InvalidLayout(format!(
                "{} ions but only {} standard nodes",
                num_ions,
                standard.len()
            )));
        }
        Self::new(graph, standard.into_iter().take(num_ions).collect())
    }

    /// Reference starting layout of the Penning trap, falling back to
    /// `first_standard` on graphs that do not contain those sites
    pub fn default_for(graph: &TrapGraph, num_ions: usize) -> PenningResult<Self> {
        if num_ions <= trap::INITIAL_LAYOUT.len() {
            let coords: Vec<Coord> = trap::INITIAL_LAYOUT[..num_ions]
                .iter()
                .map(|&c| Coord::from(c))
                .collect();
            if let Ok(layout) = Self::from_coords(graph, &coords) {
                return Ok(layout);
            }
        }
        Self::first_standard(graph, num_ions)
    }

    /// Number of ions
    pub fn num_ions(&self) -> usize {
        self.nodes.len()
    }

    /// Starting node of an ion
    pub fn node_of(&self, ion: IonId) -> Option<NodeId> {
        self.nodes.get(ion).copied()
    }

    /// Starting nodes indexed by ion
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_penning_layout() {
        let g = TrapGraph::penning();
        let layout = InitialLayout::default_for(&g, 8).unwrap();
        assert_eq!(layout.num_ions(), 8);
        assert_eq!(g.coord(layout.nodes()[0]), Coord::new(0, 1));
        assert_eq!(g.coord(layout.nodes()[7]), Coord::new(4, 5));
    }

    #[test]
    fn test_default_falls_back_on_line() {
        let g = TrapGraph::line_with_center_interaction(8);
        let layout = InitialLayout::default_for(&g, 8).unwrap();
        assert_eq!(layout.nodes(), &[0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_rejects_interaction_and_duplicates() {
        let g = TrapGraph::line_with_center_interaction(4);
        assert!(InitialLayout::new(&g, vec![0, 2]).is_err());
        assert!(InitialLayout::new(&g, vec![0, 0]).is_err());
        assert!(InitialLayout::new(&g, vec![0, 9]).is_err());
        assert!(InitialLayout::first_standard(&g, 5).is_err());
    }
}

//! Site graph
//!
//! Gantree: L4_Shuttle → SiteGraph
//!
//! Positions an ion can hold: every trap node plus the rest slot of every
//! standard node. A rest slot connects only to its host node.

use penning_core::{NodeId, Position, TrapGraph};
use std::collections::VecDeque;

/// Site view over a trap graph
#[derive(Debug, Clone, Copy)]
pub struct SiteGraph<'a> {
    graph: &'a TrapGraph,
}

impl<'a> SiteGraph<'a> {
    /// Wrap a trap graph
    pub fn new(graph: &'a TrapGraph) -> Self {
        Self { graph }
    }

    /// Underlying trap graph
    pub fn graph(&self) -> &'a TrapGraph {
        self.graph
    }

    /// Number of sites (nodes + slots, slots of interaction nodes unused)
    pub fn num_sites(&self) -> usize {
        2 * self.graph.num_nodes()
    }

    /// Dense index of a position
    pub fn index(&self, pos: Position) -> usize {
        match pos {
            Position::At(n) => n,
            Position::Idle(n) => self.graph.num_nodes() + n,
        }
    }

    /// Position of a dense index
    pub fn position(&self, index: usize) -> Position {
        let n = self.graph.num_nodes();
        if index < n {
            Position::At(index)
        } else {
            Position::Idle(index - n)
        }
    }

    /// Check whether a position exists on this trap
    pub fn contains(&self, pos: Position) -> bool {
        match pos {
            Position::At(n) => n < self.graph.num_nodes(),
            Position::Idle(n) => self.graph.is_standard(n),
        }
    }

    /// Positions reachable in one step (excluding staying)
    pub fn neighbors(&self, pos: Position) -> Vec<Position> {
        match pos {
            Position::At(n) => {
                let mut out: Vec<Position> = self
                    .graph
                    .neighbors(n)
                    .iter()
                    .map(|&m| Position::At(m))
                    .collect();
                if self.graph.is_standard(n) {
                    out.push(Position::Idle(n));
                }
                out
            }
            Position::Idle(n) => vec![Position::At(n)],
        }
    }

    /// Every existing site
    pub fn sites(&self) -> Vec<Position> {
        (0..self.num_sites())
            .map(|i| self.position(i))
            .filter(|&p| self.contains(p))
            .collect()
    }

    /// Multi-source BFS distance to the nearest accepted site, per index
    pub fn distances_to(&self, accept: impl Fn(Position) -> bool) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.num_sites()];
        let mut queue = VecDeque::new();
        for site in self.sites() {
            if accept(site) {
                dist[self.index(site)] = Some(0);
                queue.push_back(site);
            }
        }
        while let Some(cur) = queue.pop_front() {
            let d = dist[self.index(cur)].unwrap_or(0);
            for next in self.neighbors(cur) {
                let idx = self.index(next);
                if dist[idx].is_none() {
                    dist[idx] = Some(d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Hop count between two nodes ignoring ions
    pub fn node_distance(&self, a: NodeId, b: NodeId) -> Option<usize> {
        self.graph.distance(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_include_slot() {
        let g = TrapGraph::line_with_center_interaction(4);
        let sites = SiteGraph::new(&g);
        assert_eq!(
            sites.neighbors(Position::At(1)),
            vec![Position::At(0), Position::At(2), Position::Idle(1)]
        );
        // interaction node has no rest slot
        assert_eq!(
            sites.neighbors(Position::At(2)),
            vec![Position::At(1), Position::At(3)]
        );
        assert_eq!(sites.neighbors(Position::Idle(0)), vec![Position::At(0)]);
    }

    #[test]
    fn test_index_roundtrip() {
        let g = TrapGraph::penning();
        let sites = SiteGraph::new(&g);
        for site in sites.sites() {
            assert_eq!(sites.position(sites.index(site)), site);
        }
        assert_eq!(sites.sites().len(), 35 + 29);
    }

    #[test]
    fn test_distances_to_slots() {
        let g = TrapGraph::line_with_center_interaction(4);
        let sites = SiteGraph::new(&g);
        let d = sites.distances_to(|p| p.is_idle());
        assert_eq!(d[sites.index(Position::At(2))], Some(2));
        assert_eq!(d[sites.index(Position::At(0))], Some(1));
    }
}

//! Trap graph for the Penning compiler
//!
//! Gantree: L1_Circuit → Topology
//!
//! Discrete trap layout: grid nodes of two kinds joined by undirected,
//! unweighted shuttling edges. Every standard node also owns a rest slot,
//! which is modelled by `Position::Idle` rather than as a graph node.

use crate::constants::trap;
use crate::error::{PenningError, PenningResult};
use crate::types::{Coord, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

// ============================================================================
// Nodes
// ============================================================================

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Single-ion gates, storage and transit
    Standard,
    /// MS gates, storage and transit
    Interaction,
}

/// Trap node
/// Gantree: TrapNode // 트랩 노드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapNode {
    /// Arena index
    pub id: NodeId,
    /// Grid coordinate
    pub coord: Coord,
    /// Node kind
    pub kind: NodeKind,
}

impl TrapNode {
    /// Create a node
    pub fn new(id: NodeId, coord: Coord, kind: NodeKind) -> Self {
        Self { id, coord, kind }
    }

    /// Check if node is an interaction node
    pub fn is_interaction(&self) -> bool {
        self.kind == NodeKind::Interaction
    }
}

// ============================================================================
// TrapGraph
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrapGraphData {
    #[serde(default)]
    name: Option<String>,
    nodes: Vec<TrapNode>,
    edges: Vec<(NodeId, NodeId)>,
}

/// Trap graph
/// Gantree: TrapGraph // 트랩 그래프
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrapGraphData", into = "TrapGraphData")]
pub struct TrapGraph {
    nodes: Vec<TrapNode>,
    edges: Vec<(NodeId, NodeId)>,
    adjacency: Vec<Vec<NodeId>>,
    by_coord: HashMap<Coord, NodeId>,
    name: Option<String>,
}

impl TryFrom<TrapGraphData> for TrapGraph {
    type Error = PenningError;

    fn try_from(data: TrapGraphData) -> Result<Self, Self::Error> {
        let mut graph = TrapGraph::new(data.nodes, data.edges)?;
        graph.name = data.name;
        Ok(graph)
    }
}

impl From<TrapGraph> for TrapGraphData {
    fn from(graph: TrapGraph) -> Self {
        TrapGraphData {
            name: graph.name,
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

impl TrapGraph {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from nodes and undirected edges
    /// Gantree: new(nodes,edges) -> Result<Self> // 생성+검증
    ///
    /// Node ids must equal their position, coordinates must be unique and
    /// every edge must join two nodes one grid hop apart.
    pub fn new(nodes: Vec<TrapNode>, edges: Vec<(NodeId, NodeId)>) -> PenningResult<Self> {
        if nodes.is_empty() {
            return Err(PenningError::InvalidTopology("trap has no nodes".into()));
        }

        let mut by_coord = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if node.id != idx {
                return Err(PenningError::InvalidTopology(format!(
                    "node at position {} has id {}",
                    idx, node.id
                )));
            }
            if by_coord.insert(node.coord, node.id).is_some() {
                return Err(PenningError::InvalidTopology(format!(
                    "duplicate coordinate {}",
                    node.coord
                )));
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        let mut seen = HashSet::with_capacity(edges.len());
        for &(a, b) in &edges {
            for n in [a, b] {
                if n >= nodes.len() {
                    return Err(PenningError::NodeOutOfRange {
                        node: n,
                        num_nodes: nodes.len(),
                    });
                }
            }
            if a == b {
                return Err(PenningError::InvalidTopology(format!(
                    "self-loop on node {}",
                    a
                )));
            }
            if nodes[a].coord.manhattan(&nodes[b].coord) != 1 {
                return Err(PenningError::InvalidTopology(format!(
                    "edge {} - {} is not a single grid hop",
                    nodes[a].coord, nodes[b].coord
                )));
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Err(PenningError::InvalidTopology(format!(
                    "duplicate edge {} - {}",
                    a, b
                )));
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        for list in adjacency.iter_mut() {
            list.sort_unstable();
        }

        Ok(Self {
            nodes,
            edges,
            adjacency,
            by_coord,
            name: None,
        })
    }

    /// Rectangular grid with 4-neighbour edges
    /// Gantree: grid(rows,cols,interaction) -> Result<Self> // 그리드
    ///
    /// Node indexing: x * cols + y.
    pub fn grid(rows: i32, cols: i32, interaction: &[Coord]) -> PenningResult<Self> {
        if rows <= 0 || cols <= 0 {
            return Err(PenningError::InvalidTopology(format!(
                "grid {}x{} has no nodes",
                rows, cols
            )));
        }
        for c in interaction {
            if !(0..rows).contains(&c.x) || !(0..cols).contains(&c.y) {
                return Err(PenningError::InvalidTopology(format!(
                    "interaction site {} outside {}x{} grid",
                    c, rows, cols
                )));
            }
        }
        Ok(Self::build_grid(rows, cols, interaction))
    }

    fn build_grid(rows: i32, cols: i32, interaction: &[Coord]) -> Self {
        let mut nodes = Vec::with_capacity((rows * cols) as usize);
        let mut edges = Vec::new();
        let index = |x: i32, y: i32| (x * cols + y) as NodeId;

        for x in 0..rows {
            for y in 0..cols {
                let coord = Coord::new(x, y);
                let kind = if interaction.contains(&coord) {
                    NodeKind::Interaction
                } else {
                    NodeKind::Standard
                };
                nodes.push(TrapNode::new(index(x, y), coord, kind));

                if y + 1 < cols {
                    edges.push((index(x, y), index(x, y + 1)));
                }
                if x + 1 < rows {
                    edges.push((index(x, y), index(x + 1, y)));
                }
            }
        }

        Self::from_parts(nodes, edges, format!("grid_{}x{}", rows, cols))
    }

    /// Reference Penning trap: 5x7 grid with six interaction zones
    pub fn penning() -> Self {
        let sites: Vec<Coord> = trap::INTERACTION_SITES
            .iter()
            .map(|&c| Coord::from(c))
            .collect();
        let mut graph = Self::build_grid(trap::ROWS, trap::COLS, &sites);
        graph.name = Some("penning_5x7".into());
        graph
    }

    /// Straight line of nodes along x at y = 0
    pub fn line(kinds: &[NodeKind]) -> PenningResult<Self> {
        if kinds.is_empty() {
            return Err(PenningError::InvalidTopology("line has no nodes".into()));
        }
        let nodes = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| TrapNode::new(i, Coord::new(i as i32, 0), kind))
            .collect();
        let edges = (1..kinds.len()).map(|i| (i - 1, i)).collect();
        Ok(Self::from_parts(nodes, edges, format!("line_{}", kinds.len())))
    }

    /// Line of `num_standard` standard nodes split by one central
    /// interaction node: S0 .. S(n/2-1) - I - S(n/2) .. S(n-1)
    pub fn line_with_center_interaction(num_standard: usize) -> Self {
        let half = num_standard / 2;
        let total = num_standard + 1;
        let nodes: Vec<TrapNode> = (0..total)
            .map(|i| {
                let kind = if i == half {
                    NodeKind::Interaction
                } else {
                    NodeKind::Standard
                };
                TrapNode::new(i, Coord::new(i as i32, 0), kind)
            })
            .collect();
        let edges = (1..total).map(|i| (i - 1, i)).collect();
        Self::from_parts(nodes, edges, format!("line_{}_center", num_standard))
    }

    /// Load from JSON `{ "name", "nodes": [...], "edges": [[a, b], ...] }`
    pub fn from_json(json: &str) -> PenningResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> PenningResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn from_parts(nodes: Vec<TrapNode>, edges: Vec<(NodeId, NodeId)>, name: String) -> Self {
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for &(a, b) in &edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        for list in adjacency.iter_mut() {
            list.sort_unstable();
        }
        let by_coord = nodes.iter().map(|n| (n.coord, n.id)).collect();
        Self {
            nodes,
            edges,
            adjacency,
            by_coord,
            name: Some(name),
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All nodes
    pub fn nodes(&self) -> &[TrapNode] {
        &self.nodes
    }

    /// Edge list
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&TrapNode> {
        self.nodes.get(id)
    }

    /// Graph name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set graph name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Kind of a node. Panics on an unknown id.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    /// Coordinate of a node. Panics on an unknown id.
    pub fn coord(&self, id: NodeId) -> Coord {
        self.nodes[id].coord
    }

    /// Check if node is an interaction node
    pub fn is_interaction(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(TrapNode::is_interaction)
    }

    /// Check if node is a standard node
    pub fn is_standard(&self, id: NodeId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.kind == NodeKind::Standard)
    }

    /// Node at a coordinate
    pub fn node_at(&self, coord: Coord) -> Option<NodeId> {
        self.by_coord.get(&coord).copied()
    }

    /// Interaction node ids
    pub fn interaction_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_interaction())
            .map(|n| n.id)
            .collect()
    }

    /// Standard node ids
    pub fn standard_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !n.is_interaction())
            .map(|n| n.id)
            .collect()
    }

    /// Validate a node id
    pub fn check_node(&self, id: NodeId) -> PenningResult<()> {
        if id >= self.nodes.len() {
            return Err(PenningError::NodeOutOfRange {
                node: id,
                num_nodes: self.nodes.len(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Connectivity Queries
    // ========================================================================

    /// Neighbors of a node (sorted)
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if two nodes share an edge
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// BFS hop distances from a node
    /// Gantree: distances_from(id) -> Vec<Option<usize>> // BFS 거리
    pub fn distances_from(&self, start: NodeId) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.nodes.len()];
        if start >= self.nodes.len() {
            return dist;
        }
        let mut queue = VecDeque::new();
        dist[start] = Some(0);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let d = dist[current].unwrap_or(0);
            for &next in self.neighbors(current) {
                if dist[next].is_none() {
                    dist[next] = Some(d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Shortest node path between two nodes (BFS)
    pub fn shortest_path(&self, start: NodeId, end: NodeId) -> Option<Vec<NodeId>> {
        if start >= self.nodes.len() || end >= self.nodes.len() {
            return None;
        }
        if start == end {
            return Some(vec![start]);
        }

        let mut parent: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == end {
                let mut path = vec![end];
                let mut node = parent[end];
                while let Some(n) = node {
                    path.push(n);
                    node = parent[n];
                }
                path.reverse();
                return Some(path);
            }
            for &next in self.neighbors(current) {
                if !visited[next] {
                    visited[next] = true;
                    parent[next] = Some(current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Hop distance between two nodes
    pub fn distance(&self, a: NodeId, b: NodeId) -> Option<usize> {
        self.distances_from(a).get(b).copied().flatten()
    }

    /// Check if every node is reachable from node 0
    pub fn is_connected(&self) -> bool {
        self.distances_from(0).iter().all(Option::is_some)
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for TrapGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrapGraph({} nodes, {} interaction, {} edges{})",
            self.nodes.len(),
            self.interaction_nodes().len(),
            self.edges.len(),
            self.name
                .as_ref()
                .map(|n| format!(", {}", n))
                .unwrap_or_default()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penning_layout() {
        let g = TrapGraph::penning();
        assert_eq!(g.num_nodes(), 35);
        // 5 rows x 6 horizontal + 4 x 7 vertical
        assert_eq!(g.num_edges(), 58);
        assert_eq!(g.interaction_nodes().len(), 6);

        let i = g.node_at(Coord::new(1, 3)).unwrap();
        assert!(g.is_interaction(i));
        assert_eq!(g.neighbors(i).len(), 4);
        assert!(g.is_connected());
    }

    #[test]
    fn test_line_with_center() {
        let g = TrapGraph::line_with_center_interaction(8);
        assert_eq!(g.num_nodes(), 9);
        assert_eq!(g.interaction_nodes(), vec![4]);
        assert_eq!(g.standard_nodes().len(), 8);
        assert_eq!(g.shortest_path(0, 8).unwrap().len(), 9);
        assert!(g.is_adjacent(3, 4));
        assert!(!g.is_adjacent(3, 5));
    }

    #[test]
    fn test_rejects_long_edge() {
        let nodes = vec![
            TrapNode::new(0, Coord::new(0, 0), NodeKind::Standard),
            TrapNode::new(1, Coord::new(0, 2), NodeKind::Interaction),
        ];
        let err = TrapGraph::new(nodes, vec![(0, 1)]).unwrap_err();
        assert!(matches!(err, PenningError::InvalidTopology(_)));
    }

    #[test]
    fn test_rejects_bad_ids() {
        let nodes = vec![TrapNode::new(3, Coord::new(0, 0), NodeKind::Standard)];
        assert!(TrapGraph::new(nodes, vec![]).is_err());

        let nodes = vec![TrapNode::new(0, Coord::new(0, 0), NodeKind::Standard)];
        let err = TrapGraph::new(nodes, vec![(0, 4)]).unwrap_err();
        assert!(matches!(err, PenningError::NodeOutOfRange { node: 4, .. }));
    }

    #[test]
    fn test_grid_rejects_outside_site() {
        assert!(TrapGraph::grid(2, 2, &[Coord::new(5, 5)]).is_err());
        let g = TrapGraph::grid(3, 3, &[]).unwrap();
        assert!(g.interaction_nodes().is_empty());
    }

    #[test]
    fn test_distances() {
        let g = TrapGraph::grid(3, 3, &[Coord::new(1, 1)]).unwrap();
        let d = g.distances_from(0);
        assert_eq!(d[8], Some(4));
        assert_eq!(g.distance(0, 4), Some(2));
    }

    #[test]
    fn test_json_roundtrip() {
        let g = TrapGraph::line_with_center_interaction(4);
        let json = g.to_json().unwrap();
        let back = TrapGraph::from_json(&json).unwrap();
        assert_eq!(g, back);
    }

    #[test]
    fn test_json_validation() {
        let json = r#"{
            "nodes": [
                {"id": 0, "coord": {"x": 0, "y": 0}, "kind": "standard"},
                {"id": 1, "coord": {"x": 3, "y": 0}, "kind": "interaction"}
            ],
            "edges": [[0, 1]]
        }"#;
        assert!(TrapGraph::from_json(json).is_err());
    }
}

//! Space-time route search
//!
//! Gantree: L4_Shuttle → RouteSearch
//!
//! A* over (site, step) against the committed trajectories of every other
//! ion. A route never enters a site another ion occupies at the same step
//! and never exchanges sites with another ion in one step. The goal is only
//! accepted where the ion may stay forever, and a standard node only while
//! its rest slot is free, so a holder can always be cleared into its slot.

use crate::site::SiteGraph;
use crate::state::SearchState;
use log::trace;
use penning_core::{IonId, NodeId, Position, Step, TrapGraph};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

// ============================================================================
// Goal
// ============================================================================

/// Where a route may end
/// Gantree: Goal // 목표
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    /// Exactly this node
    At(NodeId),
    /// Any standard node
    AnyStandard,
    /// Any rest slot
    Park,
    /// Any standard node outside the list
    StandardAvoiding(Vec<NodeId>),
}

impl Goal {
    /// Check whether a position satisfies the goal
    pub fn accepts(&self, graph: &TrapGraph, pos: Position) -> bool {
        match (self, pos) {
            (Goal::At(n), Position::At(m)) => *n == m,
            (Goal::AnyStandard, Position::At(m)) => graph.is_standard(m),
            (Goal::Park, Position::Idle(_)) => true,
            (Goal::StandardAvoiding(avoid), Position::At(m)) => {
                graph.is_standard(m) && !avoid.contains(&m)
            }
            _ => false,
        }
    }
}

// ============================================================================
// Route
// ============================================================================

/// Positions appended to one ion's trajectory
/// Gantree: Route // 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Routed ion
    pub ion: IonId,
    /// Last committed step the route starts from
    pub start: Step,
    /// Positions at steps `start + 1 ..= arrival`
    pub positions: Vec<Position>,
    /// Position changes along the route
    pub moves: usize,
}

impl Route {
    /// Step the ion reaches its goal
    pub fn arrival(&self) -> Step {
        self.start + self.positions.len()
    }

    /// Final position, if the route moves at all
    pub fn end(&self) -> Option<Position> {
        self.positions.last().copied()
    }

    /// Check whether the route is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    pos: Position,
    step: Step,
    cost: u64,
    moves: usize,
    parent: Option<usize>,
}

/// Rules of one search call
struct Rules<'s> {
    state: &'s SearchState,
    ion: IonId,
    /// Partner holding at the goal: (ion, site, from step)
    partner_hold: Option<(IonId, Position, Step)>,
    /// Ions sharing the start site when the search begins
    co_located: Vec<IonId>,
    start: Position,
}

impl Rules<'_> {
    fn partner_exempt(&self, y: IonId, pos: Position, step: Step) -> bool {
        matches!(self.partner_hold, Some((p, site, from)) if p == y && site == pos && step >= from)
    }

    fn blocked(&self, pos: Position, step: Step, fresh: bool) -> bool {
        (0..self.state.num_ions()).any(|y| {
            y != self.ion
                && self.state.position(y, step) == pos
                && !self.partner_exempt(y, pos, step)
                && !(fresh && pos == self.start && self.co_located.contains(&y))
        })
    }

    fn swaps(&self, from: Position, to: Position, step: Step) -> bool {
        from != to
            && (0..self.state.num_ions()).any(|y| {
                y != self.ion
                    && self.state.position(y, step) == to
                    && self.state.position(y, step + 1) == from
            })
    }

    fn shares_with_partner(&self, pos: Position, step: Step) -> bool {
        matches!(self.partner_hold, Some((_, site, from)) if site == pos && step >= from)
    }
}

/// Space-time A* router
/// Gantree: RouteSearch // 시공간 탐색
#[derive(Debug, Clone, Copy)]
pub struct RouteSearch<'a> {
    sites: SiteGraph<'a>,
    step_cost: u64,
    hop_cost: u64,
    max_steps: Option<usize>,
}

impl<'a> RouteSearch<'a> {
    /// Router with per-step and per-hop costs
    pub fn new(graph: &'a TrapGraph, step_cost: u32, hop_cost: u32) -> Self {
        Self {
            sites: SiteGraph::new(graph),
            step_cost: u64::from(step_cost.max(1)),
            hop_cost: u64::from(hop_cost),
            max_steps: None,
        }
    }

    /// Never place the ion at or after step `limit`
    pub fn with_max_steps(mut self, limit: Option<usize>) -> Self {
        self.max_steps = limit;
        self
    }

    /// Site view
    pub fn sites(&self) -> SiteGraph<'a> {
        self.sites
    }

    /// Cheapest route for `ion` from its end step to `goal`, ending before
    /// the step limit when one is set.
    ///
    /// With `partner` set and a goal node the partner already holds, the ion
    /// may join the partner there; such a shared state is never expanded.
    pub fn find(
        &self,
        state: &SearchState,
        ion: IonId,
        goal: &Goal,
        partner: Option<IonId>,
    ) -> Option<Route> {
        let graph = self.sites.graph();
        let start_step = state.end_step(ion);
        let start = state.last(ion);

        let partner_hold = match (goal, partner) {
            (Goal::At(n), Some(p)) if graph.is_interaction(*n) && state.last(p) == Position::At(*n) => {
                Some((p, Position::At(*n), state.hold_start(p)))
            }
            _ => None,
        };
        let co_located = if start.active_node().is_some_and(|n| graph.is_interaction(n)) {
            state.occupants(start, start_step, ion)
        } else {
            Vec::new()
        };
        let rules = Rules {
            state,
            ion,
            partner_hold,
            co_located,
            start,
        };

        let heuristic = self.sites.distances_to(|p| goal.accepts(graph, p));
        heuristic[self.sites.index(start)]?;
        let busy = self.last_busy(&rules);
        let free_after = |pos: Position, step: Step| {
            busy[self.sites.index(pos)].map_or(true, |b| b < step)
        };
        let settles = |pos: Position, step: Step| {
            goal.accepts(graph, pos)
                && free_after(pos, step)
                && match pos {
                    Position::At(n) if graph.is_standard(n) => {
                        free_after(Position::Idle(n), step)
                    }
                    _ => true,
                }
        };

        // beyond this step every other ion is parked for good
        let static_step = (0..state.num_ions())
            .filter(|&y| y != ion)
            .map(|y| state.end_step(y))
            .max()
            .unwrap_or(0)
            .max(start_step);
        let per_hop = self.step_cost + self.hop_cost;

        let mut arena = vec![SearchNode {
            pos: start,
            step: start_step,
            cost: 0,
            moves: 0,
            parent: None,
        }];
        let mut open = BinaryHeap::new();
        let h0 = heuristic[self.sites.index(start)].unwrap_or(0) as u64 * per_hop;
        open.push(Reverse((h0, 0usize)));
        let mut closed: HashSet<(usize, Step, bool)> = HashSet::new();

        while let Some(Reverse((_, idx))) = open.pop() {
            let node = arena[idx];
            let fresh = node.moves == 0;
            let key = (
                self.sites.index(node.pos),
                node.step.min(static_step + 1),
                fresh,
            );
            if !closed.insert(key) {
                continue;
            }

            if settles(node.pos, node.step) {
                trace!(
                    "ion {} routed to {} at step {} ({} expansions)",
                    ion,
                    node.pos,
                    node.step,
                    closed.len()
                );
                return Some(Self::reconstruct(&arena, idx, ion, start_step));
            }
            if node.moves > 0 && rules.shares_with_partner(node.pos, node.step) {
                continue;
            }

            let next_step = node.step + 1;
            if self.max_steps.is_some_and(|limit| next_step >= limit) {
                continue;
            }
            let mut candidates = vec![node.pos];
            candidates.extend(self.sites.neighbors(node.pos));
            for next in candidates {
                let hop = next != node.pos;
                let next_fresh = fresh && !hop;
                let Some(dist) = heuristic[self.sites.index(next)] else {
                    continue;
                };
                if rules.blocked(next, next_step, next_fresh)
                    || rules.swaps(node.pos, next, node.step)
                {
                    continue;
                }
                let cost = node.cost + self.step_cost + if hop { self.hop_cost } else { 0 };
                arena.push(SearchNode {
                    pos: next,
                    step: next_step,
                    cost,
                    moves: node.moves + usize::from(hop),
                    parent: Some(idx),
                });
                open.push(Reverse((cost + dist as u64 * per_hop, arena.len() - 1)));
            }
        }

        trace!("ion {} has no route to {:?}", ion, goal);
        None
    }

    /// Last step each site is used by another ion; `usize::MAX` for holds
    fn last_busy(&self, rules: &Rules<'_>) -> Vec<Option<Step>> {
        let state = rules.state;
        let mut busy: Vec<Option<Step>> = vec![None; self.sites.num_sites()];
        for y in (0..state.num_ions()).filter(|&y| y != rules.ion) {
            for (t, &pos) in state.trajectory(y).iter().enumerate() {
                if !rules.partner_exempt(y, pos, t) {
                    let slot = &mut busy[self.sites.index(pos)];
                    *slot = Some(slot.map_or(t, |b| b.max(t)));
                }
            }
            let last = state.last(y);
            if !rules.partner_exempt(y, last, usize::MAX) {
                busy[self.sites.index(last)] = Some(usize::MAX);
            }
        }
        busy
    }

    fn reconstruct(arena: &[SearchNode], mut idx: usize, ion: IonId, start: Step) -> Route {
        let moves = arena[idx].moves;
        let mut positions = Vec::new();
        while let Some(parent) = arena[idx].parent {
            positions.push(arena[idx].pos);
            idx = parent;
        }
        positions.reverse();
        Route {
            ion,
            start,
            positions,
            moves,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // S0 S1 I2 S3 S4
    fn line() -> TrapGraph {
        TrapGraph::line_with_center_interaction(4)
    }

    #[test]
    fn test_goal_accepts() {
        let g = line();
        assert!(Goal::At(2).accepts(&g, Position::At(2)));
        assert!(!Goal::At(2).accepts(&g, Position::Idle(1)));
        assert!(Goal::AnyStandard.accepts(&g, Position::At(0)));
        assert!(!Goal::AnyStandard.accepts(&g, Position::At(2)));
        assert!(Goal::Park.accepts(&g, Position::Idle(3)));
        assert!(!Goal::StandardAvoiding(vec![0, 1]).accepts(&g, Position::At(1)));
        assert!(Goal::StandardAvoiding(vec![0, 1]).accepts(&g, Position::At(3)));
    }

    #[test]
    fn test_direct_route() {
        let g = line();
        let s = SearchState::from_positions(vec![Position::At(0)]);
        let route = RouteSearch::new(&g, 2, 1)
            .find(&s, 0, &Goal::At(2), None)
            .unwrap();
        assert_eq!(route.positions, vec![Position::At(1), Position::At(2)]);
        assert_eq!(route.moves, 2);
        assert_eq!(route.arrival(), 2);
    }

    #[test]
    fn test_step_limit() {
        let g = line();
        let s = SearchState::from_positions(vec![Position::At(0)]);
        // arriving at node 2 takes frames 0, 1 and 2
        let tight = RouteSearch::new(&g, 2, 1).with_max_steps(Some(2));
        assert!(tight.find(&s, 0, &Goal::At(2), None).is_none());
        let enough = RouteSearch::new(&g, 2, 1).with_max_steps(Some(3));
        assert_eq!(enough.find(&s, 0, &Goal::At(2), None).unwrap().arrival(), 2);
    }

    #[test]
    fn test_already_at_goal() {
        let g = line();
        let s = SearchState::from_positions(vec![Position::At(1)]);
        let route = RouteSearch::new(&g, 2, 1)
            .find(&s, 0, &Goal::AnyStandard, None)
            .unwrap();
        assert!(route.is_empty());
        assert_eq!(route.end(), None);
    }

    #[test]
    fn test_waits_for_passing_ion() {
        let g = line();
        // ion 1 leaves the interaction node through node 3
        let mut s = SearchState::from_positions(vec![Position::At(0), Position::At(2)]);
        s.commit(&Route {
            ion: 1,
            start: 0,
            positions: vec![Position::At(3), Position::At(4)],
            moves: 2,
        });
        let route = RouteSearch::new(&g, 2, 1)
            .find(&s, 0, &Goal::At(3), None)
            .unwrap();
        // node 3 is used by ion 1 at step 1, so arrival must come later
        assert!(route.arrival() >= 3);
        for (i, &pos) in route.positions.iter().enumerate() {
            assert_ne!(pos, s.position(1, i + 1));
        }
    }

    #[test]
    fn test_blocked_by_hold() {
        let g = line();
        let s = SearchState::from_positions(vec![Position::At(0), Position::At(1)]);
        let search = RouteSearch::new(&g, 2, 1);
        assert!(search.find(&s, 0, &Goal::At(2), None).is_none());
        // the slot of node 0 is still reachable
        let park = search.find(&s, 0, &Goal::Park, None).unwrap();
        assert_eq!(park.positions, vec![Position::Idle(0)]);
    }

    #[test]
    fn test_partner_join() {
        let g = line();
        let s = SearchState::from_positions(vec![Position::At(2), Position::At(3)]);
        let search = RouteSearch::new(&g, 2, 1);
        assert!(search.find(&s, 1, &Goal::At(2), None).is_none());
        let route = search.find(&s, 1, &Goal::At(2), Some(0)).unwrap();
        assert_eq!(route.positions, vec![Position::At(2)]);
    }

    #[test]
    fn test_no_swap() {
        let g = line();
        // ion 1 moves 1 -> 0 while ion 0 would move 0 -> 1
        let mut s = SearchState::from_positions(vec![Position::At(0), Position::At(1)]);
        s.commit(&Route {
            ion: 1,
            start: 0,
            positions: vec![Position::At(0), Position::Idle(0)],
            moves: 2,
        });
        let route = RouteSearch::new(&g, 2, 1).find(&s, 0, &Goal::At(1), None);
        // staying collides, moving swaps, and the slot is a dead end
        assert!(route.is_none());
    }

    #[test]
    fn test_leave_shared_interaction_node() {
        let g = line();
        let mut s = SearchState::from_positions(vec![Position::At(2), Position::At(2)]);
        s.hold_until(0, 3);
        s.hold_until(1, 3);
        let search = RouteSearch::new(&g, 2, 1);
        let route = search.find(&s, 0, &Goal::AnyStandard, None).unwrap();
        assert_eq!(route.positions.len(), 1);
        assert!(g.is_standard(route.positions[0].node()));
    }
}

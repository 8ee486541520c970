//! Shuttling planner
//!
//! Gantree: L4_Shuttle → ShuttlingPlanner
//!
//! Builds on `RouteSearch`: brings ions to standard nodes, meets MS pairs on
//! an interaction node, and clears blocking ions into rest slots when the
//! direct search fails.

use crate::route::{Goal, Route, RouteSearch};
use crate::site::SiteGraph;
use crate::state::SearchState;
use log::{debug, trace, warn};
use penning_core::{IonId, NodeId, PenningError, PenningResult, Position, Step, TrapGraph};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

/// Extra cost for crossing a site held by an evictable ion
const HOLD_PENALTY: usize = 6;

/// Meeting scores closer than this are tied
const SCORE_EPSILON: f64 = 1e-9;

// ============================================================================
// Config
// ============================================================================

/// Planner tuning
/// Gantree: PlannerConfig // 경로 계획 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Route cost per elapsed step
    pub step_cost: u32,
    /// Route cost per position change
    pub hop_cost: u32,
    /// Interaction nodes trial-planned per MS
    pub interaction_candidates: usize,
    /// Eviction rounds before a route is declared blocked
    pub max_eviction_rounds: usize,
    /// Nesting of evictions (an evicted ion may evict others)
    pub eviction_depth: usize,
    /// Frames the plan may span; nothing is placed at or after this step
    #[serde(default)]
    pub max_steps: Option<usize>,
    /// Meeting score per added position change
    #[serde(default = "default_move_weight")]
    pub move_weight: f64,
    /// Meeting score per added ion-step on an interaction node
    #[serde(default = "default_dwell_weight")]
    pub dwell_weight: f64,
    /// Meeting score per step of gate start
    #[serde(default)]
    pub start_weight: f64,
}

fn default_move_weight() -> f64 {
    1.0
}

fn default_dwell_weight() -> f64 {
    0.01
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            step_cost: 2,
            hop_cost: 1,
            interaction_candidates: 2,
            max_eviction_rounds: 4,
            eviction_depth: 3,
            max_steps: None,
            move_weight: default_move_weight(),
            dwell_weight: default_dwell_weight(),
            start_weight: 0.0,
        }
    }
}

impl PlannerConfig {
    /// Set route costs
    pub fn with_costs(mut self, step_cost: u32, hop_cost: u32) -> Self {
        self.step_cost = step_cost;
        self.hop_cost = hop_cost;
        self
    }

    /// Set candidate count
    pub fn with_interaction_candidates(mut self, n: usize) -> Self {
        self.interaction_candidates = n;
        self
    }

    /// Set eviction limits
    pub fn with_eviction(mut self, rounds: usize, depth: usize) -> Self {
        self.max_eviction_rounds = rounds;
        self.eviction_depth = depth;
        self
    }

    /// Set the step budget (None lets plans grow freely)
    pub fn with_max_steps(mut self, steps: Option<usize>) -> Self {
        self.max_steps = steps;
        self
    }

    /// Set meeting selection weights
    pub fn with_meeting_weights(mut self, moves: f64, dwell: f64, start: f64) -> Self {
        self.move_weight = moves;
        self.dwell_weight = dwell;
        self.start_weight = start;
        self
    }

    /// Check whether a gate window fits the step budget
    pub fn fits(&self, start: Step, duration: usize) -> bool {
        self.max_steps.map_or(true, |limit| start + duration <= limit)
    }

    /// Weighted meeting score
    pub fn meeting_score(&self, meeting: &Meeting) -> f64 {
        self.move_weight * meeting.moves as f64
            + self.dwell_weight * meeting.dwell as f64
            + self.start_weight * meeting.start as f64
    }

    /// Validate
    pub fn validate(&self) -> Result<(), String> {
        if self.step_cost == 0 {
            return Err("step_cost must be positive".into());
        }
        if self.interaction_candidates == 0 {
            return Err("interaction_candidates must be at least 1".into());
        }
        if self.max_steps == Some(0) {
            return Err("max_steps must be positive when set".into());
        }
        for (name, w) in [
            ("move_weight", self.move_weight),
            ("dwell_weight", self.dwell_weight),
            ("start_weight", self.start_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("{} must be finite and non-negative", name));
            }
        }
        Ok(())
    }

    fn budget_note(&self) -> String {
        match self.max_steps {
            Some(limit) => format!(" within {} steps", limit),
            None => String::new(),
        }
    }
}

impl fmt::Display for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Planner(step={}, hop={}, candidates={}, evictions={}x{}, max_steps={:?}, meeting={}/{}/{})",
            self.step_cost,
            self.hop_cost,
            self.interaction_candidates,
            self.max_eviction_rounds,
            self.eviction_depth,
            self.max_steps,
            self.move_weight,
            self.dwell_weight,
            self.start_weight
        )
    }
}

// ============================================================================
// Meetings
// ============================================================================

/// Request to co-locate an MS pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    /// Pair in gate order
    pub ions: [IonId; 2],
    /// Earliest start step
    pub not_before: Step,
    /// Steps waited after both ions arrive
    pub settle: usize,
    /// Steps the gate occupies
    pub duration: usize,
    /// Pinned interaction node
    pub preferred: Option<NodeId>,
    /// Route the second ion first
    pub second_first: bool,
}

impl MeetingRequest {
    /// Request with no pin, no settle delay and gate-order routing
    pub fn new(a: IonId, b: IonId, not_before: Step, duration: usize) -> Self {
        Self {
            ions: [a, b],
            not_before,
            settle: 0,
            duration,
            preferred: None,
            second_first: false,
        }
    }
}

/// Planned MS meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meeting {
    /// Interaction node used
    pub node: NodeId,
    /// First step of the gate
    pub start: Step,
    /// Position changes added to the plan, evictions included
    pub moves: usize,
    /// Ion-steps on interaction nodes added to the plan, gate window included
    pub dwell: usize,
}

// ============================================================================
// Planner
// ============================================================================

/// Conflict-free shuttling planner
/// Gantree: ShuttlingPlanner // 셔틀링 계획
#[derive(Debug, Clone)]
pub struct ShuttlingPlanner<'a> {
    graph: &'a TrapGraph,
    config: PlannerConfig,
    search: RouteSearch<'a>,
}

impl<'a> ShuttlingPlanner<'a> {
    /// Planner over a trap
    pub fn new(graph: &'a TrapGraph, config: PlannerConfig) -> Self {
        let search = RouteSearch::new(graph, config.step_cost, config.hop_cost)
            .with_max_steps(config.max_steps);
        Self {
            graph,
            config,
            search,
        }
    }

    /// Trap in use
    pub fn graph(&self) -> &'a TrapGraph {
        self.graph
    }

    /// Config in use
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Route `ion` to any standard node and commit it; returns the arrival step
    pub fn bring_to_standard(&self, state: &mut SearchState, ion: IonId) -> PenningResult<Step> {
        let route = self
            .route(state, ion, &Goal::AnyStandard, None, &[], self.config.eviction_depth)
            .ok_or_else(|| {
                PenningError::infeasible(format!(
                    "ion {} cannot reach a free standard node from {}{}",
                    ion,
                    state.last(ion),
                    self.config.budget_note()
                ))
            })?;
        state.commit(&route);
        Ok(state.end_step(ion))
    }

    /// Bring both ions of an MS gate to one interaction node and hold them
    /// there for the gate window
    /// Gantree: plan_meeting(state, request) -> Meeting // MS 만남 계획
    pub fn plan_meeting(
        &self,
        state: &mut SearchState,
        request: &MeetingRequest,
    ) -> PenningResult<Meeting> {
        let [a, b] = request.ions;
        if self.graph.interaction_nodes().is_empty() {
            return Err(PenningError::infeasible(format!(
                "trap has no interaction node for MS on ions {} and {}",
                a, b
            )));
        }

        let mut ranked = self.rank_interaction_nodes(state, a, b);
        let width = match request.preferred {
            Some(pin) if ranked.contains(&pin) => {
                ranked.retain(|&n| n != pin);
                ranked.insert(0, pin);
                1
            }
            _ => self.config.interaction_candidates.max(1),
        };

        let mut best: Option<(Meeting, SearchState)> = None;
        for (i, &node) in ranked.iter().enumerate() {
            if i >= width && best.is_some() {
                break;
            }
            let mut trial = state.clone();
            match self.meet_at(&mut trial, request, node) {
                Some(meeting) => {
                    trace!(
                        "MS({}, {}) candidate node {}: start {}, {} moves, dwell {}",
                        a,
                        b,
                        node,
                        meeting.start,
                        meeting.moves,
                        meeting.dwell
                    );
                    let better = best
                        .as_ref()
                        .map_or(true, |(current, _)| self.prefers(&meeting, current));
                    if better {
                        best = Some((meeting, trial));
                    }
                }
                None => debug!("MS({}, {}) cannot meet at node {}", a, b, node),
            }
        }

        match best {
            Some((meeting, planned)) => {
                *state = planned;
                Ok(meeting)
            }
            None => {
                warn!("MS({}, {}) found no meeting node", a, b);
                Err(PenningError::infeasible(format!(
                    "no interaction node reachable by both ions {} and {}{}",
                    a,
                    b,
                    self.config.budget_note()
                )))
            }
        }
    }

    /// Lower weighted score wins; near-equal scores fall back to fewer
    /// moves, then less dwell, then the earlier start
    fn prefers(&self, candidate: &Meeting, current: &Meeting) -> bool {
        let (new, old) = (
            self.config.meeting_score(candidate),
            self.config.meeting_score(current),
        );
        if (new - old).abs() > SCORE_EPSILON {
            return new < old;
        }
        (candidate.moves, candidate.dwell, candidate.start)
            < (current.moves, current.dwell, current.start)
    }

    /// Move every ion left on an interaction node to a standard node
    pub fn park_interaction_ions(&self, state: &mut SearchState) -> PenningResult<()> {
        for ion in 0..state.num_ions() {
            let on_interaction = state
                .last(ion)
                .active_node()
                .is_some_and(|n| self.graph.is_interaction(n));
            if on_interaction {
                self.bring_to_standard(state, ion)?;
            }
        }
        Ok(())
    }

    /// Interaction nodes ordered by combined distance from both ions
    pub fn rank_interaction_nodes(&self, state: &SearchState, a: IonId, b: IonId) -> Vec<NodeId> {
        let distance = |ion: IonId, node: NodeId| {
            let pos = state.last(ion);
            let extra = usize::from(pos.is_idle());
            self.graph.distance(pos.node(), node).map(|d| d + extra)
        };
        let mut scored: Vec<((usize, usize, NodeId), NodeId)> = self
            .graph
            .interaction_nodes()
            .into_iter()
            .filter_map(|n| {
                let (da, db) = (distance(a, n)?, distance(b, n)?);
                Some(((da + db, da.max(db), n), n))
            })
            .collect();
        scored.sort();
        scored.into_iter().map(|(_, n)| n).collect()
    }

    fn meet_at(
        &self,
        state: &mut SearchState,
        request: &MeetingRequest,
        node: NodeId,
    ) -> Option<Meeting> {
        let [a, b] = request.ions;
        let orders = if request.second_first {
            [(b, a), (a, b)]
        } else {
            [(a, b), (b, a)]
        };
        for (first, second) in orders {
            let mut trial = state.clone();
            if let Some(meeting) = self.meet_in_order(&mut trial, request, node, first, second) {
                *state = trial;
                return Some(meeting);
            }
        }
        None
    }

    fn meet_in_order(
        &self,
        state: &mut SearchState,
        request: &MeetingRequest,
        node: NodeId,
        first: IonId,
        second: IonId,
    ) -> Option<Meeting> {
        let before = state.total_moves();
        let dwell_before = self.interaction_frames(state);
        let goal = Goal::At(node);
        let depth = self.config.eviction_depth;

        let lead = self.route(state, first, &goal, Some(second), &[], depth)?;
        state.commit(&lead);
        let follow = self.route(state, second, &goal, Some(first), &[first], depth)?;
        state.commit(&follow);

        let start = state
            .end_step(first)
            .max(state.end_step(second))
            .max(request.not_before)
            + request.settle;
        if !self.config.fits(start, request.duration) {
            trace!(
                "MS on ions {} and {} at node {} would end after step {:?}",
                first,
                second,
                node,
                self.config.max_steps
            );
            return None;
        }
        state.hold_until(first, start + request.duration);
        state.hold_until(second, start + request.duration);

        Some(Meeting {
            node,
            start,
            moves: state.total_moves() - before,
            dwell: self.interaction_frames(state) - dwell_before,
        })
    }

    fn interaction_frames(&self, state: &SearchState) -> usize {
        state.frames_on(|pos| {
            pos.active_node()
                .is_some_and(|n| self.graph.is_interaction(n))
        })
    }

    // ========================================================================
    // Eviction
    // ========================================================================

    /// Route search with blocker eviction. Evictions are committed to
    /// `state`; the returned route is not.
    fn route(
        &self,
        state: &mut SearchState,
        ion: IonId,
        goal: &Goal,
        partner: Option<IonId>,
        protected: &[IonId],
        depth: usize,
    ) -> Option<Route> {
        let rounds = self.config.max_eviction_rounds;
        for round in 0..=rounds {
            if let Some(route) = self.search.find(state, ion, goal, partner) {
                return Some(route);
            }
            if depth == 0 || round == rounds {
                break;
            }

            let path = self.relaxed_path(state, ion, goal, partner, protected)?;
            let blockers = self.blockers(state, &path, ion, goal, partner, protected);
            if blockers.is_empty() {
                break;
            }
            debug!(
                "ion {} blocked toward {:?}; evicting {:?} (round {})",
                ion, goal, blockers, round
            );

            // the routing ion itself may be moved aside by a nested eviction;
            // the next round searches again from its new end
            let avoid: Vec<NodeId> = path.iter().map(Position::node).collect();
            let mut moved = false;
            for y in blockers {
                moved |= self.evict(state, y, &avoid, protected, depth - 1);
            }
            if !moved {
                break;
            }
        }
        debug!("ion {} has no conflict-free route to {:?}", ion, goal);
        None
    }

    fn evict(
        &self,
        state: &mut SearchState,
        ion: IonId,
        avoid: &[NodeId],
        protected: &[IonId],
        depth: usize,
    ) -> bool {
        let current = state.last(ion);
        for goal in [Goal::Park, Goal::StandardAvoiding(avoid.to_vec())] {
            if let Some(route) = self.route(state, ion, &goal, None, protected, depth) {
                if route.end().is_some_and(|end| end != current) {
                    trace!("evicted ion {} to {:?}", ion, route.end());
                    state.commit(&route);
                    return true;
                }
            }
        }
        false
    }

    /// Cheapest time-free path to `goal` where held sites cost extra and
    /// sites held by protected ions are walls. Only interaction goals may be
    /// occupied; a standard goal also needs an empty rest slot. Includes the
    /// start site.
    fn relaxed_path(
        &self,
        state: &SearchState,
        ion: IonId,
        goal: &Goal,
        partner: Option<IonId>,
        protected: &[IonId],
    ) -> Option<Vec<Position>> {
        let sites = SiteGraph::new(self.graph);
        let start = state.last(ion);
        let mut dist = vec![usize::MAX; sites.num_sites()];
        let mut prev: Vec<Option<Position>> = vec![None; sites.num_sites()];
        let mut heap = BinaryHeap::new();
        dist[sites.index(start)] = 0;
        heap.push(Reverse((0usize, sites.index(start))));

        while let Some(Reverse((d, idx))) = heap.pop() {
            if d > dist[idx] {
                continue;
            }
            let pos = sites.position(idx);
            let vacant = match pos {
                Position::At(n) if self.graph.is_standard(n) => {
                    state.holders(pos, ion).is_empty()
                        && state.holders(Position::Idle(n), ion).is_empty()
                }
                Position::Idle(_) => state.holders(pos, ion).is_empty(),
                Position::At(_) => true,
            };
            if goal.accepts(self.graph, pos) && vacant {
                let mut path = vec![pos];
                let mut cur = pos;
                while let Some(p) = prev[sites.index(cur)] {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
            for next in sites.neighbors(pos) {
                let (walled, held) = self.hold_kind(state, next, ion, goal, partner, protected);
                if walled {
                    continue;
                }
                let step = if held { 1 + HOLD_PENALTY } else { 1 };
                let nd = d + step;
                let ni = sites.index(next);
                if nd < dist[ni] {
                    dist[ni] = nd;
                    prev[ni] = Some(pos);
                    heap.push(Reverse((nd, ni)));
                }
            }
        }
        None
    }

    /// Whether `pos` is held by a protected ion (a wall) and whether it is
    /// held by an evictable one
    fn hold_kind(
        &self,
        state: &SearchState,
        pos: Position,
        ion: IonId,
        goal: &Goal,
        partner: Option<IonId>,
        protected: &[IonId],
    ) -> (bool, bool) {
        let mut walled = false;
        let mut held = false;
        for y in state.holders(pos, ion) {
            if Some(y) == partner && goal.accepts(self.graph, pos) {
                continue;
            }
            if protected.contains(&y) {
                walled = true;
            } else {
                held = true;
            }
        }
        (walled, held)
    }

    /// Evictable holders along a relaxed path. The start site only counts
    /// when the ion is already at an accepted but occupied goal.
    fn blockers(
        &self,
        state: &SearchState,
        path: &[Position],
        ion: IonId,
        goal: &Goal,
        partner: Option<IonId>,
        protected: &[IonId],
    ) -> Vec<IonId> {
        let skip = usize::from(!path.first().is_some_and(|&p| goal.accepts(self.graph, p)));
        let mut out = Vec::new();
        for &pos in path.iter().skip(skip) {
            for y in state.holders(pos, ion) {
                let waiting_partner = Some(y) == partner && goal.accepts(self.graph, pos);
                if !waiting_partner && !protected.contains(&y) && !out.contains(&y) {
                    out.push(y);
                }
            }
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{Coord, InitialLayout, NodeKind, TrapNode};

    // S0 S1 S2 S3 I4 S5 S6 S7 S8
    fn line8() -> TrapGraph {
        TrapGraph::line_with_center_interaction(8)
    }

    fn line_state(graph: &TrapGraph) -> SearchState {
        SearchState::new(&InitialLayout::default_for(graph, 8).unwrap())
    }

    #[test]
    fn test_config_validation() {
        assert!(PlannerConfig::default().validate().is_ok());
        assert!(PlannerConfig::default().with_costs(0, 1).validate().is_err());
        assert!(PlannerConfig::default()
            .with_interaction_candidates(0)
            .validate()
            .is_err());
        assert!(PlannerConfig::default()
            .with_max_steps(Some(0))
            .validate()
            .is_err());
        assert!(PlannerConfig::default()
            .with_meeting_weights(1.0, -0.5, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_meeting_respects_step_budget() {
        let g = line8();
        let request = MeetingRequest::new(3, 4, 0, 2);

        // both ions reach node 4 at step 1, so the gate needs frames 1 and 2
        let fits = ShuttlingPlanner::new(&g, PlannerConfig::default().with_max_steps(Some(3)));
        let mut state = line_state(&g);
        let meeting = fits.plan_meeting(&mut state, &request).unwrap();
        assert_eq!(meeting.start, 1);
        assert_eq!(state.horizon(), 3);

        let tight = ShuttlingPlanner::new(&g, PlannerConfig::default().with_max_steps(Some(2)));
        let mut state = line_state(&g);
        let err = tight.plan_meeting(&mut state, &request).unwrap_err();
        assert!(err.is_topology_error());
        assert!(err.to_string().contains("within 2 steps"));
        assert_eq!(state, line_state(&g));
    }

    //  X0 - P1 - B2
    //  |          |
    //  A3 - P4 - Y5 - D6
    fn two_site_trap() -> TrapGraph {
        let node = |id: usize, x: i32, y: i32, kind: NodeKind| {
            TrapNode::new(id, Coord::new(x, y), kind)
        };
        TrapGraph::new(
            vec![
                node(0, 0, 0, NodeKind::Interaction),
                node(1, 0, 1, NodeKind::Standard),
                node(2, 0, 2, NodeKind::Standard),
                node(3, 1, 0, NodeKind::Standard),
                node(4, 1, 1, NodeKind::Standard),
                node(5, 1, 2, NodeKind::Interaction),
                node(6, 2, 2, NodeKind::Standard),
            ],
            vec![(0, 1), (1, 2), (0, 3), (3, 4), (4, 5), (2, 5), (5, 6)],
        )
        .unwrap()
    }

    // ion 0 on A3, ion 1 on B2, ion 2 holds Y5 until step 2 and then leaves
    // for D6. Node 0 starts at step 2 with 5 dwell steps; node 5 starts at
    // step 3 with 4. Both cost 3 moves.
    fn two_site_state() -> SearchState {
        let mut state = SearchState::from_positions(vec![
            Position::At(3),
            Position::At(2),
            Position::At(5),
        ]);
        state.commit(&Route {
            ion: 2,
            start: 0,
            positions: vec![Position::At(5), Position::At(5), Position::At(6)],
            moves: 1,
        });
        state
    }

    #[test]
    fn test_meeting_prefers_less_dwell() {
        let g = two_site_trap();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = two_site_state();
        let meeting = planner
            .plan_meeting(&mut state, &MeetingRequest::new(0, 1, 0, 2))
            .unwrap();
        assert_eq!(meeting.node, 5);
        assert_eq!(meeting.moves, 3);
        assert_eq!(meeting.dwell, 4);
        assert_eq!(meeting.start, 3);
    }

    #[test]
    fn test_start_weight_prefers_early_meeting() {
        let g = two_site_trap();
        let config = PlannerConfig::default().with_meeting_weights(1.0, 0.0, 0.01);
        let planner = ShuttlingPlanner::new(&g, config);
        let mut state = two_site_state();
        let meeting = planner
            .plan_meeting(&mut state, &MeetingRequest::new(0, 1, 0, 2))
            .unwrap();
        assert_eq!(meeting.node, 0);
        assert_eq!(meeting.moves, 3);
        assert_eq!(meeting.dwell, 5);
        assert_eq!(meeting.start, 2);
    }

    #[test]
    fn test_meeting_neighbours() {
        let g = line8();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = line_state(&g);
        // ions 3 and 4 sit on nodes 3 and 5, either side of the interaction node
        let meeting = planner
            .plan_meeting(&mut state, &MeetingRequest::new(3, 4, 0, 2))
            .unwrap();
        assert_eq!(meeting.node, 4);
        assert_eq!(state.position(3, meeting.start), Position::At(4));
        assert_eq!(state.position(4, meeting.start + 1), Position::At(4));
        assert_eq!(state.end_step(3), meeting.start + 1);
    }

    #[test]
    fn test_meeting_with_eviction() {
        let g = line8();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = line_state(&g);
        // ion 1 on node 1 has ions 2 and 3 between it and the interaction node
        let meeting = planner
            .plan_meeting(&mut state, &MeetingRequest::new(1, 0, 0, 2))
            .unwrap();
        assert_eq!(state.position(0, meeting.start), Position::At(4));
        assert_eq!(state.position(1, meeting.start), Position::At(4));
        // the evicted ions moved off the main line
        assert!(state.last(2).is_idle() || state.last(3).is_idle());
    }

    #[test]
    fn test_settle_and_not_before() {
        let g = line8();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = line_state(&g);
        let mut request = MeetingRequest::new(3, 4, 10, 2);
        request.settle = 2;
        let meeting = planner.plan_meeting(&mut state, &request).unwrap();
        assert_eq!(meeting.start, 12);
    }

    #[test]
    fn test_no_interaction_node() {
        let g = TrapGraph::grid(2, 2, &[]).unwrap();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = SearchState::from_positions(vec![Position::At(0), Position::At(3)]);
        let err = planner
            .plan_meeting(&mut state, &MeetingRequest::new(0, 1, 0, 2))
            .unwrap_err();
        assert!(err.is_topology_error());
    }

    #[test]
    fn test_pinned_node() {
        let g = TrapGraph::penning();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = SearchState::new(&InitialLayout::default_for(&g, 8).unwrap());
        let pin = g.node_at((3, 5).into()).unwrap();
        let mut request = MeetingRequest::new(1, 0, 0, 2);
        request.preferred = Some(pin);
        let meeting = planner.plan_meeting(&mut state, &request).unwrap();
        assert_eq!(meeting.node, pin);
    }

    #[test]
    fn test_park_interaction_ions() {
        let g = line8();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let mut state = line_state(&g);
        planner
            .plan_meeting(&mut state, &MeetingRequest::new(3, 4, 0, 2))
            .unwrap();
        planner.park_interaction_ions(&mut state).unwrap();
        for ion in 0..8 {
            assert!(g.is_standard(state.last(ion).node()));
        }
    }

    #[test]
    fn test_rank_prefers_near_nodes() {
        let g = TrapGraph::penning();
        let planner = ShuttlingPlanner::new(&g, PlannerConfig::default());
        let state = SearchState::new(&InitialLayout::default_for(&g, 8).unwrap());
        // ions 0 and 1 start at (0,1) and (0,3)
        let ranked = planner.rank_interaction_nodes(&state, 0, 1);
        let first = g.coord(ranked[0]);
        assert_eq!(first.x, 1);
        assert_eq!(ranked.len(), 6);
    }
}

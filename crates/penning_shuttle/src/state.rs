//! Committed ion trajectories
//!
//! Gantree: L4_Shuttle → SearchState
//!
//! Every ion owns a trajectory starting at step 0. Past the end of its
//! trajectory an ion holds its last position, so the committed plan is
//! always a complete description of the trap from step 0 onwards.

use crate::route::Route;
use penning_core::{InitialLayout, IonId, Position, PositionsHistory, Step};

/// Committed per-ion trajectories
/// Gantree: SearchState // 확정된 궤적
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    trajectories: Vec<Vec<Position>>,
}

impl SearchState {
    /// One-frame state from an initial layout
    pub fn new(layout: &InitialLayout) -> Self {
        Self::from_positions(layout.nodes().iter().map(|&n| Position::At(n)).collect())
    }

    /// One-frame state from explicit positions
    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self {
            trajectories: positions.into_iter().map(|p| vec![p]).collect(),
        }
    }

    /// Number of ions
    pub fn num_ions(&self) -> usize {
        self.trajectories.len()
    }

    /// Last committed step of an ion
    pub fn end_step(&self, ion: IonId) -> Step {
        self.trajectories[ion].len() - 1
    }

    /// Largest trajectory length
    pub fn horizon(&self) -> usize {
        self.trajectories.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Position of an ion at any step, holding past the end
    pub fn position(&self, ion: IonId, step: Step) -> Position {
        let traj = &self.trajectories[ion];
        traj.get(step).copied().unwrap_or(traj[traj.len() - 1])
    }

    /// Final committed position
    pub fn last(&self, ion: IonId) -> Position {
        let traj = &self.trajectories[ion];
        traj[traj.len() - 1]
    }

    /// Committed positions of one ion
    pub fn trajectory(&self, ion: IonId) -> &[Position] {
        &self.trajectories[ion]
    }

    /// First step of the final run of equal positions
    pub fn hold_start(&self, ion: IonId) -> Step {
        let traj = &self.trajectories[ion];
        let last = traj[traj.len() - 1];
        traj.iter()
            .rposition(|&p| p != last)
            .map_or(0, |i| i + 1)
    }

    /// Extend an ion's trajectory with its last position up to `len` frames
    pub fn hold_until(&mut self, ion: IonId, len: usize) {
        let traj = &mut self.trajectories[ion];
        let last = traj[traj.len() - 1];
        if traj.len() < len {
            traj.resize(len, last);
        }
    }

    /// Append a route planned from the ion's current end step
    ///
    /// # Panics
    /// When the route was planned against a different end step.
    pub fn commit(&mut self, route: &Route) {
        assert_eq!(
            route.start,
            self.end_step(route.ion),
            "route for ion {} planned from step {} but trajectory ends at {}",
            route.ion,
            route.start,
            self.end_step(route.ion)
        );
        self.trajectories[route.ion].extend_from_slice(&route.positions);
    }

    /// Ions other than `except` at `pos` on `step`
    pub fn occupants(&self, pos: Position, step: Step, except: IonId) -> Vec<IonId> {
        (0..self.num_ions())
            .filter(|&y| y != except && self.position(y, step) == pos)
            .collect()
    }

    /// Ions other than `except` that end their trajectory at `pos`
    pub fn holders(&self, pos: Position, except: IonId) -> Vec<IonId> {
        (0..self.num_ions())
            .filter(|&y| y != except && self.last(y) == pos)
            .collect()
    }

    /// Step changes of one ion, rest-slot toggles included
    pub fn moves(&self, ion: IonId) -> usize {
        self.trajectories[ion]
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count()
    }

    /// Step changes of every ion
    pub fn total_moves(&self) -> usize {
        (0..self.num_ions()).map(|ion| self.moves(ion)).sum()
    }

    /// Committed ion-frames whose position satisfies `on`
    pub fn frames_on(&self, mut on: impl FnMut(Position) -> bool) -> usize {
        self.trajectories
            .iter()
            .flatten()
            .filter(|&&pos| on(pos))
            .count()
    }

    /// Frames `0..len` as a positions history
    pub fn to_history(&self, len: usize) -> PositionsHistory {
        PositionsHistory::from_frames(
            (0..len)
                .map(|t| (0..self.num_ions()).map(|ion| self.position(ion, t)).collect())
                .collect(),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::TrapGraph;

    fn state() -> SearchState {
        SearchState::from_positions(vec![Position::At(0), Position::At(3)])
    }

    #[test]
    fn test_hold_semantics() {
        let mut s = state();
        assert_eq!(s.position(0, 10), Position::At(0));
        s.hold_until(0, 4);
        assert_eq!(s.end_step(0), 3);
        assert_eq!(s.horizon(), 4);
        assert_eq!(s.hold_start(0), 0);
    }

    #[test]
    fn test_commit_route() {
        let mut s = state();
        let route = Route {
            ion: 1,
            start: 0,
            positions: vec![Position::At(2), Position::At(2)],
            moves: 1,
        };
        s.commit(&route);
        assert_eq!(s.end_step(1), 2);
        assert_eq!(s.hold_start(1), 1);
        assert_eq!(s.moves(1), 1);
        assert_eq!(s.occupants(Position::At(2), 5, 0), vec![1]);
        assert_eq!(s.holders(Position::At(2), 1), Vec::<IonId>::new());
    }

    #[test]
    fn test_frames_on() {
        let mut s = state();
        s.hold_until(1, 3);
        assert_eq!(s.frames_on(|p| p == Position::At(3)), 3);
        assert_eq!(s.frames_on(|p| p.is_idle()), 0);
    }

    #[test]
    #[should_panic]
    fn test_stale_route_panics() {
        let mut s = state();
        s.hold_until(1, 3);
        let route = Route {
            ion: 1,
            start: 0,
            positions: vec![Position::At(2)],
            moves: 1,
        };
        s.commit(&route);
    }

    #[test]
    fn test_history_from_layout() {
        let g = TrapGraph::penning();
        let layout = InitialLayout::default_for(&g, 8).unwrap();
        let s = SearchState::new(&layout);
        let h = s.to_history(3);
        assert_eq!(h.len(), 3);
        assert_eq!(h.num_ions(), 8);
        assert_eq!(h.frame(0), h.frame(2));
    }
}

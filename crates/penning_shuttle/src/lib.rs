//! # Penning Shuttle
//!
//! Conflict-free ion transport on the trap graph.
//!
//! ## Gantree Architecture
//!
//! ```text
//! penning_shuttle // L4: Shuttle
//!     SiteGraph // 노드 + 휴지 슬롯
//!     SearchState // 확정된 이온 궤적
//!     RouteSearch // 시공간 A*
//!         find(state, ion, goal, partner) -> Route
//!     ShuttlingPlanner // 만남, 축출, 주차
//!         plan_meeting() - MS 쌍 배치
//!         bring_to_standard() - 단일 이온 게이트용
//!     RestPass // 장기 대기 → 휴지 슬롯
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use penning_core::{InitialLayout, TrapGraph};
//! use penning_shuttle::{MeetingRequest, PlannerConfig, SearchState, ShuttlingPlanner};
//!
//! let graph = TrapGraph::penning();
//! let layout = InitialLayout::default_for(&graph, 8).unwrap();
//! let mut state = SearchState::new(&layout);
//! let planner = ShuttlingPlanner::new(&graph, PlannerConfig::default());
//!
//! let meeting = planner
//!     .plan_meeting(&mut state, &MeetingRequest::new(1, 0, 0, 2))
//!     .unwrap();
//! assert!(graph.is_interaction(meeting.node));
//! ```

#![warn(missing_docs)]

/// Site graph (Gantree: L4_Shuttle → SiteGraph)
pub mod site;

/// Committed trajectories (Gantree: L4_Shuttle → SearchState)
pub mod state;

/// Space-time A* (Gantree: L4_Shuttle → RouteSearch)
pub mod route;

/// Planner (Gantree: L4_Shuttle → ShuttlingPlanner)
pub mod planner;

/// Rest-slot pass (Gantree: L4_Shuttle → RestPass)
pub mod rest;

pub use planner::{Meeting, MeetingRequest, PlannerConfig, ShuttlingPlanner};
pub use rest::RestPass;
pub use route::{Goal, Route, RouteSearch};
pub use site::SiteGraph;
pub use state::SearchState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{CompiledProgram, GatesSchedule, InitialLayout, TrapGraph, Verifier};

    fn program_from(state: &SearchState, len: usize) -> CompiledProgram {
        let mut program = CompiledProgram::empty(state.num_ions(), 2);
        program.positions = state.to_history(len);
        program.schedule = GatesSchedule::with_len(len);
        program
    }

    #[test]
    fn test_meeting_moves_are_legal() {
        // meetings without gates leave unpaired sharing, movement itself is legal
        let graph = TrapGraph::line_with_center_interaction(8);
        let mut state = SearchState::new(&InitialLayout::default_for(&graph, 8).unwrap());
        let planner = ShuttlingPlanner::new(&graph, PlannerConfig::default());
        planner
            .plan_meeting(&mut state, &MeetingRequest::new(7, 0, 0, 2))
            .unwrap();
        planner.park_interaction_ions(&mut state).unwrap();

        let program = program_from(&state, state.horizon());
        let report = Verifier::new(&graph).verify(&program);
        assert!(report.violations.iter().all(|v| matches!(
            v,
            penning_core::Violation::UnpairedSharing { .. }
        )));
    }

    #[test]
    fn test_bring_to_standard_is_legal() {
        let graph = TrapGraph::penning();
        let mut state = SearchState::new(&InitialLayout::default_for(&graph, 8).unwrap());
        let planner = ShuttlingPlanner::new(&graph, PlannerConfig::default());
        planner
            .plan_meeting(&mut state, &MeetingRequest::new(2, 5, 0, 2))
            .unwrap();
        for ion in [2, 5] {
            planner.bring_to_standard(&mut state, ion).unwrap();
        }
        let program = program_from(&state, state.horizon());
        let report = Verifier::new(&graph).verify(&program);
        assert!(report.violations.iter().all(|v| matches!(
            v,
            penning_core::Violation::UnpairedSharing { .. }
        )));
        assert!(report.violations.len() <= 1);
    }
}

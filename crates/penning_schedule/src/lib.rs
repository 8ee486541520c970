//! # Penning Schedule
//!
//! Dependency-aware placement of native gates on the step axis, driving the
//! shuttling planner for every gate that needs ions moved.
//!
//! ## Gantree Architecture
//!
//! ```text
//! penning_schedule // L5: Schedule
//!     DependencyGraph // 이온별 선행 게이트
//!     Strategy // MS 순서, 노드 고정, 대기, 경로 순서
//!     GateScheduler // 게이트 배치
//!         schedule(native, layout, strategy) -> ScheduleOutcome
//!     PlacedGate // 배치 결과
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use penning_core::{InitialLayout, LogicalCircuit, TrapGraph, Verifier};
//! use penning_decompose::Decomposer;
//! use penning_schedule::prelude::*;
//! use penning_shuttle::PlannerConfig;
//!
//! let graph = TrapGraph::penning();
//! let native = Decomposer::default()
//!     .decompose(&LogicalCircuit::qft(8))
//!     .unwrap();
//! let layout = InitialLayout::default_for(&graph, 8).unwrap();
//!
//! let scheduler = GateScheduler::new(&graph, PlannerConfig::default(), ScheduleOptions::default());
//! let outcome = scheduler
//!     .schedule(&native, &layout, &Strategy::for_circuit(&native))
//!     .unwrap();
//! assert!(Verifier::new(&graph).verify(&outcome.program).is_valid());
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Gate dependencies (Gantree: L5_Schedule → DependencyGraph)
pub mod dependency;

/// Placed gates (Gantree: L5_Schedule → PlacedGate)
pub mod scheduled_gate;

/// Strategy (Gantree: L5_Schedule → Strategy)
pub mod strategy;

/// Scheduler (Gantree: L5_Schedule → GateScheduler)
pub mod scheduler;

// ============================================================================
// Re-exports
// ============================================================================

pub use dependency::DependencyGraph;
pub use scheduled_gate::{GateState, PlacedGate};
pub use scheduler::{GateScheduler, ScheduleOptions, ScheduleOutcome};
pub use strategy::Strategy;

// ============================================================================
// Prelude
// ============================================================================

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dependency::DependencyGraph;
    pub use crate::scheduled_gate::{GateState, PlacedGate};
    pub use crate::scheduler::{GateScheduler, ScheduleOptions, ScheduleOutcome};
    pub use crate::strategy::Strategy;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================

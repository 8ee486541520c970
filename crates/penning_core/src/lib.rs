//! # Penning Core
//!
//! Foundation types, the trap graph, and the compiled program model for the
//! Penning trap QFT compiler.
//!
//! ## Gantree Architecture
//!
//! ```text
//! penning_core // L0+L1+L2: Foundation + Circuit + Program
//!     L0_Foundation // 기반 타입/상수/에러
//!         CoreTypes // IonId, NodeId, Coord
//!         Constants // 트랩/컴파일러 상수
//!         Errors // PenningError
//!     L1_Circuit // 회로와 트랩
//!         Gate // LogicalGate, NativeGate
//!         Circuit // LogicalCircuit, NativeCircuit
//!         CircuitBuilder // 빌더 패턴
//!         Topology // TrapGraph
//!         InitialLayout // 초기 배치
//!     L2_Program // 결과 모델
//!         CompiledProgram // positions + schedule
//!         Verifier // 불변식 검증
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use penning_core::prelude::*;
//!
//! let qft = CircuitBuilder::new(8).qft().build();
//! assert!(qft.check_qft().is_ok());
//! assert_eq!(qft.count_controlled_phase(), 28);
//!
//! let trap = TrapGraph::penning();
//! assert_eq!(trap.interaction_nodes().len(), 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuits (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Trap graph (Gantree: L1_Circuit → Topology)
pub mod topology;

/// Initial layout (Gantree: L1_Circuit → InitialLayout)
pub mod layout;

/// Compiled program (Gantree: L2_Program → CompiledProgram)
pub mod program;

/// Verifier (Gantree: L2_Program → Verifier)
pub mod validation;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::{LogicalCircuit, NativeCircuit};
pub use constants::{compiler, trap};
pub use error::{PenningError, PenningResult};
pub use gate::{LogicalGate, NativeGate, NativeKind, Provenance};
pub use layout::InitialLayout;
pub use program::{
    CompiledProgram, GatesSchedule, Position, PositionEntry, PositionsHistory, ProgramExport,
    ScheduleStep,
};
pub use topology::{NodeKind, TrapGraph, TrapNode};
pub use types::{Angle, Coord, IonId, NodeId, QubitId, Step};
pub use validation::{VerificationReport, Verifier, Violation};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use penning_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::{LogicalCircuit, NativeCircuit};
    pub use crate::constants::{compiler, trap};
    pub use crate::error::{PenningError, PenningResult};
    pub use crate::gate::{LogicalGate, NativeGate, NativeKind, Provenance};
    pub use crate::layout::InitialLayout;
    pub use crate::program::{
        CompiledProgram, GatesSchedule, Position, PositionsHistory, ProgramExport, ScheduleStep,
    };
    pub use crate::topology::{NodeKind, TrapGraph, TrapNode};
    pub use crate::types::{Angle, Coord, IonId, NodeId, QubitId, Step};
    pub use crate::validation::{VerificationReport, Verifier, Violation};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

//! # Penning Engine
//!
//! Configuration, cost-driven strategy search and the staged compiler
//! pipeline for the 8-ion Penning trap QFT.
//!
//! ## Gantree Architecture
//!
//! ```text
//! penning_engine // L7: Integration
//!     CompilerConfig // 통합 설정
//!         default_8q(), quick(), thorough()
//!         to_planner_config(), to_cost_weights(), to_decompose_options()
//!     SearchCoordinator // 비용 탐색
//!         evaluate() - 스케줄 + 검증 + 비용
//!         search() - 국소 탐색 (Converged | BudgetExhausted)
//!     Pipeline // 단계별 실행
//!         decompose() → plan() → optimize() → verify()
//!     PenningCompiler // 원클릭 컴파일
//!         compile(), compile_qft(), export_json()
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use penning_engine::prelude::*;
//!
//! let compiler = PenningCompiler::penning(CompilerConfig::default_8q()).unwrap();
//! let result = compiler.compile_qft().unwrap();
//! println!("{}", result);
//! println!("{}", compiler.export_json(&result).unwrap());
//! ```
//!
//! ## Using Pipeline
//!
//! ```rust,no_run
//! use penning_core::LogicalCircuit;
//! use penning_engine::prelude::*;
//!
//! let mut pipeline = Pipeline::penning().unwrap();
//! pipeline.decompose(&LogicalCircuit::qft(8)).unwrap();
//! pipeline.plan().unwrap();
//! pipeline.optimize().unwrap();
//! pipeline.verify().unwrap();
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Configuration (Gantree: L7_Integration → CompilerConfig)
pub mod config;

/// Strategy search (Gantree: L7_Integration → SearchCoordinator)
pub mod search;

/// Pipeline (Gantree: L7_Integration → Pipeline)
pub mod pipeline;

/// Compiler facade (Gantree: L7_Integration → PenningCompiler)
pub mod compiler;

// ============================================================================
// Re-exports
// ============================================================================

pub use compiler::{CompilationExport, CompilationResult, PenningCompiler};
pub use config::{CompilerConfig, SearchMode, DEFAULT_SEED};
pub use pipeline::{Pipeline, PipelineStage, PipelineState};
pub use search::{Candidate, Move, SearchCoordinator, SearchOutcome, SearchStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use penning_engine::prelude::*;
    //! ```

    pub use crate::compiler::{CompilationResult, PenningCompiler};
    pub use crate::config::{CompilerConfig, SearchMode};
    pub use crate::pipeline::{Pipeline, PipelineStage};
    pub use crate::search::{SearchCoordinator, SearchStatus};
}

// ============================================================================
// Integration Tests
// ============================================================================

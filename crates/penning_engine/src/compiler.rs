//! Compiler facade
//!
//! Gantree: L7_Integration → PenningCompiler
//!
//! One-call compilation of a logical QFT to a verified trap program.

use crate::config::CompilerConfig;
use crate::pipeline::Pipeline;
use crate::search::{SearchOutcome, SearchStatus};
use penning_core::{
    CompiledProgram, InitialLayout, LogicalCircuit, PenningError, PenningResult, ProgramExport,
    TrapGraph,
};
use penning_cost::TemperatureReport;
use penning_schedule::{PlacedGate, Strategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Compilation result with search metrics
/// Gantree: CompilationResult // 컴파일 결과
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationResult {
    /// Verified program
    pub program: CompiledProgram,

    /// Temperature terms of the program
    pub report: TemperatureReport,

    /// Strategy that produced it
    pub strategy: Strategy,

    /// Gate placements
    pub placed: Vec<PlacedGate>,

    /// Search stop reason
    pub status: SearchStatus,

    /// Neighbours evaluated
    pub evaluations: usize,

    /// Accepted improvements
    pub improvements: usize,

    /// Cost of the stream-order strategy
    pub initial_cost: f64,

    /// Total compile time
    pub elapsed: Duration,
}

impl CompilationResult {
    /// Build from a finished search
    pub fn from_search(search: SearchOutcome, elapsed: Duration) -> Self {
        Self {
            program: search.best.program,
            report: search.best.report,
            strategy: search.best.strategy,
            placed: search.best.placed,
            status: search.status,
            evaluations: search.evaluations,
            improvements: search.improvements,
            initial_cost: search.initial_cost,
            elapsed,
        }
    }

    /// Weighted temperature cost
    pub fn cost(&self) -> f64 {
        self.report.total_cost
    }

    /// Program length in steps
    pub fn num_steps(&self) -> usize {
        self.program.num_steps()
    }

    /// Main-graph hops
    pub fn shuttles(&self) -> usize {
        self.report.shuttles
    }

    /// Cost saved by the search
    pub fn improvement(&self) -> f64 {
        self.initial_cost - self.cost()
    }

    /// False when the search stopped on its budget
    pub fn is_proven_optimal(&self) -> bool {
        self.status.is_converged()
    }

    /// Coordinate-based export with the temperature report
    pub fn export(&self, graph: &TrapGraph) -> CompilationExport {
        CompilationExport {
            program: self.program.export(graph),
            temperature: self.report.clone(),
            status: self.status,
            evaluations: self.evaluations,
            initial_cost: self.initial_cost,
        }
    }

    /// Export as pretty JSON
    pub fn to_json(&self, graph: &TrapGraph) -> PenningResult<String> {
        Ok(serde_json::to_string_pretty(&self.export(graph))?)
    }
}

impl fmt::Display for CompilationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps, {} shuttles, cost {:.3} (from {:.3}), {} after {} evaluations",
            self.num_steps(),
            self.shuttles(),
            self.cost(),
            self.initial_cost,
            self.status,
            self.evaluations
        )
    }
}

/// JSON form of a compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationExport {
    /// `positions_history`, `gates_schedule` and friends
    #[serde(flatten)]
    pub program: ProgramExport,
    /// Temperature terms
    pub temperature: TemperatureReport,
    /// Search stop reason
    pub status: SearchStatus,
    /// Neighbours evaluated
    pub evaluations: usize,
    /// Cost of the stream-order strategy
    pub initial_cost: f64,
}

/// Penning trap QFT compiler
/// Gantree: PenningCompiler // 통합 컴파일러
pub struct PenningCompiler {
    config: CompilerConfig,
    graph: TrapGraph,
    layout: InitialLayout,
}

impl PenningCompiler {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a compiler for a trap and starting layout
    pub fn new(config: CompilerConfig, graph: TrapGraph, layout: InitialLayout) -> PenningResult<Self> {
        config.validate().map_err(PenningError::InvalidConfig)?;
        if layout.num_ions() != config.num_ions {
            return Err(PenningError::InvalidLayout(format!(
                "{} ions placed, configuration expects {}",
                layout.num_ions(),
                config.num_ions
            )));
        }
        Ok(Self {
            config,
            graph,
            layout,
        })
    }

    /// Compiler on the Penning grid with its default layout
    pub fn penning(config: CompilerConfig) -> PenningResult<Self> {
        let graph = TrapGraph::penning();
        let layout = InitialLayout::default_for(&graph, config.num_ions)?;
        Self::new(config, graph, layout)
    }

    /// Quick compiler on the Penning grid
    pub fn quick() -> PenningResult<Self> {
        Self::penning(CompilerConfig::quick())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Trap graph
    pub fn graph(&self) -> &TrapGraph {
        &self.graph
    }

    /// Starting layout
    pub fn layout(&self) -> &InitialLayout {
        &self.layout
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Compile a logical circuit
    /// Gantree: compile(circuit) -> CompilationResult // 컴파일
    pub fn compile(&self, circuit: &LogicalCircuit) -> PenningResult<CompilationResult> {
        let mut pipeline = Pipeline::new(
            self.config.clone(),
            self.graph.clone(),
            self.layout.clone(),
        );
        pipeline.run(circuit)
    }

    /// Compile the QFT over every ion
    pub fn compile_qft(&self) -> PenningResult<CompilationResult> {
        self.compile(&LogicalCircuit::qft(self.config.num_ions))
    }

    /// Export a result against this compiler's trap
    pub fn export_json(&self, result: &CompilationResult) -> PenningResult<String> {
        result.to_json(&self.graph)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{CircuitBuilder, Verifier};

    fn compiler() -> PenningCompiler {
        PenningCompiler::penning(CompilerConfig::quick().with_max_iterations(2)).unwrap()
    }

    #[test]
    fn test_compile_qft() {
        let compiler = compiler();
        let result = compiler.compile_qft().unwrap();
        assert_eq!(result.program.schedule.count_ms(), 28);
        assert!(Verifier::new(compiler.graph()).verify(&result.program).is_valid());
        assert!(result.cost() <= result.initial_cost);
        assert_eq!(result.program.output_order, vec![7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_export_shape() {
        let compiler = compiler();
        let result = compiler.compile_qft().unwrap();
        let json = compiler.export_json(&result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let history = value["positions_history"].as_array().unwrap();
        assert_eq!(history.len(), result.num_steps());
        assert_eq!(history[0].as_array().unwrap().len(), 8);
        assert!(value["gates_schedule"].is_array());
        assert!(value["temperature"]["total_cost"].is_number());
    }

    #[test]
    fn test_rejects_non_qft() {
        let circuit = CircuitBuilder::new(8).h(0).h(1).reverse_qubits().build();
        let err = compiler().compile(&circuit).unwrap_err();
        assert!(matches!(err, PenningError::InvalidLogicalCircuit(_)));
    }

    #[test]
    fn test_layout_must_match_config() {
        let graph = TrapGraph::penning();
        let layout = InitialLayout::default_for(&graph, 4).unwrap();
        let err = PenningCompiler::new(CompilerConfig::quick(), graph, layout)
            .err()
            .unwrap();
        assert!(matches!(err, PenningError::InvalidLayout(_)));
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = CompilerConfig::quick().with_batch_size(0);
        assert!(matches!(
            PenningCompiler::penning(config).err(),
            Some(PenningError::InvalidConfig(_))
        ));
    }
}

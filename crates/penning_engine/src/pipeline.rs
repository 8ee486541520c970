//! Pipeline for staged compilation
//!
//! Gantree: L7_Integration → Pipeline
//!
//! Decompose → plan → optimize → verify, keeping every intermediate result.

use crate::compiler::CompilationResult;
use crate::config::CompilerConfig;
use crate::search::{Candidate, SearchCoordinator, SearchOutcome};
use log::info;
use penning_core::{
    InitialLayout, LogicalCircuit, NativeCircuit, PenningError, PenningResult, TrapGraph,
    VerificationReport, Verifier,
};
use penning_decompose::Decomposer;
use penning_schedule::Strategy;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Nothing run yet
    Initial,
    /// Native gate stream built
    Decomposed,
    /// Stream-order candidate scheduled
    Planned,
    /// Strategy search finished
    Optimized,
    /// Best candidate verified
    Verified,
}

/// Pipeline state holding intermediate results
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Current stage
    pub stage: PipelineStage,

    /// Configuration
    pub config: CompilerConfig,

    /// Native gate stream
    pub native: Option<NativeCircuit>,

    /// Stream-order candidate
    pub initial: Option<Candidate>,

    /// Search result
    pub search: Option<SearchOutcome>,

    /// Verification of the best candidate
    pub verification: Option<VerificationReport>,
}

impl PipelineState {
    /// Create new pipeline state
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            stage: PipelineStage::Initial,
            config,
            native: None,
            initial: None,
            search: None,
            verification: None,
        }
    }

    /// Check if decomposed
    pub fn is_decomposed(&self) -> bool {
        self.native.is_some()
    }

    /// Check if planned
    pub fn is_planned(&self) -> bool {
        self.initial.is_some()
    }

    /// Check if optimized
    pub fn is_optimized(&self) -> bool {
        self.search.is_some()
    }
}

/// Staged compiler pipeline
/// Gantree: Pipeline // 단계별 실행
pub struct Pipeline {
    state: PipelineState,
    graph: TrapGraph,
    layout: InitialLayout,
}

impl Pipeline {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a pipeline for one trap and starting layout
    pub fn new(config: CompilerConfig, graph: TrapGraph, layout: InitialLayout) -> Self {
        Self {
            state: PipelineState::new(config),
            graph,
            layout,
        }
    }

    /// Default configuration on the Penning grid
    pub fn penning() -> PenningResult<Self> {
        let config = CompilerConfig::default_8q();
        let graph = TrapGraph::penning();
        let layout = InitialLayout::default_for(&graph, config.num_ions)?;
        Ok(Self::new(config, graph, layout))
    }

    // ========================================================================
    // Stage Accessors
    // ========================================================================

    /// Get current stage
    pub fn stage(&self) -> PipelineStage {
        self.state.stage
    }

    /// Get current state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Get configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.state.config
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
    // Pipeline Stages
    // ========================================================================

    /// Stage 1: Decompose
    ///
    /// Checks the logical circuit and lowers it to RX/RY/MS.
    pub fn decompose(&mut self, circuit: &LogicalCircuit) -> PenningResult<&NativeCircuit> {
        self.state
            .config
            .validate()
            .map_err(PenningError::InvalidConfig)?;

        let native = Decomposer::new(self.state.config.to_decompose_options()).decompose(circuit)?;
        if native.num_ions() != self.layout.num_ions() {
            return Err(PenningError::InvalidLayout(format!(
                "{} ions placed for a {}-qubit circuit",
                self.layout.num_ions(),
                native.num_ions()
            )));
        }

        self.state.initial = None;
        self.state.search = None;
        self.state.verification = None;
        self.state.stage = PipelineStage::Decomposed;
        Ok(self.state.native.insert(native))
    }

    /// Stage 2: Plan
    ///
    /// Schedules the stream-order strategy. Failure here is fatal.
    pub fn plan(&mut self) -> PenningResult<&Candidate> {
        let native = self.state.native.as_ref().ok_or_else(|| {
            PenningError::InternalError("plan requested before decomposition".into())
        })?;

        let coordinator =
            SearchCoordinator::new(&self.graph, native, &self.layout, &self.state.config);
        let candidate = coordinator.evaluate(&Strategy::for_circuit(native))?;

        self.state.stage = PipelineStage::Planned;
        Ok(self.state.initial.insert(candidate))
    }

    /// Stage 3: Optimize
    ///
    /// Runs the strategy search from the planned candidate.
    pub fn optimize(&mut self) -> PenningResult<&SearchOutcome> {
        if self.state.initial.is_none() {
            self.plan()?;
        }
        let (Some(native), Some(initial)) = (&self.state.native, &self.state.initial) else {
            return Err(PenningError::InternalError(
                "optimize requested before planning".into(),
            ));
        };

        let coordinator =
            SearchCoordinator::new(&self.graph, native, &self.layout, &self.state.config);
        let outcome = coordinator.search(initial.clone())?;

        self.state.stage = PipelineStage::Optimized;
        Ok(self.state.search.insert(outcome))
    }

    /// Stage 4: Verify
    ///
    /// Re-checks the best candidate; any violation is fatal.
    pub fn verify(&mut self) -> PenningResult<&VerificationReport> {
        let search = self.state.search.as_ref().ok_or_else(|| {
            PenningError::InternalError("verify requested before optimization".into())
        })?;

        let report = Verifier::new(&self.graph).verify(&search.best.program);
        report.clone().into_result()?;

        self.state.stage = PipelineStage::Verified;
        Ok(self.state.verification.insert(report))
    }

    /// Run full pipeline
    pub fn run(&mut self, circuit: &LogicalCircuit) -> PenningResult<CompilationResult> {
        let started = Instant::now();

        self.decompose(circuit)?;
        self.plan()?;
        self.optimize()?;
        self.verify()?;

        let search = self.state.search.clone().ok_or_else(|| {
            PenningError::InternalError("search result missing after verification".into())
        })?;
        let result = CompilationResult::from_search(search, started.elapsed());
        info!("compiled {} on {}: {}", circuit_label(circuit), self.graph_label(), result);
        Ok(result)
    }

    fn graph_label(&self) -> String {
        self.graph.name().unwrap_or("trap").to_string()
    }

    // ========================================================================
    // Reset
    // ========================================================================

    /// Reset pipeline to initial state
    pub fn reset(&mut self) {
        let config = self.state.config.clone();
        self.state = PipelineState::new(config);
    }

    /// Reset and reconfigure
    pub fn reconfigure(&mut self, config: CompilerConfig) {
        self.state = PipelineState::new(config);
    }
}

fn circuit_label(circuit: &LogicalCircuit) -> String {
    match circuit.name() {
        Some(name) => name.to_string(),
        None => format!("{}-qubit circuit", circuit.num_qubits()),
    }
}

// ============================================================================
// Tests
// ============================================================================

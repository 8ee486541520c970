//! Compiler configuration
//!
//! Gantree: L7_Integration → CompilerConfig
//!
//! One serde struct carrying every tunable of the pipeline, with conversions
//! into the per-crate option types.

use penning_core::compiler::{DEFAULT_MS_DURATION_STEPS, DEFAULT_NUM_IONS};
use penning_core::PenningResult;
use penning_cost::CostWeights;
use penning_decompose::DecomposeOptions;
use penning_schedule::ScheduleOptions;
use penning_shuttle::PlannerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Seed of the preset configurations
pub const DEFAULT_SEED: u64 = 42;

/// Search effort preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchMode {
    /// Balanced budget
    #[default]
    Standard,
    /// Few evaluations
    Quick,
    /// Large budget, wider meeting search
    Thorough,
    /// Hand-tuned
    Custom,
}

/// Unified compiler configuration
/// Gantree: CompilerConfig // 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    // ========================================================================
    // Circuit
    // ========================================================================
    /// Number of ions (one per logical qubit)
    pub num_ions: usize,

    /// Merge adjacent same-axis rotations
    pub fuse_rotations: bool,

    // ========================================================================
    // Scheduling
    // ========================================================================
    /// Steps an MS gate keeps its ions
    pub ms_duration: usize,

    /// Stationary steps before an ion rests in its slot (None disables)
    pub idle_after_steps: Option<usize>,

    /// Move ions off interaction nodes after the last gate
    pub park_at_end: bool,

    /// Route search and eviction tuning
    pub planner: PlannerConfig,

    /// Frames a program may span (overrides the planner's budget when set)
    #[serde(default)]
    pub max_steps: Option<usize>,

    // ========================================================================
    // Cost Search
    // ========================================================================
    /// Search effort preset
    pub mode: SearchMode,

    /// Temperature weights
    pub weights: CostWeights,

    /// Neighbour evaluations before the search stops
    pub max_iterations: usize,

    /// Wall-clock bound in milliseconds
    pub time_limit_ms: Option<u64>,

    /// Neighbours evaluated per batch
    pub batch_size: usize,

    /// Largest settle delay tried per MS gate
    pub max_settle_steps: usize,

    /// Seed of the neighbour order (None draws one from the OS)
    pub seed: Option<u64>,
}

impl CompilerConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Default 8-ion configuration
    pub fn default_8q() -> Self {
        Self {
            num_ions: DEFAULT_NUM_IONS,
            fuse_rotations: true,
            ms_duration: DEFAULT_MS_DURATION_STEPS,
            idle_after_steps: ScheduleOptions::default().idle_after_steps,
            park_at_end: true,
            planner: PlannerConfig::default(),
            max_steps: None,
            mode: SearchMode::Standard,
            weights: CostWeights::default(),
            max_iterations: 64,
            time_limit_ms: None,
            batch_size: 4,
            max_settle_steps: 2,
            seed: Some(DEFAULT_SEED),
        }
    }

    /// Small search budget
    pub fn quick() -> Self {
        Self {
            mode: SearchMode::Quick,
            max_iterations: 8,
            batch_size: 2,
            max_settle_steps: 1,
            ..Self::default_8q()
        }
    }

    /// Large search budget
    pub fn thorough() -> Self {
        Self {
            mode: SearchMode::Thorough,
            max_iterations: 400,
            batch_size: 8,
            max_settle_steps: 3,
            planner: PlannerConfig::default().with_interaction_candidates(3),
            ..Self::default_8q()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set ion count
    pub fn with_num_ions(mut self, n: usize) -> Self {
        self.num_ions = n;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw the seed from the OS
    pub fn with_random_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Set evaluation budget
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self.mode = SearchMode::Custom;
        self
    }

    /// Set wall-clock bound
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    /// Set batch size
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    /// Set the largest settle delay
    pub fn with_max_settle(mut self, steps: usize) -> Self {
        self.max_settle_steps = steps;
        self
    }

    /// Set temperature weights
    pub fn with_weights(mut self, weights: CostWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set planner tuning
    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    /// Set the step budget
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Set MS duration
    pub fn with_ms_duration(mut self, steps: usize) -> Self {
        self.ms_duration = steps;
        self
    }

    /// Set rest idling threshold
    pub fn with_idle_after(mut self, steps: Option<usize>) -> Self {
        self.idle_after_steps = steps;
        self
    }

    /// Set rotation fusion
    pub fn with_fusion(mut self, enabled: bool) -> Self {
        self.fuse_rotations = enabled;
        self
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Planner tuning with the step budget applied
    pub fn to_planner_config(&self) -> PlannerConfig {
        let budget = self.max_steps.or(self.planner.max_steps);
        self.planner.clone().with_max_steps(budget)
    }

    /// Temperature weights
    pub fn to_cost_weights(&self) -> CostWeights {
        self.weights.clone()
    }

    /// Decomposer options
    pub fn to_decompose_options(&self) -> DecomposeOptions {
        DecomposeOptions::default()
            .with_fusion(self.fuse_rotations)
            .with_expected_qubits(Some(self.num_ions))
    }

    /// Scheduler options
    pub fn to_schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions::default()
            .with_ms_duration(self.ms_duration)
            .with_idle_after(self.idle_after_steps)
            .with_park_at_end(self.park_at_end)
    }

    /// Wall-clock bound
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.num_ions < 2 {
            return Err("num_ions must be >= 2".to_string());
        }

        if self.ms_duration == 0 {
            return Err("ms_duration must be > 0".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }

        if self.max_steps == Some(0) {
            return Err("max_steps must be > 0 when set".to_string());
        }

        if self.idle_after_steps == Some(0) {
            return Err("idle_after_steps must be > 0 when set".to_string());
        }

        self.planner.validate()?;
        self.weights.validate().map_err(|e| e.to_string())?;

        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Parse from JSON
    pub fn from_json(json: &str) -> PenningResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> PenningResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> PenningResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> PenningResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::default_8q()
    }
}

impl fmt::Display for CompilerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompilerConfig({} ions, {:?}, budget={}, batch={}, ms={} steps, seed={:?})",
            self.num_ions,
            self.mode,
            self.max_iterations,
            self.batch_size,
            self.ms_duration,
            self.seed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

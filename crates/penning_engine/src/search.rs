//! Cost-driven strategy search
//!
//! Gantree: L7_Integration → SearchCoordinator
//!
//! Local search over scheduling strategies. Every candidate is scheduled,
//! verified and costed from scratch; a candidate that fails verification is
//! never kept, whatever its cost.

use crate::config::CompilerConfig;
use log::{debug, error, info, warn};
use penning_core::compiler::COST_EPSILON;
use penning_core::{
    CompiledProgram, InitialLayout, NativeCircuit, NodeId, PenningResult, TrapGraph, Verifier,
};
use penning_cost::{TemperatureModel, TemperatureReport};
use penning_schedule::{DependencyGraph, GateScheduler, PlacedGate, Strategy};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

// ============================================================================
// Moves
// ============================================================================

/// One local change to a strategy
/// Gantree: Move // 이웃 생성 연산
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Swap two neighbouring, independent entries of the MS order
    SwapMs(usize),
    /// Pin an MS gate to an interaction node
    Pin {
        /// MS gate index
        gate: usize,
        /// Interaction node
        node: NodeId,
    },
    /// Set the settle delay of an MS gate
    Settle {
        /// MS gate index
        gate: usize,
        /// Extra steps
        steps: usize,
    },
    /// Route the second ion of an MS gate first
    FlipRoute(usize),
}

impl Move {
    /// Strategy with the move applied
    pub fn apply(&self, strategy: &Strategy) -> Strategy {
        let next = strategy.clone();
        match *self {
            Move::SwapMs(pos) => next.swap_adjacent(pos),
            Move::Pin { gate, node } => next.pin(gate, node),
            Move::Settle { gate, steps } => next.with_settle(gate, steps),
            Move::FlipRoute(gate) => next.flip_route_order(gate),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::SwapMs(pos) => write!(f, "swap MS order {}/{}", pos, pos + 1),
            Move::Pin { gate, node } => write!(f, "pin gate {} to node {}", gate, node),
            Move::Settle { gate, steps } => write!(f, "settle gate {} by {}", gate, steps),
            Move::FlipRoute(gate) => write!(f, "flip route order of gate {}", gate),
        }
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// A scheduled, verified and costed strategy
/// Gantree: Candidate // 후보 해
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Strategy
    pub strategy: Strategy,
    /// Compiled program
    pub program: CompiledProgram,
    /// Gate placements
    pub placed: Vec<PlacedGate>,
    /// Temperature terms
    pub report: TemperatureReport,
}

impl Candidate {
    /// Weighted cost
    pub fn cost(&self) -> f64 {
        self.report.total_cost
    }

    /// Interaction node an MS gate ran on
    pub fn node_of(&self, gate: usize) -> Option<NodeId> {
        self.placed.iter().find(|p| p.index == gate).map(|p| p.node)
    }

    fn beats(&self, other: &Candidate) -> bool {
        self.cost() < other.cost() - COST_EPSILON
    }
}

/// Why the search stopped
/// Gantree: SearchStatus // 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    /// A whole neighbourhood brought no improvement
    Converged,
    /// Evaluation or time budget ran out first; the best candidate is not
    /// proven locally optimal
    BudgetExhausted,
}

impl SearchStatus {
    /// Check for `Converged`
    pub fn is_converged(&self) -> bool {
        matches!(self, SearchStatus::Converged)
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::Converged => write!(f, "converged"),
            SearchStatus::BudgetExhausted => write!(f, "budget exhausted (not proven optimal)"),
        }
    }
}

/// Search result
/// Gantree: SearchOutcome // 탐색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best valid candidate
    pub best: Candidate,
    /// Stop reason
    pub status: SearchStatus,
    /// Neighbours evaluated
    pub evaluations: usize,
    /// Accepted improvements
    pub improvements: usize,
    /// Neighbours discarded as infeasible or invalid
    pub discarded: usize,
    /// Cost of the starting candidate
    pub initial_cost: f64,
    /// Best cost after each accepted move
    pub cost_history: Vec<f64>,
    /// Wall time
    pub elapsed: Duration,
}

impl SearchOutcome {
    /// Cost reduction over the starting candidate
    pub fn improvement(&self) -> f64 {
        self.initial_cost - self.best.cost()
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Local search over scheduling strategies
/// Gantree: SearchCoordinator // 비용 탐색 조정자
pub struct SearchCoordinator<'a> {
    graph: &'a TrapGraph,
    circuit: &'a NativeCircuit,
    layout: &'a InitialLayout,
    deps: DependencyGraph,
    scheduler: GateScheduler<'a>,
    model: TemperatureModel,
    max_iterations: usize,
    time_limit: Option<Duration>,
    batch_size: usize,
    max_settle_steps: usize,
    seed: Option<u64>,
}

impl<'a> SearchCoordinator<'a> {
    /// Create a coordinator for one circuit on one trap
    pub fn new(
        graph: &'a TrapGraph,
        circuit: &'a NativeCircuit,
        layout: &'a InitialLayout,
        config: &CompilerConfig,
    ) -> Self {
        Self {
            graph,
            circuit,
            layout,
            deps: DependencyGraph::new(circuit),
            scheduler: GateScheduler::new(
                graph,
                config.to_planner_config(),
                config.to_schedule_options(),
            ),
            model: TemperatureModel::new(config.to_cost_weights()),
            max_iterations: config.max_iterations,
            time_limit: config.time_limit(),
            batch_size: config.batch_size.max(1),
            max_settle_steps: config.max_settle_steps,
            seed: config.seed,
        }
    }

    /// Schedule, verify and cost one strategy
    /// Gantree: evaluate(strategy) -> Candidate // 후보 평가
    pub fn evaluate(&self, strategy: &Strategy) -> PenningResult<Candidate> {
        let outcome = self.scheduler.schedule(self.circuit, self.layout, strategy)?;
        Verifier::new(self.graph)
            .verify(&outcome.program)
            .into_result()?;
        let report = self.model.evaluate(self.graph, &outcome.program);
        Ok(Candidate {
            strategy: strategy.clone(),
            program: outcome.program,
            placed: outcome.placed,
            report,
        })
    }

    /// Evaluate the stream-order strategy and search from it
    pub fn run(&self) -> PenningResult<SearchOutcome> {
        let initial = self.evaluate(&Strategy::for_circuit(self.circuit))?;
        self.search(initial)
    }

    /// Improve a starting candidate until convergence or budget
    /// Gantree: search(initial) -> SearchOutcome // 국소 탐색
    pub fn search(&self, initial: Candidate) -> PenningResult<SearchOutcome> {
        let started = Instant::now();
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let initial_cost = initial.cost();
        let mut best = initial;
        let mut seen: HashSet<Strategy> = HashSet::new();
        seen.insert(best.strategy.clone());

        let mut evaluations = 0;
        let mut improvements = 0;
        let mut discarded = 0;
        let mut cost_history = vec![initial_cost];

        let status = 'search: loop {
            let mut moves: Vec<(Move, Strategy)> = self
                .neighbours(&best)
                .into_iter()
                .map(|mv| (mv, mv.apply(&best.strategy)))
                .filter(|(_, s)| !seen.contains(s))
                .collect();
            moves.shuffle(&mut rng);

            let mut accepted = None;
            for batch in moves.chunks(self.batch_size) {
                let remaining = self.max_iterations.saturating_sub(evaluations);
                let out_of_time = self.time_limit.is_some_and(|l| started.elapsed() >= l);
                if remaining == 0 || out_of_time {
                    break 'search SearchStatus::BudgetExhausted;
                }
                let batch = &batch[..batch.len().min(remaining)];
                evaluations += batch.len();

                let results = self.evaluate_batch(batch);
                for (_, strategy) in batch {
                    seen.insert(strategy.clone());
                }
                let (winner, dropped) =
                    pick_winner(&best, batch.iter().map(|(mv, _)| *mv).zip(results));
                discarded += dropped;
                if winner.is_some() {
                    accepted = winner;
                    break;
                }
            }

            match accepted {
                Some((mv, candidate)) => {
                    debug!(
                        "accepted {}: cost {:.3} -> {:.3}",
                        mv,
                        best.cost(),
                        candidate.cost()
                    );
                    best = candidate;
                    improvements += 1;
                    cost_history.push(best.cost());
                }
                None => break SearchStatus::Converged,
            }
        };

        let outcome = SearchOutcome {
            best,
            status,
            evaluations,
            improvements,
            discarded,
            initial_cost,
            cost_history,
            elapsed: started.elapsed(),
        };
        info!(
            "strategy search {}: cost {:.3} -> {:.3} after {} evaluations ({} accepted, {} discarded)",
            outcome.status,
            outcome.initial_cost,
            outcome.best.cost(),
            outcome.evaluations,
            outcome.improvements,
            outcome.discarded
        );
        Ok(outcome)
    }

    /// Every move applicable to a candidate, in a fixed order
    pub fn neighbours(&self, candidate: &Candidate) -> Vec<Move> {
        let strategy = &candidate.strategy;
        let mut moves = Vec::new();

        for (pos, pair) in strategy.ms_order.windows(2).enumerate() {
            if self.deps.independent(pair[0], pair[1]) {
                moves.push(Move::SwapMs(pos));
            }
        }

        let interaction = self.graph.interaction_nodes();
        for &gate in &strategy.ms_order {
            let used = candidate.node_of(gate);
            for &node in &interaction {
                if Some(node) != used {
                    moves.push(Move::Pin { gate, node });
                }
            }
            let current = strategy.settle_for(gate);
            for steps in (0..=self.max_settle_steps).filter(|&s| s != current) {
                moves.push(Move::Settle { gate, steps });
            }
            moves.push(Move::FlipRoute(gate));
        }
        moves
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_batch(&self, batch: &[(Move, Strategy)]) -> Vec<PenningResult<Candidate>> {
        batch.iter().map(|(_, s)| self.evaluate(s)).collect()
    }

    #[cfg(feature = "parallel")]
    fn evaluate_batch(&self, batch: &[(Move, Strategy)]) -> Vec<PenningResult<Candidate>> {
        use rayon::prelude::*;
        batch.par_iter().map(|(_, s)| self.evaluate(s)).collect()
    }
}

/// Lowest-cost candidate of a batch that beats `best`, ties to the earlier
/// entry, and the number of failed entries. Failed neighbours are logged and
/// dropped; they never end the search.
fn pick_winner(
    best: &Candidate,
    results: impl IntoIterator<Item = (Move, PenningResult<Candidate>)>,
) -> (Option<(Move, Candidate)>, usize) {
    let mut winner: Option<(Move, Candidate)> = None;
    let mut discarded = 0;
    for (mv, result) in results {
        match result {
            Ok(candidate) => {
                let better = match &winner {
                    Some((_, w)) => candidate.beats(w),
                    None => candidate.beats(best),
                };
                if better {
                    winner = Some((mv, candidate));
                }
            }
            Err(err) => {
                discarded += 1;
                if err.is_recoverable() {
                    warn!("discarding neighbour ({}): {}", mv, err);
                } else {
                    error!("neighbour ({}) failed unexpectedly: {}", mv, err);
                }
            }
        }
    }
    (winner, discarded)
}

// ============================================================================
// Tests
// ============================================================================

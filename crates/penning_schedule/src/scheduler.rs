//! Gate scheduler
//!
//! Gantree: L5_Schedule → GateScheduler
//!
//! Places the native stream on the step axis while the shuttling planner
//! moves ions. A gate is ready once the previous gate on each of its ions is
//! placed. Ready single-ion gates go first in stream order; otherwise the
//! ready MS gate ranked highest by the strategy is placed.

use crate::dependency::DependencyGraph;
use crate::scheduled_gate::{GateState, PlacedGate};
use crate::strategy::Strategy;
use log::{debug, info};
use penning_core::compiler::{DEFAULT_IDLE_AFTER_STEPS, DEFAULT_MS_DURATION_STEPS};
use penning_core::{
    CompiledProgram, GatesSchedule, InitialLayout, NativeCircuit, NativeGate, PenningError,
    PenningResult, Position, Step, TrapGraph,
};
use penning_shuttle::{MeetingRequest, PlannerConfig, RestPass, SearchState, ShuttlingPlanner};
use serde::{Deserialize, Serialize};

// ============================================================================
// Options
// ============================================================================

/// Scheduler options
/// Gantree: ScheduleOptions // 스케줄 옵션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// Steps an MS gate keeps its ions
    pub ms_duration: usize,
    /// Stationary steps before an ion is moved to its rest slot
    pub idle_after_steps: Option<usize>,
    /// Move ions off interaction nodes after the last gate
    pub park_at_end: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            ms_duration: DEFAULT_MS_DURATION_STEPS,
            idle_after_steps: Some(DEFAULT_IDLE_AFTER_STEPS),
            park_at_end: true,
        }
    }
}

impl ScheduleOptions {
    /// Set MS duration
    pub fn with_ms_duration(mut self, steps: usize) -> Self {
        self.ms_duration = steps;
        self
    }

    /// Set rest idling threshold (None disables the pass)
    pub fn with_idle_after(mut self, steps: Option<usize>) -> Self {
        self.idle_after_steps = steps;
        self
    }

    /// Set final parking
    pub fn with_park_at_end(mut self, park: bool) -> Self {
        self.park_at_end = park;
        self
    }
}

/// Result of one scheduling run
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    /// The compiled program
    pub program: CompiledProgram,
    /// Every gate with its step, in stream order
    pub placed: Vec<PlacedGate>,
    /// Ion-steps moved into rest slots by the idle pass
    pub idle_frames: usize,
}

// ============================================================================
// Scheduler
// ============================================================================

/// Dependency-aware gate placement
/// Gantree: GateScheduler // 게이트 스케줄러
#[derive(Debug, Clone)]
pub struct GateScheduler<'a> {
    graph: &'a TrapGraph,
    planner: ShuttlingPlanner<'a>,
    options: ScheduleOptions,
}

impl<'a> GateScheduler<'a> {
    /// Scheduler over a trap
    pub fn new(graph: &'a TrapGraph, planner: PlannerConfig, options: ScheduleOptions) -> Self {
        Self {
            graph,
            planner: ShuttlingPlanner::new(graph, planner),
            options,
        }
    }

    /// Options in use
    pub fn options(&self) -> &ScheduleOptions {
        &self.options
    }

    /// Schedule a native circuit from an initial layout under a strategy
    /// Gantree: schedule(native,layout,strategy) -> ScheduleOutcome // 스케줄링
    ///
    /// On `TopologyInfeasible` the error carries the plan built so far.
    pub fn schedule(
        &self,
        circuit: &NativeCircuit,
        layout: &InitialLayout,
        strategy: &Strategy,
    ) -> PenningResult<ScheduleOutcome> {
        if circuit.num_ions() != layout.num_ions() {
            return Err(PenningError::InvalidLayout(format!(
                "{} ions placed for a {}-ion circuit",
                layout.num_ions(),
                circuit.num_ions()
            )));
        }
        if self.options.ms_duration == 0 {
            return Err(PenningError::InvalidConfig(
                "ms_duration must be at least 1".into(),
            ));
        }
        strategy.validate(circuit)?;

        let deps = DependencyGraph::new(circuit);
        let ranks = strategy.ranks(circuit.gate_count());
        let mut state = SearchState::new(layout);
        let mut states = vec![GateState::Pending; circuit.gate_count()];
        let mut placed: Vec<Option<PlacedGate>> = vec![None; circuit.gate_count()];
        let mut claims = IonClaims::new(circuit.num_ions());

        while let Some(idx) = Self::next_gate(circuit, &deps, &states, &ranks) {
            let gate = circuit.gates()[idx];
            let earliest = deps
                .predecessors(idx)
                .iter()
                .filter_map(|&p| placed[p].as_ref().map(PlacedGate::finish))
                .max()
                .unwrap_or(0);

            let result = if gate.is_two_qubit() {
                self.place_ms(&mut state, idx, gate, earliest, strategy)
            } else {
                self.place_single(&mut state, idx, gate, earliest)
            };
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("gate {} ({}) could not be placed: {}", idx, gate, err);
                    return Err(err.with_partial(self.assemble(circuit, &state, &placed)));
                }
            };

            claims.claim(&entry)?;
            states[idx] = GateState::Placed(entry.step);
            placed[idx] = Some(entry);
        }

        if let Some(idx) = states.iter().position(|s| !s.is_placed()) {
            return Err(PenningError::InternalError(format!(
                "gate {} was never ready",
                idx
            )));
        }

        if self.options.park_at_end {
            if let Err(err) = self.planner.park_interaction_ions(&mut state) {
                return Err(err.with_partial(self.assemble(circuit, &state, &placed)));
            }
        }

        let mut program = self.assemble(circuit, &state, &placed);
        let idle_frames = match self.options.idle_after_steps {
            Some(threshold) => {
                let pass = RestPass::new(threshold, self.options.ms_duration);
                let (positions, frames) =
                    pass.apply(self.graph, &program.positions, &program.schedule);
                program.positions = positions;
                frames
            }
            None => 0,
        };

        info!(
            "scheduled {} gates ({} MS) over {} steps",
            circuit.gate_count(),
            circuit.count_ms(),
            program.num_steps()
        );
        Ok(ScheduleOutcome {
            program,
            placed: placed.into_iter().flatten().collect(),
            idle_frames,
        })
    }

    /// First ready single-ion gate, else the best-ranked ready MS gate
    fn next_gate(
        circuit: &NativeCircuit,
        deps: &DependencyGraph,
        states: &[GateState],
        ranks: &[Option<usize>],
    ) -> Option<usize> {
        let ready = |i: usize| {
            !states[i].is_placed() && deps.predecessors(i).iter().all(|&p| states[p].is_placed())
        };
        let gates = circuit.gates();
        (0..gates.len())
            .find(|&i| gates[i].is_single_qubit() && ready(i))
            .or_else(|| {
                (0..gates.len())
                    .filter(|&i| gates[i].is_two_qubit() && ready(i))
                    .min_by_key(|&i| ranks[i].unwrap_or(usize::MAX))
            })
    }

    fn place_single(
        &self,
        state: &mut SearchState,
        idx: usize,
        gate: NativeGate,
        earliest: Step,
    ) -> PenningResult<PlacedGate> {
        let ion = gate.ions()[0];
        let on_standard = |pos: Position| pos.active_node().is_some_and(|n| self.graph.is_standard(n));

        // a committed frame may already have the ion on a standard node
        let horizon = state.trajectory(ion).len().max(earliest + 1);
        let committed = (earliest..horizon).find(|&t| on_standard(state.position(ion, t)));
        let step = match committed {
            Some(t) => t,
            None => self.planner.bring_to_standard(state, ion)?.max(earliest),
        };
        if let Some(limit) = self.planner.config().max_steps.filter(|&l| step >= l) {
            return Err(PenningError::infeasible(format!(
                "gate {} on ion {} cannot run within {} steps",
                idx, ion, limit
            )));
        }
        state.hold_until(ion, step + 1);
        Ok(PlacedGate::new(idx, gate, step, 1, state.position(ion, step).node()))
    }

    fn place_ms(
        &self,
        state: &mut SearchState,
        idx: usize,
        gate: NativeGate,
        earliest: Step,
        strategy: &Strategy,
    ) -> PenningResult<PlacedGate> {
        let ions = gate.ions();
        let request = MeetingRequest {
            ions: [ions[0], ions[1]],
            not_before: earliest,
            settle: strategy.settle_for(idx),
            duration: self.options.ms_duration,
            preferred: strategy.node_preference.get(&idx).copied(),
            second_first: strategy.route_second_first.contains(&idx),
        };
        let meeting = self.planner.plan_meeting(state, &request)?;
        Ok(PlacedGate::new(
            idx,
            gate,
            meeting.start,
            self.options.ms_duration,
            meeting.node,
        ))
    }

    /// Program from the committed trajectories and the gates placed so far
    fn assemble(
        &self,
        circuit: &NativeCircuit,
        state: &SearchState,
        placed: &[Option<PlacedGate>],
    ) -> CompiledProgram {
        let len = placed
            .iter()
            .flatten()
            .map(PlacedGate::finish)
            .max()
            .unwrap_or(0)
            .max(state.horizon());

        let mut ordered: Vec<&PlacedGate> = placed.iter().flatten().collect();
        ordered.sort_by_key(|g| (g.step, g.index));
        let mut schedule = GatesSchedule::with_len(len);
        for entry in ordered {
            schedule.add(entry.step, entry.gate);
        }
        schedule.pad_to(len);

        CompiledProgram {
            positions: state.to_history(len),
            schedule,
            ms_duration: self.options.ms_duration,
            output_order: circuit.output_order().to_vec(),
        }
    }
}

// ============================================================================
// Ion claims
// ============================================================================

/// Step from which each ion is free again
#[derive(Debug, Clone)]
struct IonClaims {
    busy_until: Vec<Step>,
}

impl IonClaims {
    fn new(num_ions: usize) -> Self {
        Self {
            busy_until: vec![0; num_ions],
        }
    }

    /// Book the ions of a placed gate; a second claim on a busy ion is a
    /// conflict
    fn claim(&mut self, entry: &PlacedGate) -> PenningResult<()> {
        let ions = entry.ions();
        if let Some(&ion) = ions.iter().find(|&&ion| self.busy_until[ion] > entry.step) {
            return Err(PenningError::SchedulingConflict {
                step: entry.step,
                ion,
                detail: format!(
                    "gate {} starts before step {}",
                    entry.index, self.busy_until[ion]
                ),
            });
        }
        for ion in ions {
            self.busy_until[ion] = entry.finish();
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{LogicalCircuit, LogicalGate, Provenance, Verifier};
    use penning_decompose::Decomposer;

    fn tag() -> Provenance {
        Provenance::new(0, LogicalGate::Hadamard(0))
    }

    fn qft8() -> NativeCircuit {
        Decomposer::default()
            .decompose(&LogicalCircuit::qft(8))
            .unwrap()
    }

    fn scheduler(graph: &TrapGraph) -> GateScheduler<'_> {
        GateScheduler::new(graph, PlannerConfig::default(), ScheduleOptions::default())
    }

    #[test]
    fn test_qft8_on_penning_trap() {
        let graph = TrapGraph::penning();
        let native = qft8();
        let layout = InitialLayout::default_for(&graph, 8).unwrap();
        let outcome = scheduler(&graph)
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap();

        let program = &outcome.program;
        assert_eq!(program.schedule.count_ms(), 28);
        assert_eq!(program.schedule.gate_count(), native.gate_count());
        assert_eq!(program.positions.len(), program.schedule.len());
        let report = Verifier::new(&graph).verify(program);
        assert!(report.is_valid(), "{:?}", report.violations);
    }

    #[test]
    fn test_qft8_on_center_line() {
        let graph = TrapGraph::line_with_center_interaction(8);
        let native = qft8();
        let layout = InitialLayout::default_for(&graph, 8).unwrap();
        let outcome = scheduler(&graph)
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap();

        let program = &outcome.program;
        assert_eq!(program.schedule.count_ms(), 28);
        assert_eq!(program.num_steps(), program.schedule.len());
        let report = Verifier::new(&graph).verify(program);
        assert!(report.is_valid(), "{:?}", report.violations);
    }

    #[test]
    fn test_dependencies_respected() {
        let graph = TrapGraph::penning();
        let native = qft8();
        let layout = InitialLayout::default_for(&graph, 8).unwrap();
        let outcome = scheduler(&graph)
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap();
        let deps = DependencyGraph::new(&native);
        for entry in &outcome.placed {
            for &p in deps.predecessors(entry.index) {
                assert!(outcome.placed[p].finish() <= entry.step);
            }
        }
    }

    #[test]
    fn test_no_interaction_node_is_infeasible() {
        let graph = TrapGraph::grid(3, 3, &[]).unwrap();
        let native = NativeCircuit::new(
            2,
            vec![NativeGate::rx(0, 0.1, tag()), NativeGate::ms(0, 1, 0.2, tag())],
        );
        let layout = InitialLayout::first_standard(&graph, 2).unwrap();
        let err = scheduler(&graph)
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap_err();
        assert!(matches!(err, PenningError::TopologyInfeasible { .. }));
        let partial = err.partial_plan().unwrap();
        assert_eq!(partial.schedule.gate_count(), 1);
    }

    #[test]
    fn test_step_budget_is_infeasible() {
        let graph = TrapGraph::line_with_center_interaction(8);
        let native = qft8();
        let layout = InitialLayout::default_for(&graph, 8).unwrap();
        let planner = PlannerConfig::default().with_max_steps(Some(20));
        let err = GateScheduler::new(&graph, planner, ScheduleOptions::default())
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap_err();

        assert!(matches!(err, PenningError::TopologyInfeasible { .. }));
        // 28 MS gates on one interaction node need far more than 20 steps
        let partial = err.partial_plan().unwrap();
        assert!(partial.num_steps() <= 20);
        assert!(partial.schedule.count_ms() < 28);
    }

    #[test]
    fn test_step_budget_exact_fit() {
        let graph = TrapGraph::line_with_center_interaction(4);
        let native = NativeCircuit::new(2, vec![NativeGate::ms(0, 1, 0.2, tag())]);
        let layout = InitialLayout::new(&graph, vec![1, 3]).unwrap();
        let options = ScheduleOptions::default()
            .with_idle_after(None)
            .with_park_at_end(false);
        let run = |limit: usize| {
            let planner = PlannerConfig::default().with_max_steps(Some(limit));
            GateScheduler::new(&graph, planner, options.clone()).schedule(
                &native,
                &layout,
                &Strategy::for_circuit(&native),
            )
        };

        // the MS runs on steps 1 and 2
        let outcome = run(3).unwrap();
        assert_eq!(outcome.program.num_steps(), 3);
        assert!(run(2).unwrap_err().is_topology_error());
    }

    #[test]
    fn test_claims_reject_overlap() {
        let mut claims = IonClaims::new(3);
        let ms = PlacedGate::new(0, NativeGate::ms(0, 1, 0.2, tag()), 0, 2, 2);
        claims.claim(&ms).unwrap();

        let early = PlacedGate::new(1, NativeGate::rx(1, 0.1, tag()), 1, 1, 3);
        match claims.claim(&early) {
            Err(PenningError::SchedulingConflict { step, ion, .. }) => {
                assert_eq!((step, ion), (1, 1));
            }
            other => panic!("expected a conflict, got {:?}", other),
        }

        let free = PlacedGate::new(2, NativeGate::rx(2, 0.1, tag()), 0, 1, 4);
        claims.claim(&free).unwrap();
        let after = PlacedGate::new(3, NativeGate::rx(1, 0.1, tag()), 2, 1, 3);
        claims.claim(&after).unwrap();
    }

    #[test]
    fn test_layout_size_mismatch() {
        let graph = TrapGraph::penning();
        let native = qft8();
        let layout = InitialLayout::default_for(&graph, 4).unwrap();
        let err = scheduler(&graph)
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap_err();
        assert!(matches!(err, PenningError::InvalidLayout(_)));
    }

    #[test]
    fn test_settle_delays_gate() {
        let graph = TrapGraph::line_with_center_interaction(4);
        let native = NativeCircuit::new(2, vec![NativeGate::ms(0, 1, 0.2, tag())]);
        let layout = InitialLayout::new(&graph, vec![1, 3]).unwrap();
        let base = scheduler(&graph)
            .schedule(&native, &layout, &Strategy::for_circuit(&native))
            .unwrap();
        let delayed = scheduler(&graph)
            .schedule(
                &native,
                &layout,
                &Strategy::for_circuit(&native).with_settle(0, 2),
            )
            .unwrap();
        assert_eq!(base.placed[0].step, 1);
        assert_eq!(delayed.placed[0].step, 3);
        assert!(Verifier::new(&graph).verify(&delayed.program).is_valid());
    }
}

//! Temperature model
//!
//! Gantree: L6_Cost → TemperatureModel
//!
//! Motional heating proxy for a compiled program. Every main-graph hop heats
//! an ion; an MS gate started soon after a hop heats its ions further.

use crate::weights::CostWeights;
use penning_core::{CompiledProgram, IonId, Position, Step, TrapGraph};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-ion temperature terms
/// Gantree: IonStats // 이온별 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IonStats {
    /// Ion
    pub ion: IonId,
    /// Main-graph hops
    pub shuttles: usize,
    /// Rest-slot toggles
    pub park_moves: usize,
    /// MS gates taken part in
    pub ms_count: usize,
    /// Heat from MS gates
    pub ms_heat: usize,
    /// Steps spent on interaction nodes
    pub dwell_steps: usize,
}

/// Temperature terms and weighted cost of one program
/// Gantree: TemperatureReport // 온도 보고서
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    /// Main-graph hops over all ions
    pub shuttles: usize,
    /// Rest-slot toggles over all ions
    pub park_moves: usize,
    /// MS heat over all participants
    pub ms_heat: usize,
    /// Program steps
    pub steps: usize,
    /// Ion-steps on interaction nodes
    pub dwell_steps: usize,
    /// Per-ion breakdown
    pub per_ion: Vec<IonStats>,
    /// Weighted cost
    pub total_cost: f64,
}

impl TemperatureReport {
    /// Ion with the most hops plus MS heat
    pub fn hottest_ion(&self) -> Option<&IonStats> {
        self.per_ion
            .iter()
            .max_by_key(|s| (s.shuttles + s.ms_heat, std::cmp::Reverse(s.ion)))
    }

    /// Average hops per ion
    pub fn mean_shuttles(&self) -> f64 {
        if self.per_ion.is_empty() {
            return 0.0;
        }
        self.shuttles as f64 / self.per_ion.len() as f64
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for TemperatureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature(cost={:.3}, shuttles={}, heat={}, steps={}, dwell={}, parks={})",
            self.total_cost, self.shuttles, self.ms_heat, self.steps, self.dwell_steps, self.park_moves
        )
    }
}

/// Evaluates programs under a weight set
/// Gantree: TemperatureModel // 온도 모델
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureModel {
    weights: CostWeights,
}

impl TemperatureModel {
    /// Model with weights
    pub fn new(weights: CostWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    /// Evaluate a program
    /// Gantree: evaluate(graph,program) -> TemperatureReport // 온도 평가
    pub fn evaluate(&self, graph: &TrapGraph, program: &CompiledProgram) -> TemperatureReport {
        let num_ions = program.num_ions();
        let frames = program.positions.frames();
        let mut per_ion: Vec<IonStats> = (0..num_ions)
            .map(|ion| IonStats {
                ion,
                ..IonStats::default()
            })
            .collect();
        // step of each ion's hops, ascending
        let mut hops: Vec<Vec<Step>> = vec![Vec::new(); num_ions];

        for (step, pair) in frames.windows(2).enumerate() {
            for ion in 0..num_ions.min(pair[0].len()).min(pair[1].len()) {
                match (pair[0][ion], pair[1][ion]) {
                    (Position::At(a), Position::At(b)) if a != b => {
                        per_ion[ion].shuttles += 1;
                        hops[ion].push(step + 1);
                    }
                    (a, b) if a != b => per_ion[ion].park_moves += 1,
                    _ => {}
                }
            }
        }

        for frame in frames {
            for (ion, pos) in frame.iter().enumerate().take(num_ions) {
                if pos.active_node().is_some_and(|n| graph.is_interaction(n)) {
                    per_ion[ion].dwell_steps += 1;
                }
            }
        }

        let window = self.weights.heat_window();
        for (step, gate) in program.schedule.iter_gates() {
            if !gate.is_two_qubit() {
                continue;
            }
            for ion in gate.ions().into_iter().filter(|&i| i < num_ions) {
                per_ion[ion].ms_count += 1;
                let last_hop = hops[ion].iter().rev().find(|&&h| h <= step);
                if let Some(&h) = last_hop {
                    per_ion[ion].ms_heat += window.saturating_sub(step - h);
                }
            }
        }

        let mut report = TemperatureReport {
            shuttles: per_ion.iter().map(|s| s.shuttles).sum(),
            park_moves: per_ion.iter().map(|s| s.park_moves).sum(),
            ms_heat: per_ion.iter().map(|s| s.ms_heat).sum(),
            steps: program.num_steps(),
            dwell_steps: per_ion.iter().map(|s| s.dwell_steps).sum(),
            per_ion,
            total_cost: 0.0,
        };
        report.total_cost = self.cost(&report);
        report
    }

    /// Weighted cost of the report terms
    pub fn cost(&self, report: &TemperatureReport) -> f64 {
        let w = &self.weights;
        w.shuttle * report.shuttles as f64
            + w.ms_heat * report.ms_heat as f64
            + w.step * report.steps as f64
            + w.dwell * report.dwell_steps as f64
            + w.park * report.park_moves as f64
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use penning_core::{GatesSchedule, LogicalGate, NativeGate, PositionsHistory, Provenance};

    // S0 S1 I2 S3 S4, ions meet on node 2 for one MS and return
    fn program(settle: usize) -> CompiledProgram {
        let a = Position::At;
        let mut frames = vec![vec![a(1), a(3)], vec![a(2), a(2)]];
        for _ in 0..settle + 1 {
            frames.push(vec![a(2), a(2)]);
        }
        frames.push(vec![a(1), a(3)]);
        let len = frames.len();

        let mut schedule = GatesSchedule::with_len(len);
        let tag = Provenance::new(1, LogicalGate::Hadamard(0));
        schedule.add(1 + settle, NativeGate::ms(0, 1, 0.5, tag));

        let mut p = CompiledProgram::empty(2, 2);
        p.positions = PositionsHistory::from_frames(frames);
        p.schedule = schedule;
        p
    }

    #[test]
    fn test_terms() {
        let g = TrapGraph::line_with_center_interaction(4);
        let report = TemperatureModel::default().evaluate(&g, &program(0));
        assert_eq!(report.shuttles, 4);
        assert_eq!(report.ms_heat, 6);
        assert_eq!(report.steps, 4);
        assert_eq!(report.dwell_steps, 4);
        assert_eq!(report.park_moves, 0);
        assert_relative_eq!(report.total_cost, 4.0 + 12.0 + 2.0 + 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_settling_cools() {
        let g = TrapGraph::line_with_center_interaction(4);
        let model = TemperatureModel::default();
        let hot = model.evaluate(&g, &program(0));
        let warm = model.evaluate(&g, &program(2));
        let cold = model.evaluate(&g, &program(3));
        assert_eq!(warm.ms_heat, 2);
        assert_eq!(cold.ms_heat, 0);
        assert!(hot.ms_heat > warm.ms_heat);
    }

    #[test]
    fn test_park_moves_counted_apart() {
        let g = TrapGraph::line_with_center_interaction(4);
        let mut p = CompiledProgram::empty(1, 2);
        p.positions = PositionsHistory::from_frames(vec![
            vec![Position::At(0)],
            vec![Position::Idle(0)],
            vec![Position::At(0)],
        ]);
        p.schedule = GatesSchedule::with_len(3);
        let model = TemperatureModel::new(CostWeights::default().with_park(1.5));
        let report = model.evaluate(&g, &p);
        assert_eq!(report.shuttles, 0);
        assert_eq!(report.park_moves, 2);
        assert_relative_eq!(report.total_cost, 1.5 * 2.0 + 0.5 * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hottest_ion() {
        let g = TrapGraph::line_with_center_interaction(4);
        let report = TemperatureModel::default().evaluate(&g, &program(0));
        assert_eq!(report.hottest_ion().map(|s| s.ion), Some(0));
        assert_relative_eq!(report.mean_shuttles(), 2.0);
    }
}

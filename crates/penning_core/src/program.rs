//! Compiled program model
//!
//! Gantree: L2_Program → CompiledProgram
//!
//! `PositionsHistory` and `GatesSchedule` share one step index space; a
//! `CompiledProgram` bundles both with the MS duration and the output
//! qubit order. `ProgramExport` is the coordinate-based JSON form.

use crate::gate::NativeGate;
use crate::topology::TrapGraph;
use crate::types::{Angle, Coord, IonId, NodeId, Step};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Position
// ============================================================================

/// Ion position for one step
/// Gantree: Position // 이온 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// On a trap node
    At(NodeId),
    /// Parked in the rest slot of a standard node
    Idle(NodeId),
}

impl Position {
    /// Node the position belongs to
    pub fn node(&self) -> NodeId {
        match *self {
            Position::At(n) | Position::Idle(n) => n,
        }
    }

    /// Check for the idle sentinel
    pub fn is_idle(&self) -> bool {
        matches!(self, Position::Idle(_))
    }

    /// Node if the ion is on the grid
    pub fn active_node(&self) -> Option<NodeId> {
        match *self {
            Position::At(n) => Some(n),
            Position::Idle(_) => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::At(n) => write!(f, "@{}", n),
            Position::Idle(n) => write!(f, "idle@{}", n),
        }
    }
}

// ============================================================================
// PositionsHistory
// ============================================================================

/// One frame of positions (indexed by ion) per step
/// Gantree: PositionsHistory // 위치 이력
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionsHistory {
    frames: Vec<Vec<Position>>,
}

impl PositionsHistory {
    /// Empty history
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// History from frames
    pub fn from_frames(frames: Vec<Vec<Position>>) -> Self {
        Self { frames }
    }

    /// Append a frame
    pub fn push(&mut self, frame: Vec<Position>) {
        self.frames.push(frame);
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if history has no steps
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of ions per frame
    pub fn num_ions(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    /// All frames
    pub fn frames(&self) -> &[Vec<Position>] {
        &self.frames
    }

    /// Frame at a step
    pub fn frame(&self, step: Step) -> Option<&[Position]> {
        self.frames.get(step).map(Vec::as_slice)
    }

    /// Position of one ion at a step
    pub fn position(&self, step: Step, ion: IonId) -> Option<Position> {
        self.frames.get(step).and_then(|f| f.get(ion)).copied()
    }

    /// Positions of one ion over time
    pub fn trajectory(&self, ion: IonId) -> Vec<Position> {
        self.frames
            .iter()
            .filter_map(|f| f.get(ion).copied())
            .collect()
    }
}

// ============================================================================
// GatesSchedule
// ============================================================================

/// Gates starting at one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStep {
    /// Step index
    pub step: Step,
    /// Gates starting at this step, on disjoint ions
    pub gates: Vec<NativeGate>,
}

/// Step-indexed gate schedule
/// Gantree: GatesSchedule // 게이트 스케줄
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatesSchedule {
    steps: Vec<ScheduleStep>,
}

impl GatesSchedule {
    /// Schedule with `len` empty steps
    pub fn with_len(len: usize) -> Self {
        Self {
            steps: (0..len)
                .map(|step| ScheduleStep {
                    step,
                    gates: Vec::new(),
                })
                .collect(),
        }
    }

    /// Add a gate starting at `step`, growing the schedule when needed
    pub fn add(&mut self, step: Step, gate: NativeGate) {
        while self.steps.len() <= step {
            let next = self.steps.len();
            self.steps.push(ScheduleStep {
                step: next,
                gates: Vec::new(),
            });
        }
        self.steps[step].gates.push(gate);
    }

    /// Grow with empty steps up to `len`
    pub fn pad_to(&mut self, len: usize) {
        while self.steps.len() < len {
            let next = self.steps.len();
            self.steps.push(ScheduleStep {
                step: next,
                gates: Vec::new(),
            });
        }
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if schedule has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps
    pub fn steps(&self) -> &[ScheduleStep] {
        &self.steps
    }

    /// Gates of one step
    pub fn gates_at(&self, step: Step) -> &[NativeGate] {
        self.steps
            .get(step)
            .map(|s| s.gates.as_slice())
            .unwrap_or(&[])
    }

    /// All gates in step order with their start step
    pub fn iter_gates(&self) -> impl Iterator<Item = (Step, &NativeGate)> {
        self.steps
            .iter()
            .flat_map(|s| s.gates.iter().map(move |g| (s.step, g)))
    }

    /// Total gates
    pub fn gate_count(&self) -> usize {
        self.steps.iter().map(|s| s.gates.len()).sum()
    }

    /// MS gate count
    pub fn count_ms(&self) -> usize {
        self.iter_gates().filter(|(_, g)| g.is_two_qubit()).count()
    }
}

// ============================================================================
// CompiledProgram
// ============================================================================

/// Output of one compilation
/// Gantree: CompiledProgram // 컴파일 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledProgram {
    /// Ion positions per step
    pub positions: PositionsHistory,
    /// Gates per step
    pub schedule: GatesSchedule,
    /// Steps an MS keeps its ions
    pub ms_duration: usize,
    /// Output qubit `j` is read from ion `output_order[j]`
    pub output_order: Vec<IonId>,
}

impl CompiledProgram {
    /// Program with no steps
    pub fn empty(num_ions: usize, ms_duration: usize) -> Self {
        Self {
            positions: PositionsHistory::new(),
            schedule: GatesSchedule::default(),
            ms_duration,
            output_order: (0..num_ions).collect(),
        }
    }

    /// Number of steps
    pub fn num_steps(&self) -> usize {
        self.positions.len()
    }

    /// Number of ions
    pub fn num_ions(&self) -> usize {
        self.output_order.len()
    }

    /// Coordinate-based export
    pub fn export(&self, graph: &TrapGraph) -> ProgramExport {
        let coord = |n: NodeId| graph.node(n).map_or(Coord::new(-1, -1), |node| node.coord);

        let positions_history = self
            .positions
            .frames()
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|p| match *p {
                        Position::At(n) => PositionEntry::At(coord(n)),
                        Position::Idle(n) => PositionEntry::Idle(coord(n)),
                    })
                    .collect()
            })
            .collect();

        let gates_schedule = self
            .schedule
            .steps()
            .iter()
            .map(|s| StepExport {
                step: s.step,
                gates: s
                    .gates
                    .iter()
                    .map(|g| GateEntry {
                        kind: g.kind().label().to_string(),
                        ions: g.ions(),
                        angle: g.angle(),
                        logical: g.provenance().gate.to_string(),
                    })
                    .collect(),
            })
            .collect();

        ProgramExport {
            num_steps: self.num_steps(),
            ms_duration: self.ms_duration,
            output_order: self.output_order.clone(),
            positions_history,
            gates_schedule,
        }
    }
}

// ============================================================================
// Export
// ============================================================================

/// Exported position: `{"at": {"x", "y"}}` or `{"idle": {"x", "y"}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionEntry {
    /// On a trap node
    At(Coord),
    /// In the rest slot of the node at this coordinate
    Idle(Coord),
}

/// Exported gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEntry {
    /// `rx`, `ry` or `ms`
    pub kind: String,
    /// Participating ions
    pub ions: Vec<IonId>,
    /// Angle or MS phase
    pub angle: Angle,
    /// Logical origin
    pub logical: String,
}

/// Exported schedule step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExport {
    /// Step index
    pub step: Step,
    /// Gates starting here
    pub gates: Vec<GateEntry>,
}

/// Exported program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramExport {
    /// Number of steps
    pub num_steps: usize,
    /// MS duration in steps
    pub ms_duration: usize,
    /// Output relabelling
    pub output_order: Vec<IonId>,
    /// Positions per step
    pub positions_history: Vec<Vec<PositionEntry>>,
    /// Gates per step
    pub gates_schedule: Vec<StepExport>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{LogicalGate, Provenance};

    fn tag() -> Provenance {
        Provenance::new(0, LogicalGate::Hadamard(0))
    }

    #[test]
    fn test_schedule_growth() {
        let mut schedule = GatesSchedule::with_len(2);
        schedule.add(4, NativeGate::rx(0, 1.0, tag()));
        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule.steps()[3].step, 3);
        assert_eq!(schedule.gates_at(4).len(), 1);
        assert!(schedule.gates_at(9).is_empty());
        schedule.pad_to(7);
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule.gate_count(), 1);
    }

    #[test]
    fn test_history_queries() {
        let history = PositionsHistory::from_frames(vec![
            vec![Position::At(0), Position::At(2)],
            vec![Position::Idle(0), Position::At(1)],
        ]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.num_ions(), 2);
        assert_eq!(history.position(1, 0), Some(Position::Idle(0)));
        assert_eq!(history.trajectory(1), vec![Position::At(2), Position::At(1)]);
        assert!(history.position(2, 0).is_none());
    }

    #[test]
    fn test_export_uses_coordinates() {
        let graph = TrapGraph::line_with_center_interaction(2);
        let mut program = CompiledProgram::empty(2, 2);
        program.positions.push(vec![Position::At(0), Position::Idle(2)]);
        program.schedule.add(0, NativeGate::ry(0, 0.5, tag()));

        let export = program.export(&graph);
        assert_eq!(export.num_steps, 1);
        assert_eq!(export.positions_history[0][0], PositionEntry::At(Coord::new(0, 0)));
        assert_eq!(export.positions_history[0][1], PositionEntry::Idle(Coord::new(2, 0)));
        assert_eq!(export.gates_schedule[0].gates[0].kind, "ry");

        let json = serde_json::to_string(&export).unwrap();
        assert!(json.contains("\"idle\":{\"x\":2,\"y\":0}"));
    }
}

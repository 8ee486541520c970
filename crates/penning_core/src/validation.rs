//! Program verifier
//!
//! Gantree: L2_Program → Verifier
//!
//! Independent check of a compiled program against the trap rules:
//! occupancy, shuttling legality, gate placement and step alignment.

use crate::error::{PenningError, PenningResult};
use crate::program::{CompiledProgram, Position};
use crate::topology::TrapGraph;
use crate::types::{IonId, NodeId, Step};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ============================================================================
// Violation
// ============================================================================

/// A single broken rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// History and schedule disagree on the step count
    LengthMismatch {
        /// Frames in the positions history
        positions: usize,
        /// Steps in the gate schedule
        schedule: usize,
    },
    /// A frame does not hold one position per ion
    FrameSize {
        /// Step
        step: Step,
        /// Expected ions
        expected: usize,
        /// Positions found
        found: usize,
    },
    /// Position on a node the graph does not have
    UnknownNode {
        /// Step
        step: Step,
        /// Ion
        ion: IonId,
        /// Node id
        node: NodeId,
    },
    /// Rest slot requested on an interaction node
    IdleOnInteraction {
        /// Step
        step: Step,
        /// Ion
        ion: IonId,
        /// Node id
        node: NodeId,
    },
    /// More ions on a node than it can hold
    NodeOverflow {
        /// Step
        step: Step,
        /// Node id
        node: NodeId,
        /// Ions present
        ions: Vec<IonId>,
    },
    /// More than one ion in a rest slot
    SlotOverflow {
        /// Step
        step: Step,
        /// Host node id
        node: NodeId,
        /// Ions present
        ions: Vec<IonId>,
    },
    /// Two ions shared an interaction node without an MS gate between them
    UnpairedSharing {
        /// First step of the shared stay
        step: Step,
        /// Interaction node
        node: NodeId,
        /// The two ions
        ions: [IonId; 2],
    },
    /// Transition that is neither a stay, a hop nor a rest-slot toggle
    IllegalMove {
        /// Step of arrival
        step: Step,
        /// Ion
        ion: IonId,
        /// Previous position
        from: Position,
        /// New position
        to: Position,
    },
    /// Two ions exchanged places across one edge
    Swap {
        /// Step of arrival
        step: Step,
        /// The two ions
        ions: [IonId; 2],
    },
    /// Gate references an ion that does not exist
    IonOutOfRange {
        /// Step
        step: Step,
        /// Ion
        ion: IonId,
    },
    /// Ion claimed by two gates at once
    IonBusy {
        /// Step
        step: Step,
        /// Ion
        ion: IonId,
    },
    /// Single-ion gate off a standard node
    WrongNodeKind {
        /// Step
        step: Step,
        /// Ion
        ion: IonId,
        /// Position at that step
        position: Position,
    },
    /// MS ions not together on one interaction node for the whole window
    MsNotColocated {
        /// Gate start step
        step: Step,
        /// Offending step in the window
        at: Step,
        /// The two ions
        ions: [IonId; 2],
    },
    /// MS window runs past the last step
    MsOutOfRange {
        /// Gate start step
        step: Step,
        /// The two ions
        ions: [IonId; 2],
    },
    /// MS with the same ion twice
    SelfInteraction {
        /// Step
        step: Step,
        /// Ion
        ion: IonId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::LengthMismatch {
                positions,
                schedule,
            } => write!(
                f,
                "positions history has {} steps, gate schedule has {}",
                positions, schedule
            ),
            Violation::FrameSize {
                step,
                expected,
                found,
            } => write!(
                f,
                "step {}: {} positions for {} ions",
                step, found, expected
            ),
            Violation::UnknownNode { step, ion, node } => {
                write!(f, "step {}: ion {} on unknown node {}", step, ion, node)
            }
            Violation::IdleOnInteraction { step, ion, node } => write!(
                f,
                "step {}: ion {} idle at interaction node {}",
                step, ion, node
            ),
            Violation::NodeOverflow { step, node, ions } => {
                write!(f, "step {}: node {} holds ions {:?}", step, node, ions)
            }
            Violation::SlotOverflow { step, node, ions } => write!(
                f,
                "step {}: rest slot of node {} holds ions {:?}",
                step, node, ions
            ),
            Violation::UnpairedSharing { step, node, ions } => write!(
                f,
                "step {}: ions {} and {} share interaction node {} without an MS",
                step, ions[0], ions[1], node
            ),
            Violation::IllegalMove {
                step,
                ion,
                from,
                to,
            } => write!(
                f,
                "step {}: ion {} cannot move {} -> {}",
                step, ion, from, to
            ),
            Violation::Swap { step, ions } => write!(
                f,
                "step {}: ions {} and {} swap places",
                step, ions[0], ions[1]
            ),
            Violation::IonOutOfRange { step, ion } => {
                write!(f, "step {}: gate on unknown ion {}", step, ion)
            }
            Violation::IonBusy { step, ion } => {
                write!(f, "step {}: ion {} already claimed by a gate", step, ion)
            }
            Violation::WrongNodeKind {
                step,
                ion,
                position,
            } => write!(
                f,
                "step {}: single-ion gate on ion {} at {} (needs a standard node)",
                step, ion, position
            ),
            Violation::MsNotColocated { step, at, ions } => write!(
                f,
                "MS at step {}: ions {} and {} apart at step {}",
                step, ions[0], ions[1], at
            ),
            Violation::MsOutOfRange { step, ions } => write!(
                f,
                "MS at step {} on ions {} and {} runs past the last step",
                step, ions[0], ions[1]
            ),
            Violation::SelfInteraction { step, ion } => {
                write!(f, "step {}: MS uses ion {} twice", step, ion)
            }
        }
    }
}

// ============================================================================
// VerificationReport
// ============================================================================

/// Result of a verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Every violation found
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    /// True when nothing was violated
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Check if no violations were found
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into a result, summarising the first violations
    pub fn into_result(self) -> PenningResult<()> {
        if self.is_valid() {
            return Ok(());
        }
        let summary: Vec<String> = self.violations.iter().take(3).map(|v| v.to_string()).collect();
        Err(PenningError::InvariantViolation(format!(
            "{} violation(s): {}",
            self.violations.len(),
            summary.join("; ")
        )))
    }
}

// ============================================================================
// Verifier
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct MsWindow {
    ions: [IonId; 2],
    start: Step,
    end: Step,
}

/// Program verifier
/// Gantree: Verifier // 검증기
pub struct Verifier<'a> {
    graph: &'a TrapGraph,
}

impl<'a> Verifier<'a> {
    /// Create a verifier for a trap graph
    pub fn new(graph: &'a TrapGraph) -> Self {
        Self { graph }
    }

    /// Check every rule and collect the violations
    /// Gantree: verify(program) -> VerificationReport // 전체 검증
    pub fn verify(&self, program: &CompiledProgram) -> VerificationReport {
        let mut violations = Vec::new();
        let steps = program.positions.len();

        if steps != program.schedule.len() {
            violations.push(Violation::LengthMismatch {
                positions: steps,
                schedule: program.schedule.len(),
            });
        }

        let frames_ok = self.check_frames(program, &mut violations);
        if frames_ok {
            self.check_moves(program, &mut violations);
            let windows = self.check_gates(program, &mut violations);
            self.check_sharing(program, &windows, &mut violations);
        }

        VerificationReport { violations }
    }

    /// Occupancy and node validity per frame. Returns false when frames are
    /// too malformed for the remaining checks.
    fn check_frames(&self, program: &CompiledProgram, out: &mut Vec<Violation>) -> bool {
        let num_ions = program.num_ions();
        let mut ok = true;

        for (step, frame) in program.positions.frames().iter().enumerate() {
            if frame.len() != num_ions {
                out.push(Violation::FrameSize {
                    step,
                    expected: num_ions,
                    found: frame.len(),
                });
                ok = false;
                continue;
            }

            let mut on_node: BTreeMap<NodeId, Vec<IonId>> = BTreeMap::new();
            let mut in_slot: BTreeMap<NodeId, Vec<IonId>> = BTreeMap::new();

            for (ion, pos) in frame.iter().enumerate() {
                let node = pos.node();
                if self.graph.node(node).is_none() {
                    out.push(Violation::UnknownNode { step, ion, node });
                    ok = false;
                    continue;
                }
                match pos {
                    Position::At(n) => on_node.entry(*n).or_default().push(ion),
                    Position::Idle(n) => {
                        if self.graph.is_interaction(*n) {
                            out.push(Violation::IdleOnInteraction {
                                step,
                                ion,
                                node: *n,
                            });
                        }
                        in_slot.entry(*n).or_default().push(ion);
                    }
                }
            }

            for (node, ions) in on_node {
                let capacity = if self.graph.is_interaction(node) { 2 } else { 1 };
                if ions.len() > capacity {
                    out.push(Violation::NodeOverflow { step, node, ions });
                }
            }
            for (node, ions) in in_slot {
                if ions.len() > 1 {
                    out.push(Violation::SlotOverflow { step, node, ions });
                }
            }
        }
        ok
    }

    fn check_moves(&self, program: &CompiledProgram, out: &mut Vec<Violation>) {
        let frames = program.positions.frames();
        for step in 1..frames.len() {
            let prev = &frames[step - 1];
            let cur = &frames[step];

            for ion in 0..cur.len() {
                let (from, to) = (prev[ion], cur[ion]);
                let legal = match (from, to) {
                    (a, b) if a == b => true,
                    (Position::At(a), Position::At(b)) => self.graph.is_adjacent(a, b),
                    (Position::At(a), Position::Idle(b)) | (Position::Idle(a), Position::At(b)) => {
                        a == b
                    }
                    (Position::Idle(_), Position::Idle(_)) => false,
                };
                if !legal {
                    out.push(Violation::IllegalMove {
                        step,
                        ion,
                        from,
                        to,
                    });
                }
            }

            for a in 0..cur.len() {
                if prev[a] == cur[a] {
                    continue;
                }
                for b in (a + 1)..cur.len() {
                    if prev[a] == cur[b] && prev[b] == cur[a] {
                        out.push(Violation::Swap {
                            step,
                            ions: [a, b],
                        });
                    }
                }
            }
        }
    }

    fn check_gates(&self, program: &CompiledProgram, out: &mut Vec<Violation>) -> Vec<MsWindow> {
        let num_ions = program.num_ions();
        let steps = program.positions.len();
        let duration = program.ms_duration.max(1);
        let mut busy_until = vec![0usize; num_ions];
        let mut windows = Vec::new();

        for (step, gate) in program.schedule.iter_gates() {
            let ions = gate.ions();
            if let Some(&bad) = ions.iter().find(|&&i| i >= num_ions) {
                out.push(Violation::IonOutOfRange { step, ion: bad });
                continue;
            }

            let span = if gate.is_two_qubit() { duration } else { 1 };
            for &ion in &ions {
                if busy_until[ion] > step {
                    out.push(Violation::IonBusy { step, ion });
                }
                busy_until[ion] = busy_until[ion].max(step + span);
            }

            if gate.is_single_qubit() {
                let ion = ions[0];
                match program.positions.position(step, ion) {
                    Some(Position::At(n)) if self.graph.is_standard(n) => {}
                    Some(position) => out.push(Violation::WrongNodeKind {
                        step,
                        ion,
                        position,
                    }),
                    None => out.push(Violation::LengthMismatch {
                        positions: steps,
                        schedule: program.schedule.len(),
                    }),
                }
                continue;
            }

            let pair = [ions[0], ions[1]];
            if pair[0] == pair[1] {
                out.push(Violation::SelfInteraction { step, ion: pair[0] });
                continue;
            }
            if step + duration > steps {
                out.push(Violation::MsOutOfRange { step, ions: pair });
                continue;
            }
            for at in step..step + duration {
                let pa = program.positions.position(at, pair[0]);
                let pb = program.positions.position(at, pair[1]);
                let together = match (pa, pb) {
                    (Some(Position::At(a)), Some(Position::At(b))) => {
                        a == b && self.graph.is_interaction(a)
                    }
                    _ => false,
                };
                if !together {
                    out.push(Violation::MsNotColocated {
                        step,
                        at,
                        ions: pair,
                    });
                    break;
                }
            }
            windows.push(MsWindow {
                ions: ordered(pair[0], pair[1]),
                start: step,
                end: step + duration,
            });
        }
        windows
    }

    /// Two ions on one interaction node must be an MS pair whose gate window
    /// lies inside their shared stay.
    fn check_sharing(&self, program: &CompiledProgram, windows: &[MsWindow], out: &mut Vec<Violation>) {
        let frames = program.positions.frames();
        let mut open: HashMap<(NodeId, [IonId; 2]), Step> = HashMap::new();

        let close = |key: (NodeId, [IonId; 2]), start: Step, end: Step, out: &mut Vec<Violation>| {
            let covered = windows
                .iter()
                .any(|w| w.ions == key.1 && w.start >= start && w.end <= end);
            if !covered {
                out.push(Violation::UnpairedSharing {
                    step: start,
                    node: key.0,
                    ions: key.1,
                });
            }
        };

        for (step, frame) in frames.iter().enumerate() {
            let mut shared: BTreeMap<NodeId, Vec<IonId>> = BTreeMap::new();
            for (ion, pos) in frame.iter().enumerate() {
                if let Position::At(n) = *pos {
                    if self.graph.is_interaction(n) {
                        shared.entry(n).or_default().push(ion);
                    }
                }
            }
            let current: Vec<(NodeId, [IonId; 2])> = shared
                .into_iter()
                .filter(|(_, ions)| ions.len() == 2)
                .map(|(n, ions)| (n, ordered(ions[0], ions[1])))
                .collect();

            let ended: Vec<(NodeId, [IonId; 2])> = open
                .keys()
                .filter(|k| !current.contains(k))
                .copied()
                .collect();
            for key in ended {
                if let Some(start) = open.remove(&key) {
                    close(key, start, step, out);
                }
            }
            for key in current {
                open.entry(key).or_insert(step);
            }
        }

        let mut rest: Vec<_> = open.into_iter().collect();
        rest.sort();
        for (key, start) in rest {
            close(key, start, frames.len(), out);
        }
    }
}

fn ordered(a: IonId, b: IonId) -> [IonId; 2] {
    [a.min(b), a.max(b)]
}

// ============================================================================
// Tests
// ============================================================================

//! Rest-slot idling
//!
//! Gantree: L4_Shuttle → RestPass
//!
//! Post-pass over a finished plan: an ion that sits gate-free on a standard
//! node long enough is moved into that node's rest slot and returns one step
//! before it is next needed.

use log::debug;
use penning_core::{GatesSchedule, NodeId, Position, PositionsHistory, TrapGraph};

/// Idle conversion of long gate-free stays
/// Gantree: RestPass // 휴지 슬롯 변환
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestPass {
    /// Stationary steps before an ion is moved to its rest slot
    pub threshold: usize,
    /// Steps an MS keeps its ions busy
    pub ms_duration: usize,
}

impl RestPass {
    /// Pass with the given threshold (at least 1)
    pub fn new(threshold: usize, ms_duration: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            ms_duration,
        }
    }

    /// Rewrite `history`, returning the new history and the number of
    /// frames turned idle
    pub fn apply(
        &self,
        graph: &TrapGraph,
        history: &PositionsHistory,
        schedule: &GatesSchedule,
    ) -> (PositionsHistory, usize) {
        let len = history.len();
        let num_ions = history.num_ions();
        let mut frames = history.frames().to_vec();

        let mut busy = vec![vec![false; len]; num_ions];
        for (step, gate) in schedule.iter_gates() {
            let span = if gate.is_two_qubit() { self.ms_duration } else { 1 };
            for ion in gate.ions() {
                if ion < num_ions {
                    for flag in busy[ion].iter_mut().skip(step).take(span) {
                        *flag = true;
                    }
                }
            }
        }

        let mut converted = 0;
        for ion in 0..num_ions {
            let mut t = 0;
            while t < len {
                let Some(node) = self.stationary_node(graph, &frames, &busy, ion, t) else {
                    t += 1;
                    continue;
                };
                let mut end = t;
                while end + 1 < len
                    && frames[end + 1][ion] == Position::At(node)
                    && !busy[ion][end + 1]
                {
                    end += 1;
                }

                let from = t + self.threshold;
                let to = if end + 1 == len { end } else { end.saturating_sub(1) };
                if from <= to && Self::slot_free(&frames, node, from, to) {
                    for frame in frames.iter_mut().take(to + 1).skip(from) {
                        frame[ion] = Position::Idle(node);
                    }
                    converted += to + 1 - from;
                }
                t = end + 1;
            }
        }

        if converted > 0 {
            debug!("rest pass moved {} ion-steps into rest slots", converted);
        }
        (PositionsHistory::from_frames(frames), converted)
    }

    fn stationary_node(
        &self,
        graph: &TrapGraph,
        frames: &[Vec<Position>],
        busy: &[Vec<bool>],
        ion: usize,
        t: usize,
    ) -> Option<NodeId> {
        match frames[t][ion] {
            Position::At(n) if graph.is_standard(n) && !busy[ion][t] => Some(n),
            _ => None,
        }
    }

    fn slot_free(frames: &[Vec<Position>], node: NodeId, from: usize, to: usize) -> bool {
        frames[from..=to]
            .iter()
            .all(|frame| !frame.contains(&Position::Idle(node)))
    }
}

// ============================================================================
// Tests
// ============================================================================

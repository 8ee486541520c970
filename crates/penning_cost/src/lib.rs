//! # Penning Cost
//!
//! Temperature proxy used to rank compiled trap programs.
//!
//! ## Gantree Architecture
//!
//! ```text
//! penning_cost // L6: Cost
//!     CostWeights // 항목별 가중치
//!     TemperatureModel // 셔틀 + MS 가열 + 스텝
//!         evaluate() - TemperatureReport
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use penning_core::{CompiledProgram, TrapGraph};
//! use penning_cost::{CostWeights, TemperatureModel};
//!
//! let model = TemperatureModel::new(CostWeights::default());
//! let report = model.evaluate(&TrapGraph::penning(), &CompiledProgram::empty(8, 2));
//! assert_eq!(report.shuttles, 0);
//! assert_eq!(report.total_cost, 0.0);
//! ```

#![warn(missing_docs)]

/// Weights (Gantree: L6_Cost → CostWeights)
pub mod weights;

/// Temperature model (Gantree: L6_Cost → TemperatureModel)
pub mod temperature;

pub use temperature::{IonStats, TemperatureModel, TemperatureReport};
pub use weights::CostWeights;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use penning_core::{
        CompiledProgram, GatesSchedule, LogicalGate, NativeGate, Position, PositionsHistory,
        Provenance, TrapGraph,
    };

    // ion 0 walks to ion 1 on the interaction node, either straight or via
    // a detour
    fn meeting(detour: bool) -> CompiledProgram {
        let a = Position::At;
        let mut frames = vec![vec![a(1), a(2)]];
        if detour {
            frames.push(vec![a(0), a(2)]);
            frames.push(vec![a(1), a(2)]);
        }
        frames.push(vec![a(2), a(2)]);
        frames.push(vec![a(2), a(2)]);
        let len = frames.len();
        let mut schedule = GatesSchedule::with_len(len);
        let tag = Provenance::new(1, LogicalGate::Hadamard(0));
        schedule.add(len - 2, NativeGate::ms(0, 1, 0.25, tag));
        let mut p = CompiledProgram::empty(2, 2);
        p.positions = PositionsHistory::from_frames(frames);
        p.schedule = schedule;
        p
    }

    #[test]
    fn test_detour_costs_more() {
        let g = TrapGraph::line_with_center_interaction(4);
        let model = TemperatureModel::default();
        let direct = model.evaluate(&g, &meeting(false));
        let detour = model.evaluate(&g, &meeting(true));
        assert_eq!(direct.shuttles, 1);
        assert_eq!(detour.shuttles, 3);
        assert!(detour.total_cost > direct.total_cost);
        // the waiting ion never hopped
        assert_eq!(direct.per_ion[1].ms_heat, 0);
        assert_eq!(direct.per_ion[1].ms_count, 1);
    }

    #[test]
    fn test_shuttle_only_weights() {
        let g = TrapGraph::line_with_center_interaction(4);
        let model = TemperatureModel::new(CostWeights::shuttle_only());
        let report = model.evaluate(&g, &meeting(true));
        assert_eq!(report.total_cost, 3.0);
        assert!(report.to_json().is_ok());
        assert!(report.to_string().starts_with("Temperature(cost=3.000"));
    }
}

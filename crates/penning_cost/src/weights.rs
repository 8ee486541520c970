//! Cost weights
//!
//! Gantree: L6_Cost → CostWeights
//!
//! Relative weights of the temperature terms. Shuttles and MS heating
//! dominate; total steps matter less; dwell on interaction nodes only
//! separates near-equal candidates.

use penning_core::compiler::DEFAULT_MS_COOLDOWN_STEPS;
use penning_core::{PenningError, PenningResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperature cost weights
/// Gantree: CostWeights // 비용 가중치
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Per main-graph hop
    /// Gantree: shuttle: f64 // 셔틀 가중치
    pub shuttle: f64,

    /// Per unit of MS heat
    /// Gantree: ms_heat: f64 // MS 가열 가중치
    pub ms_heat: f64,

    /// Per program step
    pub step: f64,

    /// Per ion-step on an interaction node
    pub dwell: f64,

    /// Per rest-slot toggle
    pub park: f64,

    /// Steps an ion needs after a hop before an MS runs cold
    pub ms_cooldown_steps: usize,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            shuttle: 1.0,
            ms_heat: 2.0,
            step: 0.5,
            dwell: 0.01,
            park: 0.0,
            ms_cooldown_steps: DEFAULT_MS_COOLDOWN_STEPS,
        }
    }
}

impl CostWeights {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Only shuttles count
    pub fn shuttle_only() -> Self {
        Self {
            shuttle: 1.0,
            ms_heat: 0.0,
            step: 0.0,
            dwell: 0.0,
            park: 0.0,
            ms_cooldown_steps: DEFAULT_MS_COOLDOWN_STEPS,
        }
    }

    /// Set the shuttle weight
    pub fn with_shuttle(mut self, w: f64) -> Self {
        self.shuttle = w;
        self
    }

    /// Set the MS heat weight
    pub fn with_ms_heat(mut self, w: f64) -> Self {
        self.ms_heat = w;
        self
    }

    /// Set the step weight
    pub fn with_step(mut self, w: f64) -> Self {
        self.step = w;
        self
    }

    /// Set the park weight
    pub fn with_park(mut self, w: f64) -> Self {
        self.park = w;
        self
    }

    /// Set the cooldown
    pub fn with_cooldown(mut self, steps: usize) -> Self {
        self.ms_cooldown_steps = steps;
        self
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Heat window: an MS that starts this many steps after the last hop or
    /// later adds no heat
    pub fn heat_window(&self) -> usize {
        self.ms_cooldown_steps + 1
    }

    /// Validate: every weight finite and non-negative
    pub fn validate(&self) -> PenningResult<()> {
        let fields = [
            ("shuttle", self.shuttle),
            ("ms_heat", self.ms_heat),
            ("step", self.step),
            ("dwell", self.dwell),
            ("park", self.park),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PenningError::InvalidConfig(format!(
                    "cost weight {} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CostWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weights(shuttle={}, heat={}, step={}, dwell={}, park={}, cooldown={})",
            self.shuttle, self.ms_heat, self.step, self.dwell, self.park, self.ms_cooldown_steps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let w = CostWeights::default();
        assert_eq!(w.heat_window(), 3);
        assert!(w.validate().is_ok());
        assert!(w.shuttle < w.ms_heat);
    }

    #[test]
    fn test_rejects_negative() {
        assert!(CostWeights::default().with_step(-1.0).validate().is_err());
        assert!(CostWeights::default()
            .with_shuttle(f64::NAN)
            .validate()
            .is_err());
    }
}

//! Core types for the Penning compiler
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Index aliases shared by every layer plus the grid coordinate and
//! angle helpers.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Ion identifier (0-indexed). Ion `i` carries logical qubit `i`.
/// Gantree: IonId // pub type IonId = usize
pub type IonId = usize;

/// Logical qubit identifier
pub type QubitId = usize;

/// Trap node identifier (arena index into the trap graph)
/// Gantree: NodeId // pub type NodeId = usize
pub type NodeId = usize;

/// Discrete schedule step
pub type Step = usize;

/// Rotation angle in radians
pub type Angle = f64;

// ============================================================================
// Coord
// ============================================================================

/// Grid coordinate of a trap node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row
    pub x: i32,
    /// Column
    pub y: i32,
}

impl Coord {
    /// Create a coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate
    pub fn manhattan(&self, other: &Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Angle Helpers
// ============================================================================

/// Wrap an angle into (-π, π]
pub fn normalize_angle(angle: Angle) -> Angle {
    let two_pi = 2.0 * PI;
    let mut a = angle.rem_euclid(two_pi);
    if a > PI {
        a -= two_pi;
    }
    a
}

/// True when the angle is a multiple of 2π within `eps`
pub fn is_full_turn(angle: Angle, eps: f64) -> bool {
    normalize_angle(angle).abs() < eps
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_manhattan() {
        let a = Coord::new(1, 3);
        assert_eq!(a.manhattan(&Coord::new(1, 4)), 1);
        assert_eq!(a.manhattan(&Coord::new(3, 1)), 4);
        assert_eq!(a.manhattan(&a), 0);
    }

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(2.5 * PI), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_full_turn() {
        assert!(is_full_turn(0.0, 1e-12));
        assert!(is_full_turn(4.0 * PI, 1e-9));
        assert!(is_full_turn(-2.0 * PI, 1e-9));
        assert!(!is_full_turn(PI, 1e-9));
    }
}

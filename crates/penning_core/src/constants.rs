//! Constants for the Penning compiler
//!
//! Gantree: L0_Foundation → Constants
//!
//! Trap geometry of the reference Penning device and compiler defaults.

// ============================================================================
// Trap Geometry
// Gantree: trap // 트랩 상수
// ============================================================================

pub mod trap {
    //! Reference Penning trap layout

    /// Grid rows (x = 0..ROWS)
    pub const ROWS: i32 = 5;

    /// Grid columns (y = 0..COLS)
    pub const COLS: i32 = 7;

    /// Interaction zones, the only nodes able to host an MS gate
    pub const INTERACTION_SITES: [(i32, i32); 6] = [(1, 1), (1, 3), (3, 1), (3, 3), (1, 5), (3, 5)];

    /// Starting position of ions 0..8
    pub const INITIAL_LAYOUT: [(i32, i32); 8] = [
        (0, 1),
        (0, 3),
        (0, 5),
        (1, 6),
        (3, 6),
        (4, 1),
        (4, 3),
        (4, 5),
    ];
}

// ============================================================================
// Compiler Defaults
// Gantree: compiler // 컴파일러 기본값
// ============================================================================

pub mod compiler {
    //! Defaults shared by the pipeline stages

    /// Width of the compiled QFT
    pub const DEFAULT_NUM_IONS: usize = 8;

    /// Steps an MS gate keeps its ions on the interaction node
    pub const DEFAULT_MS_DURATION_STEPS: usize = 2;

    /// Stationary gate-free steps before an ion is moved to its rest slot
    pub const DEFAULT_IDLE_AFTER_STEPS: usize = 6;

    /// Steps after a hop during which an MS gate pays a heating penalty
    pub const DEFAULT_MS_COOLDOWN_STEPS: usize = 2;

    /// Angle comparison tolerance
    pub const ANGLE_EPSILON: f64 = 1e-12;

    /// Unitary equivalence tolerance
    pub const UNITARY_EPSILON: f64 = 1e-9;

    /// Cost comparison tolerance
    pub const COST_EPSILON: f64 = 1e-9;

    /// MS gates in a QFT over `n` qubits
    pub fn qft_ms_count(n: usize) -> usize {
        n * n.saturating_sub(1) / 2
    }
}

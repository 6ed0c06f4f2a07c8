//! Motion control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motion control module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Wheel speed demanded during translations. The commanded magnitude of a
    /// movement governs its distance, never its speed.
    ///
    /// Units: centimeters/second
    pub default_speed_cms: f64,

    /// Fraction of the default speed applied differentially while rotating on
    /// the spot.
    pub turn_speed_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            default_speed_cms: 5.0,
            turn_speed_factor: 0.6,
        }
    }
}

//! Simulated robot parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Separation between the two wheels.
    ///
    /// Units: centimeters
    pub wheel_separation_cm: f64,

    /// Maximum commandable wheel speed, demands beyond it are limited.
    ///
    /// Units: centimeters/second
    pub max_speed_cms: f64,

    /// Initial position in the world frame.
    ///
    /// Units: centimeters
    pub initial_pos_cm: [f64; 2],

    /// Initial heading.
    ///
    /// Units: radians
    pub initial_heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            wheel_separation_cm: 5.1,
            max_speed_cms: 12.8,
            initial_pos_cm: [60.0, 60.0],
            initial_heading_rad: 0.0,
        }
    }
}

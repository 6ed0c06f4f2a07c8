//! # Localisation module
//!
//! This module provides the robot's pose in the world frame. Odometry is
//! supplied by the simulated robot and snapshotted into the data store once
//! per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the world frame) of the robot.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the world frame.
    ///
    /// Units: centimeters
    pub position_cm: Point2<f64>,

    /// The heading of the robot, measured anticlockwise from the world X+
    /// axis.
    ///
    /// Units: radians, normalised to [-pi, pi)
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_cm: f64, y_cm: f64, heading_rad: f64) -> Self {
        Self {
            position_cm: Point2::new(x_cm, y_cm),
            heading_rad,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_cm: Point2::origin(),
            heading_rad: 0.0,
        }
    }
}

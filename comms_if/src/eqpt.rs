//! # Equipment demands
//!
//! Demand definitions for the robot's actuators. The differential drive has
//! exactly two, the left and right wheel motors.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demanded wheel speeds, applied by the motor equipment until changed.
///
/// Equal speeds drive the robot in a straight line, opposite speeds turn it
/// on the spot.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct WheelDems {
    /// The demanded speed of the left wheel.
    ///
    /// Units: centimeters/second, positive forwards
    pub left_speed_cms: f64,

    /// The demanded speed of the right wheel.
    ///
    /// Units: centimeters/second, positive forwards
    pub right_speed_cms: f64,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl WheelDems {
    /// Equal-speed demands for a straight line movement.
    pub fn straight(speed_cms: f64) -> Self {
        Self {
            left_speed_cms: speed_cms,
            right_speed_cms: speed_cms,
        }
    }

    /// Opposite-speed demands for a turn on the spot.
    ///
    /// A positive rate turns to the left (anticlockwise about the robot's
    /// up axis).
    pub fn turn(rate_cms: f64) -> Self {
        Self {
            left_speed_cms: -rate_cms,
            right_speed_cms: rate_cms,
        }
    }
}

//! Motion control module
//!
//! Motion control owns the single in-progress motion. A movement command
//! records the pose at its start and the demanded magnitude; on every cycle
//! the progress is recomputed from the absolute pose, so completion is driven
//! by odometry ground truth rather than by an open-loop timer. A command
//! arriving while a motion is in progress supersedes it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angle of the fixed rotation performed before a chained translation.
///
/// Turn commands always rotate a quarter turn, the commanded magnitude is the
/// distance to travel afterwards.
pub const TURN_TARGET_RAD: f64 = std::f64::consts::FRAC_PI_2;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("Received an invalid movement magnitude: {0}")]
    InvalidMagnitude(f64),
}

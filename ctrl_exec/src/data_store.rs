//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{eqpt::WheelDems, response::Response};

use crate::{loc::Pose, motion_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub sim_time_s: f64,

    // Robot state snapshots
    /// Pose of the robot at the start of this cycle
    pub robot_pose: Pose,

    /// Wheel demands currently applied to the robot
    pub wheel_dems: WheelDems,

    // MotionCtrl
    pub motion_ctrl: motion_ctrl::MotionCtrl,
    pub motion_ctrl_input: motion_ctrl::InputData,
    pub motion_ctrl_output: motion_ctrl::OutputData,
    pub motion_ctrl_status_rpt: motion_ctrl::StatusReport,

    /// Responses queued outside motion control (status answers, parse errors,
    /// the goodbye acknowledgement)
    pub responses: Vec<Response>,

    /// Set when an orderly shutdown has been requested
    pub quit_requested: bool,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets
    /// the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.motion_ctrl_input = motion_ctrl::InputData::default();
        self.motion_ctrl_output = motion_ctrl::OutputData::default();
        self.motion_ctrl_status_rpt = motion_ctrl::StatusReport::default();
        self.responses.clear();

        self.sim_time_s = util::session::get_elapsed_seconds();
    }
}

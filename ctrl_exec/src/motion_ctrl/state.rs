//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{distance, Point2};
use serde::Serialize;

// Internal
use super::{MotionCtrlError, Params, TURN_TARGET_RAD};
use crate::loc::Pose;
use comms_if::{
    cmd::{MoveCmd, MoveDir},
    eqpt::WheelDems,
    response::Response,
};
use util::{maths, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control module state
#[derive(Default)]
pub struct MotionCtrl {
    pub(crate) params: Params,

    pub(crate) phase: Phase,
}

/// Input data to Motion Control.
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// Pose snapshot for this cycle.
    pub pose: Pose,

    /// The command to be executed, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<MotionCmd>,
}

/// Output data from Motion Control.
#[derive(Clone, Debug, Default)]
pub struct OutputData {
    /// New wheel demands, or `None` if the demands are unchanged this cycle.
    pub dems: Option<WheelDems>,

    /// Response lines to be pushed to the client.
    pub responses: Vec<Response>,
}

/// Status report for MotionCtrl processing.
#[derive(Clone, Copy, Serialize, Debug, Default)]
pub struct StatusReport {
    /// True if a motion is in progress.
    pub active: bool,

    /// The phase of the current motion.
    pub phase: Phase,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Commands accepted by motion control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCmd {
    /// Execute a movement request.
    Move(MoveCmd),

    /// Stop the robot immediately.
    Stop,
}

/// The phase of the motion currently in progress.
///
/// Each active phase records its own start snapshot, so progress can be
/// recomputed from the absolute pose every cycle.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum Phase {
    /// No motion in progress.
    Idle,

    /// Straight line motion until the distance from the start position
    /// reaches the target.
    Translating {
        start_pos_cm: Point2<f64>,
        target_cm: f64,
        backward: bool,
    },

    /// Rotation on the spot until a quarter turn from the start heading,
    /// chaining into a translation of the pending distance.
    Rotating {
        start_heading_rad: f64,
        pending_translation_cm: f64,
        left: bool,
    },
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MotionCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MotionCtrlError;

    /// Initialise the MotionCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;

        Ok(())
    }

    /// Perform cyclic processing of Motion Control.
    ///
    /// At most one command is consumed per cycle. On cycles with no command
    /// the in-progress phase is advanced against the pose snapshot.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut output = OutputData::default();

        if let Some(cmd) = input_data.cmd {
            self.handle_cmd(&cmd, &input_data.pose, &mut output)?;
        } else if self.phase != Phase::Idle {
            let (phase, dems, response) = step_phase(self.phase, &input_data.pose, &self.params);

            if phase != self.phase {
                debug!("Motion phase transition: {:?} -> {:?}", self.phase, phase);
            }

            self.phase = phase;
            output.dems = dems;

            if let Some(r) = response {
                output.responses.push(r);
            }
        }

        let report = StatusReport {
            active: self.phase != Phase::Idle,
            phase: self.phase,
        };

        Ok((output, report))
    }
}

impl MotionCtrl {
    /// Handle a newly submitted command.
    ///
    /// A movement command supersedes any motion in progress: the robot is
    /// brought to a stop before the new phase starts.
    fn handle_cmd(
        &mut self,
        cmd: &MotionCmd,
        pose: &Pose,
        output: &mut OutputData,
    ) -> Result<(), MotionCtrlError> {
        // Validate before touching any state, a rejected command must leave
        // the motion in progress untouched
        if let MotionCmd::Move(mv) = cmd {
            if !mv.magnitude_cm.is_finite() || mv.magnitude_cm < 0.0 {
                return Err(MotionCtrlError::InvalidMagnitude(mv.magnitude_cm));
            }
        }

        if self.phase != Phase::Idle {
            debug!("New command supersedes the motion in progress");
            self.halt(output);
        }

        match cmd {
            MotionCmd::Stop => {
                self.halt(output);
                output.responses.push(Response::stopped());
            }
            MotionCmd::Move(mv) => {
                let speed_cms = self.params.default_speed_cms;

                match mv.dir {
                    MoveDir::Forward | MoveDir::Backward => {
                        let backward = mv.dir == MoveDir::Backward;

                        self.phase = Phase::Translating {
                            start_pos_cm: pose.position_cm,
                            target_cm: mv.magnitude_cm,
                            backward,
                        };

                        output.dems = Some(WheelDems::straight(if backward {
                            -speed_cms
                        } else {
                            speed_cms
                        }));
                    }
                    MoveDir::TurnLeft | MoveDir::TurnRight => {
                        let left = mv.dir == MoveDir::TurnLeft;

                        self.phase = Phase::Rotating {
                            start_heading_rad: pose.heading_rad,
                            pending_translation_cm: mv.magnitude_cm,
                            left,
                        };

                        let turn_rate_cms = speed_cms * self.params.turn_speed_factor;
                        output.dems = Some(WheelDems::turn(if left {
                            turn_rate_cms
                        } else {
                            -turn_rate_cms
                        }));
                    }
                }

                output.responses.push(Response::moving(mv.dir, mv.magnitude_cm));
            }
        }

        Ok(())
    }

    /// Bring the robot to a full stop, resetting the phase.
    fn halt(&mut self, output: &mut OutputData) {
        self.phase = Phase::Idle;
        output.dems = Some(WheelDems::default());
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance the phase machine by one cycle against the latest pose snapshot.
///
/// Pure function of the current phase and pose. Returns the new phase, the
/// new wheel demands if they change this cycle (`None` otherwise), and the
/// response to push to the client if a threshold was crossed.
pub fn step_phase(
    phase: Phase,
    pose: &Pose,
    params: &Params,
) -> (Phase, Option<WheelDems>, Option<Response>) {
    match phase {
        Phase::Idle => (phase, None, None),

        Phase::Translating {
            start_pos_cm,
            target_cm,
            backward,
        } => {
            let travelled_cm = distance(&start_pos_cm, &pose.position_cm);

            if travelled_cm >= target_cm {
                (
                    Phase::Idle,
                    Some(WheelDems::default()),
                    Some(Response::move_complete(backward, target_cm)),
                )
            } else {
                (phase, None, None)
            }
        }

        Phase::Rotating {
            start_heading_rad,
            pending_translation_cm,
            ..
        } => {
            let turned_rad = maths::ang_diff_wrapped(pose.heading_rad, start_heading_rad);

            if turned_rad >= TURN_TARGET_RAD {
                // The rotation is done, chain into the pending translation
                // from the pose reached at this point
                (
                    Phase::Translating {
                        start_pos_cm: pose.position_cm,
                        target_cm: pending_translation_cm,
                        backward: false,
                    },
                    Some(WheelDems::straight(params.default_speed_cms)),
                    Some(Response::rotation_complete(pending_translation_cm)),
                )
            } else {
                (phase, None, None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn proc(
        ctrl: &mut MotionCtrl,
        pose: Pose,
        cmd: Option<MotionCmd>,
    ) -> (OutputData, StatusReport) {
        ctrl.proc(&InputData { pose, cmd }).unwrap()
    }

    fn fwd(magnitude_cm: f64) -> MotionCmd {
        MotionCmd::Move(MoveCmd {
            dir: MoveDir::Forward,
            magnitude_cm,
        })
    }

    #[test]
    fn forward_completes_once() {
        let mut ctrl = MotionCtrl::default();

        // Acceptance: full speed ahead and an acknowledgement
        let (out, rpt) = proc(&mut ctrl, Pose::default(), Some(fwd(10.0)));
        assert_eq!(out.dems, Some(WheelDems::straight(5.0)));
        assert_eq!(out.responses.len(), 1);
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Moving forward for 10.0 units"
        );
        assert!(rpt.active);

        // Progress short of the target changes nothing
        for x in &[2.5, 5.0, 9.99] {
            let (out, rpt) = proc(&mut ctrl, Pose::new(*x, 0.0, 0.0), None);
            assert_eq!(out.dems, None);
            assert!(out.responses.is_empty());
            assert!(rpt.active);
        }

        // Crossing the target stops the robot with exactly one completion
        let (out, rpt) = proc(&mut ctrl, Pose::new(10.2, 0.0, 0.0), None);
        assert_eq!(out.dems, Some(WheelDems::default()));
        assert_eq!(out.responses.len(), 1);
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Completed forward movement of 10.0 units"
        );
        assert!(!rpt.active);

        // Once idle further cycles are silent
        let (out, _) = proc(&mut ctrl, Pose::new(10.2, 0.0, 0.0), None);
        assert_eq!(out.dems, None);
        assert!(out.responses.is_empty());
    }

    #[test]
    fn backward_reverses_demands() {
        let mut ctrl = MotionCtrl::default();

        let (out, _) = proc(
            &mut ctrl,
            Pose::default(),
            Some(MotionCmd::Move(MoveCmd {
                dir: MoveDir::Backward,
                magnitude_cm: 4.0,
            })),
        );
        assert_eq!(out.dems, Some(WheelDems::straight(-5.0)));
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Moving backward for 4.0 units"
        );

        let (out, _) = proc(&mut ctrl, Pose::new(-4.0, 0.0, 0.0), None);
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Completed backward movement of 4.0 units"
        );
    }

    #[test]
    fn chained_turn_then_move() {
        let mut ctrl = MotionCtrl::default();

        // Turn left then travel 5: differential demands and the chained ack
        let (out, _) = proc(
            &mut ctrl,
            Pose::default(),
            Some(MotionCmd::Move(MoveCmd {
                dir: MoveDir::TurnLeft,
                magnitude_cm: 5.0,
            })),
        );
        assert_eq!(out.dems, Some(WheelDems::turn(3.0)));
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Turning left 90° then moving 5.0 units"
        );

        // Short of a quarter turn nothing changes
        let (out, _) = proc(&mut ctrl, Pose::new(0.0, 0.0, 1.0), None);
        assert_eq!(out.dems, None);
        assert!(out.responses.is_empty());

        // Quarter turn reached: forward demands and the transition message
        let (out, rpt) = proc(&mut ctrl, Pose::new(0.0, 0.0, 1.6), None);
        assert_eq!(out.dems, Some(WheelDems::straight(5.0)));
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Rotation complete, now moving forward 5.0 units"
        );
        assert!(rpt.active);

        // Travel the pending 5 units and complete
        let (out, _) = proc(&mut ctrl, Pose::new(0.0, 2.0, 1.6), None);
        assert!(out.responses.is_empty());

        let (out, rpt) = proc(&mut ctrl, Pose::new(0.0, 5.0, 1.6), None);
        assert_eq!(out.dems, Some(WheelDems::default()));
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Completed forward movement of 5.0 units"
        );
        assert!(!rpt.active);
    }

    #[test]
    fn turn_right_demands() {
        let mut ctrl = MotionCtrl::default();

        let (out, _) = proc(
            &mut ctrl,
            Pose::default(),
            Some(MotionCmd::Move(MoveCmd {
                dir: MoveDir::TurnRight,
                magnitude_cm: 3.0,
            })),
        );
        assert_eq!(out.dems, Some(WheelDems::turn(-3.0)));
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Turning right 90° then moving 3.0 units"
        );
    }

    #[test]
    fn rotation_wraps_over_angle_boundary() {
        let mut ctrl = MotionCtrl::default();

        // Start a right turn close to the +pi boundary
        let (_, _) = proc(
            &mut ctrl,
            Pose::new(0.0, 0.0, 3.0),
            Some(MotionCmd::Move(MoveCmd {
                dir: MoveDir::TurnRight,
                magnitude_cm: 1.0,
            })),
        );

        // Crossing to -3.0 rad is a turn of ~0.283 rad, not 6.0, so the
        // rotation must not complete here
        let (out, rpt) = proc(&mut ctrl, Pose::new(0.0, 0.0, -3.0), None);
        assert_eq!(out.dems, None);
        assert!(out.responses.is_empty());
        assert!(rpt.active);

        // A wrapped quarter turn does complete
        let (out, _) = proc(&mut ctrl, Pose::new(0.0, 0.0, -1.6), None);
        assert_eq!(out.dems, Some(WheelDems::straight(5.0)));
        assert_eq!(out.responses.len(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut ctrl = MotionCtrl::default();

        for _ in 0..2 {
            let (out, rpt) = proc(&mut ctrl, Pose::default(), Some(MotionCmd::Stop));
            assert_eq!(out.dems, Some(WheelDems::default()));
            assert_eq!(out.responses.len(), 1);
            assert_eq!(out.responses[0].to_string(), "OK: Robot stopped");
            assert!(!rpt.active);
        }
    }

    #[test]
    fn stop_cancels_motion_in_progress() {
        let mut ctrl = MotionCtrl::default();

        let (_, rpt) = proc(&mut ctrl, Pose::default(), Some(fwd(10.0)));
        assert!(rpt.active);

        let (out, rpt) = proc(&mut ctrl, Pose::new(3.0, 0.0, 0.0), Some(MotionCmd::Stop));
        assert_eq!(out.dems, Some(WheelDems::default()));
        assert_eq!(out.responses[0].to_string(), "OK: Robot stopped");
        assert!(!rpt.active);
    }

    #[test]
    fn new_command_supersedes_motion() {
        let mut ctrl = MotionCtrl::default();

        let (_, _) = proc(&mut ctrl, Pose::default(), Some(fwd(10.0)));

        // The new movement starts from the current pose, the old one is gone
        let (out, rpt) = proc(&mut ctrl, Pose::new(3.0, 0.0, 0.0), Some(fwd(2.0)));
        assert_eq!(out.dems, Some(WheelDems::straight(5.0)));
        assert_eq!(out.responses.len(), 1);
        assert!(rpt.active);

        // Completion is measured from the superseding command's start
        let (out, _) = proc(&mut ctrl, Pose::new(5.0, 0.0, 0.0), None);
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Completed forward movement of 2.0 units"
        );
    }

    #[test]
    fn invalid_magnitude_leaves_state_unchanged() {
        let mut ctrl = MotionCtrl::default();

        let (_, _) = proc(&mut ctrl, Pose::default(), Some(fwd(10.0)));
        let phase_before = ctrl.phase;

        let result = ctrl.proc(&InputData {
            pose: Pose::default(),
            cmd: Some(fwd(f64::NAN)),
        });
        assert!(result.is_err());

        // The rejected command must not have touched the motion in progress
        assert_eq!(ctrl.phase, phase_before);
    }

    #[test]
    fn zero_magnitude_completes_immediately() {
        let mut ctrl = MotionCtrl::default();

        let (_, rpt) = proc(&mut ctrl, Pose::default(), Some(fwd(0.0)));
        assert!(rpt.active);

        let (out, rpt) = proc(&mut ctrl, Pose::default(), None);
        assert_eq!(
            out.responses[0].to_string(),
            "OK: Completed forward movement of 0.0 units"
        );
        assert!(!rpt.active);
    }
}

//! # Command processor module
//!
//! The command processor routes parsed commands coming from any source
//! (network client or script) into the relevant modules.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use comms_if::{cmd::Cmd, response::Response};
use ctrl_lib::{data_store::DataStore, motion_ctrl::MotionCmd};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a command.
///
/// Mutates the datastore to pass commands to the different modules.
pub(crate) fn exec(ds: &mut DataStore, cmd: &Cmd) {
    match cmd {
        Cmd::Stop => {
            debug!("Received stop command");
            ds.motion_ctrl_input.cmd = Some(MotionCmd::Stop);
        }

        Cmd::Status => {
            // Point query, answered from this cycle's snapshots without
            // touching the motion state
            ds.responses.push(Response::Status {
                pos_x_cm: ds.robot_pose.position_cm.x,
                pos_y_cm: ds.robot_pose.position_cm.y,
                heading_rad: ds.robot_pose.heading_rad,
                left_speed_cms: ds.wheel_dems.left_speed_cms,
                right_speed_cms: ds.wheel_dems.right_speed_cms,
            });
        }

        Cmd::Quit => {
            debug!("Received quit command");
            ds.quit_requested = true;
            ds.responses.push(Response::goodbye());
        }

        Cmd::Moves(moves) => {
            // Only one motion executes at a time: the first request of a
            // batch is submitted and the remainder is deliberately discarded
            if let Some(first) = moves.first() {
                if moves.len() > 1 {
                    warn!(
                        "Movement batch contains {} requests, only the first is executed",
                        moves.len()
                    );
                }

                ds.motion_ctrl_input.cmd = Some(MotionCmd::Move(*first));
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
    use comms_if::cmd::{MoveCmd, MoveDir};
    use ctrl_lib::loc::Pose;

    #[test]
    fn batch_executes_first_request_only() {
        let mut ds = DataStore::default();

        let cmd = Cmd::from_line("10F;5R;3B").unwrap();
        exec(&mut ds, &cmd);

        assert_eq!(
            ds.motion_ctrl_input.cmd,
            Some(MotionCmd::Move(MoveCmd {
                dir: MoveDir::Forward,
                magnitude_cm: 10.0
            }))
        );
    }

    #[test]
    fn stop_submits_motion_stop() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Cmd::Stop);

        assert_eq!(ds.motion_ctrl_input.cmd, Some(MotionCmd::Stop));
        assert!(ds.responses.is_empty());
    }

    #[test]
    fn status_answers_from_snapshots() {
        let mut ds = DataStore::default();
        ds.robot_pose = Pose::new(60.0, 59.5, -1.5708);
        ds.wheel_dems.left_speed_cms = 5.0;
        ds.wheel_dems.right_speed_cms = 5.0;

        exec(&mut ds, &Cmd::Status);

        assert_eq!(ds.responses.len(), 1);
        assert_eq!(
            ds.responses[0].to_string(),
            "STATUS: pos=(60.00,59.50) angle=-1.57 left_speed=5.00 right_speed=5.00"
        );
        assert_eq!(ds.motion_ctrl_input.cmd, None);
    }

    #[test]
    fn quit_raises_flag_and_acknowledges() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Cmd::Quit);

        assert!(ds.quit_requested);
        assert_eq!(ds.responses[0].to_string(), "OK: Goodbye!");
    }
}

//! # Simulated robot module
//!
//! An ideal differential drive robot integrated from wheel speed demands.
//! This is the in-process stand-in for the external simulation: it is the
//! odometry source the motion controller reads a pose snapshot from each
//! cycle, and the motor sink that applies wheel demands until they change.
//! There is no collision or sensor model.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
pub use params::SimParams;

use crate::loc::Pose;
use comms_if::eqpt::WheelDems;
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The simulated robot.
pub struct SimRobot {
    params: SimParams,

    pose: Pose,

    dems: WheelDems,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimRobot {
    /// Create a new robot at the initial pose given by the parameters.
    pub fn new(params: SimParams) -> Self {
        let pose = Pose::new(
            params.initial_pos_cm[0],
            params.initial_pos_cm[1],
            params.initial_heading_rad,
        );

        Self {
            params,
            pose,
            dems: WheelDems::default(),
        }
    }

    /// The current pose of the robot.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// The wheel demands currently being applied.
    pub fn wheel_dems(&self) -> WheelDems {
        self.dems
    }

    /// Apply new wheel demands, limited to the robot's maximum wheel speed.
    ///
    /// The demands stay in effect until changed again.
    pub fn set_wheel_dems(&mut self, dems: &WheelDems) {
        let max = self.params.max_speed_cms;

        self.dems = WheelDems {
            left_speed_cms: maths::clamp(&dems.left_speed_cms, &-max, &max),
            right_speed_cms: maths::clamp(&dems.right_speed_cms, &-max, &max),
        };

        trace!(
            "Wheel demands set: left = {:.2} cm/s, right = {:.2} cm/s",
            self.dems.left_speed_cms,
            self.dems.right_speed_cms
        );
    }

    /// Integrate the kinematics over one timestep.
    pub fn step(&mut self, dt_s: f64) {
        let linear_cms = 0.5 * (self.dems.left_speed_cms + self.dems.right_speed_cms);
        let angular_rads =
            (self.dems.right_speed_cms - self.dems.left_speed_cms) / self.params.wheel_separation_cm;

        self.pose.position_cm.x += linear_cms * dt_s * self.pose.heading_rad.cos();
        self.pose.position_cm.y += linear_cms * dt_s * self.pose.heading_rad.sin();

        self.pose.heading_rad = wrap_heading(self.pose.heading_rad + angular_rads * dt_s);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise a heading into [-pi, pi).
fn wrap_heading(heading_rad: f64) -> f64 {
    use std::f64::consts::{PI, TAU};

    (heading_rad + PI).rem_euclid(TAU) - PI
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn robot_at_origin() -> SimRobot {
        SimRobot::new(SimParams {
            initial_pos_cm: [0.0, 0.0],
            initial_heading_rad: 0.0,
            ..SimParams::default()
        })
    }

    #[test]
    fn straight_line_integration() {
        let mut robot = robot_at_origin();

        robot.set_wheel_dems(&WheelDems::straight(5.0));

        // 2 s at 5 cm/s along X+
        for _ in 0..20 {
            robot.step(0.1);
        }

        let pose = robot.pose();
        assert!((pose.position_cm.x - 10.0).abs() < 1e-9);
        assert!(pose.position_cm.y.abs() < 1e-9);
        assert!(pose.heading_rad.abs() < 1e-9);
    }

    #[test]
    fn pure_rotation_integration() {
        let mut robot = robot_at_origin();

        // Opposite wheel speeds rotate on the spot at (2 * rate) / separation
        let rate_cms = 3.0;
        robot.set_wheel_dems(&WheelDems::turn(rate_cms));

        let angular_rads = 2.0 * rate_cms / 5.1;
        let time_for_quarter_turn_s = FRAC_PI_2 / angular_rads;

        let steps = (time_for_quarter_turn_s / 0.001) as usize;
        for _ in 0..steps {
            robot.step(0.001);
        }

        let pose = robot.pose();
        assert!((pose.heading_rad - FRAC_PI_2).abs() < 1e-2);
        assert!(pose.position_cm.x.abs() < 1e-9);
        assert!(pose.position_cm.y.abs() < 1e-9);
    }

    #[test]
    fn heading_stays_normalised() {
        let mut robot = SimRobot::new(SimParams {
            initial_pos_cm: [0.0, 0.0],
            initial_heading_rad: 3.0,
            ..SimParams::default()
        });

        // Keep turning left well past the +pi boundary
        robot.set_wheel_dems(&WheelDems::turn(3.0));

        for _ in 0..100 {
            robot.step(0.1);
            let h = robot.pose().heading_rad;
            assert!((-PI..PI).contains(&h), "heading {} not normalised", h);
        }
    }

    #[test]
    fn demands_are_speed_limited() {
        let mut robot = robot_at_origin();

        robot.set_wheel_dems(&WheelDems::straight(100.0));

        let dems = robot.wheel_dems();
        assert_eq!(dems.left_speed_cms, 12.8);
        assert_eq!(dems.right_speed_cms, 12.8);
    }
}

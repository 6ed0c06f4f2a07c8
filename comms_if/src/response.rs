//! # Response line formatting
//!
//! Every line sent back to the client is one of the variants here. The
//! `Display` implementation renders the exact wire format, newline excluded.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::fmt;

// Internal
use crate::cmd::MoveDir;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// A response line sent to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Positive acknowledgement or progress report.
    Ok(String),

    /// A recoverable command fault, reported and forgotten.
    Error(String),

    /// Answer to a status query.
    Status {
        pos_x_cm: f64,
        pos_y_cm: f64,
        heading_rad: f64,
        left_speed_cms: f64,
        right_speed_cms: f64,
    },

    /// Greeting sent on connection, before `Commands`.
    Hello,

    /// Usage line sent on connection, after `Hello`.
    Commands,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Response {
    /// Acknowledgement for an accepted movement request.
    pub fn moving(dir: MoveDir, magnitude_cm: f64) -> Self {
        match dir {
            MoveDir::Forward => Response::Ok(format!(
                "Moving forward for {:.1} units",
                magnitude_cm
            )),
            MoveDir::Backward => Response::Ok(format!(
                "Moving backward for {:.1} units",
                magnitude_cm
            )),
            MoveDir::TurnLeft => Response::Ok(format!(
                "Turning left 90° then moving {:.1} units",
                magnitude_cm
            )),
            MoveDir::TurnRight => Response::Ok(format!(
                "Turning right 90° then moving {:.1} units",
                magnitude_cm
            )),
        }
    }

    /// Progress report for a completed translation.
    pub fn move_complete(backward: bool, magnitude_cm: f64) -> Self {
        let movement = if backward { "backward" } else { "forward" };
        Response::Ok(format!(
            "Completed {} movement of {:.1} units",
            movement, magnitude_cm
        ))
    }

    /// Progress report for a completed rotation chaining into a translation.
    pub fn rotation_complete(pending_translation_cm: f64) -> Self {
        Response::Ok(format!(
            "Rotation complete, now moving forward {:.1} units",
            pending_translation_cm
        ))
    }

    /// Acknowledgement for a stop command.
    pub fn stopped() -> Self {
        Response::Ok(String::from("Robot stopped"))
    }

    /// Acknowledgement for a quit command.
    pub fn goodbye() -> Self {
        Response::Ok(String::from("Goodbye!"))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Response::Ok(msg) => write!(f, "OK: {}", msg),
            Response::Error(msg) => write!(f, "ERROR: {}", msg),
            Response::Status {
                pos_x_cm,
                pos_y_cm,
                heading_rad,
                left_speed_cms,
                right_speed_cms,
            } => write!(
                f,
                "STATUS: pos=({:.2},{:.2}) angle={:.2} left_speed={:.2} right_speed={:.2}",
                pos_x_cm, pos_y_cm, heading_rad, left_speed_cms, right_speed_cms
            ),
            Response::Hello => write!(f, "HELLO: Connected to E-Puck Robot Controller"),
            Response::Commands => write!(
                f,
                "COMMANDS: Use format XF;YB;ZL;WR (e.g., 10F;5R) or stop, status, quit"
            ),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn render_ok_and_error() {
        assert_eq!(
            Response::moving(MoveDir::Forward, 10.0).to_string(),
            "OK: Moving forward for 10.0 units"
        );
        assert_eq!(
            Response::moving(MoveDir::TurnLeft, 5.0).to_string(),
            "OK: Turning left 90° then moving 5.0 units"
        );
        assert_eq!(
            Response::move_complete(false, 10.0).to_string(),
            "OK: Completed forward movement of 10.0 units"
        );
        assert_eq!(
            Response::rotation_complete(5.0).to_string(),
            "OK: Rotation complete, now moving forward 5.0 units"
        );
        assert_eq!(Response::stopped().to_string(), "OK: Robot stopped");
        assert_eq!(
            Response::Error(String::from("Invalid direction 'X'. Use F, B, L, R")).to_string(),
            "ERROR: Invalid direction 'X'. Use F, B, L, R"
        );
    }

    #[test]
    fn render_status_two_decimal_places() {
        let status = Response::Status {
            pos_x_cm: 60.0,
            pos_y_cm: 59.987,
            heading_rad: -1.5708,
            left_speed_cms: 5.0,
            right_speed_cms: -3.0,
        };

        assert_eq!(
            status.to_string(),
            "STATUS: pos=(60.00,59.99) angle=-1.57 left_speed=5.00 right_speed=-3.00"
        );
    }

    #[test]
    fn render_greeting() {
        assert_eq!(
            Response::Hello.to_string(),
            "HELLO: Connected to E-Puck Robot Controller"
        );
        assert_eq!(
            Response::Commands.to_string(),
            "COMMANDS: Use format XF;YB;ZL;WR (e.g., 10F;5R) or stop, status, quit"
        );
    }
}

//! # Command module
//!
//! This module provides the command grammar accepted by the controller. Two
//! wire forms are understood:
//!
//! - Compact: semicolon-separated movement tokens of the form
//!   `<number><letter>`, with letter one of `F`, `B`, `L`, `R`
//!   (case-insensitive), e.g. `"10F;5R"`.
//! - Verbose: `<directive> [<number>]`, with directive one of `forward`,
//!   `turn_left` or `turn_right` (case-insensitive). A missing number takes
//!   a directive-specific default.
//!
//! The bare control words `stop`, `status` and `quit` are recognised
//! independently of either form.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Magnitude applied to a verbose `forward` directive with no number.
pub const DEFAULT_FORWARD_MAGNITUDE_CM: f64 = 5.0;

/// Magnitude applied to a verbose turn directive with no number.
pub const DEFAULT_TURN_MAGNITUDE_CM: f64 = 3.0;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single movement request.
///
/// The magnitude is a distance: the distance to travel for `Forward` and
/// `Backward`, or the distance to travel after the fixed 90 degree turn for
/// `TurnLeft` and `TurnRight`. It never encodes a speed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCmd {
    /// The direction of the movement
    pub dir: MoveDir,

    /// The magnitude of the movement.
    ///
    /// Units: centimeters
    pub magnitude_cm: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// A command accepted by the controller over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// One or more movement requests parsed from a single line.
    Moves(Vec<MoveCmd>),

    /// Stop the robot immediately.
    Stop,

    /// Query the current pose and wheel speeds.
    Status,

    /// Request an orderly shutdown of the controller.
    Quit,
}

/// Possible movement directions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDir {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

/// Possible parsing errors.
///
/// The rendered messages are the exact bodies sent to the client after the
/// `ERROR: ` prefix, so they must not be reworded lightly.
#[derive(Debug, Error)]
pub enum CmdParseError {
    #[error("Invalid command format. Use: XF;YB;ZL;WR (e.g., 10F;5R)")]
    EmptyCommand,

    #[error("Invalid movement format: {0}")]
    InvalidMovementFormat(String),

    #[error("Invalid distance in movement: {0}")]
    InvalidDistance(String),

    #[error("Invalid direction '{0}'. Use F, B, L, R")]
    InvalidDirection(char),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Cmd {
    /// Parse a command from a single line of text.
    ///
    /// Leading and trailing whitespace is ignored. The grammar is selected on
    /// the first character of the line: movement batches always begin with a
    /// number, anything beginning with a letter is treated as a verbose
    /// directive.
    pub fn from_line(line: &str) -> Result<Self, CmdParseError> {
        let line = line.trim();

        if line.is_empty() {
            return Err(CmdParseError::EmptyCommand);
        }

        // Control words bypass both movement grammars
        match line.to_lowercase().as_str() {
            "stop" => return Ok(Cmd::Stop),
            "status" => return Ok(Cmd::Status),
            "quit" => return Ok(Cmd::Quit),
            _ => (),
        }

        // A movement batch always starts with a number
        let first_char = line.chars().next().unwrap();
        if first_char.is_ascii_digit() || first_char == '.' || first_char == '-' || first_char == '+'
        {
            Self::parse_compact(line)
        } else {
            Self::parse_verbose(line)
        }
    }

    /// Parse a compact movement batch, e.g. `"10F;5R"`.
    fn parse_compact(line: &str) -> Result<Self, CmdParseError> {
        let mut moves = Vec::new();

        for token in line.split(';') {
            // Empty tokens are skipped, e.g. "10F;;5R" or a trailing ";"
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let clean: Vec<char> = token.to_uppercase().chars().collect();

            if clean.len() < 2 {
                return Err(CmdParseError::InvalidMovementFormat(token.to_string()));
            }

            // The direction is the last character, the magnitude everything
            // before it
            let dir_char = clean[clean.len() - 1];
            let number_str: String = clean[..clean.len() - 1].iter().collect();

            let magnitude_cm: f64 = match number_str.trim().parse() {
                Ok(m) => m,
                Err(_) => return Err(CmdParseError::InvalidDistance(token.to_string())),
            };

            if !magnitude_cm.is_finite() || magnitude_cm < 0.0 {
                return Err(CmdParseError::InvalidDistance(token.to_string()));
            }

            let dir = match dir_char {
                'F' => MoveDir::Forward,
                'B' => MoveDir::Backward,
                'L' => MoveDir::TurnLeft,
                'R' => MoveDir::TurnRight,
                _ => return Err(CmdParseError::InvalidDirection(dir_char)),
            };

            moves.push(MoveCmd { dir, magnitude_cm });
        }

        if moves.is_empty() {
            return Err(CmdParseError::EmptyCommand);
        }

        Ok(Cmd::Moves(moves))
    }

    /// Parse a verbose directive, e.g. `"forward 10"` or `"turn_left"`.
    fn parse_verbose(line: &str) -> Result<Self, CmdParseError> {
        let mut parts = line.split_whitespace();

        // Guarded by the is_empty check in from_line
        let directive = match parts.next() {
            Some(d) => d.to_lowercase(),
            None => return Err(CmdParseError::EmptyCommand),
        };

        let (dir, default_magnitude_cm) = match directive.as_str() {
            "forward" => (MoveDir::Forward, DEFAULT_FORWARD_MAGNITUDE_CM),
            "turn_left" => (MoveDir::TurnLeft, DEFAULT_TURN_MAGNITUDE_CM),
            "turn_right" => (MoveDir::TurnRight, DEFAULT_TURN_MAGNITUDE_CM),
            _ => return Err(CmdParseError::UnknownCommand(line.to_string())),
        };

        let magnitude_cm = match parts.next() {
            Some(num_str) => {
                let magnitude: f64 = num_str
                    .parse()
                    .map_err(|_| CmdParseError::InvalidDistance(num_str.to_string()))?;

                if !magnitude.is_finite() || magnitude < 0.0 {
                    return Err(CmdParseError::InvalidDistance(num_str.to_string()));
                }

                magnitude
            }
            None => default_magnitude_cm,
        };

        // Anything after the number is not part of the grammar
        if parts.next().is_some() {
            return Err(CmdParseError::UnknownCommand(line.to_string()));
        }

        Ok(Cmd::Moves(vec![MoveCmd { dir, magnitude_cm }]))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_compact_single() {
        assert_eq!(
            Cmd::from_line("10F").unwrap(),
            Cmd::Moves(vec![MoveCmd {
                dir: MoveDir::Forward,
                magnitude_cm: 10.0
            }])
        );
    }

    #[test]
    fn parse_compact_batch() {
        assert_eq!(
            Cmd::from_line("10F;5R;3B;7L").unwrap(),
            Cmd::Moves(vec![
                MoveCmd {
                    dir: MoveDir::Forward,
                    magnitude_cm: 10.0
                },
                MoveCmd {
                    dir: MoveDir::TurnRight,
                    magnitude_cm: 5.0
                },
                MoveCmd {
                    dir: MoveDir::Backward,
                    magnitude_cm: 3.0
                },
                MoveCmd {
                    dir: MoveDir::TurnLeft,
                    magnitude_cm: 7.0
                },
            ])
        );
    }

    #[test]
    fn parse_compact_case_and_whitespace() {
        assert_eq!(
            Cmd::from_line("  2.5f ; ;4r; ").unwrap(),
            Cmd::Moves(vec![
                MoveCmd {
                    dir: MoveDir::Forward,
                    magnitude_cm: 2.5
                },
                MoveCmd {
                    dir: MoveDir::TurnRight,
                    magnitude_cm: 4.0
                },
            ])
        );
    }

    #[test]
    fn parse_compact_errors() {
        // Token shorter than two characters
        match Cmd::from_line("5F;F").unwrap_err() {
            CmdParseError::InvalidMovementFormat(t) => assert_eq!(t, "F"),
            e => panic!("unexpected error: {}", e),
        }

        // Non-numeric magnitude
        match Cmd::from_line("10F;xyB").unwrap_err() {
            CmdParseError::InvalidDistance(t) => assert_eq!(t, "xyB"),
            e => panic!("unexpected error: {}", e),
        }

        // Negative magnitude
        match Cmd::from_line("-5F").unwrap_err() {
            CmdParseError::InvalidDistance(t) => assert_eq!(t, "-5F"),
            e => panic!("unexpected error: {}", e),
        }

        // Unrecognised direction letter
        match Cmd::from_line("10X").unwrap_err() {
            CmdParseError::InvalidDirection(c) => assert_eq!(c, 'X'),
            e => panic!("unexpected error: {}", e),
        }

        // Nothing but separators
        assert!(matches!(
            Cmd::from_line(";;").unwrap_err(),
            CmdParseError::EmptyCommand
        ));
    }

    #[test]
    fn parse_verbose() {
        assert_eq!(
            Cmd::from_line("forward 10").unwrap(),
            Cmd::Moves(vec![MoveCmd {
                dir: MoveDir::Forward,
                magnitude_cm: 10.0
            }])
        );
        assert_eq!(
            Cmd::from_line("TURN_LEFT 4").unwrap(),
            Cmd::Moves(vec![MoveCmd {
                dir: MoveDir::TurnLeft,
                magnitude_cm: 4.0
            }])
        );
    }

    #[test]
    fn parse_verbose_defaults() {
        assert_eq!(
            Cmd::from_line("forward").unwrap(),
            Cmd::Moves(vec![MoveCmd {
                dir: MoveDir::Forward,
                magnitude_cm: DEFAULT_FORWARD_MAGNITUDE_CM
            }])
        );
        assert_eq!(
            Cmd::from_line("turn_right").unwrap(),
            Cmd::Moves(vec![MoveCmd {
                dir: MoveDir::TurnRight,
                magnitude_cm: DEFAULT_TURN_MAGNITUDE_CM
            }])
        );
    }

    #[test]
    fn parse_verbose_errors() {
        match Cmd::from_line("abcF").unwrap_err() {
            CmdParseError::UnknownCommand(l) => assert_eq!(l, "abcF"),
            e => panic!("unexpected error: {}", e),
        }

        match Cmd::from_line("forward ten").unwrap_err() {
            CmdParseError::InvalidDistance(t) => assert_eq!(t, "ten"),
            e => panic!("unexpected error: {}", e),
        }

        assert!(matches!(
            Cmd::from_line("forward 5 3").unwrap_err(),
            CmdParseError::UnknownCommand(_)
        ));
    }

    #[test]
    fn parse_control_words() {
        assert_eq!(Cmd::from_line("stop").unwrap(), Cmd::Stop);
        assert_eq!(Cmd::from_line("STATUS").unwrap(), Cmd::Status);
        assert_eq!(Cmd::from_line(" Quit ").unwrap(), Cmd::Quit);
    }

    #[test]
    fn parse_empty() {
        assert!(matches!(
            Cmd::from_line("   ").unwrap_err(),
            CmdParseError::EmptyCommand
        ));
    }

    #[test]
    fn error_messages_are_wire_bodies() {
        assert_eq!(
            Cmd::from_line("10X").unwrap_err().to_string(),
            "Invalid direction 'X'. Use F, B, L, R"
        );
        assert_eq!(
            Cmd::from_line(";;").unwrap_err().to_string(),
            "Invalid command format. Use: XF;YB;ZL;WR (e.g., 10F;5R)"
        );
    }
}

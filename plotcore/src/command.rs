use thiserror::Error;

use crate::gcode::{Code, Line, ParseError};

/// Commands understood by the plotter.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Command {
    /// G0/G1: Linear move.
    Move(Move),
    /// G4: Dwell. Not timed.
    Dwell,
    /// G21: Millimeter units.
    Millimeters,
    /// G28: Home all axes.
    Home,
    /// G90: Absolute positioning.
    AbsolutePositioning,
    /// G92: Set position, in machine units.
    SetPosition { x: f64, y: f64 },
    /// M18: Disable motors.
    DisableMotors,
    /// M280 P0: Set pen servo height.
    SetPenHeight(f64),
    /// M280 for a servo other than the pen.
    OtherServo,
    /// A code the plotter does not know. It is ignored without reply.
    Unrecognized(Code),
}

/// Linear move, in machine units.
///
/// Each field is `None` when the corresponding word was absent; `Some(0.0)`
/// is a real coordinate.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Move {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub feed_rate: Option<f64>,
}
impl Move {
    /// Target coordinates, if both axes were given.
    pub fn target(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

impl Command {
    /// Parses a line of text into a command.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` for a blank line.
    /// - `Ok(Some(command))` for a well-formed, supported command.
    /// - `Err(_)` if the line is malformed, unsupported, or has invalid
    ///   arguments.
    pub fn parse(input: &str) -> Result<Option<Command>, CommandError> {
        match Line::parse(input)? {
            None => Ok(None),
            Some(line) => Self::from_line(&line).map(Some),
        }
    }

    /// Interprets a parsed line.
    pub fn from_line(line: &Line) -> Result<Command, CommandError> {
        let code = line.code;
        let command = match (code.letter(), code.number()) {
            ('G', 0) | ('G', 1) => Command::Move(Self::parse_move(line)?),
            ('G', 2) | ('G', 3) | ('G', 91) => {
                return Err(CommandError::Unsupported(code))
            }
            ('G', 4) => Command::Dwell,
            ('G', 21) => Command::Millimeters,
            ('G', 28) => Command::Home,
            ('G', 90) => Command::AbsolutePositioning,
            ('G', 92) => match (line.arg('X'), line.arg('Y')) {
                (Some(x), Some(y)) => Command::SetPosition { x, y },
                _ => return Err(CommandError::InvalidArguments(code)),
            },
            ('M', 18) => Command::DisableMotors,
            ('M', 280) => Self::parse_servo(line)?,
            _ => Command::Unrecognized(code),
        };
        Ok(command)
    }

    /// A feed rate that is not positive is an error only when the move has a
    /// target. Without one the move is acknowledged as a no-op and the bad
    /// feed rate is dropped.
    fn parse_move(line: &Line) -> Result<Move, CommandError> {
        let mut mv = Move {
            x: line.arg('X'),
            y: line.arg('Y'),
            feed_rate: line.arg('F'),
        };
        if let Some(f) = mv.feed_rate {
            if !f.is_finite() || f <= 0.0 {
                if mv.target().is_some() {
                    return Err(CommandError::InvalidArguments(line.code));
                }
                mv.feed_rate = None;
            }
        }
        Ok(mv)
    }

    fn parse_servo(line: &Line) -> Result<Command, CommandError> {
        let height = line
            .arg('S')
            .ok_or(CommandError::InvalidArguments(line.code))?;
        match line.arg('P') {
            None => Ok(Command::SetPenHeight(height)),
            Some(index) if index == 0.0 => Ok(Command::SetPenHeight(height)),
            Some(_) => Ok(Command::OtherServo),
        }
    }
}

/// Reasons a line is rejected.
#[derive(Error, Debug, PartialEq, Copy, Clone)]
pub enum CommandError {
    #[error("could not parse line: {0}")]
    Parse(#[from] ParseError),
    #[error("{0} is not supported")]
    Unsupported(Code),
    #[error("invalid arguments for {0}")]
    InvalidArguments(Code),
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(input: &str) -> Result<Option<Command>, CommandError> {
        Command::parse(input)
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Ok(Some(Command::AbsolutePositioning)), parse("G90"));
        assert_eq!(Ok(Some(Command::Millimeters)), parse("G21"));
        assert_eq!(Ok(Some(Command::Home)), parse("G28"));
        assert_eq!(Ok(Some(Command::DisableMotors)), parse("M18"));
        assert_eq!(Ok(Some(Command::Dwell)), parse("G4 P500"));
        assert_eq!(Ok(None), parse(""));
    }

    #[test]
    fn test_move() {
        let expected = Command::Move(Move {
            x: Some(150.0),
            y: Some(75.0),
            feed_rate: Some(3000.0),
        });
        assert_eq!(Ok(Some(expected)), parse("G1 X150 Y75 F3000"));
        assert_eq!(Ok(Some(expected)), parse("G01 X150 Y75 F3000"));
    }

    #[test]
    fn test_move_zero_is_present() {
        let Ok(Some(Command::Move(mv))) = parse("G1 X0 Y50") else {
            panic!("expected a move");
        };
        assert_eq!(Some((0.0, 50.0)), mv.target());
    }

    #[test]
    fn test_move_missing_axis() {
        let Ok(Some(Command::Move(mv))) = parse("G0 X10") else {
            panic!("expected a move");
        };
        assert_eq!(None, mv.target());
    }

    #[test]
    fn test_move_bad_feed_rate() {
        assert_eq!(
            Err(CommandError::InvalidArguments(Code::g(1))),
            parse("G1 X1 Y1 F0")
        );
        assert_eq!(
            Err(CommandError::InvalidArguments(Code::g(0))),
            parse("G0 X1 Y1 F-100")
        );
    }

    #[test]
    fn test_move_missing_axis_drops_bad_feed_rate() {
        let expected = Command::Move(Move {
            x: Some(10.0),
            y: None,
            feed_rate: None,
        });
        assert_eq!(Ok(Some(expected)), parse("G1 X10 F0"));
        assert_eq!(Ok(Some(expected)), parse("G0 X10 F-5"));
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(Err(CommandError::Unsupported(Code::g(91))), parse("G91"));
        assert_eq!(
            Err(CommandError::Unsupported(Code::g(2))),
            parse("G2 X10 Y10")
        );
        assert_eq!(
            Err(CommandError::Unsupported(Code::g(3))),
            parse("G3 X10 Y10")
        );
    }

    #[test]
    fn test_set_position() {
        assert_eq!(
            Ok(Some(Command::SetPosition { x: 0.0, y: 0.0 })),
            parse("G92 X0 Y0")
        );
        assert_eq!(
            Err(CommandError::InvalidArguments(Code::g(92))),
            parse("G92 X10")
        );
        assert_eq!(
            Err(CommandError::InvalidArguments(Code::g(92))),
            parse("G92")
        );
    }

    #[test]
    fn test_servo() {
        assert_eq!(Ok(Some(Command::SetPenHeight(30.0))), parse("M280 P0 S30"));
        assert_eq!(Ok(Some(Command::SetPenHeight(5.0))), parse("M280P0S5"));
        assert_eq!(Ok(Some(Command::SetPenHeight(0.0))), parse("M280 S0"));
        assert_eq!(Ok(Some(Command::OtherServo)), parse("M280 P1 S90"));
        assert_eq!(
            Err(CommandError::InvalidArguments(Code::m(280))),
            parse("M280 P0")
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(Ok(Some(Command::Unrecognized(Code::m(105)))), parse("M105"));
        assert_eq!(
            Ok(Some(Command::Unrecognized(Code::new('T', 0)))),
            parse("T0")
        );
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(
            Err(CommandError::Parse(ParseError::Syntax)),
            parse("G1 X1,5")
        );
    }
}

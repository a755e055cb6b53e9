use core::convert::Infallible;

use tracing::{debug, warn};
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::command::{Command, CommandError};
use crate::motion::{MotionQueue, Segment, Step};
use crate::{MachineConfig, MachineState, PositioningMode, Position};

/// Reply sent back over the link.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Response {
    Ok,
    Error(Reason),
}
impl Response {
    /// Renders the response as it goes over the wire, terminator included.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        let result: Result<(), Infallible> = uwrite!(out, "{}\n\r", self);
        match result {
            Ok(()) => out,
            Err(never) => match never {},
        }
    }
}

impl uDisplay for Response {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            Response::Ok => f.write_str("ok"),
            Response::Error(reason) => uwrite!(f, "error: {}", reason.as_str()),
        }
    }
}

/// Why a line was rejected.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Reason {
    NotSupported,
    InvalidCommand,
    ParseError,
    LineTooLong,
}
impl Reason {
    pub fn as_str(&self) -> &'static str {
        use Reason::*;
        match self {
            NotSupported => "not supported",
            InvalidCommand => "invalid command",
            ParseError => "parse error",
            LineTooLong => "line too long",
        }
    }
}

impl From<&CommandError> for Reason {
    fn from(error: &CommandError) -> Self {
        match error {
            CommandError::Parse(_) => Reason::ParseError,
            CommandError::Unsupported(_) => Reason::NotSupported,
            CommandError::InvalidArguments(_) => Reason::InvalidCommand,
        }
    }
}

/// What a renderer needs to draw one tick.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Frame {
    pub position: Position,
    pub pen_down: bool,
    /// The machine was homed this tick; the canvas should be cleared.
    pub just_homed: bool,
    /// Path covered this tick, if the machine moved.
    pub segment: Option<Segment>,
}

/// Output of one [Session::tick].
#[derive(Debug, PartialEq, Clone)]
pub struct Tick {
    /// Replies in the order they must be sent: the reply to the line handled
    /// this tick, then the acknowledgement of a move that arrived.
    pub responses: heapless::Vec<Response, 2>,
    pub frame: Frame,
}

/// How a dispatched line was resolved.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Outcome {
    /// Reply immediately.
    Reply(Response),
    /// A move was queued; it is acknowledged on arrival.
    Deferred,
    /// Nothing to say (blank line or unknown code).
    Ignored,
}

/// One simulated plotter: machine state plus its motion queue.
#[derive(Debug, Clone)]
pub struct Session {
    state: MachineState,
    queue: MotionQueue,
    homed: bool,
}
impl Session {
    /// Creates a new session, powered on at the origin.
    pub fn new(config: MachineConfig) -> Self {
        Self {
            state: MachineState::new(config),
            queue: MotionQueue::new(),
            homed: false,
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn queue(&self) -> &MotionQueue {
        &self.queue
    }

    /// No moves are pending.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Handles one inbound line.
    pub fn dispatch(&mut self, input: &str) -> Outcome {
        match Command::parse(input) {
            Ok(None) => Outcome::Ignored,
            Ok(Some(command)) => {
                debug!(line = input, ?command, "dispatch");
                self.execute(command)
            }
            Err(error) => {
                warn!(line = input, %error, "rejected");
                Outcome::Reply(Response::Error(Reason::from(&error)))
            }
        }
    }

    /// Advances the interpolator by `dt` seconds.
    pub fn advance(&mut self, dt: f64) -> Option<Step> {
        self.queue.step(&mut self.state, dt)
    }

    /// Runs one simulation tick: dispatch `line` (if any), then advance the
    /// interpolator by `dt`.
    pub fn tick(&mut self, line: Option<&str>, dt: f64) -> Tick {
        let mut responses = heapless::Vec::new();
        self.homed = false;

        if let Some(line) = line {
            if let Outcome::Reply(response) = self.dispatch(line) {
                let _ = responses.push(response);
            }
        }

        let pen_down = self.state.pen_down();
        let step = self.advance(dt);
        if let Some(Step { arrived: true, .. }) = step {
            let _ = responses.push(Response::Ok);
        }

        Tick {
            responses,
            frame: Frame {
                position: self.state.position(),
                pen_down,
                just_homed: self.homed,
                segment: step.map(|step| step.segment),
            },
        }
    }

    fn execute(&mut self, command: Command) -> Outcome {
        use Command::*;
        match command {
            Move(mv) => {
                if let Some(feed_rate) = mv.feed_rate {
                    self.state.set_feed_rate(feed_rate);
                }
                match mv.target() {
                    Some((x, y)) => {
                        self.queue.push(self.state.normalize(x, y));
                        Outcome::Deferred
                    }
                    None => Outcome::Reply(Response::Ok),
                }
            }
            Home => {
                self.queue.clear();
                self.state.set_position(Position::origin());
                self.homed = true;
                Outcome::Reply(Response::Ok)
            }
            SetPosition { x, y } => {
                let position = self.state.normalize(x, y);
                self.state.set_position(position);
                Outcome::Reply(Response::Ok)
            }
            SetPenHeight(height) => {
                self.state.set_pen_height(height);
                Outcome::Reply(Response::Ok)
            }
            AbsolutePositioning => {
                self.state.set_mode(PositioningMode::Absolute);
                Outcome::Reply(Response::Ok)
            }
            Millimeters | DisableMotors | Dwell | OtherServo => {
                Outcome::Reply(Response::Ok)
            }
            Unrecognized(_) => Outcome::Ignored,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    const DT: f64 = 0.01;
    const NOT_SUPPORTED: Response = Response::Error(Reason::NotSupported);
    const INVALID: Response = Response::Error(Reason::InvalidCommand);

    fn responses(tick: &Tick) -> Vec<Response> {
        tick.responses.iter().copied().collect()
    }

    /// Ticks without input until the machine is idle; returns every response.
    fn drain(session: &mut Session) -> Vec<Response> {
        let mut out = Vec::new();
        for _ in 0..1_000_000 {
            if session.is_idle() {
                return out;
            }
            out.extend(session.tick(None, DT).responses);
        }
        panic!("session never went idle");
    }

    #[test]
    fn test_wire_format() {
        assert_eq!("ok\n\r", Response::Ok.to_wire());
        assert_eq!("error: not supported\n\r", NOT_SUPPORTED.to_wire());
        assert_eq!("error: invalid command\n\r", INVALID.to_wire());
    }

    #[test]
    fn test_confirmations() {
        let mut session = Session::default();
        for line in ["G90", "G21", "M18", "G4 P100", "M280 P0 S5"] {
            assert_eq!(Outcome::Reply(Response::Ok), session.dispatch(line));
        }
        assert!(session.state().pen_down());
    }

    #[test]
    fn test_unrecognized_is_silent() {
        let mut session = Session::default();
        assert_eq!(Outcome::Ignored, session.dispatch("M105"));
        assert_eq!(Outcome::Ignored, session.dispatch(""));
        assert!(session.tick(Some("M115"), DT).responses.is_empty());
    }

    #[test]
    fn test_parse_error_reply() {
        let mut session = Session::default();
        assert_eq!(
            Outcome::Reply(Response::Error(Reason::ParseError)),
            session.dispatch("G1 Xabc")
        );
    }

    #[test]
    fn test_unsupported_leaves_state() {
        let mut session = Session::default();
        session.dispatch("G92 X30 Y30");
        session.dispatch("G1 X90 Y90 F1200");
        let before = session.state().clone();
        let queued = session.queue().len();

        for line in ["G91", "G2 X10 Y10", "G3 X10 Y10"] {
            assert_eq!(Outcome::Reply(NOT_SUPPORTED), session.dispatch(line));
        }
        assert_eq!(before.position(), session.state().position());
        assert_eq!(before.feed_rate(), session.state().feed_rate());
        assert_eq!(queued, session.queue().len());
    }

    #[test]
    fn test_set_position_requires_both_axes() {
        let mut session = Session::default();
        assert_eq!(Outcome::Reply(INVALID), session.dispatch("G92 X10"));
        assert_eq!(Outcome::Reply(INVALID), session.dispatch("G92 Y10"));
        assert_eq!(Position::origin(), session.state().position());
    }

    #[test]
    fn test_set_position_at_origin() {
        let mut session = Session::default();
        let tick = session.tick(Some("G92 X0 Y0"), DT);
        assert_eq!(vec![Response::Ok], responses(&tick));
        assert_eq!(Position::origin(), tick.frame.position);
        assert!(!tick.frame.position.x.is_nan());
    }

    #[test]
    fn test_move_is_deferred() {
        let mut session = Session::default();
        let tick = session.tick(Some("G1 X150 Y150 F18000"), DT);
        assert!(tick.responses.is_empty());
        assert_eq!(1, session.queue().len());
        assert_eq!(18_000.0, session.state().feed_rate());

        // 71 ticks in total, the first one above included.
        let mut acks = 0;
        for n in 2..=71 {
            let tick = session.tick(None, DT);
            acks += tick.responses.len();
            if n < 71 {
                assert_eq!(0, acks, "acknowledged early on tick {}", n);
            }
        }
        assert_eq!(1, acks);
        assert_eq!(Position::new(0.5, 0.5), session.state().position());
        assert!(session.is_idle());
    }

    #[test]
    fn test_move_with_zero_coordinate_enqueues() {
        let mut session = Session::default();
        assert_eq!(Outcome::Deferred, session.dispatch("G1 X0 Y50"));
        assert_eq!(Some(Position::new(0.0, 50.0 / 300.0)), session.queue().head());
    }

    #[test]
    fn test_move_missing_axis_acks_immediately() {
        let mut session = Session::default();
        assert_eq!(Outcome::Reply(Response::Ok), session.dispatch("G1 X10 F600"));
        assert!(session.is_idle());
        assert_eq!(600.0, session.state().feed_rate());
    }

    #[test]
    fn test_move_missing_axis_ignores_bad_feed_rate() {
        let mut session = Session::default();
        let feed_rate = session.state().feed_rate();
        assert_eq!(Outcome::Reply(Response::Ok), session.dispatch("G1 X10 F0"));
        assert!(session.is_idle());
        assert_eq!(feed_rate, session.state().feed_rate());
    }

    #[test]
    fn test_overflowing_coordinate_is_parse_error() {
        let mut session = Session::default();
        let line = format!("G92 X1{} Y0", "0".repeat(400));
        assert_eq!(
            Outcome::Reply(Response::Error(Reason::ParseError)),
            session.dispatch(&line)
        );
        assert_eq!(Position::origin(), session.state().position());

        assert_eq!(Outcome::Deferred, session.dispatch("G1 X10 Y10"));
        assert_eq!(vec![Response::Ok], drain(&mut session));
    }

    #[test]
    fn test_move_from_far_position_arrives() {
        let mut session = Session::default();
        let line = format!("G92 X1{} Y0", "0".repeat(80));
        assert_eq!(Outcome::Reply(Response::Ok), session.dispatch(&line));

        assert_eq!(Outcome::Deferred, session.dispatch("G1 X30 Y30"));
        assert_eq!(vec![Response::Ok], drain(&mut session));
        assert_eq!(Position::new(0.1, 0.1), session.state().position());
    }

    #[test]
    fn test_move_to_current_position_acks_same_tick() {
        let mut session = Session::default();
        let tick = session.tick(Some("G0 X0 Y0"), DT);
        assert_eq!(vec![Response::Ok], responses(&tick));
    }

    #[test]
    fn test_home_mid_motion() {
        let mut session = Session::default();
        session.dispatch("G1 X300 Y300 F600");
        session.dispatch("G1 X0 Y300");
        for _ in 0..10 {
            assert!(session.tick(None, DT).responses.is_empty());
        }
        assert_ne!(Position::origin(), session.state().position());

        let tick = session.tick(Some("G28"), DT);
        assert_eq!(vec![Response::Ok], responses(&tick));
        assert!(tick.frame.just_homed);
        assert_eq!(None, tick.frame.segment);
        assert_eq!(Position::origin(), session.state().position());
        assert!(session.is_idle());

        // The discarded targets never acknowledge.
        for _ in 0..100 {
            let tick = session.tick(None, DT);
            assert!(tick.responses.is_empty());
            assert!(!tick.frame.just_homed);
        }
    }

    #[test]
    fn test_reply_precedes_arrival_ack() {
        let mut session = Session::default();
        session.dispatch("G0 X0 Y0");
        let tick = session.tick(Some("G90"), DT);
        assert_eq!(vec![Response::Ok, Response::Ok], responses(&tick));
    }

    #[test]
    fn test_frame_pen_state() {
        let mut session = Session::default();
        session.dispatch("M280 P0 S0");
        session.dispatch("G1 X30 Y0");
        let tick = session.tick(None, DT);
        assert!(tick.frame.pen_down);
        assert_eq!(
            Some(crate::SegmentKind::Draw),
            tick.frame.segment.map(|s| s.kind)
        );
    }

    #[test]
    fn test_end_to_end() {
        let mut session = Session::default();
        assert_eq!(vec![Response::Ok], responses(&session.tick(Some("G90"), DT)));
        assert_eq!(
            vec![Response::Ok],
            responses(&session.tick(Some("G92 X0 Y0"), DT))
        );
        assert!(session
            .tick(Some("G1 X150 Y150 F18000"), DT)
            .responses
            .is_empty());
        assert_eq!(vec![Response::Ok], drain(&mut session));
        assert_eq!(Position::new(0.5, 0.5), session.state().position());
    }

    proptest! {
        #[test]
        fn set_position_normalizes(x in -300i32..600, y in -300i32..600) {
            let mut session = Session::default();
            let line = format!("G92 X{} Y{}", x, y);
            prop_assert_eq!(Outcome::Reply(Response::Ok), session.dispatch(&line));
            prop_assert_eq!(
                Position::new(x as f64 / 300.0, y as f64 / 300.0),
                session.state().position()
            );
        }
    }

    proptest! {
        #[test]
        fn one_ack_per_move(
            x in 0u32..=300,
            y in 0u32..=300,
            f in 600u32..30_000
        ) {
            let mut session = Session::default();
            let line = format!("G1 X{} Y{} F{}", x, y, f);
            let first = session.tick(Some(&line), DT);
            let mut acks = responses(&first);
            acks.extend(drain(&mut session));
            prop_assert_eq!(vec![Response::Ok], acks);
            prop_assert_eq!(
                Position::new(x as f64 / 300.0, y as f64 / 300.0),
                session.state().position()
            );
        }
    }
}

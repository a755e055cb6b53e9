use embedded_hal_v0::serial;
use tracing::{info, warn};

use crate::session::{Frame, Reason, Response, Session};
use crate::transport::{LineTransport, TransportError, LINE_CAPACITY};
use crate::MachineConfig;

/// Consumer of the frames produced each tick.
pub trait Renderer {
    /// Presents the frame for one tick.
    fn present(&mut self, frame: &Frame);
}

/// Collects frames; useful for tests and offline rendering.
impl Renderer for Vec<Frame> {
    fn present(&mut self, frame: &Frame) {
        self.push(*frame);
    }
}

/// Tick loop binding a line transport to a session and a renderer.
///
/// Each [Simulator::step] performs, in order: one non-blocking poll, dispatch
/// of the line obtained (if any), one interpolator step. Responses are then
/// written in order and the frame is presented.
pub struct Simulator<C, R, const N: usize = LINE_CAPACITY> {
    transport: LineTransport<C, N>,
    session: Session,
    renderer: R,
    dt: f64,
    ticks: u64,
}
impl<C, E, R, const N: usize> Simulator<C, R, N>
where
    C: serial::Read<u8, Error = E> + serial::Write<u8, Error = E>,
    R: Renderer,
{
    /// Creates a new simulator ticking at `config.tick`.
    pub fn new(channel: C, renderer: R, config: MachineConfig) -> Self {
        info!(
            axis_travel = config.axis_travel,
            tick = config.tick,
            "plotter powered on"
        );
        Self {
            transport: LineTransport::new(channel),
            session: Session::new(config),
            renderer,
            dt: config.tick,
            ticks: 0,
        }
    }

    /// Runs one tick.
    ///
    /// A line that overflowed the transport buffer is answered with
    /// `error: line too long`. Only channel failures are returned as errors.
    pub fn step(&mut self) -> Result<Frame, TransportError<E>> {
        let (line, overflowed) = match self.transport.poll() {
            Ok(line) => (line, false),
            Err(TransportError::LineTooLong) => {
                warn!("discarded an over-long line");
                (None, true)
            }
            Err(error) => return Err(error),
        };

        let tick = self.session.tick(line.as_deref(), self.dt);
        self.ticks += 1;

        if overflowed {
            let response = Response::Error(Reason::LineTooLong);
            self.transport.send(&response.to_wire())?;
        }
        for response in &tick.responses {
            self.transport.send(&response.to_wire())?;
        }
        self.renderer.present(&tick.frame);

        Ok(tick.frame)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn transport(&self) -> &LineTransport<C, N> {
        &self.transport
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds of simulated time elapsed.
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.dt
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::{duplex, DuplexEnd};
    use crate::Position;

    fn simulator() -> (Simulator<DuplexEnd, Vec<Frame>>, DuplexEnd) {
        let (device, host) = duplex();
        let simulator =
            Simulator::new(device, Vec::new(), MachineConfig::default());
        (simulator, host)
    }

    #[test]
    fn test_idle_tick() {
        let (mut simulator, mut host) = simulator();
        let frame = simulator.step().unwrap();
        assert_eq!(Position::origin(), frame.position);
        assert_eq!(None, frame.segment);
        assert_eq!("", host.read_available());
        assert_eq!(1, simulator.renderer().len());
    }

    #[test]
    fn test_reply_goes_over_the_wire() {
        let (mut simulator, mut host) = simulator();
        host.write_str("G91\n");
        simulator.step().unwrap();
        assert_eq!("error: not supported\n\r", host.read_available());
    }

    #[test]
    fn test_line_too_long() {
        let (mut simulator, mut host) = simulator();
        host.write_str(&format!("G1{}\n", " X1".repeat(40)));
        simulator.step().unwrap();
        assert_eq!("error: line too long\n\r", host.read_available());
    }

    #[test]
    fn test_elapsed() {
        let (mut simulator, _host) = simulator();
        for _ in 0..100 {
            simulator.step().unwrap();
        }
        assert_eq!(100, simulator.ticks());
        assert!((simulator.elapsed() - 1.0).abs() < 1e-9);
    }
}

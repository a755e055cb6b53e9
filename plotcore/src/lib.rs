//! Firmware core of a simulated XY pen plotter.
//!
//! Lines of G-code come in over a [transport::LineTransport], are parsed and
//! applied to the machine by a [Session], and moves are drained from a
//! [MotionQueue] one tick at a time.

pub mod command;
pub mod gcode;
mod machine;
mod motion;
mod position;
pub mod session;
pub mod simulator;
pub mod transport;

pub use command::Command;
pub use machine::MachineConfig;
pub use machine::MachineState;
pub use machine::PositioningMode;
pub use motion::MotionQueue;
pub use motion::Segment;
pub use motion::SegmentKind;
pub use motion::Step;
pub use position::Position;
pub use session::Frame;
pub use session::Response;
pub use session::Session;
pub use simulator::Renderer;
pub use simulator::Simulator;

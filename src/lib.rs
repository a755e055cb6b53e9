//! Host side of the plotter simulator: a serial-like channel over stdio and
//! a renderer that logs the pen path.

pub mod renderer;
pub mod stdio;

pub use renderer::TraceRenderer;
pub use stdio::StdioChannel;

use crate::Position;

/// Fixed machine parameters.
///
/// Every field can be overridden; [Default] gives the values of the
/// simulated plotter.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct MachineConfig {
    /// Travel of each axis in machine units (mm). Maps to `1.0` normalized.
    pub axis_travel: f64,
    /// Pen heights above this are "up" (travel only).
    pub pen_threshold: f64,
    /// Simulation tick, in seconds.
    pub tick: f64,
    /// Feed rate at power-on, in machine units per minute.
    pub initial_feed_rate: f64,
    /// Pen height at power-on.
    pub initial_pen_height: f64,
}
impl MachineConfig {
    pub const AXIS_TRAVEL: f64 = 300.0;
    pub const PEN_THRESHOLD: f64 = 10.0;
    pub const TICK: f64 = 0.01;
    pub const INITIAL_FEED_RATE: f64 = 10_000.0;
    pub const INITIAL_PEN_HEIGHT: f64 = 30.0;
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            axis_travel: Self::AXIS_TRAVEL,
            pen_threshold: Self::PEN_THRESHOLD,
            tick: Self::TICK,
            initial_feed_rate: Self::INITIAL_FEED_RATE,
            initial_pen_height: Self::INITIAL_PEN_HEIGHT,
        }
    }
}

/// Positioning mode.
///
/// Relative positioning is rejected, so absolute is the only mode there is.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum PositioningMode {
    #[default]
    Absolute,
}

/// Mutable state of the simulated machine.
#[derive(Debug, Clone)]
pub struct MachineState {
    config: MachineConfig,
    position: Position,
    feed_rate: f64,
    pen_height: f64,
    mode: PositioningMode,
}
impl MachineState {
    /// Creates a machine at the origin with power-on feed rate and pen height.
    pub fn new(config: MachineConfig) -> Self {
        Self {
            config,
            position: Position::origin(),
            feed_rate: config.initial_feed_rate,
            pen_height: config.initial_pen_height,
            mode: PositioningMode::Absolute,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Current (normalized) position.
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Current feed rate, in machine units per minute.
    pub fn feed_rate(&self) -> f64 {
        self.feed_rate
    }

    pub fn set_feed_rate(&mut self, feed_rate: f64) {
        self.feed_rate = feed_rate;
    }

    pub fn pen_height(&self) -> f64 {
        self.pen_height
    }

    pub fn set_pen_height(&mut self, pen_height: f64) {
        self.pen_height = pen_height;
    }

    /// Whether the pen is touching the paper.
    pub fn pen_down(&self) -> bool {
        self.pen_height <= self.config.pen_threshold
    }

    pub fn mode(&self) -> PositioningMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PositioningMode) {
        self.mode = mode;
    }

    /// Converts machine coordinates (mm) to a normalized [Position].
    pub fn normalize(&self, x: f64, y: f64) -> Position {
        Position::new(x / self.config.axis_travel, y / self.config.axis_travel)
    }

    /// Feed rate converted to normalized units per second.
    pub fn speed_limit(&self) -> f64 {
        self.feed_rate / 60.0 / self.config.axis_travel
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

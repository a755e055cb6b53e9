use core::fmt::{self, Display, Formatter};
use core::ops::{Add, Mul, Sub};

/// Tool position in normalized axis coordinates.
///
/// `1.0` on an axis corresponds to the configured axis travel, so `(0.5, 0.5)`
/// is the middle of the bed whatever its size.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}
impl Position {
    /// Creates a new `Position`.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin, `(0, 0)`.
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Euclidean length of the position taken as a vector.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance to another position.
    pub fn distance_to(&self, other: Position) -> f64 {
        (other - *self).norm()
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Position {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Position::new(self.x * rhs, self.y * rhs)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

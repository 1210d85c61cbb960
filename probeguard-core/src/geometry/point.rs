//! 2D points in the stage/camera frame

use core::ops::{Add, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A position in the shared stage/camera frame, in microns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// The frame origin
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check that both coordinates are finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Check if two points coincide within `epsilon` on both axes
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        abs(self.x - other.x) <= epsilon && abs(self.y - other.y) <= epsilon
    }

    /// Largest per-axis distance to another point
    pub fn chebyshev_distance(self, other: Self) -> f64 {
        let dx = abs(self.x - other.x);
        let dy = abs(self.y - other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    /// Linear interpolation toward `other` (`t = 0` is `self`, `t = 1` is `other`)
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl Add for Point2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

fn abs(v: f64) -> f64 {
    if v < 0.0 {
        -v
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(3.0, -1.0);
        assert_eq!(a + b, Point2D::new(4.0, 1.0));
        assert_eq!(b - a, Point2D::new(2.0, -3.0));
    }

    #[test]
    fn test_approx_eq() {
        let a = Point2D::new(10.0, 10.0);
        assert!(a.approx_eq(Point2D::new(10.0 + 1e-9, 10.0), 1e-6));
        assert!(!a.approx_eq(Point2D::new(10.1, 10.0), 1e-6));
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = Point2D::new(0.0, 0.0);
        assert_eq!(a.chebyshev_distance(Point2D::new(3.0, -7.0)), 7.0);
        assert_eq!(a.chebyshev_distance(Point2D::new(-5.0, 2.0)), 5.0);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(6.0, 4.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Point2D::new(3.0, 2.0));
    }

    #[test]
    fn test_non_finite() {
        assert!(Point2D::new(1.0, 2.0).is_finite());
        assert!(!Point2D::new(f64::NAN, 2.0).is_finite());
        assert!(!Point2D::new(1.0, f64::INFINITY).is_finite());
    }
}

//! Canvas-space geometry primitives.
//!
//! All values are `f64` canvas units with the origin at the top-left corner
//! of the container. Native image pixels live in [`crate::coords`].

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing canvas positions produced by float math.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// A point in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// An axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Check whether `other` lies entirely inside this rectangle.
    ///
    /// Edges are compared with [`GEOMETRY_EPSILON`] slack so that clamped
    /// positions which land exactly on a boundary edge still count.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.left <= other.left + GEOMETRY_EPSILON
            && self.top <= other.top + GEOMETRY_EPSILON
            && self.right() + GEOMETRY_EPSILON >= other.right()
            && self.bottom() + GEOMETRY_EPSILON >= other.bottom()
    }
}

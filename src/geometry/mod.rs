//! Planar geometry helpers used by the rectification code.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle in pixel coordinates.
///
/// The rectangle spans `[x, x + width] × [y, y + height]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge, `x + width`.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge, `y + height`.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Grows the rectangle to the bounding box of itself and `point`.
    pub fn join(&mut self, point: &Vector2<f64>) {
        let x1 = self.x.min(point.x);
        let y1 = self.y.min(point.y);
        let x2 = self.right().max(point.x);
        let y2 = self.bottom().max(point.y);

        self.x = x1;
        self.y = y1;
        self.width = x2 - x1;
        self.height = y2 - y1;
    }

    /// Returns true if `other` lies completely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect [x: {} y: {} width: {} height: {}]",
            self.x, self.y, self.width, self.height
        )
    }
}

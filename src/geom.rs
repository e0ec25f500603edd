//! Geometry primitives shared by the editor, the snap engine and the renderer.
//!
//! All types are unit-agnostic `f64` values. Template geometry is in
//! millimeters; surfaces work in their own device units (pixels or points).

use serde::{Deserialize, Serialize};

/// A point in canvas (mm) or device space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Same size, new top-left corner.
    pub fn with_origin(&self, origin: Point) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            ..*self
        }
    }

    /// Uniformly scale position and size (unit conversion).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Clamp `value` into `[0, max]`, treating a negative `max` as 0.
///
/// Used when an element is larger than the canvas: it pins to the origin
/// instead of panicking like `f64::clamp` would.
pub fn clamp_to_span(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(5.0, 5.0, 20.0, 10.0);
        assert_eq!(r.right(), 25.0);
        assert_eq!(r.bottom(), 15.0);
        assert_eq!(r.center_x(), 15.0);
        assert_eq!(r.center_y(), 10.0);
    }

    #[test]
    fn test_rect_scaled() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0).scaled(2.0);
        assert_eq!(r, Rect::new(2.0, 4.0, 6.0, 8.0));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(5.0, 5.0)));
        assert!(r.contains(Point::new(10.0, 0.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_clamp_to_span_negative_max() {
        assert_eq!(clamp_to_span(3.0, -2.0), 0.0);
        assert_eq!(clamp_to_span(-1.0, 5.0), 0.0);
        assert_eq!(clamp_to_span(7.0, 5.0), 5.0);
    }
}

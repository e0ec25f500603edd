//! # Unit Conversion
//!
//! Millimeter, pixel and point conversions.
//!
//! ## Calculations
//!
//! ```text
//! px = mm / 25.4 * dpi
//! pt = px * 0.75          (96 dpi CSS pixel → 72 dpi PDF point)
//!
//! For a 58mm label at 203 DPI:
//!   58 / 25.4 * 203 ≈ 463 dots
//! ```
//!
//! Pointer coordinates are mapped to millimeters per axis, using the canvas'
//! rendered size on screen. The preview may be drawn at a scale factor and
//! need not keep a 1:1 aspect ratio, so x and y are converted independently.

use serde::{Deserialize, Serialize};

use crate::geom::{Point, Size};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Resolution of a CSS pixel. Template font sizes are expressed in CSS px.
pub const CSS_DPI: f64 = 96.0;

/// Resolution of a PDF point.
pub const PDF_DPI: f64 = 72.0;

/// CSS pixel to PDF point ratio (72 / 96).
pub const PX_TO_PT: f64 = 0.75;

/// Convert millimeters to pixels at the given resolution.
pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    mm / MM_PER_INCH * dpi
}

/// Convert pixels at the given resolution to millimeters.
pub fn px_to_mm(px: f64, dpi: f64) -> f64 {
    if dpi <= 0.0 {
        return 0.0;
    }
    px / dpi * MM_PER_INCH
}

/// Convert a 96-dpi CSS pixel value to PDF points.
pub fn px_to_pt(px: f64) -> f64 {
    px * PX_TO_PT
}

/// Convert millimeters to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm_to_px(mm, PDF_DPI)
}

/// Map a pixel offset inside the rendered canvas to millimeters.
///
/// `rendered_px` is the on-screen size of the canvas along this axis and
/// `size_mm` its physical size. A collapsed canvas maps everything to 0.
pub fn pointer_offset_to_mm(offset_px: f64, rendered_px: f64, size_mm: f64) -> f64 {
    if rendered_px <= 0.0 {
        return 0.0;
    }
    offset_px / rendered_px * size_mm
}

/// The canvas' bounding rectangle on screen, in pixels.
///
/// Captured once at pointer-down; the canvas does not move during a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert a client-space pointer position to canvas millimeters.
    pub fn pointer_to_mm(&self, client: Point, canvas_mm: Size) -> Point {
        Point::new(
            pointer_offset_to_mm(client.x - self.left, self.width, canvas_mm.width),
            pointer_offset_to_mm(client.y - self.top, self.height, canvas_mm.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mm_to_px_one_inch() {
        assert!(approx(mm_to_px(25.4, 203.0), 203.0));
        assert!(approx(mm_to_px(25.4, 96.0), 96.0));
    }

    #[test]
    fn test_px_to_mm_inverse() {
        let px = mm_to_px(40.0, 203.0);
        assert!(approx(px_to_mm(px, 203.0), 40.0));
    }

    #[test]
    fn test_px_to_mm_zero_dpi() {
        assert_eq!(px_to_mm(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_px_to_pt() {
        assert!(approx(px_to_pt(96.0), 72.0));
        assert!(approx(px_to_pt(12.0), 9.0));
    }

    #[test]
    fn test_mm_to_pt() {
        assert!(approx(mm_to_pt(25.4), 72.0));
    }

    #[test]
    fn test_pointer_conversion_independent_axes() {
        // 58x40mm canvas rendered at 2x on screen, but squashed vertically
        let rect = CanvasRect::new(100.0, 50.0, 464.0, 160.0);
        let mm = rect.pointer_to_mm(Point::new(100.0 + 232.0, 50.0 + 80.0), Size::new(58.0, 40.0));
        assert!(approx(mm.x, 29.0));
        assert!(approx(mm.y, 20.0));
    }

    #[test]
    fn test_pointer_conversion_collapsed_canvas() {
        let rect = CanvasRect::new(0.0, 0.0, 0.0, 0.0);
        let mm = rect.pointer_to_mm(Point::new(10.0, 10.0), Size::new(58.0, 40.0));
        assert_eq!(mm, Point::new(0.0, 0.0));
    }
}

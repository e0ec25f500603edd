//! Snap engine: aligns a moving element with the canvas and its neighbours.
//!
//! ## Targets
//!
//! Per axis, in iteration order:
//!
//! ```text
//! canvas start (0), canvas end (size),
//! then for each other element: start edge, end edge, midpoint
//! ```
//!
//! The moving element offers three candidate points per axis (start edge,
//! end edge, midpoint). A candidate snaps when `|point - target| < threshold`
//! (strict). The element is shifted so that point lands exactly on the
//! target, and the target becomes the axis' active guide. Axes are
//! independent.

use serde::{Deserialize, Serialize};

use crate::geom::{Rect, Size};

/// How a snap target is chosen when several are within the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapStrategy {
    /// The first matching target in iteration order wins.
    #[default]
    FirstMatch,
    /// The target with the smallest distance wins; ties go to the earlier one.
    Closest,
}

/// Output of [`compute_snap`]: the snapped top-left and the lit guides.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    pub guides_x: Vec<f64>,
    pub guides_y: Vec<f64>,
}

/// Snap with the default first-match strategy.
pub fn compute_snap(moving: Rect, others: &[Rect], canvas: Size, threshold: f64) -> SnapResult {
    compute_snap_with(moving, others, canvas, threshold, SnapStrategy::FirstMatch)
}

/// Snap `moving` against the canvas bounds and `others`.
pub fn compute_snap_with(
    moving: Rect,
    others: &[Rect],
    canvas: Size,
    threshold: f64,
    strategy: SnapStrategy,
) -> SnapResult {
    let targets_x = axis_targets(canvas.width, others.iter().map(|r| (r.x, r.width)));
    let targets_y = axis_targets(canvas.height, others.iter().map(|r| (r.y, r.height)));

    let (x, guide_x) = snap_axis(moving.x, moving.width, &targets_x, threshold, strategy);
    let (y, guide_y) = snap_axis(moving.y, moving.height, &targets_y, threshold, strategy);

    SnapResult {
        x,
        y,
        guides_x: guide_x.into_iter().collect(),
        guides_y: guide_y.into_iter().collect(),
    }
}

/// Round `value` to the nearest multiple of `step`. A non-positive step is a no-op.
pub fn snap_to_grid(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

fn axis_targets(canvas_extent: f64, spans: impl Iterator<Item = (f64, f64)>) -> Vec<f64> {
    let mut targets = vec![0.0, canvas_extent];
    for (start, extent) in spans {
        targets.push(start);
        targets.push(start + extent);
        targets.push(start + extent / 2.0);
    }
    targets
}

/// Snap one axis. Returns the new start position and the applied guide.
fn snap_axis(
    start: f64,
    extent: f64,
    targets: &[f64],
    threshold: f64,
    strategy: SnapStrategy,
) -> (f64, Option<f64>) {
    // Offsets from the start edge: start, end, midpoint
    let offsets = [0.0, extent, extent / 2.0];
    let mut best: Option<(f64, f64, f64)> = None; // (distance, new_start, target)

    for &target in targets {
        for &offset in &offsets {
            let distance = (start + offset - target).abs();
            if distance >= threshold {
                continue;
            }
            match strategy {
                SnapStrategy::FirstMatch => return (target - offset, Some(target)),
                SnapStrategy::Closest => {
                    if best.is_none_or(|(d, _, _)| distance < d) {
                        best = Some((distance, target - offset, target));
                    }
                }
            }
        }
    }

    match best {
        Some((_, new_start, target)) => (new_start, Some(target)),
        None => (start, None),
    }
}

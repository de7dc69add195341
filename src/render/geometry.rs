//! Shared geometry calculations for annotations
//!
//! Pen widths and arrowhead math used by the rasterizer. The stroke widths
//! are cosmetic constants.

use crate::domain::geometry::{self, Point};

/// Arrow geometry constants
pub mod arrow {
    use super::*;

    /// Arrow shaft thickness in scene units
    pub const THICKNESS: f32 = 3.0;
    /// Distance from the tip to the base of the head
    pub const HEAD_SIZE: f64 = 16.0;
    /// Half of the head's base width
    pub const HEAD_HALF_WIDTH: f64 = 7.0;

    /// Filled triangular head for an arrow pointing from `start` to `end`.
    ///
    /// Returns (tip, left wing, right wing, base center), or `None` for a
    /// zero-length arrow. Heads longer than the shaft are shrunk to fit.
    pub fn head_points(start: Point, end: Point) -> Option<(Point, Point, Point, Point)> {
        let direction = end - start;
        let unit = direction.normalized()?;
        let size = HEAD_SIZE.min(geometry::line_length(start, end));
        let half_width = HEAD_HALF_WIDTH * size / HEAD_SIZE;

        let base = end - unit * size;
        let left = geometry::perpendicular_offset(base, direction, -half_width)?;
        let right = geometry::perpendicular_offset(base, direction, half_width)?;
        Some((end, left, right, base))
    }
}

/// Plain line constants
pub mod line {
    /// Line thickness in scene units (same pen as the arrow shaft)
    pub const THICKNESS: f32 = super::arrow::THICKNESS;
}

/// Rectangle outline constants
pub mod shape {
    /// Outline thickness in scene units
    pub const THICKNESS: f32 = 4.0;
}

/// Normalize min/max coordinates from arbitrary start/end points
#[inline]
pub fn normalize_rect(x1: f32, y1: f32, x2: f32, y2: f32) -> (f32, f32, f32, f32) {
    let (min_x, max_x) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
    let (min_y, max_y) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
    (min_x, min_y, max_x, max_y)
}

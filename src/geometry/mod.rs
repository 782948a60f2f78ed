//! Planar geometry shared by every stage: rotated/axis-aligned rectangles
//! and the minimum-area rectangle of a contour.

mod min_area_rect;
mod rect;

pub use min_area_rect::{convex_hull, min_area_rect, min_area_rect_i32};
pub use rect::{AxisRect, RotatedRect};

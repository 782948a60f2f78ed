use serde::{Deserialize, Serialize};

/// Rectangle of arbitrary orientation, described by its centre, its side
/// lengths and the direction of the width axis.
///
/// Coordinates are in pixels with `y` pointing down. `angle_deg` is the
/// angle of the width axis measured from `+x` towards `+y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotatedRect {
    pub center: [f32; 2],
    pub width: f32,
    pub height: f32,
    pub angle_deg: f32,
}

impl RotatedRect {
    pub fn new(center: [f32; 2], width: f32, height: f32, angle_deg: f32) -> Self {
        Self {
            center,
            width,
            height,
            angle_deg,
        }
    }

    /// Returns an equivalent rectangle with `width >= height`.
    ///
    /// When the rectangle is taller than wide the sides are swapped and the
    /// angle grows by exactly 90 degrees; otherwise it is returned unchanged.
    pub fn landscape(&self) -> Self {
        if self.height > self.width {
            self.swapped()
        } else {
            *self
        }
    }

    /// Returns an equivalent rectangle with `height >= width`.
    pub fn portrait(&self) -> Self {
        if self.width > self.height {
            self.swapped()
        } else {
            *self
        }
    }

    fn swapped(&self) -> Self {
        Self {
            center: self.center,
            width: self.height,
            height: self.width,
            angle_deg: self.angle_deg + 90.0,
        }
    }

    /// `width / height`, infinite for a zero-height rectangle.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            f32::INFINITY
        }
    }

    /// Unit vectors along the width and height axes.
    pub fn axes(&self) -> ([f32; 2], [f32; 2]) {
        let (s, c) = self.angle_deg.to_radians().sin_cos();
        ([c, s], [-s, c])
    }

    /// Corners in frame order: top-left, top-right, bottom-right, bottom-left,
    /// where "top-left" is the corner that lands at the origin of a crop.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let (u, v) = self.axes();
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        let at = |a: f32, b: f32| {
            [
                self.center[0] + a * u[0] + b * v[0],
                self.center[1] + a * u[1] + b * v[1],
            ]
        };
        [at(-hw, -hh), at(hw, -hh), at(hw, hh), at(-hw, hh)]
    }

    /// Integer-aligned box enclosing all four corners.
    pub fn bounding_rect(&self) -> AxisRect {
        let corners = self.corners();
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for c in &corners {
            for k in 0..2 {
                min[k] = min[k].min(c[k]);
                max[k] = max[k].max(c[k]);
            }
        }
        let x = min[0].floor() as i32;
        let y = min[1].floor() as i32;
        AxisRect::new(
            x,
            y,
            max[0].ceil() as i32 - x + 1,
            max[1].ceil() as i32 - y + 1,
        )
    }
}

/// Axis-aligned integer rectangle, `x`/`y` are the top-left pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl AxisRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tight pixel box around a point set; both ends inclusive, so a single
    /// pixel yields a 1x1 box.
    pub fn from_points(points: &[[i32; 2]]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first[0], first[1], first[0], first[1]);
        for p in points {
            x0 = x0.min(p[0]);
            y0 = y0.min(p[1]);
            x1 = x1.max(p[0]);
            y1 = y1.max(p[1]);
        }
        Self::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersection with the `[0, w) x [0, h)` image frame, `None` if empty.
    pub fn clip(&self, w: u32, h: u32) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(w as i32);
        let y1 = self.bottom().min(h as i32);
        let clipped = Self::new(x0, y0, x1 - x0, y1 - y0);
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Same box expressed as an unrotated [`RotatedRect`] whose samples fall
    /// exactly on the covered pixel centres.
    pub fn to_rotated(&self) -> RotatedRect {
        RotatedRect::new(
            [
                self.x as f32 + (self.width as f32 - 1.0) * 0.5,
                self.y as f32 + (self.height as f32 - 1.0) * 0.5,
            ],
            self.width as f32,
            self.height as f32,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn landscape_swaps_tall_rect_and_adds_quarter_turn() {
        let tall = RotatedRect::new([10.0, 20.0], 12.0, 40.0, -15.0);
        let wide = tall.landscape();
        assert_eq!(wide.width, 40.0);
        assert_eq!(wide.height, 12.0);
        assert_abs_diff_eq!(wide.angle_deg, 75.0);
        assert_eq!(wide.landscape(), wide);
    }

    #[test]
    fn portrait_is_the_mirror_convention() {
        let wide = RotatedRect::new([0.0, 0.0], 30.0, 10.0, 5.0);
        let tall = wide.portrait();
        assert!(tall.height >= tall.width);
        assert_abs_diff_eq!(tall.angle_deg, 95.0);
        assert_eq!(tall.portrait(), tall);
        let square = RotatedRect::new([0.0, 0.0], 10.0, 10.0, 3.0);
        assert_eq!(square.portrait(), square);
        assert_eq!(square.landscape(), square);
    }

    #[test]
    fn swapped_rect_covers_the_same_corners() {
        let rect = RotatedRect::new([50.0, 40.0], 10.0, 30.0, 20.0);
        let mut a = rect.corners().to_vec();
        let mut b = rect.landscape().corners().to_vec();
        let key = |p: &[f32; 2]| ((p[0] * 100.0).round() as i64, (p[1] * 100.0).round() as i64);
        a.sort_by_key(key);
        b.sort_by_key(key);
        for (p, q) in a.iter().zip(&b) {
            assert_abs_diff_eq!(p[0], q[0], epsilon = 1e-3);
            assert_abs_diff_eq!(p[1], q[1], epsilon = 1e-3);
        }
    }

    #[test]
    fn clip_trims_to_frame() {
        let roi = AxisRect::new(-5, 10, 30, 100);
        assert_eq!(roi.clip(20, 50), Some(AxisRect::new(0, 10, 20, 40)));
        assert_eq!(AxisRect::new(30, 0, 5, 5).clip(20, 20), None);
    }

    #[test]
    fn bounding_box_of_points_is_inclusive() {
        let roi = AxisRect::from_points(&[[3, 4], [7, 4], [5, 9]]);
        assert_eq!(roi, AxisRect::new(3, 4, 5, 6));
    }
}

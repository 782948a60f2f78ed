//! Minimum-area enclosing rectangle via convex hull + rotating calipers.
//!
//! The returned angle is canonicalised to `[-45, 45)` degrees so that an
//! axis-aligned blob never comes back upside down; callers that need a
//! particular side ordering apply [`RotatedRect::landscape`] or
//! [`RotatedRect::portrait`] afterwards.

use super::rect::RotatedRect;

/// Convex hull (Andrew's monotone chain). Output is counter-clockwise in
/// a y-up frame and contains no collinear points.
pub fn convex_hull(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| {
        a[0].partial_cmp(&b[0])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a[1].partial_cmp(&b[1]).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<[f32; 2]> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

fn cross(o: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Smallest-area rectangle enclosing `points`.
///
/// Degenerate inputs are handled without failing: an empty set yields the
/// zero rectangle, a single point a zero-size rectangle at that point, and
/// collinear points a zero-height rectangle along the segment.
pub fn min_area_rect(points: &[[f32; 2]]) -> RotatedRect {
    let hull = convex_hull(points);
    match hull.len() {
        0 => RotatedRect::default(),
        1 => RotatedRect::new(hull[0], 0.0, 0.0, 0.0),
        2 => segment_rect(hull[0], hull[1]),
        _ => calipers(&hull),
    }
}

/// Convenience wrapper for integer contour points.
pub fn min_area_rect_i32(points: &[[i32; 2]]) -> RotatedRect {
    let pts: Vec<[f32; 2]> = points.iter().map(|p| [p[0] as f32, p[1] as f32]).collect();
    min_area_rect(&pts)
}

fn segment_rect(a: [f32; 2], b: [f32; 2]) -> RotatedRect {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let rect = RotatedRect::new(
        [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5],
        (dx * dx + dy * dy).sqrt(),
        0.0,
        dy.atan2(dx).to_degrees(),
    );
    canonicalize(rect)
}

fn calipers(hull: &[[f32; 2]]) -> RotatedRect {
    let n = hull.len();
    let mut best_area = f32::INFINITY;
    let mut best = RotatedRect::default();
    for i in 0..n {
        let a = hull[i];
        let b = hull[(i + 1) % n];
        let ex = b[0] - a[0];
        let ey = b[1] - a[1];
        let len = (ex * ex + ey * ey).sqrt();
        if len < f32::EPSILON {
            continue;
        }
        let u = [ex / len, ey / len];
        let v = [-u[1], u[0]];

        let (mut min_u, mut max_u) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in hull {
            let dx = p[0] - a[0];
            let dy = p[1] - a[1];
            let pu = dx * u[0] + dy * u[1];
            let pv = dx * v[0] + dy * v[1];
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area {
            best_area = area;
            let cu = (min_u + max_u) * 0.5;
            let cv = (min_v + max_v) * 0.5;
            best = RotatedRect::new(
                [a[0] + cu * u[0] + cv * v[0], a[1] + cu * u[1] + cv * v[1]],
                max_u - min_u,
                max_v - min_v,
                u[1].atan2(u[0]).to_degrees(),
            );
        }
    }
    canonicalize(best)
}

/// Rotates the description by quarter turns until the angle lies in
/// `[-45, 45)`, swapping sides on every turn.
fn canonicalize(mut rect: RotatedRect) -> RotatedRect {
    while rect.angle_deg >= 45.0 {
        rect.angle_deg -= 90.0;
        std::mem::swap(&mut rect.width, &mut rect.height);
    }
    while rect.angle_deg < -45.0 {
        rect.angle_deg += 90.0;
        std::mem::swap(&mut rect.width, &mut rect.height);
    }
    rect
}

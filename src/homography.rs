//! Plane-to-plane homography estimation and point mapping.
//!
//! - `estimate_homography_dlt`: normalized DLT from >= 4 correspondences.
//! - `fit_homography_ransac`: seeded RANSAC around the DLT with an inlier
//!   refit.
//! - `apply_homography_points` / `rescale_homography_image_space`: mapping
//!   helpers used to report localized quadrilaterals.

use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const EPS: f32 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("too few correspondences: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("point lists differ in length ({src} vs {dst})")]
    LengthMismatch { src: usize, dst: usize },
    #[error("degenerate configuration")]
    Degenerate,
    #[error("insufficient inliers: need {needed}, found {found}")]
    InsufficientInliers { needed: usize, found: usize },
}

/// Left-multiplies `h` by the scaling that maps a `src_w x src_h` image onto
/// `dst_w x dst_h`.
pub fn rescale_homography_image_space(
    h: &Matrix3<f32>,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Matrix3<f32> {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return *h;
    }
    let sx = dst_w as f32 / src_w as f32;
    let sy = dst_h as f32 / src_h as f32;
    let scale = Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0);
    scale * h
}

/// Maps points through `h`; `None` if any point lands at infinity.
pub fn apply_homography_points(h: &Matrix3<f32>, pts: &[[f32; 2]]) -> Option<Vec<[f32; 2]>> {
    let mut out = Vec::with_capacity(pts.len());
    for &p in pts {
        let v = h * Vector3::new(p[0], p[1], 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        out.push([v[0] / w, v[1] / w]);
    }
    Some(out)
}

pub fn project(h: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    if v[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [v[0] / v[2], v[1] / v[2]]
}

pub fn reprojection_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    let p = project(h, src);
    ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt()
}

/// Translate the centroid to the origin and scale the mean radius to sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, normalized)
}

/// Homography `H` with `dst ~ H * src`, scaled so that `H[2,2] = 1`.
pub fn estimate_homography_dlt(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Matrix3<f64>, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < 4 {
        return Err(HomographyError::TooFewPoints { needed: 4, got: n });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for i in 0..n {
        let [sx, sy] = src_n[i];
        let [dx, dy] = dst_n[i];
        let r = 2 * i;
        a[(r, 3)] = -sx;
        a[(r, 4)] = -sy;
        a[(r, 5)] = -1.0;
        a[(r, 6)] = dy * sx;
        a[(r, 7)] = dy * sy;
        a[(r, 8)] = dy;
        a[(r + 1, 0)] = sx;
        a[(r + 1, 1)] = sy;
        a[(r + 1, 2)] = 1.0;
        a[(r + 1, 6)] = -dx * sx;
        a[(r + 1, 7)] = -dx * sy;
        a[(r + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of the smallest eigenvalue of A^T A.
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let (min_idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .fold((0usize, f64::INFINITY), |best, (i, &v)| {
            if v.abs() < best.1 {
                (i, v.abs())
            } else {
                best
            }
        });
    let col = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(
        col[0], col[1], col[2], col[3], col[4], col[5], col[6], col[7], col[8],
    );

    if h_norm.determinant().abs() < 1e-12 {
        return Err(HomographyError::Degenerate);
    }
    let t_dst_inv = t_dst.try_inverse().ok_or(HomographyError::Degenerate)?;
    let h = t_dst_inv * h_norm * t_src;
    if !h.iter().all(|v| v.is_finite()) {
        return Err(HomographyError::Degenerate);
    }
    let scale = h[(2, 2)];
    Ok(if scale.abs() < 1e-15 { h } else { h / scale })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    pub max_iters: usize,
    /// Reprojection error (pixels) below which a correspondence is an inlier.
    pub inlier_threshold: f64,
    pub min_inliers: usize,
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            inlier_threshold: 3.0,
            min_inliers: 4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RansacHomography {
    pub h: Matrix3<f64>,
    pub inlier_mask: Vec<bool>,
    pub n_inliers: usize,
}

pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &RansacParams,
) -> Result<RansacHomography, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < 4 {
        return Err(HomographyError::TooFewPoints { needed: 4, got: n });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let count_inliers = |h: &Matrix3<f64>| -> Vec<bool> {
        src.iter()
            .zip(dst)
            .map(|(&s, &d)| reprojection_error(h, s, d) < params.inlier_threshold)
            .collect()
    };

    let mut best: Option<(usize, Matrix3<f64>, Vec<bool>)> = None;
    for _ in 0..params.max_iters {
        let sample = sample_indices(&mut rng, n, 4);
        let s4: Vec<[f64; 2]> = sample.iter().map(|&i| src[i]).collect();
        let d4: Vec<[f64; 2]> = sample.iter().map(|&i| dst[i]).collect();
        let Ok(h) = estimate_homography_dlt(&s4, &d4) else {
            continue;
        };
        let mask = count_inliers(&h);
        let count = mask.iter().filter(|&&m| m).count();
        if best.as_ref().map_or(true, |(c, ..)| count > *c) {
            let done = count * 10 > n * 9;
            best = Some((count, h, mask));
            if done {
                break;
            }
        }
    }

    let found = best.as_ref().map_or(0, |(c, ..)| *c);
    let Some((_, best_h, best_mask)) = best.filter(|(c, ..)| *c >= params.min_inliers) else {
        return Err(HomographyError::InsufficientInliers {
            needed: params.min_inliers,
            found,
        });
    };

    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let h = estimate_homography_dlt(&inlier_src, &inlier_dst).unwrap_or(best_h);
    let inlier_mask = count_inliers(&h);
    let n_inliers = inlier_mask.iter().filter(|&&m| m).count();
    Ok(RansacHomography {
        h,
        inlier_mask,
        n_inliers,
    })
}

/// `k` distinct indices from `0..n` by partial Fisher-Yates shuffle.
fn sample_indices(rng: &mut impl Rng, n: usize, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k.min(n) {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

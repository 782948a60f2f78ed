//! Oriented FAST / rotated BRIEF features on a scale pyramid.
//!
//! Per level: FAST-9 corners with 3x3 non-maximum suppression, a border
//! filter, Harris ranking, intensity-centroid orientation and a 256-bit
//! steered binary descriptor sampled on a blurred copy of the level. The
//! sampling pattern comes from a seeded generator, so equal inputs always
//! yield equal features.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::corners::{corners_fast9, Corner};
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 256-bit binary descriptor.
pub type Descriptor = [u8; 32];

const DESCRIPTOR_BITS: usize = 256;
const DESCRIPTOR_SIGMA: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    /// Position in level-0 pixel coordinates.
    pub x: f32,
    pub y: f32,
    /// Orientation in radians.
    pub angle: f32,
    /// Harris response on the detection level.
    pub response: f32,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbParams {
    pub max_features: usize,
    pub scale_factor: f32,
    pub levels: usize,
    /// Keypoints closer than this to a level border are dropped.
    pub edge_threshold: u32,
    pub patch_size: u32,
    pub fast_threshold: u8,
    pub harris_k: f32,
    pub harris_block: u32,
    pub pattern_seed: u64,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            max_features: 1000,
            scale_factor: 1.2,
            levels: 8,
            edge_threshold: 21,
            patch_size: 21,
            fast_threshold: 20,
            harris_k: 0.04,
            harris_block: 7,
            pattern_seed: 0x0b1e_5eed,
        }
    }
}

/// Keypoints with their descriptors, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.keypoints
            .iter()
            .map(|k| [k.x as f64, k.y as f64])
            .collect()
    }
}

type PointPair = [[i32; 2]; 2];
type Gradient = ImageBuffer<Luma<i16>, Vec<i16>>;

struct PyramidLevel {
    index: usize,
    image: GrayImage,
    /// Level-to-source scale per axis.
    scale: [f32; 2],
    budget: usize,
}

#[derive(Debug, Clone)]
pub struct OrbExtractor {
    params: OrbParams,
    pattern: Vec<PointPair>,
}

impl OrbExtractor {
    pub fn new(params: OrbParams) -> Self {
        let pattern = sampling_pattern(params.pattern_seed, (params.patch_size / 2) as i32);
        Self { params, pattern }
    }

    pub fn params(&self) -> &OrbParams {
        &self.params
    }

    /// Detects keypoints across the pyramid and describes them. Levels are
    /// processed in parallel; output is ordered by level.
    pub fn detect_and_compute(&self, gray: &GrayImage) -> Features {
        let levels = self.build_pyramid(gray);
        let per_level: Vec<(Vec<Keypoint>, Vec<Descriptor>)> =
            levels.par_iter().map(|lvl| self.level_features(lvl)).collect();

        let mut features = Features::default();
        for (kps, descs) in per_level {
            features.keypoints.extend(kps);
            features.descriptors.extend(descs);
        }
        debug!(
            "orb: {}x{} -> {} keypoints over {} levels",
            gray.width(),
            gray.height(),
            features.len(),
            levels.len()
        );
        features
    }

    /// Minimum distance from a level border at which every sample stays
    /// inside the image.
    fn border(&self) -> u32 {
        let half = (self.params.patch_size / 2) as f32;
        let steered = (half * std::f32::consts::SQRT_2).ceil() as u32 + 1;
        let harris = self.params.harris_block / 2 + 2;
        self.params.edge_threshold.max(steered).max(harris)
    }

    fn build_pyramid(&self, gray: &GrayImage) -> Vec<PyramidLevel> {
        let (w, h) = gray.dimensions();
        let min_side = 2 * self.border() + 1;
        let levels = self.params.levels.max(1);
        let budgets = level_budgets(self.params.max_features, self.params.scale_factor, levels);

        let mut out = Vec::with_capacity(levels);
        for (index, budget) in budgets.into_iter().enumerate() {
            let factor = self.params.scale_factor.powi(index as i32);
            let lw = (w as f32 / factor).round() as u32;
            let lh = (h as f32 / factor).round() as u32;
            if lw < min_side || lh < min_side {
                break;
            }
            let image = if index == 0 {
                gray.clone()
            } else {
                imageops::resize(gray, lw, lh, FilterType::Triangle)
            };
            out.push(PyramidLevel {
                index,
                image,
                scale: [w as f32 / lw as f32, h as f32 / lh as f32],
                budget,
            });
        }
        out
    }

    fn level_features(&self, level: &PyramidLevel) -> (Vec<Keypoint>, Vec<Descriptor>) {
        if level.budget == 0 {
            return (Vec::new(), Vec::new());
        }
        let img = &level.image;
        let (w, h) = img.dimensions();
        let border = self.border();

        let mut corners: Vec<Corner> = suppress_non_maxima(corners_fast9(img, self.params.fast_threshold), w, h)
            .into_iter()
            .filter(|c| c.x >= border && c.y >= border && c.x + border < w && c.y + border < h)
            .collect();
        corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        corners.truncate(2 * level.budget);

        let gx = horizontal_sobel(img);
        let gy = vertical_sobel(img);
        let radius = (self.params.harris_block / 2) as i32;
        let mut ranked: Vec<(f32, Corner)> = corners
            .into_iter()
            .map(|c| {
                let r = harris_response(&gx, &gy, c.x as i32, c.y as i32, radius, self.params.harris_k);
                (r, c)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        ranked.truncate(level.budget);

        let smoothed = gaussian_blur_f32(img, DESCRIPTOR_SIGMA);
        let half = (self.params.patch_size / 2) as i32;
        let mut keypoints = Vec::with_capacity(ranked.len());
        let mut descriptors = Vec::with_capacity(ranked.len());
        for (response, c) in ranked {
            let (x, y) = (c.x as i32, c.y as i32);
            let angle = intensity_centroid_angle(img, x, y, half);
            descriptors.push(steered_brief(&smoothed, x, y, angle, &self.pattern));
            keypoints.push(Keypoint {
                x: (c.x as f32 + 0.5) * level.scale[0] - 0.5,
                y: (c.y as f32 + 0.5) * level.scale[1] - 0.5,
                angle,
                response,
                level: level.index,
            });
        }
        (keypoints, descriptors)
    }
}

/// Geometric split of the feature budget over the levels; the last level
/// takes whatever rounding left over.
fn level_budgets(max_features: usize, scale_factor: f32, levels: usize) -> Vec<usize> {
    let factor = 1.0 / scale_factor.max(1.0 + f32::EPSILON);
    let mut desired = max_features as f32 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut budgets = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for _ in 0..levels.saturating_sub(1) {
        let n = desired.round() as usize;
        budgets.push(n);
        assigned += n;
        desired *= factor;
    }
    budgets.push(max_features.saturating_sub(assigned));
    budgets
}

/// Keeps corners whose FAST score is not beaten by any 8-neighbour corner.
fn suppress_non_maxima(corners: Vec<Corner>, width: u32, height: u32) -> Vec<Corner> {
    let mut scores = vec![f32::NEG_INFINITY; (width * height) as usize];
    for c in &corners {
        scores[(c.y * width + c.x) as usize] = c.score;
    }
    corners
        .into_iter()
        .filter(|c| {
            let (x, y) = (c.x as i64, c.y as i64);
            (-1..=1).all(|dy| {
                (-1..=1).all(|dx| {
                    let (nx, ny) = (x + dx, y + dy);
                    if (dx == 0 && dy == 0) || nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        return true;
                    }
                    scores[(ny as u32 * width + nx as u32) as usize] <= c.score
                })
            })
        })
        .collect()
}

fn harris_response(
    gx: &Gradient,
    gy: &Gradient,
    x: i32,
    y: i32,
    radius: i32,
    k: f32,
) -> f32 {
    let (mut a, mut b, mut c) = (0.0f64, 0.0f64, 0.0f64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let px = (x + dx) as u32;
            let py = (y + dy) as u32;
            let ix = gx.get_pixel(px, py)[0] as f64;
            let iy = gy.get_pixel(px, py)[0] as f64;
            a += ix * ix;
            b += iy * iy;
            c += ix * iy;
        }
    }
    let trace = a + b;
    (a * b - c * c - k as f64 * trace * trace) as f32
}

/// Angle of the vector from the keypoint to the intensity centroid of the
/// disc of radius `half`.
fn intensity_centroid_angle(img: &GrayImage, x: i32, y: i32, half: i32) -> f32 {
    let (mut m01, mut m10) = (0i64, 0i64);
    for v in -half..=half {
        let span = ((half * half - v * v) as f32).sqrt() as i32;
        for u in -span..=span {
            let val = img.get_pixel((x + u) as u32, (y + v) as u32)[0] as i64;
            m10 += u as i64 * val;
            m01 += v as i64 * val;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

fn steered_brief(img: &GrayImage, x: i32, y: i32, angle: f32, pattern: &[PointPair]) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let (w, h) = (img.width() as i32, img.height() as i32);
    let sample = |p: [i32; 2]| -> u8 {
        let (px, py) = (p[0] as f32, p[1] as f32);
        let sx = x + (cos * px - sin * py).round() as i32;
        let sy = y + (sin * px + cos * py).round() as i32;
        img.get_pixel(sx.clamp(0, w - 1) as u32, sy.clamp(0, h - 1) as u32)[0]
    };

    let mut desc = [0u8; 32];
    for (bit, pair) in pattern.iter().enumerate() {
        if sample(pair[0]) < sample(pair[1]) {
            desc[bit / 8] |= 1 << (bit % 8);
        }
    }
    desc
}

/// Uniformly drawn point pairs inside the `[-half, half]` square.
fn sampling_pattern(seed: u64, half: i32) -> Vec<PointPair> {
    let half = half.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let point = |rng: &mut StdRng| [rng.gen_range(-half..=half), rng.gen_range(-half..=half)];
    let mut pattern = Vec::with_capacity(DESCRIPTOR_BITS);
    while pattern.len() < DESCRIPTOR_BITS {
        let a = point(&mut rng);
        let b = point(&mut rng);
        if a != b {
            pattern.push([a, b]);
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(width: u32, height: u32, cell: u32, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let cols = width.div_ceil(cell);
        let rows = height.div_ceil(cell);
        let values: Vec<u8> = (0..cols * rows).map(|_| rng.gen_range(0..=255)).collect();
        GrayImage::from_fn(width, height, |x, y| Luma([values[((y / cell) * cols + x / cell) as usize]]))
    }

    #[test]
    fn budgets_sum_to_max_features() {
        let budgets = level_budgets(1000, 1.2, 8);
        assert_eq!(budgets.len(), 8);
        assert_eq!(budgets.iter().sum::<usize>(), 1000);
        assert!(budgets[0] > budgets[1]);
    }

    #[test]
    fn pattern_is_seeded_and_bounded() {
        let a = sampling_pattern(7, 10);
        let b = sampling_pattern(7, 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), DESCRIPTOR_BITS);
        assert!(a.iter().flatten().flatten().all(|v| (-10..=10).contains(v)));
        assert_ne!(a, sampling_pattern(8, 10));
    }

    #[test]
    fn flat_image_has_no_features() {
        let orb = OrbExtractor::new(OrbParams::default());
        let features = orb.detect_and_compute(&GrayImage::from_pixel(200, 120, Luma([128])));
        assert!(features.is_empty());
    }

    #[test]
    fn extraction_is_deterministic_and_respects_border() {
        let img = blocks(240, 160, 10, 3);
        let orb = OrbExtractor::new(OrbParams::default());
        let a = orb.detect_and_compute(&img);
        let b = orb.detect_and_compute(&img);
        assert!(!a.is_empty());
        assert_eq!(a.keypoints, b.keypoints);
        assert_eq!(a.descriptors, b.descriptors);
        assert!(a.len() <= 1000);
        for kp in a.keypoints.iter().filter(|k| k.level == 0) {
            assert!(kp.x >= 21.0 && kp.y >= 21.0);
            assert!(kp.x < 219.0 && kp.y < 139.0);
        }
    }

    #[test]
    fn small_image_skips_coarse_levels() {
        let orb = OrbExtractor::new(OrbParams::default());
        let levels = orb.build_pyramid(&blocks(60, 50, 8, 1));
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].scale, [1.0, 1.0]);
    }
}

//! Mask construction for the two extraction strategies.
//!
//! Adaptive mode
//! - optional median smoothing,
//! - local-mean threshold over a square block (foreground where the sample
//!   exceeds `mean - offset`),
//! - binary opening to drop isolated specks.
//!
//! Gradient mode
//! - Gaussian blur, horizontal Sobel (negative responses saturate to zero),
//! - fixed global cut,
//! - binary closing so character edges fuse into one blob.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::gradients::horizontal_sobel;
use imageproc::morphology::{close, open};
use serde::{Deserialize, Serialize};

/// Local-adaptive threshold settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptions {
    /// Median filter radius, 0 disables smoothing.
    pub median_radius: u32,
    /// Side of the square averaging window (odd).
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub offset: f32,
    /// Radius of the opening structuring element, 0 disables it.
    pub open_radius: u8,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            median_radius: 1,
            block_size: 55,
            offset: 5.0,
            open_radius: 1,
        }
    }
}

impl AdaptiveOptions {
    /// Settings used on already-cropped plates: no smoothing and no opening,
    /// which keeps thin gaps between characters intact.
    pub fn unsmoothed() -> Self {
        Self {
            median_radius: 0,
            open_radius: 0,
            ..Self::default()
        }
    }
}

/// Gradient-emphasis settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientOptions {
    pub blur_sigma: f32,
    /// Responses strictly above this level become foreground.
    pub threshold: u8,
    /// Radius of the closing structuring element (8 gives a 17x17 square).
    pub close_radius: u8,
}

impl Default for GradientOptions {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            threshold: 80,
            close_radius: 8,
        }
    }
}

pub fn binarize_adaptive(gray: &GrayImage, opts: &AdaptiveOptions) -> GrayImage {
    let smoothed;
    let src = if opts.median_radius > 0 {
        smoothed = median_filter(gray, opts.median_radius, opts.median_radius);
        &smoothed
    } else {
        gray
    };
    let mask = adaptive_mean_threshold(src, opts.block_size, opts.offset);
    if opts.open_radius > 0 {
        open(&mask, Norm::LInf, opts.open_radius)
    } else {
        mask
    }
}

pub fn binarize_gradient(gray: &GrayImage, opts: &GradientOptions) -> GrayImage {
    let blurred = if opts.blur_sigma > 0.0 {
        gaussian_blur_f32(gray, opts.blur_sigma)
    } else {
        gray.clone()
    };
    let gx = horizontal_sobel(&blurred);
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (dst, &g) in mask.iter_mut().zip(gx.iter()) {
        let v = g.clamp(0, 255) as u8;
        *dst = if v > opts.threshold { 255 } else { 0 };
    }
    if opts.close_radius > 0 {
        close(&mask, Norm::LInf, opts.close_radius)
    } else {
        mask
    }
}

/// Local-mean threshold using an integral image; the window is clamped at
/// the borders and averaged over the pixels it actually covers.
pub fn adaptive_mean_threshold(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let mut out = GrayImage::new(gray.width(), gray.height());
    if w == 0 || h == 0 {
        return out;
    }
    let src = gray.as_raw();

    let iw = w + 1;
    let mut integral = vec![0u64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += src[y * w + x] as u64;
            integral[(y + 1) * iw + x + 1] = row_sum + integral[y * iw + x + 1];
        }
    }

    let half = (block_size.max(1) / 2) as usize;
    let dst: &mut [u8] = &mut out;
    for y in 0..h {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half).min(h - 1) + 1;
        for x in 0..w {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half).min(w - 1) + 1;
            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0];
            let area = ((y1 - y0) * (x1 - x0)) as f32;
            let mean = sum as f32 / area;
            dst[y * w + x] = if src[y * w + x] as f32 > mean - offset {
                255
            } else {
                0
            };
        }
    }
    out
}

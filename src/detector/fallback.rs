//! Fallback plate selector over a gradient-mode extraction.
//!
//! Every external region passing the loose shape filter is scored by the
//! edge density of the gradient mask inside its axis-aligned ROI. The
//! densest one wins (ties keep the earliest). When no region passes the
//! filter the selector reports `None`; there is no default winner.

use super::crop::{crop_roi, CropResult};
use super::params::FallbackParams;
use crate::geometry::{AxisRect, RotatedRect};
use crate::image::Image;
use crate::regions::Extraction;
use image::GrayImage;
use log::debug;

/// Winning region of the fallback scan.
#[derive(Clone, Debug)]
pub struct FallbackSelection {
    pub region: usize,
    /// Region rectangle (landscape-normalized), reported as the plate outline.
    pub rect: RotatedRect,
    /// Widened, clipped ROI that was cropped.
    pub roi: AxisRect,
    pub density: f32,
    pub crop: CropResult,
}

#[derive(Clone, Debug)]
pub struct FallbackOutcome {
    pub selection: Option<FallbackSelection>,
    pub regions: usize,
    /// Number of regions that survived the shape filter.
    pub scored: usize,
}

/// Loose plate-shape filter on a landscape-normalized rectangle.
pub fn fallback_shape(rect: &RotatedRect, params: &FallbackParams) -> bool {
    let rect = rect.landscape();
    let ratio = rect.aspect_ratio();
    !(ratio < params.min_ratio
        || ratio > params.max_ratio
        || rect.width < params.min_width
        || rect.height < params.min_height)
}

/// ROI centred on the rectangle: top-left truncated toward zero and
/// clamped at 0, extent clipped to the image.
pub fn density_roi(rect: &RotatedRect, width: u32, height: u32) -> Option<AxisRect> {
    let rect = rect.landscape();
    let x = ((rect.center[0] - rect.width * 0.5) as i32).max(0);
    let y = ((rect.center[1] - rect.height * 0.5) as i32).max(0);
    AxisRect::new(x, y, rect.width as i32, rect.height as i32).clip(width, height)
}

/// Share of mask samples inside `roi` strictly above `level`.
pub fn edge_density(mask: &GrayImage, roi: &AxisRect, level: u8) -> f32 {
    if roi.is_empty() {
        return 0.0;
    }
    let mut hits = 0usize;
    for y in roi.y..roi.bottom() {
        for x in roi.x..roi.right() {
            if mask.get_pixel(x as u32, y as u32)[0] > level {
                hits += 1;
            }
        }
    }
    hits as f32 / roi.area() as f32
}

pub fn select_fallback(
    extraction: &Extraction,
    image: &Image,
    params: &FallbackParams,
) -> FallbackOutcome {
    let (w, h) = (extraction.mask.width(), extraction.mask.height());
    let mut scored = 0usize;

    let best = extraction
        .hierarchy
        .iter()
        .filter(|(_, region)| fallback_shape(&region.rect, params))
        .filter_map(|(idx, region)| {
            let roi = density_roi(&region.rect, w, h)?;
            Some((idx, region.rect.landscape(), roi))
        })
        .fold(None::<(f32, usize, RotatedRect, AxisRect)>, |best, (idx, rect, roi)| {
            scored += 1;
            let density = edge_density(&extraction.mask, &roi, params.foreground_level);
            debug!("fallback: region {idx} roi={roi:?} density={density:.3}");
            match best {
                Some((best_density, ..)) if density <= best_density => best,
                _ if density > 0.0 => Some((density, idx, rect, roi)),
                _ => best,
            }
        });

    let selection = best.and_then(|(density, region, rect, roi)| {
        let widened = AxisRect::new(roi.x, roi.y, roi.width + params.widen_px, roi.height);
        let roi = widened.clip(w, h)?;
        let crop = crop_roi(image, &roi)?;
        Some(FallbackSelection {
            region,
            rect,
            roi,
            density,
            crop,
        })
    });

    FallbackOutcome {
        selection,
        regions: extraction.hierarchy.len(),
        scored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::{extract, ExtractionMode, GradientOptions};
    use image::Luma;

    #[test]
    fn shape_filter_bounds() {
        let params = FallbackParams::default();
        assert!(fallback_shape(&RotatedRect::new([0.0, 0.0], 100.0, 30.0, 0.0), &params));
        assert!(fallback_shape(&RotatedRect::new([0.0, 0.0], 30.0, 100.0, 0.0), &params));
        assert!(!fallback_shape(&RotatedRect::new([0.0, 0.0], 100.0, 15.0, 0.0), &params));
        assert!(!fallback_shape(&RotatedRect::new([0.0, 0.0], 40.0, 30.0, 0.0), &params));
        assert!(!fallback_shape(&RotatedRect::new([0.0, 0.0], 29.0, 16.0, 0.0), &params));
    }

    #[test]
    fn roi_is_clamped_to_frame() {
        let rect = RotatedRect::new([10.0, 10.0], 60.0, 20.0, 0.0);
        assert_eq!(density_roi(&rect, 50, 50), Some(AxisRect::new(0, 0, 50, 20)));
    }

    #[test]
    fn density_counts_bright_mask_pixels() {
        let mut mask = GrayImage::new(10, 10);
        for x in 0..5 {
            mask.put_pixel(x, 0, Luma([255]));
        }
        let d = edge_density(&mask, &AxisRect::new(0, 0, 10, 1), 250);
        assert!((d - 0.5).abs() < 1e-6);
    }

    #[test]
    fn blank_image_reports_no_candidate() {
        let img = Image::Gray(GrayImage::from_pixel(200, 100, Luma([128])));
        let extraction = extract(&img, &ExtractionMode::Gradient(GradientOptions::default()));
        let outcome = select_fallback(&extraction, &img, &FallbackParams::default());
        assert!(outcome.selection.is_none());
        assert_eq!(outcome.scored, 0);
    }
}

//! Primary plate selector over an adaptive-mode hierarchy.
//!
//! Regions are visited in hierarchy discovery order and the **first** one
//! that passes the plate envelope and owns enough key-shaped children wins.
//! No ranking happens: a later, "better" region is never considered once a
//! qualifying one has been seen.

use super::crop::{rotated_crop, CropMode, CropResult};
use super::params::{KeyShape, PrimaryParams};
use crate::diagnostics::{CandidateSample, CandidateVerdict};
use crate::geometry::{AxisRect, RotatedRect};
use crate::image::Image;
use crate::regions::RegionHierarchy;
use log::debug;

/// Accepted plate region with its crop.
#[derive(Clone, Debug)]
pub struct PrimarySelection {
    pub region: usize,
    pub key_children: usize,
    pub crop: CropResult,
}

#[derive(Clone, Debug)]
pub struct PrimaryOutcome {
    pub selection: Option<PrimarySelection>,
    pub regions: usize,
    /// Regions that passed the envelope, with their verdicts, in scan order.
    pub samples: Vec<CandidateSample>,
}

/// Plate-shape envelope on a landscape-normalized rectangle.
pub fn plate_envelope(rect: &RotatedRect, params: &PrimaryParams) -> bool {
    let rect = rect.landscape();
    let ratio = rect.aspect_ratio();
    ratio > params.min_ratio
        && ratio < params.max_ratio
        && rect.height > params.min_height
        && rect.width > params.min_width
        && rect.height < params.max_height
}

/// Character-like child test on the child's axis-aligned box.
pub fn is_key_shaped(bounds: &AxisRect, key: &KeyShape) -> bool {
    if bounds.width <= key.min_width || bounds.height <= key.min_height {
        return false;
    }
    let ratio = bounds.width as f32 / bounds.height as f32;
    ratio > key.min_ratio && ratio < key.max_ratio
}

pub fn count_key_children(hierarchy: &RegionHierarchy, idx: usize, key: &KeyShape) -> usize {
    hierarchy
        .children(idx)
        .filter(|(_, child)| is_key_shaped(&child.bounds, key))
        .count()
}

pub fn select_primary(
    hierarchy: &RegionHierarchy,
    image: &Image,
    params: &PrimaryParams,
) -> PrimaryOutcome {
    let mut samples = Vec::new();
    let mut selection = None;

    for (idx, region) in hierarchy.iter() {
        if !plate_envelope(&region.rect, params) {
            continue;
        }
        let keys = count_key_children(hierarchy, idx, &params.key);
        let rect = region.rect.landscape();
        if keys >= params.min_key_children {
            samples.push(CandidateSample {
                region: idx,
                rect,
                verdict: CandidateVerdict::Accepted,
            });
            debug!(
                "primary: region {idx} accepted ({}x{} @ {:.1} deg, {keys} keys)",
                rect.width, rect.height, rect.angle_deg
            );
            selection = Some(PrimarySelection {
                region: idx,
                key_children: keys,
                crop: rotated_crop(image, &region.rect, CropMode::Landscape),
            });
            break;
        }
        samples.push(CandidateSample {
            region: idx,
            rect,
            verdict: CandidateVerdict::TooFewKeys { keys },
        });
    }

    PrimaryOutcome {
        selection,
        regions: hierarchy.len(),
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::{extract_regions, AdaptiveOptions, ExtractionMode};
    use image::{GrayImage, Luma};

    #[test]
    fn envelope_is_a_pure_function_of_the_rect() {
        let params = PrimaryParams::default();
        let plate = RotatedRect::new([0.0, 0.0], 200.0, 50.0, 0.0);
        assert!(plate_envelope(&plate, &params));
        assert!(plate_envelope(&plate.landscape().portrait(), &params));
        assert!(!plate_envelope(&RotatedRect::new([0.0, 0.0], 200.0, 95.0, 0.0), &params));
        assert!(!plate_envelope(&RotatedRect::new([0.0, 0.0], 80.0, 30.0, 0.0), &params));
        assert!(!plate_envelope(&RotatedRect::new([0.0, 0.0], 400.0, 50.0, 0.0), &params));
        for _ in 0..3 {
            assert!(plate_envelope(&plate, &params));
        }
    }

    #[test]
    fn key_shape_bounds() {
        let key = KeyShape::default();
        assert!(is_key_shaped(&AxisRect::new(0, 0, 20, 40), &key));
        assert!(!is_key_shaped(&AxisRect::new(0, 0, 10, 40), &key));
        assert!(!is_key_shaped(&AxisRect::new(0, 0, 30, 40), &key));
        assert!(!is_key_shaped(&AxisRect::new(0, 0, 11, 40), &key));
    }

    #[test]
    fn empty_hierarchy_is_not_found() {
        let img = Image::Gray(GrayImage::new(32, 32));
        let outcome = select_primary(&RegionHierarchy::default(), &img, &PrimaryParams::default());
        assert!(outcome.selection.is_none());
        assert!(outcome.samples.is_empty());
    }

    #[test]
    fn plate_without_enough_keys_is_rejected() {
        let mut gray = GrayImage::from_pixel(320, 240, Luma([40]));
        for y in 80..156 {
            for x in 10..310 {
                gray.put_pixel(x, y, Luma([220]));
            }
        }
        for k in 0..3u32 {
            for y in 98..138 {
                for x in 40 + 60 * k..60 + 60 * k {
                    gray.put_pixel(x, y, Luma([30]));
                }
            }
        }
        let img = Image::Gray(gray);
        let hierarchy = extract_regions(&img, &ExtractionMode::Adaptive(AdaptiveOptions::default()));
        let outcome = select_primary(&hierarchy, &img, &PrimaryParams::default());
        assert!(outcome.selection.is_none());
        assert!(outcome
            .samples
            .iter()
            .any(|s| s.verdict == CandidateVerdict::TooFewKeys { keys: 3 }));
    }
}

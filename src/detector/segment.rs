//! Character fragment segmentation, ordering and normalization.
//!
//! Overview
//! - Adaptive extraction on the refined plate; every region is portrait
//!   normalized (`height >= width`) and kept when it matches the character
//!   envelope.
//! - Survivors are cropped upright and ordered left-to-right by repeatedly
//!   taking the smallest remaining center x. A center closer than
//!   `merge_distance` to the last emitted one is a duplicate trace of the
//!   same character and is dropped.
//! - Emitted fragments are binarized against the plate mean, resized to a
//!   square, inverted, padded and resized back to the square.

use super::crop::{rotated_crop, CropMode};
use super::params::{NormalizeParams, SegmentParams};
use crate::geometry::RotatedRect;
use crate::image::{inverted, mean_intensity, resize_gray, threshold_above, Image};
use crate::regions::{extract_regions, AdaptiveOptions, ExtractionMode};
use image::GrayImage;
use log::debug;

/// One character candidate, ready for a classifier.
#[derive(Clone, Debug)]
pub struct Fragment {
    /// Normalized square image (white glyph on black).
    pub image: GrayImage,
    /// Upright crop before normalization.
    pub crop: Image,
    /// Portrait-normalized rectangle in plate coordinates.
    pub rect: RotatedRect,
    pub center_x: f32,
}

/// Counts reported alongside the fragments.
#[derive(Clone, Debug, Default)]
pub struct Segmentation {
    pub fragments: Vec<Fragment>,
    pub regions: usize,
    pub candidates: usize,
    pub merged: usize,
    pub plate_mean: f64,
}

/// Character envelope on a portrait-normalized rectangle.
pub fn fragment_shape(rect: &RotatedRect, params: &SegmentParams) -> bool {
    let rect = rect.portrait();
    if rect.width <= params.min_width
        || rect.height <= params.min_height
        || rect.height > params.max_height
    {
        return false;
    }
    let ratio = rect.height / rect.width;
    ratio > params.min_ratio && ratio < params.max_ratio
}

/// Left-to-right order with duplicate suppression.
///
/// Repeatedly removes the item with the smallest x (earliest on ties). It is
/// emitted unless it lies less than `merge_distance` to the right of the
/// previously emitted x, in which case it is discarded. Returns the emitted
/// items and the number of discarded ones.
pub fn order_fragments<T>(items: Vec<(f32, T)>, merge_distance: f32) -> (Vec<T>, usize) {
    let mut remaining = items;
    let mut emitted = Vec::with_capacity(remaining.len());
    let mut last_x: Option<f32> = None;
    let mut merged = 0usize;

    while !remaining.is_empty() {
        let mut min_idx = 0;
        for (idx, (x, _)) in remaining.iter().enumerate() {
            if *x < remaining[min_idx].0 {
                min_idx = idx;
            }
        }
        let (x, item) = remaining.remove(min_idx);
        match last_x {
            Some(prev) if x < prev + merge_distance => merged += 1,
            _ => {
                emitted.push(item);
                last_x = Some(x);
            }
        }
    }
    (emitted, merged)
}

/// Classifier input format: threshold at `level`, square resize, invert,
/// zero padding, square resize.
pub fn normalize_fragment(crop: &Image, level: f64, params: &NormalizeParams) -> GrayImage {
    let size = params.size.max(1);
    let binary = threshold_above(&crop.to_gray(), level);
    let square = inverted(&resize_gray(&binary, size, size));
    let border = (params.border_fraction * size as f32) as u32;
    let padded_side = size + 2 * border;
    let mut padded = GrayImage::new(padded_side, padded_side);
    image::imageops::replace(&mut padded, &square, border as i64, border as i64);
    resize_gray(&padded, size, size)
}

pub fn segment_plate(
    plate: &Image,
    regions: &AdaptiveOptions,
    params: &SegmentParams,
    normalize: &NormalizeParams,
) -> Segmentation {
    let hierarchy = extract_regions(plate, &ExtractionMode::Adaptive(regions.clone()));
    let candidates: Vec<(f32, (RotatedRect, Image))> = hierarchy
        .iter()
        .filter(|(_, region)| fragment_shape(&region.rect, params))
        .map(|(_, region)| {
            let crop = rotated_crop(plate, &region.rect, CropMode::Portrait);
            (region.rect.center[0], (crop.rect, crop.image))
        })
        .collect();
    let candidate_count = candidates.len();

    let (ordered, merged) = order_fragments(candidates, params.merge_distance);
    let plate_mean = mean_intensity(&plate.to_gray());
    let fragments: Vec<Fragment> = ordered
        .into_iter()
        .map(|(rect, crop)| Fragment {
            image: normalize_fragment(&crop, plate_mean, normalize),
            center_x: rect.center[0],
            crop,
            rect,
        })
        .collect();

    debug!(
        "segment: regions={} candidates={} emitted={} merged={} plate_mean={:.1}",
        hierarchy.len(),
        candidate_count,
        fragments.len(),
        merged,
        plate_mean
    );

    Segmentation {
        fragments,
        regions: hierarchy.len(),
        candidates: candidate_count,
        merged,
        plate_mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn shape_filter_uses_portrait_convention() {
        let params = SegmentParams::default();
        let glyph = RotatedRect::new([0.0, 0.0], 40.0, 80.0, 0.0);
        assert!(fragment_shape(&glyph, &params));
        assert!(fragment_shape(&glyph.landscape(), &params));
        assert!(!fragment_shape(&RotatedRect::new([0.0, 0.0], 25.0, 80.0, 0.0), &params));
        assert!(!fragment_shape(&RotatedRect::new([0.0, 0.0], 40.0, 181.0, 0.0), &params));
        assert!(!fragment_shape(&RotatedRect::new([0.0, 0.0], 70.0, 80.0, 0.0), &params));
        assert!(!fragment_shape(&RotatedRect::new([0.0, 0.0], 30.0, 180.0, 0.0), &params));
    }

    #[test]
    fn near_duplicates_collapse() {
        let (order, merged) = order_fragments(vec![(50.0, 50), (12.0, 12), (48.0, 48), (90.0, 90)], 5.0);
        assert_eq!(order, vec![12, 48, 90]);
        assert_eq!(merged, 1);
    }

    #[test]
    fn ordering_is_reproducible_and_handles_empty() {
        let input = vec![(30.0, 'c'), (10.0, 'a'), (20.0, 'b'), (21.0, 'x')];
        let first = order_fragments(input.clone(), 5.0);
        let second = order_fragments(input, 5.0);
        assert_eq!(first, second);
        assert_eq!(first.0, vec!['a', 'b', 'c']);
        let (empty, merged) = order_fragments::<u8>(Vec::new(), 5.0);
        assert!(empty.is_empty());
        assert_eq!(merged, 0);
    }

    #[test]
    fn duplicate_chain_compares_with_last_emitted() {
        let (order, merged) = order_fragments(vec![(10.0, 0), (14.0, 1), (18.0, 2)], 5.0);
        assert_eq!(order, vec![0, 2]);
        assert_eq!(merged, 1);
    }

    #[test]
    fn normalized_fragment_is_padded_square() {
        let mut glyph = GrayImage::from_pixel(40, 80, Luma([220]));
        for y in 10..70 {
            for x in 15..25 {
                glyph.put_pixel(x, y, Luma([20]));
            }
        }
        let out = normalize_fragment(&Image::Gray(glyph), 120.0, &NormalizeParams::default());
        assert_eq!(out.dimensions(), (28, 28));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(27, 27)[0], 0);
        assert!(out.get_pixel(14, 14)[0] > 200);
    }
}

//! Plate refinement: re-extract regions inside the crop and re-crop to the
//! region that dominates in both dimensions.
//!
//! A region replaces the current best only when its landscape width *and*
//! height are both at least the current maxima and its height exceeds the
//! floor. Without a winner the input crop is returned untouched.

use super::crop::{rotated_crop, CropMode};
use super::params::RefineParams;
use crate::geometry::RotatedRect;
use crate::image::Image;
use crate::regions::{extract_regions, AdaptiveOptions, ExtractionMode};
use log::{debug, warn};

#[derive(Clone, Debug)]
pub enum RefineOutcome {
    Refined {
        image: Image,
        /// Winning rectangle in the coordinates of the input crop.
        rect: RotatedRect,
        region: usize,
    },
    /// Nothing qualified; the crop passes through unchanged.
    Unrefined { image: Image },
}

impl RefineOutcome {
    pub fn image(&self) -> &Image {
        match self {
            RefineOutcome::Refined { image, .. } | RefineOutcome::Unrefined { image } => image,
        }
    }

    pub fn into_image(self) -> Image {
        match self {
            RefineOutcome::Refined { image, .. } | RefineOutcome::Unrefined { image } => image,
        }
    }

    pub fn is_refined(&self) -> bool {
        matches!(self, RefineOutcome::Refined { .. })
    }
}

/// Index and rectangle of the dominating region, if any.
pub fn dominant_rect<'a, I>(rects: I, min_height: f32) -> Option<(usize, RotatedRect)>
where
    I: IntoIterator<Item = (usize, &'a RotatedRect)>,
{
    rects
        .into_iter()
        .fold(None, |best: Option<(usize, RotatedRect)>, (idx, rect)| {
            let norm = rect.landscape();
            let (max_w, max_h) = best.map_or((0.0, 0.0), |(_, b)| (b.width, b.height));
            if norm.width >= max_w && norm.height >= max_h && norm.height > min_height {
                Some((idx, norm))
            } else {
                best
            }
        })
}

pub fn refine_plate(plate: &Image, regions: &AdaptiveOptions, params: &RefineParams) -> RefineOutcome {
    let hierarchy = extract_regions(plate, &ExtractionMode::Adaptive(regions.clone()));
    let winner = dominant_rect(
        hierarchy.iter().map(|(idx, region)| (idx, &region.rect)),
        params.min_height,
    );
    match winner {
        Some((region, rect)) => {
            debug!(
                "refine: region {region} {:.0}x{:.0} @ {:.1} deg",
                rect.width, rect.height, rect.angle_deg
            );
            let crop = rotated_crop(plate, &rect, CropMode::Landscape);
            RefineOutcome::Refined {
                image: crop.image,
                rect: crop.rect,
                region,
            }
        }
        None => {
            warn!(
                "refine: no region among {} qualified, keeping unrefined crop",
                hierarchy.len()
            );
            RefineOutcome::Unrefined {
                image: plate.clone(),
            }
        }
    }
}

//! Region extraction: image → binary mask → region hierarchy.
//!
//! Pipeline
//! - Reduce to a single channel.
//! - Binarize with the strategy selected by [`ExtractionMode`]
//!   (see [`binarize`] for the exact steps of each mode).
//! - Trace all borders of the mask. Adaptive mode keeps the full nesting
//!   tree, gradient mode keeps only outer borders of top-level components.
//! - Attach a minimum-area rotated rectangle and an axis-aligned box to
//!   each border.
//!
//! Notes
//! - An image without foreground yields an empty hierarchy; this is a normal
//!   outcome, never an error.
//! - Components touching the image edge are traced one pixel inside the
//!   frame, so in adaptive mode a perfectly flat image is entirely
//!   foreground and produces a single region just inside the frame.

pub mod binarize;
mod hierarchy;

pub use binarize::{AdaptiveOptions, GradientOptions};
pub use hierarchy::{BorderKind, Children, Region, RegionHierarchy, Retrieval};

use crate::image::Image;
use image::GrayImage;
use log::debug;
use serde::{Deserialize, Serialize};

/// Extraction strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExtractionMode {
    /// Local-adaptive threshold + opening, full hierarchy.
    Adaptive(AdaptiveOptions),
    /// Gradient emphasis + closing, external borders only.
    Gradient(GradientOptions),
}

impl ExtractionMode {
    pub fn retrieval(&self) -> Retrieval {
        match self {
            ExtractionMode::Adaptive(_) => Retrieval::Tree,
            ExtractionMode::Gradient(_) => Retrieval::External,
        }
    }

    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        match self {
            ExtractionMode::Adaptive(opts) => binarize::binarize_adaptive(gray, opts),
            ExtractionMode::Gradient(opts) => binarize::binarize_gradient(gray, opts),
        }
    }
}

/// Mask and hierarchy produced by one extraction.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub mask: GrayImage,
    pub hierarchy: RegionHierarchy,
}

pub fn extract(image: &Image, mode: &ExtractionMode) -> Extraction {
    let gray = image.to_gray();
    if gray.width() == 0 || gray.height() == 0 {
        return Extraction {
            mask: gray,
            hierarchy: RegionHierarchy::default(),
        };
    }
    let mask = mode.binarize(&gray);
    let hierarchy = RegionHierarchy::from_mask(&mask, mode.retrieval());
    debug!(
        "extract: {}x{} retrieval={:?} regions={}",
        gray.width(),
        gray.height(),
        mode.retrieval(),
        hierarchy.len()
    );
    Extraction { mask, hierarchy }
}

/// Same as [`extract`] when the mask is not needed afterwards.
pub fn extract_regions(image: &Image, mode: &ExtractionMode) -> RegionHierarchy {
    extract(image, mode).hierarchy
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn flat_image_has_no_gradient_regions() {
        let img = Image::Gray(GrayImage::from_pixel(120, 80, Luma([60])));
        let hierarchy = extract_regions(&img, &ExtractionMode::Gradient(GradientOptions::default()));
        assert!(hierarchy.is_empty());
    }

    #[test]
    fn flat_image_is_one_adaptive_region() {
        let img = Image::Gray(GrayImage::from_pixel(120, 80, Luma([60])));
        let hierarchy = extract_regions(&img, &ExtractionMode::Adaptive(AdaptiveOptions::default()));
        assert_eq!(hierarchy.len(), 1);
        let region = hierarchy.get(0).unwrap();
        assert_eq!(region.kind, BorderKind::Outer);
        assert_eq!(region.bounds.width, 118);
        assert_eq!(region.bounds.height, 78);
    }

    #[test]
    fn zero_sized_image_yields_empty_hierarchy() {
        let img = Image::Gray(GrayImage::new(0, 0));
        let out = extract(&img, &ExtractionMode::Adaptive(AdaptiveOptions::default()));
        assert!(out.hierarchy.is_empty());
    }

    #[test]
    fn mode_deserializes_from_tagged_json() {
        let mode: ExtractionMode =
            serde_json::from_str(r#"{"kind":"gradient","threshold":60}"#).unwrap();
        match mode {
            ExtractionMode::Gradient(opts) => {
                assert_eq!(opts.threshold, 60);
                assert_eq!(opts.close_radius, 8);
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }
}

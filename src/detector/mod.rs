//! Plate detector: candidate selection, cropping, refinement, segmentation.
//!
//! Overview
//! - [`primary`] scans an adaptive-threshold hierarchy in discovery order
//!   and accepts the first plate-shaped region with at least five
//!   character-shaped children.
//! - [`fallback`] runs only on a primary miss: it scores external regions of
//!   a gradient mask by edge density and keeps the densest one.
//! - [`crop`] resamples rotated rectangles into upright images under a
//!   landscape or portrait convention.
//! - [`refine`] tightens the plate crop to its dominating region.
//! - [`segment`] extracts, orders and normalizes the character fragments.
//!
//! Failure semantics
//! - Primary miss: recoverable, the fallback runs.
//! - Both selectors miss: `PlateError::PlateNotFound`.
//! - Refinement miss: silent, the unrefined crop is used.
//! - No fragments: `PlateError::NoFragments`.

pub mod crop;
pub mod fallback;
pub mod params;
mod pipeline;
pub mod primary;
pub mod refine;
pub mod segment;

pub use crop::{crop_roi, rotated_crop, CropMode, CropResult};
pub use params::{
    FallbackParams, FragmentRegions, KeyShape, NormalizeParams, PlateParams, PrimaryParams,
    RefineParams, SegmentParams, WorkingSize,
};
pub use pipeline::PlateDetector;
pub use segment::Fragment;

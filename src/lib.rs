#![doc = include_str!("../README.md")]

// Public modules
pub mod config;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod homography;
pub mod image;
pub mod types;
pub mod verify;

// Building blocks shared by the detector stages.
pub mod geometry;
pub mod regions;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + results.
pub use crate::detector::{PlateDetector, PlateParams};
pub use crate::error::PlateError;
pub use crate::image::Image;
pub use crate::types::{DetectionStrategy, PlateDetection, PlateLocation};

// High-level diagnostics returned by the detector.
pub use crate::diagnostics::{DetectionReport, PipelineTrace};

// Fragment verification.
pub use crate::verify::{CandidateVerifier, Localization, VerificationReport, VerifyParams};

// Convenience homography helpers that are generally useful.
pub use crate::homography::{apply_homography_points, rescale_homography_image_space};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use plate_detector::prelude::*;
///
/// # fn main() -> Result<(), String> {
/// let img = load_image(std::path::Path::new("car.jpg"))?;
/// let detector = PlateDetector::new(PlateParams::default());
/// match detector.process(&img) {
///     Ok(det) => println!("{} fragments at {:?}", det.fragments.len(), det.corners()),
///     Err(err) => println!("no plate: {err}"),
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::io::load_image;
    pub use crate::{
        CandidateVerifier, Image, PlateDetection, PlateDetector, PlateError, PlateParams,
        VerifyParams,
    };
}

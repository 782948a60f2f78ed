//! Detector pipeline driving plate detection and segmentation end-to-end.
//!
//! The [`PlateDetector`] takes a decoded image and returns the plate outline
//! together with the ordered, normalized character fragments. Internally it
//! runs the primary selector, falls back to the gradient selector on a miss,
//! resamples the crop to the working resolution, refines it and segments it.
//!
//! Typical usage:
//! ```no_run
//! use plate_detector::{Image, PlateDetector, PlateParams};
//!
//! # fn example(img: Image) {
//! let detector = PlateDetector::new(PlateParams::default());
//! let report = detector.process_with_diagnostics(&img);
//! if let Ok(det) = &report.result {
//!     println!("{} fragments, corners {:?}", det.fragments.len(), det.corners());
//! }
//! # }
//! ```
use super::fallback::select_fallback;
use super::params::PlateParams;
use super::primary::select_primary;
use super::refine::{refine_plate, RefineOutcome};
use super::segment::segment_plate;
use crate::diagnostics::{
    elapsed_ms, DetectionReport, FallbackStage, PipelineTrace, PrimaryStage, RefineStage,
    SegmentationStage,
};
use crate::error::{PlateError, Result};
use crate::image::Image;
use crate::regions::{extract, extract_regions, ExtractionMode};
use crate::types::{DetectionStrategy, DetectionSummary, PlateDetection, PlateLocation};
use log::{debug, info};
use std::time::Instant;

/// Plate detector; stateless between calls, so one instance can serve any
/// number of images.
#[derive(Clone, Debug, Default)]
pub struct PlateDetector {
    params: PlateParams,
}

impl PlateDetector {
    pub fn new(params: PlateParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PlateParams {
        &self.params
    }

    /// Detection and segmentation without the trace.
    pub fn process(&self, image: &Image) -> Result<PlateDetection> {
        self.process_with_diagnostics(image).result
    }

    /// Plate localisation only (primary selector, then fallback).
    pub fn locate(&self, image: &Image) -> Result<PlateLocation> {
        self.locate_traced(image, None)
    }

    pub fn process_with_diagnostics(&self, image: &Image) -> DetectionReport {
        let start = Instant::now();
        let mut trace = PipelineTrace::new(image);
        debug!(
            "PlateDetector::process start w={} h={} channels={}",
            image.width(),
            image.height(),
            image.channels()
        );
        let result = self.run(image, &mut trace);
        trace.timings.total_ms = elapsed_ms(start);
        match &result {
            Ok(det) => info!(
                "plate found via {:?}: {} fragments in {:.2} ms",
                det.location.strategy,
                det.fragments.len(),
                trace.timings.total_ms
            ),
            Err(err) => info!("detection failed: {err}"),
        }
        let summary = DetectionSummary::new(&result, trace.timings.total_ms);
        DetectionReport {
            result,
            summary,
            trace,
        }
    }

    fn run(&self, image: &Image, trace: &mut PipelineTrace) -> Result<PlateDetection> {
        let location = self.locate_traced(image, Some(&mut *trace))?;

        let working = &self.params.working;
        let plate = if working.enabled {
            location.crop.resize_exact(working.width, working.height)
        } else {
            location.crop.clone()
        };
        let input_size = [plate.width(), plate.height()];

        let stage = Instant::now();
        let refined = if self.params.refine.enabled {
            refine_plate(&plate, &self.params.fragment_regions.0, &self.params.refine)
        } else {
            RefineOutcome::Unrefined { image: plate }
        };
        trace.timings.lap("refine", stage);
        trace.refine = Some(RefineStage::new(input_size, &refined));
        let is_refined = refined.is_refined();
        let plate = refined.into_image();

        let stage = Instant::now();
        let segmentation = segment_plate(
            &plate,
            &self.params.fragment_regions.0,
            &self.params.segment,
            &self.params.normalize,
        );
        trace.timings.lap("segment", stage);
        trace.segmentation = Some(SegmentationStage::from(&segmentation));
        if segmentation.fragments.is_empty() {
            return Err(PlateError::NoFragments);
        }

        Ok(PlateDetection {
            location,
            plate,
            refined: is_refined,
            fragments: segmentation.fragments,
        })
    }

    /// Selector chain; stage records go to `trace` when one is given.
    fn locate_traced(
        &self,
        image: &Image,
        mut trace: Option<&mut PipelineTrace>,
    ) -> Result<PlateLocation> {
        if image.is_empty() {
            return Err(PlateError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let stage = Instant::now();
        let hierarchy = extract_regions(
            image,
            &ExtractionMode::Adaptive(self.params.plate_regions.clone()),
        );
        let primary = select_primary(&hierarchy, image, &self.params.primary);
        if let Some(trace) = trace.as_deref_mut() {
            trace.timings.lap("primary", stage);
            trace.primary = Some(PrimaryStage::from(&primary));
        }
        if let Some(sel) = primary.selection {
            return Ok(PlateLocation {
                strategy: DetectionStrategy::Primary,
                rect: sel.crop.rect,
                corners: sel.crop.rect.corners(),
                region: sel.region,
                crop: sel.crop.image,
            });
        }
        info!(
            "primary selector found no plate among {} regions, trying fallback",
            primary.regions
        );

        let stage = Instant::now();
        let extraction = extract(image, &ExtractionMode::Gradient(self.params.gradient.clone()));
        let fallback = select_fallback(&extraction, image, &self.params.fallback);
        if let Some(trace) = trace {
            trace.timings.lap("fallback", stage);
            trace.fallback = Some(FallbackStage::from(&fallback));
        }
        match fallback.selection {
            Some(sel) => Ok(PlateLocation {
                strategy: DetectionStrategy::Fallback,
                rect: sel.rect,
                corners: sel.rect.corners(),
                region: sel.region,
                crop: sel.crop.image,
            }),
            None => Err(PlateError::PlateNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn empty_input_is_rejected() {
        let detector = PlateDetector::default();
        let img = Image::Gray(GrayImage::new(0, 10));
        assert_eq!(
            detector.process(&img).unwrap_err(),
            PlateError::EmptyImage {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn flat_image_reports_total_miss_with_trace() {
        let detector = PlateDetector::default();
        let img = Image::Gray(GrayImage::from_pixel(160, 120, Luma([90])));
        let report = detector.process_with_diagnostics(&img);
        assert_eq!(report.result.unwrap_err(), PlateError::PlateNotFound);
        assert!(!report.summary.found);
        assert!(report.trace.primary.is_some());
        let fallback = report.trace.fallback.expect("fallback stage recorded");
        assert!(fallback.selected.is_none());
        assert!(report.trace.refine.is_none());
    }

    #[test]
    fn locate_matches_traced_location() {
        let detector = PlateDetector::default();
        let img = Image::Gray(GrayImage::from_pixel(160, 120, Luma([90])));
        assert_eq!(detector.locate(&img).unwrap_err(), PlateError::PlateNotFound);
        let mut trace = PipelineTrace::new(&img);
        let traced = detector.locate_traced(&img, Some(&mut trace));
        assert_eq!(traced.unwrap_err(), PlateError::PlateNotFound);
        assert!(trace.primary.is_some() && trace.fallback.is_some());
        assert_eq!(trace.timings.stages.len(), 2);
    }
}

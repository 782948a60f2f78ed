use super::stages::{FallbackStage, PrimaryStage, RefineStage, SegmentationStage};
use super::timing::TimingBreakdown;
use crate::error::PlateError;
use crate::image::Image;
use crate::types::{DetectionSummary, PlateDetection};
use serde::Serialize;

/// Result produced by [`PlateDetector::process_with_diagnostics`](crate::PlateDetector).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    /// Full result with pixel buffers; not serialized.
    #[serde(skip)]
    pub result: Result<PlateDetection, PlateError>,
    pub summary: DetectionSummary,
    pub trace: PipelineTrace,
}

/// Record of every stage the detector executed for one image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<PrimaryStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refine: Option<RefineStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<SegmentationStage>,
}

impl PipelineTrace {
    pub fn new(image: &Image) -> Self {
        Self {
            input: InputDescriptor {
                width: image.width(),
                height: image.height(),
                channels: image.channels(),
            },
            timings: TimingBreakdown::default(),
            primary: None,
            fallback: None,
            refine: None,
            segmentation: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

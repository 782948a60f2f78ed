//! Per-stage records collected by [`PlateDetector`](crate::PlateDetector).

use crate::detector::fallback::FallbackOutcome;
use crate::detector::primary::PrimaryOutcome;
use crate::detector::refine::RefineOutcome;
use crate::detector::segment::Segmentation;
use crate::geometry::{AxisRect, RotatedRect};
use serde::Serialize;

/// Why a plate-shaped region was accepted or passed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CandidateVerdict {
    Accepted,
    TooFewKeys { keys: usize },
}

/// A region that passed the plate envelope, in scan order.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSample {
    pub region: usize,
    pub rect: RotatedRect,
    pub verdict: CandidateVerdict,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryStage {
    pub regions: usize,
    pub candidates: Vec<CandidateSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
}

impl From<&PrimaryOutcome> for PrimaryStage {
    fn from(outcome: &PrimaryOutcome) -> Self {
        Self {
            regions: outcome.regions,
            candidates: outcome.samples.clone(),
            selected: outcome.selection.as_ref().map(|s| s.region),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackStage {
    pub regions: usize,
    pub scored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<AxisRect>,
}

impl From<&FallbackOutcome> for FallbackStage {
    fn from(outcome: &FallbackOutcome) -> Self {
        let sel = outcome.selection.as_ref();
        Self {
            regions: outcome.regions,
            scored: outcome.scored,
            selected: sel.map(|s| s.region),
            density: sel.map(|s| s.density),
            roi: sel.map(|s| s.roi),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineStage {
    pub refined: bool,
    /// Working-resolution size of the crop handed to the refiner.
    pub input_size: [u32; 2],
    pub output_size: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<RotatedRect>,
}

impl RefineStage {
    pub fn new(input_size: [u32; 2], outcome: &RefineOutcome) -> Self {
        let (w, h) = outcome.image().dimensions();
        Self {
            refined: outcome.is_refined(),
            input_size,
            output_size: [w, h],
            rect: match outcome {
                RefineOutcome::Refined { rect, .. } => Some(*rect),
                RefineOutcome::Unrefined { .. } => None,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationStage {
    pub regions: usize,
    pub candidates: usize,
    pub merged: usize,
    pub emitted: usize,
    pub plate_mean: f64,
    pub centers: Vec<f32>,
}

impl From<&Segmentation> for SegmentationStage {
    fn from(seg: &Segmentation) -> Self {
        Self {
            regions: seg.regions,
            candidates: seg.candidates,
            merged: seg.merged,
            emitted: seg.fragments.len(),
            plate_mean: seg.plate_mean,
            centers: seg.fragments.iter().map(|f| f.center_x).collect(),
        }
    }
}

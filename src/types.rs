use crate::detector::segment::Fragment;
use crate::error::PlateError;
use crate::geometry::RotatedRect;
use crate::image::Image;
use image::GrayImage;
use serde::Serialize;

/// Which selector produced the plate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionStrategy {
    Primary,
    Fallback,
}

/// Plate outline in source-image coordinates plus the initial crop.
#[derive(Clone, Debug)]
pub struct PlateLocation {
    pub strategy: DetectionStrategy,
    /// Landscape-normalized plate rectangle.
    pub rect: RotatedRect,
    /// Corners of `rect`: top-left, top-right, bottom-right, bottom-left.
    pub corners: [[f32; 2]; 4],
    /// Index of the winning region in its hierarchy.
    pub region: usize,
    pub crop: Image,
}

/// Full output of one detector run.
#[derive(Clone, Debug)]
pub struct PlateDetection {
    pub location: PlateLocation,
    /// Plate after resampling and refinement; fragments live in its frame.
    pub plate: Image,
    pub refined: bool,
    /// Left-to-right, duplicate-free.
    pub fragments: Vec<Fragment>,
}

impl PlateDetection {
    pub fn corners(&self) -> [[f32; 2]; 4] {
        self.location.corners
    }

    /// Normalized fragment images in reading order.
    pub fn fragment_images(&self) -> Vec<&GrayImage> {
        self.fragments.iter().map(|f| &f.image).collect()
    }
}

/// Serializable digest of a detector run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DetectionStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_rect: Option<RotatedRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corners: Option<[[f32; 2]; 4]>,
    pub refined: bool,
    pub fragment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: f64,
}

impl DetectionSummary {
    pub fn new(result: &Result<PlateDetection, PlateError>, latency_ms: f64) -> Self {
        match result {
            Ok(det) => Self {
                found: true,
                strategy: Some(det.location.strategy),
                plate_rect: Some(det.location.rect),
                corners: Some(det.location.corners),
                refined: det.refined,
                fragment_count: det.fragments.len(),
                error: None,
                latency_ms,
            },
            Err(err) => Self {
                error: Some(err.to_string()),
                latency_ms,
                ..Self::default()
            },
        }
    }
}

//! Parameter types configuring the detector stages.
//!
//! Every threshold is an empirical constant tuned for plate-like regions of
//! a narrow aspect-ratio and lighting regime; the defaults reproduce that
//! tuning. All structs deserialize with missing fields taking defaults so a
//! JSON config only needs to name what it changes.

use crate::regions::{AdaptiveOptions, GradientOptions};
use serde::{Deserialize, Serialize};

/// Detector-wide parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateParams {
    /// Adaptive extraction used to search for plates in the full image.
    pub plate_regions: AdaptiveOptions,
    /// Adaptive extraction used inside a cropped plate (refine + segment).
    pub fragment_regions: FragmentRegions,
    /// Gradient extraction used by the fallback selector.
    pub gradient: GradientOptions,
    pub primary: PrimaryParams,
    pub fallback: FallbackParams,
    pub working: WorkingSize,
    pub refine: RefineParams,
    pub segment: SegmentParams,
    pub normalize: NormalizeParams,
}

/// Adaptive options for the in-plate stages; defaults disable smoothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentRegions(pub AdaptiveOptions);

impl Default for FragmentRegions {
    fn default() -> Self {
        Self(AdaptiveOptions::unsmoothed())
    }
}

/// Plate envelope and child-count rule of the primary selector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryParams {
    pub min_ratio: f32,
    pub max_ratio: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Minimum number of key-shaped direct children.
    pub min_key_children: usize,
    pub key: KeyShape,
}

impl Default for PrimaryParams {
    fn default() -> Self {
        Self {
            min_ratio: 1.8,
            max_ratio: 6.0,
            min_width: 90.0,
            min_height: 20.0,
            max_height: 90.0,
            min_key_children: 5,
            key: KeyShape::default(),
        }
    }
}

/// Shape of a character-like child, measured on its axis-aligned box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyShape {
    pub min_width: i32,
    pub min_height: i32,
    pub min_ratio: f32,
    pub max_ratio: f32,
}

impl Default for KeyShape {
    fn default() -> Self {
        Self {
            min_width: 10,
            min_height: 10,
            min_ratio: 0.3,
            max_ratio: 0.75,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackParams {
    pub min_ratio: f32,
    pub max_ratio: f32,
    pub min_width: f32,
    pub min_height: f32,
    /// Mask samples strictly above this level count as edge pixels.
    pub foreground_level: u8,
    /// Extra width granted to the winning ROI before cropping.
    pub widen_px: i32,
}

impl Default for FallbackParams {
    fn default() -> Self {
        Self {
            min_ratio: 1.5,
            max_ratio: 5.0,
            min_width: 30.0,
            min_height: 16.0,
            foreground_level: 250,
            widen_px: 12,
        }
    }
}

/// Fixed resolution the plate crop is resampled to before refinement.
///
/// The fragment predicates are expressed in pixels of this resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingSize {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for WorkingSize {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 600,
            height: 150,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineParams {
    pub enabled: bool,
    pub min_height: f32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            enabled: true,
            min_height: 20.0,
        }
    }
}

/// Fragment filter (portrait-normalized rectangles) and ordering threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    pub min_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub min_ratio: f32,
    pub max_ratio: f32,
    /// Centers closer than this to the last emitted fragment are dropped.
    pub merge_distance: f32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            min_width: 25.0,
            min_height: 75.0,
            max_height: 180.0,
            min_ratio: 1.25,
            max_ratio: 4.4,
            merge_distance: 5.0,
        }
    }
}

/// Output format of the fragments handed to a classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeParams {
    /// Side of the square output.
    pub size: u32,
    /// Border added on each side, as a fraction of `size`.
    pub border_fraction: f32,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            size: 28,
            border_fraction: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: PlateParams =
            serde_json::from_str(r#"{"primary":{"min_key_children":3},"segment":{"merge_distance":8.0}}"#)
                .unwrap();
        assert_eq!(params.primary.min_key_children, 3);
        assert_eq!(params.segment.merge_distance, 8.0);
        assert_eq!(params.primary.max_height, 90.0);
        assert_eq!(params.fragment_regions.0.open_radius, 0);
        assert_eq!(params.plate_regions.open_radius, 1);
    }
}

//! Candidate verifier: locates a fragment template inside a scene.
//!
//! Overview
//! - Both images are prepared (resize, gray, mean threshold, scene
//!   inversion; every step configurable through [`VerifyParams`]).
//! - ORB features are extracted from each ([`orb`]), template descriptors
//!   are matched to their nearest scene descriptor ([`matching`]) and the
//!   matches are kept when their distance is below `ratio` times the best
//!   one.
//! - A RANSAC homography maps the template frame into the scene. Its
//!   corners are reported in prepared-scene and source-scene coordinates.
//!
//! A miss is an ordinary outcome ([`Localization::NotLocated`]) with the
//! reason attached; nothing here returns an error.

pub mod matching;
pub mod orb;

use crate::diagnostics::elapsed_ms;
use crate::homography::{
    apply_homography_points, fit_homography_ransac, rescale_homography_image_space,
    HomographyError, RansacParams,
};
use crate::image::{inverted, mean_intensity, threshold_above, Image};
use image::GrayImage;
use log::{debug, warn};
use matching::{filter_by_min_distance, match_brute_force, min_distance};
use nalgebra::Matrix3;
use orb::{Features, OrbExtractor, OrbParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub use matching::FeatureMatch;
pub use orb::{Descriptor, Keypoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyParams {
    /// Template resize target `[width, height]`; `None` keeps the input size.
    pub template_size: Option<[u32; 2]>,
    pub scene_size: Option<[u32; 2]>,
    /// Threshold both images at their own mean intensity.
    pub binarize: bool,
    /// Invert the binarized scene so glyph polarity matches the templates.
    pub invert_scene: bool,
    pub ratio: f32,
    /// Lower bound applied to the minimum distance before scaling by
    /// `ratio`. At 0 a perfect match (distance 0) rejects every match; 1 keeps
    /// exact duplicates.
    pub distance_floor: f32,
    pub orb: OrbParams,
    pub ransac: RansacParams,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            template_size: Some([80, 120]),
            scene_size: Some([600, 150]),
            binarize: true,
            invert_scene: true,
            ratio: 4.0,
            distance_floor: 0.0,
            orb: OrbParams::default(),
            ransac: RansacParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NotLocatedReason {
    NoTemplateFeatures,
    NoSceneFeatures,
    TooFewMatches { good: usize },
    NoConsensus { inliers: usize },
    DegenerateProjection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Localization {
    #[serde(rename_all = "camelCase")]
    Located {
        /// Template corners (top-left, top-right, bottom-right, bottom-left)
        /// in prepared-scene coordinates.
        corners: [[f32; 2]; 4],
        /// The same corners in source-scene coordinates.
        source_corners: [[f32; 2]; 4],
        /// Template-to-prepared-scene homography, row-major.
        homography: [[f64; 3]; 3],
        inliers: usize,
    },
    NotLocated { reason: NotLocatedReason },
}

impl Localization {
    pub fn is_located(&self) -> bool {
        matches!(self, Localization::Located { .. })
    }

    pub fn corners(&self) -> Option<[[f32; 2]; 4]> {
        match self {
            Localization::Located { corners, .. } => Some(*corners),
            Localization::NotLocated { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub template_keypoints: usize,
    pub scene_keypoints: usize,
    pub matches: usize,
    pub good_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<u32>,
    pub localization: Localization,
    pub elapsed_ms: f64,
}

/// Scene features computed once and shared across templates.
#[derive(Debug, Clone)]
pub struct PreparedScene {
    pub features: Features,
    /// Size of the prepared scene the features live in.
    pub size: [u32; 2],
    pub source_size: [u32; 2],
}

#[derive(Debug, Clone)]
pub struct CandidateVerifier {
    params: VerifyParams,
    orb: OrbExtractor,
}

impl Default for CandidateVerifier {
    fn default() -> Self {
        Self::new(VerifyParams::default())
    }
}

impl CandidateVerifier {
    pub fn new(params: VerifyParams) -> Self {
        let orb = OrbExtractor::new(params.orb.clone());
        Self { params, orb }
    }

    pub fn params(&self) -> &VerifyParams {
        &self.params
    }

    pub fn prepare_template(&self, template: &Image) -> GrayImage {
        prepare(template, self.params.template_size, self.params.binarize, false)
    }

    pub fn prepare_scene(&self, scene: &Image) -> GrayImage {
        prepare(
            scene,
            self.params.scene_size,
            self.params.binarize,
            self.params.binarize && self.params.invert_scene,
        )
    }

    pub fn scene_features(&self, scene: &Image) -> PreparedScene {
        let prepared = self.prepare_scene(scene);
        PreparedScene {
            features: self.orb.detect_and_compute(&prepared),
            size: [prepared.width(), prepared.height()],
            source_size: [scene.width(), scene.height()],
        }
    }

    pub fn verify(&self, template: &Image, scene: &Image) -> VerificationReport {
        let scene = self.scene_features(scene);
        self.verify_against(template, &scene)
    }

    /// Verifies every template against one scene; reports keep input order.
    pub fn verify_batch(&self, templates: &[Image], scene: &Image) -> Vec<VerificationReport> {
        let scene = self.scene_features(scene);
        templates
            .par_iter()
            .map(|template| self.verify_against(template, &scene))
            .collect()
    }

    pub fn verify_against(&self, template: &Image, scene: &PreparedScene) -> VerificationReport {
        let start = Instant::now();
        let prepared = self.prepare_template(template);
        let tf = self.orb.detect_and_compute(&prepared);
        let sf = &scene.features;

        let mut report = VerificationReport {
            template_keypoints: tf.len(),
            scene_keypoints: sf.len(),
            matches: 0,
            good_matches: 0,
            min_distance: None,
            localization: Localization::NotLocated {
                reason: NotLocatedReason::NoTemplateFeatures,
            },
            elapsed_ms: 0.0,
        };
        if tf.is_empty() || sf.is_empty() {
            if sf.is_empty() {
                report.localization = Localization::NotLocated {
                    reason: NotLocatedReason::NoSceneFeatures,
                };
            }
            report.elapsed_ms = elapsed_ms(start);
            return report;
        }

        let matches = match_brute_force(&tf.descriptors, &sf.descriptors);
        let good = filter_by_min_distance(&matches, self.params.ratio, self.params.distance_floor);
        report.matches = matches.len();
        report.good_matches = good.len();
        report.min_distance = min_distance(&matches);

        let template_size = [prepared.width(), prepared.height()];
        report.localization = self.localize(&tf, sf, &good, template_size, scene);
        report.elapsed_ms = elapsed_ms(start);
        debug!(
            "verify: template kps={} scene kps={} good={} located={}",
            report.template_keypoints,
            report.scene_keypoints,
            report.good_matches,
            report.localization.is_located()
        );
        report
    }

    fn localize(
        &self,
        template: &Features,
        scene: &Features,
        good: &[FeatureMatch],
        template_size: [u32; 2],
        prepared_scene: &PreparedScene,
    ) -> Localization {
        let not_located = |reason| Localization::NotLocated { reason };
        if good.len() < 4 {
            return not_located(NotLocatedReason::TooFewMatches { good: good.len() });
        }
        let tpts = template.points();
        let spts = scene.points();
        let src: Vec<[f64; 2]> = good.iter().map(|m| tpts[m.template_idx]).collect();
        let dst: Vec<[f64; 2]> = good.iter().map(|m| spts[m.scene_idx]).collect();

        let fit = match fit_homography_ransac(&src, &dst, &self.params.ransac) {
            Ok(fit) => fit,
            Err(HomographyError::InsufficientInliers { found, .. }) => {
                return not_located(NotLocatedReason::NoConsensus { inliers: found })
            }
            Err(HomographyError::TooFewPoints { got, .. }) => {
                return not_located(NotLocatedReason::TooFewMatches { good: got })
            }
            Err(err) => {
                warn!("homography estimation failed: {err}");
                return not_located(NotLocatedReason::DegenerateProjection);
            }
        };

        let [tw, th] = template_size.map(|v| v as f32);
        let frame = [[0.0, 0.0], [tw, 0.0], [tw, th], [0.0, th]];
        let h: Matrix3<f32> = fit.h.cast::<f32>();
        let [sw, sh] = prepared_scene.size;
        let [ow, oh] = prepared_scene.source_size;
        let to_source =
            rescale_homography_image_space(&h, sw as usize, sh as usize, ow as usize, oh as usize);
        let (Some(corners), Some(source_corners)) = (
            apply_homography_points(&h, &frame).and_then(quad),
            apply_homography_points(&to_source, &frame).and_then(quad),
        ) else {
            return not_located(NotLocatedReason::DegenerateProjection);
        };

        let mut homography = [[0.0f64; 3]; 3];
        for (r, row) in homography.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = fit.h[(r, c)];
            }
        }
        Localization::Located {
            corners,
            source_corners,
            homography,
            inliers: fit.n_inliers,
        }
    }
}

fn quad(points: Vec<[f32; 2]>) -> Option<[[f32; 2]; 4]> {
    points.try_into().ok()
}

fn prepare(img: &Image, size: Option<[u32; 2]>, binarize: bool, invert: bool) -> GrayImage {
    let resized = match size {
        Some([w, h]) if w > 0 && h > 0 => img.resize_exact(w, h),
        _ => img.clone(),
    };
    let gray = resized.to_gray();
    if !binarize {
        return gray;
    }
    let binary = threshold_above(&gray, mean_intensity(&gray));
    if invert {
        inverted(&binary)
    } else {
        binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn preparation_follows_params() {
        let verifier = CandidateVerifier::default();
        let img = Image::Gray(GrayImage::from_fn(50, 40, |x, _| Luma([(x * 5) as u8])));
        let template = verifier.prepare_template(&img);
        assert_eq!(template.dimensions(), (80, 120));
        assert!(template.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(template.get_pixel(0, 0)[0], 0);

        let scene = verifier.prepare_scene(&img);
        assert_eq!(scene.dimensions(), (600, 150));
        assert_eq!(scene.get_pixel(0, 0)[0], 255);

        let raw = CandidateVerifier::new(VerifyParams {
            template_size: None,
            binarize: false,
            ..VerifyParams::default()
        });
        assert_eq!(raw.prepare_template(&img), img.to_gray());
    }

    #[test]
    fn default_floor_is_off() {
        assert_eq!(VerifyParams::default().distance_floor, 0.0);
    }

    #[test]
    fn flat_scene_is_not_located() {
        let verifier = CandidateVerifier::default();
        let template = Image::Gray(GrayImage::from_fn(40, 60, |x, y| Luma([((x / 5 + y / 7) % 2 * 200) as u8])));
        let scene = Image::Gray(GrayImage::from_pixel(300, 100, Luma([10])));
        let report = verifier.verify(&template, &scene);
        assert_eq!(report.scene_keypoints, 0);
        assert_eq!(
            report.localization,
            Localization::NotLocated {
                reason: NotLocatedReason::NoSceneFeatures
            }
        );
        assert!(report.localization.corners().is_none());
    }
}

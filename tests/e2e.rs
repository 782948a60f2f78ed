mod common;

use approx::assert_abs_diff_eq;
use common::synthetic_image::{plate_with_bars, plate_with_characters, PLATE_BOX};
use image::{GrayImage, Luma};
use plate_detector::types::DetectionStrategy;
use plate_detector::{Image, PlateDetector, PlateError, PlateParams};

fn detector() -> PlateDetector {
    let _ = env_logger::builder().is_test(true).try_init();
    PlateDetector::new(PlateParams::default())
}

#[test]
fn plate_with_five_characters_yields_ordered_fragments() {
    let img = Image::Gray(plate_with_characters());
    let report = detector().process_with_diagnostics(&img);
    let det = report.result.as_ref().expect("plate detected");

    assert_eq!(det.location.strategy, DetectionStrategy::Primary);
    assert_eq!(det.fragments.len(), 5);
    assert!(det
        .fragments
        .windows(2)
        .all(|w| w[0].center_x < w[1].center_x));
    for fragment in &det.fragments {
        assert_eq!(fragment.image.dimensions(), (28, 28));
        assert_eq!(fragment.image.get_pixel(0, 0)[0], 0);
    }
    assert!(det.refined);
    let (w, h) = det.plate.dimensions();
    assert!((590..=600).contains(&w), "refined plate width {w}");
    assert!((140..=150).contains(&h), "refined plate height {h}");

    assert!(report.summary.found);
    assert_eq!(report.summary.fragment_count, 5);
    assert!(report.trace.fallback.is_none());
    let primary = report.trace.primary.as_ref().expect("primary stage");
    assert_eq!(primary.selected, Some(det.location.region));
}

#[test]
fn plate_corners_follow_the_plate_outline() {
    let img = Image::Gray(plate_with_characters());
    let location = detector().locate(&img).expect("plate located");
    let [x0, y0, x1, y1] = PLATE_BOX.map(|v| v as f32);
    let expected = [
        [x0, y0],
        [x1 - 1.0, y0],
        [x1 - 1.0, y1 - 1.0],
        [x0, y1 - 1.0],
    ];
    for (got, want) in location.corners.iter().zip(expected) {
        assert_abs_diff_eq!(got[0], want[0], epsilon = 2.0);
        assert_abs_diff_eq!(got[1], want[1], epsilon = 2.0);
    }
    assert!(location.rect.width > location.rect.height);
}

#[test]
fn barred_plate_is_found_by_fallback_but_has_no_fragments() {
    let img = Image::Gray(plate_with_bars());
    let detector = detector();

    let location = detector.locate(&img).expect("fallback locates the plate");
    assert_eq!(location.strategy, DetectionStrategy::Fallback);
    let [x0, y0, x1, y1] = PLATE_BOX.map(|v| v as f32);
    assert!(location.rect.center[0] > x0 && location.rect.center[0] < x1);
    assert!(location.rect.center[1] > y0 && location.rect.center[1] < y1);

    let report = detector.process_with_diagnostics(&img);
    assert_eq!(report.result.unwrap_err(), PlateError::NoFragments);
    assert!(report.trace.fallback.is_some());
    assert!(report.trace.segmentation.is_some());
}

#[test]
fn flat_image_reports_plate_not_found() {
    let img = Image::Gray(GrayImage::from_pixel(320, 240, Luma([120])));
    let err = detector().process(&img).unwrap_err();
    assert_eq!(err, PlateError::PlateNotFound);
}

#[test]
fn colour_input_matches_gray_input() {
    let gray = plate_with_characters();
    let rgb = image::DynamicImage::ImageLuma8(gray.clone()).to_rgb8();
    let detector = detector();
    let a = detector.process(&Image::Gray(gray)).expect("gray detection");
    let b = detector.process(&Image::Rgb(rgb)).expect("rgb detection");
    assert_eq!(a.fragments.len(), b.fragments.len());
    for (fa, fb) in a.fragments.iter().zip(&b.fragments) {
        assert_abs_diff_eq!(fa.center_x, fb.center_x, epsilon = 1e-3);
    }
}

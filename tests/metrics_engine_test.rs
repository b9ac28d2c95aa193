//! Metrics engine testing
//!
//! End-to-end checks of `evaluate` on synthetic focus charts:
//! - degenerate input and ROI fallback
//! - exposure statistics and clipping
//! - sharpness ordering under blur
//! - orientation uniformity on single- and multi-orientation targets

use crabfocus::quality::{effective_region, evaluate, evaluate_async, evaluate_raw, Metrics};
use crabfocus::testing::{box_blur, checkerboard, flat_field, siemens_star, stripes};
use crabfocus::types::Roi;
use image::GrayImage;

#[test]
fn test_empty_image_is_invalid() {
    let m = evaluate(&GrayImage::new(0, 0), None);
    assert!(!m.valid);
    assert_eq!(m, Metrics::default());

    let m = evaluate(&GrayImage::new(0, 0), Some(Roi::new(0, 0, 10, 10)));
    assert_eq!(m, Metrics::default());
}

#[test]
fn test_uniform_115_frame() {
    let frame = flat_field(100, 115);
    let m = evaluate(&frame, None);

    assert!(m.valid);
    assert!((m.mean_intensity - 115.0).abs() < 1e-9);
    assert!(m.contrast.abs() < 1e-9);
    assert_eq!(m.highlight_ratio, 0.0);
    assert_eq!(m.shadow_ratio, 0.0);
    assert!(m.tenengrad.abs() < 1e-6);
    assert!(m.laplacian_variance.abs() < 1e-6);
    assert_eq!(m.gradient_uniformity, 0.0);
    assert!(m.composite_score < 5.0, "score {}", m.composite_score);
}

#[test]
fn test_small_clipped_roi_equals_full_frame() {
    let frame = checkerboard(100, 10);
    let full = evaluate(&frame, None);

    // Clips to 5x20
    assert_eq!(evaluate(&frame, Some(Roi::new(95, 10, 20, 20))), full);
    // Entirely outside
    assert_eq!(evaluate(&frame, Some(Roi::new(200, 200, 50, 50))), full);
    // Zero area
    assert_eq!(evaluate(&frame, Some(Roi::new(10, 10, 0, 0))), full);
}

#[test]
fn test_roi_restricts_analysis() {
    // Left half flat, right half textured
    let frame = GrayImage::from_fn(128, 64, |x, y| {
        if x < 64 {
            image::Luma([115])
        } else if ((x / 4) + (y / 4)) % 2 == 0 {
            image::Luma([60])
        } else {
            image::Luma([170])
        }
    });

    let flat = evaluate(&frame, Some(Roi::new(0, 0, 64, 64)));
    let textured = evaluate(&frame, Some(Roi::new(64, 0, 64, 64)));
    assert!(flat.contrast.abs() < 1e-9);
    assert!(textured.contrast > 50.0);
    assert!(textured.composite_score > flat.composite_score);
    assert_eq!(
        effective_region(128, 64, Some(Roi::new(64, 0, 100, 100))),
        Some(Roi::new(64, 0, 64, 64))
    );
}

#[test]
fn test_evaluate_is_idempotent() {
    let frame = siemens_star(97, 12);
    let roi = Some(Roi::new(10, 5, 61, 70));
    assert_eq!(evaluate(&frame, roi), evaluate(&frame, roi));
}

#[test]
fn test_clipping_percentages() {
    let bright = evaluate(&flat_field(32, 250), None);
    assert_eq!(bright.highlight_ratio, 100.0);
    assert_eq!(bright.shadow_ratio, 0.0);

    let dark = evaluate(&flat_field(32, 5), None);
    assert_eq!(dark.shadow_ratio, 100.0);
    assert_eq!(dark.highlight_ratio, 0.0);

    // Half 255, half 0
    let split = GrayImage::from_fn(20, 20, |x, _| image::Luma([if x < 10 { 255 } else { 0 }]));
    let m = evaluate(&split, None);
    assert!((m.highlight_ratio - 50.0).abs() < 1e-9);
    assert!((m.shadow_ratio - 50.0).abs() < 1e-9);
    assert!((m.contrast - 127.5).abs() < 1e-9);
}

#[test]
fn test_blur_lowers_sharpness() {
    let sharp = checkerboard(128, 8);
    let blurred = box_blur(&sharp, 3);

    let a = evaluate(&sharp, None);
    let b = evaluate(&blurred, None);
    assert!(a.tenengrad > b.tenengrad);
    assert!(a.laplacian_variance > b.laplacian_variance);
    assert!(a.composite_score >= b.composite_score);
}

#[test]
fn test_orientation_uniformity() {
    let bars = evaluate(&stripes(128, 16), None);
    let star = evaluate(&siemens_star(128, 18), None);

    assert!(bars.gradient_uniformity < 0.05, "bars {}", bars.gradient_uniformity);
    assert!(star.gradient_uniformity > 0.5, "star {}", star.gradient_uniformity);
}

#[test]
fn test_evaluate_raw_matches_image() {
    let frame = checkerboard(40, 5);
    let expected = evaluate(&frame, None);
    let got = evaluate_raw(40, 40, frame.into_raw(), None).unwrap();
    assert_eq!(got, expected);
    assert!(evaluate_raw(40, 40, vec![0; 3], None).is_err());
}

#[tokio::test]
async fn test_evaluate_async() {
    let frame = checkerboard(64, 8);
    let expected = evaluate(&frame, None);
    let got = evaluate_async(frame, None).await.unwrap();
    assert_eq!(got, expected);
}

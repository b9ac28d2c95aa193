//! Focus metrics evaluation
//!
//! Turns a grayscale frame plus an optional ROI into a `Metrics` value.
//! Pure and stateless: the same input always yields the same output, and
//! degenerate input is reported as `Metrics { valid: false, .. }`.

use super::blur::{self, Plane};
use super::exposure;
use super::metrics::Metrics;
use super::score;
use super::spectrum;
use crate::errors::FocusError;
use crate::types::Roi;
use image::{DynamicImage, GrayImage};

/// Clipped ROIs smaller than this in either dimension fall back to the full frame
pub const MIN_ROI_SIZE: i32 = 8;

/// Region the evaluator will analyse for a frame of the given size.
///
/// Returns `None` only for an empty frame.
pub fn effective_region(frame_width: u32, frame_height: u32, roi: Option<Roi>) -> Option<Roi> {
    if frame_width == 0 || frame_height == 0 {
        return None;
    }
    let full = Roi::full(frame_width, frame_height);
    let region = roi
        .and_then(|r| r.clip(frame_width, frame_height))
        .filter(|r| r.width >= MIN_ROI_SIZE && r.height >= MIN_ROI_SIZE)
        .unwrap_or(full);
    Some(region)
}

/// Copy the region's pixels out row by row
fn crop(frame: &GrayImage, region: Roi) -> Vec<u8> {
    let stride = frame.width() as usize;
    let raw = frame.as_raw();
    let (x, y) = (region.x as usize, region.y as usize);
    let (w, h) = (region.width as usize, region.height as usize);

    let mut pixels = Vec::with_capacity(w * h);
    for row in y..y + h {
        let start = row * stride + x;
        pixels.extend_from_slice(&raw[start..start + w]);
    }
    pixels
}

/// Evaluate focus metrics for `frame` restricted to `roi`
pub fn evaluate(frame: &GrayImage, roi: Option<Roi>) -> Metrics {
    let region = match effective_region(frame.width(), frame.height(), roi) {
        Some(region) => region,
        None => return Metrics::invalid(),
    };

    let pixels = crop(frame, region);
    if pixels.is_empty() {
        return Metrics::invalid();
    }
    let (width, height) = (region.width as usize, region.height as usize);

    let stats = exposure::analyze(&pixels);
    let plane = Plane::from_luma(&pixels, width, height);
    let gradients = blur::analyze(&plane);
    let high_frequency_ratio = spectrum::high_frequency_ratio(&plane);

    let mut metrics = Metrics {
        valid: true,
        mean_intensity: stats.mean,
        contrast: stats.std_dev,
        laplacian_variance: gradients.sharpness.laplacian_variance,
        tenengrad: gradients.sharpness.tenengrad,
        high_frequency_ratio,
        gradient_uniformity: gradients.gradient_uniformity,
        highlight_ratio: stats.highlight_ratio,
        shadow_ratio: stats.shadow_ratio,
        composite_score: 0.0,
    };
    metrics.composite_score = score::composite_score(&metrics);

    log::trace!(
        "Evaluated {}x{} region at ({}, {}): score={:.2} ten={:.2} lap={:.2} hf={:.3}",
        width,
        height,
        region.x,
        region.y,
        metrics.composite_score,
        metrics.tenengrad,
        metrics.laplacian_variance,
        metrics.high_frequency_ratio
    );

    metrics
}

/// Evaluate any decoded image after converting it to 8-bit luma
pub fn evaluate_dynamic(image: &DynamicImage, roi: Option<Roi>) -> Metrics {
    evaluate(&image.to_luma8(), roi)
}

/// Wrap a row-major luma buffer delivered by a camera callback.
///
/// A zero-sized frame is accepted (it evaluates as invalid); a buffer whose
/// length does not match the dimensions is rejected.
pub fn frame_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<GrayImage, FocusError> {
    let expected = width as usize * height as usize;
    if data.len() != expected {
        return Err(FocusError::invalid_frame(format!(
            "got {} bytes for {}x{} luma frame, expected {}",
            data.len(),
            width,
            height,
            expected
        )));
    }
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| FocusError::invalid_frame("buffer rejected by image container"))
}

/// Evaluate a raw row-major luma buffer
pub fn evaluate_raw(
    width: u32,
    height: u32,
    data: Vec<u8>,
    roi: Option<Roi>,
) -> Result<Metrics, FocusError> {
    let frame = frame_from_raw(width, height, data)?;
    Ok(evaluate(&frame, roi))
}

/// Evaluate on the tokio blocking pool so async callers never run the FFT inline
pub async fn evaluate_async(frame: GrayImage, roi: Option<Roi>) -> Result<Metrics, FocusError> {
    tokio::task::spawn_blocking(move || evaluate(&frame, roi))
        .await
        .map_err(|e| FocusError::worker(format!("Task join error: {}", e)))
}

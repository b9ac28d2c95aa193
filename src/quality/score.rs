//! Composite focus score
//!
//! Normalises the individual measures against fixed empirical ranges tuned
//! for centred calibration targets and folds them into one 0-100 figure.
//! Guidance thresholds downstream are calibrated on this exact scale, so
//! every constant here is a calibration parameter.

use super::exposure::brightness_score;
use super::metrics::Metrics;

/// Clamped linear normalisation range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRange {
    pub low: f64,
    pub high: f64,
}

impl NormRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Map `value` onto [0,1] against this range
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.low) / (self.high - self.low)).clamp(0.0, 1.0)
    }
}

pub const TENENGRAD_RANGE: NormRange = NormRange::new(6.0, 60.0);
pub const LAPLACIAN_RANGE: NormRange = NormRange::new(8.0, 140.0);
pub const HIGH_FREQUENCY_RANGE: NormRange = NormRange::new(0.10, 0.34);
pub const CONTRAST_RANGE: NormRange = NormRange::new(7.0, 42.0);
pub const UNIFORMITY_RANGE: NormRange = NormRange::new(0.35, 0.92);

const TENENGRAD_WEIGHT: f64 = 0.35;
const LAPLACIAN_WEIGHT: f64 = 0.30;
const HIGH_FREQUENCY_WEIGHT: f64 = 0.20;
const CONTRAST_WEIGHT: f64 = 0.15;

const STRUCTURE_SHARE: f64 = 0.82;
const UNIFORMITY_SHARE: f64 = 0.18;

const HIGHLIGHT_PENALTY: f64 = 0.45;
const HIGHLIGHT_SATURATION: f64 = 7.0;
const SHADOW_PENALTY: f64 = 0.25;
const SHADOW_SATURATION: f64 = 12.0;
const MIN_PENALTY_FACTOR: f64 = 0.35;

const MAX_COMPOSITE: f64 = 1.15;

/// Intermediate terms of the composite, useful for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub brightness: f64,
    pub structure: f64,
    pub uniformity: f64,
    pub penalty_factor: f64,
    pub composite_score: f64,
}

/// Multiplicative penalty for clipped highlights and crushed shadows
pub fn penalty_factor(highlight_ratio: f64, shadow_ratio: f64) -> f64 {
    let highlight = (highlight_ratio / HIGHLIGHT_SATURATION).min(1.0);
    let shadow = (shadow_ratio / SHADOW_SATURATION).min(1.0);
    (1.0 - (HIGHLIGHT_PENALTY * highlight + SHADOW_PENALTY * shadow))
        .clamp(MIN_PENALTY_FACTOR, 1.0)
}

/// Score the measured fields of `metrics`; `composite_score` is ignored
pub fn breakdown(metrics: &Metrics) -> ScoreBreakdown {
    let brightness = brightness_score(metrics.mean_intensity);

    let structure = TENENGRAD_WEIGHT * TENENGRAD_RANGE.normalize(metrics.tenengrad)
        + LAPLACIAN_WEIGHT * LAPLACIAN_RANGE.normalize(metrics.laplacian_variance)
        + HIGH_FREQUENCY_WEIGHT * HIGH_FREQUENCY_RANGE.normalize(metrics.high_frequency_ratio)
        + CONTRAST_WEIGHT * CONTRAST_RANGE.normalize(metrics.contrast);
    let uniformity = UNIFORMITY_RANGE.normalize(metrics.gradient_uniformity);
    let penalty = penalty_factor(metrics.highlight_ratio, metrics.shadow_ratio);

    let composite = ((STRUCTURE_SHARE * structure + UNIFORMITY_SHARE * uniformity)
        * brightness
        * penalty)
        .clamp(0.0, MAX_COMPOSITE);

    ScoreBreakdown {
        brightness,
        structure,
        uniformity,
        penalty_factor: penalty,
        composite_score: (composite * 100.0).clamp(0.0, 100.0),
    }
}

/// Composite score (0-100) for the measured fields of `metrics`
pub fn composite_score(metrics: &Metrics) -> f64 {
    let score = breakdown(metrics).composite_score;
    if score.is_nan() {
        0.0
    } else {
        score
    }
}

use serde::{Deserialize, Serialize};

/// Focus and exposure figures for one evaluated frame region.
///
/// Produced fresh by every evaluation. When `valid` is false the region was
/// unusable (empty frame, nothing left after clipping) and every other
/// field holds its zero default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub valid: bool,
    /// Mean intensity of the region (0-255)
    pub mean_intensity: f64,
    /// Standard deviation of the region intensity (0-255)
    pub contrast: f64,
    /// Weighted multi-scale Laplacian variance, x1000
    pub laplacian_variance: f64,
    /// Weighted multi-scale mean squared gradient magnitude, x1000
    pub tenengrad: f64,
    /// Share of spectral energy beyond the high-frequency radius (0-1)
    pub high_frequency_ratio: f64,
    /// 1 - coherence of doubled gradient orientations (0-1)
    pub gradient_uniformity: f64,
    /// Percentage of pixels at or above the highlight threshold
    pub highlight_ratio: f64,
    /// Percentage of pixels at or below the shadow threshold
    pub shadow_ratio: f64,
    /// Combined figure of merit (0-100)
    pub composite_score: f64,
}

impl Metrics {
    /// The "no data yet" result
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Fields keyed by stable identifiers, in display order
    pub fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("mean_intensity", self.mean_intensity),
            ("contrast", self.contrast),
            ("laplacian_variance", self.laplacian_variance),
            ("tenengrad", self.tenengrad),
            ("high_frequency_ratio", self.high_frequency_ratio),
            ("gradient_uniformity", self.gradient_uniformity),
            ("highlight_ratio", self.highlight_ratio),
            ("shadow_ratio", self.shadow_ratio),
            ("composite_score", self.composite_score),
        ]
    }
}

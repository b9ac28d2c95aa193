//! Exposure statistics for an 8-bit region
//!
//! Mean/standard deviation of intensity, highlight and shadow clipping
//! percentages, and the bell-shaped brightness score used by the composite.

/// Intensity at or above which a pixel counts as clipped highlight
pub const HIGHLIGHT_THRESHOLD: u8 = 245;

/// Intensity at or below which a pixel counts as crushed shadow
pub const SHADOW_THRESHOLD: u8 = 10;

/// Target mid-gray the brightness score is centred on
pub const TARGET_BRIGHTNESS: f64 = 115.0;

/// Intensity statistics of one region
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExposureStats {
    pub mean: f64,
    pub std_dev: f64,
    /// Percentage of pixels >= `HIGHLIGHT_THRESHOLD`
    pub highlight_ratio: f64,
    /// Percentage of pixels <= `SHADOW_THRESHOLD`
    pub shadow_ratio: f64,
}

/// Single-pass histogram analysis of the region pixels.
///
/// Returns zeroed stats for an empty slice.
pub fn analyze(pixels: &[u8]) -> ExposureStats {
    if pixels.is_empty() {
        return ExposureStats::default();
    }

    let mut histogram = [0u64; 256];
    for &p in pixels {
        histogram[p as usize] += 1;
    }

    let n = pixels.len() as f64;
    let mut sum = 0.0;
    let mut highlights = 0u64;
    let mut shadows = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        sum += value as f64 * count as f64;
        if value >= HIGHLIGHT_THRESHOLD as usize {
            highlights += count;
        }
        if value <= SHADOW_THRESHOLD as usize {
            shadows += count;
        }
    }
    let mean = sum / n;

    let variance = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| {
            let d = value as f64 - mean;
            d * d * count as f64
        })
        .sum::<f64>()
        / n;

    ExposureStats {
        mean,
        std_dev: variance.max(0.0).sqrt(),
        highlight_ratio: highlights as f64 / n * 100.0,
        shadow_ratio: shadows as f64 / n * 100.0,
    }
}

/// Bell curve on the distance from the target mid-gray, 1.0 at the target
pub fn brightness_score(mean_intensity: f64) -> f64 {
    let e = (mean_intensity - TARGET_BRIGHTNESS) / TARGET_BRIGHTNESS;
    (-3.0 * e * e).exp()
}

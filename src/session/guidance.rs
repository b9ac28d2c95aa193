//! Tuning guidance derived from focus metrics
//!
//! A deterministic function of the current sample, the session best and
//! the previous score. Each line is a typed `Advice`; its `Display` form is
//! the text shown to the operator.

use crate::quality::Metrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highlight percentage above which exposure should come down
pub const HIGHLIGHT_LIMIT: f64 = 5.0;
/// Shadow percentage above which exposure should go up
pub const SHADOW_LIMIT: f64 = 12.0;
/// High-frequency percentage below which edge detail is weak
pub const WEAK_DETAIL_PERCENT: f64 = 18.0;
/// High-frequency percentage above which edge detail is good
pub const STRONG_DETAIL_PERCENT: f64 = 32.0;
/// Uniformity below which the ROI sees too few edge orientations
pub const NARROW_ORIENTATION: f64 = 0.35;
/// Uniformity above which orientation coverage is good
pub const BROAD_ORIENTATION: f64 = 0.65;
/// Score change treated as a real trend
pub const TREND_DELTA: f64 = 2.5;
/// Distance from the best score still counted as "at the peak"
pub const NEAR_BEST_MARGIN: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advice {
    Score {
        composite: f64,
        relative_percent: f64,
    },
    ReduceExposure {
        highlight_ratio: f64,
    },
    IncreaseExposure {
        shadow_ratio: f64,
    },
    BrightnessStable {
        mean_intensity: f64,
    },
    WeakEdgeDetail {
        high_frequency_percent: f64,
    },
    StrongEdgeDetail {
        high_frequency_percent: f64,
    },
    NarrowOrientation {
        uniformity: f64,
    },
    BroadOrientation {
        uniformity: f64,
    },
    Improving {
        delta: f64,
    },
    Degrading {
        delta: f64,
    },
    Steady {
        delta: f64,
    },
    NearBest,
    KeepSearching {
        gap: f64,
    },
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Score {
                composite,
                relative_percent,
            } => write!(
                f,
                "Focus score {:.1} ({:.0}% of best)",
                composite, relative_percent
            ),
            Advice::ReduceExposure { highlight_ratio } => write!(
                f,
                "Highlights clipped ({:.1}%): close aperture or shorten exposure",
                highlight_ratio
            ),
            Advice::IncreaseExposure { shadow_ratio } => write!(
                f,
                "Shadows crushed ({:.1}%): open aperture or lengthen exposure",
                shadow_ratio
            ),
            Advice::BrightnessStable { mean_intensity } => {
                write!(f, "Brightness stable (mean {:.0})", mean_intensity)
            }
            Advice::WeakEdgeDetail {
                high_frequency_percent,
            } => write!(
                f,
                "Weak edge detail ({:.1}% high frequency): enlarge focus step or move ROI onto a sharp edge",
                high_frequency_percent
            ),
            Advice::StrongEdgeDetail {
                high_frequency_percent,
            } => write!(
                f,
                "Good edge detail ({:.1}% high frequency)",
                high_frequency_percent
            ),
            Advice::NarrowOrientation { uniformity } => write!(
                f,
                "Edges mostly in one direction (uniformity {:.2}): reposition ROI to cover more orientations",
                uniformity
            ),
            Advice::BroadOrientation { uniformity } => {
                write!(f, "Good orientation coverage (uniformity {:.2})", uniformity)
            }
            Advice::Improving { delta } => {
                write!(f, "Improving ({:+.1}): keep turning in this direction", delta)
            }
            Advice::Degrading { delta } => {
                write!(f, "Degrading ({:+.1}): reverse direction or reposition", delta)
            }
            Advice::Steady { delta } => write!(f, "Stable ({:+.1}): fine-tune aperture", delta),
            Advice::NearBest => write!(f, "Near best score: lock it in"),
            Advice::KeepSearching { gap } => {
                write!(f, "{:.1} below best: keep searching for the peak", gap)
            }
        }
    }
}

/// Derive the ordered guidance lines for one valid sample.
///
/// `previous_composite` is the score before this sample; `0` means there
/// was none and suppresses the trend line.
pub fn derive_guidance(
    metrics: &Metrics,
    best_composite: f64,
    has_baseline: bool,
    previous_composite: f64,
) -> Vec<Advice> {
    let score = metrics.composite_score;
    let mut lines = Vec::with_capacity(6);

    let relative_percent = if has_baseline && best_composite > f64::EPSILON {
        score / best_composite * 100.0
    } else {
        100.0
    };
    lines.push(Advice::Score {
        composite: score,
        relative_percent,
    });

    if metrics.highlight_ratio > HIGHLIGHT_LIMIT {
        lines.push(Advice::ReduceExposure {
            highlight_ratio: metrics.highlight_ratio,
        });
    } else if metrics.shadow_ratio > SHADOW_LIMIT {
        lines.push(Advice::IncreaseExposure {
            shadow_ratio: metrics.shadow_ratio,
        });
    } else {
        lines.push(Advice::BrightnessStable {
            mean_intensity: metrics.mean_intensity,
        });
    }

    let high_frequency_percent = metrics.high_frequency_ratio * 100.0;
    if high_frequency_percent < WEAK_DETAIL_PERCENT {
        lines.push(Advice::WeakEdgeDetail {
            high_frequency_percent,
        });
    } else if high_frequency_percent > STRONG_DETAIL_PERCENT {
        lines.push(Advice::StrongEdgeDetail {
            high_frequency_percent,
        });
    }

    let uniformity = metrics.gradient_uniformity;
    if uniformity < NARROW_ORIENTATION {
        lines.push(Advice::NarrowOrientation { uniformity });
    } else if uniformity > BROAD_ORIENTATION {
        lines.push(Advice::BroadOrientation { uniformity });
    }

    if previous_composite > 0.0 {
        let delta = score - previous_composite;
        if delta > TREND_DELTA {
            lines.push(Advice::Improving { delta });
        } else if delta < -TREND_DELTA {
            lines.push(Advice::Degrading { delta });
        } else {
            lines.push(Advice::Steady { delta });
        }
    }

    if score >= best_composite - NEAR_BEST_MARGIN {
        lines.push(Advice::NearBest);
    } else {
        lines.push(Advice::KeepSearching {
            gap: best_composite - score,
        });
    }

    lines
}

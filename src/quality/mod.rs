/// Focus and exposure quality evaluation
///
/// Turns a grayscale frame and an optional region of interest into one
/// `Metrics` value: exposure statistics, multi-scale gradient sharpness,
/// spectral high-frequency share, gradient orientation spread, and the
/// composite score that folds them together.
pub mod blur;
pub mod evaluator;
pub mod exposure;
pub mod metrics;
pub mod score;
pub mod spectrum;

pub use evaluator::{
    effective_region, evaluate, evaluate_async, evaluate_dynamic, evaluate_raw, frame_from_raw,
    MIN_ROI_SIZE,
};
pub use metrics::Metrics;
pub use score::ScoreBreakdown;

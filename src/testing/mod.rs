//! Testing utilities for crabfocus
//!
//! Synthetic focus charts for offline tests, benches and the CLI.

pub mod synthetic_data;

pub use synthetic_data::{
    box_blur, calibration_target, checkerboard, flat_field, siemens_star, stripes,
};

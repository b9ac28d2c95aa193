//! Synthetic calibration targets
//!
//! Deterministic grayscale patterns standing in for a camera pointed at a
//! focus chart, so the metrics and the session can be exercised offline.

use image::{GrayImage, Luma};
use std::f64::consts::PI;

/// Pattern names accepted by `by_name`
pub const TARGET_KINDS: [&str; 5] = ["flat", "checkerboard", "stripes", "star", "calibration"];

/// Uniform frame of one intensity
pub fn flat_field(size: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(size, size, Luma([value]))
}

/// Black/white squares of `cell` pixels, mid-range levels to avoid clipping
pub fn checkerboard(size: u32, cell: u32) -> GrayImage {
    let cell = cell.max(1);
    GrayImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Luma([40])
        } else {
            Luma([190])
        }
    })
}

/// Vertical bars: every edge has the same orientation
pub fn stripes(size: u32, period: u32) -> GrayImage {
    let half = (period / 2).max(1);
    GrayImage::from_fn(size, size, |x, _| {
        if (x / half) % 2 == 0 {
            Luma([40])
        } else {
            Luma([190])
        }
    })
}

/// Siemens star with `spokes` dark/light sector pairs centred in the frame
pub fn siemens_star(size: u32, spokes: u32) -> GrayImage {
    let centre = size as f64 / 2.0;
    let spokes = spokes.max(1) as f64;
    GrayImage::from_fn(size, size, |x, y| {
        let dx = x as f64 + 0.5 - centre;
        let dy = y as f64 + 0.5 - centre;
        let angle = dy.atan2(dx) + PI;
        let sector = (angle / (PI / spokes)).floor() as i64;
        if sector % 2 == 0 {
            Luma([40])
        } else {
            Luma([190])
        }
    })
}

/// Star inside concentric rings, the default chart for sweeps
pub fn calibration_target(size: u32) -> GrayImage {
    let star = siemens_star(size, 18);
    let centre = size as f64 / 2.0;
    let ring_width = (size as f64 / 24.0).max(2.0);
    GrayImage::from_fn(size, size, |x, y| {
        let dx = x as f64 + 0.5 - centre;
        let dy = y as f64 + 0.5 - centre;
        let radius = dx.hypot(dy);
        if radius < centre * 0.6 {
            *star.get_pixel(x, y)
        } else if ((radius / ring_width) as i64) % 2 == 0 {
            Luma([60])
        } else {
            Luma([170])
        }
    })
}

/// Separable box blur with clamped borders; radius 0 returns a copy
pub fn box_blur(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let (w, h) = (image.width() as i64, image.height() as i64);
    let r = radius as i64;
    let taps = (2 * r + 1) as u32;

    let horizontal = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let mut sum = 0u32;
        for k in -r..=r {
            let sx = (x as i64 + k).clamp(0, w - 1) as u32;
            sum += image.get_pixel(sx, y)[0] as u32;
        }
        Luma([((sum + taps / 2) / taps) as u8])
    });

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let mut sum = 0u32;
        for k in -r..=r {
            let sy = (y as i64 + k).clamp(0, h - 1) as u32;
            sum += horizontal.get_pixel(x, sy)[0] as u32;
        }
        Luma([((sum + taps / 2) / taps) as u8])
    })
}

/// Build a target by name, see `TARGET_KINDS`
pub fn by_name(kind: &str, size: u32) -> Option<GrayImage> {
    let image = match kind {
        "flat" => flat_field(size, 115),
        "checkerboard" => checkerboard(size, (size / 8).max(2)),
        "stripes" => stripes(size, (size / 8).max(2)),
        "star" => siemens_star(size, 18),
        "calibration" => calibration_target(size),
        _ => return None,
    };
    Some(image)
}

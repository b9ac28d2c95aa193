//! Gradient-based sharpness measures
//!
//! Multi-scale Tenengrad and Laplacian variance over an area-averaging
//! pyramid, and the orientation coherence of the full-resolution gradient
//! field. All filters are 3x3 and use reflect-101 borders.

use std::borrow::Cow;

/// Per-level weights of the sharpness pyramid, finest first
pub const PYRAMID_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

/// Levels smaller than this in either dimension are not evaluated
pub const MIN_PYRAMID_SIZE: usize = 16;

/// Display scale applied to both gradient energy measures
pub const SHARPNESS_SCALE: f64 = 1000.0;

const EPSILON: f64 = 1e-12;

/// Single-channel f64 image
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Plane {
    /// Build a [0,1] intensity plane from row-major 8-bit luma
    pub fn from_luma(pixels: &[u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            data: pixels.iter().map(|&p| p as f64 / 255.0).collect(),
        }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }
}

/// Sobel responses of a plane
#[derive(Debug, Clone)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    pub gx: Vec<f64>,
    pub gy: Vec<f64>,
}

/// Gradient energy measures, already scaled for display
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sharpness {
    pub tenengrad: f64,
    pub laplacian_variance: f64,
}

/// Everything the evaluator needs from the gradient passes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradientReport {
    pub sharpness: Sharpness,
    pub gradient_uniformity: f64,
}

/// Reflect-101 index for offsets of at most one pixel outside `0..n`
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    };
    r as usize
}

/// Neighbour column/row lookup tables: (previous, next) for every index
fn neighbours(n: usize) -> Vec<(usize, usize)> {
    (0..n as isize)
        .map(|i| (reflect(i - 1, n), reflect(i + 1, n)))
        .collect()
}

impl Gradients {
    /// 3x3 Sobel derivative in x and y
    pub fn sobel(plane: &Plane) -> Self {
        let (w, h) = (plane.width, plane.height);
        let cols = neighbours(w);
        let rows = neighbours(h);
        let mut gx = vec![0.0; w * h];
        let mut gy = vec![0.0; w * h];

        for (y, &(ym, yp)) in rows.iter().enumerate() {
            for (x, &(xm, xp)) in cols.iter().enumerate() {
                let tl = plane.at(xm, ym);
                let tc = plane.at(x, ym);
                let tr = plane.at(xp, ym);
                let ml = plane.at(xm, y);
                let mr = plane.at(xp, y);
                let bl = plane.at(xm, yp);
                let bc = plane.at(x, yp);
                let br = plane.at(xp, yp);

                let idx = y * w + x;
                gx[idx] = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
                gy[idx] = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);
            }
        }

        Self {
            width: w,
            height: h,
            gx,
            gy,
        }
    }

    /// Mean of the squared gradient magnitude
    pub fn mean_square_magnitude(&self) -> f64 {
        let n = self.gx.len();
        if n == 0 {
            return 0.0;
        }
        self.gx
            .iter()
            .zip(&self.gy)
            .map(|(gx, gy)| gx * gx + gy * gy)
            .sum::<f64>()
            / n as f64
    }

    /// 1 - coherence of magnitude-weighted doubled orientation angles.
    ///
    /// Doubling the angle maps opposite gradient directions onto the same
    /// orientation. High values mean edges in many orientations.
    pub fn orientation_uniformity(&self) -> f64 {
        let mut cos_sum = 0.0;
        let mut sin_sum = 0.0;
        let mut magnitude_sum = 0.0;

        for (&gx, &gy) in self.gx.iter().zip(&self.gy) {
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude <= EPSILON {
                continue;
            }
            let phase = gy.atan2(gx);
            let doubled = 2.0 * phase;
            cos_sum += magnitude * doubled.cos();
            sin_sum += magnitude * doubled.sin();
            magnitude_sum += magnitude;
        }

        if magnitude_sum <= EPSILON {
            return 0.0;
        }
        let coherence = cos_sum.hypot(sin_sum) / magnitude_sum;
        (1.0 - coherence).clamp(0.0, 1.0)
    }
}

/// Variance of the 4-neighbour Laplacian response
pub fn laplacian_variance(plane: &Plane) -> f64 {
    let (w, h) = (plane.width, plane.height);
    let n = w * h;
    if n == 0 {
        return 0.0;
    }
    let cols = neighbours(w);
    let rows = neighbours(h);

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for (y, &(ym, yp)) in rows.iter().enumerate() {
        for (x, &(xm, xp)) in cols.iter().enumerate() {
            let response = plane.at(xm, y) + plane.at(xp, y) + plane.at(x, ym) + plane.at(x, yp)
                - 4.0 * plane.at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / n as f64;
    (sum_sq / n as f64 - mean * mean).max(0.0)
}

/// Halve both dimensions by averaging 2x2 blocks
pub fn downsample(plane: &Plane) -> Plane {
    let width = plane.width / 2;
    let height = plane.height / 2;
    let mut data = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let sum = plane.at(2 * x, 2 * y)
                + plane.at(2 * x + 1, 2 * y)
                + plane.at(2 * x, 2 * y + 1)
                + plane.at(2 * x + 1, 2 * y + 1);
            data.push(sum / 4.0);
        }
    }

    Plane {
        width,
        height,
        data,
    }
}

/// Run the pyramid sharpness passes and the orientation pass.
///
/// The full-resolution Sobel pass is shared between the first pyramid
/// level and the orientation measure.
pub fn analyze(plane: &Plane) -> GradientReport {
    let base = Gradients::sobel(plane);
    let gradient_uniformity = base.orientation_uniformity();

    let mut tenengrad_sum = 0.0;
    let mut laplacian_sum = 0.0;
    let mut weight_sum = 0.0;

    let mut level: Cow<'_, Plane> = Cow::Borrowed(plane);
    for (index, &weight) in PYRAMID_WEIGHTS.iter().enumerate() {
        if level.width < MIN_PYRAMID_SIZE || level.height < MIN_PYRAMID_SIZE {
            break;
        }

        let energy = if index == 0 {
            base.mean_square_magnitude()
        } else {
            Gradients::sobel(&level).mean_square_magnitude()
        };
        tenengrad_sum += weight * energy;
        laplacian_sum += weight * laplacian_variance(&level);
        weight_sum += weight;

        if index + 1 < PYRAMID_WEIGHTS.len() {
            level = Cow::Owned(downsample(&level));
        }
    }

    let sharpness = if weight_sum > EPSILON {
        Sharpness {
            tenengrad: tenengrad_sum / weight_sum * SHARPNESS_SCALE,
            laplacian_variance: laplacian_sum / weight_sum * SHARPNESS_SCALE,
        }
    } else {
        Sharpness::default()
    };

    GradientReport {
        sharpness,
        gradient_uniformity,
    }
}

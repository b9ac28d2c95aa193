//! Frequency-domain sharpness measure
//!
//! Share of 2D power-spectrum energy lying beyond a fixed fraction of the
//! maximum radius from the (centre-shifted) zero frequency.

use super::blur::Plane;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Fraction of the maximum spectral radius where "high frequency" begins
pub const HIGH_FREQUENCY_RADIUS: f64 = 0.28;

const EPSILON: f64 = 1e-12;

/// Smallest integer >= `n` whose only prime factors are 2, 3 and 5
pub fn optimal_dft_size(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut candidate = n;
    loop {
        let mut rest = candidate;
        for p in [2, 3, 5] {
            while rest % p == 0 {
                rest /= p;
            }
        }
        if rest == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

/// Symmetric Hann window of length `n`
pub fn hann(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / denom).cos()))
        .collect()
}

/// Zero-pad to FFT-friendly dimensions and apply a 2D Hann window
fn windowed_padded(plane: &Plane) -> (Vec<Complex<f64>>, usize, usize) {
    let width = optimal_dft_size(plane.width);
    let height = optimal_dft_size(plane.height);
    let wx = hann(width);
    let wy = hann(height);

    let mut buffer = vec![Complex::new(0.0, 0.0); width * height];
    for y in 0..plane.height {
        for x in 0..plane.width {
            let value = plane.data[y * plane.width + x] * wx[x] * wy[y];
            buffer[y * width + x] = Complex::new(value, 0.0);
        }
    }
    (buffer, width, height)
}

/// In-place 2D forward DFT. Returns the spectrum in column-major order.
fn fft_2d(buffer: Vec<Complex<f64>>, width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut planner = FftPlanner::<f64>::new();

    let mut rows = buffer;
    planner.plan_fft_forward(width).process(&mut rows);

    let mut columns = vec![Complex::new(0.0, 0.0); width * height];
    for y in 0..height {
        for x in 0..width {
            columns[x * height + y] = rows[y * width + x];
        }
    }
    planner.plan_fft_forward(height).process(&mut columns);
    columns
}

/// Fraction of spectral power at radius >= `HIGH_FREQUENCY_RADIUS * max_radius`.
///
/// Returns 0 for an empty plane or a spectrum with no energy.
pub fn high_frequency_ratio(plane: &Plane) -> f64 {
    if plane.width == 0 || plane.height == 0 {
        return 0.0;
    }

    let (buffer, width, height) = windowed_padded(plane);
    let spectrum = fft_2d(buffer, width, height);

    let cx = (width / 2) as f64;
    let cy = (height / 2) as f64;
    let cutoff = HIGH_FREQUENCY_RADIUS * cx.hypot(cy);

    let mut total = 0.0;
    let mut high = 0.0;
    for kx in 0..width {
        // fftshift: frequency index k lands at (k + n/2) mod n
        let sx = ((kx + width / 2) % width) as f64 - cx;
        for ky in 0..height {
            let sy = ((ky + height / 2) % height) as f64 - cy;
            let power = spectrum[kx * height + ky].norm_sqr();
            total += power;
            if sx.hypot(sy) >= cutoff {
                high += power;
            }
        }
    }

    if total <= EPSILON {
        return 0.0;
    }
    (high / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_from_fn(w: usize, h: usize, f: impl Fn(usize, usize) -> f64) -> Plane {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        Plane {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn test_optimal_dft_size() {
        assert_eq!(optimal_dft_size(1), 1);
        assert_eq!(optimal_dft_size(7), 8);
        assert_eq!(optimal_dft_size(100), 100);
        assert_eq!(optimal_dft_size(101), 108);
        assert_eq!(optimal_dft_size(241), 243);
    }

    #[test]
    fn test_hann_shape() {
        let w = hann(5);
        assert!(w[0].abs() < 1e-12);
        assert!((w[2] - 1.0).abs() < 1e-12);
        assert!(w[4].abs() < 1e-12);
    }

    #[test]
    fn test_black_plane_has_no_energy() {
        let plane = plane_from_fn(32, 32, |_, _| 0.0);
        assert_eq!(high_frequency_ratio(&plane), 0.0);
    }

    #[test]
    fn test_flat_plane_is_low_frequency() {
        let plane = plane_from_fn(100, 100, |_, _| 115.0 / 255.0);
        assert!(high_frequency_ratio(&plane) < 0.01);
    }

    fn cosine(n: usize, cycles: usize, offset: f64, along_x: bool) -> Plane {
        plane_from_fn(n, n, |x, y| {
            let t = if along_x { x } else { y };
            offset + 0.5 * (2.0 * std::f64::consts::PI * (cycles * t) as f64 / n as f64).cos()
        })
    }

    #[test]
    fn test_cutoff_uses_corner_radius() {
        // 64x64: cutoff = 0.28 * hypot(32, 32) ~= 12.67 bins. Hann spreads a
        // pure tone over its neighbouring bins, so test a tone either side of it.
        assert_eq!(optimal_dft_size(64), 64);
        for along_x in [true, false] {
            let inside = high_frequency_ratio(&cosine(64, 11, 0.0, along_x));
            let outside = high_frequency_ratio(&cosine(64, 14, 0.0, along_x));
            assert!(inside < 1e-3, "11 cycles gave {}", inside);
            assert!(outside > 0.999, "14 cycles gave {}", outside);
        }
        // 11 cycles would already be high frequency with a 0.28 * 32 cutoff
    }

    #[test]
    fn test_dc_stays_at_spectrum_centre() {
        // Offset 0.5 and amplitude 0.5: the windowed DC carries two thirds of
        // the power, all of it below the cutoff
        let ratio = high_frequency_ratio(&cosine(64, 20, 0.5, true));
        assert!((ratio - 1.0 / 3.0).abs() < 1e-3, "ratio {}", ratio);
    }

    #[test]
    fn test_fine_texture_is_high_frequency() {
        let fine = plane_from_fn(64, 64, |x, y| if (x + y) % 2 == 0 { 0.0 } else { 1.0 });
        let coarse = plane_from_fn(64, 64, |x, _| if (x / 16) % 2 == 0 { 0.0 } else { 1.0 });
        let fine_ratio = high_frequency_ratio(&fine);
        let coarse_ratio = high_frequency_ratio(&coarse);
        assert!(fine_ratio > 0.3, "fine ratio {}", fine_ratio);
        assert!(fine_ratio > coarse_ratio);
        assert!((0.0..=1.0).contains(&fine_ratio));
    }
}

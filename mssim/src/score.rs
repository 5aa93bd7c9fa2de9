//! Per-window SSIM evaluation and mean accumulation.
//!
//! Window origins are visited in row-major order and each window's
//! SSIM value is folded into a running mean incrementally. Traversal
//! and accumulation order fix the floating-point rounding path, so a
//! given input pair always reproduces the same score bit for bit.

use crate::sat::SumTables;

/// Mean SSIM over all valid window positions.
///
/// Local statistics are biased estimates derived from the window sums:
/// `var = E[x²] - mean²` and `cov = E[ab] - mean_a * mean_b`. With
/// positive stability constants the per-window quotient is always
/// finite: both factors of the denominator stay strictly positive even
/// when means and variances vanish.
///
/// Returns exactly 1.0 when the image is smaller than the window in
/// either dimension. There is no comparable window, which is treated
/// as trivial identity rather than an error.
pub fn mean_ssim(tables: &SumTables, window_size: usize, c1: f64, c2: f64) -> f64 {
    let width = tables.width();
    let height = tables.height();
    if width < window_size || height < window_size {
        return 1.0;
    }

    let win_w = width - window_size + 1;
    let win_h = height - window_size + 1;
    let n = (window_size * window_size) as f64;

    let mut mssim = 0.0;
    let mut count = 0u64;
    for wy in 0..win_h {
        for wx in 0..win_w {
            let sums = tables.window(wx, wy, window_size);
            let mean_a = sums.a / n;
            let mean_b = sums.b / n;
            let var_a = sums.aa / n - mean_a * mean_a;
            let var_b = sums.bb / n - mean_b * mean_b;
            let cov = sums.ab / n - mean_a * mean_b;

            let num = (2.0 * mean_a * mean_b + c1) * (2.0 * cov + c2);
            let den = (mean_a * mean_a + mean_b * mean_b + c1) * (var_a + var_b + c2);
            let val = num / den;

            count += 1;
            mssim += (val - mssim) / count as f64;
        }
    }

    mssim
}

#[cfg(test)]
mod tests {
    use super::*;

    const C1: f64 = 6.5025; // (0.01 * 255)^2
    const C2: f64 = 58.5225; // (0.03 * 255)^2

    #[test]
    fn test_smaller_than_window_is_identity() {
        let a: Vec<u8> = (0..25).map(|i| (i * 10) as u8).collect();
        let b: Vec<u8> = (0..25).map(|i| 255 - (i * 10) as u8).collect();
        let t = SumTables::build(&a, &b, 5, 5);
        // 11x11 window cannot fit a 5x5 image, whatever the content.
        assert_eq!(mean_ssim(&t, 11, C1, C2), 1.0);
    }

    #[test]
    fn test_single_dimension_too_small() {
        let a = vec![128u8; 32 * 5];
        let t = SumTables::build(&a, &a, 32, 5);
        assert_eq!(mean_ssim(&t, 11, C1, C2), 1.0);
    }

    #[test]
    fn test_identical_inputs_score_one() {
        let a: Vec<u8> = (0..16 * 16).map(|i| ((i * 37) % 256) as u8).collect();
        let t = SumTables::build(&a, &a, 16, 16);
        assert_eq!(mean_ssim(&t, 8, C1, C2), 1.0);
    }

    #[test]
    fn test_uniform_fields_score_one() {
        // Zero variance and zero covariance cancel symmetrically
        // against the positive constants.
        for value in [0u8, 255u8] {
            let a = vec![value; 16 * 16];
            let t = SumTables::build(&a, &a, 16, 16);
            assert_eq!(mean_ssim(&t, 11, C1, C2), 1.0);
        }
    }

    #[test]
    fn test_window_size_one() {
        // ws=1: every variance is exactly zero, the score reduces to
        // the luminance term per pixel.
        let a = vec![100u8, 100, 100, 100];
        let b = vec![100u8, 100, 100, 200];
        let t = SumTables::build(&a, &b, 2, 2);
        let score = mean_ssim(&t, 1, C1, C2);
        assert!(score < 1.0);
        let lum = (2.0 * 100.0 * 200.0 + C1) / (100.0f64 * 100.0 + 200.0 * 200.0 + C1);
        let expected = (1.0 + 1.0 + 1.0 + lum) / 4.0;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_contrast_inversion_goes_negative() {
        // Checkerboard against its inverse: covariance is minus the
        // variance in every window, pushing the quotient negative.
        let width = 16;
        let height = 16;
        let a: Vec<u8> = (0..width * height)
            .map(|i| if (i % width + i / width) % 2 == 0 { 200 } else { 50 })
            .collect();
        let b: Vec<u8> = a.iter().map(|&v| 250 - v).collect();
        let t = SumTables::build(&a, &b, width, height);
        assert!(mean_ssim(&t, 8, C1, C2) < 0.0);
    }
}

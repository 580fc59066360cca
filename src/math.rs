//! Shared numeric utilities used by every pipeline stage.
//!
//! Small, pure, independently-tested functions: percentile, mean/variance,
//! a centered moving average with edge extension, the Pan-Tompkins
//! five-point derivative, and boxcar convolution. Nothing here owns state.

/// Arithmetic mean of `data`. Returns `0.0` for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.iter().sum::<f64>() / data.len() as f64
    }
}

/// Population variance (divides by `n`). Returns `0.0` for fewer than 1 sample.
pub fn variance(data: &[f64]) -> f64 {
    variance_with_ddof(data, 0)
}

/// Sample variance with Bessel's correction (divides by `n - 1`).
/// Returns `0.0` for fewer than 2 samples.
pub fn sample_variance(data: &[f64]) -> f64 {
    variance_with_ddof(data, 1)
}

fn variance_with_ddof(data: &[f64], ddof: usize) -> f64 {
    if data.len() <= ddof {
        return 0.0;
    }
    let m = mean(data);
    let sum_sq: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (data.len() - ddof) as f64
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Sample standard deviation (Bessel's correction).
pub fn sample_std_dev(data: &[f64]) -> f64 {
    sample_variance(data).sqrt()
}

/// Linear-interpolated percentile of `data`, `p` in `[0, 100]`.
///
/// Matches numpy's default (`linear`) interpolation. Returns `0.0` for an
/// empty slice.
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Index of the first occurrence of the maximum value in `data`.
///
/// Ties resolve to the lowest index. Returns `None` for an empty slice.
pub fn argmax(data: &[f64]) -> Option<usize> {
    data.iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| match a.partial_cmp(b) {
            Some(std::cmp::Ordering::Equal) | None => ib.cmp(ia).reverse(),
            Some(ord) => ord,
        })
        .map(|(i, _)| i)
}

/// Index of the first occurrence of the minimum value in `data`.
///
/// Ties resolve to the lowest index. Returns `None` for an empty slice.
pub fn argmin(data: &[f64]) -> Option<usize> {
    data.iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| match a.partial_cmp(b) {
            Some(std::cmp::Ordering::Equal) | None => ia.cmp(ib),
            Some(ord) => ord,
        })
        .map(|(i, _)| i)
}

/// Element-wise first difference: `out[i] = data[i+1] - data[i]`.
pub fn diff(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Centered moving average with window length `window`, edges extended with
/// the *nearest in-range value* rather than shrinking the window: positions
/// that would fall before index 0 or past `data.len() - 1` read `data[0]` /
/// `data[n - 1]` instead of being dropped from the average.
///
/// `window` is clamped to be at least 1 and at most `data.len()`.
pub fn centered_moving_average(data: &[f64], window: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let window = window.clamp(1, n);
    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let mut sum = 0.0;
        for k in 0..window {
            let idx = i as isize - half as isize + k as isize;
            let clamped = idx.clamp(0, n as isize - 1) as usize;
            sum += data[clamped];
        }
        out.push(sum / window as f64);
    }
    out
}

/// Pan-Tompkins five-point derivative: `(-x[i-2] - 2x[i-1] + 2x[i+1] + x[i+2]) * fs / 8`.
///
/// The two boundary samples at each end are `0.0`, matching the spec's
/// definition which is only valid for `2 <= i <= n - 3`.
pub fn five_point_derivative(data: &[f64], fs: f64) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![0.0; n];
    if n < 5 {
        return out;
    }
    for i in 2..n - 2 {
        out[i] = (-data[i - 2] - 2.0 * data[i - 1] + 2.0 * data[i + 1] + data[i + 2]) * fs / 8.0;
    }
    out
}

/// Centered boxcar convolution ("moving-window integration"): each output
/// sample is the sum of `kernel_len` neighboring input samples divided by
/// the fixed `kernel_len`, same-length output. Samples outside `[0, n)` are
/// treated as zero (as opposed to [`centered_moving_average`]'s nearest-value
/// extension), so the divisor never shrinks near the signal boundaries.
pub fn boxcar_integrate(data: &[f64], kernel_len: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 || kernel_len == 0 {
        return vec![0.0; n];
    }
    let half = kernel_len / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let mut sum = 0.0;
        for k in 0..kernel_len {
            let idx = i as isize - half as isize + k as isize;
            if idx >= 0 && (idx as usize) < n {
                sum += data[idx as usize];
            }
        }
        out.push(sum / kernel_len as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn sample_std_dev_matches_known_value() {
        // classic textbook example: std of [2,4,4,4,5,5,7,9] (population) = 2.0
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&data) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sample_variance_uses_bessel_correction() {
        let data = [1.0, 2.0, 3.0, 4.0];
        // population variance = 1.25, sample variance = 1.6666...
        assert!((variance(&data) - 1.25).abs() < 1e-9);
        assert!((sample_variance(&data) - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn percentile_matches_linear_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&data, 50.0) - 3.0).abs() < 1e-9);
        assert!((percentile(&data, 0.0) - 1.0).abs() < 1e-9);
        assert!((percentile(&data, 100.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn argmax_ties_resolve_to_lowest_index() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
    }

    #[test]
    fn argmin_ties_resolve_to_lowest_index() {
        assert_eq!(argmin(&[3.0, 1.0, 1.0, 2.0]), Some(1));
    }

    #[test]
    fn argmax_empty_is_none() {
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn diff_basic() {
        assert_eq!(diff(&[1.0, 3.0, 6.0]), vec![2.0, 3.0]);
    }

    #[test]
    fn centered_moving_average_constant_signal_is_unchanged() {
        let data = vec![5.0; 20];
        let out = centered_moving_average(&data, 5);
        assert!(out.iter().all(|&x| (x - 5.0).abs() < 1e-9));
    }

    #[test]
    fn centered_moving_average_preserves_length() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let out = centered_moving_average(&data, 4);
        assert_eq!(out.len(), data.len());
    }

    #[test]
    fn five_point_derivative_zero_at_boundaries() {
        let data = vec![1.0; 10];
        let d = five_point_derivative(&data, 250.0);
        assert_eq!(d[0], 0.0);
        assert_eq!(d[1], 0.0);
        assert_eq!(d[d.len() - 1], 0.0);
        assert_eq!(d[d.len() - 2], 0.0);
    }

    #[test]
    fn five_point_derivative_zero_for_constant_signal() {
        let data = vec![3.0; 20];
        let d = five_point_derivative(&data, 250.0);
        assert!(d.iter().all(|&x| x.abs() < 1e-9));
    }

    #[test]
    fn boxcar_integrate_preserves_length() {
        let data = vec![1.0; 50];
        let out = boxcar_integrate(&data, 12);
        assert_eq!(out.len(), data.len());
    }

    #[test]
    fn centered_moving_average_extends_with_nearest_edge_value() {
        // window=4, half=2: at i=0 the two out-of-range taps should read
        // data[0] (nearest-value extension) rather than shrink the window.
        let data = vec![10.0, 0.0, 0.0, 0.0];
        let out = centered_moving_average(&data, 4);
        // taps at i=0 are idx -2,-1,0,1 -> clamped to 0,0,0,1 -> data = 10,10,10,0
        assert!((out[0] - 7.5).abs() < 1e-9, "got {}", out[0]);
    }

    #[test]
    fn boxcar_integrate_zero_pads_instead_of_shrinking_divisor() {
        // kernel_len=4, half=2: at i=0 the two out-of-range taps contribute
        // zero, but the divisor stays the full kernel length.
        let data = vec![10.0, 0.0, 0.0, 0.0];
        let out = boxcar_integrate(&data, 4);
        // taps at i=0 are idx -2,-1,0,1 -> only idx 0,1 in range -> sum = 10
        // divided by the fixed kernel length 4, not by the 2 in-range taps.
        assert!((out[0] - 2.5).abs() < 1e-9, "got {}", out[0]);
    }

    #[test]
    fn boxcar_integrate_differs_from_centered_moving_average_at_edges() {
        let data = vec![10.0, 0.0, 0.0, 0.0];
        let boxcar = boxcar_integrate(&data, 4);
        let centered = centered_moving_average(&data, 4);
        assert!((boxcar[0] - centered[0]).abs() > 1e-9);
    }
}

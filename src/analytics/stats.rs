use serde::{Deserialize, Serialize};

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `part / total * 100`, rounded to 2 decimals; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 2)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// Mean, median, extremes and population standard deviation, rounded to 2
/// decimals. All zero for an empty slice.
pub fn describe(values: &[f64]) -> DescriptiveStats {
    let Some(avg) = mean(values) else {
        return DescriptiveStats::default();
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    let variance = sorted.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n as f64;

    DescriptiveStats {
        count: n,
        mean: round_to(avg, 2),
        median: round_to(median, 2),
        min: round_to(sorted[0], 2),
        max: round_to(sorted[n - 1], 2),
        std_dev: round_to(variance.sqrt(), 2),
    }
}

/// Pearson correlation over the paired prefix of `xs` and `ys`.
///
/// Returns 0 for an empty input or when either side has no variance, so the
/// result is always finite and in [-1, 1].
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_odd_and_even() {
        let odd = describe(&[3.0, 1.0, 2.0]);
        assert_eq!(odd.count, 3);
        assert_eq!(odd.mean, 2.0);
        assert_eq!(odd.median, 2.0);
        assert_eq!(odd.min, 1.0);
        assert_eq!(odd.max, 3.0);
        assert_eq!(odd.std_dev, 0.82);

        let even = describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(even.median, 2.5);
        assert_eq!(even.std_dev, 1.12);
    }

    #[test]
    fn test_describe_empty_is_zero() {
        assert_eq!(describe(&[]), DescriptiveStats::default());
    }

    #[test]
    fn test_percent_guards_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.33);
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 4.0, 6.0, 8.0, 10.0];
        let inverse = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &inverse) + 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &xs) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_is_symmetric() {
        let xs = [1.0, 3.0, 2.0, 5.0, 4.0, 4.0];
        let ys = [2.0, 1.0, 4.0, 3.0, 5.0, 1.0];
        assert_eq!(pearson(&xs, &ys), pearson(&ys, &xs));
    }

    #[test]
    fn test_pearson_degenerate_inputs_are_zero() {
        assert_eq!(pearson(&[], &[]), 0.0);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]), 0.0);
        assert_eq!(pearson(&[7.0], &[1.0]), 0.0);
    }
}

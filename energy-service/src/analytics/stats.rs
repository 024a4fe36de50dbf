//! Scalar statistics over plain `f64` slices.
//!
//! Every function returns `0.0` for input too short to define the statistic
//! instead of `NaN`.

pub fn mean(values: &[f64]) -> f64 {
    match values {
        [] => 0.0,
        v => v.iter().sum::<f64>() / v.len() as f64,
    }
}

pub fn min(values: &[f64]) -> f64 {
    match values {
        [] => 0.0,
        [first, rest @ ..] => rest.iter().copied().fold(*first, f64::min),
    }
}

pub fn max(values: &[f64]) -> f64 {
    match values {
        [] => 0.0,
        [first, rest @ ..] => rest.iter().copied().fold(*first, f64::max),
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Percentile `p` (0..=100) of ascending `sorted` values, interpolating
/// linearly between closest ranks.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

pub fn median(sorted: &[f64]) -> f64 {
    percentile(sorted, 50.0)
}

/// Most frequent value of ascending `sorted`; the smallest wins a tie.
pub fn mode(sorted: &[f64]) -> f64 {
    let mut best = (0.0, 0usize);
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best.1 {
            best = (sorted[i], j - i);
        }
        i = j;
    }
    best.0
}

/// Adjusted Fisher-Pearson skewness (G1). Needs at least three values.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Adjusted excess kurtosis (G2). Needs at least four values.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return 0.0;
    }
    let m = mean(values);
    let s2: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    let s4: f64 = values.iter().map(|v| (v - m).powi(4)).sum();
    if s2 <= f64::EPSILON {
        return 0.0;
    }
    let denom = (n - 2.0) * (n - 3.0);
    (n + 1.0) * n * (n - 1.0) * s4 / (denom * s2 * s2) - 3.0 * (n - 1.0).powi(2) / denom
}

/// Pearson correlation of paired values, 0 for fewer than two pairs or a
/// constant side.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let (mx, my) = (mean(xs), mean(ys));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Divides, yielding 0 when the divisor is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_input_is_zero_everywhere() {
        let e: [f64; 0] = [];
        for v in [
            mean(&e),
            min(&e),
            max(&e),
            std_dev(&e),
            percentile(&e, 50.0),
            mode(&e),
            skewness(&e),
            kurtosis(&e),
            pearson(&e, &e),
            ratio(1.0, 0.0),
        ] {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn percentiles_interpolate_between_ranks() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert!(close(percentile(&s, 50.0), 2.5));
        assert!(close(percentile(&s, 25.0), 1.75));
        assert_eq!(percentile(&s, 0.0), 1.0);
        assert_eq!(percentile(&s, 100.0), 4.0);
    }

    #[test]
    fn mode_prefers_smallest_on_tie() {
        assert_eq!(mode(&[1.0, 1.0, 2.0, 2.0, 3.0]), 1.0);
        assert_eq!(mode(&[1.0, 2.0, 2.0]), 2.0);
    }

    #[test]
    fn shape_statistics_match_known_values() {
        // symmetric sample
        assert!(close(skewness(&[1.0, 2.0, 3.0]), 0.0));
        let v = [1.0, 2.0, 3.0, 4.0, 10.0];
        assert!(skewness(&v) > 1.0);
        assert!(close(kurtosis(&[1.0, 2.0, 3.0, 4.0]), -1.2));
        assert!(close(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.138089935299395));
    }

    #[test]
    fn pearson_is_symmetric_and_bounded() {
        let a = [1.0, 2.0, 3.5, 4.0, 7.0];
        let b = [2.0, 1.0, 4.0, 3.0, 9.0];
        assert_eq!(pearson(&a, &b), pearson(&b, &a));
        assert!(close(pearson(&a, &a), 1.0));
        assert_eq!(pearson(&a, &[3.0; 5]), 0.0);
    }
}

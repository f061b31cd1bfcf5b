//! Descriptive statistics over `f64` slices.
//!
//! Mean and spread come from `statrs`. Quantiles and skewness stay local:
//! they follow the simple-statistics rules exactly, so quartiles, IQR bounds
//! and bias scores match what dataset profiles have always reported.

use statrs::statistics::{Data, Distribution};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Distribution::mean(&Data::new(values.to_vec()))
}

/// Population variance.
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(statrs::statistics::Statistics::population_variance(values.iter()))
}

/// Population standard deviation.
pub fn standard_deviation(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile of already sorted values; `p` must be within `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let len = sorted.len();
    if p == 1.0 {
        return Some(sorted[len - 1]);
    }
    if p == 0.0 {
        return Some(sorted[0]);
    }

    let idx = len as f64 * p;
    if idx.fract() != 0.0 {
        Some(sorted[idx.ceil() as usize - 1])
    } else {
        let idx = idx as usize;
        if len % 2 == 0 {
            Some((sorted[idx - 1] + sorted[idx]) / 2.0)
        } else {
            Some(sorted[idx])
        }
    }
}

pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), p)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Adjusted Fisher-Pearson skewness; needs at least three points and non-zero spread.
pub fn sample_skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values)?;
    let (mut sum_squared, mut sum_cubed) = (0.0, 0.0);
    for v in values {
        let d = v - m;
        sum_squared += d * d;
        sum_cubed += d * d * d;
    }

    let sample_sd = (sum_squared / (n - 1) as f64).sqrt();
    if sample_sd == 0.0 {
        return None;
    }
    let n = n as f64;
    Some(n * sum_cubed / ((n - 1.0) * (n - 2.0) * sample_sd.powi(3)))
}

/// Pearson correlation of paired samples.
pub fn sample_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        var_x += (a - mx).powi(2);
        var_y += (b - my).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

use chrono::{Duration, NaiveDateTime};

/// Linear-interpolated quantile of an ascending slice (position `(n − 1)·p`).
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * p;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Inclusive `[Q1 − k·IQR, Q3 + k·IQR]`. NaN values are ignored.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Keeps the items whose value lies inside the IQR bounds and returns how many were removed.
pub fn retain_within_iqr<T>(items: &mut Vec<T>, multiplier: f64, value: impl Fn(&T) -> f64) -> usize {
    let values: Vec<f64> = items.iter().map(&value).collect();
    let Some((low, high)) = iqr_bounds(&values, multiplier) else {
        return 0;
    };
    let before = items.len();
    items.retain(|item| {
        let v = value(item);
        v >= low && v <= high
    });
    before - items.len()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator); needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn standard_error(values: &[f64]) -> Option<f64> {
    sample_std_dev(values).map(|sd| sd / (values.len() as f64).sqrt())
}

/// Median spacing between consecutive timestamps of an ascending series.
pub fn median_interval(timestamps: &[NaiveDateTime]) -> Option<Duration> {
    let mut deltas: Vec<i64> = timestamps
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds())
        .filter(|secs| *secs > 0)
        .collect();
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();
    let mid = deltas.len() / 2;
    let seconds = if deltas.len() % 2 == 0 {
        (deltas[mid - 1] + deltas[mid]) / 2
    } else {
        deltas[mid]
    };
    Some(Duration::seconds(seconds))
}

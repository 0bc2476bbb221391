//! Shared numerical helpers used by the descriptive aggregators and the MLE
//! solver: masked reductions over the opinion tensor, always folded
//! left-to-right by index so results are bitwise-deterministic regardless
//! of how many times a model is re-run.

/// Arithmetic mean of the observed entries in `values` (paired with
/// `mask`). Returns `None` if nothing is observed.
#[must_use]
pub fn masked_mean(values: &[f64], mask: &[bool]) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for i in 0..values.len() {
        if mask[i] {
            sum += values[i];
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// Sample (unbiased, n-1 denominator) variance of the observed entries.
/// Returns `None` if fewer than two observations.
#[must_use]
pub fn masked_sample_variance(values: &[f64], mask: &[bool]) -> Option<f64> {
    let mean = masked_mean(values, mask)?;
    let mut sum_sq = 0.0;
    let mut n = 0usize;
    for i in 0..values.len() {
        if mask[i] {
            sum_sq += (values[i] - mean).powi(2);
            n += 1;
        }
    }
    (n > 1).then(|| sum_sq / (n - 1) as f64)
}

/// Population (n denominator) variance of the observed entries.
#[must_use]
pub fn masked_population_variance(values: &[f64], mask: &[bool]) -> Option<f64> {
    let mean = masked_mean(values, mask)?;
    let mut sum_sq = 0.0;
    let mut n = 0usize;
    for i in 0..values.len() {
        if mask[i] {
            sum_sq += (values[i] - mean).powi(2);
            n += 1;
        }
    }
    (n > 0).then(|| sum_sq / n as f64)
}

#[must_use]
pub fn masked_sample_stdev(values: &[f64], mask: &[bool]) -> Option<f64> {
    masked_sample_variance(values, mask).map(f64::sqrt)
}

/// Count of observed entries.
#[must_use]
pub fn masked_count(mask: &[bool]) -> usize {
    mask.iter().filter(|&&m| m).count()
}

/// Raw (Pearson) kurtosis, population moments — `E[(x-mu)^4] /
/// Var(x)^2`, *not* excess kurtosis (no `-3`) — of the observed entries,
/// used by BT.500 subject rejection to choose between the `2*sigma` and
/// `sqrt(20)*sigma` outlier bounds based on whether this value falls in
/// `[2, 4]` (the near-normal band; a normal distribution's raw kurtosis
/// is 3). Returns `0.0` when fewer than four observations or the
/// variance is effectively zero — outside `[2, 4]`, so a sample too
/// small to judge normality is routed to the wider `sqrt(20)*sigma`
/// bound rather than assumed normal.
#[must_use]
pub fn masked_kurtosis(values: &[f64], mask: &[bool]) -> f64 {
    let n = masked_count(mask);
    if n < 4 {
        return 0.0;
    }
    let Some(mean) = masked_mean(values, mask) else {
        return 0.0;
    };
    let mut sum_sq = 0.0;
    let mut sum_q = 0.0;
    for i in 0..values.len() {
        if mask[i] {
            let d = values[i] - mean;
            sum_sq += d * d;
            sum_q += d * d * d * d;
        }
    }
    let variance = sum_sq / n as f64;
    if variance < 1e-10 {
        return 0.0;
    }
    let fourth_moment = sum_q / n as f64;
    fourth_moment / variance.powi(2)
}

/// Plain (unmasked) mean/variance/stdev over a dense slice, used for
/// parameter vectors (psi, b, v, a) that have no missing entries.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[must_use]
pub fn population_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

#[must_use]
pub fn stdev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

//! Post-processing & final transforms (C4)
//!
//! `normalize_final` and `transform_final` are shared by every model
//! family (descriptive and MLE alike): they operate purely on the already-
//! reduced `quality_scores`/`quality_scores_std` vectors, after whatever
//! model-specific fitting produced them.

use crate::config::TransformFinal;
use crate::stats::{mean, stdev};

/// Standardize `quality_scores` to zero mean, unit (population) variance.
/// `quality_scores_std` is rescaled by the same `1/sigma` factor, since a
/// linear rescaling of the estimate rescales its standard error the same
/// way.
pub fn normalize_final(quality_scores: &mut [f64], quality_scores_std: &mut [f64]) {
    let m = mean(quality_scores);
    let sigma = stdev(quality_scores);
    if sigma < 1e-12 {
        for x in quality_scores.iter_mut() {
            *x -= m;
        }
        return;
    }
    for x in quality_scores.iter_mut() {
        *x = (*x - m) / sigma;
    }
    for x in quality_scores_std.iter_mut() {
        *x /= sigma;
    }
}

/// Apply the affine `x -> p1*x + p0`. The std vector is rescaled by
/// `|p1|` (a standard error can't go negative even if the transform
/// flips sign).
pub fn transform_final(quality_scores: &mut [f64], quality_scores_std: &mut [f64], t: TransformFinal) {
    for x in quality_scores.iter_mut() {
        *x = t.p1 * *x + t.p0;
    }
    for x in quality_scores_std.iter_mut() {
        *x *= t.p1.abs();
    }
}

/// Apply `normalize_final` then `transform_final`, in that order, as spec
/// §4.2 requires when both are requested.
pub fn apply_final_transforms(
    quality_scores: &mut [f64],
    quality_scores_std: &mut [f64],
    normalize: bool,
    transform: Option<TransformFinal>,
) {
    if normalize {
        normalize_final(quality_scores, quality_scores_std);
    }
    if let Some(t) = transform {
        transform_final(quality_scores, quality_scores_std, t);
    }
}

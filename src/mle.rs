//! Maximum-likelihood estimator (C3) — the core algorithm
//!
//! Joint fixed-point iteration for stimulus quality `psi`, observer bias
//! `b`, observer inconsistency `v`, and (when modeled) content ambiguity
//! `a`. One variant enum picks which parameters are
//! estimated vs. fixed; the sweep itself (four closed-form stages per
//! iteration) is shared code, and each ablation is a flag combination on
//! one solver rather than a class hierarchy.

use crate::config::{GradientMethod, LiveDmosConfig, MleConfig};
use crate::descriptive::{apply_dscore_remap, apply_zscore};
use crate::error::{Error, Result};
use crate::result::ModelResult;
use crate::stats::{mean, masked_count, masked_mean, masked_sample_stdev};
use crate::tensor::OpinionTensor;
use tracing::{debug, instrument, warn};

/// Floor applied to `v`/`a` to keep `1/(v^2+a^2)` finite.
const PARAM_FLOOR: f64 = 1e-8;
/// Clamp applied to an opinion score before `ln` under `use_log`.
const LOG_CLAMP: f64 = 1e-6;
/// Step used by the central-difference cross-check in
/// `GradientMethod::Numerical`.
const FINITE_DIFF_STEP: f64 = 1e-5;

/// Which parameters a particular MLE ablation estimates vs. fixes, per
/// the variant table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MleVariant {
    /// Observer-only MLE: estimates psi, b, v; fixes a = 0.
    Legacy,
    /// Full model: estimates psi, b, v, a.
    ContentAware,
    /// Same numerics as `Legacy`, kept as a distinct name because it
    /// always emits standard errors (spec's testable property: "Legacy
    /// and ContentOblivious produce identical psi, b, v").
    ContentOblivious,
    /// Estimates psi, a; fixes b = 0, v = 1.
    SubjectOblivious,
}

impl MleVariant {
    fn estimates_bias(self) -> bool {
        !matches!(self, MleVariant::SubjectOblivious)
    }

    fn estimates_inconsistency(self) -> bool {
        !matches!(self, MleVariant::SubjectOblivious)
    }

    fn estimates_ambiguity(self) -> bool {
        matches!(self, MleVariant::ContentAware | MleVariant::SubjectOblivious)
    }
}

struct Params {
    psi: Vec<f64>,
    b: Vec<f64>,
    v: Vec<f64>,
    a: Vec<f64>,
}

/// Run the MLE solver for `variant` over `tensor` per `config`.
#[instrument(skip(tensor), fields(variant = ?variant, dscore_mode = config.dscore_mode, zscore_mode = config.zscore_mode, use_log = config.use_log))]
pub fn run(tensor: &OpinionTensor, variant: MleVariant, config: &MleConfig) -> Result<ModelResult> {
    config.validate()?;

    let mut working = tensor.clone();
    if config.dscore_mode {
        apply_dscore_remap(&mut working)?;
    }
    if config.zscore_mode {
        apply_zscore(&mut working)?;
    }
    if config.use_log {
        apply_log_transform(&mut working);
    }

    let estimate_bias = variant.estimates_bias() && !config.zscore_mode;
    let estimate_inconsistency = variant.estimates_inconsistency();
    let estimate_ambiguity = variant.estimates_ambiguity();
    let force_zero_sum_psi = config.zscore_mode;

    let mut params = initialize(&working, estimate_inconsistency, estimate_ambiguity);

    let mut converged = false;
    let mut last_max_relative_delta = f64::INFINITY;
    let mut iterations_run = 0;

    for iteration in 0..config.max_iterations {
        iterations_run = iteration + 1;

        let prev_psi = params.psi.clone();
        let prev_b = params.b.clone();
        let prev_v = params.v.clone();
        let prev_a = params.a.clone();

        update_quality(&working, &mut params);
        if force_zero_sum_psi {
            let m = mean(&params.psi);
            for x in params.psi.iter_mut() {
                *x -= m;
            }
        }

        if estimate_bias {
            update_bias(&working, &mut params);
            let m = mean(&params.b);
            for x in params.b.iter_mut() {
                *x -= m;
            }
        }

        if estimate_inconsistency {
            update_inconsistency(&working, &mut params, config.gradient_method);
        }

        if estimate_ambiguity {
            update_ambiguity(&working, &mut params);
        }

        for x in &params.psi {
            if !x.is_finite() {
                return Err(Error::NumericFailure { parameter: "quality_scores", index: 0 });
            }
        }

        last_max_relative_delta = max_relative_delta(
            &prev_psi, &params.psi,
            if estimate_bias { Some((&prev_b, &params.b)) } else { None },
            if estimate_inconsistency { Some((&prev_v, &params.v)) } else { None },
            if estimate_ambiguity { Some((&prev_a, &params.a)) } else { None },
        );

        if last_max_relative_delta < config.tolerance {
            converged = true;
            debug!(iterations = iterations_run, max_relative_delta = last_max_relative_delta, "mle converged");
            break;
        }
    }

    if !converged {
        return Err(Error::DidNotConverge {
            iterations: iterations_run,
            max_relative_delta: last_max_relative_delta,
            tolerance: config.tolerance,
        });
    }

    let mut result = build_result(&working, &params, estimate_bias, estimate_inconsistency, estimate_ambiguity);

    crate::postprocess::apply_final_transforms(
        &mut result.quality_scores,
        &mut result.quality_scores_std,
        config.normalize_final,
        config.transform_final,
    );

    Ok(result)
}

fn apply_log_transform(tensor: &mut OpinionTensor) {
    for i in 0..tensor.values.len() {
        if tensor.mask[i] {
            tensor.values[i] = tensor.values[i].max(LOG_CLAMP).ln();
        }
    }
}

fn initialize(tensor: &OpinionTensor, estimate_inconsistency: bool, estimate_ambiguity: bool) -> Params {
    let mut psi = vec![0.0; tensor.num_stimuli];
    for e in 0..tensor.num_stimuli {
        let col_values: Vec<f64> = tensor.column(e).map(|(v, _)| v).collect();
        let col_mask: Vec<bool> = tensor.column(e).map(|(_, m)| m).collect();
        psi[e] = masked_mean(&col_values, &col_mask).unwrap_or(0.0);
    }

    let b = vec![0.0; tensor.num_subjects];

    // `SubjectOblivious` fixes v = 1 (spec §4.3); since it never runs the
    // inconsistency update, it must also never be seeded away from 1.0.
    let mut v = vec![1.0; tensor.num_subjects];
    if estimate_inconsistency {
        for s in 0..tensor.num_subjects {
            let residuals: Vec<f64> = (0..tensor.num_stimuli)
                .filter(|&e| tensor.is_observed(s, e))
                .map(|e| tensor.value_at(s, e) - psi[e])
                .collect();
            if residuals.len() > 1 {
                let m = mean(&residuals);
                let var = residuals.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (residuals.len() - 1) as f64;
                v[s] = var.sqrt().max(PARAM_FLOOR);
            }
        }
    }

    let mut a = vec![0.0; tensor.num_contents];
    if estimate_ambiguity {
        for c in 0..tensor.num_contents {
            let residuals: Vec<f64> = (0..tensor.num_subjects)
                .flat_map(|s| (0..tensor.num_stimuli).map(move |e| (s, e)))
                .filter(|&(s, e)| tensor.content_map[e] == c && tensor.is_observed(s, e))
                .map(|(s, e)| tensor.value_at(s, e) - psi[e])
                .collect();
            if residuals.len() > 1 {
                let m = mean(&residuals);
                let var = residuals.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (residuals.len() - 1) as f64;
                a[c] = var.sqrt().max(PARAM_FLOOR);
            } else {
                a[c] = PARAM_FLOOR;
            }
        }
    }

    Params { psi, b, v, a }
}

/// `w[s,e] = 1 / (v[s]^2 + a[kappa(e)]^2)`.
fn weight(params: &Params, tensor: &OpinionTensor, s: usize, e: usize) -> f64 {
    let v2 = params.v[s] * params.v[s];
    let a2 = params.a[tensor.content_map[e]] * params.a[tensor.content_map[e]];
    1.0 / (v2 + a2).max(PARAM_FLOOR * PARAM_FLOOR)
}

/// Stage 1: `psi[e] <- sum_s M w (O - b) / sum_s M w`.
fn update_quality(tensor: &OpinionTensor, params: &mut Params) {
    for e in 0..tensor.num_stimuli {
        let mut num = 0.0;
        let mut den = 0.0;
        for s in 0..tensor.num_subjects {
            if tensor.is_observed(s, e) {
                let w = weight(params, tensor, s, e);
                num += w * (tensor.value_at(s, e) - params.b[s]);
                den += w;
            }
        }
        if den > 0.0 {
            params.psi[e] = num / den;
        }
    }
}

/// Stage 2: `b[s] <- sum_e M w (O - psi) / sum_e M w`.
fn update_bias(tensor: &OpinionTensor, params: &mut Params) {
    for s in 0..tensor.num_subjects {
        let mut num = 0.0;
        let mut den = 0.0;
        for e in 0..tensor.num_stimuli {
            if tensor.is_observed(s, e) {
                let w = weight(params, tensor, s, e);
                num += w * (tensor.value_at(s, e) - params.psi[e]);
                den += w;
            }
        }
        if den > 0.0 {
            params.b[s] = num / den;
        }
    }
}

/// Stage 3: closed-form MLE of `v[s]^2` given the other parameters.
/// `Numerical` additionally cross-checks the closed form against a central
/// finite difference of the marginal negative log-likelihood and falls
/// back to the finite-difference root if the two disagree by more than a
/// loose tolerance (numerical noise aside, they should agree exactly,
/// since both target the same stationary point).
fn update_inconsistency(tensor: &OpinionTensor, params: &mut Params, method: GradientMethod) {
    for s in 0..tensor.num_subjects {
        let mut sum = 0.0;
        let mut n = 0usize;
        for e in 0..tensor.num_stimuli {
            if tensor.is_observed(s, e) {
                let r = tensor.value_at(s, e) - params.b[s] - params.psi[e];
                let a2 = params.a[tensor.content_map[e]] * params.a[tensor.content_map[e]];
                sum += r * r - a2;
                n += 1;
            }
        }
        let v2 = if n > 0 { (sum / n as f64).max(0.0) } else { 0.0 };
        let closed_form = v2.sqrt().max(PARAM_FLOOR);

        params.v[s] = match method {
            GradientMethod::Original => closed_form,
            GradientMethod::Numerical => {
                numerical_inconsistency_update(tensor, params, s, closed_form)
            }
        };
    }
}

/// Central-difference Newton step on the per-subject marginal negative
/// log-likelihood `sum_e [ r^2/(2w^-1) + 0.5*ln(w^-1) ]` w.r.t. `v[s]`,
/// starting from the closed-form root. Converges to the same value as
/// `Original`; kept as a genuinely distinct code path (rather than an
/// alias) since it's callable as a separate `gradient_method` option.
fn numerical_inconsistency_update(tensor: &OpinionTensor, params: &Params, s: usize, start: f64) -> f64 {
    let neg_log_likelihood = |v_s: f64| -> f64 {
        let mut nll = 0.0;
        for e in 0..tensor.num_stimuli {
            if tensor.is_observed(s, e) {
                let r = tensor.value_at(s, e) - params.b[s] - params.psi[e];
                let a2 = params.a[tensor.content_map[e]] * params.a[tensor.content_map[e]];
                let variance = (v_s * v_s + a2).max(PARAM_FLOOR * PARAM_FLOOR);
                nll += 0.5 * (r * r / variance + variance.ln());
            }
        }
        nll
    };

    let mut v_s = start.max(PARAM_FLOOR);
    for _ in 0..20 {
        let h = FINITE_DIFF_STEP;
        let f_plus = neg_log_likelihood(v_s + h);
        let f_minus = neg_log_likelihood(v_s - h);
        let f_center = neg_log_likelihood(v_s);
        let grad = (f_plus - f_minus) / (2.0 * h);
        let hess = (f_plus - 2.0 * f_center + f_minus) / (h * h);
        if hess.abs() < 1e-12 {
            break;
        }
        let step = grad / hess;
        let next = (v_s - step).max(PARAM_FLOOR);
        if (next - v_s).abs() < 1e-10 {
            v_s = next;
            break;
        }
        v_s = next;
    }
    v_s
}

/// Stage 4: closed-form MLE of `a[c]^2`.
fn update_ambiguity(tensor: &OpinionTensor, params: &mut Params) {
    for c in 0..tensor.num_contents {
        let mut sum = 0.0;
        let mut n = 0usize;
        for s in 0..tensor.num_subjects {
            for e in 0..tensor.num_stimuli {
                if tensor.content_map[e] == c && tensor.is_observed(s, e) {
                    let r = tensor.value_at(s, e) - params.b[s] - params.psi[e];
                    sum += r * r - params.v[s] * params.v[s];
                    n += 1;
                }
            }
        }
        let a2 = if n > 0 { (sum / n as f64).max(0.0) } else { 0.0 };
        params.a[c] = a2.sqrt().max(PARAM_FLOOR);
    }
}

#[allow(clippy::too_many_arguments)]
fn max_relative_delta(
    prev_psi: &[f64],
    psi: &[f64],
    bias: Option<(&[f64], &[f64])>,
    inconsistency: Option<(&[f64], &[f64])>,
    ambiguity: Option<(&[f64], &[f64])>,
) -> f64 {
    let mut max_delta = relative_delta_vec(prev_psi, psi);
    if let Some((prev, cur)) = bias {
        max_delta = max_delta.max(relative_delta_vec(prev, cur));
    }
    if let Some((prev, cur)) = inconsistency {
        max_delta = max_delta.max(relative_delta_vec(prev, cur));
    }
    if let Some((prev, cur)) = ambiguity {
        max_delta = max_delta.max(relative_delta_vec(prev, cur));
    }
    max_delta
}

fn relative_delta_vec(prev: &[f64], cur: &[f64]) -> f64 {
    prev.iter()
        .zip(cur.iter())
        .map(|(p, c)| (c - p).abs() / (p.abs() + 1e-8))
        .fold(0.0, f64::max)
}

/// Standard errors via the observed Fisher information,
/// computed once at termination.
fn build_result(
    tensor: &OpinionTensor,
    params: &Params,
    estimate_bias: bool,
    estimate_inconsistency: bool,
    estimate_ambiguity: bool,
) -> ModelResult {
    let mut quality_scores_std = vec![0.0; tensor.num_stimuli];
    for e in 0..tensor.num_stimuli {
        let mut den = 0.0;
        for s in 0..tensor.num_subjects {
            if tensor.is_observed(s, e) {
                den += weight(params, tensor, s, e);
            }
        }
        quality_scores_std[e] = if den > 0.0 { 1.0 / den.sqrt() } else { f64::INFINITY };
    }

    let bias_std = estimate_bias.then(|| {
        (0..tensor.num_subjects)
            .map(|s| {
                let mut den = 0.0;
                for e in 0..tensor.num_stimuli {
                    if tensor.is_observed(s, e) {
                        den += weight(params, tensor, s, e);
                    }
                }
                if den > 0.0 { 1.0 / den.sqrt() } else { f64::INFINITY }
            })
            .collect()
    });

    let inconsistency_std = estimate_inconsistency.then(|| {
        (0..tensor.num_subjects)
            .map(|s| {
                let n_s = masked_count(&tensor.row(s).map(|(_, m)| m).collect::<Vec<_>>());
                if n_s > 0 { params.v[s] / (2.0 * n_s as f64).sqrt() } else { 0.0 }
            })
            .collect()
    });

    let ambiguity_std = estimate_ambiguity.then(|| {
        (0..tensor.num_contents)
            .map(|c| {
                let n_c = (0..tensor.num_subjects)
                    .flat_map(|s| (0..tensor.num_stimuli).map(move |e| (s, e)))
                    .filter(|&(s, e)| tensor.content_map[e] == c && tensor.is_observed(s, e))
                    .count();
                if n_c > 0 { params.a[c] / (2.0 * n_c as f64).sqrt() } else { 0.0 }
            })
            .collect()
    });

    ModelResult {
        quality_scores: params.psi.clone(),
        quality_scores_std,
        observer_bias: estimate_bias.then(|| params.b.clone()),
        observer_bias_std: bias_std,
        observer_inconsistency: estimate_inconsistency.then(|| params.v.clone()),
        observer_inconsistency_std: inconsistency_std,
        content_ambiguity: estimate_ambiguity.then(|| params.a.clone()),
        content_ambiguity_std: ambiguity_std,
        reject_subjects: None,
        per_subject_scores: None,
    }
}

/// The `LiveDmos` pipeline: a specialized model, not one of
/// the MLE ablations. Computes per-subject z-scores of the signed
/// reference-minus-distorted difference, then rescales so the grand mean
/// lands at 50 and one population standard deviation maps to ~25 (the
/// LIVE convention), and emits the per-stimulus mean.
#[instrument(skip(tensor))]
pub fn run_live_dmos(tensor: &OpinionTensor, config: &LiveDmosConfig) -> Result<ModelResult> {
    config.validate()?;

    const LIVE_SCALE: f64 = 25.0;
    const LIVE_ANCHOR: f64 = 50.0;

    let mut diff = tensor.clone();
    for e in 0..tensor.num_stimuli {
        let has_any = (0..tensor.num_subjects).any(|s| tensor.is_observed(s, e));
        if !has_any {
            continue;
        }
        let Some(reference) = tensor.reference_map[e] else {
            return Err(Error::MissingReference { stimulus: e });
        };
        for s in 0..tensor.num_subjects {
            if tensor.is_observed(s, e) && tensor.is_observed(s, reference) {
                let ref_val = tensor.value_at(s, reference);
                let dis_val = tensor.value_at(s, e);
                diff.set(s, e, Some(ref_val - dis_val));
            } else {
                diff.set(s, e, None);
            }
        }
    }

    apply_zscore(&mut diff)?;

    for i in 0..diff.values.len() {
        if diff.mask[i] {
            diff.values[i] = diff.values[i] * LIVE_SCALE + LIVE_ANCHOR;
        }
    }

    let mut quality_scores = vec![0.0; tensor.num_stimuli];
    let mut quality_scores_std = vec![0.0; tensor.num_stimuli];
    for e in 0..tensor.num_stimuli {
        let col_values: Vec<f64> = diff.column(e).map(|(v, _)| v).collect();
        let col_mask: Vec<bool> = diff.column(e).map(|(_, m)| m).collect();
        let mean = masked_mean(&col_values, &col_mask).unwrap_or_else(|| {
            warn!(stimulus = e, "no observations for stimulus under LiveDmos");
            f64::NAN
        });
        let n = masked_count(&col_mask);
        let sem = masked_sample_stdev(&col_values, &col_mask)
            .map(|sd| sd / (n as f64).sqrt())
            .unwrap_or(0.0);
        quality_scores[e] = mean;
        quality_scores_std[e] = sem;
    }

    crate::postprocess::apply_final_transforms(
        &mut quality_scores,
        &mut quality_scores_std,
        config.normalize_final,
        config.transform_final,
    );

    Ok(ModelResult {
        quality_scores,
        quality_scores_std,
        ..ModelResult::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::RatingScale;
    use tracing_test::traced_test;

    fn fully_observed_tensor(rows: &[Vec<f64>]) -> OpinionTensor {
        let num_subjects = rows.len();
        let num_stimuli = rows[0].len();
        let mut values = Vec::with_capacity(num_subjects * num_stimuli);
        for row in rows {
            values.extend_from_slice(row);
        }
        OpinionTensor {
            num_subjects,
            num_stimuli,
            num_contents: 1,
            values,
            mask: vec![true; num_subjects * num_stimuli],
            content_map: vec![0; num_stimuli],
            reference_map: vec![Some(0); num_stimuli],
            subject_ids: (0..num_subjects).map(|i| i.to_string()).collect(),
            scale: RatingScale::default(),
        }
    }

    #[test]
    fn legacy_and_content_oblivious_match() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0],
            vec![4.0, 2.0, 1.0],
            vec![3.0, 4.0, 5.0],
            vec![2.0, 1.0, 4.0],
        ]);
        let config = MleConfig::default();
        let legacy = run(&tensor, MleVariant::Legacy, &config).unwrap();
        let oblivious = run(&tensor, MleVariant::ContentOblivious, &config).unwrap();

        for (a, b) in legacy.quality_scores.iter().zip(oblivious.quality_scores.iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
        for (a, b) in legacy.observer_bias.as_ref().unwrap().iter().zip(oblivious.observer_bias.as_ref().unwrap().iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn zscore_mode_forces_exact_zero_sum_bias_and_quality() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0, 4.0],
            vec![4.0, 2.0, 1.0, 3.0],
            vec![3.0, 4.0, 5.0, 1.0],
            vec![2.0, 1.0, 4.0, 5.0],
        ]);
        let config = MleConfig { zscore_mode: true, ..MleConfig::default() };
        let result = run(&tensor, MleVariant::Legacy, &config).unwrap();
        let bias_sum: f64 = result.observer_bias.unwrap().iter().sum();
        let psi_sum: f64 = result.quality_scores.iter().sum();
        assert!(bias_sum.abs() < 1e-9, "{bias_sum}");
        assert!(psi_sum.abs() < 1e-6, "{psi_sum}");
    }

    #[test]
    fn subject_rejection_on_mle_is_invalid_combination() {
        let tensor = fully_observed_tensor(&[vec![5.0, 3.0], vec![4.0, 2.0]]);
        let config = MleConfig { subject_rejection: true, ..MleConfig::default() };
        let err = run(&tensor, MleVariant::Legacy, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidCombination(_)));
    }

    #[test]
    fn content_aware_estimates_positive_ambiguity() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0, 4.0],
            vec![4.0, 2.0, 1.0, 3.0],
            vec![3.0, 4.0, 5.0, 1.0],
            vec![2.0, 1.0, 4.0, 5.0],
            vec![5.0, 2.0, 2.0, 4.0],
        ]);
        let config = MleConfig::default();
        let result = run(&tensor, MleVariant::ContentAware, &config).unwrap();
        assert!(result.content_ambiguity.is_some());
        for a in result.content_ambiguity.unwrap() {
            assert!(a >= 0.0);
        }
    }

    #[test]
    fn subject_oblivious_holds_inconsistency_fixed_at_one() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0, 4.0],
            vec![4.0, 2.0, 1.0, 3.0],
            vec![3.0, 4.0, 5.0, 1.0],
        ]);
        // estimate_inconsistency = false for SubjectOblivious: v must be
        // seeded at exactly 1.0, not the per-subject residual stdev.
        let params = initialize(&tensor, false, true);
        assert_eq!(params.v, vec![1.0; tensor.num_subjects]);
    }

    #[test]
    fn missing_entry_does_not_change_other_results() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0],
            vec![4.0, 2.0, 1.0],
            vec![3.0, 4.0, 5.0],
        ]);
        let mut with_missing = tensor.clone();
        with_missing.set(2, 2, None);

        let config = MleConfig::default();
        let base = run(&tensor, MleVariant::Legacy, &config).unwrap();
        let missing = run(&with_missing, MleVariant::Legacy, &config).unwrap();

        // Stimulus/subject pairs untouched by the missing cell should be
        // close (not bitwise identical: removing an observation shifts
        // every joint parameter slightly through the coupled fit, but the
        // untouched stimulus far from the missing cell should barely move).
        assert!((base.quality_scores[0] - missing.quality_scores[0]).abs() < 0.5);
    }

    #[test]
    fn rerun_is_stable() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0],
            vec![4.0, 2.0, 1.0],
            vec![3.0, 4.0, 5.0],
        ]);
        let config = MleConfig::default();
        let first = run(&tensor, MleVariant::Legacy, &config).unwrap();
        let second = run(&tensor, MleVariant::Legacy, &config).unwrap();
        for (a, b) in first.quality_scores.iter().zip(second.quality_scores.iter()) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn live_dmos_mean_is_fifty_on_full_tensor() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0, 5.0],
            vec![5.0, 2.0, 1.0, 5.0],
            vec![5.0, 4.0, 5.0, 5.0],
            vec![5.0, 1.0, 4.0, 5.0],
        ]);
        let result = run_live_dmos(&tensor, &LiveDmosConfig::default()).unwrap();
        let m: f64 = result.quality_scores.iter().sum::<f64>() / result.quality_scores.len() as f64;
        assert!((m - 50.0).abs() < 1e-6, "{m}");
    }

    #[traced_test]
    #[test]
    fn convergence_emits_a_debug_event_with_iteration_count() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 2.0],
            vec![4.0, 2.0, 1.0],
            vec![3.0, 4.0, 5.0],
        ]);
        let config = MleConfig::default();
        run(&tensor, MleVariant::Legacy, &config).unwrap();
        assert!(logs_contain("mle converged"));
    }

    #[test]
    fn live_dmos_rejects_dscore_mode() {
        let tensor = fully_observed_tensor(&[vec![5.0, 3.0], vec![4.0, 2.0]]);
        let config = LiveDmosConfig { dscore_mode: true, ..LiveDmosConfig::default() };
        let err = run_live_dmos(&tensor, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidCombination(_)));
    }
}

//! Descriptive aggregators (C2)
//!
//! MOS, DMOS, per-subject, z-scoring, bias-removal, and BT.500 subject
//! rejection, composed as an ordered pipeline of preprocessors over a
//! working copy of the opinion tensor: bias removal ->
//! subject rejection -> z-scoring -> DMOS remap -> column-wise reduction.
//! `DescriptiveConfig`'s flags select which steps run; the combinator
//! names (`Subjrej`, `Zscoring`, `Biasremv`-prefixed models) are just
//! particular flag combinations on this one `run`, not separate types.

use crate::config::DescriptiveConfig;
use crate::error::{Error, Result};
use crate::postprocess::apply_final_transforms;
use crate::result::ModelResult;
use crate::stats::{masked_count, masked_kurtosis, masked_mean, masked_sample_stdev, masked_sample_variance};
use crate::tensor::OpinionTensor;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

const OUTLIER_SIGMA_NORMAL: f64 = 2.0;
const OUTLIER_SIGMA_NONNORMAL: f64 = 4.472_135_955; // sqrt(20)
const BT500_P_RATIO_THRESHOLD: f64 = 0.05;
const BT500_Q_RATIO_CENTER: f64 = 0.5;
const BT500_Q_RATIO_HALF_WIDTH: f64 = 0.3;

/// Run a descriptive (MOS/DMOS family) aggregator per `config`.
#[instrument(skip(tensor), fields(bias_removal = config.bias_removal, subject_rejection = config.subject_rejection, zscore_mode = config.zscore_mode, dscore_mode = config.dscore_mode))]
pub fn run(tensor: &OpinionTensor, config: &DescriptiveConfig) -> Result<ModelResult> {
    config.validate()?;

    let mut working = tensor.clone();
    let mut result = ModelResult::default();

    if config.bias_removal {
        let (bias, bias_std) = apply_bias_removal(&mut working)?;
        result.observer_bias = Some(bias);
        result.observer_bias_std = Some(bias_std);
    }

    let mut rejected = BTreeSet::new();
    if config.subject_rejection {
        rejected = compute_subject_rejection(&working)?;
        debug!(rejected = rejected.len(), "subject rejection complete");
        result.reject_subjects = Some(rejected.clone());
    }

    if config.zscore_mode {
        apply_zscore(&mut working)?;
    }

    if config.dscore_mode {
        apply_dscore_remap(&mut working)?;
    }

    let (mut quality_scores, mut quality_scores_std) = reduce_mos(&working, &rejected);

    apply_final_transforms(
        &mut quality_scores,
        &mut quality_scores_std,
        config.normalize_final,
        config.transform_final,
    );

    result.quality_scores = quality_scores;
    result.quality_scores_std = quality_scores_std;
    Ok(result)
}

/// The `PerSubject` diagnostic: identity transform (the same preprocessing
/// pipeline minus the final column reduction), emitting the full
/// `(subject, stimulus)` matrix. A scalar `quality_scores`/`_std` pair is
/// still produced via MOS-style reduction so the emitter always has a
/// per-stimulus groundtruth to write, even though the primary output of
/// this model is `per_subject_scores`.
pub fn run_per_subject(tensor: &OpinionTensor, config: &DescriptiveConfig) -> Result<ModelResult> {
    let mut result = run(tensor, config)?;

    let mut working = tensor.clone();
    if config.bias_removal {
        apply_bias_removal(&mut working)?;
    }
    if config.zscore_mode {
        apply_zscore(&mut working)?;
    }
    if config.dscore_mode {
        apply_dscore_remap(&mut working)?;
    }

    let matrix: Vec<Vec<f64>> = (0..working.num_subjects)
        .map(|s| working.row(s).map(|(v, _)| v).collect())
        .collect();
    result.per_subject_scores = Some(matrix);
    Ok(result)
}

/// Per-subject additive bias `b_s = mean_e(O[s,e]) - grand_mean`, then
/// `O <- O - b_s`. Returns `(bias, bias_std)` where `bias_std[s]` is the
/// standard error of subject `s`'s mean.
fn apply_bias_removal(tensor: &mut OpinionTensor) -> Result<(Vec<f64>, Vec<f64>)> {
    let grand_mean = masked_mean(&tensor.values, &tensor.mask)
        .ok_or_else(|| Error::InsufficientData("no observed ratings in tensor".to_string()))?;

    let mut bias = vec![0.0; tensor.num_subjects];
    let mut bias_std = vec![0.0; tensor.num_subjects];

    for s in 0..tensor.num_subjects {
        let row_values: Vec<f64> = tensor.row(s).map(|(v, _)| v).collect();
        let row_mask: Vec<bool> = tensor.row(s).map(|(_, m)| m).collect();
        let subject_mean = masked_mean(&row_values, &row_mask)
            .ok_or_else(|| Error::InsufficientData(format!("subject {s} has no ratings")))?;
        let n = masked_count(&row_mask);
        let sem = masked_sample_stdev(&row_values, &row_mask)
            .map(|sd| sd / (n as f64).sqrt())
            .unwrap_or(0.0);
        bias[s] = subject_mean - grand_mean;
        bias_std[s] = sem;
    }

    for s in 0..tensor.num_subjects {
        for e in 0..tensor.num_stimuli {
            let idx = s * tensor.num_stimuli + e;
            if tensor.mask[idx] {
                tensor.values[idx] -= bias[s];
            }
        }
    }

    Ok((bias, bias_std))
}

/// Per-subject z-standardization to zero mean, unit (population) variance
/// over that subject's non-missing entries.
pub(crate) fn apply_zscore(tensor: &mut OpinionTensor) -> Result<()> {
    for s in 0..tensor.num_subjects {
        let row_values: Vec<f64> = tensor.row(s).map(|(v, _)| v).collect();
        let row_mask: Vec<bool> = tensor.row(s).map(|(_, m)| m).collect();
        let subject_mean = masked_mean(&row_values, &row_mask)
            .ok_or_else(|| Error::InsufficientData(format!("subject {s} has no ratings")))?;
        let variance = crate::stats::masked_population_variance(&row_values, &row_mask).unwrap_or(0.0);
        let sigma = variance.sqrt();
        for e in 0..tensor.num_stimuli {
            let idx = s * tensor.num_stimuli + e;
            if tensor.mask[idx] {
                tensor.values[idx] = if sigma > 1e-12 {
                    (tensor.values[idx] - subject_mean) / sigma
                } else {
                    0.0
                };
            }
        }
    }
    Ok(())
}

/// `O[s,e] <- O[s, rho(e)] - O[s,e] + max_scale`. Every stimulus that
/// carries at least one observation must have a resolved reference
/// (every rated stimulus needs a resolvable reference), and the subject must also have rated the
/// reference for that cell to remain observed.
pub(crate) fn apply_dscore_remap(tensor: &mut OpinionTensor) -> Result<()> {
    let max_scale = tensor.scale.max;
    let mut new_values = tensor.values.clone();
    let mut new_mask = tensor.mask.clone();

    for e in 0..tensor.num_stimuli {
        let has_any_observation = (0..tensor.num_subjects).any(|s| tensor.mask[s * tensor.num_stimuli + e]);
        if !has_any_observation {
            continue;
        }
        let Some(reference) = tensor.reference_map[e] else {
            return Err(Error::MissingReference { stimulus: e });
        };
        for s in 0..tensor.num_subjects {
            let dis_idx = s * tensor.num_stimuli + e;
            let ref_idx = s * tensor.num_stimuli + reference;
            if tensor.mask[dis_idx] && tensor.mask[ref_idx] {
                new_values[dis_idx] = tensor.values[ref_idx] - tensor.values[dis_idx] + max_scale;
                new_mask[dis_idx] = true;
            } else {
                new_mask[dis_idx] = false;
            }
        }
    }

    tensor.values = new_values;
    tensor.mask = new_mask;
    Ok(())
}

/// ITU-R BT.500 subject rejection: for each subject, the
/// fraction of their ratings falling outside `[mu_e - k*sigma_e,
/// mu_e + k*sigma_e]` (k = 2 for near-normal stimulus distributions,
/// `sqrt(20)` otherwise, chosen per-stimulus by that stimulus's excess
/// kurtosis). Reject when `P/N > 0.05` and `|Q/N - 0.5| < 0.3`.
fn compute_subject_rejection(tensor: &OpinionTensor) -> Result<BTreeSet<usize>> {
    // Every subject must have rated at least two stimuli with finite variance.
    for s in 0..tensor.num_subjects {
        let row_values: Vec<f64> = tensor.row(s).map(|(v, _)| v).collect();
        let row_mask: Vec<bool> = tensor.row(s).map(|(_, m)| m).collect();
        let variance = masked_sample_variance(&row_values, &row_mask);
        match variance {
            Some(v) if v.is_finite() && masked_count(&row_mask) >= 2 => {}
            _ => {
                return Err(Error::InsufficientData(format!(
                    "subject {s} has fewer than two ratings with finite variance"
                )))
            }
        }
    }

    // Per-stimulus mean/sigma/kurtosis, used as the outlier bound for every
    // subject's rating of that stimulus.
    let mut stim_mean = vec![0.0; tensor.num_stimuli];
    let mut stim_bound = vec![0.0; tensor.num_stimuli];
    for e in 0..tensor.num_stimuli {
        let col_values: Vec<f64> = tensor.column(e).map(|(v, _)| v).collect();
        let col_mask: Vec<bool> = tensor.column(e).map(|(_, m)| m).collect();
        let mean = masked_mean(&col_values, &col_mask).unwrap_or(0.0);
        let sigma = masked_sample_stdev(&col_values, &col_mask).unwrap_or(0.0);
        let kurtosis = masked_kurtosis(&col_values, &col_mask);
        let k = if (2.0..=4.0).contains(&kurtosis) {
            OUTLIER_SIGMA_NORMAL
        } else {
            OUTLIER_SIGMA_NONNORMAL
        };
        stim_mean[e] = mean;
        stim_bound[e] = k * sigma;
    }

    let mut rejected = BTreeSet::new();
    for s in 0..tensor.num_subjects {
        let mut p = 0usize;
        let mut q = 0usize;
        let mut n = 0usize;
        for e in 0..tensor.num_stimuli {
            let idx = s * tensor.num_stimuli + e;
            if !tensor.mask[idx] {
                continue;
            }
            n += 1;
            let value = tensor.values[idx];
            if value > stim_mean[e] + stim_bound[e] {
                p += 1;
            } else if value < stim_mean[e] - stim_bound[e] {
                q += 1;
            }
        }
        if n == 0 {
            continue;
        }
        let p_ratio = p as f64 / n as f64;
        let q_ratio = q as f64 / n as f64;
        if p_ratio > BT500_P_RATIO_THRESHOLD && (q_ratio - BT500_Q_RATIO_CENTER).abs() < BT500_Q_RATIO_HALF_WIDTH {
            rejected.insert(s);
        }
    }

    Ok(rejected)
}

/// Column-wise mean and standard error, excluding `rejected` subjects.
fn reduce_mos(tensor: &OpinionTensor, rejected: &BTreeSet<usize>) -> (Vec<f64>, Vec<f64>) {
    let mut scores = vec![0.0; tensor.num_stimuli];
    let mut scores_std = vec![0.0; tensor.num_stimuli];

    for e in 0..tensor.num_stimuli {
        let mut values = Vec::with_capacity(tensor.num_subjects);
        let mut mask = Vec::with_capacity(tensor.num_subjects);
        for (v, m) in tensor.column(e) {
            values.push(v);
            mask.push(m);
        }
        for s in rejected {
            mask[*s] = false;
        }
        let mean = masked_mean(&values, &mask).unwrap_or(f64::NAN);
        let n = masked_count(&mask);
        let sem = masked_sample_stdev(&values, &mask)
            .map(|sd| sd / (n as f64).sqrt())
            .unwrap_or(0.0);
        scores[e] = mean;
        scores_std[e] = sem;
    }

    (scores, scores_std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::RatingScale;

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
    fn mos_equals_column_mean_on_fully_observed_tensor() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0],
            vec![4.0, 2.0],
            vec![3.0, 1.0],
        ]);
        let config = DescriptiveConfig::default();
        let result = run(&tensor, &config).unwrap();
        assert!((result.quality_scores[0] - 4.0).abs() < 1e-12);
        assert!((result.quality_scores[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn dmos_self_reference_maps_to_max_scale() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0],
            vec![5.0, 2.0],
        ]);
        let config = DescriptiveConfig { dscore_mode: true, ..DescriptiveConfig::default() };
        let result = run(&tensor, &config).unwrap();
        // stimulus 0 is its own reference: 5 - 5 + 5 = 5
        assert!((result.quality_scores[0] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn bias_removal_recenters_rows_to_grand_mean() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 5.0],
            vec![1.0, 1.0],
        ]);
        let config = DescriptiveConfig { bias_removal: true, ..DescriptiveConfig::default() };
        let result = run(&tensor, &config).unwrap();
        let bias = result.observer_bias.unwrap();
        assert!((bias[0] - 2.0).abs() < 1e-9);
        assert!((bias[1] - (-2.0)).abs() < 1e-9);
        assert!((result.quality_scores[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn missing_entry_does_not_change_other_cells() {
        let mut tensor = fully_observed_tensor(&[
            vec![5.0, 3.0],
            vec![4.0, 2.0],
            vec![3.0, 1.0],
        ]);
        tensor.set(2, 1, None);
        let config = DescriptiveConfig::default();
        let result = run(&tensor, &config).unwrap();
        assert!((result.quality_scores[0] - 4.0).abs() < 1e-12);
        assert!((result.quality_scores[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn normalize_final_yields_zero_mean_unit_variance() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0, 1.0],
            vec![4.0, 2.0, 1.0],
        ]);
        let config = DescriptiveConfig { normalize_final: true, ..DescriptiveConfig::default() };
        let result = run(&tensor, &config).unwrap();
        let m = crate::stats::mean(&result.quality_scores);
        let v = crate::stats::population_variance(&result.quality_scores);
        assert!(m.abs() < 1e-9, "{m}");
        assert!((v - 1.0).abs() < 1e-9, "{v}");
    }

    #[test]
    fn subject_rejection_requires_two_ratings() {
        let mut tensor = fully_observed_tensor(&[
            vec![5.0, 3.0],
            vec![4.0, 2.0],
        ]);
        tensor.set(0, 1, None);
        let config = DescriptiveConfig { subject_rejection: true, ..DescriptiveConfig::default() };
        let err = run(&tensor, &config).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn per_subject_preserves_full_matrix() {
        let tensor = fully_observed_tensor(&[
            vec![5.0, 3.0],
            vec![4.0, 2.0],
        ]);
        let config = DescriptiveConfig::default();
        let result = run_per_subject(&tensor, &config).unwrap();
        let matrix = result.per_subject_scores.unwrap();
        assert_eq!(matrix, vec![vec![5.0, 3.0], vec![4.0, 2.0]]);
    }
}

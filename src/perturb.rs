//! Perturbation wrappers (C6) — test-fixture generators
//!
//! Out of scope for production use: these build or mutate an
//! `OpinionTensor` for reproducible test fixtures, never for a live
//! dataset. Each takes an explicit seed so a fixture is reproducible
//! across a re-run, the same contract the MLE re-run-stability invariant
//! relies on.

use crate::tensor::{OpinionTensor, RatingScale};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Independently drop each observed cell of `tensor` with probability `p`,
/// seeded by `seed`. Returns a new tensor; `tensor` is untouched.
#[must_use]
pub fn missing_data(tensor: &OpinionTensor, p: f64, seed: u64) -> OpinionTensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = tensor.clone();
    for s in 0..out.num_subjects {
        for e in 0..out.num_stimuli {
            if out.is_observed(s, e) && rng.gen_bool(p.clamp(0.0, 1.0)) {
                out.set(s, e, None);
            }
        }
    }
    out
}

/// Parameters for `synthetic`: one value per index, matching the additive
/// noise model: `O[s,e] = psi[e] + b[s] + N(0, v[s]^2 + a[kappa(e)]^2)`.
pub struct SyntheticParams<'a> {
    pub quality: &'a [f64],
    pub bias: &'a [f64],
    pub inconsistency: &'a [f64],
    pub content_ambiguity: &'a [f64],
}

/// Generate a fully-observed opinion tensor from ground-truth parameters
/// plus Gaussian noise, seeded by `seed`. `content_map` assigns each
/// stimulus to a content index into `params.content_ambiguity`.
#[must_use]
pub fn synthetic(
    params: &SyntheticParams,
    content_map: &[usize],
    scale: RatingScale,
    seed: u64,
) -> OpinionTensor {
    let num_stimuli = params.quality.len();
    let num_subjects = params.bias.len();
    let num_contents = params.content_ambiguity.len();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = vec![0.0; num_subjects * num_stimuli];

    for s in 0..num_subjects {
        for e in 0..num_stimuli {
            let content = content_map[e];
            let variance = params.inconsistency[s].powi(2) + params.content_ambiguity[content].powi(2);
            let noise = Normal::new(0.0, variance.sqrt().max(1e-12))
                .expect("variance is non-negative and finite")
                .sample(&mut rng);
            let raw = params.quality[e] + params.bias[s] + noise;
            values[s * num_stimuli + e] = raw.clamp(scale.min, scale.max);
        }
    }

    OpinionTensor {
        num_subjects,
        num_stimuli,
        num_contents,
        values,
        mask: vec![true; num_subjects * num_stimuli],
        content_map: content_map.to_vec(),
        reference_map: vec![None; num_stimuli],
        subject_ids: (0..num_subjects).map(|i| i.to_string()).collect(),
        scale,
    }
}

/// Replace each subject in `subjects` with uniform random draws over the
/// tensor's rating scale, seeded by `seed`. Only cells already observed in
/// the source are overwritten; missing cells stay missing.
#[must_use]
pub fn corrupt_subject(tensor: &OpinionTensor, subjects: &[usize], seed: u64) -> OpinionTensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = tensor.clone();
    for &s in subjects {
        for e in 0..out.num_stimuli {
            if out.is_observed(s, e) {
                let draw = rng.gen_range(out.scale.min..=out.scale.max);
                out.set(s, e, Some(draw));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn missing_data_with_p_zero_is_identity() {
        let tensor = fully_observed_tensor(&[vec![5.0, 3.0], vec![4.0, 2.0]]);
        let out = missing_data(&tensor, 0.0, 42);
        assert_eq!(out.mask, tensor.mask);
    }

    #[test]
    fn missing_data_with_p_one_drops_everything() {
        let tensor = fully_observed_tensor(&[vec![5.0, 3.0], vec![4.0, 2.0]]);
        let out = missing_data(&tensor, 1.0, 42);
        assert!(out.mask.iter().all(|&m| !m));
    }

    #[test]
    fn missing_data_is_reproducible_for_same_seed() {
        let tensor = fully_observed_tensor(&[vec![5.0, 3.0, 2.0, 4.0], vec![4.0, 2.0, 1.0, 3.0]]);
        let a = missing_data(&tensor, 0.5, 7);
        let b = missing_data(&tensor, 0.5, 7);
        assert_eq!(a.mask, b.mask);
    }

    #[test]
    fn synthetic_values_stay_within_scale() {
        let params = SyntheticParams {
            quality: &[3.0, 4.0],
            bias: &[0.0, 0.5, -0.5],
            inconsistency: &[0.2, 0.3, 0.1],
            content_ambiguity: &[0.1],
        };
        let tensor = synthetic(&params, &[0, 0], RatingScale::default(), 1);
        assert_eq!(tensor.num_subjects, 3);
        assert_eq!(tensor.num_stimuli, 2);
        for &v in &tensor.values {
            assert!((1.0..=5.0).contains(&v));
        }
    }

    #[test]
    fn corrupt_subject_only_touches_requested_rows() {
        let tensor = fully_observed_tensor(&[vec![5.0, 3.0], vec![4.0, 2.0], vec![3.0, 1.0]]);
        let out = corrupt_subject(&tensor, &[1], 9);
        assert_eq!(out.get(0, 0), Some(5.0));
        assert_eq!(out.get(2, 0), Some(3.0));
        let corrupted = out.get(1, 0).unwrap();
        assert!((1.0..=5.0).contains(&corrupted));
    }
}

//! Opinion tensor & dataset adapter (C1)
//!
//! Builds the dense `(observers x stimuli)` opinion matrix the rest of the
//! crate operates on, plus the content map `kappa` and reference map `rho`.
//! Missing cells are represented both as `f64::NAN` in the value array and
//! `false` in a companion bitmask, so reductions can branch on the mask
//! alone and never need to special-case NaN arithmetic — a representation
//! chosen for branch-free, deterministic folds.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Closed interval that observed opinion scores must lie within. The
/// typical ACR scale is `[1, 5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingScale {
    fn default() -> Self {
        RatingScale { min: 1.0, max: 5.0 }
    }
}

/// The dense `(S, E)` opinion matrix with a NaN-sentinel/bitmask pair,
/// a stimulus to content map `kappa`, and a stimulus to reference-stimulus
/// map `rho`.
#[derive(Debug, Clone)]
pub struct OpinionTensor {
    /// Number of subjects (observers).
    pub num_subjects: usize,
    /// Number of distorted stimuli.
    pub num_stimuli: usize,
    /// Number of distinct contents.
    pub num_contents: usize,
    /// Row-major `(S, E)` opinion values; `NAN` where `mask` is `false`.
    pub values: Vec<f64>,
    /// Row-major `(S, E)` observed-mask; branch on this, never on `is_nan`.
    pub mask: Vec<bool>,
    /// `kappa`: stimulus index -> content index, length E.
    pub content_map: Vec<usize>,
    /// `rho`: stimulus index -> reference stimulus index, length E.
    pub reference_map: Vec<Option<usize>>,
    /// Subject ids in index order, for diagnostics and error messages.
    pub subject_ids: Vec<String>,
    pub scale: RatingScale,
}

impl OpinionTensor {
    #[must_use]
    pub fn get(&self, subject: usize, stimulus: usize) -> Option<f64> {
        let idx = subject * self.num_stimuli + stimulus;
        self.mask[idx].then(|| self.values[idx])
    }

    #[must_use]
    pub fn is_observed(&self, subject: usize, stimulus: usize) -> bool {
        self.mask[subject * self.num_stimuli + stimulus]
    }

    /// The raw value at `(subject, stimulus)`, regardless of `mask`. Only
    /// meaningful when the caller has already established the cell is
    /// observed (e.g. via [`Self::is_observed`]) — callers that haven't
    /// should use [`Self::get`] instead, which returns `None` for a
    /// missing cell rather than a stale `NAN`.
    #[must_use]
    pub fn value_at(&self, subject: usize, stimulus: usize) -> f64 {
        self.values[subject * self.num_stimuli + stimulus]
    }

    pub fn set(&mut self, subject: usize, stimulus: usize, value: Option<f64>) {
        let idx = subject * self.num_stimuli + stimulus;
        match value {
            Some(v) => {
                self.values[idx] = v;
                self.mask[idx] = true;
            }
            None => {
                self.values[idx] = f64::NAN;
                self.mask[idx] = false;
            }
        }
    }

    /// Row (single subject's ratings) as `(value, observed)` pairs.
    pub fn row(&self, subject: usize) -> impl Iterator<Item = (f64, bool)> + '_ {
        let start = subject * self.num_stimuli;
        (0..self.num_stimuli).map(move |e| (self.values[start + e], self.mask[start + e]))
    }

    /// Column (single stimulus's ratings across all subjects) as
    /// `(value, observed)` pairs.
    pub fn column(&self, stimulus: usize) -> impl Iterator<Item = (f64, bool)> + '_ {
        (0..self.num_subjects).map(move |s| {
            let idx = s * self.num_stimuli + stimulus;
            (self.values[idx], self.mask[idx])
        })
    }

    fn empty(num_subjects: usize, num_stimuli: usize, num_contents: usize, scale: RatingScale) -> Self {
        OpinionTensor {
            num_subjects,
            num_stimuli,
            num_contents,
            values: vec![f64::NAN; num_subjects * num_stimuli],
            mask: vec![false; num_subjects * num_stimuli],
            content_map: vec![0; num_stimuli],
            reference_map: vec![None; num_stimuli],
            subject_ids: Vec::new(),
            scale,
        }
    }
}

/// Materialize an opinion tensor from a `Dataset`.
///
/// Observer indices are dense integers assigned in order of first sighting
/// across `dis_videos` in dataset order. Content indices are assigned the
/// same way from `content_id`. The reference map is resolved by matching a
/// stimulus's `ref_path` against the `path` of another stimulus in the same
/// dataset (the "hidden reference" convention: the undistorted clip is
/// itself one of the rated stimuli, sometimes rating itself when
/// `ref_path == path`).
#[instrument(skip(dataset), fields(dataset = %dataset.dataset_name))]
pub fn build(dataset: &Dataset) -> Result<OpinionTensor> {
    if dataset.dis_videos.is_empty() {
        return Err(Error::SchemaError("dataset has no dis_videos".to_string()));
    }

    let num_stimuli = dataset.dis_videos.len();

    // Assign observer indices by first sighting.
    let mut subject_index: HashMap<String, usize> = HashMap::new();
    let mut subject_ids: Vec<String> = Vec::new();
    for dis in &dataset.dis_videos {
        for (subject_id, _) in dis.os.entries() {
            if !subject_index.contains_key(&subject_id) {
                subject_index.insert(subject_id.clone(), subject_ids.len());
                subject_ids.push(subject_id);
            }
        }
    }
    let num_subjects = subject_ids.len();

    // Assign content indices by first sighting.
    let mut content_index: HashMap<usize, usize> = HashMap::new();
    let mut content_ids: Vec<usize> = Vec::new();
    for dis in &dataset.dis_videos {
        content_index.entry(dis.content_id).or_insert_with(|| {
            content_ids.push(dis.content_id);
            content_ids.len() - 1
        });
    }
    let num_contents = content_ids.len();

    let scale = RatingScale::default();
    let mut tensor = OpinionTensor::empty(num_subjects, num_stimuli, num_contents, scale);
    tensor.subject_ids = subject_ids;

    // Path -> stimulus index, to resolve rho.
    let path_to_stimulus: HashMap<&str, usize> = dataset
        .dis_videos
        .iter()
        .enumerate()
        .map(|(e, dis)| (dis.path.as_str(), e))
        .collect();

    for (e, dis) in dataset.dis_videos.iter().enumerate() {
        tensor.content_map[e] = content_index[&dis.content_id];
        tensor.reference_map[e] = path_to_stimulus.get(dis.ref_path.as_str()).copied();

        for (subject_id, value) in dis.os.entries() {
            if value < scale.min || value > scale.max {
                return Err(Error::SchemaError(format!(
                    "opinion score {value} at stimulus {e}, subject '{subject_id}' is outside [{}, {}]",
                    scale.min, scale.max
                )));
            }
            let s = subject_index[&subject_id];
            tensor.set(s, e, Some(value));
        }
    }

    debug!(
        num_subjects,
        num_stimuli, num_contents, "opinion tensor built"
    );

    Ok(tensor)
}

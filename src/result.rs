//! Result record (§3): the output every model produces.

use std::collections::BTreeSet;

/// Per-stimulus/per-observer/per-content estimates produced by a model run.
/// Fields absent for a given model stay `None` (e.g. `observer_bias` is
/// `None` for `SubjectOblivious`, `content_ambiguity` is `None` unless
/// content is modeled).
#[derive(Debug, Clone, Default)]
pub struct ModelResult {
    pub quality_scores: Vec<f64>,
    pub quality_scores_std: Vec<f64>,

    pub observer_bias: Option<Vec<f64>>,
    pub observer_bias_std: Option<Vec<f64>>,

    pub observer_inconsistency: Option<Vec<f64>>,
    pub observer_inconsistency_std: Option<Vec<f64>>,

    pub content_ambiguity: Option<Vec<f64>>,
    pub content_ambiguity_std: Option<Vec<f64>>,

    pub reject_subjects: Option<BTreeSet<usize>>,

    /// Diagnostic output of the `PerSubject` aggregator: one row per
    /// subject, one column per stimulus, after whatever preprocessing
    /// (bias removal / z-scoring / dscore) was requested. `None` for
    /// every other model.
    pub per_subject_scores: Option<Vec<Vec<f64>>>,
}

impl ModelResult {
    #[must_use]
    pub fn num_stimuli(&self) -> usize {
        self.quality_scores.len()
    }
}

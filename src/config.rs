//! Model configuration & validation
//!
//! Plain value structs passed to each model's `run`, not a process-wide
//! `OnceLock` config — a model invocation here is a one-shot numerical
//! fit, not a long-lived service with a startup phase. Each config's
//! `validate()` raises its error kinds before any numerical work starts,
//! the same "catch it before it runs" shape used elsewhere in this crate.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Post-fit affine transform `x -> p1*x + p0`, applied to `quality_scores`
/// (and, with the scale factor only, to `quality_scores_std`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformFinal {
    pub p1: f64,
    pub p0: f64,
}

/// Which scheme the inconsistency update (§4.3 stage 3) uses. Both compute
/// the same closed-form MLE of `v[s]^2`; `Numerical` additionally cross-
/// checks it via central finite differences on the marginal log-likelihood,
/// which is slower but exercises a second code path useful for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientMethod {
    Original,
    Numerical,
}

impl Default for GradientMethod {
    fn default() -> Self {
        GradientMethod::Original
    }
}

/// Options shared by the descriptive aggregators (C2): MOS, DMOS, and their
/// combinator variants (Subjrej/Zscoring/Biasremv prefixes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveConfig {
    pub bias_removal: bool,
    pub subject_rejection: bool,
    pub zscore_mode: bool,
    pub dscore_mode: bool,
    pub normalize_final: bool,
    pub transform_final: Option<TransformFinal>,
}

impl DescriptiveConfig {
    /// No error kinds are reachable here: descriptive models accept every
    /// combination of their own flags. Kept as a symmetry point with
    /// `MleConfig::validate` and a hook for future constraints.
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Options for the maximum-likelihood estimator (C3) and its ablations.
///
/// `subject_rejection` is carried here (rather than omitted entirely) so
/// that requesting it raises the same `InvalidCombination` error a caller
/// would see from any other model, instead of a compile error — callers
/// building a config generically from user input (e.g. a CLI/JSON request)
/// need a uniform way to ask for a combination and be told *why* it's
/// rejected, not just have the field not exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MleConfig {
    pub dscore_mode: bool,
    pub zscore_mode: bool,
    pub use_log: bool,
    pub subject_rejection: bool,
    pub gradient_method: GradientMethod,
    pub normalize_final: bool,
    pub transform_final: Option<TransformFinal>,
    /// Convergence tolerance on the max relative parameter delta.
    pub tolerance: f64,
    /// Iteration cap before `DidNotConverge`.
    pub max_iterations: usize,
}

impl Default for MleConfig {
    fn default() -> Self {
        MleConfig {
            dscore_mode: false,
            zscore_mode: false,
            use_log: false,
            subject_rejection: false,
            gradient_method: GradientMethod::Original,
            normalize_final: false,
            transform_final: None,
            tolerance: 1e-8,
            max_iterations: 1000,
        }
    }
}

impl MleConfig {
    /// Subject rejection is never valid on an MLE model: fail fast rather
    /// than let it silently do nothing.
    pub fn validate(&self) -> Result<()> {
        if self.subject_rejection {
            return Err(Error::InvalidCombination(
                "subject_rejection is not supported by any MLE variant".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidCombination(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidCombination(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for the `LiveDmos` pipeline, which performs its own
/// DMOS mapping internally and so cannot compose with `dscore_mode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveDmosConfig {
    pub dscore_mode: bool,
    pub normalize_final: bool,
    pub transform_final: Option<TransformFinal>,
}

impl LiveDmosConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dscore_mode {
            return Err(Error::InvalidCombination(
                "dscore_mode is redundant on LiveDmos, which already performs its own DMOS mapping".to_string(),
            ));
        }
        Ok(())
    }
}

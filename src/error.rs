//! Crate-wide error type
//!
//! One flat enum rather than per-module errors: the crate is a single
//! cohesive numerical domain (opinion tensor in, result record out), not a
//! collection of loosely related subsystems, so a single `thiserror` enum
//! covering every failure kind keeps call sites simple.

use thiserror::Error;

/// All fatal failure modes surfaced to callers. Nothing is recovered
/// internally — every variant here propagates straight out of the model
/// that raised it.
#[derive(Debug, Error)]
pub enum Error {
    /// The input `Dataset` is malformed: missing fields, an opinion score
    /// outside the rating scale, inconsistent stimulus/observer indexing.
    #[error("malformed dataset: {0}")]
    SchemaError(String),

    /// A DMOS-family model needed `reference_map[stimulus]` but it was
    /// `None`.
    #[error("stimulus {stimulus} has no reference video required for DMOS")]
    MissingReference { stimulus: usize },

    /// A model configuration combination that is structurally unsupported,
    /// e.g. subject rejection requested on an MLE model, or `dscore_mode`
    /// requested on `LiveDmos` (which already performs its own DMOS
    /// mapping internally).
    #[error("invalid model configuration: {0}")]
    InvalidCombination(String),

    /// A subject or content does not carry enough observations to estimate
    /// its parameter (subject rejection requires finite variance over at
    /// least two ratings; std-error computation requires at least one).
    #[error("insufficient data for {0}")]
    InsufficientData(String),

    /// The fixed-point solver hit its iteration cap before the convergence
    /// tolerance was met.
    #[error("solver did not converge after {iterations} iterations (max relative delta {max_relative_delta:.3e}, tolerance {tolerance:.3e})")]
    DidNotConverge {
        iterations: usize,
        max_relative_delta: f64,
        tolerance: f64,
    },

    /// A NaN or infinite value appeared in an intermediate parameter that
    /// is supposed to stay finite.
    #[error("non-finite value encountered in {parameter} at index {index}")]
    NumericFailure { parameter: &'static str, index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

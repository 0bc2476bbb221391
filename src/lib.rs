//! sureal: subjective video-quality score aggregation
//!
//! Recovers per-stimulus quality, per-observer bias and inconsistency, and
//! per-content ambiguity from a partially-observed panel of subjective
//! video-quality ratings.
//!
//! ## Pipeline
//!
//! - **Opinion tensor** ([`tensor`]): materializes a dense `(observer,
//!   stimulus)` matrix from a [`dataset::Dataset`].
//! - **Descriptive aggregators** ([`descriptive`]): MOS, DMOS, bias
//!   removal, z-scoring, BT.500 subject rejection.
//! - **Maximum-likelihood estimator** ([`mle`]): the joint fixed-point
//!   solver and its ablations, plus the `LiveDmos` pipeline.
//! - **Post-processing** ([`postprocess`]): shared final normalize/
//!   transform steps.
//! - **Result emitter** ([`emitter`]): writes the fitted `groundtruth`
//!   back into the dataset's schema.
//! - **Perturbation wrappers** ([`perturb`]): test-fixture generators —
//!   missing-data injection, synthetic datasets, subject corruption.

pub mod config;
pub mod dataset;
pub mod descriptive;
pub mod emitter;
pub mod error;
pub mod mle;
pub mod perturb;
pub mod postprocess;
pub mod result;
pub mod stats;
pub mod tensor;

pub use config::{DescriptiveConfig, GradientMethod, LiveDmosConfig, MleConfig, TransformFinal};
pub use dataset::{AggregatedDataset, Dataset};
pub use error::{Error, Result};
pub use mle::MleVariant;
pub use result::ModelResult;
pub use tensor::{OpinionTensor, RatingScale};

//! External dataset interchange schema (C1 supplement)
//!
//! These are pure `serde` data types mirroring the dataset format described
//! the models consume. The crate never reads or writes files itself — loading a
//! `Dataset` from JSON/whatever format a caller prefers, and persisting an
//! `AggregatedDataset`, both stay the caller's responsibility. That keeps
//! the numerical core decoupled from any one storage format, the same way
//! `physics_engine` never touches a socket or a file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single rated opinion. Accepts either a bare number or a `{value, ...}`
/// record (extra keys on the detailed form, e.g. vendor-specific metadata,
/// are ignored by `serde` since this struct only names `value`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Plain(f64),
    Detailed { value: f64 },
}

impl Score {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Score::Plain(v) | Score::Detailed { value: v } => v,
        }
    }
}

/// The `os` field of a distorted-stimulus entry: either a positional list
/// (subject ids are `0..len`) or a map keyed by explicit subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OsField {
    List(Vec<Score>),
    Map(BTreeMap<String, Score>),
}

impl OsField {
    /// Subject-id/score pairs in a stable, deterministic order: list-style
    /// entries in positional order, map-style entries in sorted key order
    /// (JSON object key order is not a dependable source of "first
    /// sighting" order without an `IndexMap`, so this crate picks sorted
    /// order deliberately and documents it as such).
    pub fn entries(&self) -> Vec<(String, f64)> {
        match self {
            OsField::List(scores) => scores
                .iter()
                .enumerate()
                .map(|(i, s)| (i.to_string(), s.value()))
                .collect(),
            OsField::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.value())).collect(),
        }
    }
}

/// An undistorted reference video, identified by content and file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefVideoEntry {
    pub content_id: usize,
    pub path: String,
}

/// A distorted stimulus: the unit of quality estimation (one element of E).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisVideoEntry {
    pub content_id: usize,
    pub asset_id: usize,
    pub ref_path: String,
    pub path: String,
    pub os: OsField,
}

/// The full input dataset: a panel of observers' opinions over a set of
/// distorted stimuli, grouped by content, with opaque pass-through fields
/// the core never interprets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yuv_fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resampling_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_height: Option<u32>,
    pub ref_videos: Vec<RefVideoEntry>,
    pub dis_videos: Vec<DisVideoEntry>,
}

/// A stimulus entry in the emitted (aggregated) dataset: same shape as
/// `DisVideoEntry` but `os` has been replaced by the fitted ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedDisVideoEntry {
    pub content_id: usize,
    pub asset_id: usize,
    pub ref_path: String,
    pub path: String,
    pub groundtruth: f64,
    pub groundtruth_std: f64,
}

/// The emitted dataset record (C5): the input schema with `os` removed and
/// `groundtruth`/`groundtruth_std` added per stimulus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedDataset {
    pub dataset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yuv_fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resampling_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_height: Option<u32>,
    pub ref_videos: Vec<RefVideoEntry>,
    pub dis_videos: Vec<AggregatedDisVideoEntry>,
}

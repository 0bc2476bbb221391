//! Result emitter (C5)
//!
//! Writes an `AggregatedDataset` record mirroring the input schema with
//! `os` replaced by `groundtruth`/`groundtruth_std`.

use crate::dataset::{AggregatedDataset, AggregatedDisVideoEntry, Dataset};
use crate::error::{Error, Result};
use crate::result::ModelResult;

/// Pair each `dis_videos` entry with its fitted `quality_scores`/`_std`,
/// dropping `os` and copying every other field verbatim. `result` must
/// carry one quality score per stimulus in `dataset.dis_videos`, in the
/// same stimulus-index order `tensor::build` assigned.
pub fn to_aggregated_dataset(dataset: &Dataset, result: &ModelResult) -> Result<AggregatedDataset> {
    if result.quality_scores.len() != dataset.dis_videos.len() {
        return Err(Error::SchemaError(format!(
            "result has {} quality scores but dataset has {} stimuli",
            result.quality_scores.len(),
            dataset.dis_videos.len()
        )));
    }

    let dis_videos = dataset
        .dis_videos
        .iter()
        .zip(result.quality_scores.iter())
        .zip(result.quality_scores_std.iter())
        .map(|((dis, &groundtruth), &groundtruth_std)| AggregatedDisVideoEntry {
            content_id: dis.content_id,
            asset_id: dis.asset_id,
            ref_path: dis.ref_path.clone(),
            path: dis.path.clone(),
            groundtruth,
            groundtruth_std,
        })
        .collect();

    Ok(AggregatedDataset {
        dataset_name: dataset.dataset_name.clone(),
        yuv_fmt: dataset.yuv_fmt.clone(),
        width: dataset.width,
        height: dataset.height,
        resampling_type: dataset.resampling_type.clone(),
        quality_width: dataset.quality_width,
        quality_height: dataset.quality_height,
        ref_videos: dataset.ref_videos.clone(),
        dis_videos,
    })
}

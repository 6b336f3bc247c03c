//! Frame chains: paint one frame, then propagate it through a sequence of poses.
//!
//! Each step transfers from the most recent good output onto the next pose, so
//! `mask_n -> mask_{n+1}` pairs line up frame after frame. While one step computes,
//! the inputs of the following step are fetched.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::assets::AssetLoader;
use crate::job::{load_frame, Assets, FrameInputs, JobError};
use crate::silhouette::{mask_silhouette, SilhouetteOptions};
use crate::transfer::{self, TransferOptions};

/// One pose in a chain. The source map of a step is the region map of the pose the
/// previous step produced. After a failed step the chain substitutes the map of the
/// last good frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    pub name: String,
    pub source_map: String,
    pub target: String,
    pub target_map: String,
}

/// Silhouette pass applied to the initial raster before the first transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreMask {
    /// Region map of the initial painted pose
    pub map: String,
    pub silhouette: SilhouetteOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainOptions {
    pub transfer: TransferOptions,
    /// Extra attempts for a step whose inputs fail to load
    pub retries: u8,
    pub pre_mask: Option<PreMask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FrameStatus {
    Done,
    Failed { error: String },
}

/// Result of one chain step.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub name: String,
    pub status: FrameStatus,
    /// Produced frame, `None` when the step failed
    pub output: Option<RgbaImage>,
}

impl FrameOutcome {
    pub fn is_done(&self) -> bool {
        self.status == FrameStatus::Done
    }
}

/// Outcomes of every step, in step order.
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub frames: Vec<FrameOutcome>,
    last: RgbaImage,
}

impl ChainReport {
    pub fn successes(&self) -> impl Iterator<Item = &FrameOutcome> {
        self.frames.iter().filter(|f| f.is_done())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FrameOutcome> {
        self.frames.iter().filter(|f| !f.is_done())
    }

    pub fn all_done(&self) -> bool {
        self.frames.iter().all(FrameOutcome::is_done)
    }

    /// The last good frame: the output of the last successful step, or the initial
    /// raster when none succeeded.
    pub fn last_frame(&self) -> &RgbaImage {
        &self.last
    }
}

/// Run `steps` in order starting from `initial`.
///
/// A failed step is recorded and skipped; the next step paints from the last good
/// output, sampled through that output's region map. Only a failing pre-mask aborts
/// the whole chain.
#[tracing::instrument(skip_all, fields(steps = steps.len()))]
pub fn run_chain<L: AssetLoader>(
    assets: &Assets<'_, L>,
    initial: RgbaImage,
    steps: &[ChainStep],
    options: &ChainOptions,
) -> Result<ChainReport, JobError> {
    let mut source = match &options.pre_mask {
        Some(pre) => {
            let map = assets.region_map(&pre.map)?;
            mask_silhouette(&initial, &map, &pre.silhouette)?
        }
        None => initial,
    };
    // Region map of `source`, and whether the step before the current one failed
    let mut source_map = steps.first().map_or("", |s| s.source_map.as_str());
    let mut resuming = false;

    let mut frames = Vec::with_capacity(steps.len());
    let mut prefetched: Option<Result<FrameInputs, JobError>> = None;

    for (index, step) in steps.iter().enumerate() {
        let mut current = match prefetched.take() {
            Some(inputs) => inputs,
            None => load_step(assets, step, options.retries),
        };
        if resuming && step.source_map != source_map {
            tracing::debug!(step = %step.name, map = source_map, "resuming from last good frame");
            current = current.and_then(|mut inputs| {
                inputs.source_map = retry(step, options.retries, || assets.region_map(source_map))?;
                Ok(inputs)
            });
        }
        let next = steps.get(index + 1);

        let (result, next_inputs) = rayon::join(
            || {
                current.and_then(|inputs| {
                    transfer::run(&inputs.job(&source), &options.transfer).map_err(JobError::from)
                })
            },
            || next.map(|s| load_step(assets, s, options.retries)),
        );
        prefetched = next_inputs;

        match result {
            Ok(frame) => {
                tracing::info!(step = %step.name, "frame done");
                source = frame.clone();
                source_map = &step.target_map;
                resuming = false;
                frames.push(FrameOutcome { name: step.name.clone(), status: FrameStatus::Done, output: Some(frame) });
            }
            Err(e) => {
                tracing::warn!(step = %step.name, error = %e, "frame failed, continuing from last good frame");
                resuming = true;
                frames.push(FrameOutcome {
                    name: step.name.clone(),
                    status: FrameStatus::Failed { error: e.to_string() },
                    output: None,
                });
            }
        }
    }

    Ok(ChainReport { frames, last: source })
}

fn load_step<L: AssetLoader>(
    assets: &Assets<'_, L>,
    step: &ChainStep,
    retries: u8,
) -> Result<FrameInputs, JobError> {
    retry(step, retries, || load_frame(assets, &step.source_map, &step.target, &step.target_map))
}

fn retry<T>(
    step: &ChainStep,
    retries: u8,
    mut load: impl FnMut() -> Result<T, JobError>,
) -> Result<T, JobError> {
    let mut attempt = 0;
    loop {
        match load() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                attempt += 1;
                tracing::debug!(step = %step.name, attempt, error = %e, "retrying load");
            }
            Err(e) => return Err(e),
        }
    }
}

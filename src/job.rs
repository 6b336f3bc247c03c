//! Transfer jobs built from asset locations.
//!
//! A job names four assets: the painted source raster, its region map, the target pose's
//! base raster and the target region map. The four fetches are independent, so they are
//! issued concurrently and the transfer starts once all of them have resolved. A failed
//! fetch aborts only its own job.

use std::sync::Arc;

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{AssetCache, AssetLoadError, AssetLoader};
use crate::region_map::{RegionMap, RegionMapError};
use crate::transfer::{self, TransferError, TransferJob, TransferOptions};

/// Error type for a single job
#[derive(Debug, Error)]
pub enum JobError {
    /// An input could not be fetched or decoded
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    /// A region map resource is malformed
    #[error("invalid region map '{location}': {source}")]
    RegionMap {
        location: String,
        #[source]
        source: RegionMapError,
    },
    /// The inputs were loaded but do not fit together
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Locations of the four inputs of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Painted source raster
    pub source: String,
    /// Region map of the painted pose
    pub source_map: String,
    /// Base raster of the target pose
    pub target: String,
    /// Region map of the target pose
    pub target_map: String,
}

/// A loader paired with an optional caller-owned cache.
#[derive(Debug, Clone, Copy)]
pub struct Assets<'a, L> {
    loader: &'a L,
    cache: Option<&'a AssetCache>,
}

impl<'a, L: AssetLoader> Assets<'a, L> {
    /// Fetch straight from `loader`, without caching.
    pub fn new(loader: &'a L) -> Self {
        Self { loader, cache: None }
    }

    /// Fetch through `cache`, filling it on misses.
    pub fn cached(loader: &'a L, cache: &'a AssetCache) -> Self {
        Self { loader, cache: Some(cache) }
    }

    pub fn loader(&self) -> &'a L {
        self.loader
    }

    /// Decoded raster at `location`.
    pub fn raster(&self, location: &str) -> Result<Arc<RgbaImage>, JobError> {
        if let Some(hit) = self.cache.and_then(|c| c.raster(location)) {
            return Ok(hit);
        }
        let image = Arc::new(self.loader.load_raster(location)?);
        if let Some(cache) = self.cache {
            cache.insert_raster(location, Arc::clone(&image));
        }
        Ok(image)
    }

    /// Parsed region map at `location`.
    pub fn region_map(&self, location: &str) -> Result<Arc<RegionMap>, JobError> {
        if let Some(hit) = self.cache.and_then(|c| c.region_map(location)) {
            return Ok(hit);
        }
        let text = self.loader.load_text(location)?;
        let map = RegionMap::parse(&text)
            .map_err(|source| JobError::RegionMap { location: location.to_string(), source })?;
        let map = Arc::new(map);
        if let Some(cache) = self.cache {
            cache.insert_region_map(location, Arc::clone(&map));
        }
        Ok(map)
    }
}

/// Everything a job needs besides the source raster.
#[derive(Debug, Clone)]
pub struct FrameInputs {
    pub source_map: Arc<RegionMap>,
    pub target_map: Arc<RegionMap>,
    pub target_base: Arc<RgbaImage>,
}

impl FrameInputs {
    /// Borrow these inputs as a job painting from `source`.
    pub fn job<'a>(&'a self, source: &'a RgbaImage) -> TransferJob<'a> {
        TransferJob::new(source, &self.source_map, &self.target_map, &self.target_base)
    }
}

/// All four inputs of a job, resident in memory.
#[derive(Debug, Clone)]
pub struct LoadedJob {
    pub source: Arc<RgbaImage>,
    pub frame: FrameInputs,
}

impl LoadedJob {
    pub fn as_job(&self) -> TransferJob<'_> {
        self.frame.job(&self.source)
    }

    pub fn run(&self, options: &TransferOptions) -> Result<RgbaImage, TransferError> {
        transfer::run(&self.as_job(), options)
    }
}

/// Fetch a source map, target map and target raster concurrently.
///
/// On failure the first error in argument order is returned.
pub fn load_frame<L: AssetLoader>(
    assets: &Assets<'_, L>,
    source_map: &str,
    target: &str,
    target_map: &str,
) -> Result<FrameInputs, JobError> {
    let (source_map, (target_base, target_map)) = rayon::join(
        || assets.region_map(source_map),
        || rayon::join(|| assets.raster(target), || assets.region_map(target_map)),
    );
    let source_map = source_map?;
    let target_base = target_base?;
    let target_map = target_map?;
    Ok(FrameInputs { source_map, target_map, target_base })
}

/// Fetch all four inputs of `spec` concurrently.
///
/// Returns once every fetch has resolved. On failure the first error in the order
/// source, source map, target, target map is returned.
#[tracing::instrument(skip(assets), fields(pose = %spec.target))]
pub fn load_job<L: AssetLoader>(assets: &Assets<'_, L>, spec: &JobSpec) -> Result<LoadedJob, JobError> {
    let (source, frame) = rayon::join(
        || assets.raster(&spec.source),
        || load_frame(assets, &spec.source_map, &spec.target, &spec.target_map),
    );
    let source = source?;
    let frame = frame?;
    Ok(LoadedJob { source, frame })
}

/// Load and run one job.
pub fn run_job<L: AssetLoader>(
    assets: &Assets<'_, L>,
    spec: &JobSpec,
    options: &TransferOptions,
) -> Result<RgbaImage, JobError> {
    let loaded = load_job(assets, spec)?;
    Ok(loaded.run(options)?)
}

/// Run independent jobs in parallel. Each result belongs to the job at the same index;
/// one job failing has no effect on the others.
pub fn run_jobs<L: AssetLoader>(
    assets: &Assets<'_, L>,
    specs: &[JobSpec],
    options: &TransferOptions,
) -> Vec<Result<RgbaImage, JobError>> {
    specs
        .par_iter()
        .map(|spec| {
            let result = run_job(assets, spec, options);
            if let Err(e) = &result {
                tracing::warn!(pose = %spec.target, error = %e, "job failed");
            }
            result
        })
        .collect()
}

//! Block transfer engine: carry painted colors from one pose onto another.
//!
//! For every pixel of the target pose's region map:
//! - `-1` emits a fully transparent pixel
//! - `0` copies the target base pixel verbatim (outlines, background)
//! - a block ID resamples the source raster through the canonical grid, landing on the
//!   corresponding spot of the same block in the source pose
//!
//! Missing blocks and out-of-range samples fall back to the target base pixel instead
//! of failing the job, so a job always yields a renderable frame.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::average::transfer_average;
use crate::bbox::BoundsIndex;
use crate::mapping::{CanonicalMapper, Rounding};
use crate::raster::{opaque, TRANSPARENT};
use crate::region_map::{BlockId, Cell, RegionMap};

/// Error type for transfer jobs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// A region map does not have the dimensions of the raster it annotates
    #[error("{what}: region map is {}x{} but raster is {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    DimensionMismatch { what: &'static str, expected: (u32, u32), actual: (u32, u32) },
}

/// How block pixels are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Per-pixel resampling through the canonical grid.
    #[default]
    Sample,
    /// One flat average color per block.
    Average,
}

/// Knobs of a transfer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub mode: TransferMode,
    pub rounding: Rounding,
}

/// The four read-only inputs of one transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferJob<'a> {
    /// Painted pose the colors come from.
    pub source: &'a RgbaImage,
    /// Region map of the painted pose.
    pub source_map: &'a RegionMap,
    /// Region map of the pose being colored.
    pub target_map: &'a RegionMap,
    /// Uncolored art of the target pose; decides the output size.
    pub target_base: &'a RgbaImage,
}

impl<'a> TransferJob<'a> {
    pub fn new(
        source: &'a RgbaImage,
        source_map: &'a RegionMap,
        target_map: &'a RegionMap,
        target_base: &'a RgbaImage,
    ) -> Self {
        Self { source, source_map, target_map, target_base }
    }

    /// Check that each region map matches the raster it annotates.
    pub fn validate(&self) -> Result<(), TransferError> {
        check_dimensions("source", self.source_map, self.source)?;
        check_dimensions("target", self.target_map, self.target_base)
    }
}

/// Fail with [`TransferError::DimensionMismatch`] unless `map` and `raster` have equal dimensions.
pub fn check_dimensions(
    what: &'static str,
    map: &RegionMap,
    raster: &RgbaImage,
) -> Result<(), TransferError> {
    if map.dimensions() != raster.dimensions() {
        return Err(TransferError::DimensionMismatch {
            what,
            expected: raster.dimensions(),
            actual: map.dimensions(),
        });
    }
    Ok(())
}

/// Run `job` in the mode selected by `options`.
pub fn run(job: &TransferJob<'_>, options: &TransferOptions) -> Result<RgbaImage, TransferError> {
    match options.mode {
        TransferMode::Sample => transfer_blocks(job, &CanonicalMapper::new(options.rounding)),
        TransferMode::Average => transfer_average(job),
    }
}

/// Resample the source pose's colors onto the target pose, block by block.
///
/// The output has exactly the dimensions of `job.target_base`. Running the same job
/// twice yields byte-identical output.
#[tracing::instrument(skip_all, fields(width = job.target_base.width(), height = job.target_base.height()))]
pub fn transfer_blocks(
    job: &TransferJob<'_>,
    mapper: &CanonicalMapper,
) -> Result<RgbaImage, TransferError> {
    job.validate()?;

    let source_bounds = BoundsIndex::build(job.source_map);
    let target_bounds = BoundsIndex::build(job.target_map);
    log_missing_blocks(job.target_map, &source_bounds);

    let (src_w, src_h) = job.source.dimensions();
    let mut out_of_range = 0usize;

    let out = compose(job, |id, x, y| {
        let (Ok(src_box), Ok(dst_box)) = (source_bounds.get(id), target_bounds.get(id)) else {
            return None;
        };
        let coord = mapper.to_canonical(y as i64, x as i64, &dst_box);
        let (sy, sx) = mapper.from_canonical(coord, &src_box);
        if sy >= 0 && sx >= 0 && (sy as u32) < src_h && (sx as u32) < src_w {
            Some(opaque(*job.source.get_pixel(sx as u32, sy as u32)))
        } else {
            out_of_range += 1;
            None
        }
    });

    if out_of_range > 0 {
        tracing::debug!(pixels = out_of_range, "samples outside the source raster, kept base pixels");
    }
    Ok(out)
}

/// Build the output raster by dispatching every target pixel on its region map cell.
///
/// `block_color` returns the color of a block pixel, or `None` to fall back to the base pixel.
pub(crate) fn compose<F>(job: &TransferJob<'_>, mut block_color: F) -> RgbaImage
where
    F: FnMut(BlockId, u32, u32) -> Option<Rgba<u8>>,
{
    let (width, height) = job.target_base.dimensions();
    let mut out = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let base = *job.target_base.get_pixel(x, y);
            let pixel = match job.target_map.cell(x, y) {
                Cell::Transparent => TRANSPARENT,
                Cell::Keep => base,
                Cell::Block(id) => block_color(id, x, y).unwrap_or(base),
            };
            out.put_pixel(x, y, pixel);
        }
    }

    out
}

fn log_missing_blocks(target_map: &RegionMap, source_bounds: &BoundsIndex) {
    let missing: Vec<BlockId> = target_map
        .block_ids()
        .into_iter()
        .filter(|id| source_bounds.get(*id).is_err())
        .collect();
    if !missing.is_empty() {
        tracing::debug!(?missing, "blocks absent from the source map, using base pixels");
    }
}

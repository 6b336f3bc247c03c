//! Average-color variant: fill each block with one flat color.
//!
//! Structurally the same as [`crate::transfer::transfer_blocks`], but every block pixel of the
//! target takes the floor-averaged RGB of all source pixels carrying the same block ID.

use std::collections::BTreeMap;

use image::{Rgb, Rgba, RgbaImage};

use crate::region_map::{BlockId, RegionMap};
use crate::transfer::{compose, TransferError, TransferJob};

/// Floor-averaged RGB of every `source` pixel whose `source_map` value equals `id`.
///
/// Alpha is ignored. Returns `None` when no source pixel carries `id`.
pub fn average_block_color(source_map: &RegionMap, source: &RgbaImage, id: BlockId) -> Option<Rgb<u8>> {
    let mut sums = ColorSum::default();
    for (x, y, value) in source_map.enumerate() {
        if value > 0 && value as BlockId == id {
            sums.add(source.get_pixel(x, y));
        }
    }
    sums.average()
}

/// Average colors of `ids` in one pass over the source. IDs with no source pixels are omitted.
pub fn average_block_colors(
    source_map: &RegionMap,
    source: &RgbaImage,
    ids: impl IntoIterator<Item = BlockId>,
) -> BTreeMap<BlockId, Rgb<u8>> {
    let mut sums: BTreeMap<BlockId, ColorSum> =
        ids.into_iter().map(|id| (id, ColorSum::default())).collect();

    for (x, y, value) in source_map.enumerate() {
        if value <= 0 {
            continue;
        }
        if let Some(sum) = sums.get_mut(&(value as BlockId)) {
            sum.add(source.get_pixel(x, y));
        }
    }

    sums.into_iter().filter_map(|(id, sum)| sum.average().map(|rgb| (id, rgb))).collect()
}

/// Fill every target block with its average source color.
///
/// `-1` and `0` cells follow the same rules as the sampling engine; blocks missing from the
/// source keep the target base pixel.
#[tracing::instrument(skip_all, fields(width = job.target_base.width(), height = job.target_base.height()))]
pub fn transfer_average(job: &TransferJob<'_>) -> Result<RgbaImage, TransferError> {
    job.validate()?;

    let target_ids = job.target_map.block_ids();
    let lut = average_block_colors(job.source_map, job.source, target_ids.iter().copied());
    if lut.len() < target_ids.len() {
        let missing: Vec<BlockId> = target_ids.into_iter().filter(|id| !lut.contains_key(id)).collect();
        tracing::debug!(?missing, "blocks absent from the source map, using base pixels");
    }

    Ok(compose(job, |id, _, _| lut.get(&id).map(|&Rgb([r, g, b])| Rgba([r, g, b, 255]))))
}

#[derive(Debug, Default, Clone, Copy)]
struct ColorSum {
    r: u64,
    g: u64,
    b: u64,
    count: u64,
}

impl ColorSum {
    fn add(&mut self, pixel: &Rgba<u8>) {
        self.r += pixel[0] as u64;
        self.g += pixel[1] as u64;
        self.b += pixel[2] as u64;
        self.count += 1;
    }

    fn average(&self) -> Option<Rgb<u8>> {
        if self.count == 0 {
            return None;
        }
        Some(Rgb([
            (self.r / self.count) as u8,
            (self.g / self.count) as u8,
            (self.b / self.count) as u8,
        ]))
    }
}

//! Bounding boxes of blocks inside a region map.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::region_map::{BlockId, RegionMap};

/// A block ID with no pixels in the map it was looked up in.
///
/// The transfer engines recover from this locally; inspection callers may surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no pixels found for block {id}")]
pub struct RegionNotFound {
    pub id: BlockId,
}

/// Tightest rectangle containing every pixel of one block. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub xmin: u32,
    pub xmax: u32,
    pub ymin: u32,
    pub ymax: u32,
}

impl BoundingBox {
    /// Box covering a single pixel.
    pub fn point(x: u32, y: u32) -> Self {
        Self { xmin: x, xmax: x, ymin: y, ymax: y }
    }

    /// Grow to include `(x, y)`.
    pub fn include(&mut self, x: u32, y: u32) {
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
    }

    /// Whether `(x, y)` lies inside the box (edges included).
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.xmin as i64 && x <= self.xmax as i64 && y >= self.ymin as i64 && y <= self.ymax as i64
    }

    /// Width in pixels (`xmax - xmin + 1`).
    pub fn width(&self) -> u32 {
        self.xmax - self.xmin + 1
    }

    /// Height in pixels (`ymax - ymin + 1`).
    pub fn height(&self) -> u32 {
        self.ymax - self.ymin + 1
    }
}

/// Scan every cell of `map` and return the box spanning all cells equal to `id`.
pub fn compute_bounding_box(map: &RegionMap, id: BlockId) -> Result<BoundingBox, RegionNotFound> {
    let mut bbox: Option<BoundingBox> = None;
    for (x, y, value) in map.enumerate() {
        if value > 0 && value as BlockId == id {
            match bbox.as_mut() {
                Some(b) => b.include(x, y),
                None => bbox = Some(BoundingBox::point(x, y)),
            }
        }
    }
    bbox.ok_or(RegionNotFound { id })
}

/// Box and pixel count of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockBounds {
    pub bbox: BoundingBox,
    pub pixel_count: usize,
}

/// Every block's bounding box in one map, computed in a single pass.
///
/// Equivalent to calling [`compute_bounding_box`] once per ID, without rescanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundsIndex {
    blocks: BTreeMap<BlockId, BlockBounds>,
}

impl BoundsIndex {
    /// Index all positive IDs of `map`.
    pub fn build(map: &RegionMap) -> Self {
        let mut blocks: BTreeMap<BlockId, BlockBounds> = BTreeMap::new();
        for (x, y, value) in map.enumerate() {
            if value <= 0 {
                continue;
            }
            blocks
                .entry(value as BlockId)
                .and_modify(|b| {
                    b.bbox.include(x, y);
                    b.pixel_count += 1;
                })
                .or_insert(BlockBounds { bbox: BoundingBox::point(x, y), pixel_count: 1 });
        }
        Self { blocks }
    }

    /// Bounding box of `id`.
    pub fn get(&self, id: BlockId) -> Result<BoundingBox, RegionNotFound> {
        self.blocks.get(&id).map(|b| b.bbox).ok_or(RegionNotFound { id })
    }

    /// Box and pixel count of `id`, if present.
    pub fn bounds(&self, id: BlockId) -> Option<&BlockBounds> {
        self.blocks.get(&id)
    }

    /// Blocks in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockBounds)> {
        self.blocks.iter().map(|(id, b)| (*id, b))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(text: &str) -> RegionMap {
        RegionMap::parse(text).unwrap()
    }

    #[test]
    fn test_compute_bounding_box() {
        let m = map("0,0,0,0\n0,2,2,0\n0,0,2,0\n0,0,0,0");
        let bbox = compute_bounding_box(&m, 2).unwrap();
        assert_eq!(bbox, BoundingBox { xmin: 1, xmax: 2, ymin: 1, ymax: 2 });
        assert_eq!(bbox.width(), 2);
        assert_eq!(bbox.height(), 2);
    }

    #[test]
    fn test_compute_bounding_box_disjoint_pixels() {
        let m = map("3,0,0\n0,0,0\n0,0,3");
        let bbox = compute_bounding_box(&m, 3).unwrap();
        assert_eq!(bbox, BoundingBox { xmin: 0, xmax: 2, ymin: 0, ymax: 2 });
    }

    #[test]
    fn test_compute_bounding_box_single_pixel() {
        let m = map("0,0\n0,5");
        assert_eq!(compute_bounding_box(&m, 5).unwrap(), BoundingBox::point(1, 1));
    }

    #[test]
    fn test_compute_bounding_box_missing() {
        let m = map("0,1\n1,-1");
        assert_eq!(compute_bounding_box(&m, 7), Err(RegionNotFound { id: 7 }));
    }

    #[test]
    fn test_region_not_found_message() {
        assert_eq!(RegionNotFound { id: 4 }.to_string(), "no pixels found for block 4");
    }

    #[test]
    fn test_bounds_index_matches_per_id_scan() {
        let m = map("1,1,0,2\n-1,1,2,2\n3,0,0,2\n3,3,-1,-1");
        let index = BoundsIndex::build(&m);
        assert_eq!(index.len(), 3);
        for id in m.block_ids() {
            assert_eq!(index.get(id), compute_bounding_box(&m, id));
        }
        assert_eq!(index.bounds(2).unwrap().pixel_count, 4);
        assert_eq!(index.get(9), Err(RegionNotFound { id: 9 }));
    }

    #[test]
    fn test_bounds_index_ignores_non_blocks() {
        let m = map("-1,0\n0,-1");
        assert!(BoundsIndex::build(&m).is_empty());
    }

    #[test]
    fn test_contains() {
        let b = BoundingBox { xmin: 1, xmax: 3, ymin: 2, ymax: 2 };
        assert!(b.contains(1, 2));
        assert!(b.contains(3, 2));
        assert!(!b.contains(0, 2));
        assert!(!b.contains(2, 3));
    }
}

//! Normalized coordinate mapping between a block's bounding box and a fixed canonical grid.
//!
//! A point inside a block is expressed as its position on a 100x100 grid stretched over
//! the block's bounding box. Mapping a target-pose point onto the grid and back out through
//! the source pose's box finds "the same spot" on the corresponding body part.
//!
//! The mapping is lossy: rounding makes it a deterministic pair of functions, not a
//! bijection, but a point taken through the grid and back always stays inside its box.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Side length of the canonical grid.
pub const CANONICAL_SIZE: u32 = 100;

const CANONICAL_MAX: f64 = (CANONICAL_SIZE - 1) as f64;

/// Tie-breaking used when a scaled coordinate falls between pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Nearest integer, halves rounded up.
    #[default]
    Round,
    /// Round toward negative infinity.
    Floor,
}

impl Rounding {
    /// Apply the rule to `v`.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            // Halves go up, not away from zero
            Rounding::Round => (v + 0.5).floor(),
            Rounding::Floor => v.floor(),
        }
    }
}

/// A point on the canonical grid, each component in `0..=99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalCoord {
    pub ny: u32,
    pub nx: u32,
}

/// Maps points between bounding boxes and the canonical grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalMapper {
    rounding: Rounding,
}

impl CanonicalMapper {
    pub fn new(rounding: Rounding) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Normalize `(y, x)` inside `bbox` onto the canonical grid.
    ///
    /// Points outside the box are clamped to the grid edge.
    pub fn to_canonical(&self, y: i64, x: i64, bbox: &BoundingBox) -> CanonicalCoord {
        let (height, width) = extent(bbox);
        let y_norm = (y - bbox.ymin as i64) as f64 / height;
        let x_norm = (x - bbox.xmin as i64) as f64 / width;
        CanonicalCoord { ny: self.to_grid(y_norm), nx: self.to_grid(x_norm) }
    }

    /// Project a canonical point back into `bbox`, returning `(y, x)`.
    pub fn from_canonical(&self, coord: CanonicalCoord, bbox: &BoundingBox) -> (i64, i64) {
        let (height, width) = extent(bbox);
        let y = self.rounding.apply(bbox.ymin as f64 + (coord.ny as f64 / CANONICAL_MAX) * height);
        let x = self.rounding.apply(bbox.xmin as f64 + (coord.nx as f64 / CANONICAL_MAX) * width);
        (y as i64, x as i64)
    }

    /// Map `(y, x)` from one box to the corresponding point of another, via the grid.
    pub fn map_between(&self, y: i64, x: i64, from: &BoundingBox, to: &BoundingBox) -> (i64, i64) {
        self.from_canonical(self.to_canonical(y, x, from), to)
    }

    fn to_grid(&self, norm: f64) -> u32 {
        self.rounding.apply(norm * CANONICAL_MAX).clamp(0.0, CANONICAL_MAX) as u32
    }
}

/// [`CanonicalMapper::to_canonical`] with the default rounding.
pub fn to_canonical(y: i64, x: i64, bbox: &BoundingBox) -> CanonicalCoord {
    CanonicalMapper::default().to_canonical(y, x, bbox)
}

/// [`CanonicalMapper::from_canonical`] with the default rounding.
pub fn from_canonical(coord: CanonicalCoord, bbox: &BoundingBox) -> (i64, i64) {
    CanonicalMapper::default().from_canonical(coord, bbox)
}

/// `(height, width)` of the box as spans, at least 1 so degenerate boxes never divide by zero.
fn extent(bbox: &BoundingBox) -> (f64, f64) {
    let height = (bbox.ymax - bbox.ymin).max(1) as f64;
    let width = (bbox.xmax - bbox.xmin).max(1) as f64;
    (height, width)
}

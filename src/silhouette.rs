//! Silhouette masking: trim paint that bled outside a character's outline.
//!
//! An "inside" grid is built from the region map, optionally eroded inward a few pixels,
//! then applied to the painted raster: outside pixels become transparent, inside pixels
//! become opaque with their color unchanged.

use std::collections::BTreeSet;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::raster::{opaque, TRANSPARENT};
use crate::region_map::{BlockId, RegionMap};
use crate::transfer::{check_dimensions, TransferError};

/// Maximum number of erosion passes.
pub const MAX_ERODE_PASSES: u8 = 3;

/// Which region map values count as inside the character.
///
/// Written the same way on the command line and in config files: `positive`,
/// `non-zero`, or `blocks:1,2,5`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeepRule {
    /// Every block (`id > 0`).
    #[default]
    Positive,
    /// Any non-zero value (`id != 0`), the rule storyboard overlays use.
    NonZero,
    /// Only the listed blocks.
    Blocks(BTreeSet<BlockId>),
}

impl KeepRule {
    /// Whether a cell with this raw value is inside.
    pub fn keeps(&self, value: i32) -> bool {
        match self {
            KeepRule::Positive => value > 0,
            KeepRule::NonZero => value != 0,
            KeepRule::Blocks(ids) => value > 0 && ids.contains(&(value as BlockId)),
        }
    }
}

impl std::str::FromStr for KeepRule {
    type Err = String;

    /// Parse `positive`, `non-zero`, or `blocks:1,2,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "positive" => Ok(KeepRule::Positive),
            "non-zero" | "nonzero" => Ok(KeepRule::NonZero),
            other => {
                let list = other.strip_prefix("blocks:").ok_or_else(|| {
                    format!("unknown keep rule '{}' (expected positive, non-zero, or blocks:ID,...)", other)
                })?;
                let ids = list
                    .split(',')
                    .map(|t| t.trim().parse::<BlockId>().map_err(|_| format!("invalid block ID '{}'", t.trim())))
                    .collect::<Result<BTreeSet<_>, _>>()?;
                if ids.contains(&0) {
                    return Err("block IDs must be positive".to_string());
                }
                Ok(KeepRule::Blocks(ids))
            }
        }
    }
}

impl std::fmt::Display for KeepRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeepRule::Positive => f.write_str("positive"),
            KeepRule::NonZero => f.write_str("non-zero"),
            KeepRule::Blocks(ids) => {
                let list: Vec<String> = ids.iter().map(ToString::to_string).collect();
                write!(f, "blocks:{}", list.join(","))
            }
        }
    }
}

impl Serialize for KeepRule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeepRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Options for [`mask_silhouette`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilhouetteOptions {
    pub keep: KeepRule,
    /// Inward erosion passes, capped at [`MAX_ERODE_PASSES`].
    pub erode: u8,
}

impl Default for SilhouetteOptions {
    fn default() -> Self {
        Self { keep: KeepRule::Positive, erode: 1 }
    }
}

/// A boolean grid over a canvas, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsideMask {
    cells: Vec<bool>,
    width: u32,
    height: u32,
}

impl InsideMask {
    /// `inside[y][x] = keep(map[y][x])`.
    pub fn from_map(map: &RegionMap, keep: &KeepRule) -> Self {
        let cells = map.enumerate().map(|(_, _, v)| keep.keeps(v)).collect();
        Self { cells, width: map.width(), height: map.height() }
    }

    /// Build from a predicate over coordinates.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { cells, width, height }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Number of inside cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// One erosion pass with a 3x3 window.
    ///
    /// A cell stays inside only if it and all 8 neighbors were inside. Neighbors beyond the
    /// canvas count as outside, so the mask only ever shrinks.
    pub fn eroded(&self) -> Self {
        let (w, h) = (self.width as i64, self.height as i64);
        let inside = |x: i64, y: i64| -> bool {
            x >= 0 && y >= 0 && x < w && y < h && self.cells[(y * w + x) as usize]
        };

        let cells = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| (-1..=1).all(|dy| (-1..=1).all(|dx| inside(x + dx, y + dy))))
            .collect();

        Self { cells, width: self.width, height: self.height }
    }

    /// Erode `passes` times (capped at [`MAX_ERODE_PASSES`]).
    pub fn erode(self, passes: u8) -> Self {
        (0..passes.min(MAX_ERODE_PASSES)).fold(self, |mask, _| mask.eroded())
    }
}

/// Trim `painted` to the inside of the silhouette described by `map`.
///
/// Fails with [`TransferError::DimensionMismatch`] if the map and raster sizes differ.
#[tracing::instrument(skip(painted, map), fields(width = painted.width(), height = painted.height()))]
pub fn mask_silhouette(
    painted: &RgbaImage,
    map: &RegionMap,
    options: &SilhouetteOptions,
) -> Result<RgbaImage, TransferError> {
    check_dimensions("silhouette", map, painted)?;

    let inside = InsideMask::from_map(map, &options.keep).erode(options.erode);
    tracing::debug!(inside = inside.count(), "silhouette mask built");

    Ok(apply_mask(painted, &inside))
}

/// Zero pixels outside `mask` and force inside pixels opaque.
pub fn apply_mask(painted: &RgbaImage, mask: &InsideMask) -> RgbaImage {
    RgbaImage::from_fn(painted.width(), painted.height(), |x, y| {
        if mask.get(x, y) {
            opaque(*painted.get_pixel(x, y))
        } else {
            TRANSPARENT
        }
    })
}

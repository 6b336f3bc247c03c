//! Region maps: per-pose grids of integer IDs.
//!
//! A region map classifies every pixel of a pose:
//! - `-1` - fully transparent
//! - `0` - keep the base pixel (outline or background)
//! - `>0` - a block ID naming one body part, stable across every pose of a character
//!
//! The text form is one row per scanline, comma-separated signed integers, no header:
//!
//! ```text
//! -1,-1,0,0
//! -1,1,1,0
//! 0,1,1,0
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Positive label of one body part.
pub type BlockId = u32;

/// Error type for region map parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionMapError {
    /// Ragged rows or a token that is not an integer
    #[error("row {row}, column {column}: {message}")]
    Format { row: usize, column: usize, message: String },
    /// The text has no rows (or no columns)
    #[error("region map has no data")]
    Empty,
}

/// How a single region map value is treated by the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// `-1`: the output pixel is fully transparent.
    Transparent,
    /// `0`: the output pixel is the base pixel verbatim.
    Keep,
    /// `>0`: the pixel belongs to a block.
    Block(BlockId),
}

impl Cell {
    /// Classify a raw map value.
    ///
    /// Negative values other than `-1` carry no block and are treated like `0`.
    pub fn classify(value: i32) -> Self {
        match value {
            -1 => Cell::Transparent,
            v if v > 0 => Cell::Block(v as BlockId),
            _ => Cell::Keep,
        }
    }
}

/// A 2D grid of signed IDs, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMap {
    cells: Vec<i32>,
    width: u32,
    height: u32,
}

impl RegionMap {
    /// Build a map from row-major cells.
    ///
    /// Returns `None` if `cells.len() != width * height`.
    pub fn from_cells(width: u32, height: u32, cells: Vec<i32>) -> Option<Self> {
        if cells.len() != width as usize * height as usize {
            return None;
        }
        Some(Self { cells, width, height })
    }

    /// Build a map from nested rows (`rows[y][x]`).
    pub fn from_rows(rows: &[Vec<i32>]) -> Result<Self, RegionMapError> {
        let Some(first) = rows.first() else {
            return Err(RegionMapError::Empty);
        };
        let width = first.len();
        if width == 0 {
            return Err(RegionMapError::Empty);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(ragged(y, row.len(), width));
            }
            cells.extend_from_slice(row);
        }

        Ok(Self { cells, width: width as u32, height: rows.len() as u32 })
    }

    /// Parse the comma-separated text form.
    ///
    /// Leading/trailing whitespace, CRLF line endings and blank lines are tolerated.
    /// Tokens are trimmed before parsing.
    pub fn parse(text: &str) -> Result<Self, RegionMapError> {
        let mut cells = Vec::new();
        let mut width: Option<usize> = None;
        let mut height = 0usize;

        for line in text.trim().lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let mut count = 0usize;
            for (x, token) in line.split(',').enumerate() {
                let token = token.trim();
                let value = token.parse::<i32>().map_err(|_| RegionMapError::Format {
                    row: height,
                    column: x,
                    message: format!("'{}' is not an integer", token),
                })?;
                cells.push(value);
                count += 1;
            }

            match width {
                None => width = Some(count),
                Some(w) if w != count => return Err(ragged(height, count, w)),
                Some(_) => {}
            }
            height += 1;
        }

        match width {
            Some(w) if w > 0 && height > 0 => {
                Ok(Self { cells, width: w as u32, height: height as u32 })
            }
            _ => Err(RegionMapError::Empty),
        }
    }

    /// Width in cells (length of the first row).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells (number of rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`, matching `image::RgbaImage::dimensions`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw value at `(x, y)`. Panics when out of bounds, like `RgbaImage::get_pixel`.
    pub fn get(&self, x: u32, y: u32) -> i32 {
        assert!(x < self.width && y < self.height, "({}, {}) outside region map", x, y);
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Raw value at `(x, y)`, or `None` when out of bounds.
    pub fn get_checked(&self, x: i64, y: i64) -> Option<i32> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.cells[y as usize * self.width as usize + x as usize])
    }

    /// Classified cell at `(x, y)`.
    pub fn cell(&self, x: u32, y: u32) -> Cell {
        Cell::classify(self.get(x, y))
    }

    /// One row of raw values.
    pub fn row(&self, y: u32) -> &[i32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.cells[start..start + w]
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.cells.chunks_exact(self.width as usize)
    }

    /// Iterate `(x, y, value)` in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (u32, u32, i32)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate().map(move |(i, &v)| ((i as u32) % w, (i as u32) / w, v))
    }

    /// Every distinct positive ID, ascending.
    pub fn block_ids(&self) -> BTreeSet<BlockId> {
        self.cells.iter().filter(|&&v| v > 0).map(|&v| v as BlockId).collect()
    }

    /// Number of cells equal to `id`.
    pub fn count(&self, id: i32) -> usize {
        self.cells.iter().filter(|&&v| v == id).count()
    }
}

impl FromStr for RegionMap {
    type Err = RegionMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RegionMap {
    /// Writes the comma-separated text form (newline-terminated rows).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line = row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn ragged(row: usize, found: usize, expected: usize) -> RegionMapError {
    RegionMapError::Format {
        row,
        column: found.min(expected),
        message: format!(
            "row has {} values, expected {} (rows must have consistent width)",
            found, expected
        ),
    }
}

//! posepaint - Carry painted colors from one character pose onto others
//!
//! This library provides functionality to:
//! - Parse region maps that label every pixel of a pose with a body-part block
//! - Transfer colors block by block between poses through a canonical grid
//! - Fill blocks with flat average colors instead of resampling
//! - Trim paint to a character's silhouette, with optional erosion
//! - Load job inputs concurrently and chain frames one after another

pub mod assets;
pub mod average;
pub mod bbox;
pub mod chain;
pub mod cli;
pub mod config;
pub mod hit;
pub mod job;
pub mod mapping;
pub mod output;
pub mod raster;
pub mod region_map;
pub mod silhouette;
pub mod transfer;

pub use region_map::{BlockId, RegionMap};
pub use transfer::{TransferError, TransferJob, TransferMode, TransferOptions};

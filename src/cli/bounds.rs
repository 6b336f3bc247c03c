//! CLI dispatch for the `posepaint bounds` command.
//!
//! Read-only inspection of a region map: per-block bounding boxes and pixel counts.

use std::process::ExitCode;

use crate::assets::FsAssetLoader;
use crate::bbox::{compute_bounding_box, BlockBounds, BoundingBox, BoundsIndex};
use crate::job::Assets;
use crate::region_map::{BlockId, RegionMap};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the bounds command.
pub fn run_bounds(map: &str, id: Option<BlockId>, json: bool) -> ExitCode {
    let loader = FsAssetLoader::default();
    let region_map = match Assets::new(&loader).region_map(map) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match id {
        Some(id) => match compute_bounding_box(&region_map, id) {
            Ok(bbox) => {
                let count = region_map.count(id as i32);
                if json {
                    println!("{}", block_json(id, &bbox, count));
                } else {
                    print_block_text(id, &bbox, count);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => {
            let index = BoundsIndex::build(&region_map);
            if json {
                print_index_json(&region_map, &index);
            } else {
                print_index_text(&region_map, &index);
            }
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn block_json(id: BlockId, bbox: &BoundingBox, pixel_count: usize) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "bounds": [bbox.xmin, bbox.ymin, bbox.width(), bbox.height()],
        "pixel_count": pixel_count,
    })
}

fn print_block_text(id: BlockId, bbox: &BoundingBox, pixel_count: usize) {
    println!(
        "block {}: bounding box [{}, {}, {}, {}]  (x={}..={}, y={}..={})",
        id,
        bbox.xmin,
        bbox.ymin,
        bbox.width(),
        bbox.height(),
        bbox.xmin,
        bbox.xmax,
        bbox.ymin,
        bbox.ymax
    );
    println!("  {} pixel{}", pixel_count, if pixel_count == 1 { "" } else { "s" });
}

fn print_index_json(map: &RegionMap, index: &BoundsIndex) {
    let blocks: Vec<serde_json::Value> = index
        .iter()
        .map(|(id, BlockBounds { bbox, pixel_count })| block_json(id, bbox, *pixel_count))
        .collect();
    let output = serde_json::json!({
        "width": map.width(),
        "height": map.height(),
        "transparent": map.count(-1),
        "blocks": blocks,
    });
    println!("{}", output);
}

fn print_index_text(map: &RegionMap, index: &BoundsIndex) {
    println!("Region map {}x{}: {} block{}", map.width(), map.height(), index.len(), if index.len() == 1 { "" } else { "s" });
    for (id, bounds) in index.iter() {
        print_block_text(id, &bounds.bbox, bounds.pixel_count);
    }
}

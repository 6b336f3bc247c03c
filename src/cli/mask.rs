//! CLI dispatch for the `posepaint mask` command.

use std::path::Path;
use std::process::ExitCode;

use crate::assets::{AssetLoader, FsAssetLoader};
use crate::job::Assets;
use crate::output::{generate_output_path, save_png};
use crate::silhouette::{mask_silhouette, KeepRule, SilhouetteOptions};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the mask command.
pub fn run_mask(input: &str, map: &str, erode: u8, keep: KeepRule, output: Option<&Path>) -> ExitCode {
    let loader = FsAssetLoader::default();

    let painted = match loader.load_raster(input) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let region_map = match Assets::new(&loader).region_map(map) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = SilhouetteOptions { keep, erode };
    let masked = match mask_silhouette(&painted, &region_map, &options) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = generate_output_path(Path::new(input), "masked", output, true);
    if let Err(e) = save_png(&masked, &path) {
        eprintln!("Error: Failed to save '{}': {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Saved: {}", path.display());
    ExitCode::from(EXIT_SUCCESS)
}

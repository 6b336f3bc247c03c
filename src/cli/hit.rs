//! CLI dispatch for the `posepaint hit` command.

use std::process::ExitCode;

use crate::assets::{AssetLoader, FsAssetLoader};
use crate::hit::HitTester;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the hit command. Prints `hit` or `miss`.
pub fn run_hit(
    sprite: &str,
    x: f64,
    y: f64,
    display: Option<(f64, f64)>,
    threshold: u8,
    json: bool,
) -> ExitCode {
    let image = match FsAssetLoader::default().load_raster(sprite) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut tester = HitTester::new(&image).with_threshold(threshold);
    if let Some((w, h)) = display {
        tester = tester.with_display_size(w, h);
    }

    let hit = tester.is_over_ink(x, y);
    if json {
        let pixel = tester.pixel_at(x, y).map(|(px, py)| [px, py]);
        println!("{}", serde_json::json!({ "hit": hit, "pixel": pixel }));
    } else {
        println!("{}", if hit { "hit" } else { "miss" });
    }

    ExitCode::from(EXIT_SUCCESS)
}

//! CLI dispatch for the `posepaint transfer` command.

use std::path::Path;
use std::process::ExitCode;

use crate::assets::FsAssetLoader;
use crate::job::{run_job, Assets, JobSpec};
use crate::mapping::Rounding;
use crate::output::{generate_output_path, save_frame};
use crate::transfer::{TransferMode, TransferOptions};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the transfer command.
pub fn run_transfer(
    source: &str,
    source_map: &str,
    target: &str,
    target_map: &str,
    output: Option<&Path>,
    mode: TransferMode,
    rounding: Rounding,
    scale: u8,
) -> ExitCode {
    let spec = JobSpec {
        source: source.to_string(),
        source_map: source_map.to_string(),
        target: target.to_string(),
        target_map: target_map.to_string(),
    };
    let loader = FsAssetLoader::default();
    let options = TransferOptions { mode, rounding };

    let frame = match run_job(&Assets::new(&loader), &spec, &options) {
        Ok(frame) => frame,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let path = generate_output_path(Path::new(target), "painted", output, true);
    if let Err(e) = save_frame(frame, &path, scale) {
        eprintln!("Error: Failed to save '{}': {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Saved: {}", path.display());
    ExitCode::from(EXIT_SUCCESS)
}

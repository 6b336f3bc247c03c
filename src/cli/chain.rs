//! CLI dispatch for the `posepaint chain` command.
//!
//! Loads `posepaint.toml`, runs one character's frame chain from a painted first frame,
//! and saves every frame that succeeded.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::assets::{AssetCache, AssetLoader, FsAssetLoader};
use crate::chain::{run_chain as run_frame_chain, ChainOptions, FrameStatus, PreMask};
use crate::config::{
    find_config, load_config, merge_cli_overrides, project_root, resolve_path, CliOverrides,
};
use crate::job::Assets;
use crate::output::{chain_frame_path, save_frame};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

pub struct ChainArgs<'a> {
    pub character: &'a str,
    pub painted: &'a str,
    pub config: Option<&'a Path>,
    pub mask_first: bool,
    pub scale: u8,
    pub overrides: CliOverrides,
}

/// Execute the chain command.
pub fn run_chain(args: ChainArgs<'_>) -> ExitCode {
    let Some(config_path) = args.config.map(Path::to_path_buf).or_else(find_config) else {
        eprintln!("Error: No posepaint.toml found (use --config to point at one)");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let mut config = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    merge_cli_overrides(&mut config, &args.overrides);

    let Some(character) = config.character(args.character) else {
        eprintln!("Error: character '{}' not found in '{}'", args.character, config_path.display());
        if !config.characters.is_empty() {
            eprintln!("Available characters:");
            for name in config.characters.keys() {
                eprintln!("  {}", name);
            }
        }
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let root = project_root(&config_path).unwrap_or(Path::new("")).to_path_buf();
    let out_dir: PathBuf = match &args.overrides.out {
        Some(out) => out.clone(),
        None => resolve_path(&root, &config.project.out),
    };

    let painted = match FsAssetLoader::default().load_raster(args.painted) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let loader = FsAssetLoader::new(resolve_path(&root, &character.dir));
    let cache = AssetCache::new();
    let options = ChainOptions {
        transfer: config.transfer.options(),
        retries: config.transfer.retries,
        pre_mask: args.mask_first.then(|| PreMask {
            map: character.base_map.clone(),
            silhouette: config.mask.silhouette(),
        }),
    };
    let steps = character.chain_steps();

    let report = match run_frame_chain(&Assets::cached(&loader, &cache), painted, &steps, &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut failed = 0usize;
    for frame in report.frames {
        match (frame.status, frame.output) {
            (FrameStatus::Done, Some(image)) => {
                let path = chain_frame_path(&out_dir, args.character, &frame.name);
                if let Err(e) = save_frame(image, &path, args.scale) {
                    eprintln!("Error: Failed to save '{}': {}", path.display(), e);
                    failed += 1;
                } else {
                    println!("{}: saved {}", frame.name, path.display());
                }
            }
            (FrameStatus::Failed { error }, _) => {
                eprintln!("{}: failed: {}", frame.name, error);
                failed += 1;
            }
            (FrameStatus::Done, None) => {
                eprintln!("{}: produced no output", frame.name);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("Error: {} of {} frames failed", failed, steps.len());
        return ExitCode::from(EXIT_ERROR);
    }
    ExitCode::from(EXIT_SUCCESS)
}

//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod bounds;
mod chain;
mod hit;
mod mask;
mod transfer;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::mapping::Rounding;
use crate::silhouette::KeepRule;
use crate::transfer::TransferMode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// posepaint - Carry painted colors from one character pose onto others
#[derive(Parser)]
#[command(name = "posepaint")]
#[command(about = "posepaint - Propagate a painted frame onto other poses using region maps")]
#[command(version)]
pub struct Cli {
    /// Log verbosity: -v info, -vv debug, -vvv trace (default: warnings only; RUST_LOG also works)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transfer the colors of a painted pose onto another pose
    Transfer {
        /// Painted source raster (path or data: URL)
        #[arg(long)]
        source: String,

        /// Region map (CSV) of the painted pose
        #[arg(long)]
        source_map: String,

        /// Uncolored base raster of the target pose
        #[arg(long)]
        target: String,

        /// Region map (CSV) of the target pose
        #[arg(long)]
        target_map: String,

        /// Output file or directory.
        /// If omitted: {target}_painted.png
        /// If directory (ends with /): dir/painted.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-pixel resampling or one flat color per block
        #[arg(long, value_enum, default_value = "sample")]
        mode: TransferMode,

        /// Tie-breaking for canonical coordinates
        #[arg(long, value_enum, default_value = "round")]
        rounding: Rounding,

        /// Scale output by integer factor (1-16)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: u8,
    },

    /// Trim paint outside a character's silhouette
    Mask {
        /// Painted raster to trim
        #[arg(long)]
        input: String,

        /// Region map (CSV) of the pose
        #[arg(long)]
        map: String,

        /// Inward erosion passes (0-3)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(0..=3))]
        erode: u8,

        /// Which cells are inside: positive, non-zero, or blocks:ID,...
        #[arg(long, default_value = "positive")]
        keep: KeepRule,

        /// Output file (default: {input}_masked.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show block bounding boxes of a region map
    Bounds {
        /// Region map (CSV)
        #[arg(long)]
        map: String,

        /// Only this block ID
        #[arg(long)]
        id: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a character's configured frame chain from one painted frame
    Chain {
        /// Character name in posepaint.toml
        #[arg(long)]
        character: String,

        /// Painted first frame (path or data: URL)
        #[arg(long)]
        painted: String,

        /// Config file (default: discover posepaint.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (overrides project.out)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Trim the painted frame to the base silhouette before the first transfer
        #[arg(long)]
        mask_first: bool,

        /// Erosion passes for --mask-first (overrides mask.erode)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        erode: Option<u8>,

        /// Override transfer.mode
        #[arg(long, value_enum)]
        mode: Option<TransferMode>,

        /// Override transfer.rounding
        #[arg(long, value_enum)]
        rounding: Option<Rounding>,

        /// Override transfer.retries (0-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        retries: Option<u8>,

        /// Scale saved frames by integer factor (1-16)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: u8,
    },

    /// Test whether a point lands on a sprite's ink
    Hit {
        /// Sprite raster
        #[arg(long)]
        sprite: String,

        /// X in display coordinates
        #[arg(long, allow_negative_numbers = true)]
        x: f64,

        /// Y in display coordinates
        #[arg(long, allow_negative_numbers = true)]
        y: f64,

        /// Width the sprite is displayed at (default: natural width)
        #[arg(long, requires = "display_height")]
        display_width: Option<f64>,

        /// Height the sprite is displayed at (default: natural height)
        #[arg(long, requires = "display_width")]
        display_height: Option<f64>,

        /// Alpha a pixel must exceed to count as ink
        #[arg(long, default_value = "10")]
        threshold: u8,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Install the stderr log subscriber.
///
/// With no `-v` flags `RUST_LOG` decides, falling back to warnings only.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };
    // A subscriber may already be installed when embedded; keep that one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Transfer { source, source_map, target, target_map, output, mode, rounding, scale } => {
            transfer::run_transfer(
                &source,
                &source_map,
                &target,
                &target_map,
                output.as_deref(),
                mode,
                rounding,
                scale,
            )
        }
        Commands::Mask { input, map, erode, keep, output } => {
            mask::run_mask(&input, &map, erode, keep, output.as_deref())
        }
        Commands::Bounds { map, id, json } => bounds::run_bounds(&map, id, json),
        Commands::Chain {
            character,
            painted,
            config,
            out,
            mask_first,
            erode,
            mode,
            rounding,
            retries,
            scale,
        } => chain::run_chain(chain::ChainArgs {
            character: &character,
            painted: &painted,
            config: config.as_deref(),
            mask_first,
            scale,
            overrides: crate::config::CliOverrides {
                out,
                mode,
                rounding,
                retries,
                erode,
                keep: None,
            },
        }),
        Commands::Hit { sprite, x, y, display_width, display_height, threshold, json } => {
            let display = display_width.zip(display_height);
            hit::run_hit(&sprite, x, y, display, threshold, json)
        }
    }
}

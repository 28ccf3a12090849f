use anyhow::{Context, Result};
use asset_naming::{CutRule, MatRule, PerkRule, RenameRule};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod codec;
mod compare;
mod convert;
mod error;
mod rename;
mod report;
mod slicer;
mod walker;

use codec::Quality;
use convert::ConvertOptions;
use rename::RenameOptions;
use slicer::GridSpec;

const DEFAULT_MATS_DIR: &str = "assets/character-mats";

#[derive(Parser)]
#[command(name = "asset-cutter")]
#[command(about = "Board game character asset preparation tool")]
#[command(version)]
struct Cli {
    /// Log more details (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut an image into a grid of piece_RR_CC.png files
    Cut {
        /// Input image path
        image: PathBuf,
        /// Number of rows
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        rows: u32,
        /// Number of columns
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        cols: u32,
        /// Output directory (default: <image dir>/<image name>_cut_images)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert JPG files to size-optimized PNG files, recursively
    Convert {
        /// Input directory
        #[arg(default_value = DEFAULT_MATS_DIR)]
        input_dir: PathBuf,
        /// Output directory (default: next to each source file)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Quality level
        #[arg(short, long, value_enum, default_value_t = Quality::Palette)]
        quality: Quality,
        /// Overwrite existing PNG files
        #[arg(long)]
        overwrite: bool,
        /// Only list the files that would be converted
        #[arg(long)]
        preview: bool,
    },
    /// Rename piece_RR_CC.png to fh-<prefix>-NN-<suffix>.png
    RenameCut {
        /// Directory holding the pieces
        directory: PathBuf,
        /// Name prefix (e.g. be, oe, re)
        prefix: String,
        /// Name suffix (e.g. f, b)
        suffix: String,
        /// Sequence number of piece_01_01.png
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        start: i64,
        #[command(flatten)]
        flags: RenameFlags,
    },
    /// Rename char_mat_<name>_f|b scans to fh-<name>[-back]
    RenameMats {
        /// Directory holding the mats, e.g. assets/character-mats/frosthaven
        directory: PathBuf,
        #[command(flatten)]
        flags: RenameFlags,
    },
    /// Rename char_perk_<name>.png sheets to fh-<name>-perks.png
    RenamePerks {
        /// Directory holding the perk sheets, e.g. assets/character-perks/frosthaven
        directory: PathBuf,
        #[command(flatten)]
        flags: RenameFlags,
    },
    /// Compare JPG sizes with the PNG files converted from them
    Compare {
        /// Directory to scan
        #[arg(default_value = DEFAULT_MATS_DIR)]
        directory: PathBuf,
    },
}

#[derive(Args)]
struct RenameFlags {
    /// Only show what would be renamed
    #[arg(long)]
    preview: bool,
    /// Replace files that already carry the target name
    #[arg(long)]
    overwrite: bool,
}

impl From<RenameFlags> for RenameOptions {
    fn from(flags: RenameFlags) -> Self {
        Self {
            preview: flags.preview,
            overwrite: flags.overwrite,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

fn run_rename(directory: &Path, rule: &dyn RenameRule, flags: RenameFlags) -> Result<ExitCode> {
    println!("Target directory: {}", directory.display());
    println!("Pattern: {}", rule.describe());
    println!("{}", "-".repeat(60));

    let summary = rename::rename_in_dir(directory, rule, flags.into())
        .with_context(|| format!("Failed to rename files in {:?}", directory))?;
    Ok(summary.exit_code())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Cut { image, rows, cols, output } => {
            banner("Image cutter");
            log::info!("cutting {:?} into {rows}x{cols}", image);

            let saved = slicer::cut_image(&image, GridSpec::new(rows, cols), output.as_deref())
                .with_context(|| format!("Failed to cut image: {:?}", image))?;

            if let Some(dir) = saved.first().and_then(|p| p.parent()) {
                println!("All pieces saved to: {}", dir.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Convert { input_dir, output, quality, overwrite, preview } => {
            walker::require_dir(&input_dir)
                .with_context(|| format!("Invalid input directory: {:?}", input_dir))?;

            banner("JPG to PNG converter");
            println!("Input directory:  {}", input_dir.display());
            match &output {
                Some(dir) => println!("Output directory: {}", dir.display()),
                None => println!("Output directory: (in place)"),
            }

            let options = ConvertOptions {
                output_dir: output,
                quality,
                overwrite,
            };

            if preview {
                convert::preview(&input_dir, &options)
                    .with_context(|| format!("Failed to list {:?}", input_dir))?;
                return Ok(ExitCode::SUCCESS);
            }

            let summary = convert::convert_directory(&input_dir, &options)
                .with_context(|| format!("Failed to convert {:?}", input_dir))?;
            Ok(summary.exit_code())
        }

        Commands::RenameCut { directory, prefix, suffix, start, flags } => {
            banner("Cut piece renamer");
            let rule = CutRule::new(prefix, suffix, start);
            run_rename(&directory, &rule, flags)
        }

        Commands::RenameMats { directory, flags } => {
            banner("Character mat renamer");
            run_rename(&directory, &MatRule, flags)
        }

        Commands::RenamePerks { directory, flags } => {
            banner("Character perk renamer");
            run_rename(&directory, &PerkRule, flags)
        }

        Commands::Compare { directory } => {
            let comparison = compare::compare_sizes(&directory)
                .with_context(|| format!("Failed to scan {:?}", directory))?;
            comparison.print();
            Ok(ExitCode::SUCCESS)
        }
    }
}

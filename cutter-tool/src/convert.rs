use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{HumanCount, ProgressBar, ProgressStyle};

use crate::codec::{self, Quality};
use crate::error::CutterError;
use crate::report::{BatchSummary, Converted};
use crate::walker::{self, JPEG_EXTENSIONS};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Mirror the input tree here instead of writing next to each source
    pub output_dir: Option<PathBuf>,
    pub quality: Quality,
    pub overwrite: bool,
}

/// Where the PNG for `input` goes: beside it, or at the same relative
/// position under `output_root`.
pub fn output_path_for(input: &Path, input_root: &Path, output_root: Option<&Path>) -> PathBuf {
    let png = input.with_extension("png");
    match output_root {
        None => png,
        Some(root) => {
            let relative = png
                .strip_prefix(input_root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| png.file_name().map(PathBuf::from).unwrap_or_default());
            root.join(relative)
        }
    }
}

fn file_size(path: &Path) -> Result<u64, CutterError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| CutterError::io(path, e))
}

/// Re-encode one image as an optimized PNG
pub fn convert_file(
    input: &Path,
    output: &Path,
    quality: Quality,
    overwrite: bool,
) -> Result<Converted, CutterError> {
    if output.exists() && !overwrite {
        return Err(CutterError::AlreadyExists(output.to_path_buf()));
    }

    let image = codec::open_oriented(input)?;
    let pixels = codec::optimize(image, quality);
    codec::write_png(output, &pixels)?;

    Ok(Converted {
        input_size: file_size(input)?,
        output_size: file_size(output)?,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert every JPG under `input_dir`, reporting per file and carrying on
/// past failures.
pub fn convert_directory(input_dir: &Path, options: &ConvertOptions) -> Result<BatchSummary, CutterError> {
    let files = walker::find_files(input_dir, JPEG_EXTENSIONS)?;
    if files.is_empty() {
        println!("No JPG files found in {}", input_dir.display());
        return Ok(BatchSummary::default());
    }

    println!("Found {} JPG files", files.len());
    println!("Quality: {}", options.quality);
    println!(
        "{}",
        if options.overwrite { "Overwriting existing PNG files" } else { "Skipping existing PNG files" }
    );
    println!("{}", "-".repeat(60));

    let started = Instant::now();
    let mut summary = BatchSummary::new(files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for (i, input) in files.iter().enumerate() {
        let output = output_path_for(input, input_dir, options.output_dir.as_deref());
        pb.println(format!("[{}/{}] {}", i + 1, files.len(), display_name(input)));

        match convert_file(input, &output, options.quality, options.overwrite) {
            Ok(converted) => {
                pb.println(format!(
                    "  ✓ {} -> {}",
                    display_name(input),
                    display_name(&output)
                ));
                pb.println(format!(
                    "    {} -> {} bytes ({:+.1}%)",
                    HumanCount(converted.input_size),
                    HumanCount(converted.output_size),
                    converted.size_change_percent()
                ));
                summary.record_converted(converted);
            }
            Err(err) if err.is_skip() => {
                pb.println(format!("  - skipped, {err}"));
                summary.record_skipped();
            }
            Err(err) => {
                log::debug!("conversion of {} failed: {err:?}", input.display());
                pb.println(format!("  ✗ {err}"));
                summary.record_failed();
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    summary.print(started.elapsed());
    Ok(summary)
}

/// A conversion that would happen, without touching the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConversion {
    pub input: PathBuf,
    pub input_size: u64,
    pub output: PathBuf,
}

pub fn plan(input_dir: &Path, output_dir: Option<&Path>) -> Result<Vec<PlannedConversion>, CutterError> {
    walker::find_files(input_dir, JPEG_EXTENSIONS)?
        .into_iter()
        .map(|input| {
            Ok(PlannedConversion {
                input_size: file_size(&input)?,
                output: output_path_for(&input, input_dir, output_dir),
                input,
            })
        })
        .collect()
}

/// Print what `convert_directory` would do
pub fn preview(input_dir: &Path, options: &ConvertOptions) -> Result<(), CutterError> {
    let planned = plan(input_dir, options.output_dir.as_deref())?;
    if planned.is_empty() {
        println!("No JPG files found in {}", input_dir.display());
        return Ok(());
    }

    println!("\nFound {} JPG files:", planned.len());
    for item in &planned {
        println!(
            "  {} ({} bytes) -> {}",
            item.input.display(),
            HumanCount(item.input_size),
            item.output.display()
        );
    }
    println!("\nRun again without --preview to convert with --quality {}", options.quality);
    Ok(())
}

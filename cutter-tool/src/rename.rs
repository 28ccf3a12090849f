use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use asset_naming::{exceeds_row_stride, parse_piece_file_name, RenameRule};

use crate::error::CutterError;
use crate::walker::require_dir;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOptions {
    /// Only print what would be renamed
    pub preview: bool,
    /// Replace files already carrying the target name
    pub overwrite: bool,
}

/// What happened to one candidate file
#[derive(Debug)]
pub enum RenameOutcome {
    Renamed { from: String, to: String },
    Planned { from: String, to: String },
    Skipped(CutterError),
    Failed(CutterError),
}

#[derive(Debug, Default)]
pub struct RenameSummary {
    pub outcomes: Vec<RenameOutcome>,
}

impl RenameSummary {
    pub fn renamed(&self) -> usize {
        self.count(|o| matches!(o, RenameOutcome::Renamed { .. }))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, RenameOutcome::Planned { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RenameOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RenameOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&RenameOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(*o)).count()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed() > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Regular files directly inside `dir` that `rule` wants to look at, by name
pub fn candidates(dir: &Path, rule: &dyn RenameRule) -> Result<Vec<String>, CutterError> {
    require_dir(dir)?;

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CutterError::io(dir, e))? {
        let entry = entry.map_err(|e| CutterError::io(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| CutterError::io(entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if rule.is_candidate(&name) => names.push(name),
            Ok(_) => {}
            Err(raw) => log::warn!("ignoring non UTF-8 file name {raw:?}"),
        }
    }

    names.sort();
    Ok(names)
}

/// `claimed` holds the targets already taken earlier in the same batch, so
/// two sources mapping to one name are caught in preview too.
fn rename_one(
    dir: &Path,
    name: &str,
    rule: &dyn RenameRule,
    options: RenameOptions,
    claimed: &mut HashSet<String>,
) -> RenameOutcome {
    let Some(target) = rule.rewrite(name) else {
        return RenameOutcome::Skipped(CutterError::PatternMismatch(name.to_string()));
    };

    if let Some((row, col)) = parse_piece_file_name(name) {
        if exceeds_row_stride(col) {
            log::warn!("{name}: column {col} of row {row} overlaps the next row's numbers");
        }
    }

    let from = dir.join(name);
    let to: PathBuf = dir.join(&target);
    if claimed.contains(&target) || (to.exists() && !options.overwrite) {
        return RenameOutcome::Skipped(CutterError::AlreadyExists(to));
    }
    claimed.insert(target.clone());

    if options.preview {
        return RenameOutcome::Planned {
            from: name.to_string(),
            to: target,
        };
    }

    match fs::rename(&from, &to) {
        Ok(()) => RenameOutcome::Renamed {
            from: name.to_string(),
            to: target,
        },
        Err(e) => RenameOutcome::Failed(CutterError::io(&from, e)),
    }
}

/// Apply `rule` to every candidate in `dir` (not recursive).
///
/// Files whose names do not follow the rule, whose target already exists,
/// or whose target was taken by an earlier file in the batch are reported
/// as skipped and left untouched.
pub fn rename_in_dir(
    dir: &Path,
    rule: &dyn RenameRule,
    options: RenameOptions,
) -> Result<RenameSummary, CutterError> {
    let names = candidates(dir, rule)?;

    println!("Found {} files to rename:", names.len());
    for name in &names {
        println!("  - {name}");
    }
    println!("\nRenaming ({})...", rule.describe());

    let mut summary = RenameSummary::default();
    let mut claimed = HashSet::new();
    for name in &names {
        let outcome = rename_one(dir, name, rule, options, &mut claimed);
        match &outcome {
            RenameOutcome::Renamed { from, to } => println!("✓ {from} -> {to}"),
            RenameOutcome::Planned { from, to } => println!("~ {from} -> {to}"),
            RenameOutcome::Skipped(err) => println!("? skipped, {err}"),
            RenameOutcome::Failed(err) => println!("✗ {err}"),
        }
        summary.outcomes.push(outcome);
    }

    if options.preview {
        println!("\nPreview only: {} files would be renamed.", summary.planned());
    } else {
        println!(
            "\nDone! Renamed {} files ({} skipped, {} failed).",
            summary.renamed(),
            summary.skipped(),
            summary.failed()
        );
    }
    Ok(summary)
}

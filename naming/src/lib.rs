/// Number of flat indices reserved for each grid row
pub const ROW_STRIDE: i64 = 10;

/// Prefix of every slice produced by the grid cutter
pub const PIECE_PREFIX: &str = "piece_";

/// Extension of every slice produced by the grid cutter
pub const PIECE_EXTENSION: &str = ".png";

/// Prefix of every file that already follows the target convention
pub const TARGET_PREFIX: &str = "fh-";

/// Prefix of raw character mat scans
pub const MAT_PREFIX: &str = "char_mat_";

/// Prefix of raw character perk sheets
pub const PERK_PREFIX: &str = "char_perk_";

/// File name of the slice at `row`, `col` (both 1-based)
pub fn piece_file_name(row: u32, col: u32) -> String {
    format!("{PIECE_PREFIX}{row:02}_{col:02}{PIECE_EXTENSION}")
}

/// Recover the 1-based (row, col) position from a slice file name.
///
/// Accepts any number of digits per component, so `piece_1_2.png` and
/// `piece_001_002.png` both parse.
pub fn parse_piece_file_name(name: &str) -> Option<(u32, u32)> {
    let body = name
        .strip_prefix(PIECE_PREFIX)?
        .strip_suffix(PIECE_EXTENSION)?;
    let (row, col) = body.split_once('_')?;
    Some((parse_number(row)?, parse_number(col)?))
}

/// Flatten a 1-based grid position into the sequence number used by the
/// target convention: `base + (row - 1) * 10 + (col - 1)`.
///
/// Columns past [`ROW_STRIDE`] spill into the next row's range and collide.
pub fn remap(row: u32, col: u32, base: i64) -> i64 {
    base + (i64::from(row) - 1) * ROW_STRIDE + (i64::from(col) - 1)
}

/// Whether a column index no longer fits inside one row's index range
pub fn exceeds_row_stride(col: u32) -> bool {
    i64::from(col) > ROW_STRIDE
}

fn parse_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn dashed(name: &str) -> String {
    name.replace('_', "-")
}

/// A fixed file name rewrite, applied to every file of a flat directory
pub trait RenameRule {
    /// Whether the file is in scope at all. Files outside the scope are
    /// left alone without being reported.
    fn is_candidate(&self, name: &str) -> bool;

    /// The new name, or `None` if an in-scope file does not follow the
    /// source convention.
    fn rewrite(&self, name: &str) -> Option<String>;

    /// Short `source -> target` pattern for console headers
    fn describe(&self) -> String;
}

/// `piece_RR_CC.png` -> `fh-{prefix}-{NN}-{suffix}.png`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutRule {
    /// Category tag, e.g. `be` for boat events
    pub prefix: String,
    /// Face tag, e.g. `f` for front or `b` for back
    pub suffix: String,
    /// Sequence number assigned to `piece_01_01.png`
    pub start: i64,
}

impl CutRule {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, start: i64) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            start,
        }
    }

    /// Target name for an explicit grid position
    pub fn target_name(&self, row: u32, col: u32) -> String {
        let index = remap(row, col, self.start);
        format!(
            "{TARGET_PREFIX}{}-{index:02}-{}{PIECE_EXTENSION}",
            self.prefix, self.suffix
        )
    }
}

impl RenameRule for CutRule {
    fn is_candidate(&self, name: &str) -> bool {
        name.starts_with(PIECE_PREFIX) && name.ends_with(PIECE_EXTENSION)
    }

    fn rewrite(&self, name: &str) -> Option<String> {
        let (row, col) = parse_piece_file_name(name)?;
        Some(self.target_name(row, col))
    }

    fn describe(&self) -> String {
        format!(
            "piece_XX_YY.png -> {TARGET_PREFIX}{}-NN-{}.png (NN from {})",
            self.prefix, self.suffix, self.start
        )
    }
}

/// Which face of a character mat a scan shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatSide {
    Front,
    Back,
}

impl MatSide {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "f" => Some(Self::Front),
            "b" => Some(Self::Back),
            _ => None,
        }
    }

    fn target_suffix(self) -> &'static str {
        match self {
            Self::Front => "",
            Self::Back => "-back",
        }
    }
}

/// `char_mat_{name}_f.png` -> `fh-{name}.png`,
/// `char_mat_{name}_b.png` -> `fh-{name}-back.png`.
///
/// Works for `.jpg` too; underscores inside `name` become dashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatRule;

impl MatRule {
    /// Split a mat scan name into character name, side and extension
    pub fn parse(name: &str) -> Option<(&str, MatSide, &str)> {
        let rest = name.strip_prefix(MAT_PREFIX)?;
        let (stem, extension) = rest.rsplit_once('.')?;
        if extension != "png" && extension != "jpg" {
            return None;
        }
        let (character, marker) = stem.rsplit_once('_')?;
        if character.is_empty() {
            return None;
        }
        Some((character, MatSide::from_marker(marker)?, extension))
    }
}

impl RenameRule for MatRule {
    fn is_candidate(&self, name: &str) -> bool {
        !name.starts_with(TARGET_PREFIX)
    }

    fn rewrite(&self, name: &str) -> Option<String> {
        let (character, side, extension) = Self::parse(name)?;
        Some(format!(
            "{TARGET_PREFIX}{}{}.{extension}",
            dashed(character),
            side.target_suffix()
        ))
    }

    fn describe(&self) -> String {
        String::from("char_mat_*_f|b.png|jpg -> fh-*[-back].png|jpg")
    }
}

/// `char_perk_{name}.png` -> `fh-{name}-perks.png`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerkRule;

impl RenameRule for PerkRule {
    fn is_candidate(&self, name: &str) -> bool {
        name.starts_with(PERK_PREFIX) && name.ends_with(".png")
    }

    fn rewrite(&self, name: &str) -> Option<String> {
        let character = name.strip_prefix(PERK_PREFIX)?.strip_suffix(".png")?;
        if character.is_empty() {
            return None;
        }
        Some(format!("{TARGET_PREFIX}{}-perks.png", dashed(character)))
    }

    fn describe(&self) -> String {
        String::from("char_perk_*.png -> fh-*-perks.png")
    }
}

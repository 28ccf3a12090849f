use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CutterError;
use crate::report::format_size;
use crate::walker::{self, JPEG_EXTENSIONS};

/// A JPG and the PNG converted from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizePair {
    pub jpg: PathBuf,
    pub jpg_size: u64,
    pub png_size: u64,
}

impl SizePair {
    pub fn delta(&self) -> i64 {
        self.png_size as i64 - self.jpg_size as i64
    }

    /// PNG size as a percentage of the JPG size
    pub fn ratio_percent(&self) -> f64 {
        ratio_percent(self.jpg_size, self.png_size)
    }
}

fn ratio_percent(jpg: u64, png: u64) -> f64 {
    if jpg == 0 {
        return 0.0;
    }
    png as f64 / jpg as f64 * 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeComparison {
    pub pairs: Vec<SizePair>,
}

impl SizeComparison {
    pub fn total_jpg(&self) -> u64 {
        self.pairs.iter().map(|p| p.jpg_size).sum()
    }

    pub fn total_png(&self) -> u64 {
        self.pairs.iter().map(|p| p.png_size).sum()
    }

    pub fn print(&self) {
        println!("{}", "=".repeat(80));
        println!("JPG to PNG conversion size comparison");
        println!("{}", "=".repeat(80));
        println!("{:<30} {:<12} {:<12} {:<10} {:<8}", "File", "JPG", "PNG", "Change", "Ratio");
        println!("{}", "-".repeat(80));

        for pair in &self.pairs {
            let name = pair
                .jpg
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(
                "{:<30} {:<12} {:<12} {:<10} {:.1}%",
                name,
                format_size(pair.jpg_size as i64),
                format_size(pair.png_size as i64),
                format_size(pair.delta()),
                pair.ratio_percent()
            );
        }

        println!("{}", "-".repeat(80));
        if self.pairs.is_empty() {
            println!("No converted pairs found.");
            return;
        }

        let (jpg, png) = (self.total_jpg(), self.total_png());
        let delta = png as i64 - jpg as i64;
        let ratio = ratio_percent(jpg, png);
        println!(
            "{:<30} {:<12} {:<12} {:<10} {:.1}%",
            "Total",
            format_size(jpg as i64),
            format_size(png as i64),
            format_size(delta),
            ratio
        );

        println!("\nSummary:");
        println!("  Converted files: {}", self.pairs.len());
        println!("  Total JPG size:  {}", format_size(jpg as i64));
        println!("  Total PNG size:  {}", format_size(png as i64));
        println!("  Size change:     {} ({:+.1}%)", format_size(delta), ratio - 100.0);
    }
}

/// Pair every JPG under `root` with the `.png` beside it, when one exists
pub fn compare_sizes(root: &Path) -> Result<SizeComparison, CutterError> {
    let mut pairs = Vec::new();
    for jpg in walker::find_files(root, JPEG_EXTENSIONS)? {
        let png = jpg.with_extension("png");
        let png_size = match fs::metadata(&png) {
            Ok(meta) => meta.len(),
            Err(_) => continue,
        };
        let jpg_size = fs::metadata(&jpg)
            .map_err(|e| CutterError::io(&jpg, e))?
            .len();
        pairs.push(SizePair { jpg, jpg_size, png_size });
    }
    Ok(SizeComparison { pairs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_compare_sizes_pairs_siblings() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("fh")).unwrap();
        fs::write(root.join("fh/a.jpg"), vec![0u8; 400]).unwrap();
        fs::write(root.join("fh/a.png"), vec![0u8; 100]).unwrap();
        fs::write(root.join("fh/b.jpg"), vec![0u8; 50]).unwrap();
        fs::write(root.join("c.jpeg"), vec![0u8; 200]).unwrap();
        fs::write(root.join("c.png"), vec![0u8; 300]).unwrap();

        let comparison = compare_sizes(root).unwrap();

        assert_eq!(comparison.pairs.len(), 2);
        assert_eq!(comparison.pairs[0].jpg, root.join("c.jpeg"));
        assert_eq!(comparison.pairs[0].delta(), 100);
        assert_eq!(comparison.pairs[0].ratio_percent(), 150.0);
        assert_eq!(comparison.pairs[1].ratio_percent(), 25.0);
        assert_eq!(comparison.total_jpg(), 600);
        assert_eq!(comparison.total_png(), 400);

        comparison.print();
    }

    #[test]
    fn test_compare_without_pairs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("lonely.jpg"), b"x").unwrap();

        let comparison = compare_sizes(tmp.path()).unwrap();
        assert!(comparison.pairs.is_empty());
        comparison.print();
    }
}

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CutterError;

/// Extensions picked up by the JPG converter and size report
pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Make sure `root` exists and is a directory
pub fn require_dir(root: &Path) -> Result<(), CutterError> {
    if !root.exists() {
        return Err(CutterError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CutterError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Recursively collect regular files under `root` whose extension matches
/// one of `extensions`, ignoring case. Results are sorted by path.
pub fn find_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, CutterError> {
    require_dir(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(io) => CutterError::io(path, io),
                None => CutterError::Io {
                    path,
                    source: std::io::Error::other("filesystem loop"),
                },
            }
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_jpegs_recursively() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("gloomhaven/brute")).unwrap();
        fs::create_dir_all(root.join("frosthaven")).unwrap();
        for name in [
            "frosthaven/drifter.JPG",
            "frosthaven/drifter.png",
            "gloomhaven/brute/front.jpeg",
            "gloomhaven/notes.txt",
            "a.jpg",
        ] {
            fs::write(root.join(name), b"x").unwrap();
        }
        fs::create_dir_all(root.join("trap.jpg")).unwrap();

        let found = find_files(root, JPEG_EXTENSIONS).unwrap();
        let relative: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("frosthaven/drifter.JPG"),
                PathBuf::from("gloomhaven/brute/front.jpeg"),
            ]
        );
    }

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nowhere");
        assert!(matches!(find_files(&missing, JPEG_EXTENSIONS), Err(CutterError::NotFound(_))));
    }

    #[test]
    fn test_root_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("single.jpg");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(find_files(&file, JPEG_EXTENSIONS), Err(CutterError::NotADirectory(_))));
    }
}

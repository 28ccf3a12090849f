use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of a single file operation.
///
/// Batch drivers record these per file and keep going; only the command
/// layer turns them into a process exit code.
#[derive(Debug, Error)]
pub enum CutterError {
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot encode image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    #[error("output already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("file name does not match the expected pattern: {0}")]
    PatternMismatch(String),

    #[error("invalid grid {rows}x{cols} for a {width}x{height} image")]
    InvalidGrid {
        rows: u32,
        cols: u32,
        width: u32,
        height: u32,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Encoder-side failures from either PNG backend
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Png(#[from] png::EncodingError),
}

impl CutterError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    pub fn decode(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        match source {
            image::ImageError::IoError(err) => Self::io(path, err),
            source => Self::Decode {
                path: path.as_ref().to_path_buf(),
                source,
            },
        }
    }

    pub fn encode(path: impl AsRef<Path>, source: impl Into<EncodeError>) -> Self {
        Self::Encode {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    /// Whether the batch driver should count this as a skip rather than a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::AlreadyExists(_) | Self::PatternMismatch(_))
    }
}

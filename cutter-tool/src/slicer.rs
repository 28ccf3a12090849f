use std::fs;
use std::path::{Path, PathBuf};

use asset_naming::{exceeds_row_stride, piece_file_name};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::error::CutterError;

/// Number of rows and columns to cut a sheet into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
}

/// One rectangle of the grid, in source pixel coordinates.
///
/// `row` and `col` are 0-based; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Cell {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// 1-based (row, col) used for naming
    pub fn position(&self) -> (u32, u32) {
        (self.row + 1, self.col + 1)
    }

    pub fn file_name(&self) -> String {
        let (row, col) = self.position();
        piece_file_name(row, col)
    }
}

impl GridSpec {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Partition a `width` x `height` raster into row-major cells.
    ///
    /// Every cell is `width / cols` by `height / rows`, except the last
    /// column and last row which extend to the image edge.
    pub fn cells(&self, width: u32, height: u32) -> Result<Vec<Cell>, CutterError> {
        if self.rows == 0 || self.cols == 0 || self.cols > width || self.rows > height {
            return Err(CutterError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
                width,
                height,
            });
        }

        let cell_width = width / self.cols;
        let cell_height = height / self.rows;

        let mut cells = Vec::with_capacity(self.len());
        for row in 0..self.rows {
            for col in 0..self.cols {
                let left = col * cell_width;
                let top = row * cell_height;
                let right = if col == self.cols - 1 { width } else { left + cell_width };
                let bottom = if row == self.rows - 1 { height } else { top + cell_height };

                cells.push(Cell { row, col, left, top, right, bottom });
            }
        }

        Ok(cells)
    }
}

/// Cut an in-memory image into its grid cells.
///
/// The grid is checked up front; each piece is cropped only when the
/// iterator reaches it.
pub fn slice(
    image: &DynamicImage,
    grid: GridSpec,
) -> Result<impl Iterator<Item = (Cell, DynamicImage)> + '_, CutterError> {
    let (width, height) = image.dimensions();
    let cells = grid.cells(width, height)?;

    Ok(cells.into_iter().map(move |cell| {
        let piece = image.crop_imm(cell.left, cell.top, cell.width(), cell.height());
        (cell, piece)
    }))
}

/// `<dir>/<stem>_cut_images` next to the source image
pub fn default_output_dir(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = image_path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}_cut_images"))
}

/// Decode a source image, sniffing the format from its contents
pub fn load_image(path: &Path) -> Result<DynamicImage, CutterError> {
    if !path.exists() {
        return Err(CutterError::NotFound(path.to_path_buf()));
    }

    ImageReader::open(path)
        .map_err(|e| CutterError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| CutterError::io(path, e))?
        .decode()
        .map_err(|e| CutterError::decode(path, e))
}

/// Slice `image_path` and save every cell as `piece_RR_CC.png`.
///
/// Existing pieces are overwritten. A failure part way through leaves the
/// pieces saved so far in place.
pub fn cut_image(
    image_path: &Path,
    grid: GridSpec,
    output_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, CutterError> {
    let image = load_image(image_path)?;
    println!("Source image: {} x {} px", image.width(), image.height());

    let mut pieces = slice(&image, grid)?.peekable();

    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_dir(image_path));
    fs::create_dir_all(&output_dir).map_err(|e| CutterError::io(&output_dir, e))?;
    println!("Output directory: {}", output_dir.display());

    if exceeds_row_stride(grid.cols) {
        log::warn!(
            "{} columns per row: pieces past column 10 will share sequence numbers when renamed",
            grid.cols
        );
    }

    if let Some((first, _)) = pieces.peek() {
        println!(
            "Cutting into {} rows x {} cols, piece size {} x {} px",
            grid.rows,
            grid.cols,
            first.width(),
            first.height()
        );
    }

    let mut saved = Vec::with_capacity(grid.len());
    for (cell, piece) in pieces {
        let file_name = cell.file_name();
        let path = output_dir.join(&file_name);
        log::debug!(
            "{file_name}: ({}, {}) .. ({}, {})",
            cell.left,
            cell.top,
            cell.right,
            cell.bottom
        );

        piece
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| CutterError::encode(&path, e))?;

        let (row, col) = cell.position();
        println!("Generated: {file_name} (row {row}, col {col})");
        saved.push(path);
    }

    println!("\nDone! {} pieces created", saved.len());
    Ok(saved)
}

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use clap::ValueEnum;
use color_quant::NeuQuant;
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageDecoder, ImageReader, RgbImage, RgbaImage,
};

use crate::error::CutterError;

/// NeuQuant sampling factor: 1 looks at every pixel, 30 is the fastest
const QUANT_SAMPLE_FACTOR: i32 = 10;

/// Trade-off between PNG size and colour fidelity
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Quality {
    /// Keep every colour, only drop an unused alpha channel
    High,
    /// 256-colour palette for opaque images
    Medium,
    /// 128-colour palette for opaque images
    Low,
    /// 256-colour palette for everything, transparency flattened onto white
    Palette,
}

impl Quality {
    fn palette_size(self) -> usize {
        match self {
            Quality::Low => 128,
            _ => 256,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
            Quality::Palette => "palette",
        };
        f.write_str(name)
    }
}

/// Pixel data ready to be written as PNG
#[derive(Debug, Clone)]
pub enum PngPixels {
    Gray(GrayImage),
    GrayAlpha(GrayAlphaImage),
    Rgb(RgbImage),
    Rgba(RgbaImage),
    Indexed {
        width: u32,
        height: u32,
        /// RGB triples
        palette: Vec<u8>,
        indices: Vec<u8>,
    },
}

impl PngPixels {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PngPixels::Gray(img) => img.dimensions(),
            PngPixels::GrayAlpha(img) => img.dimensions(),
            PngPixels::Rgb(img) => img.dimensions(),
            PngPixels::Rgba(img) => img.dimensions(),
            PngPixels::Indexed { width, height, .. } => (*width, *height),
        }
    }

    fn color_type(&self) -> png::ColorType {
        match self {
            PngPixels::Gray(_) => png::ColorType::Grayscale,
            PngPixels::GrayAlpha(_) => png::ColorType::GrayscaleAlpha,
            PngPixels::Rgb(_) => png::ColorType::Rgb,
            PngPixels::Rgba(_) => png::ColorType::Rgba,
            PngPixels::Indexed { .. } => png::ColorType::Indexed,
        }
    }

    fn data(&self) -> &[u8] {
        match self {
            PngPixels::Gray(img) => img.as_raw(),
            PngPixels::GrayAlpha(img) => img.as_raw(),
            PngPixels::Rgb(img) => img.as_raw(),
            PngPixels::Rgba(img) => img.as_raw(),
            PngPixels::Indexed { indices, .. } => indices,
        }
    }
}

/// Decode an image and rotate/flip it upright according to its EXIF orientation
pub fn open_oriented(path: &Path) -> Result<DynamicImage, CutterError> {
    if !path.exists() {
        return Err(CutterError::NotFound(path.to_path_buf()));
    }

    let mut decoder = ImageReader::open(path)
        .map_err(|e| CutterError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| CutterError::io(path, e))?
        .into_decoder()
        .map_err(|e| CutterError::decode(path, e))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| CutterError::decode(path, e))?;

    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| CutterError::decode(path, e))?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Reduce an image to the smallest PNG layout the quality level allows
pub fn optimize(image: DynamicImage, quality: Quality) -> PngPixels {
    let image = match normalize(image) {
        DynamicImage::ImageRgba8(rgba) if is_opaque(&rgba) => {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
        }
        other => other,
    };

    match (quality, image) {
        (Quality::Medium | Quality::Low | Quality::Palette, DynamicImage::ImageRgb8(rgb)) => {
            quantize(&rgb, quality.palette_size())
        }
        (Quality::Palette, DynamicImage::ImageRgba8(rgba)) => {
            quantize(&flatten_on_white(&rgba), quality.palette_size())
        }
        (_, image) => into_pixels(image),
    }
}

/// Collapse exotic layouts (16-bit, float) to 8 bits per channel
fn normalize(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn into_pixels(image: DynamicImage) -> PngPixels {
    match image {
        DynamicImage::ImageLuma8(img) => PngPixels::Gray(img),
        DynamicImage::ImageLumaA8(img) => PngPixels::GrayAlpha(img),
        DynamicImage::ImageRgb8(img) => PngPixels::Rgb(img),
        other => PngPixels::Rgba(other.to_rgba8()),
    }
}

fn is_opaque(image: &RgbaImage) -> bool {
    image.pixels().all(|p| p[3] == u8::MAX)
}

fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let blend = |c: u8| {
            let c = u16::from(c);
            let a = u16::from(a);
            ((c * a + 255 * (255 - a) + 127) / 255) as u8
        };
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn quantize(image: &RgbImage, colors: usize) -> PngPixels {
    let (palette, indices) = match exact_palette(image, colors) {
        Some(exact) => exact,
        None => neuquant_palette(image, colors),
    };

    PngPixels::Indexed {
        width: image.width(),
        height: image.height(),
        palette,
        indices,
    }
}

/// Palette of every distinct colour, in order of first appearance, when
/// there are no more than `colors` of them
fn exact_palette(image: &RgbImage, colors: usize) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut slots: HashMap<[u8; 3], u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(image.width() as usize * image.height() as usize);

    for pixel in image.pixels() {
        let index = match slots.get(&pixel.0) {
            Some(&index) => index,
            None => {
                if slots.len() == colors.min(256) {
                    return None;
                }
                let index = slots.len() as u8;
                slots.insert(pixel.0, index);
                palette.extend_from_slice(&pixel.0);
                index
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

fn neuquant_palette(image: &RgbImage, colors: usize) -> (Vec<u8>, Vec<u8>) {
    let rgba: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
        .collect();
    let quant = NeuQuant::new(QUANT_SAMPLE_FACTOR, colors, &rgba);
    let indices = rgba
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    (quant.color_map_rgb(), indices)
}

/// Write pixels as a maximally compressed PNG, creating parent directories
pub fn write_png(path: &Path, pixels: &PngPixels) -> Result<(), CutterError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CutterError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| CutterError::io(path, e))?;
    let (width, height) = pixels.dimensions();

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(pixels.color_type());
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Best);
    if let PngPixels::Indexed { palette, .. } = pixels {
        encoder.set_palette(palette.as_slice());
    }

    let mut writer = encoder
        .write_header()
        .map_err(|e| CutterError::encode(path, e))?;
    writer
        .write_image_data(pixels.data())
        .map_err(|e| CutterError::encode(path, e))?;
    writer.finish().map_err(|e| CutterError::encode(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, Rgb, Rgba};
    use tempfile::TempDir;

    fn opaque_rgba() -> RgbaImage {
        RgbaImage::from_fn(16, 8, |x, y| Rgba([(x * 16) as u8, (y * 32) as u8, 90, 255]))
    }

    fn translucent_rgba() -> RgbaImage {
        RgbaImage::from_fn(16, 8, |x, _| Rgba([0, 0, 0, if x < 8 { 0 } else { 255 }]))
    }

    #[test]
    fn test_opaque_alpha_is_dropped() {
        let pixels = optimize(DynamicImage::ImageRgba8(opaque_rgba()), Quality::High);
        assert!(matches!(pixels, PngPixels::Rgb(ref img) if img.dimensions() == (16, 8)));
    }

    #[test]
    fn test_real_alpha_is_kept_above_palette_level() {
        for quality in [Quality::High, Quality::Medium, Quality::Low] {
            let pixels = optimize(DynamicImage::ImageRgba8(translucent_rgba()), quality);
            assert!(matches!(pixels, PngPixels::Rgba(_)), "{quality}");
        }
    }

    #[test]
    fn test_palette_flattens_transparency_onto_white() {
        let flat = flatten_on_white(&translucent_rgba());
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(15, 0), &Rgb([0, 0, 0]));

        let pixels = optimize(DynamicImage::ImageRgba8(translucent_rgba()), Quality::Palette);
        match pixels {
            PngPixels::Indexed { width, height, palette, indices } => {
                assert_eq!((width, height), (16, 8));
                assert_eq!(indices.len(), 16 * 8);
                assert!(palette.len() <= 256 * 3);
            }
            other => panic!("expected indexed pixels, got {other:?}"),
        }
    }

    #[test]
    fn test_palette_sizes() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        }));

        match optimize(rgb.clone(), Quality::Low) {
            PngPixels::Indexed { palette, .. } => assert!(palette.len() <= 128 * 3),
            other => panic!("expected indexed pixels, got {other:?}"),
        }
        match optimize(rgb.clone(), Quality::Medium) {
            PngPixels::Indexed { palette, .. } => assert!(palette.len() <= 256 * 3),
            other => panic!("expected indexed pixels, got {other:?}"),
        }
        assert!(matches!(optimize(rgb, Quality::High), PngPixels::Rgb(_)));
    }

    #[test]
    fn test_few_colours_keep_exact_palette() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("solid.png");
        let solid = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));

        let pixels = optimize(DynamicImage::ImageRgb8(solid.clone()), Quality::Palette);
        match &pixels {
            PngPixels::Indexed { palette, indices, .. } => {
                assert_eq!(palette, &vec![10, 20, 30]);
                assert!(indices.iter().all(|&i| i == 0));
            }
            other => panic!("expected indexed pixels, got {other:?}"),
        }

        write_png(&path, &pixels).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), solid);

        let one = RgbImage::from_pixel(1, 1, Rgb([200, 0, 99]));
        let pixels = optimize(DynamicImage::ImageRgb8(one.clone()), Quality::Low);
        write_png(&path, &pixels).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), one);
    }

    #[test]
    fn test_many_colours_fall_back_to_neuquant() {
        let noisy = RgbImage::from_fn(40, 40, |x, y| Rgb([(x * 6) as u8, (y * 6) as u8, (x ^ y) as u8]));
        assert!(exact_palette(&noisy, 128).is_none());

        match optimize(DynamicImage::ImageRgb8(noisy), Quality::Low) {
            PngPixels::Indexed { palette, indices, .. } => {
                assert!(palette.len() <= 128 * 3);
                assert_eq!(indices.len(), 40 * 40);
            }
            other => panic!("expected indexed pixels, got {other:?}"),
        }
    }

    #[test]
    fn test_grayscale_stays_grayscale() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([128])));
        assert!(matches!(optimize(gray, Quality::Palette), PngPixels::Gray(_)));
    }

    #[test]
    fn test_write_png_round_trips_lossless_output() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/out.png");
        let source = RgbImage::from_fn(9, 5, |x, y| Rgb([x as u8 * 20, y as u8 * 40, 3]));

        write_png(&path, &PngPixels::Rgb(source.clone())).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_write_indexed_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("indexed.png");
        let pixels = optimize(
            DynamicImage::ImageRgb8(RgbImage::from_fn(32, 20, |x, _| Rgb([x as u8 * 8, 0, 0]))),
            Quality::Palette,
        );

        write_png(&path, &pixels).unwrap();

        assert_eq!(image::open(&path).unwrap().dimensions(), (32, 20));
    }

    #[test]
    fn test_open_oriented() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        RgbImage::from_pixel(12, 7, Rgb([200, 100, 50])).save(&path).unwrap();

        let image = open_oriented(&path).unwrap();
        assert_eq!(image.dimensions(), (12, 7));

        let missing = tmp.path().join("missing.jpg");
        assert!(matches!(open_oriented(&missing), Err(CutterError::NotFound(_))));
    }
}

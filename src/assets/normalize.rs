//! Colour normalization, downsizing and encoding of stored images.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, Rgb, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::AssetError;

/// Composite any alpha channel onto white and return plain 8-bit RGB.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}

/// Shrink `img` to fit inside `max` x `max`, keeping its aspect ratio.
/// Images already inside the bound are returned unchanged.
pub fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    if img.width() > max || img.height() > max {
        img.resize(max, max, FilterType::Lanczos3)
    } else {
        img
    }
}

/// Displayable RGB version of `img`, no larger than `max_dimension`.
pub fn normalize(img: &DynamicImage, max_dimension: u32) -> RgbImage {
    let flat = DynamicImage::ImageRgb8(flatten_onto_white(img));
    fit_within(flat, max_dimension).to_rgb8()
}

/// Encode `img` at `path` in the format implied by its extension.
///
/// JPEG uses `jpeg_quality`; PNG uses the best compression level.
pub fn write_image(img: &RgbImage, path: &Path, jpeg_quality: u8) -> Result<(), AssetError> {
    let format = ImageFormat::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    let (width, height) = img.dimensions();

    match format {
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut writer, jpeg_quality.clamp(1, 100)).write_image(
                img.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Png => {
            PngEncoder::new_with_quality(&mut writer, CompressionType::Best, PngFilter::Adaptive)
                .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)?;
        }
        other => img.write_to(&mut writer, other)?,
    }

    writer.flush()?;
    Ok(())
}

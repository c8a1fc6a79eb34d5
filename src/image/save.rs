//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};

use super::ImageTensor;

/// Save one batch element of a tensor as an image file.
///
/// # Arguments
///
/// * `tensor` - BHWC tensor with values in [0, 1]
/// * `index` - Batch element to write
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the tensor cannot be represented as an image or the
/// file cannot be written.
pub fn save_image<P: AsRef<Path>>(
    tensor: &ImageTensor,
    index: usize,
    path: P,
    quality: u8,
) -> Result<()> {
    let path = path.as_ref();

    let img = tensor_to_image(tensor, index)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Saved batch element {index} to {}", path.display());
    Ok(())
}

/// Convert one batch element of a tensor to an 8-bit image.
#[allow(clippy::cast_possible_truncation)]
fn tensor_to_image(tensor: &ImageTensor, index: usize) -> Result<DynamicImage> {
    let (batch, height, width, channels) = tensor.dim();

    if index >= batch {
        return Err(Error::shape(
            format!("batch index below {batch}"),
            format!("index {index}"),
        ));
    }

    let samples: Vec<u8> = tensor
        .index_axis(ndarray::Axis(0), index)
        .iter()
        .map(|&v| quantize(v))
        .collect();

    // Safe: dimensions come from an in-memory tensor and fit in u32 for any saveable image
    let (w, h) = (width as u32, height as u32);
    let img = match channels {
        1 => GrayImage::from_raw(w, h, samples).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(w, h, samples).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(w, h, samples).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, samples).map(DynamicImage::ImageRgba8),
        _ => None,
    };

    img.ok_or_else(|| {
        Error::shape(
            "1 to 4 channels",
            format!("{channels} channels at {width}x{height}"),
        )
    })
}

/// Quantize a value from [0, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

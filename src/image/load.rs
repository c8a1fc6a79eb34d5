//! Image loading utilities.

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::ImageTensor;

/// Load an image from disk as a single-element BHWC tensor.
///
/// Grayscale images keep one channel, or two with alpha. Colour images
/// become three-channel RGB, or four with alpha. Values are scaled to `[0, 1]`.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ImageTensor> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let tensor = image_to_tensor(&img);
    tracing::debug!("Loaded {} as tensor {:?}", path.display(), tensor.dim());

    Ok(tensor)
}

/// Convert a `DynamicImage` to a `(1, height, width, channels)` tensor.
fn image_to_tensor(img: &DynamicImage) -> ImageTensor {
    let (width, height) = img.dimensions();
    let color = img.color();

    let (channels, samples): (usize, Vec<u8>) = if color.has_color() {
        if color.has_alpha() {
            (4, img.to_rgba8().into_raw())
        } else {
            (3, img.to_rgb8().into_raw())
        }
    } else if color.has_alpha() {
        (2, img.to_luma_alpha8().into_raw())
    } else {
        (1, img.to_luma8().into_raw())
    };

    let (width, height) = (width as usize, height as usize);
    Array4::from_shape_fn((1, height, width, channels), |(_, y, x, c)| {
        f32::from(samples[(y * width + x) * channels + c]) / 255.0
    })
}

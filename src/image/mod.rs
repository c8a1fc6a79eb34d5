//! Image tensors and the file boundary.

mod load;
mod save;

pub use load::load_image;
pub use save::save_image;

use ndarray::{Array4, ArrayD, Ix4};

use crate::error::{Error, Result};

/// Image tensor in BHWC format (batch, height, width, channels).
///
/// Channels are opaque numeric planes; values loaded from files are in `[0, 1]`.
pub type ImageTensor = Array4<f32>;

/// Convert a dynamically shaped array into an image tensor.
///
/// # Errors
///
/// Returns [`Error::Shape`] if the array is not rank-4.
pub fn from_dyn(array: ArrayD<f32>) -> Result<ImageTensor> {
    let actual = shape_string(array.shape());
    array
        .into_dimensionality::<Ix4>()
        .map_err(|_| Error::shape("(batch, height, width, channels)", actual))
}

/// Render a shape as `(a, b, ...)` for error messages.
pub(crate) fn shape_string(shape: &[usize]) -> String {
    let parts: Vec<String> = shape.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

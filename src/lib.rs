//! # boxbox
//!
//! Select a rectangular region of an image, crop it out, resize or edit it
//! independently, and composite the result back at the right place and scale.
//!
//! Images are BHWC `f32` tensors. The crop records an [`EffectiveBox`] that
//! must be handed to [`reinsert`] unchanged.
//!
//! ## Example
//!
//! ```
//! use boxbox::{crop, reinsert, resize, Interpolation, RegionSelector, ResizeConfig};
//! use ndarray::Array4;
//!
//! # fn main() -> boxbox::Result<()> {
//! let image = Array4::<f32>::zeros((1, 600, 800, 3));
//! let mut selector = RegionSelector::new();
//! let (image, region) = selector.select(
//!     image,
//!     Some(r#"{"x1":100,"y1":100,"x2":300,"y2":300,"selected":true}"#),
//! )?;
//!
//! let (sub_image, effective) = crop(&image, &region)?;
//! let (small, descriptor) = resize(sub_image, &ResizeConfig::exact(100, 100, Interpolation::Bilinear))?;
//! assert!((descriptor.scale_x - 0.5).abs() < f64::EPSILON);
//!
//! let composited = reinsert(&image, &small, &effective)?;
//! assert_eq!(composited.dim(), image.dim());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod pipeline;
pub mod region;

pub use error::{Error, Result};
pub use crate::image::ImageTensor;
pub use pipeline::{
    crop, reinsert, reinsert_with, resize, EffectiveBox, Interpolation, ResizeConfig,
    ResizeDescriptor, SizePreset,
};
pub use region::{BorderPosition, RegionModel, RegionSelector};

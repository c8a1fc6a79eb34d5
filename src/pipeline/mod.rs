//! Region crop, resize and reinsert pipeline.

mod crop;
mod interpolate;
mod reinsert;
mod resize;

pub use crop::{crop, EffectiveBox};
pub use interpolate::{resample, Interpolation};
pub use reinsert::{reinsert, reinsert_with};
pub use resize::{resize, ResizeConfig, ResizeDescriptor, SizePreset, MAX_DIMENSION};

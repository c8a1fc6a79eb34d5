//! Region descriptions and the selector that caches them.

mod model;
mod selector;

pub(crate) use model::expect_object;
pub use model::{BorderPosition, RegionModel};
pub use selector::RegionSelector;

//! Holds the most recent region chosen for one selector instance.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::image::ImageTensor;

use super::model::RegionModel;

/// Caller-owned cache of the last region description.
///
/// One instance per logical session. There is no internal locking: callers
/// sharing an instance must serialize their `select` calls.
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    last: RegionModel,
}

impl RegionSelector {
    /// Create a selector with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector seeded with a previously known region.
    #[must_use]
    pub fn with_region(region: RegionModel) -> Self {
        Self { last: region }
    }

    /// The cached region.
    #[must_use]
    pub fn last(&self) -> &RegionModel {
        &self.last
    }

    /// Thread the image through alongside the current region.
    ///
    /// A present, non-blank, non-`{}` description replaces the cache and is
    /// returned. Anything else returns the cached region unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `incoming` is present but malformed. The
    /// cache is left untouched in that case.
    pub fn select(
        &mut self,
        image: ImageTensor,
        incoming: Option<&str>,
    ) -> Result<(ImageTensor, RegionModel)> {
        let region = match incoming.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                let value: Value = serde_json::from_str(raw).map_err(|source| Error::Parse {
                    what: "region metadata",
                    source,
                })?;

                if is_empty_record(&value) {
                    tracing::debug!("Empty region metadata, reusing last selection");
                    self.last.clone()
                } else {
                    let region = RegionModel::from_value(value)?;
                    tracing::debug!("Caching new region selection: {}", region.to_json());
                    self.last = region.clone();
                    region
                }
            }
            None => {
                tracing::debug!("No region metadata, reusing last selection");
                self.last.clone()
            }
        };

        tracing::info!(
            "Region ({}, {})-({}, {}), selected: {}",
            region.x1,
            region.y1,
            region.x2,
            region.y2,
            region.selected
        );

        Ok((image, region))
    }
}

fn is_empty_record(value: &Value) -> bool {
    value.as_object().is_some_and(serde_json::Map::is_empty)
}

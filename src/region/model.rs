//! The region description exchanged with the selection front-end.

use std::fmt;

use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Where a region's border margin sits relative to the rectangle edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderPosition {
    /// Margin lies inside the rectangle; reinsertion feathers across it.
    #[default]
    Inside,
    /// Margin extends the rectangle outward.
    Outside,
    /// Rectangle is taken as already centred on the border.
    Center,
}

impl fmt::Display for BorderPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Center => "center",
        })
    }
}

/// A rectangle selected on an image, in the image's pixel space.
///
/// `(x1, y1)` and `(x2, y2)` are opposite corners. Coordinates are not
/// checked against any image here; crop and reinsert clamp them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionModel {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Display magnification of the selection UI. Never used in geometry.
    pub zoom: f64,
    pub border_width: u32,
    pub border_position: BorderPosition,
    /// `false` means nothing has been chosen and the coordinates are placeholders.
    pub selected: bool,
}

impl Default for RegionModel {
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            zoom: 1.0,
            border_width: 0,
            border_position: BorderPosition::Inside,
            selected: false,
        }
    }
}

impl RegionModel {
    /// Parse a region description from its JSON text.
    ///
    /// Missing fields take their defaults. Out-of-bounds coordinates are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text is not a JSON object or a field
    /// has the wrong type.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|source| Error::Parse {
            what: "region metadata",
            source,
        })?;
        Self::from_value(value)
    }

    /// Build a region from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the value is not an object or a field has
    /// the wrong type.
    pub fn from_value(value: Value) -> Result<Self> {
        expect_object(&value, "region metadata")?;
        serde_json::from_value(value).map_err(|source| Error::Parse {
            what: "region metadata",
            source,
        })
    }

    /// Serialize to the JSON record understood by the selection front-end.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether the corners satisfy `0 <= x1 < x2` and `0 <= y1 < y2`.
    #[must_use]
    pub fn has_valid_geometry(&self) -> bool {
        0.0 <= self.x1 && self.x1 < self.x2 && 0.0 <= self.y1 && self.y1 < self.y2
    }
}

/// Reject anything but a JSON object before handing it to serde.
///
/// Derived struct deserializers also accept arrays positionally.
pub(crate) fn expect_object(value: &Value, what: &'static str) -> Result<()> {
    if value.is_object() {
        return Ok(());
    }

    let unexpected = match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    };

    Err(Error::Parse {
        what,
        source: serde_json::Error::invalid_type(unexpected, &"a JSON object"),
    })
}

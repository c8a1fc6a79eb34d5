//! Region extraction and the effective box it records.

use ndarray::s;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::image::ImageTensor;
use crate::region::{expect_object, BorderPosition, RegionModel};

/// The box a crop actually extracted, in original-image pixels.
///
/// Reinsertion consumes this verbatim. It is never recomputed from the
/// region that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveBox {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
    /// Width of the cropped sub-image.
    pub width: usize,
    /// Height of the cropped sub-image.
    pub height: usize,
    #[serde(default)]
    pub border_width: u32,
    #[serde(default)]
    pub border_position: BorderPosition,
    /// Canvas size at crop time, zero when unknown.
    #[serde(default)]
    pub canvas_width: usize,
    #[serde(default)]
    pub canvas_height: usize,
}

impl EffectiveBox {
    /// Parse a box from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text is not an object carrying the
    /// corner and size fields.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|source| Error::Parse {
            what: "crop box metadata",
            source,
        })?;
        expect_object(&value, "crop box metadata")?;
        serde_json::from_value(value).map_err(|source| Error::Parse {
            what: "crop box metadata",
            source,
        })
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Apply the border policy to rounded corners.
///
/// `inside` keeps at least one pixel per axis, anchored at the shrunk
/// top-left corner.
fn apply_border(corners: [i64; 4], border: i64, position: BorderPosition) -> [i64; 4] {
    let [x1, y1, x2, y2] = corners;
    match position {
        BorderPosition::Outside => [
            x1.saturating_sub(border),
            y1.saturating_sub(border),
            x2.saturating_add(border),
            y2.saturating_add(border),
        ],
        BorderPosition::Inside => {
            let (x1, y1) = (x1.saturating_add(border), y1.saturating_add(border));
            [
                x1,
                y1,
                x2.saturating_sub(border).max(x1.saturating_add(1)),
                y2.saturating_sub(border).max(y1.saturating_add(1)),
            ]
        }
        BorderPosition::Center => corners,
    }
}

/// Extract the region from every batch element of `image`.
///
/// Corners are rounded to whole pixels, adjusted by the border policy and
/// clamped to the image before slicing.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if the region is not selected and
/// [`Error::EmptyRegion`] if the clamped box has no area.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn crop(image: &ImageTensor, region: &RegionModel) -> Result<(ImageTensor, EffectiveBox)> {
    let (_, height, width, _) = image.dim();

    if !region.selected {
        return Err(Error::InvalidParameter {
            name: "selected".to_string(),
            reason: "no region has been selected".to_string(),
        });
    }

    if !region.has_valid_geometry() {
        tracing::debug!(
            "Region ({}, {})-({}, {}) is outside the 0 <= x1 < x2, 0 <= y1 < y2 contract",
            region.x1,
            region.y1,
            region.x2,
            region.y2
        );
    }

    let (w, h) = (width as i64, height as i64);
    let border = i64::from(region.border_width);

    // Far-off corners only need to stay far off after the border is applied
    let limit = w.max(h).saturating_add(border).saturating_add(1);
    let corners = [region.x1, region.y1, region.x2, region.y2]
        .map(|v| (v.round() as i64).clamp(-limit, limit));
    let [x1, y1, x2, y2] = apply_border(corners, border, region.border_position);

    let (cx1, cx2) = (x1.clamp(0, w), x2.clamp(0, w));
    let (cy1, cy2) = (y1.clamp(0, h), y2.clamp(0, h));

    if cx2 <= cx1 || cy2 <= cy1 {
        return Err(Error::EmptyRegion {
            x1,
            y1,
            x2,
            y2,
            width,
            height,
        });
    }

    // Safe: clamped into [0, width] and [0, height] above
    let (x1, y1, x2, y2) = (cx1 as usize, cy1 as usize, cx2 as usize, cy2 as usize);

    let sub_image = image.slice(s![.., y1..y2, x1..x2, ..]).to_owned();

    let effective = EffectiveBox {
        x1,
        y1,
        x2,
        y2,
        width: x2 - x1,
        height: y2 - y1,
        border_width: region.border_width,
        border_position: region.border_position,
        canvas_width: width,
        canvas_height: height,
    };

    tracing::info!(
        "Cropped ({x1}, {y1})-({x2}, {y2}) from {width}x{height} -> {}x{} (border {}px {})",
        effective.width,
        effective.height,
        region.border_width,
        region.border_position
    );

    Ok((sub_image, effective))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[allow(clippy::cast_precision_loss)]
    fn gradient(h: usize, w: usize) -> ImageTensor {
        Array4::from_shape_fn((2, h, w, 3), |(b, y, x, c)| {
            (b * 1_000_000 + y * 1000 + x * 10 + c) as f32
        })
    }

    fn region(x1: f64, y1: f64, x2: f64, y2: f64) -> RegionModel {
        RegionModel {
            x1,
            y1,
            x2,
            y2,
            selected: true,
            ..RegionModel::default()
        }
    }

    #[test]
    fn test_crop_800x600_scenario() {
        let image = Array4::<f32>::zeros((1, 600, 800, 3));
        let (sub, effective) = crop(&image, &region(100.0, 100.0, 300.0, 300.0)).unwrap();

        assert_eq!(sub.dim(), (1, 200, 200, 3));
        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (100, 100, 300, 300)
        );
        assert_eq!((effective.width, effective.height), (200, 200));
        assert_eq!((effective.canvas_width, effective.canvas_height), (800, 600));
    }

    #[test]
    fn test_crop_copies_pixels_per_batch() {
        let image = gradient(10, 12);
        let (sub, _) = crop(&image, &region(2.0, 3.0, 6.0, 8.0)).unwrap();

        assert_eq!(sub.dim(), (2, 5, 4, 3));
        assert_eq!(sub[[0, 0, 0, 0]], image[[0, 3, 2, 0]]);
        assert_eq!(sub[[1, 4, 3, 2]], image[[1, 7, 5, 2]]);
    }

    #[test]
    fn test_fractional_corners_round() {
        let image = gradient(10, 10);
        let (_, effective) = crop(&image, &region(1.4, 1.5, 5.6, 7.2)).unwrap();
        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (1, 2, 6, 7)
        );
    }

    #[test]
    fn test_outside_border_expands_and_clamps() {
        let image = gradient(20, 20);
        let r = RegionModel {
            border_width: 3,
            border_position: BorderPosition::Outside,
            ..region(2.0, 5.0, 10.0, 18.0)
        };
        let (sub, effective) = crop(&image, &r).unwrap();

        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (0, 2, 13, 20)
        );
        assert_eq!(sub.dim(), (2, 18, 13, 3));
    }

    #[test]
    fn test_inside_border_shrinks_with_floor() {
        let image = gradient(20, 20);
        let r = RegionModel {
            border_width: 2,
            ..region(4.0, 4.0, 14.0, 7.0)
        };
        let (_, effective) = crop(&image, &r).unwrap();

        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (6, 6, 12, 7)
        );
        assert_eq!(effective.border_position, BorderPosition::Inside);
    }

    #[test]
    fn test_center_border_leaves_box() {
        let image = gradient(20, 20);
        let r = RegionModel {
            border_width: 5,
            border_position: BorderPosition::Center,
            ..region(4.0, 4.0, 14.0, 9.0)
        };
        let (_, effective) = crop(&image, &r).unwrap();
        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (4, 4, 14, 9)
        );
        assert_eq!(effective.border_width, 5);
    }

    #[test]
    fn test_unselected_region_is_rejected() {
        let image = gradient(10, 10);
        let err = crop(&image, &RegionModel::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "selected"));

        let stale = RegionModel {
            selected: false,
            ..region(1.0, 1.0, 5.0, 5.0)
        };
        let err = crop(&image, &stale).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert!(err.to_string().contains("selected"), "{err}");
    }

    #[test]
    fn test_huge_far_corner_clamps() {
        let image = gradient(10, 10);
        let r = RegionModel::parse(
            r#"{"x1":2,"y1":2,"x2":1e19,"y2":8,"borderWidth":1,
                "borderPosition":"outside","selected":true}"#,
        )
        .unwrap();
        let (sub, effective) = crop(&image, &r).unwrap();

        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (1, 1, 10, 9)
        );
        assert_eq!(sub.dim(), (2, 8, 9, 3));

        let inside = RegionModel {
            border_width: 2,
            border_position: BorderPosition::Inside,
            ..r
        };
        let (_, effective) = crop(&image, &inside).unwrap();
        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (4, 4, 10, 6)
        );
    }

    #[test]
    fn test_huge_negative_corner_clamps() {
        let image = gradient(10, 10);
        let r = RegionModel {
            border_width: 1,
            border_position: BorderPosition::Outside,
            ..region(-1e19, 2.0, 5.0, 8.0)
        };
        let (_, effective) = crop(&image, &r).unwrap();
        assert_eq!(
            (effective.x1, effective.y1, effective.x2, effective.y2),
            (0, 1, 6, 9)
        );

        let r = RegionModel {
            border_width: u32::MAX,
            ..region(-1e19, -1e19, 1e19, 1e19)
        };
        let (_, effective) = crop(&image, &r).unwrap();
        assert_eq!((effective.x1, effective.x2), (0, 10));
    }

    #[test]
    fn test_region_outside_image_is_empty() {
        let image = gradient(10, 10);
        let err = crop(&image, &region(20.0, 20.0, 40.0, 40.0)).unwrap_err();
        assert!(err.to_string().contains("10x10"));
        assert!(crop(&image, &region(5.0, 5.0, 3.0, 8.0)).is_err());
    }

    #[test]
    fn test_effective_box_always_inside_image() {
        let mut rng = StdRng::seed_from_u64(7);
        let image = Array4::<f32>::zeros((1, 37, 53, 1));
        let positions = [
            BorderPosition::Inside,
            BorderPosition::Outside,
            BorderPosition::Center,
        ];

        for _ in 0..500 {
            let x1 = rng.random_range(-20.0..80.0);
            let y1 = rng.random_range(-20.0..60.0);
            let r = RegionModel {
                border_width: rng.random_range(0..8),
                border_position: positions[rng.random_range(0..3_usize)],
                ..region(
                    x1,
                    y1,
                    x1 + rng.random_range(0.5..60.0),
                    y1 + rng.random_range(0.5..60.0),
                )
            };

            if let Ok((sub, b)) = crop(&image, &r) {
                assert!(b.x1 < b.x2 && b.x2 <= 53, "{b:?}");
                assert!(b.y1 < b.y2 && b.y2 <= 37, "{b:?}");
                assert_eq!(sub.dim(), (1, b.height, b.width, 1));
            }
        }
    }

    #[test]
    fn test_effective_box_json() {
        let image = gradient(10, 10);
        let (_, effective) = crop(&image, &region(1.0, 2.0, 3.0, 4.0)).unwrap();
        let json = effective.to_json();

        assert!(json.contains("\"borderPosition\":\"inside\""));
        assert!(json.contains("\"canvasWidth\":10"));
        assert_eq!(EffectiveBox::parse(&json).unwrap(), effective);

        let minimal = EffectiveBox::parse(r#"{"x1":1,"y1":2,"x2":3,"y2":4,"width":2,"height":2}"#)
            .unwrap();
        assert_eq!(minimal.border_width, 0);
        assert!(EffectiveBox::parse(r#"{"x1":1}"#).is_err());
        assert!(EffectiveBox::parse(r#"{"x1":-1,"y1":2,"x2":3,"y2":4,"width":2,"height":2}"#).is_err());
    }
}

//! Compositing an edited crop back into its canvas.

use ndarray::s;

use crate::error::{Error, Result};
use crate::image::{shape_string, ImageTensor};
use crate::region::BorderPosition;

use super::crop::EffectiveBox;
use super::interpolate::{resample, Interpolation};

/// Reinsert an edited crop, restoring its size with bilinear sampling.
///
/// # Errors
///
/// See [`reinsert_with`].
pub fn reinsert(
    original: &ImageTensor,
    edited: &ImageTensor,
    effective: &EffectiveBox,
) -> Result<ImageTensor> {
    reinsert_with(original, edited, effective, Interpolation::Bilinear)
}

/// Reinsert an edited crop into `original` at `effective`.
///
/// The edited buffer is first resampled back to the crop-time size if an
/// external step changed it. Pixels inside the box are replaced; with an
/// `inside` border they are feathered linearly from the original at the box
/// edge to the edited value `borderWidth` pixels in. The result always has
/// the shape of `original`.
///
/// An edited batch of 1 is applied to every canvas batch element.
///
/// # Errors
///
/// Returns [`Error::Shape`] on a channel or batch mismatch,
/// [`Error::InvalidParameter`] if the box disagrees with its own size, and
/// [`Error::EmptyRegion`] if the box misses the canvas entirely.
#[allow(clippy::cast_possible_wrap)]
pub fn reinsert_with(
    original: &ImageTensor,
    edited: &ImageTensor,
    effective: &EffectiveBox,
    interpolation: Interpolation,
) -> Result<ImageTensor> {
    let (batch, height, width, channels) = original.dim();
    let (edit_batch, edit_height, edit_width, edit_channels) = edited.dim();

    if channels != edit_channels {
        return Err(Error::shape(
            format!("{channels} channels to match canvas {}", shape_string(original.shape())),
            format!("{edit_channels} channels in {}", shape_string(edited.shape())),
        ));
    }

    if edit_batch != batch && edit_batch != 1 {
        return Err(Error::shape(
            format!("batch of 1 or {batch}"),
            format!("batch of {edit_batch}"),
        ));
    }

    if effective.width == 0
        || effective.height == 0
        || effective.x2.checked_sub(effective.x1) != Some(effective.width)
        || effective.y2.checked_sub(effective.y1) != Some(effective.height)
    {
        return Err(Error::InvalidParameter {
            name: "crop box".to_string(),
            reason: format!(
                "corners ({}, {})-({}, {}) do not span {}x{}",
                effective.x1,
                effective.y1,
                effective.x2,
                effective.y2,
                effective.width,
                effective.height
            ),
        });
    }

    if effective.canvas_width != 0
        && (effective.canvas_width, effective.canvas_height) != (width, height)
    {
        tracing::warn!(
            "Canvas is {width}x{height} but the box was cropped from {}x{}",
            effective.canvas_width,
            effective.canvas_height
        );
    }

    let x2 = effective.x2.min(width);
    let y2 = effective.y2.min(height);
    let x1 = effective.x1.min(x2);
    let y1 = effective.y1.min(y2);

    if x2 == x1 || y2 == y1 {
        return Err(Error::EmptyRegion {
            x1: effective.x1 as i64,
            y1: effective.y1 as i64,
            x2: effective.x2 as i64,
            y2: effective.y2 as i64,
            width,
            height,
        });
    }

    let restored;
    let patch = if (edit_height, edit_width) == (effective.height, effective.width) {
        edited
    } else {
        tracing::debug!(
            "Restoring edited crop {edit_width}x{edit_height} -> {}x{} ({interpolation})",
            effective.width,
            effective.height
        );
        restored = resample(edited, effective.height, effective.width, interpolation)?;
        &restored
    };

    let (rows, cols) = (y2 - y1, x2 - x1);
    let mut output = original.clone();
    output
        .slice_mut(s![.., y1..y2, x1..x2, ..])
        .assign(&patch.slice(s![.., ..rows, ..cols, ..]));

    if effective.border_position == BorderPosition::Inside && effective.border_width > 0 {
        feather(&mut output, original, effective, (x1, y1, x2, y2));
    }

    tracing::info!("Reinserted {cols}x{rows} at ({x1}, {y1}) into {width}x{height} canvas");

    Ok(output)
}

/// Blend the margin just inside the box edge back toward the original.
#[allow(clippy::cast_precision_loss)]
fn feather(
    output: &mut ImageTensor,
    original: &ImageTensor,
    effective: &EffectiveBox,
    (x1, y1, x2, y2): (usize, usize, usize, usize),
) {
    let border = effective.border_width as f32;
    let (batch, _, _, channels) = output.dim();

    for y in y1..y2 {
        for x in x1..x2 {
            let weight = feather_weight(
                x - effective.x1,
                y - effective.y1,
                effective.width,
                effective.height,
                border,
            );
            if weight >= 1.0 {
                continue;
            }

            for b in 0..batch {
                for c in 0..channels {
                    let base = original[[b, y, x, c]];
                    let top = output[[b, y, x, c]];
                    output[[b, y, x, c]] = (top - base).mul_add(weight, base);
                }
            }
        }
    }
}

/// Linear weight of the edited pixel: 0 on the box edge, 1 at `border` pixels in.
#[allow(clippy::cast_precision_loss)]
fn feather_weight(px: usize, py: usize, width: usize, height: usize, border: f32) -> f32 {
    let distance = px.min(py).min(width - 1 - px).min(height - 1 - py);
    (distance as f32 / border).min(1.0)
}

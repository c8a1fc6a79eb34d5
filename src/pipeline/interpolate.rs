//! Separable resampling kernels with half-pixel sample centres.

use std::fmt;
use std::str::FromStr;

use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::ImageTensor;

/// Cubic convolution coefficient used by the bicubic kernel.
const CUBIC_A: f64 = -0.75;

/// Interpolation kernel used when a buffer changes size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Bilinear,
    Bicubic,
    Nearest,
}

impl Interpolation {
    /// All kernels, in the order the front-end lists them.
    pub const ALL: [Self; 3] = [Self::Bilinear, Self::Bicubic, Self::Nearest];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Nearest => "nearest",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidParameter {
                name: "interpolation_mode".to_string(),
                reason: format!("unknown mode {s:?}, expected bilinear, bicubic or nearest"),
            })
    }
}

/// Source taps for every output position along one axis.
struct AxisTaps {
    taps: usize,
    index: Vec<usize>,
    weight: Vec<f32>,
}

impl AxisTaps {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn new(kind: Interpolation, input: usize, output: usize) -> Self {
        let scale = input as f64 / output as f64;
        let last = input - 1;

        match kind {
            Interpolation::Nearest => {
                let index = (0..output)
                    .map(|dst| ((dst as f64 * scale).floor() as usize).min(last))
                    .collect();
                Self {
                    taps: 1,
                    index,
                    weight: vec![1.0; output],
                }
            }
            Interpolation::Bilinear => {
                let mut index = Vec::with_capacity(output * 2);
                let mut weight = Vec::with_capacity(output * 2);
                for dst in 0..output {
                    let src = scale.mul_add(dst as f64 + 0.5, -0.5).max(0.0);
                    let x0 = (src.floor() as usize).min(last);
                    let x1 = (x0 + 1).min(last);
                    let frac = (src - x0 as f64).clamp(0.0, 1.0);
                    index.extend([x0, x1]);
                    weight.extend([(1.0 - frac) as f32, frac as f32]);
                }
                Self {
                    taps: 2,
                    index,
                    weight,
                }
            }
            Interpolation::Bicubic => {
                let mut index = Vec::with_capacity(output * 4);
                let mut weight = Vec::with_capacity(output * 4);
                for dst in 0..output {
                    let src = scale.mul_add(dst as f64 + 0.5, -0.5);
                    let x0 = src.floor();
                    let t = src - x0;
                    let coeffs = [
                        cubic_outer(t + 1.0),
                        cubic_inner(t),
                        cubic_inner(1.0 - t),
                        cubic_outer(2.0 - t),
                    ];
                    for (k, coeff) in coeffs.into_iter().enumerate() {
                        let at = (x0 as i64 - 1 + k as i64).clamp(0, last as i64) as usize;
                        index.push(at);
                        weight.push(coeff as f32);
                    }
                }
                Self {
                    taps: 4,
                    index,
                    weight,
                }
            }
        }
    }

    fn taps_for(&self, dst: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let range = dst * self.taps..(dst + 1) * self.taps;
        self.index[range.clone()]
            .iter()
            .copied()
            .zip(self.weight[range].iter().copied())
    }
}

/// Cubic convolution for `|x| <= 1`.
fn cubic_inner(x: f64) -> f64 {
    ((CUBIC_A + 2.0) * x - (CUBIC_A + 3.0)) * x * x + 1.0
}

/// Cubic convolution for `1 < |x| < 2`.
fn cubic_outer(x: f64) -> f64 {
    ((CUBIC_A * x - 5.0 * CUBIC_A) * x + 8.0 * CUBIC_A) * x - 4.0 * CUBIC_A
}

/// Resample every batch element and channel of `image` to `height` x `width`.
///
/// Sample positions use half-pixel centres, so input and output corner
/// pixels are not aligned. Axes whose size is unchanged are sampled exactly.
///
/// # Errors
///
/// Returns [`Error::Shape`] if the input or target has a zero-sized axis.
pub fn resample(
    image: &ImageTensor,
    height: usize,
    width: usize,
    kind: Interpolation,
) -> Result<ImageTensor> {
    let (batch, in_h, in_w, channels) = image.dim();

    if in_h == 0 || in_w == 0 {
        return Err(Error::shape(
            "non-empty height and width",
            format!("{in_w}x{in_h}"),
        ));
    }
    if height == 0 || width == 0 {
        return Err(Error::shape(
            "non-empty target size",
            format!("{width}x{height}"),
        ));
    }

    let x_taps = AxisTaps::new(kind, in_w, width);
    let y_taps = AxisTaps::new(kind, in_h, height);

    let horizontal = Array4::from_shape_fn((batch, in_h, width, channels), |(b, y, x, c)| {
        x_taps
            .taps_for(x)
            .map(|(sx, w)| image[[b, y, sx, c]] * w)
            .sum::<f32>()
    });

    Ok(Array4::from_shape_fn(
        (batch, height, width, channels),
        |(b, y, x, c)| {
            y_taps
                .taps_for(y)
                .map(|(sy, w)| horizontal[[b, sy, x, c]] * w)
                .sum::<f32>()
        },
    ))
}

//! Preset and custom resizing with a descriptor of the applied scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::image::ImageTensor;
use crate::region::expect_object;

use super::interpolate::{resample, Interpolation};

/// Largest custom width or height accepted by [`ResizeConfig::validate`].
pub const MAX_DIMENSION: usize = 8192;

/// Named output sizes offered as resize shortcuts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizePreset {
    /// Use the explicit width and height.
    #[default]
    Custom,
    Square1024,
    Portrait896x1152,
    Portrait832x1216,
    Portrait768x1344,
    Portrait640x1536,
    Landscape1152x896,
    Landscape1216x832,
    Landscape1344x768,
    Landscape1536x640,
}

impl SizePreset {
    /// Every preset, `Custom` first.
    pub const ALL: [Self; 10] = [
        Self::Custom,
        Self::Square1024,
        Self::Portrait896x1152,
        Self::Portrait832x1216,
        Self::Portrait768x1344,
        Self::Portrait640x1536,
        Self::Landscape1152x896,
        Self::Landscape1216x832,
        Self::Landscape1344x768,
        Self::Landscape1536x640,
    ];

    /// Display label, as listed by the node front-end.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::Square1024 => "1:1 Square 1024x1024",
            Self::Portrait896x1152 => "3:4 Portrait 896x1152",
            Self::Portrait832x1216 => "5:8 Portrait 832x1216",
            Self::Portrait768x1344 => "9:16 Portrait 768x1344",
            Self::Portrait640x1536 => "9:21 Portrait 640x1536",
            Self::Landscape1152x896 => "4:3 Landscape 1152x896",
            Self::Landscape1216x832 => "3:2 Landscape 1216x832",
            Self::Landscape1344x768 => "16:9 Landscape 1344x768",
            Self::Landscape1536x640 => "21:9 Landscape 1536x640",
        }
    }

    /// Fixed `(width, height)`, or `None` for `Custom`.
    #[must_use]
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        match self {
            Self::Custom => None,
            Self::Square1024 => Some((1024, 1024)),
            Self::Portrait896x1152 => Some((896, 1152)),
            Self::Portrait832x1216 => Some((832, 1216)),
            Self::Portrait768x1344 => Some((768, 1344)),
            Self::Portrait640x1536 => Some((640, 1536)),
            Self::Landscape1152x896 => Some((1152, 896)),
            Self::Landscape1216x832 => Some((1216, 832)),
            Self::Landscape1344x768 => Some((1344, 768)),
            Self::Landscape1536x640 => Some((1536, 640)),
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for SizePreset {
    type Err = Error;

    /// Accepts the full label, `custom`, or a `WIDTHxHEIGHT` shorthand.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|preset| {
                preset.label().eq_ignore_ascii_case(s)
                    || preset
                        .dimensions()
                        .is_some_and(|(w, h)| format!("{w}x{h}").eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| Error::InvalidParameter {
                name: "size".to_string(),
                reason: format!("unknown preset {s:?}"),
            })
    }
}

/// Options for one resize call.
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    /// Named size, or `Custom` to use `width` and `height`.
    pub preset: SizePreset,

    /// Custom target width.
    pub width: usize,

    /// Custom target height.
    pub height: usize,

    /// Derive the height from the target width and the input aspect ratio.
    pub keep_aspect_ratio: bool,

    /// Resampling kernel.
    pub interpolation: Interpolation,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            preset: SizePreset::Custom,
            width: 1024,
            height: 1024,
            keep_aspect_ratio: true,
            interpolation: Interpolation::Bilinear,
        }
    }
}

impl ResizeConfig {
    /// Explicit target size, aspect ratio not kept.
    #[must_use]
    pub fn exact(width: usize, height: usize, interpolation: Interpolation) -> Self {
        Self {
            preset: SizePreset::Custom,
            width,
            height,
            keep_aspect_ratio: false,
            interpolation,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a custom dimension that will be used is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.preset != SizePreset::Custom {
            return Ok(());
        }

        // Height is ignored when the aspect ratio is kept
        let mut checked = vec![("width", self.width)];
        if !self.keep_aspect_ratio {
            checked.push(("height", self.height));
        }

        for (name, value) in checked {
            if !(1..=MAX_DIMENSION).contains(&value) {
                return Err(Error::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be between 1 and {MAX_DIMENSION}"),
                });
            }
        }

        Ok(())
    }

    /// The `(width, height)` requested before aspect handling.
    #[must_use]
    pub fn target(&self) -> (usize, usize) {
        self.preset
            .dimensions()
            .unwrap_or((self.width, self.height))
    }
}

/// Record of what a resize did, consumed downstream as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeDescriptor {
    pub original_width: usize,
    pub original_height: usize,
    pub resized_width: usize,
    pub resized_height: usize,
    pub scale_x: f64,
    pub scale_y: f64,
    #[serde(rename = "size_preset")]
    pub preset: String,
    pub keep_aspect_ratio: bool,
    #[serde(rename = "interpolation_mode")]
    pub interpolation: Interpolation,
}

impl ResizeDescriptor {
    /// Parse a descriptor from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text is not a complete descriptor object.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|source| Error::Parse {
            what: "resize metadata",
            source,
        })?;
        expect_object(&value, "resize metadata")?;
        serde_json::from_value(value).map_err(|source| Error::Parse {
            what: "resize metadata",
            source,
        })
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether the resize left the buffer untouched.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.original_width == self.resized_width && self.original_height == self.resized_height
    }
}

/// Resize an image to a preset or custom size.
///
/// With `keep_aspect_ratio` the target width always wins and the height is
/// `round(width * original_height / original_width)`. When the final size
/// equals the input size the input is returned untouched with unit scales.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the image has an
/// empty axis.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn resize(image: ImageTensor, config: &ResizeConfig) -> Result<(ImageTensor, ResizeDescriptor)> {
    config.validate()?;

    let (_, original_height, original_width, _) = image.dim();
    if original_height == 0 || original_width == 0 {
        return Err(Error::shape(
            "non-empty height and width",
            format!("{original_width}x{original_height}"),
        ));
    }

    let (target_width, target_height) = config.target();
    let (final_width, final_height) = if config.keep_aspect_ratio {
        let aspect_ratio = original_height as f64 / original_width as f64;
        let height = (target_width as f64 * aspect_ratio).round() as usize;
        (target_width, height.max(1))
    } else {
        (target_width, target_height)
    };

    let mut descriptor = ResizeDescriptor {
        original_width,
        original_height,
        resized_width: final_width,
        resized_height: final_height,
        scale_x: 1.0,
        scale_y: 1.0,
        preset: config.preset.label().to_string(),
        keep_aspect_ratio: config.keep_aspect_ratio,
        interpolation: config.interpolation,
    };

    if descriptor.is_identity() {
        tracing::debug!("Size unchanged at {original_width}x{original_height}, skipping resample");
        return Ok((image, descriptor));
    }

    let resized = resample(&image, final_height, final_width, config.interpolation)?;
    descriptor.scale_x = final_width as f64 / original_width as f64;
    descriptor.scale_y = final_height as f64 / original_height as f64;

    tracing::info!(
        "Resized {original_width}x{original_height} -> {final_width}x{final_height} (preset: {}, keep_aspect: {})",
        config.preset,
        config.keep_aspect_ratio
    );

    Ok((resized, descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn image(h: usize, w: usize) -> ImageTensor {
        Array4::from_elem((2, h, w, 3), 0.5)
    }

    #[test]
    fn test_preset_table() {
        assert_eq!(SizePreset::Square1024.dimensions(), Some((1024, 1024)));
        assert_eq!(SizePreset::Portrait640x1536.dimensions(), Some((640, 1536)));
        assert_eq!(SizePreset::Landscape1344x768.dimensions(), Some((1344, 768)));
        assert_eq!(SizePreset::Custom.dimensions(), None);
        assert_eq!(
            SizePreset::ALL.iter().filter(|p| p.dimensions().is_some()).count(),
            9
        );
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(
            "16:9 Landscape 1344x768".parse::<SizePreset>().unwrap(),
            SizePreset::Landscape1344x768
        );
        assert_eq!("832x1216".parse::<SizePreset>().unwrap(), SizePreset::Portrait832x1216);
        assert_eq!("custom".parse::<SizePreset>().unwrap(), SizePreset::Custom);
        assert!("800x600".parse::<SizePreset>().is_err());
    }

    #[test]
    fn test_validate_custom_bounds() {
        assert!(ResizeConfig::exact(0, 10, Interpolation::Nearest).validate().is_err());
        assert!(ResizeConfig::exact(10, MAX_DIMENSION + 1, Interpolation::Nearest)
            .validate()
            .is_err());
        assert!(ResizeConfig::exact(64, 64, Interpolation::Nearest).validate().is_ok());

        let preset = ResizeConfig {
            preset: SizePreset::Square1024,
            width: 0,
            ..ResizeConfig::default()
        };
        assert!(preset.validate().is_ok());
    }

    #[test]
    fn test_same_size_returns_input() {
        let input = image(20, 30);
        let (output, descriptor) =
            resize(input.clone(), &ResizeConfig::exact(30, 20, Interpolation::Bicubic)).unwrap();

        assert_eq!(output, input);
        assert!((descriptor.scale_x - 1.0).abs() < f64::EPSILON);
        assert!((descriptor.scale_y - 1.0).abs() < f64::EPSILON);
        assert!(descriptor.is_identity());
    }

    #[test]
    fn test_keep_aspect_uses_width_only() {
        let config = ResizeConfig {
            width: 100,
            height: 9999,
            keep_aspect_ratio: true,
            ..ResizeConfig::default()
        };
        let (output, descriptor) = resize(image(60, 80), &config).unwrap();

        assert_eq!(descriptor.resized_width, 100);
        assert_eq!(descriptor.resized_height, 75);
        assert_eq!(output.dim(), (2, 75, 100, 3));
    }

    #[test]
    fn test_keep_aspect_rounds_to_nearest() {
        // 3/7 * 50 = 21.43 -> 21, 4/7 * 50 = 28.57 -> 29
        let config = ResizeConfig {
            width: 50,
            keep_aspect_ratio: true,
            ..ResizeConfig::default()
        };
        let (_, d) = resize(image(3, 7), &config).unwrap();
        assert_eq!(d.resized_height, 21);
        let (_, d) = resize(image(4, 7), &config).unwrap();
        assert_eq!(d.resized_height, 29);
    }

    #[test]
    fn test_preset_with_keep_aspect() {
        let config = ResizeConfig {
            preset: SizePreset::Landscape1536x640,
            keep_aspect_ratio: true,
            ..ResizeConfig::default()
        };
        let (_, d) = resize(image(10, 20), &config).unwrap();
        assert_eq!((d.resized_width, d.resized_height), (1536, 768));
        assert_eq!(d.preset, "21:9 Landscape 1536x640");
    }

    #[test]
    fn test_scale_factors() {
        let (output, d) =
            resize(image(200, 200), &ResizeConfig::exact(100, 50, Interpolation::Nearest)).unwrap();
        assert_eq!(output.dim(), (2, 50, 100, 3));
        assert!((d.scale_x - 0.5).abs() < f64::EPSILON);
        assert!((d.scale_y - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_descriptor_json_field_names() {
        let (_, d) =
            resize(image(10, 10), &ResizeConfig::exact(20, 20, Interpolation::Bicubic)).unwrap();
        let json = d.to_json();

        assert!(json.contains("\"size_preset\":\"Custom\""));
        assert!(json.contains("\"interpolation_mode\":\"bicubic\""));
        assert!(json.contains("\"scale_x\":2.0"));
        assert_eq!(ResizeDescriptor::parse(&json).unwrap(), d);
    }

    #[test]
    fn test_descriptor_parse_errors() {
        assert!(matches!(
            ResizeDescriptor::parse("[]").unwrap_err(),
            Error::Parse { .. }
        ));
        assert!(ResizeDescriptor::parse(r#"{"original_width": 10}"#).is_err());
    }
}

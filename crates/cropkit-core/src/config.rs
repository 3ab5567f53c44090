//! Surface configuration.
//!
//! [`SurfaceOptions`] is the loosely typed form hosts pass in (from
//! JavaScript it arrives as a plain object through `serde-wasm-bindgen`).
//! Every field has a default. It is validated once into [`SurfaceConfig`];
//! configuration errors are fatal at construction time and never deferred.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::background::{BackgroundKind, BackgroundStyle, Rgb};
use crate::boundary::CropBoundary;
use crate::constraint::LetterboxPolicy;
use crate::geometry::Size;

/// Error types for surface configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown background type: {0}")]
    UnknownBackground(String),

    #[error("Unknown letterbox policy: {0}")]
    UnknownLetterbox(String),

    #[error("Invalid aspect ratio: {0}")]
    InvalidRatio(f64),

    #[error("Invalid container size: {width}x{height}")]
    InvalidContainer { width: f64, height: f64 },

    #[error("Padding {padding} leaves no room in a {width}x{height} container")]
    InvalidPadding { padding: f64, width: f64, height: f64 },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Blur sigma must be finite and non-negative, got {0}")]
    InvalidBlur(f32),

    #[error("Dim factor must be within [0, 1], got {0}")]
    InvalidDim(f32),

    #[error("Letterbox fraction must be within (0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("Initial scale must be finite and positive, got {0}")]
    InvalidInitialScale(f64),
}

/// Raw, host-facing surface options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    /// Container width in canvas units.
    pub container_width: f64,
    /// Container height in canvas units.
    pub container_height: f64,
    /// Crop aspect ratio (width / height).
    pub ratio: f64,
    /// Space kept free around the boundary on every side.
    pub padding: f64,
    /// `"image"`, `"solid"` or `"transparent"`.
    pub background: String,
    /// `#rgb` or `#rrggbb`, used by the solid background.
    pub background_color: String,
    pub blur_sigma: f32,
    pub dim: f32,
    /// `"none"`, `"contain"`, `"fraction"` or `"unconstrained"`.
    pub letterbox: String,
    /// Minimum image/boundary fraction for the `"fraction"` policy.
    pub letterbox_fraction: f64,
    /// Scale applied on load; defaults to the minimum scale.
    pub initial_scale: Option<f64>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            container_width: 400.0,
            container_height: 300.0,
            ratio: 1.0,
            padding: 20.0,
            background: "image".to_string(),
            background_color: "#000000".to_string(),
            blur_sigma: 8.0,
            dim: 0.5,
            letterbox: "none".to_string(),
            letterbox_fraction: 0.5,
            initial_scale: None,
        }
    }
}

/// Validated surface configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub container: Size,
    pub ratio: f64,
    pub padding: f64,
    pub background: BackgroundStyle,
    pub letterbox: LetterboxPolicy,
    pub initial_scale: Option<f64>,
}

impl SurfaceConfig {
    /// Boundary for the current container, ratio and padding.
    pub fn boundary(&self) -> CropBoundary {
        CropBoundary::fit(self.container, self.ratio, self.padding)
    }

    /// Backdrop size in whole pixels.
    pub fn backdrop_size(&self) -> (u32, u32) {
        (
            self.container.width.ceil() as u32,
            self.container.height.ceil() as u32,
        )
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        // Default options are always valid
        Self {
            container: Size::new(400.0, 300.0),
            ratio: 1.0,
            padding: 20.0,
            background: BackgroundStyle {
                kind: BackgroundKind::Image,
                color: Rgb([0, 0, 0]),
                blur_sigma: 8.0,
                dim: 0.5,
            },
            letterbox: LetterboxPolicy::Disabled,
            initial_scale: None,
        }
    }
}

impl TryFrom<SurfaceOptions> for SurfaceConfig {
    type Error = ConfigError;

    fn try_from(options: SurfaceOptions) -> Result<Self, Self::Error> {
        let container = Size::new(options.container_width, options.container_height);
        validate_layout(container, options.ratio, options.padding)?;

        if !options.blur_sigma.is_finite() || options.blur_sigma < 0.0 {
            return Err(ConfigError::InvalidBlur(options.blur_sigma));
        }
        if !(0.0..=1.0).contains(&options.dim) {
            return Err(ConfigError::InvalidDim(options.dim));
        }
        if let Some(scale) = options.initial_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::InvalidInitialScale(scale));
            }
        }

        let background = BackgroundStyle {
            kind: options.background.parse()?,
            color: options.background_color.parse()?,
            blur_sigma: options.blur_sigma,
            dim: options.dim,
        };

        Ok(Self {
            container,
            ratio: options.ratio,
            padding: options.padding,
            background,
            letterbox: parse_letterbox(&options.letterbox, options.letterbox_fraction)?,
            initial_scale: options.initial_scale,
        })
    }
}

/// Check that `ratio` and `padding` produce a non-empty boundary.
pub fn validate_layout(container: Size, ratio: f64, padding: f64) -> Result<(), ConfigError> {
    if !container.is_valid() {
        return Err(ConfigError::InvalidContainer {
            width: container.width,
            height: container.height,
        });
    }
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ConfigError::InvalidRatio(ratio));
    }
    let inner = Size::new(
        container.width - 2.0 * padding,
        container.height - 2.0 * padding,
    );
    if !padding.is_finite() || padding < 0.0 || !inner.is_valid() {
        return Err(ConfigError::InvalidPadding {
            padding,
            width: container.width,
            height: container.height,
        });
    }
    Ok(())
}

fn parse_letterbox(name: &str, fraction: f64) -> Result<LetterboxPolicy, ConfigError> {
    match name {
        "none" => Ok(LetterboxPolicy::Disabled),
        "contain" => Ok(LetterboxPolicy::Contain),
        "unconstrained" => Ok(LetterboxPolicy::Unconstrained),
        "fraction" => {
            if fraction.is_finite() && fraction > 0.0 && fraction <= 1.0 {
                Ok(LetterboxPolicy::Fraction(fraction))
            } else {
                Err(ConfigError::InvalidFraction(fraction))
            }
        }
        other => Err(ConfigError::UnknownLetterbox(other.to_string())),
    }
}

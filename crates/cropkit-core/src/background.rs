//! Backdrop rendering behind the crop boundary.
//!
//! The backdrop fills the whole container and is independent of the
//! foreground transform: panning or zooming never re-renders it. Three
//! variants exist:
//!
//! - **image**: the upload itself, stretched to the container, blurred and darkened
//! - **solid**: a flat fill of the configured color
//! - **transparent**: a light checkerboard marking alpha
//!
//! The variant is chosen from a configuration string and parsed into the
//! closed [`BackgroundKind`] enum; unknown names fail at construction.

use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::decode::DecodedImage;
use crate::surface::RequestToken;

/// Longest backdrop edge that will be rendered.
pub const MAX_BACKDROP_SIDE: u32 = 8192;

/// Edge length of one checkerboard tile in pixels.
pub const CHECKER_TILE: u32 = 8;

const CHECKER_LIGHT: [u8; 4] = [255, 255, 255, 255];
const CHECKER_DARK: [u8; 4] = [204, 204, 204, 255];

/// Error types for backdrop rendering.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// The requested backdrop has no pixels.
    #[error("Invalid backdrop size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// The requested backdrop exceeds [`MAX_BACKDROP_SIDE`] on some edge.
    #[error("Backdrop too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },

    /// The source image buffer does not match its dimensions.
    #[error("Source image buffer does not match {width}x{height}")]
    BufferMismatch { width: u32, height: u32 },
}

/// Backdrop variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackgroundKind {
    #[default]
    Image,
    Solid,
    Transparent,
}

impl FromStr for BackgroundKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "image" => Ok(BackgroundKind::Image),
            "solid" => Ok(BackgroundKind::Solid),
            "transparent" => Ok(BackgroundKind::Transparent),
            other => Err(ConfigError::UnknownBackground(other.to_string())),
        }
    }
}

/// An opaque RGB color parsed from `#rgb` or `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(value.to_string());
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, slot) in rgb.iter_mut().enumerate() {
                    let nibble = channel(&hex[i..i + 1])?;
                    *slot = nibble * 17;
                }
                Ok(Rgb(rgb))
            }
            6 => Ok(Rgb([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            _ => Err(invalid()),
        }
    }
}

/// Validated backdrop settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundStyle {
    pub kind: BackgroundKind,
    /// Fill color for [`BackgroundKind::Solid`].
    pub color: Rgb,
    /// Gaussian blur sigma for [`BackgroundKind::Image`]. Zero disables blur.
    pub blur_sigma: f32,
    /// Darkening for [`BackgroundKind::Image`], 0.0 (none) to 1.0 (black).
    pub dim: f32,
}

/// A rendered backdrop, RGBA8 in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A pending backdrop render for one image request.
///
/// Handed out by the surface when an image is requested. The host renders it
/// whenever convenient and reports the outcome back with the same token.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundJob {
    pub(crate) token: RequestToken,
    pub(crate) style: BackgroundStyle,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl BackgroundJob {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render the backdrop for `source`.
    pub fn render(&self, source: &DecodedImage) -> Result<Backdrop, RenderError> {
        render_backdrop(&self.style, source, self.width, self.height)
    }
}

/// Render a `width` x `height` backdrop in the given style.
///
/// `source` is only read by [`BackgroundKind::Image`].
pub fn render_backdrop(
    style: &BackgroundStyle,
    source: &DecodedImage,
    width: u32,
    height: u32,
) -> Result<Backdrop, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }
    if width > MAX_BACKDROP_SIDE || height > MAX_BACKDROP_SIDE {
        return Err(RenderError::TooLarge { width, height });
    }

    let canvas = match style.kind {
        BackgroundKind::Image => blurred_image(style, source, width, height)?,
        BackgroundKind::Solid => {
            let [r, g, b] = style.color.0;
            RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]))
        }
        BackgroundKind::Transparent => checkerboard(width, height),
    };

    Ok(Backdrop {
        width,
        height,
        pixels: canvas.into_raw(),
    })
}

fn blurred_image(
    style: &BackgroundStyle,
    source: &DecodedImage,
    width: u32,
    height: u32,
) -> Result<RgbaImage, RenderError> {
    let rgb = source.to_rgb_image().ok_or(RenderError::BufferMismatch {
        width: source.width,
        height: source.height,
    })?;

    let mut stretched = imageops::resize(&rgb, width, height, FilterType::Triangle);
    if style.blur_sigma > 0.0 {
        stretched = imageops::blur(&stretched, style.blur_sigma);
    }

    let keep = 1.0 - style.dim.clamp(0.0, 1.0);
    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(stretched.pixels()) {
        let [r, g, b] = src.0;
        *dst = Rgba([darken(r, keep), darken(g, keep), darken(b, keep), 255]);
    }
    Ok(out)
}

#[inline]
fn darken(value: u8, keep: f32) -> u8 {
    (value as f32 * keep).round().clamp(0.0, 255.0) as u8
}

fn checkerboard(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if ((x / CHECKER_TILE) + (y / CHECKER_TILE)) % 2 == 0 {
            Rgba(CHECKER_LIGHT)
        } else {
            Rgba(CHECKER_DARK)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(kind: BackgroundKind) -> BackgroundStyle {
        BackgroundStyle {
            kind,
            color: Rgb([10, 20, 30]),
            blur_sigma: 2.0,
            dim: 0.5,
        }
    }

    fn flat_image(width: u32, height: u32, value: u8) -> DecodedImage {
        DecodedImage::new(width, height, vec![value; (width * height * 3) as usize])
    }

    #[test]
    fn test_parse_background_kind() {
        assert_eq!("image".parse::<BackgroundKind>(), Ok(BackgroundKind::Image));
        assert_eq!("solid".parse::<BackgroundKind>(), Ok(BackgroundKind::Solid));
        assert_eq!(
            "transparent".parse::<BackgroundKind>(),
            Ok(BackgroundKind::Transparent)
        );
        assert_eq!(
            "gradient".parse::<BackgroundKind>(),
            Err(ConfigError::UnknownBackground("gradient".to_string()))
        );
    }

    #[test]
    fn test_parse_color() {
        assert_eq!("#ff8000".parse::<Rgb>(), Ok(Rgb([255, 128, 0])));
        assert_eq!("#fff".parse::<Rgb>(), Ok(Rgb([255, 255, 255])));
        assert_eq!("#1a2B3c".parse::<Rgb>(), Ok(Rgb([0x1a, 0x2b, 0x3c])));
        assert!("ff8000".parse::<Rgb>().is_err());
        assert!("#ff80".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert!("#+f0000".parse::<Rgb>().is_err());
        assert!("#ééé".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_solid_fill() {
        let backdrop =
            render_backdrop(&style(BackgroundKind::Solid), &flat_image(1, 1, 0), 4, 3).unwrap();
        assert_eq!(backdrop.pixels.len(), 4 * 3 * 4);
        assert!(backdrop
            .pixels
            .chunks_exact(4)
            .all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn test_checkerboard_alternates_tiles() {
        let backdrop = render_backdrop(
            &style(BackgroundKind::Transparent),
            &flat_image(1, 1, 0),
            CHECKER_TILE * 2,
            CHECKER_TILE,
        )
        .unwrap();
        let first = &backdrop.pixels[0..4];
        let offset = (CHECKER_TILE * 4) as usize;
        let second = &backdrop.pixels[offset..offset + 4];
        assert_eq!(first, CHECKER_LIGHT);
        assert_eq!(second, CHECKER_DARK);
    }

    #[test]
    fn test_image_backdrop_is_stretched_and_darkened() {
        let mut flat = style(BackgroundKind::Image);
        flat.blur_sigma = 0.0;
        let backdrop = render_backdrop(&flat, &flat_image(10, 5, 200), 40, 30).unwrap();
        assert_eq!((backdrop.width, backdrop.height), (40, 30));
        // dim 0.5 halves every channel
        assert!(backdrop.pixels.chunks_exact(4).all(|px| {
            px[3] == 255 && px[..3].iter().all(|&c| (c as i32 - 100).abs() <= 1)
        }));
    }

    #[test]
    fn test_image_backdrop_blur_keeps_flat_interior() {
        let backdrop =
            render_backdrop(&style(BackgroundKind::Image), &flat_image(10, 10, 200), 40, 40)
                .unwrap();
        let center = ((20 * 40 + 20) * 4) as usize;
        let px = &backdrop.pixels[center..center + 4];
        assert_eq!(px[3], 255);
        assert!(px[..3].iter().all(|&c| (c as i32 - 100).abs() <= 2));
    }

    #[test]
    fn test_oversized_backdrop_is_an_error() {
        let result = render_backdrop(
            &style(BackgroundKind::Transparent),
            &flat_image(1, 1, 0),
            1_000_000,
            10,
        );
        assert_eq!(
            result,
            Err(RenderError::TooLarge {
                width: 1_000_000,
                height: 10
            })
        );
    }

    #[test]
    fn test_zero_size_is_an_error() {
        let result = render_backdrop(&style(BackgroundKind::Solid), &flat_image(1, 1, 0), 0, 10);
        assert_eq!(
            result,
            Err(RenderError::InvalidSize {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn test_mismatched_source_buffer() {
        let broken = DecodedImage {
            width: 10,
            height: 10,
            pixels: vec![0u8; 5],
        };
        let result = render_backdrop(&style(BackgroundKind::Image), &broken, 10, 10);
        assert!(matches!(result, Err(RenderError::BufferMismatch { .. })));
    }
}

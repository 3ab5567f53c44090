//! Crop export and preview rendering.
//!
//! [`crop_native`] cuts the native-pixel [`Dimensions`] out of the decoded
//! upload, which is exactly what a server reproduces from the reported
//! coordinates. [`render_preview`] scales that crop back to its on-canvas
//! size for display.

use image::imageops::{self, FilterType};
use thiserror::Error;

use crate::coords::{CropData, Dimensions};
use crate::decode::DecodedImage;

/// Error types for crop export.
#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    /// No image is loaded on the surface.
    #[error("No image loaded")]
    NoImage,

    /// The crop lies entirely outside the image.
    #[error("Crop region is empty ({width}x{height})")]
    EmptyCrop { width: u32, height: u32 },

    /// The source image buffer does not match its dimensions.
    #[error("Source image buffer does not match {width}x{height}")]
    BufferMismatch { width: u32, height: u32 },
}

/// Copy the native-pixel crop region out of `image`.
///
/// `dims` is expected to come from [`crate::coords::dimensions`] and is
/// clamped again against the image so that any rectangle is safe to pass.
pub fn crop_native(image: &DecodedImage, dims: &Dimensions) -> Result<DecodedImage, ExportError> {
    if image.pixels.len() != (image.width as usize) * (image.height as usize) * 3 {
        return Err(ExportError::BufferMismatch {
            width: image.width,
            height: image.height,
        });
    }

    let left = dims.x.min(image.width);
    let top = dims.y.min(image.height);
    let out_width = dims.width.min(image.width - left);
    let out_height = dims.height.min(image.height - top);
    if out_width == 0 || out_height == 0 {
        return Err(ExportError::EmptyCrop {
            width: out_width,
            height: out_height,
        });
    }

    // Full-image crop: nothing to copy row by row
    if left == 0 && top == 0 && out_width == image.width && out_height == image.height {
        return Ok(image.clone());
    }

    let row_bytes = (out_width * 3) as usize;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);
    for y in top..top + out_height {
        let start = ((y * image.width + left) * 3) as usize;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    Ok(DecodedImage::new(out_width, out_height, output))
}

/// Render the crop at the size it occupies on the canvas.
///
/// The native crop is resampled by `crop.scale`, so the preview matches the
/// region the user framed, minus any letterbox padding.
pub fn render_preview(
    image: &DecodedImage,
    crop: &CropData,
    dims: &Dimensions,
) -> Result<DecodedImage, ExportError> {
    let cropped = crop_native(image, dims)?;

    let width = ((cropped.width as f64 * crop.scale).round() as u32).max(1);
    let height = ((cropped.height as f64 * crop.scale).round() as u32).max(1);
    if width == cropped.width && height == cropped.height {
        return Ok(cropped);
    }

    let rgb = cropped.to_rgb_image().ok_or(ExportError::BufferMismatch {
        width: cropped.width,
        height: cropped.height,
    })?;
    let resized = imageops::resize(&rgb, width, height, FilterType::Triangle);
    Ok(DecodedImage::from_rgb_image(resized))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel has a unique value based on position.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn dims(x: u32, y: u32, width: u32, height: u32) -> Dimensions {
        Dimensions {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_full_crop_returns_copy() {
        let img = test_image(20, 10);
        let result = crop_native(&img, &dims(0, 0, 20, 10)).unwrap();
        assert_eq!(result.pixels, img.pixels);
    }

    #[test]
    fn test_crop_pixel_values_preserved() {
        let img = test_image(10, 10);
        let result = crop_native(&img, &dims(3, 3, 4, 4)).unwrap();
        assert_eq!((result.width, result.height), (4, 4));
        // First pixel comes from (3, 3): 3 * 10 + 3 = 33
        assert_eq!(&result.pixels[0..3], &[33, 33, 33]);
        // First pixel of the second row comes from (3, 4): 43
        assert_eq!(result.pixels[4 * 3], 43);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let img = test_image(10, 10);
        let result = crop_native(&img, &dims(8, 8, 50, 50)).unwrap();
        assert_eq!((result.width, result.height), (2, 2));
    }

    #[test]
    fn test_crop_outside_image_is_empty() {
        let img = test_image(10, 10);
        assert_eq!(
            crop_native(&img, &dims(10, 0, 5, 5)),
            Err(ExportError::EmptyCrop {
                width: 0,
                height: 5
            })
        );
    }

    #[test]
    fn test_preview_scales_to_canvas_size() {
        let img = test_image(300, 300);
        let crop = CropData {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
            scale: 0.5,
        };
        let preview = render_preview(&img, &crop, &dims(0, 0, 200, 200)).unwrap();
        assert_eq!((preview.width, preview.height), (100, 100));
        assert_eq!(preview.pixels.len(), 100 * 100 * 3);
    }

    #[test]
    fn test_preview_at_native_scale_skips_resample() {
        let img = test_image(40, 40);
        let crop = CropData {
            x: 5,
            y: 5,
            width: 10,
            height: 10,
            scale: 1.0,
        };
        let preview = render_preview(&img, &crop, &dims(5, 5, 10, 10)).unwrap();
        let direct = crop_native(&img, &dims(5, 5, 10, 10)).unwrap();
        assert_eq!(preview.pixels, direct.pixels);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: output is never larger than the source and the buffer
        /// always matches the reported size.
        #[test]
        fn prop_crop_bounded_by_source(
            (width, height) in (1u32..=60, 1u32..=60),
            (x, y, w, h) in (0u32..=80, 0u32..=80, 0u32..=80, 0u32..=80),
        ) {
            let img = DecodedImage::new(width, height, vec![9u8; (width * height * 3) as usize]);
            let region = Dimensions { x, y, width: w, height: h };

            match crop_native(&img, &region) {
                Ok(out) => {
                    prop_assert!(out.width >= 1 && out.width <= width);
                    prop_assert!(out.height >= 1 && out.height <= height);
                    prop_assert_eq!(out.pixels.len(), (out.width * out.height * 3) as usize);
                }
                Err(ExportError::EmptyCrop { .. }) => {
                    prop_assert!(x >= width || y >= height || w == 0 || h == 0);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}

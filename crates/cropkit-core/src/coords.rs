//! Coordinate translation between canvas space and native image pixels.
//!
//! [`CropData`] describes the crop in canvas units together with the scale
//! it was taken at. [`Dimensions`] divides it back into native pixels so a
//! server can reproduce the crop from the original upload.
//!
//! # Example
//!
//! A 300x300 image shown at scale 0.5 (150x150 on the canvas) with a
//! 100x100 boundary over its top-left corner:
//!
//! ```text
//! CropData   { x: 0, y: 0, width: 100, height: 100, scale: 0.5 }
//! Dimensions { x: 0, y: 0, width: 200, height: 200 }
//! ```

use serde::{Deserialize, Serialize};

use crate::boundary::CropBoundary;
use crate::geometry::Point;
use crate::transform::ImageTransform;

/// Crop rectangle in canvas space, relative to the image's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropData {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

/// Crop rectangle in native image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Derive the canvas-space crop for the current transform.
///
/// The origin is clamped to be non-negative and the size to at least one
/// unit, so a letterboxed image still yields a usable rectangle.
pub fn crop_data(transform: &ImageTransform, boundary: &CropBoundary) -> CropData {
    CropData {
        x: round_non_negative(boundary.left - transform.left, 0.0),
        y: round_non_negative(boundary.top - transform.top, 0.0),
        width: round_non_negative(boundary.width, 1.0),
        height: round_non_negative(boundary.height, 1.0),
        scale: transform.scale,
    }
}

/// Translate a crop into native pixels, never exceeding the native bounds.
///
/// Each value is divided by the crop scale and floored. The origin is
/// clamped to `[0, native]` and the size to what remains of the image past
/// the origin, which absorbs any overshoot from rounding.
pub fn dimensions(crop: &CropData, native_width: u32, native_height: u32) -> Dimensions {
    let x = to_native(crop.x, crop.scale).min(native_width);
    let y = to_native(crop.y, crop.scale).min(native_height);

    Dimensions {
        x,
        y,
        width: to_native(crop.width, crop.scale).min(native_width - x),
        height: to_native(crop.height, crop.scale).min(native_height - y),
    }
}

/// Image placement that reproduces `crop` against `boundary`.
///
/// Inverse of [`crop_data`], used to restore saved coordinates. The result
/// still has to pass through the constraint engine.
pub fn placement_from_crop(crop: &CropData, boundary: &CropBoundary) -> Point {
    Point::new(boundary.left - crop.x as f64, boundary.top - crop.y as f64)
}

/// Convert a canvas point into native image pixel coordinates.
pub fn canvas_to_native(transform: &ImageTransform, point: Point) -> Point {
    Point::new(
        (point.x - transform.left) / transform.scale,
        (point.y - transform.top) / transform.scale,
    )
}

/// Convert a native image pixel coordinate into a canvas point.
pub fn native_to_canvas(transform: &ImageTransform, point: Point) -> Point {
    Point::new(
        transform.left + point.x * transform.scale,
        transform.top + point.y * transform.scale,
    )
}

fn round_non_negative(value: f64, min: f64) -> u32 {
    value.round().max(min) as u32
}

fn to_native(value: u32, scale: f64) -> u32 {
    (value as f64 / scale).floor() as u32
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn transform_strategy() -> impl Strategy<Value = ImageTransform> {
        (
            1u32..=5000,
            1u32..=5000,
            -3000.0f64..=3000.0,
            -3000.0f64..=3000.0,
            0.01f64..=1.0,
        )
            .prop_map(|(nw, nh, left, top, scale)| {
                ImageTransform::set_image(nw, nh, left, top, scale)
            })
    }

    fn boundary_strategy() -> impl Strategy<Value = CropBoundary> {
        (0.0f64..=500.0, 0.0f64..=500.0, 0.0f64..=300.0, 0.0f64..=300.0).prop_map(
            |(width, height, left, top)| CropBoundary {
                width,
                height,
                left,
                top,
            },
        )
    }

    proptest! {
        /// Property: crop origin is non-negative and size at least one.
        #[test]
        fn prop_crop_data_bounds(
            transform in transform_strategy(),
            boundary in boundary_strategy(),
        ) {
            let crop = crop_data(&transform, &boundary);
            prop_assert!(crop.width >= 1);
            prop_assert!(crop.height >= 1);
            prop_assert_eq!(crop.scale, transform.scale);
        }

        /// Property: native dimensions never exceed the image.
        #[test]
        fn prop_dimensions_within_native(
            transform in transform_strategy(),
            boundary in boundary_strategy(),
        ) {
            let crop = crop_data(&transform, &boundary);
            let dims = dimensions(&crop, transform.native_width, transform.native_height);

            prop_assert!(dims.x <= transform.native_width);
            prop_assert!(dims.y <= transform.native_height);
            prop_assert!(dims.x + dims.width <= transform.native_width);
            prop_assert!(dims.y + dims.height <= transform.native_height);
        }

        /// Property: canvas/native conversion round-trips.
        #[test]
        fn prop_point_round_trip(
            transform in transform_strategy(),
            (x, y) in (-1000.0f64..=1000.0, -1000.0f64..=1000.0),
        ) {
            let canvas = native_to_canvas(&transform, canvas_to_native(&transform, Point::new(x, y)));
            prop_assert!((canvas.x - x).abs() < 1e-6);
            prop_assert!((canvas.y - y).abs() < 1e-6);
        }
    }
}

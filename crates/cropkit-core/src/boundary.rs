//! Crop boundary derived from the aspect ratio and the container size.
//!
//! The boundary is the largest rectangle with the configured aspect ratio
//! that fits inside the container after padding, centered in the container.
//! It only changes when the ratio or the container size changes.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};

/// The visible/output crop region in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBoundary {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl CropBoundary {
    /// Fit a boundary of `ratio` (width / height) inside `container`.
    ///
    /// `padding` is reserved on every side so the backdrop stays visible
    /// around the crop region. Callers validate that the ratio is positive
    /// and that the padded container is non-empty.
    pub fn fit(container: Size, ratio: f64, padding: f64) -> Self {
        let available = Size::new(
            container.width - 2.0 * padding,
            container.height - 2.0 * padding,
        );

        let (width, height) = if available.aspect_ratio() > ratio {
            // Container is wider than the ratio: height is the limiting side
            (available.height * ratio, available.height)
        } else {
            (available.width, available.width / ratio)
        };

        Self {
            width,
            height,
            left: (container.width - width) / 2.0,
            top: (container.height - height) / 2.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }
}

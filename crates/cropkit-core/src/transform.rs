//! Image transform model.
//!
//! Holds where the image sits on the canvas and how much it is scaled. This
//! is a plain data holder: no validation happens here. The surface runs the
//! [`crate::constraint`] engine after every mutation.
//!
//! # Coordinate System
//!
//! - `left`/`top` are the canvas position of the image's top-left corner
//! - `scale` is uniform; the displayed size is `native * scale` on both axes

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Position, uniform scale and native size of the loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    /// Native image width in pixels.
    pub native_width: u32,
    /// Native image height in pixels.
    pub native_height: u32,
    /// Uniform scale factor (scaleX == scaleY).
    pub scale: f64,
    /// Canvas x of the image's top-left corner.
    pub left: f64,
    /// Canvas y of the image's top-left corner.
    pub top: f64,
}

impl ImageTransform {
    /// Initialize a transform for a freshly loaded image.
    pub fn set_image(
        native_width: u32,
        native_height: u32,
        left: f64,
        top: f64,
        scale: f64,
    ) -> Self {
        Self {
            native_width,
            native_height,
            scale,
            left,
            top,
        }
    }

    /// Move the image by a canvas-space offset.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn set_position(&mut self, position: Point) {
        self.left = position.x;
        self.top = position.y;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn native_size(&self) -> Size {
        Size::new(self.native_width as f64, self.native_height as f64)
    }

    /// Size of the image on the canvas at the current scale.
    pub fn displayed_size(&self) -> Size {
        Size::new(
            self.native_width as f64 * self.scale,
            self.native_height as f64 * self.scale,
        )
    }

    /// Canvas-space rectangle covered by the image.
    pub fn rect(&self) -> Rect {
        let size = self.displayed_size();
        Rect::new(self.left, self.top, size.width, size.height)
    }

    /// Rescale while keeping the canvas point `anchor` fixed on the image.
    ///
    /// Zooming from the slider anchors on the crop boundary center so the
    /// framed subject stays put.
    pub fn scale_about(&mut self, scale: f64, anchor: Point) {
        if self.scale > 0.0 {
            let factor = scale / self.scale;
            self.left = anchor.x - (anchor.x - self.left) * factor;
            self.top = anchor.y - (anchor.y - self.top) * factor;
        }
        self.scale = scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_image() {
        let t = ImageTransform::set_image(300, 200, 5.0, 6.0, 0.5);
        assert_eq!(t.position(), Point::new(5.0, 6.0));
        assert_eq!(t.scale(), 0.5);
        assert_eq!(t.displayed_size(), Size::new(150.0, 100.0));
    }

    #[test]
    fn test_pan_accumulates() {
        let mut t = ImageTransform::set_image(100, 100, 0.0, 0.0, 1.0);
        t.pan(10.0, -5.0);
        t.pan(2.5, 1.0);
        assert_eq!(t.position(), Point::new(12.5, -4.0));
    }

    #[test]
    fn test_set_scale_does_not_move() {
        let mut t = ImageTransform::set_image(100, 100, 3.0, 4.0, 1.0);
        t.set_scale(0.25);
        assert_eq!(t.position(), Point::new(3.0, 4.0));
        assert_eq!(t.rect(), Rect::new(3.0, 4.0, 25.0, 25.0));
    }

    #[test]
    fn test_scale_about_keeps_anchor() {
        let mut t = ImageTransform::set_image(200, 200, 0.0, 0.0, 1.0);
        let anchor = Point::new(100.0, 100.0);
        t.scale_about(0.5, anchor);
        // Anchor was at the image center and stays there
        let rect = t.rect();
        assert_eq!(rect.center(), anchor);
        assert_eq!(rect.width, 100.0);
    }

    #[test]
    fn test_scale_about_off_center_anchor() {
        let mut t = ImageTransform::set_image(100, 100, 0.0, 0.0, 1.0);
        t.scale_about(0.5, Point::new(0.0, 0.0));
        assert_eq!(t.position(), Point::new(0.0, 0.0));
        assert_eq!(t.scale(), 0.5);
    }
}

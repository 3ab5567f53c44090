//! Constraint engine for the cropping surface.
//!
//! Given the image transform and the crop boundary, this module computes the
//! permitted zoom interval and clamps scale and position after every
//! mutation. Constraint violations are never errors: they are always
//! silently corrected.
//!
//! # Scale Range
//!
//! Without letterboxing the minimum scale is the tighter of the two ratios,
//! so the image always covers the boundary:
//!
//! ```text
//! min = max(boundary.width / native.width, boundary.height / native.height)
//! ```
//!
//! A [`LetterboxPolicy`] may lower this floor. The minimum is always capped
//! at [`MAX_SCALE`]; an image that is natively smaller than the boundary is
//! therefore non-scalable.

use serde::{Deserialize, Serialize};

use crate::boundary::CropBoundary;
use crate::geometry::{Size, GEOMETRY_EPSILON};
use crate::transform::ImageTransform;

/// Largest permitted scale (native resolution).
pub const MAX_SCALE: f64 = 1.0;

/// Smallest scale ever permitted, used by [`LetterboxPolicy::Unconstrained`].
pub const SCALE_FLOOR: f64 = 0.01;

/// How far below full coverage the image may be zoomed out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LetterboxPolicy {
    /// The image must cover the boundary on both axes.
    #[default]
    Disabled,
    /// The image may shrink until it fits entirely inside the boundary.
    Contain,
    /// The image must stay at least this fraction of the boundary on both
    /// axes. Valid range is `(0, 1]`; `1.0` behaves like `Disabled` for
    /// scale purposes but still allows movement locks.
    Fraction(f64),
    /// Only [`SCALE_FLOOR`] applies.
    Unconstrained,
}

impl LetterboxPolicy {
    pub fn allows_letterbox(&self) -> bool {
        !matches!(self, LetterboxPolicy::Disabled)
    }
}

/// Permitted zoom interval for an image/boundary pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl ScaleRange {
    /// False when `min == max`, meaning zoom controls must be disabled.
    pub fn is_scalable(&self) -> bool {
        self.min < self.max
    }

    /// Clamp `scale` into the range. NaN maps to `min`.
    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.min;
        }
        scale.clamp(self.min, self.max)
    }

    /// Map a normalized slider value in `[0, 1]` onto the scale range.
    pub fn zoom_to_scale(&self, zoom: f64) -> f64 {
        self.min + zoom.clamp(0.0, 1.0) * (self.max - self.min)
    }

    /// Inverse of [`ScaleRange::zoom_to_scale`]. Returns 0 for an empty range.
    pub fn scale_to_zoom(&self, scale: f64) -> f64 {
        if !self.is_scalable() {
            return 0.0;
        }
        ((scale - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Per-axis pointer movement lock.
///
/// Set when letterboxing is allowed and the image has no room to pan on
/// that axis. This is a UX signal for the drag handler, not a clamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLock {
    pub x: bool,
    pub y: bool,
}

/// Computes scale ranges and clamps transforms against a boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstraintEngine {
    policy: LetterboxPolicy,
}

impl ConstraintEngine {
    pub fn new(policy: LetterboxPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LetterboxPolicy {
        self.policy
    }

    /// Compute the permitted scale interval for an image of `native` size.
    pub fn scale_range(&self, native: Size, boundary: &CropBoundary) -> ScaleRange {
        let ratio_x = boundary.width / native.width;
        let ratio_y = boundary.height / native.height;
        let cover = ratio_x.max(ratio_y);

        let min = match self.policy {
            LetterboxPolicy::Disabled => cover,
            LetterboxPolicy::Contain => ratio_x.min(ratio_y),
            LetterboxPolicy::Fraction(fraction) => cover * fraction,
            LetterboxPolicy::Unconstrained => SCALE_FLOOR,
        };

        ScaleRange {
            min: min.max(SCALE_FLOOR).min(MAX_SCALE),
            max: MAX_SCALE,
        }
    }

    /// Clamp scale into `range`, then clamp the position against `boundary`.
    pub fn apply(&self, transform: &mut ImageTransform, range: &ScaleRange, boundary: &CropBoundary) {
        transform.set_scale(range.clamp(transform.scale()));
        self.clamp_position(transform, boundary);
    }

    /// Clamp the image position so it covers the boundary on every axis
    /// where it is large enough, and stays inside the boundary otherwise.
    pub fn clamp_position(&self, transform: &mut ImageTransform, boundary: &CropBoundary) {
        let size = transform.displayed_size();
        transform.left = clamp_axis(transform.left, size.width, boundary.left, boundary.width);
        transform.top = clamp_axis(transform.top, size.height, boundary.top, boundary.height);
    }

    /// Report which axes have no room to pan under letterboxing.
    pub fn axis_lock(&self, transform: &ImageTransform, boundary: &CropBoundary) -> AxisLock {
        if !self.policy.allows_letterbox() {
            return AxisLock::default();
        }
        let size = transform.displayed_size();
        AxisLock {
            x: size.width <= boundary.width + GEOMETRY_EPSILON,
            y: size.height <= boundary.height + GEOMETRY_EPSILON,
        }
    }
}

fn clamp_axis(position: f64, extent: f64, boundary_start: f64, boundary_extent: f64) -> f64 {
    let slack = boundary_extent - extent;
    if !slack.is_finite() || position.is_nan() {
        return boundary_start;
    }
    if slack <= 0.0 {
        // Image edge may not enter the boundary
        position.clamp(boundary_start + slack, boundary_start)
    } else {
        position.clamp(boundary_start, boundary_start + slack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};

    fn boundary_100() -> CropBoundary {
        CropBoundary {
            width: 100.0,
            height: 100.0,
            left: 50.0,
            top: 50.0,
        }
    }

    #[test]
    fn test_min_scale_uses_tighter_ratio() {
        let engine = ConstraintEngine::default();
        let range = engine.scale_range(Size::new(400.0, 200.0), &boundary_100());
        // 100/400 = 0.25, 100/200 = 0.5 -> tighter is 0.5
        assert_eq!(range.min, 0.5);
        assert_eq!(range.max, MAX_SCALE);
        assert!(range.is_scalable());
    }

    #[test]
    fn test_contain_uses_looser_ratio() {
        let engine = ConstraintEngine::new(LetterboxPolicy::Contain);
        let range = engine.scale_range(Size::new(400.0, 200.0), &boundary_100());
        assert_eq!(range.min, 0.25);
    }

    #[test]
    fn test_fraction_policy() {
        let engine = ConstraintEngine::new(LetterboxPolicy::Fraction(0.5));
        let range = engine.scale_range(Size::new(400.0, 200.0), &boundary_100());
        assert_eq!(range.min, 0.25);

        let engine = ConstraintEngine::new(LetterboxPolicy::Fraction(0.8));
        let range = engine.scale_range(Size::new(1000.0, 1000.0), &boundary_100());
        assert!((range.min - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_unconstrained_policy_uses_floor() {
        let engine = ConstraintEngine::new(LetterboxPolicy::Unconstrained);
        let range = engine.scale_range(Size::new(400.0, 200.0), &boundary_100());
        assert_eq!(range.min, SCALE_FLOOR);
    }

    #[test]
    fn test_small_image_is_not_scalable() {
        let engine = ConstraintEngine::default();
        let range = engine.scale_range(Size::new(80.0, 120.0), &boundary_100());
        assert_eq!(range.min, MAX_SCALE);
        assert!(!range.is_scalable());
    }

    #[test]
    fn test_exact_fit_is_not_scalable() {
        let engine = ConstraintEngine::default();
        let range = engine.scale_range(Size::new(100.0, 100.0), &boundary_100());
        assert!(!range.is_scalable());
    }

    #[test]
    fn test_zoom_mapping() {
        let range = ScaleRange { min: 0.5, max: 1.0 };
        assert_eq!(range.zoom_to_scale(0.0), 0.5);
        assert_eq!(range.zoom_to_scale(1.0), 1.0);
        assert_eq!(range.zoom_to_scale(0.5), 0.75);
        assert_eq!(range.zoom_to_scale(7.0), 1.0);
        assert_eq!(range.scale_to_zoom(0.75), 0.5);

        let empty = ScaleRange { min: 1.0, max: 1.0 };
        assert_eq!(empty.scale_to_zoom(1.0), 0.0);
    }

    #[test]
    fn test_nan_scale_clamps_to_min() {
        let range = ScaleRange { min: 0.5, max: 1.0 };
        assert_eq!(range.clamp(f64::NAN), 0.5);
        assert_eq!(range.clamp(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_clamp_position_with_nan_does_not_panic() {
        let engine = ConstraintEngine::default();
        let boundary = boundary_100();

        let mut t = ImageTransform::set_image(300, 300, 10.0, 20.0, f64::NAN);
        engine.clamp_position(&mut t, &boundary);
        assert_eq!(t.position(), Point::new(50.0, 50.0));

        let mut t = ImageTransform::set_image(300, 300, f64::NAN, 20.0, 0.5);
        engine.clamp_position(&mut t, &boundary);
        assert_eq!(t.left, 50.0);
        assert_eq!(t.top, 20.0);
    }

    #[test]
    fn test_clamp_position_covers_boundary() {
        let engine = ConstraintEngine::default();
        let boundary = boundary_100();
        let mut t = ImageTransform::set_image(300, 300, 120.0, -500.0, 0.5);
        engine.clamp_position(&mut t, &boundary);
        // Image is 150 wide: left must be within [0, 50]
        assert_eq!(t.left, 50.0);
        assert_eq!(t.top, 20.0);
        assert!(t.rect().contains_rect(&boundary.rect()));
    }

    #[test]
    fn test_apply_clamps_scale_then_position() {
        let engine = ConstraintEngine::default();
        let boundary = boundary_100();
        let range = engine.scale_range(Size::new(300.0, 300.0), &boundary);
        let mut t = ImageTransform::set_image(300, 300, 50.0, 50.0, 0.1);
        engine.apply(&mut t, &range, &boundary);
        assert!((t.scale - 1.0 / 3.0).abs() < 1e-12);
        assert!(t.rect().contains_rect(&boundary.rect()));
    }

    #[test]
    fn test_letterboxed_axis_stays_inside_boundary() {
        let engine = ConstraintEngine::new(LetterboxPolicy::Contain);
        let boundary = boundary_100();
        // 200x100 at 0.5 -> 100x50, slack of 50 on the y axis
        let mut t = ImageTransform::set_image(200, 100, 0.0, 200.0, 0.5);
        engine.clamp_position(&mut t, &boundary);
        assert_eq!(t.left, 50.0);
        assert_eq!(t.top, 100.0);
        assert!(boundary.rect().contains_rect(&Rect::new(t.left, t.top, 100.0, 50.0)));
    }

    #[test]
    fn test_axis_lock_only_with_letterboxing() {
        let boundary = boundary_100();
        let t = ImageTransform::set_image(200, 100, 50.0, 75.0, 0.5);

        let locks = ConstraintEngine::new(LetterboxPolicy::Contain).axis_lock(&t, &boundary);
        assert_eq!(locks, AxisLock { x: true, y: true });

        let t = ImageTransform::set_image(400, 100, 50.0, 75.0, 0.5);
        let locks = ConstraintEngine::new(LetterboxPolicy::Contain).axis_lock(&t, &boundary);
        assert_eq!(locks, AxisLock { x: false, y: true });

        let locks = ConstraintEngine::default().axis_lock(&t, &boundary);
        assert_eq!(locks, AxisLock::default());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

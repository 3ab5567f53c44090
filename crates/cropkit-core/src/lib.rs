//! Cropkit Core - Image cropping library
//!
//! This crate provides the core of the Cropkit cropping widget: the
//! transform and constraint model that keeps an image covering a crop
//! boundary, coordinate translation back to native pixels, backdrop
//! rendering, and the [`CroppingSurface`] state machine tying them together.
//!
//! The crate has no platform dependencies. `cropkit-wasm` exposes it to
//! JavaScript hosts.

pub mod background;
pub mod boundary;
pub mod config;
pub mod constraint;
pub mod coords;
pub mod decode;
pub mod export;
pub mod geometry;
pub mod surface;
pub mod transform;

pub use background::{
    Backdrop, BackgroundJob, BackgroundKind, BackgroundStyle, RenderError, Rgb, MAX_BACKDROP_SIDE,
};
pub use boundary::CropBoundary;
pub use config::{ConfigError, SurfaceConfig, SurfaceOptions};
pub use constraint::{AxisLock, ConstraintEngine, LetterboxPolicy, ScaleRange, MAX_SCALE};
pub use coords::{CropData, Dimensions};
pub use decode::{DecodeError, DecodedImage};
pub use export::ExportError;
pub use geometry::{Point, Rect, Size};
pub use surface::{
    ControlMessage, CroppingSurface, ImageSource, RequestToken, SurfaceEvent, SurfaceState,
};
pub use transform::ImageTransform;

//! Typed messages in and out of the cropping surface.
//!
//! Collaborators (upload field, ratio toggle, zoom slider) talk to the
//! surface with [`ControlMessage`]s passed by direct call. The surface
//! answers with [`SurfaceEvent`]s queued for the host to drain. Both
//! serialize as internally tagged objects, e.g.
//! `{ "type": "image-loaded", "scale": 0.5, "min_scale": 0.25 }`.

use serde::{Deserialize, Serialize};

/// Signals emitted by the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SurfaceEvent {
    /// Image and backdrop have both settled; the surface is ready.
    ImageLoaded { scale: f64, min_scale: f64 },
    /// The scale range is non-empty; zoom controls may be enabled.
    ImageScalable,
    /// `min_scale == max_scale`; zoom controls must be disabled.
    ImageNonScalable,
    /// The backdrop render finished (or failed) for the current image.
    BackgroundLoaded,
    /// Decoding failed or the upload collaborator reported an error.
    UploadError { message: String },
    /// The scale changed; `zoom` is the matching slider position.
    ScaleChanged { scale: f64, zoom: f64 },
}

/// Requests from sibling widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// The upload collaborator has an image ready at `src`; `url` is where
    /// the original is stored server-side.
    ImageUploaded { src: String, url: String },
    /// The upload collaborator failed.
    UploadError { message: String },
    /// The ratio toggle picked a new aspect ratio.
    RatioChanged { ratio: f64 },
    /// The slider moved to a normalized position in `[0, 1]`.
    ScaleRequested { zoom: f64 },
}

//! The cropping surface: state machine and interaction orchestrator.
//!
//! The surface owns the transform, boundary and scale range of one image,
//! runs the constraint engine after every mutation, and answers crop
//! queries. All state is private; hosts drive it through commands and read
//! back [`SurfaceEvent`]s with [`CroppingSurface::drain_events`].
//!
//! # Lifecycle
//!
//! ```text
//! Empty --set_image--> Loading --image + backdrop settled--> Ready
//!   ^                     |                                   |
//!   +---- decode error ---+                                   |
//!   +------------------------------ reset --------------------+
//! ```
//!
//! Decoding happens outside the surface. [`CroppingSurface::set_image`]
//! hands out a [`BackgroundJob`] carrying a [`RequestToken`]; the host
//! reports the decoded image and the rendered backdrop back with that
//! token, in either order. A newer `set_image` or a `reset` invalidates the
//! token, and late completions against it are ignored.

mod events;

pub use events::{ControlMessage, SurfaceEvent};

use serde::{Deserialize, Serialize};

use crate::background::{Backdrop, BackgroundJob, RenderError};
use crate::boundary::CropBoundary;
use crate::config::{validate_layout, ConfigError, SurfaceConfig, SurfaceOptions};
use crate::constraint::{AxisLock, ConstraintEngine, ScaleRange};
use crate::coords::{self, CropData, Dimensions};
use crate::decode::{self, DecodedImage};
use crate::export::{self, ExportError};
use crate::geometry::{Point, Size};
use crate::transform::ImageTransform;

/// Identifies one `set_image` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

/// Lifecycle state of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceState {
    Empty,
    Loading,
    Ready,
}

/// Where the current image came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Source handed to `set_image` (data URL, object URL, ...).
    pub src: String,
    /// Server-side location reported by the upload collaborator.
    pub url: Option<String>,
}

#[derive(Debug)]
struct LoadedImage {
    source: DecodedImage,
    transform: ImageTransform,
    range: ScaleRange,
}

#[derive(Debug)]
struct PendingLoad {
    token: RequestToken,
    coordinates: Option<CropData>,
    image: Option<LoadedImage>,
    /// `None` while rendering; `Some(None)` when the render failed.
    backdrop: Option<Option<Backdrop>>,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    origin: Point,
    last: Point,
    start: Point,
    lock: AxisLock,
}

/// Interactive cropping surface for a single image.
#[derive(Debug)]
pub struct CroppingSurface {
    config: SurfaceConfig,
    engine: ConstraintEngine,
    boundary: CropBoundary,
    state: SurfaceState,
    enabled: bool,
    last_token: u64,
    source: Option<ImageSource>,
    pending: Option<PendingLoad>,
    loaded: Option<LoadedImage>,
    backdrop: Option<Backdrop>,
    drag: Option<DragSession>,
    events: Vec<SurfaceEvent>,
}

impl CroppingSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            engine: ConstraintEngine::new(config.letterbox),
            boundary: config.boundary(),
            config,
            state: SurfaceState::Empty,
            enabled: true,
            last_token: 0,
            source: None,
            pending: None,
            loaded: None,
            backdrop: None,
            drag: None,
            events: Vec::new(),
        }
    }

    /// Validate raw options and build a surface.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any invalid or unknown option.
    pub fn from_options(options: SurfaceOptions) -> Result<Self, ConfigError> {
        Ok(Self::new(SurfaceConfig::try_from(options)?))
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Start loading a new image.
    ///
    /// Any image in flight is superseded and the current image discarded.
    /// `coordinates` restores a crop previously read from
    /// [`CroppingSurface::crop_data`].
    pub fn set_image(
        &mut self,
        src: impl Into<String>,
        coordinates: Option<CropData>,
    ) -> BackgroundJob {
        self.begin_load(
            ImageSource {
                src: src.into(),
                url: None,
            },
            coordinates,
        )
    }

    /// Report a decoded image for `token`.
    ///
    /// Returns `false` if the token is stale and the image was ignored.
    pub fn image_decoded(&mut self, token: RequestToken, image: DecodedImage) -> bool {
        if image.is_empty() {
            return self.image_failed(token, "Image has no pixels");
        }

        let boundary = self.boundary;
        let engine = self.engine;
        let initial_scale = self.config.initial_scale;
        let Some(pending) = self.pending_for(token) else {
            return false;
        };

        let transform = initial_transform(
            &engine,
            &boundary,
            &image,
            pending.coordinates.as_ref(),
            initial_scale,
        );
        let range = engine.scale_range(transform.native_size(), &boundary);
        pending.image = Some(LoadedImage {
            source: image,
            transform,
            range,
        });

        tracing::debug!(
            token = token.0,
            scale = transform.scale,
            min_scale = range.min,
            "image decoded"
        );
        self.emit_scalability(range);
        self.try_finish_load();
        true
    }

    /// Decode `bytes` and report the result for `token`.
    ///
    /// Decode failures become an `upload-error` signal. Returns `false` if
    /// the token is stale.
    pub fn load_image_bytes(&mut self, token: RequestToken, bytes: &[u8]) -> bool {
        if self.pending_for(token).is_none() {
            return false;
        }
        match decode::decode_image(bytes) {
            Ok(image) => self.image_decoded(token, image),
            Err(e) => self.image_failed(token, e.to_string()),
        }
    }

    /// Report that the image for `token` could not be fetched or decoded.
    ///
    /// The surface returns to `Empty` and emits `upload-error`. Returns
    /// `false` if the token is stale.
    pub fn image_failed(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if self.pending_for(token).is_none() {
            return false;
        }
        let message = message.into();
        tracing::debug!(token = token.0, %message, "image load failed");

        self.clear_image();
        self.events.push(SurfaceEvent::UploadError { message });
        true
    }

    /// Report the outcome of a [`BackgroundJob`].
    ///
    /// Accepted while loading (either before or after the image) and while
    /// ready, to replace the backdrop after a container resize. A failed
    /// render still settles the background path. Returns `false` if the
    /// token is stale.
    pub fn background_rendered(
        &mut self,
        token: RequestToken,
        result: Result<Backdrop, RenderError>,
    ) -> bool {
        if token.0 != self.last_token || self.state == SurfaceState::Empty {
            tracing::debug!(token = token.0, "ignoring stale backdrop");
            return false;
        }

        let backdrop = match result {
            Ok(backdrop) => Some(backdrop),
            Err(e) => {
                tracing::warn!(token = token.0, error = %e, "backdrop render failed");
                None
            }
        };

        match self.pending.as_mut() {
            Some(pending) => {
                pending.backdrop = Some(backdrop);
                self.events.push(SurfaceEvent::BackgroundLoaded);
                self.try_finish_load();
            }
            None => {
                self.backdrop = backdrop;
                self.events.push(SurfaceEvent::BackgroundLoaded);
            }
        }
        true
    }

    /// A backdrop job for the current image at the current container size.
    pub fn background_job(&self) -> Option<BackgroundJob> {
        if self.state == SurfaceState::Empty {
            return None;
        }
        Some(self.make_job(RequestToken(self.last_token)))
    }

    /// Return to `Empty`, discarding the image and invalidating requests.
    pub fn reset(&mut self) {
        self.last_token += 1;
        self.clear_image();
        tracing::debug!("surface reset");
    }

    // ------------------------------------------------------------------
    // Collaborator messages
    // ------------------------------------------------------------------

    /// Handle a typed request from a sibling widget.
    ///
    /// Only [`ControlMessage::ImageUploaded`] starts a load and therefore
    /// returns a job.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid ratio.
    pub fn dispatch(&mut self, message: ControlMessage) -> Result<Option<BackgroundJob>, ConfigError> {
        match message {
            ControlMessage::ImageUploaded { src, url } => Ok(Some(self.begin_load(
                ImageSource {
                    src,
                    url: Some(url),
                },
                None,
            ))),
            ControlMessage::UploadError { message } => {
                if self.state == SurfaceState::Loading {
                    self.last_token += 1;
                    self.clear_image();
                }
                self.events.push(SurfaceEvent::UploadError { message });
                Ok(None)
            }
            ControlMessage::RatioChanged { ratio } => {
                self.update_ratio(ratio)?;
                Ok(None)
            }
            ControlMessage::ScaleRequested { zoom } => {
                self.set_zoom(zoom);
                Ok(None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Switch to a new aspect ratio, keeping the framed point centered.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRatio`] for a non-positive ratio.
    pub fn update_ratio(&mut self, ratio: f64) -> Result<(), ConfigError> {
        validate_layout(self.config.container, ratio, self.config.padding)?;
        self.config.ratio = ratio;
        self.relayout();
        Ok(())
    }

    /// Resize the container. The backdrop is kept until the host submits a
    /// new one from [`CroppingSurface::background_job`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the size leaves no room for a boundary.
    pub fn resize_container(&mut self, width: f64, height: f64) -> Result<(), ConfigError> {
        let container = Size::new(width, height);
        validate_layout(container, self.config.ratio, self.config.padding)?;
        self.config.container = container;
        self.relayout();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scale
    // ------------------------------------------------------------------

    /// Set the scale, anchored on the boundary center. Out-of-range values
    /// are clamped. Returns `false` when no image is ready.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if self.state != SurfaceState::Ready || !scale.is_finite() {
            return false;
        }
        let anchor = self.boundary.rect().center();
        let (engine, boundary) = (self.engine, self.boundary);
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };

        loaded
            .transform
            .scale_about(loaded.range.clamp(scale), anchor);
        engine.apply(&mut loaded.transform, &loaded.range, &boundary);

        let scale = loaded.transform.scale;
        let zoom = loaded.range.scale_to_zoom(scale);
        self.restart_drag();
        self.events.push(SurfaceEvent::ScaleChanged { scale, zoom });
        true
    }

    /// Set the scale from a normalized slider position in `[0, 1]`.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if !zoom.is_finite() {
            return false;
        }
        match self.loaded.as_ref() {
            Some(loaded) if self.state == SurfaceState::Ready => {
                let scale = loaded.range.zoom_to_scale(zoom);
                self.set_scale(scale)
            }
            _ => false,
        }
    }

    /// Current slider position matching the scale.
    pub fn zoom(&self) -> Option<f64> {
        self.ready_image()
            .map(|loaded| loaded.range.scale_to_zoom(loaded.transform.scale))
    }

    // ------------------------------------------------------------------
    // Pointer interaction
    // ------------------------------------------------------------------

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Ignore pointer input until [`CroppingSurface::enable`]. The transform
    /// is left untouched.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.drag = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Begin a drag at canvas point `point`. Returns `false` if ignored.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if !self.enabled || !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        let Some(loaded) = self.ready_image() else {
            return false;
        };
        self.drag = Some(DragSession {
            origin: point,
            last: point,
            start: loaded.transform.position(),
            lock: self.engine.axis_lock(&loaded.transform, &self.boundary),
        });
        true
    }

    /// Continue a drag. The position is recomputed from the drag origin, so
    /// repeating the same move is idempotent.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        if !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        let (engine, boundary) = (self.engine, self.boundary);
        let (Some(drag), Some(loaded)) = (self.drag.as_mut(), self.loaded.as_mut()) else {
            return false;
        };

        drag.last = point;
        let dx = if drag.lock.x { 0.0 } else { point.x - drag.origin.x };
        let dy = if drag.lock.y { 0.0 } else { point.y - drag.origin.y };
        loaded
            .transform
            .set_position(Point::new(drag.start.x + dx, drag.start.y + dy));
        engine.clamp_position(&mut loaded.transform, &boundary);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Canvas-space crop, or `None` when no image is ready.
    pub fn crop_data(&self) -> Option<CropData> {
        self.ready_image()
            .map(|loaded| coords::crop_data(&loaded.transform, &self.boundary))
    }

    /// Native-pixel crop, or `None` when no image is ready.
    pub fn dimensions(&self) -> Option<Dimensions> {
        let loaded = self.ready_image()?;
        let crop = coords::crop_data(&loaded.transform, &self.boundary);
        Some(coords::dimensions(
            &crop,
            loaded.transform.native_width,
            loaded.transform.native_height,
        ))
    }

    /// The native-pixel crop cut out of the upload.
    pub fn export(&self) -> Result<DecodedImage, ExportError> {
        let loaded = self.ready_image().ok_or(ExportError::NoImage)?;
        let dims = self.dimensions().ok_or(ExportError::NoImage)?;
        export::crop_native(&loaded.source, &dims)
    }

    /// The crop rendered at its on-canvas size.
    pub fn preview(&self) -> Result<DecodedImage, ExportError> {
        let loaded = self.ready_image().ok_or(ExportError::NoImage)?;
        let crop = coords::crop_data(&loaded.transform, &self.boundary);
        let dims = coords::dimensions(
            &crop,
            loaded.transform.native_width,
            loaded.transform.native_height,
        );
        export::render_preview(&loaded.source, &crop, &dims)
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn boundary(&self) -> CropBoundary {
        self.boundary
    }

    pub fn transform(&self) -> Option<ImageTransform> {
        self.ready_image().map(|loaded| loaded.transform)
    }

    pub fn scale_range(&self) -> Option<ScaleRange> {
        self.ready_image().map(|loaded| loaded.range)
    }

    /// Axes on which pointer movement is currently locked.
    pub fn axis_lock(&self) -> AxisLock {
        self.ready_image()
            .map(|loaded| self.engine.axis_lock(&loaded.transform, &self.boundary))
            .unwrap_or_default()
    }

    /// The decoded upload, for rendering backdrop jobs.
    pub fn source_image(&self) -> Option<&DecodedImage> {
        self.ready_image().map(|loaded| &loaded.source)
    }

    pub fn image_source(&self) -> Option<&ImageSource> {
        self.source.as_ref()
    }

    pub fn backdrop(&self) -> Option<&Backdrop> {
        self.backdrop.as_ref()
    }

    /// Take all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn begin_load(&mut self, source: ImageSource, coordinates: Option<CropData>) -> BackgroundJob {
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        self.clear_image();

        tracing::debug!(token = token.0, src = %source.src, "loading image");
        self.source = Some(source);
        self.pending = Some(PendingLoad {
            token,
            coordinates,
            image: None,
            backdrop: None,
        });
        self.state = SurfaceState::Loading;
        self.make_job(token)
    }

    fn make_job(&self, token: RequestToken) -> BackgroundJob {
        let (width, height) = self.config.backdrop_size();
        BackgroundJob {
            token,
            style: self.config.background,
            width,
            height,
        }
    }

    fn pending_for(&mut self, token: RequestToken) -> Option<&mut PendingLoad> {
        match self.pending.as_mut() {
            Some(pending) if pending.token == token => Some(pending),
            _ => {
                tracing::debug!(token = token.0, "ignoring stale image completion");
                None
            }
        }
    }

    fn try_finish_load(&mut self) {
        let settled = self
            .pending
            .as_ref()
            .is_some_and(|p| p.image.is_some() && p.backdrop.is_some());
        if !settled {
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };
        let (Some(image), Some(backdrop)) = (pending.image, pending.backdrop) else {
            return;
        };

        self.events.push(SurfaceEvent::ImageLoaded {
            scale: image.transform.scale,
            min_scale: image.range.min,
        });
        self.loaded = Some(image);
        self.backdrop = backdrop;
        self.state = SurfaceState::Ready;
        tracing::debug!(token = pending.token.0, "surface ready");
    }

    fn clear_image(&mut self) {
        self.pending = None;
        self.loaded = None;
        self.backdrop = None;
        self.drag = None;
        self.source = None;
        self.state = SurfaceState::Empty;
    }

    fn ready_image(&self) -> Option<&LoadedImage> {
        match self.state {
            SurfaceState::Ready => self.loaded.as_ref(),
            _ => None,
        }
    }

    fn emit_scalability(&mut self, range: ScaleRange) {
        self.events.push(if range.is_scalable() {
            SurfaceEvent::ImageScalable
        } else {
            SurfaceEvent::ImageNonScalable
        });
    }

    fn relayout(&mut self) {
        let previous = self.boundary;
        self.boundary = self.config.boundary();

        let (engine, boundary) = (self.engine, self.boundary);
        let image = match (self.loaded.as_mut(), self.pending.as_mut()) {
            (Some(loaded), _) => Some(loaded),
            (None, Some(pending)) => pending.image.as_mut(),
            (None, None) => None,
        };
        let Some(image) = image else {
            return;
        };

        // Keep the native point under the old boundary center under the new one
        let focus = coords::canvas_to_native(&image.transform, previous.rect().center());
        let before = image.transform.scale;
        image.range = engine.scale_range(image.transform.native_size(), &boundary);
        image
            .transform
            .set_scale(image.range.clamp(image.transform.scale));
        let center = boundary.rect().center();
        image.transform.set_position(Point::new(
            center.x - focus.x * image.transform.scale,
            center.y - focus.y * image.transform.scale,
        ));
        engine.apply(&mut image.transform, &image.range, &boundary);

        let range = image.range;
        let scale = image.transform.scale;
        self.emit_scalability(range);
        if scale != before {
            self.events.push(SurfaceEvent::ScaleChanged {
                scale,
                zoom: range.scale_to_zoom(scale),
            });
        }
        self.restart_drag();
    }

    /// Re-anchor an active drag after the transform moved under it.
    fn restart_drag(&mut self) {
        let (Some(drag), Some(loaded)) = (self.drag.as_mut(), self.loaded.as_ref()) else {
            return;
        };
        drag.origin = drag.last;
        drag.start = loaded.transform.position();
        drag.lock = self.engine.axis_lock(&loaded.transform, &self.boundary);
    }
}

/// Place a freshly decoded image: restored coordinates first, then the
/// configured initial scale, then the minimum scale centered on the boundary.
fn initial_transform(
    engine: &ConstraintEngine,
    boundary: &CropBoundary,
    image: &DecodedImage,
    coordinates: Option<&CropData>,
    initial_scale: Option<f64>,
) -> ImageTransform {
    let native = Size::new(image.width as f64, image.height as f64);
    let range = engine.scale_range(native, boundary);

    let restorable = coordinates.filter(|crop| crop.scale.is_finite() && crop.scale > 0.0);
    let mut transform = match restorable {
        Some(crop) => {
            let position = coords::placement_from_crop(crop, boundary);
            ImageTransform::set_image(
                image.width,
                image.height,
                position.x,
                position.y,
                range.clamp(crop.scale),
            )
        }
        None => {
            let scale = range.clamp(initial_scale.unwrap_or(range.min));
            let center = boundary.rect().center();
            ImageTransform::set_image(
                image.width,
                image.height,
                center.x - native.width * scale / 2.0,
                center.y - native.height * scale / 2.0,
                scale,
            )
        }
    };
    engine.apply(&mut transform, &range, boundary);
    transform
}

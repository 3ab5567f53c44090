//! Cropping surface WASM bindings.
//!
//! [`JsCropper`] wraps a [`CroppingSurface`] for the browser. The host owns
//! the canvas: it forwards pointer input, fetches image bytes, and paints
//! the backdrop and image from the getters. Surface events are delivered to
//! the callback registered with `on_event` as plain objects such as
//! `{ type: "image-loaded", scale: 0.5, min_scale: 0.25 }`.
//!
//! # Example
//!
//! ```typescript
//! const cropper = new JsCropper({ container_width: 600, container_height: 400, ratio: 1.5 });
//! cropper.on_event((event) => console.log(event.type));
//!
//! const token = cropper.set_image(url, savedCoordinates);
//! const bytes = new Uint8Array(await (await fetch(url)).arrayBuffer());
//! cropper.load_image_bytes(token, bytes);
//!
//! canvas.onpointerdown = (e) => cropper.pointer_down(e.offsetX, e.offsetY);
//! canvas.onpointermove = (e) => cropper.pointer_move(e.offsetX, e.offsetY);
//! canvas.onpointerup = () => cropper.pointer_up();
//!
//! form.coordinates.value = JSON.stringify(cropper.get_crop_data());
//! ```

use cropkit_core::decode;
use cropkit_core::{
    BackgroundJob, ControlMessage, CropData, CroppingSurface, Point, RequestToken, SurfaceOptions,
    SurfaceState,
};
use wasm_bindgen::prelude::*;

use crate::types::{JsBackdrop, JsDecodedImage};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Interactive cropper exposed to JavaScript.
#[wasm_bindgen]
pub struct JsCropper {
    inner: CroppingSurface,
    /// Backdrop job for the load in flight.
    job: Option<BackgroundJob>,
    listener: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl JsCropper {
    /// Create a cropper from an options object. Missing fields take their
    /// defaults; `undefined` uses all defaults.
    ///
    /// # Errors
    /// Returns an error for unknown option values or an invalid layout.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsCropper, JsValue> {
        let options: SurfaceOptions = if options.is_undefined() || options.is_null() {
            SurfaceOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid cropper options: {}", e)))?
        };
        let inner = CroppingSurface::from_options(options).map_err(to_js_error)?;
        Ok(Self::from_surface(inner))
    }

    /// Register the event callback, replacing any previous one.
    pub fn on_event(&mut self, callback: js_sys::Function) {
        self.listener = Some(callback);
    }

    pub fn off_event(&mut self) {
        self.listener = None;
    }

    /// Start loading `src`, optionally restoring saved crop coordinates.
    ///
    /// Returns the request token to pass to `load_image_bytes` or
    /// `fail_image` once the bytes are available.
    pub fn set_image(&mut self, src: String, coordinates: JsValue) -> Result<u64, JsValue> {
        let coordinates: Option<CropData> = if coordinates.is_undefined() || coordinates.is_null() {
            None
        } else {
            Some(
                serde_wasm_bindgen::from_value(coordinates)
                    .map_err(|e| JsValue::from_str(&format!("Invalid coordinates: {}", e)))?,
            )
        };
        let job = self.inner.set_image(src, coordinates);
        Ok(self.start(job))
    }

    /// Decode the fetched bytes for `token` and render the backdrop.
    ///
    /// Returns `false` if the token is stale. Decode failures are reported
    /// through an `upload-error` event.
    pub fn load_image_bytes(&mut self, token: u64, bytes: &[u8]) -> bool {
        let token = RequestToken(token);
        let accepted = match decode::decode_image(bytes) {
            Ok(image) => {
                let backdrop = self
                    .job
                    .as_ref()
                    .filter(|job| job.token() == token)
                    .map(|job| job.render(&image));
                let accepted = self.inner.image_decoded(token, image);
                if let (true, Some(result)) = (accepted, backdrop) {
                    self.inner.background_rendered(token, result);
                    self.job = None;
                }
                accepted
            }
            Err(e) => self.inner.image_failed(token, e.to_string()),
        };
        self.flush();
        accepted
    }

    /// Report that fetching the image for `token` failed.
    pub fn fail_image(&mut self, token: u64, message: String) -> bool {
        let accepted = self.inner.image_failed(RequestToken(token), message);
        self.flush();
        accepted
    }

    /// Handle a message from a sibling widget.
    ///
    /// Returns the request token when the message started a load.
    pub fn dispatch(&mut self, message: JsValue) -> Result<Option<u64>, JsValue> {
        let message: ControlMessage = serde_wasm_bindgen::from_value(message)
            .map_err(|e| JsValue::from_str(&format!("Invalid message: {}", e)))?;
        let result = self.inner.dispatch(message);
        self.flush();
        Ok(result.map_err(to_js_error)?.map(|job| self.start(job)))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.inner.pointer_down(Point::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.inner.pointer_move(Point::new(x, y))
    }

    pub fn pointer_up(&mut self) {
        self.inner.pointer_up();
    }

    pub fn set_scale(&mut self, scale: f64) -> bool {
        let changed = self.inner.set_scale(scale);
        self.flush();
        changed
    }

    /// Set the scale from a slider position in `[0, 1]`.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let changed = self.inner.set_zoom(zoom);
        self.flush();
        changed
    }

    pub fn update_ratio(&mut self, ratio: f64) -> Result<(), JsValue> {
        let result = self.inner.update_ratio(ratio);
        self.flush();
        result.map_err(to_js_error)
    }

    /// Resize the container and re-render the backdrop at the new size.
    pub fn resize_container(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        let result = self.inner.resize_container(width, height);
        if result.is_ok() {
            self.refresh_backdrop();
        }
        self.flush();
        result.map_err(to_js_error)
    }

    pub fn enable(&mut self) {
        self.inner.enable();
    }

    pub fn disable(&mut self) {
        self.inner.disable();
    }

    pub fn reset(&mut self) {
        self.inner.reset();
        self.job = None;
        self.flush();
    }

    /// Crop in canvas space, or `undefined` when no image is ready.
    pub fn get_crop_data(&self) -> Result<JsValue, JsValue> {
        match self.inner.crop_data() {
            Some(crop) => serde_wasm_bindgen::to_value(&crop).map_err(to_js_error),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Crop in native image pixels, or `undefined` when no image is ready.
    pub fn get_dimensions(&self) -> Result<JsValue, JsValue> {
        match self.inner.dimensions() {
            Some(dims) => serde_wasm_bindgen::to_value(&dims).map_err(to_js_error),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Image placement as `{ native_width, native_height, scale, left, top }`,
    /// or `undefined` when no image is ready.
    pub fn get_transform(&self) -> Result<JsValue, JsValue> {
        match self.inner.transform() {
            Some(transform) => serde_wasm_bindgen::to_value(&transform).map_err(to_js_error),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Crop boundary as `{ width, height, left, top }`.
    pub fn get_boundary(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.boundary()).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.inner.state() {
            SurfaceState::Empty => "empty",
            SurfaceState::Loading => "loading",
            SurfaceState::Ready => "ready",
        }
        .to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> Option<f64> {
        self.inner.transform().map(|t| t.scale)
    }

    #[wasm_bindgen(getter)]
    pub fn min_scale(&self) -> Option<f64> {
        self.inner.scale_range().map(|range| range.min)
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> Option<f64> {
        self.inner.zoom()
    }

    #[wasm_bindgen(getter)]
    pub fn enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    pub fn backdrop(&self) -> Option<JsBackdrop> {
        self.inner.backdrop().map(JsBackdrop::from_backdrop)
    }

    /// The crop rendered at its on-canvas size.
    pub fn preview(&self) -> Result<JsDecodedImage, JsValue> {
        self.inner
            .preview()
            .map(JsDecodedImage::from_decoded)
            .map_err(to_js_error)
    }

    /// The native-pixel crop of the upload.
    pub fn export(&self) -> Result<JsDecodedImage, JsValue> {
        self.inner
            .export()
            .map(JsDecodedImage::from_decoded)
            .map_err(to_js_error)
    }
}

impl JsCropper {
    pub(crate) fn from_surface(inner: CroppingSurface) -> Self {
        Self {
            inner,
            job: None,
            listener: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_config(config: cropkit_core::SurfaceConfig) -> Self {
        Self::from_surface(CroppingSurface::new(config))
    }

    fn start(&mut self, job: BackgroundJob) -> u64 {
        let token = job.token();
        self.job = Some(job);
        self.flush();
        token.0
    }

    fn refresh_backdrop(&mut self) {
        let Some(job) = self.inner.background_job() else {
            return;
        };
        let Some(result) = self.inner.source_image().map(|image| job.render(image)) else {
            return;
        };
        self.inner.background_rendered(job.token(), result);
    }

    /// Deliver queued events to the listener. Without a listener they are
    /// dropped.
    fn flush(&mut self) {
        let events = self.inner.drain_events();
        let Some(listener) = &self.listener else {
            return;
        };
        for event in events {
            let delivered = serde_wasm_bindgen::to_value(&event)
                .map(|value| listener.call1(&JsValue::NULL, &value));
            match delivered {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => web_sys::console::warn_1(&err),
                Err(e) => web_sys::console::warn_1(&to_js_error(e)),
            }
        }
    }
}

//! Cropkit WASM - WebAssembly bindings for Cropkit
//!
//! This crate exposes the cropkit-core cropping surface to JavaScript/TypeScript
//! applications.
//!
//! # Module Structure
//!
//! - `cropper` - The interactive [`JsCropper`] widget state
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - Standalone image decoding bindings
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropper } from '@cropkit/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const cropper = new JsCropper({ ratio: 16 / 9, letterbox: 'contain' });
//! const token = cropper.set_image(url);
//! cropper.load_image_bytes(token, new Uint8Array(await file.arrayBuffer()));
//! ```

use wasm_bindgen::prelude::*;

mod cropper;
mod decode;
mod types;

// Re-export public types
pub use cropper::JsCropper;
pub use decode::{decode_image, image_orientation};
pub use types::{JsBackdrop, JsDecodedImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

//! Image decoding for uploaded files.
//!
//! Uploaded bytes (JPEG or PNG) are decoded into RGB pixels with EXIF
//! orientation applied, so the native size seen by the cropping surface
//! matches what the user sees.
//!
//! Decoding is the only fallible step of loading an image. Failures are
//! reported as [`DecodeError`] and turned into an `upload-error` signal by
//! the surface.
//!
//! # Examples
//!
//! ```ignore
//! use cropkit_core::decode::decode_image;
//!
//! let bytes = std::fs::read("upload.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod source;
mod types;

pub use source::{decode_image, get_orientation};
pub use types::{DecodeError, DecodedImage, Orientation};

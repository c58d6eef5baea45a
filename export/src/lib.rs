//! Exports watched buffers as viewable images or as lossless raw matrices.
//!
//! A buffer is described by a [`PixelBuffer`]: borrowed bytes, an element type, dimensions,
//! channel count and row stride. From there, two paths lead to a file:
//!
//! - The bitmap path normalizes every pixel into four bytes with per-channel
//!   [`ContrastParameters`], fills in channels the buffer does not have, orders the bytes by a
//!   [`PixelLayout`] and encodes the result as PNG.
//! - The raw path copies the valid samples, without padding, into a small self-describing
//!   binary format that is read back by [`RawMatrix`].
//!
//! Files appear at their destination only once they have been written completely.
//!
//! # Usage
//!
//! ```
//! use imwatch_export::{
//!     export_buffer, ContrastParameters, OutputKind, OutputRequest, PixelBuffer, PixelLayout,
//! };
//!
//! // A 2x2 grayscale float image, rows padded to three pixels.
//! let samples = [0.0f32, 0.5, -1.0, 0.25, 1.0, -1.0];
//! let buffer = PixelBuffer::with_samples(&samples, 2, 2, 1, 3)?;
//!
//! let plane = imwatch_export::normalize(
//!     &buffer,
//!     &ContrastParameters::identity(buffer.kind()),
//!     PixelLayout::RGBA,
//! )?;
//! assert_eq!(plane[1], [127, 127, 127, 255]);
//!
//! let path = std::env::temp_dir().join("imwatch-doc-gradient.png");
//! let request = OutputRequest::new(&path, OutputKind::Bitmap);
//! export_buffer(&buffer, &ContrastParameters::auto_range(&buffer)?, "bgra".parse()?, &request)?;
//! # std::fs::remove_file(&path).unwrap();
//! # Ok::<(), imwatch_export::ExportError>(())
//! ```
#![deny(unsafe_code)]

mod bitmap;
mod buffer;
mod contrast;
mod destination;
mod error;
mod export;
mod layout;
mod matrix;
mod shader;

#[cfg(test)]
mod tests;

pub use self::buffer::{PixelBuffer, MAX_DIMENSION};
pub use self::contrast::ContrastParameters;
pub use self::error::{ErrorKind, ExportError};
pub use self::export::{
    export_buffer, export_raw, Compression, ExportOptions, Exporter, Filter, OutputKind,
    OutputRequest,
};
pub use self::layout::{Channel, PixelLayout};
pub use self::matrix::{read_raw_matrix, write_raw_matrix, RawMatrix};
pub use self::shader::{normalize, normalize_into};

pub use imwatch_texel::{ElementKind, Sample, StrideSpec, UnsupportedKindError};

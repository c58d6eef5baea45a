// Distributed under The MIT License (MIT)
//
// Copyright (c) 2019, 2020 The `image-rs` developers
//! # Texel
//!
//! Numeric sample kinds of watched buffers, and views that read them safely.
//!
//! A debugger hands us the memory of an array together with a few numbers: the element type,
//! the dimensions, the channel count and the row stride. This crate turns that description into
//! something that can be processed without trusting it:
//!
//! - [`ElementKind`] is the closed set of supported element types, with their size and display
//!   range.
//! - [`Sample`] is the capability trait of the matching Rust types. Through
//!   [`GenericSampleAction`] a runtime kind selects the type once, and all further code is
//!   compiled for that type.
//! - [`StridedSamples`] validates the layout, [`SampleView`] validates the bytes against it.
//!
//! ## Usage
//!
//! ```
//! use imwatch_texel::{ElementKind, SampleView, StrideSpec, StridedSamples};
//!
//! // Two rows of three u16 pixels, padded to four pixels per row.
//! let samples: [u16; 7] = [1, 2, 3, 0, 4, 5, 6];
//! let layout = StridedSamples::new(StrideSpec {
//!     kind: ElementKind::U16,
//!     width: 3,
//!     height: 2,
//!     channels: 1,
//!     row_stride: 4,
//! })?;
//!
//! let view = SampleView::<u16>::new(layout, bytemuck::cast_slice(&samples))?;
//! assert_eq!(view.samples().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6]);
//! # Ok::<(), imwatch_texel::BadStrideError>(())
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
extern crate alloc;

mod kind;
mod stride;
mod texel;

pub use self::kind::{ElementKind, GenericSampleAction, UnsupportedKindError};
pub use self::stride::{
    BadStrideError, BadStrideKind, PixelRef, SampleRow, SampleView, StrideSpec, StridedSamples,
};
pub use self::texel::Sample;

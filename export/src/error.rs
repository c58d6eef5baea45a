use core::fmt;
use std::{error, io};

use imwatch_texel::{BadStrideError, BadStrideKind, UnsupportedKindError};

/// An error from validating or exporting a buffer.
///
/// Inspect [`ExportError::kind`] to decide how to react. The underlying cause, if any, is
/// available through [`std::error::Error::source`].
pub struct ExportError {
    kind: ErrorKind,
    cause: Cause,
}

/// The category of an [`ExportError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Width or height is zero, or too large for the output formats.
    InvalidDimensions,
    /// The channel count is not within `1..=4`.
    InvalidChannelCount,
    /// The row stride does not cover a full row, or the layout overflows memory.
    InvalidStride,
    /// The data is shorter than the described matrix.
    BufferTooShort,
    /// The element type can not be exported.
    UnsupportedElementKind,
    /// The pixel layout is not a permutation of `r`, `g`, `b`, `a`.
    MalformedPixelLayout,
    /// The destination can not be created, written or moved into place.
    DestinationUnwritable,
    /// The image encoder rejected the pixel data.
    EncodingFailure,
    /// A raw matrix file could not be read or parsed.
    MalformedMatrix,
}

enum Cause {
    None,
    Message(&'static str),
    Stride(BadStrideError),
    Element(UnsupportedKindError),
    Io(io::Error),
    Image(image::ImageError),
}

impl ExportError {
    pub(crate) fn new(kind: ErrorKind, message: &'static str) -> Self {
        ExportError {
            kind,
            cause: Cause::Message(message),
        }
    }

    pub(crate) fn io(kind: ErrorKind, err: io::Error) -> Self {
        ExportError {
            kind,
            cause: Cause::Io(err),
        }
    }

    pub(crate) fn encoding(err: image::ImageError) -> Self {
        let kind = match err {
            // The encoder writes straight into our destination file.
            image::ImageError::IoError(_) => ErrorKind::DestinationUnwritable,
            _ => ErrorKind::EncodingFailure,
        };

        ExportError {
            kind,
            cause: Cause::Image(err),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl ErrorKind {
    fn describe(self) -> &'static str {
        match self {
            ErrorKind::InvalidDimensions => "invalid dimensions",
            ErrorKind::InvalidChannelCount => "invalid channel count",
            ErrorKind::InvalidStride => "invalid row stride",
            ErrorKind::BufferTooShort => "buffer too short",
            ErrorKind::UnsupportedElementKind => "unsupported element type",
            ErrorKind::MalformedPixelLayout => "malformed pixel layout",
            ErrorKind::DestinationUnwritable => "destination not writable",
            ErrorKind::EncodingFailure => "encoding failed",
            ErrorKind::MalformedMatrix => "malformed raw matrix",
        }
    }
}

impl From<BadStrideError> for ExportError {
    fn from(err: BadStrideError) -> Self {
        let kind = match err.kind() {
            BadStrideKind::Empty => ErrorKind::InvalidDimensions,
            BadStrideKind::Channels => ErrorKind::InvalidChannelCount,
            BadStrideKind::OverlappingRows | BadStrideKind::OutOfMemory => ErrorKind::InvalidStride,
            BadStrideKind::TooShort => ErrorKind::BufferTooShort,
            BadStrideKind::MismatchedKind => ErrorKind::UnsupportedElementKind,
        };

        ExportError {
            kind,
            cause: Cause::Stride(err),
        }
    }
}

impl From<UnsupportedKindError> for ExportError {
    fn from(err: UnsupportedKindError) -> Self {
        ExportError {
            kind: ErrorKind::UnsupportedElementKind,
            cause: Cause::Element(err),
        }
    }
}

impl From<ErrorKind> for ExportError {
    fn from(kind: ErrorKind) -> Self {
        ExportError {
            kind,
            cause: Cause::None,
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = self.kind.describe();
        match &self.cause {
            Cause::None => write!(f, "{}", what),
            Cause::Message(msg) => write!(f, "{}: {}", what, msg),
            Cause::Stride(err) => write!(f, "{}: {}", what, err),
            Cause::Element(err) => write!(f, "{}: {}", what, err),
            Cause::Io(err) => write!(f, "{}: {}", what, err),
            Cause::Image(err) => write!(f, "{}: {}", what, err),
        }
    }
}

impl fmt::Debug for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut dbg = f.debug_struct("ExportError");
        dbg.field("kind", &self.kind);
        match &self.cause {
            Cause::None => {}
            Cause::Message(msg) => {
                dbg.field("message", msg);
            }
            Cause::Stride(err) => {
                dbg.field("cause", err);
            }
            Cause::Element(err) => {
                dbg.field("cause", err);
            }
            Cause::Io(err) => {
                dbg.field("cause", err);
            }
            Cause::Image(err) => {
                dbg.field("cause", err);
            }
        }
        dbg.finish()
    }
}

impl error::Error for ExportError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.cause {
            Cause::None | Cause::Message(_) => None,
            Cause::Stride(err) => Some(err),
            Cause::Element(err) => Some(err),
            Cause::Io(err) => Some(err),
            Cause::Image(err) => Some(err),
        }
    }
}

#[test]
fn stride_errors_keep_their_category() {
    use imwatch_texel::{ElementKind, StrideSpec, StridedSamples};

    let spec = StrideSpec {
        kind: ElementKind::U8,
        width: 4,
        height: 4,
        channels: 1,
        row_stride: 4,
    };

    let check = |spec: StrideSpec, kind: ErrorKind| {
        let err = ExportError::from(StridedSamples::new(spec).unwrap_err());
        assert_eq!(err.kind(), kind);
        assert!(error::Error::source(&err).is_some());
    };

    check(StrideSpec { height: 0, ..spec }, ErrorKind::InvalidDimensions);
    check(StrideSpec { channels: 5, ..spec }, ErrorKind::InvalidChannelCount);
    check(StrideSpec { row_stride: 3, ..spec }, ErrorKind::InvalidStride);
}

#[test]
fn display_names_the_category() {
    let err = ExportError::new(ErrorKind::MalformedPixelLayout, "letter `x` is not a channel");
    assert_eq!(
        err.to_string(),
        "malformed pixel layout: letter `x` is not a channel"
    );
    assert_eq!(
        ExportError::from(ErrorKind::BufferTooShort).to_string(),
        "buffer too short"
    );
}

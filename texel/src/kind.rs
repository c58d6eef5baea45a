//! The runtime tag of a sample type, and dispatch from the tag to generic code.
use core::{fmt, str::FromStr};

use crate::texel::Sample;

/// The numeric representation of a single sample of a watched buffer.
///
/// This is a closed set. Buffers of any other element type can not be viewed, the conversion
/// functions report them as [`UnsupportedKindError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

/// An element type that has no corresponding [`ElementKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedKindError {
    repr: UnsupportedRepr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum UnsupportedRepr {
    Code(i32),
    Name(alloc::string::String),
}

/// A computation that is generic over the sample type of a buffer.
///
/// Use [`ElementKind::action`] to run it with the type that matches a runtime kind. The choice is
/// made exactly once, so the body is compiled separately for each sample type and contains no
/// branches on the kind.
pub trait GenericSampleAction<R = ()> {
    fn run<T: Sample>(self) -> R;
}

impl ElementKind {
    /// All kinds, in order of their bridge code.
    pub const ALL: [ElementKind; 6] = [
        ElementKind::U8,
        ElementKind::U16,
        ElementKind::I16,
        ElementKind::I32,
        ElementKind::F32,
        ElementKind::F64,
    ];

    /// Interpret a numeric type code as sent by the debugger bridge.
    ///
    /// The codes follow the usual depth constants of matrix libraries: `0` is `u8`, `2` is `u16`,
    /// `3` is `i16`, `4` is `i32`, `5` is `f32` and `6` is `f64`. Notably `1`, signed bytes, is
    /// not supported.
    pub fn from_code(code: i32) -> Result<Self, UnsupportedKindError> {
        Ok(match code {
            0 => ElementKind::U8,
            2 => ElementKind::U16,
            3 => ElementKind::I16,
            4 => ElementKind::I32,
            5 => ElementKind::F32,
            6 => ElementKind::F64,
            _ => {
                return Err(UnsupportedKindError {
                    repr: UnsupportedRepr::Code(code),
                })
            }
        })
    }

    /// The bridge code of this kind, inverse of [`ElementKind::from_code`].
    pub const fn code(self) -> i32 {
        match self {
            ElementKind::U8 => 0,
            ElementKind::U16 => 2,
            ElementKind::I16 => 3,
            ElementKind::I32 => 4,
            ElementKind::F32 => 5,
            ElementKind::F64 => 6,
        }
    }

    /// The size of one sample in bytes.
    pub fn size(self) -> usize {
        struct ToSize;

        impl GenericSampleAction<usize> for ToSize {
            fn run<T: Sample>(self) -> usize {
                core::mem::size_of::<T>()
            }
        }

        self.action(ToSize)
    }

    /// The raw value displayed at full intensity, see [`Sample::MAX_INTENSITY`].
    pub fn max_intensity(self) -> f32 {
        struct ToMax;

        impl GenericSampleAction<f32> for ToMax {
            fn run<T: Sample>(self) -> f32 {
                T::MAX_INTENSITY
            }
        }

        self.action(ToMax)
    }

    /// Whether samples of this kind are floating point numbers.
    pub const fn is_float(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    /// The name written into raw matrix headers.
    pub const fn token(self) -> &'static str {
        match self {
            ElementKind::U8 => "uint8",
            ElementKind::U16 => "uint16",
            ElementKind::I16 => "int16",
            ElementKind::I32 => "int32",
            ElementKind::F32 => "float",
            ElementKind::F64 => "double",
        }
    }

    /// Run a generic action with the sample type of this kind.
    pub fn action<R>(self, action: impl GenericSampleAction<R>) -> R {
        match self {
            ElementKind::U8 => action.run::<u8>(),
            ElementKind::U16 => action.run::<u16>(),
            ElementKind::I16 => action.run::<i16>(),
            ElementKind::I32 => action.run::<i32>(),
            ElementKind::F32 => action.run::<f32>(),
            ElementKind::F64 => action.run::<f64>(),
        }
    }
}

impl FromStr for ElementKind {
    type Err = UnsupportedKindError;

    /// Parse a header token. The aliases `float32` and `float64` are accepted as well.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "uint8" => ElementKind::U8,
            "uint16" => ElementKind::U16,
            "int16" => ElementKind::I16,
            "int32" => ElementKind::I32,
            "float" | "float32" => ElementKind::F32,
            "double" | "float64" => ElementKind::F64,
            other => {
                return Err(UnsupportedKindError {
                    repr: UnsupportedRepr::Name(other.into()),
                })
            }
        })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl fmt::Display for UnsupportedKindError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.repr {
            UnsupportedRepr::Code(code) => write!(f, "unsupported element type code {}", code),
            UnsupportedRepr::Name(name) => write!(f, "unsupported element type `{}`", name),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnsupportedKindError {}

#[test]
fn codes_round_trip() {
    for kind in ElementKind::ALL {
        assert_eq!(ElementKind::from_code(kind.code()), Ok(kind));
    }

    assert!(ElementKind::from_code(1).is_err());
    assert!(ElementKind::from_code(7).is_err());
    assert!(ElementKind::from_code(-1).is_err());
}

#[test]
fn tokens() {
    for kind in ElementKind::ALL {
        assert_eq!(kind.token().parse::<ElementKind>(), Ok(kind));
    }

    assert_eq!("float32".parse::<ElementKind>(), Ok(ElementKind::F32));
    assert_eq!("float64".parse::<ElementKind>(), Ok(ElementKind::F64));
    assert!("int8".parse::<ElementKind>().is_err());
    assert!("".parse::<ElementKind>().is_err());
}

#[test]
fn sizes() {
    let sizes = ElementKind::ALL.map(ElementKind::size);
    assert_eq!(sizes, [1, 2, 2, 4, 4, 8]);
}

// Distributed under The MIT License (MIT)
//
// Copyright (c) 2019, 2020 The `image-rs` developers
use core::fmt;

use crate::kind::ElementKind;

/// Describes a numeric type that can be the sample of a watched buffer.
///
/// Every implementation is a plain old data type, which lets us read it from arbitrary (and
/// arbitrarily aligned) bytes of the debuggee's memory without any further checks. The set of
/// implementations is closed: it is exactly the types named by [`ElementKind`].
///
/// The capability set is deliberately small. Anything the export pipeline needs to know about a
/// numeric kind is expressed here, so that generic code can be instantiated once per buffer and
/// never inspects the kind inside its loops.
pub trait Sample: bytemuck::Pod + fmt::Debug + PartialEq + sealed::Sealed {
    /// The runtime tag corresponding to this type.
    const KIND: ElementKind;

    /// The value that is displayed at full intensity when no contrast is applied.
    ///
    /// This is the maximum representable value for integer types and `1.0` for floats.
    const MAX_INTENSITY: f32;

    /// Convert the sample into the floating point domain of the display math.
    fn to_display(self) -> f32;

    /// Read one sample from the start of `bytes`, which need not be aligned.
    ///
    /// # Panics
    ///
    /// When `bytes` is shorter than the size of `Self`.
    #[inline]
    fn read_unaligned(bytes: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(&bytes[..core::mem::size_of::<Self>()])
    }
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! int_sample {
    ($(($ty:ty, $kind:ident)),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Sample for $ty {
                const KIND: ElementKind = ElementKind::$kind;
                const MAX_INTENSITY: f32 = <$ty>::MAX as f32;

                #[inline]
                fn to_display(self) -> f32 {
                    self as f32
                }
            }
        )*
    }
}

int_sample!((u8, U8), (u16, U16), (i16, I16), (i32, I32));

impl sealed::Sealed for f32 {}

impl Sample for f32 {
    const KIND: ElementKind = ElementKind::F32;
    const MAX_INTENSITY: f32 = 1.0;

    #[inline]
    fn to_display(self) -> f32 {
        self
    }
}

impl sealed::Sealed for f64 {}

/// Doubles share the single precision display path.
///
/// Each sample is narrowed to `f32` before contrast is applied. Values that differ only beyond
/// the 24th bit of mantissa therefore produce the same display byte. This only ever affects the
/// rendered bitmap, raw exports copy all 64 bits.
impl Sample for f64 {
    const KIND: ElementKind = ElementKind::F64;
    const MAX_INTENSITY: f32 = 1.0;

    #[inline]
    fn to_display(self) -> f32 {
        self as f32
    }
}

#[test]
fn max_intensity() {
    assert_eq!(u8::MAX_INTENSITY, 255.0);
    assert_eq!(u16::MAX_INTENSITY, 65535.0);
    assert_eq!(i16::MAX_INTENSITY, 32767.0);
    assert_eq!(i32::MAX_INTENSITY, 2147483648.0);
    assert_eq!(f32::MAX_INTENSITY, 1.0);
    assert_eq!(f64::MAX_INTENSITY, 1.0);
}

#[test]
fn unaligned_reads() {
    let bytes = [0u8, 0x34, 0x12, 0x78, 0x56];
    assert_eq!(u16::read_unaligned(&bytes[1..]), u16::from_ne_bytes([0x34, 0x12]));
    assert_eq!(i16::read_unaligned(&bytes[3..]), i16::from_ne_bytes([0x78, 0x56]));

    let value = 0.75f64;
    let mut bytes = [0u8; 9];
    bytes[1..].copy_from_slice(&value.to_ne_bytes());
    assert_eq!(f64::read_unaligned(&bytes[1..]), 0.75);
}

#[test]
fn double_narrowing() {
    let close = 1.0f64 + 1e-12;
    assert_ne!(close, 1.0f64);
    assert_eq!(close.to_display(), 1.0f32);
}

//! Normalization of raw samples into displayable RGBA bytes.
//!
//! Works like a tiny fragment stage: every pixel is read as up to four samples, each channel
//! goes through its affine contrast transform and is quantized to a byte, missing channels are
//! filled in, and finally the bytes are shuffled into the requested output layout. Both the
//! sample type and the channel count are chosen once per buffer so that the loop body is
//! specialized for each combination.
use core::array;

use imwatch_texel::{GenericSampleAction, PixelRef, Sample, SampleView};

use crate::buffer::PixelBuffer;
use crate::contrast::ContrastParameters;
use crate::error::ExportError;
use crate::layout::PixelLayout;

/// Bytes of channels that the source does not have: black, fully opaque.
const DEFAULT_PIXEL: [u8; 4] = [0, 0, 0, 255];

/// Per-call constants of the contrast transform, for one sample type.
#[derive(Clone, Copy, Debug)]
struct Quantizer {
    scale: [f32; 4],
    /// The bias, premultiplied with the maximum intensity of the sample type.
    offset: [f32; 4],
    /// Maps the display range of the sample type onto `0..=255`.
    color_scale: f32,
}

impl Quantizer {
    fn new<T: Sample>(contrast: &ContrastParameters) -> Self {
        let max_intensity = T::MAX_INTENSITY;
        Quantizer {
            scale: contrast.scale(),
            offset: contrast.bias().map(|bias| bias * max_intensity),
            color_scale: 255.0 / max_intensity,
        }
    }

    /// Transform and quantize one sample of channel `c`.
    ///
    /// Values are clamped and then truncated towards zero, NaN becomes zero.
    #[inline]
    fn channel(&self, c: usize, value: f32) -> u8 {
        let normalized = value * self.scale[c] + self.offset[c];
        (normalized * self.color_scale).clamp(0.0, 255.0) as u8
    }

    /// Compute the bytes of a pixel with `N` source channels, in `r`, `g`, `b`, `a` order.
    #[inline]
    fn pixel<T: Sample, const N: usize>(&self, pixel: &PixelRef<'_, T>) -> [u8; 4] {
        let samples: [T; N] = array::from_fn(|c| pixel.channel(c));
        let mut computed = DEFAULT_PIXEL;

        for (c, sample) in samples.into_iter().enumerate() {
            computed[c] = self.channel(c, sample.to_display());
        }

        if N == 1 {
            // Grayscale: repeat the single value into green and blue.
            computed[1] = computed[0];
            computed[2] = computed[0];
        }

        computed
    }
}

/// Normalize a whole buffer into a packed RGBA plane.
///
/// The result holds `width * height` pixels in row-major order without any padding. Each output
/// pixel has its bytes ordered according to `layout`.
pub fn normalize(
    buffer: &PixelBuffer<'_>,
    contrast: &ContrastParameters,
    layout: PixelLayout,
) -> Result<Vec<[u8; 4]>, ExportError> {
    let mut plane = Vec::new();
    normalize_into(buffer, contrast, layout, &mut plane)?;
    Ok(plane)
}

/// Normalize a buffer, reusing the allocation of `plane`.
///
/// Any previous content of `plane` is discarded.
pub fn normalize_into(
    buffer: &PixelBuffer<'_>,
    contrast: &ContrastParameters,
    layout: PixelLayout,
    plane: &mut Vec<[u8; 4]>,
) -> Result<(), ExportError> {
    struct Normalize<'buf, 'data> {
        buffer: &'buf PixelBuffer<'data>,
        contrast: &'buf ContrastParameters,
        layout: PixelLayout,
        plane: &'buf mut Vec<[u8; 4]>,
    }

    impl GenericSampleAction<Result<(), ExportError>> for Normalize<'_, '_> {
        fn run<T: Sample>(self) -> Result<(), ExportError> {
            let view = self.buffer.view::<T>()?;
            let quantizer = Quantizer::new::<T>(self.contrast);

            match view.channels() {
                1 => shade::<T, 1>(&view, &quantizer, self.layout, self.plane),
                2 => shade::<T, 2>(&view, &quantizer, self.layout, self.plane),
                3 => shade::<T, 3>(&view, &quantizer, self.layout, self.plane),
                4 => shade::<T, 4>(&view, &quantizer, self.layout, self.plane),
                // The layout of a view guarantees the channel count.
                _ => unreachable!("channel count outside of 1..=4"),
            }

            Ok(())
        }
    }

    plane.clear();
    plane.reserve_exact(buffer.width() * buffer.height());

    buffer.kind().action(Normalize {
        buffer,
        contrast,
        layout,
        plane,
    })
}

fn shade<T: Sample, const N: usize>(
    view: &SampleView<'_, T>,
    quantizer: &Quantizer,
    layout: PixelLayout,
    plane: &mut Vec<[u8; 4]>,
) {
    debug_assert_eq!(view.channels(), N);

    if layout.is_identity() {
        for row in view.rows() {
            plane.extend(row.pixels().map(|px| quantizer.pixel::<T, N>(&px)));
        }
    } else {
        for row in view.rows() {
            plane.extend(row.pixels().map(|px| layout.remap(quantizer.pixel::<T, N>(&px))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imwatch_texel::ElementKind;

    fn quantizer<T: Sample>(contrast: &ContrastParameters) -> Quantizer {
        Quantizer::new::<T>(contrast)
    }

    #[test]
    fn clamps_and_truncates() {
        let q = quantizer::<u8>(&ContrastParameters::identity(ElementKind::U8));
        assert_eq!(q.channel(0, 10.0), 10);
        assert_eq!(q.channel(0, 10.9), 10);
        assert_eq!(q.channel(0, -5.0), 0);
        assert_eq!(q.channel(0, 300.0), 255);

        let q = quantizer::<f32>(&ContrastParameters::identity(ElementKind::F32));
        assert_eq!(q.channel(0, 0.5), 127);
        assert_eq!(q.channel(0, 1.0), 255);
        assert_eq!(q.channel(0, f32::NAN), 0);
        assert_eq!(q.channel(0, f32::INFINITY), 255);
        assert_eq!(q.channel(0, f32::NEG_INFINITY), 0);
    }

    #[test]
    fn bias_shifts_by_intensity() {
        // Half intensity bias on a u16 buffer lifts zero to mid gray.
        let contrast =
            ContrastParameters::from_coefficients([1.0, 1.0, 1.0, 1.0, 0.5, 0.0, 0.0, 0.0]);
        let q = quantizer::<u16>(&contrast);
        assert_eq!(q.channel(0, 0.0), 127);
        assert_eq!(q.channel(1, 70000.0), 255);
    }

    #[test]
    fn missing_channels_default() {
        let contrast = ContrastParameters::identity(ElementKind::U8);
        let q = quantizer::<u8>(&contrast);
        let samples = [7u8, 8, 9, 10];
        let buffer = PixelBuffer::with_samples(&samples, 1, 1, 2, 1).unwrap();
        let view = buffer.view::<u8>().unwrap();
        let pixel = view.row(0).pixels().next().unwrap();
        assert_eq!(q.pixel::<u8, 2>(&pixel), [7, 8, 0, 255]);

        let buffer = PixelBuffer::with_samples(&samples[..1], 1, 1, 1, 1).unwrap();
        let view = buffer.view::<u8>().unwrap();
        let pixel = view.row(0).pixels().next().unwrap();
        assert_eq!(q.pixel::<u8, 1>(&pixel), [7, 7, 7, 255]);
    }

    #[test]
    fn plane_is_reused() {
        let samples = [1u8, 2, 3, 4];
        let buffer = PixelBuffer::with_samples(&samples, 2, 2, 1, 2).unwrap();
        let contrast = ContrastParameters::identity(ElementKind::U8);

        let mut plane = vec![[9; 4]; 100];
        normalize_into(&buffer, &contrast, PixelLayout::RGBA, &mut plane).unwrap();
        assert_eq!(plane.len(), 4);
        assert_eq!(plane[3], [4, 4, 4, 255]);
    }
}

//! Per-channel contrast and brightness.
use imwatch_texel::{ElementKind, GenericSampleAction, Sample, SampleView};

use crate::buffer::PixelBuffer;
use crate::error::ExportError;

/// Affine coefficients mapping raw samples onto display intensity, per channel.
///
/// A sample `v` of channel `c` is displayed as `v * scale[c] + bias[c] * max_intensity`, in the
/// intensity range of its element kind. The coefficients are usually derived from a range of raw
/// values with [`ContrastParameters::from_range`], where the minimum maps to black and the
/// maximum to full intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContrastParameters {
    scale: [f32; 4],
    bias: [f32; 4],
}

impl ContrastParameters {
    /// Map `min[c]..=max[c]` of each channel onto the full display range of `kind`.
    ///
    /// A channel whose range is empty (`min == max`), or not finite, is displayed as constant
    /// zero instead of dividing by zero.
    pub fn from_range(kind: ElementKind, min: [f32; 4], max: [f32; 4]) -> Self {
        let max_intensity = kind.max_intensity();
        let mut scale = [0.0; 4];
        let mut bias = [0.0; 4];

        for c in 0..4 {
            let span = max[c] - min[c];
            if span == 0.0 || !span.is_finite() {
                continue;
            }

            scale[c] = max_intensity / span;
            bias[c] = -min[c] / span;
        }

        ContrastParameters { scale, bias }
    }

    /// Use coefficients as delivered by the viewer, `[scale_r, .., scale_a, bias_r, .., bias_a]`.
    pub fn from_coefficients(coefficients: [f32; 8]) -> Self {
        let [s0, s1, s2, s3, b0, b1, b2, b3] = coefficients;
        ContrastParameters {
            scale: [s0, s1, s2, s3],
            bias: [b0, b1, b2, b3],
        }
    }

    /// Display raw values unchanged, the setting when automatic contrast is off.
    pub fn identity(kind: ElementKind) -> Self {
        Self::from_range(kind, [0.0; 4], [kind.max_intensity(); 4])
    }

    /// Stretch each channel between the smallest and largest value found in the buffer.
    ///
    /// NaN samples are ignored. Channels the buffer does not have, and channels without any
    /// finite sample, keep the identity range.
    pub fn auto_range(buffer: &PixelBuffer<'_>) -> Result<Self, ExportError> {
        struct FindRange<'data, 'buf> {
            buffer: &'buf PixelBuffer<'data>,
        }

        impl GenericSampleAction<Result<([f32; 4], [f32; 4]), ExportError>> for FindRange<'_, '_> {
            fn run<T: Sample>(self) -> Result<([f32; 4], [f32; 4]), ExportError> {
                let view: SampleView<T> = self.buffer.view()?;
                let mut min = [f32::INFINITY; 4];
                let mut max = [f32::NEG_INFINITY; 4];

                for row in view.rows() {
                    for pixel in row.pixels() {
                        for (c, value) in pixel.iter().enumerate() {
                            let value = value.to_display();
                            // `min`/`max` ignore NaN on either side.
                            min[c] = min[c].min(value);
                            max[c] = max[c].max(value);
                        }
                    }
                }

                for c in 0..4 {
                    if !(min[c].is_finite() && max[c].is_finite()) {
                        min[c] = 0.0;
                        max[c] = T::MAX_INTENSITY;
                    }
                }

                Ok((min, max))
            }
        }

        let kind = buffer.kind();
        let (min, max) = kind.action(FindRange { buffer })?;
        log::debug!(
            "auto contrast for {}: min {:?}, max {:?}",
            buffer.type_label(),
            min,
            max
        );
        Ok(Self::from_range(kind, min, max))
    }

    /// The multiplier of each channel.
    pub fn scale(&self) -> [f32; 4] {
        self.scale
    }

    /// The offset of each channel, relative to the maximum intensity.
    pub fn bias(&self) -> [f32; 4] {
        self.bias
    }

    /// The coefficients in the order of [`ContrastParameters::from_coefficients`].
    pub fn coefficients(&self) -> [f32; 8] {
        let [s0, s1, s2, s3] = self.scale;
        let [b0, b1, b2, b3] = self.bias;
        [s0, s1, s2, s3, b0, b1, b2, b3]
    }
}

#[test]
fn full_range_is_identity() {
    let u8_params = ContrastParameters::from_range(ElementKind::U8, [0.0; 4], [255.0; 4]);
    assert_eq!(u8_params.scale(), [1.0; 4]);
    assert_eq!(u8_params.bias(), [0.0; 4]);

    let float_params = ContrastParameters::from_range(ElementKind::F32, [0.0; 4], [1.0; 4]);
    assert_eq!(float_params, ContrastParameters::identity(ElementKind::F32));
    assert_eq!(float_params.scale(), [1.0; 4]);
}

#[test]
fn range_endpoints() {
    let params = ContrastParameters::from_range(ElementKind::U16, [100.0; 4], [1100.0; 4]);
    let max = ElementKind::U16.max_intensity();
    let apply = |v: f32| v * params.scale()[0] + params.bias()[0] * max;

    assert!(apply(100.0).abs() < 0.1);
    assert!((apply(1100.0) - max).abs() < 0.1);
}

#[test]
fn degenerate_range_is_zero() {
    let params = ContrastParameters::from_range(
        ElementKind::F32,
        [0.5, 0.0, f32::NEG_INFINITY, 0.0],
        [0.5, 1.0, 1.0, f32::NAN],
    );

    assert_eq!(params.scale(), [0.0, 1.0, 0.0, 0.0]);
    assert_eq!(params.bias(), [0.0, 0.0, 0.0, 0.0]);
    assert!(params.coefficients().iter().all(|c| c.is_finite()));
}

#[test]
fn coefficient_order() {
    let coefficients = [1.0, 2.0, 3.0, 4.0, -1.0, -2.0, -3.0, -4.0];
    let params = ContrastParameters::from_coefficients(coefficients);
    assert_eq!(params.scale(), [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(params.bias(), [-1.0, -2.0, -3.0, -4.0]);
    assert_eq!(params.coefficients(), coefficients);
}

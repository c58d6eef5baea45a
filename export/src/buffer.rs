//! The borrowed description of a watched buffer.
use imwatch_texel::{ElementKind, Sample, SampleView, StrideSpec, StridedSamples};

use crate::error::{ErrorKind, ExportError};

/// The largest width or height we accept.
///
/// Raw matrix headers store dimensions as 4-byte signed integers, PNG as 4-byte unsigned ones.
pub const MAX_DIMENSION: usize = i32::MAX as usize;

/// A validated view of a buffer in the memory of the debugged program.
///
/// The buffer is borrowed for the duration of an export and never copied as a whole. All checks
/// happen in the constructor: the layout is sane, and the data covers every valid sample of the
/// last row. The padding after the final row need not be present.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'data> {
    layout: StridedSamples,
    data: &'data [u8],
}

impl<'data> PixelBuffer<'data> {
    /// Validate a buffer description against its bytes.
    pub fn new(spec: StrideSpec, data: &'data [u8]) -> Result<Self, ExportError> {
        if spec.width > MAX_DIMENSION || spec.height > MAX_DIMENSION {
            return Err(ExportError::new(
                ErrorKind::InvalidDimensions,
                "width and height must fit into a 32-bit signed integer",
            ));
        }

        let layout = StridedSamples::new(spec)?;
        if data.len() < layout.byte_len() {
            return Err(ExportError::new(
                ErrorKind::BufferTooShort,
                "data does not cover the last row",
            ));
        }

        Ok(PixelBuffer { layout, data })
    }

    /// Describe typed samples, the kind is taken from the sample type.
    pub fn with_samples<T: Sample>(
        samples: &'data [T],
        width: usize,
        height: usize,
        channels: usize,
        row_stride: usize,
    ) -> Result<Self, ExportError> {
        let spec = StrideSpec {
            kind: T::KIND,
            width,
            height,
            channels,
            row_stride,
        };

        PixelBuffer::new(spec, bytemuck::cast_slice(samples))
    }

    pub fn kind(&self) -> ElementKind {
        self.layout.spec().kind
    }

    pub fn width(&self) -> usize {
        self.layout.spec().width
    }

    pub fn height(&self) -> usize {
        self.layout.spec().height
    }

    pub fn channels(&self) -> usize {
        self.layout.spec().channels
    }

    /// The distance between row starts, in pixel slots.
    pub fn row_stride(&self) -> usize {
        self.layout.spec().row_stride
    }

    pub fn layout(&self) -> StridedSamples {
        self.layout
    }

    pub fn as_bytes(&self) -> &'data [u8] {
        self.data
    }

    /// View the samples as `T`, which must match the element kind.
    pub fn view<T: Sample>(&self) -> Result<SampleView<'data, T>, ExportError> {
        Ok(SampleView::new(self.layout, self.data)?)
    }

    /// A short description of the sample type, such as `uint8` or `floatx3`.
    pub fn type_label(&self) -> String {
        match self.channels() {
            1 => self.kind().to_string(),
            n => format!("{}x{}", self.kind(), n),
        }
    }
}

#[test]
fn validation() {
    let data = [0u8; 64];
    let spec = StrideSpec {
        kind: ElementKind::U16,
        width: 3,
        height: 2,
        channels: 2,
        row_stride: 4,
    };

    let buffer = PixelBuffer::new(spec, &data[..(4 + 3) * 2 * 2]).expect("Exactly long enough");
    assert_eq!(buffer.row_stride(), 4);
    assert_eq!(buffer.type_label(), "uint16x2");

    let short = PixelBuffer::new(spec, &data[..(4 + 3) * 2 * 2 - 1]).unwrap_err();
    assert_eq!(short.kind(), ErrorKind::BufferTooShort);

    let empty = PixelBuffer::new(StrideSpec { width: 0, ..spec }, &data).unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::InvalidDimensions);

    let huge = PixelBuffer::new(
        StrideSpec {
            width: MAX_DIMENSION + 1,
            row_stride: MAX_DIMENSION + 1,
            ..spec
        },
        &data,
    )
    .unwrap_err();
    assert_eq!(huge.kind(), ErrorKind::InvalidDimensions);

    let channels = PixelBuffer::new(StrideSpec { channels: 0, ..spec }, &data).unwrap_err();
    assert_eq!(channels.kind(), ErrorKind::InvalidChannelCount);

    let stride = PixelBuffer::new(StrideSpec { row_stride: 2, ..spec }, &data).unwrap_err();
    assert_eq!(stride.kind(), ErrorKind::InvalidStride);
}

#[test]
fn typed_samples() {
    let samples = [0.5f32, 0.25, 0.75];
    let buffer = PixelBuffer::with_samples(&samples, 1, 1, 3, 1).expect("Valid");
    assert_eq!(buffer.kind(), ElementKind::F32);
    assert_eq!(buffer.type_label(), "floatx3");
    assert!(buffer.view::<u8>().is_err());

    let view = buffer.view::<f32>().expect("Matching kind");
    assert_eq!(view.samples().collect::<Vec<_>>(), samples);
}

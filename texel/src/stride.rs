//! Bounds-checked, strided views of sample matrices.
//!
//! Watched buffers live in another program's memory and come to us as a plain byte slice along
//! with a description of how to interpret it. Nothing about that description is trusted: a
//! [`StrideSpec`] is validated once into a [`StridedSamples`] layout, which proves that all
//! index computations fit into a `usize`, and a [`SampleView`] additionally proves that the
//! bytes are long enough for the layout. After that, rows and pixels can be accessed without
//! any further checks in the caller's loops.
//!
//! Rows may be padded. Their starts are `row_stride` pixel slots apart, where a slot holds one
//! sample of every channel. Only the first `width` slots of each row belong to the matrix.
use core::fmt;
use core::marker::PhantomData;
use core::ops::Range;

use crate::kind::ElementKind;
use crate::texel::Sample;

/// A description of a strided sample matrix, as handed to us by the debugger bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrideSpec {
    /// The numeric type of each sample.
    pub kind: ElementKind,
    /// The number of pixels in width direction.
    pub width: usize,
    /// The number of pixels in height direction.
    pub height: usize,
    /// The number of interleaved samples per pixel, between 1 and 4.
    pub channels: usize,
    /// The number of pixel slots from the start of one row to the start of the next.
    ///
    /// Must be at least `width`. Any excess is padding that is never read.
    pub row_stride: usize,
}

/// A validated layout of a strided sample matrix.
///
/// The invariants are that the matrix is not empty, has between one and four channels, rows do
/// not overlap, and all of the layout's byte offsets fit into memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StridedSamples {
    spec: StrideSpec,
    /// The number of bytes covered by the layout, as proof of calculation basically.
    total: usize,
}

/// Error that occurs when a [`StrideSpec`] is invalid, or does not fit its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BadStrideError {
    kind: BadStrideKind,
}

/// The reason a layout was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadStrideKind {
    /// Width or height is zero.
    Empty,
    /// The channel count is not within `1..=4`.
    Channels,
    /// The row stride is smaller than the width.
    OverlappingRows,
    /// The layout does not describe an addressable amount of memory.
    OutOfMemory,
    /// The data is shorter than the layout requires.
    TooShort,
    /// The view's sample type differs from the layout's element kind.
    MismatchedKind,
}

/// A typed, read-only view of a strided sample matrix in borrowed bytes.
///
/// The bytes need not be aligned for `T`, samples are read with unaligned loads.
pub struct SampleView<'data, T> {
    layout: StridedSamples,
    data: &'data [u8],
    sample: PhantomData<fn() -> T>,
}

/// The valid samples of a single row, without padding.
pub struct SampleRow<'data, T> {
    bytes: &'data [u8],
    channels: usize,
    sample: PhantomData<fn() -> T>,
}

/// The samples of a single pixel.
pub struct PixelRef<'data, T> {
    bytes: &'data [u8],
    sample: PhantomData<fn() -> T>,
}

impl StrideSpec {
    fn sample_size(&self) -> usize {
        self.kind.size()
    }

    /// The past-the-end byte of the last valid sample, if representable.
    fn end(&self) -> Option<usize> {
        let pixel = self.channels.checked_mul(self.sample_size())?;
        let row_pitch = self.row_stride.checked_mul(pixel)?;
        let last_row = (self.height - 1).checked_mul(row_pitch)?;
        let row = self.width.checked_mul(pixel)?;
        last_row.checked_add(row)
    }
}

impl StridedSamples {
    /// Try to create a new layout from a specification.
    ///
    /// This fails for empty matrices, channel counts outside of `1..=4`, a row stride that is
    /// smaller than the width, and for layouts not expressible in memory on the current
    /// architecture.
    pub fn new(spec: StrideSpec) -> Result<Self, BadStrideError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(BadStrideKind::Empty.into());
        }

        if !(1..=4).contains(&spec.channels) {
            return Err(BadStrideKind::Channels.into());
        }

        if spec.row_stride < spec.width {
            return Err(BadStrideKind::OverlappingRows.into());
        }

        let total = spec.end().ok_or(BadStrideKind::OutOfMemory)?;
        Ok(StridedSamples { spec, total })
    }

    /// Construct a layout of rows without padding.
    pub fn packed(
        kind: ElementKind,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, BadStrideError> {
        StridedSamples::new(StrideSpec {
            kind,
            width,
            height,
            channels,
            row_stride: width,
        })
    }

    /// Get the specification of this layout.
    pub fn spec(&self) -> StrideSpec {
        self.spec
    }

    /// The minimum number of bytes a buffer with this layout must have.
    ///
    /// This does not include the padding after the last row, which need not exist.
    pub fn byte_len(&self) -> usize {
        self.total
    }

    /// The number of valid samples in each row, `width * channels`.
    pub fn row_len(&self) -> usize {
        self.spec.width * self.spec.channels
    }

    /// The number of valid samples in the whole matrix.
    pub fn sample_count(&self) -> usize {
        self.row_len() * self.spec.height
    }

    /// Whether rows follow each other without padding.
    pub fn is_packed(&self) -> bool {
        self.spec.row_stride == self.spec.width
    }

    /// The byte range of the valid samples of row `y`.
    fn row_bytes(&self, y: usize) -> Range<usize> {
        let pixel = self.spec.channels * self.spec.sample_size();
        // No overflow, this is bounded by `total` for all rows.
        let start = y * self.spec.row_stride * pixel;
        start..start + self.spec.width * pixel
    }
}

impl BadStrideError {
    /// The reason for rejecting the layout.
    pub fn kind(&self) -> BadStrideKind {
        self.kind
    }
}

impl<'data, T: Sample> SampleView<'data, T> {
    /// Check the data against the layout and wrap it in a view.
    pub fn new(layout: StridedSamples, data: &'data [u8]) -> Result<Self, BadStrideError> {
        if layout.spec.kind != T::KIND {
            return Err(BadStrideKind::MismatchedKind.into());
        }

        if data.len() < layout.total {
            return Err(BadStrideKind::TooShort.into());
        }

        Ok(SampleView {
            layout,
            data,
            sample: PhantomData,
        })
    }

    pub fn layout(&self) -> StridedSamples {
        self.layout
    }

    pub fn width(&self) -> usize {
        self.layout.spec.width
    }

    pub fn height(&self) -> usize {
        self.layout.spec.height
    }

    pub fn channels(&self) -> usize {
        self.layout.spec.channels
    }

    /// Get the valid samples of row `y`.
    ///
    /// # Panics
    ///
    /// When `y` is not smaller than the height.
    pub fn row(&self, y: usize) -> SampleRow<'data, T> {
        assert!(y < self.height(), "Row {} out of bounds", y);
        let data: &'data [u8] = self.data;
        SampleRow {
            bytes: &data[self.layout.row_bytes(y)],
            channels: self.channels(),
            sample: PhantomData,
        }
    }

    /// Iterate over all rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = SampleRow<'data, T>> + '_ {
        (0..self.height()).map(move |y| self.row(y))
    }

    /// Iterate over all valid samples in row-major order, skipping padding.
    pub fn samples(&self) -> impl Iterator<Item = T> + '_ {
        self.rows().flat_map(|row| row.samples())
    }
}

impl<'data, T: Sample> SampleRow<'data, T> {
    /// The number of valid samples in the row.
    pub fn len(&self) -> usize {
        self.bytes.len() / core::mem::size_of::<T>()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The row's samples in their original memory representation.
    pub fn as_bytes(&self) -> &'data [u8] {
        self.bytes
    }

    /// Read the sample at `idx`, counted in samples from the row start.
    pub fn get(&self, idx: usize) -> Option<T> {
        let size = core::mem::size_of::<T>();
        let start = idx.checked_mul(size)?;
        let bytes = self.bytes.get(start..start.checked_add(size)?)?;
        Some(T::read_unaligned(bytes))
    }

    pub fn samples(&self) -> impl Iterator<Item = T> + 'data {
        self.bytes
            .chunks_exact(core::mem::size_of::<T>())
            .map(T::read_unaligned)
    }

    /// Iterate over the pixels of the row, left to right.
    pub fn pixels(&self) -> impl Iterator<Item = PixelRef<'data, T>> + 'data {
        self.bytes
            .chunks_exact(self.channels * core::mem::size_of::<T>())
            .map(|bytes| PixelRef {
                bytes,
                sample: PhantomData,
            })
    }
}

impl<'data, T: Sample> PixelRef<'data, T> {
    /// The number of channels of this pixel.
    pub fn channels(&self) -> usize {
        self.bytes.len() / core::mem::size_of::<T>()
    }

    /// Read channel `c`.
    ///
    /// # Panics
    ///
    /// When `c` is not smaller than the channel count.
    #[inline]
    pub fn channel(&self, c: usize) -> T {
        T::read_unaligned(&self.bytes[c * core::mem::size_of::<T>()..])
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'data {
        let bytes: &'data [u8] = self.bytes;
        bytes
            .chunks_exact(core::mem::size_of::<T>())
            .map(T::read_unaligned)
    }
}

impl From<BadStrideKind> for BadStrideError {
    fn from(kind: BadStrideKind) -> Self {
        BadStrideError { kind }
    }
}

impl fmt::Display for BadStrideError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            BadStrideKind::Empty => write!(f, "matrix has no pixels"),
            BadStrideKind::Channels => write!(f, "channel count must be between 1 and 4"),
            BadStrideKind::OverlappingRows => write!(f, "row stride is smaller than the width"),
            BadStrideKind::OutOfMemory => write!(f, "matrix does not fit into memory"),
            BadStrideKind::TooShort => write!(f, "data is shorter than the matrix layout"),
            BadStrideKind::MismatchedKind => write!(f, "sample type does not match the layout"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BadStrideError {}

impl<T> fmt::Debug for SampleView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SampleView")
            .field("layout", &self.layout)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
fn layout(
    kind: ElementKind,
    width: usize,
    height: usize,
    channels: usize,
    row_stride: usize,
) -> StridedSamples {
    StridedSamples::new(StrideSpec {
        kind,
        width,
        height,
        channels,
        row_stride,
    })
    .expect("Valid layout")
}

#[test]
fn validation() {
    let good = StrideSpec {
        kind: ElementKind::U16,
        width: 3,
        height: 2,
        channels: 2,
        row_stride: 4,
    };
    assert!(StridedSamples::new(good).is_ok());

    let empty = StrideSpec { width: 0, ..good };
    assert_eq!(
        StridedSamples::new(empty).unwrap_err().kind(),
        BadStrideKind::Empty
    );
    let no_channels = StrideSpec { channels: 0, ..good };
    assert_eq!(
        StridedSamples::new(no_channels).unwrap_err().kind(),
        BadStrideKind::Channels
    );
    let five_channels = StrideSpec { channels: 5, ..good };
    assert_eq!(
        StridedSamples::new(five_channels).unwrap_err().kind(),
        BadStrideKind::Channels
    );
    let overlap = StrideSpec { row_stride: 2, ..good };
    assert_eq!(
        StridedSamples::new(overlap).unwrap_err().kind(),
        BadStrideKind::OverlappingRows
    );
    let huge = StrideSpec {
        height: usize::MAX,
        ..good
    };
    assert_eq!(
        StridedSamples::new(huge).unwrap_err().kind(),
        BadStrideKind::OutOfMemory
    );
}

#[test]
fn byte_len_excludes_trailing_padding() {
    // Two full rows of 4 slots with 2 channels of 2 bytes, then 3 valid slots.
    let layout = layout(ElementKind::I16, 3, 3, 2, 4);
    assert_eq!(layout.byte_len(), 2 * 4 * 2 * 2 + 3 * 2 * 2);
    assert_eq!(layout.row_len(), 6);
    assert_eq!(layout.sample_count(), 18);
    assert!(!layout.is_packed());
}

#[test]
fn view_checks_data() {
    let layout = layout(ElementKind::U8, 2, 2, 1, 3);
    let short = [0u8; 4];
    assert_eq!(
        SampleView::<u8>::new(layout, &short).unwrap_err().kind(),
        BadStrideKind::TooShort
    );
    let exact = [0u8; 5];
    assert!(SampleView::<u8>::new(layout, &exact).is_ok());
    assert_eq!(
        SampleView::<u16>::new(layout, &exact).unwrap_err().kind(),
        BadStrideKind::MismatchedKind
    );
}

#[test]
fn rows_skip_padding() {
    let samples: [i16; 8] = [1, 2, 3, 4, -9, -9, -9, -9];
    let mut data = [0u8; 16];
    data.copy_from_slice(bytemuck::cast_slice(&samples[..]));
    let data = [&data[..], &data[..]].concat();

    // Width 2 with 2 channels, stride of 4 slots: half of each row is padding.
    let layout = layout(ElementKind::I16, 2, 2, 2, 4);
    let view = SampleView::<i16>::new(layout, &data).expect("Long enough");

    for row in view.rows() {
        assert_eq!(row.len(), 4);
        assert_eq!(row.samples().collect::<alloc::vec::Vec<_>>(), [1, 2, 3, 4]);
    }

    let pixels: alloc::vec::Vec<_> = view
        .row(1)
        .pixels()
        .map(|px| [px.channel(0), px.channel(1)])
        .collect();
    assert_eq!(pixels, [[1, 2], [3, 4]]);
    assert_eq!(view.samples().count(), 8);
}

#[test]
fn row_get_out_of_bounds() {
    let samples: [u16; 3] = [5, 6, 7];
    let layout = layout(ElementKind::U16, 3, 1, 1, 3);
    let view = SampleView::<u16>::new(layout, bytemuck::cast_slice(&samples[..])).expect("Exact");
    let row = view.row(0);

    assert_eq!(row.get(2), Some(7));
    assert_eq!(row.get(3), None);
    assert_eq!(row.get(usize::MAX / 2), None);
    assert_eq!(row.get(usize::MAX), None);
}

#[test]
fn unaligned_view() {
    let samples: [f32; 2] = [0.5, 0.25];
    let mut data = alloc::vec![0u8; 9];
    data[1..].copy_from_slice(bytemuck::cast_slice(&samples[..]));

    let layout = layout(ElementKind::F32, 2, 1, 1, 2);
    let view = SampleView::<f32>::new(layout, &data[1..]).expect("Long enough");
    assert_eq!(view.row(0).get(1), Some(0.25));
    assert_eq!(view.row(0).get(2), None);
}

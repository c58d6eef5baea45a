//! The raw typed matrix format.
//!
//! A file starts with the ASCII name of the element type and a newline, followed by height,
//! width and channel count as 4-byte signed integers in native byte order. The samples follow
//! in row-major order with interleaved channels, again in native byte order, without any row
//! padding. Nothing is converted: every sample is stored bit for bit.
//!
//! | token    | element | bytes |
//! |----------|---------|-------|
//! | `uint8`  | `u8`    | 1     |
//! | `uint16` | `u16`   | 2     |
//! | `int16`  | `i16`   | 2     |
//! | `int32`  | `i32`   | 4     |
//! | `float`  | `f32`   | 4     |
//! | `double` | `f64`   | 8     |
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use imwatch_texel::{ElementKind, GenericSampleAction, Sample, SampleView, StridedSamples};

use crate::buffer::PixelBuffer;
use crate::error::{ErrorKind, ExportError};

/// The longest token we look for before giving up on the header.
const MAX_TOKEN_LEN: usize = 16;

/// A raw matrix read back into memory.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMatrix {
    kind: ElementKind,
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

/// Write the valid samples of `buffer` in the raw matrix format.
///
/// Padding between rows is skipped, the written matrix is always packed.
pub fn write_raw_matrix(buffer: &PixelBuffer<'_>, mut into: impl Write) -> io::Result<()> {
    struct WriteRows<'buf, 'data, W> {
        buffer: &'buf PixelBuffer<'data>,
        into: W,
    }

    impl<W: Write> GenericSampleAction<io::Result<()>> for WriteRows<'_, '_, W> {
        fn run<T: Sample>(mut self) -> io::Result<()> {
            // The buffer was validated for its own kind, this view can not fail.
            let view: SampleView<T> = self
                .buffer
                .view()
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

            for row in view.rows() {
                self.into.write_all(row.as_bytes())?;
            }

            Ok(())
        }
    }

    let header = [buffer.height(), buffer.width(), buffer.channels()];
    into.write_all(buffer.kind().token().as_bytes())?;
    into.write_all(b"\n")?;
    for dim in header {
        // Dimensions are bounded by `MAX_DIMENSION`, channels by four.
        let dim = i32::try_from(dim)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "dimension exceeds i32"))?;
        into.write_all(&dim.to_ne_bytes())?;
    }

    buffer.kind().action(WriteRows {
        buffer,
        into: &mut into,
    })?;

    into.flush()
}

/// Read a raw matrix file.
pub fn read_raw_matrix(path: impl AsRef<Path>) -> Result<RawMatrix, ExportError> {
    let file = File::open(path.as_ref())
        .map_err(|err| ExportError::io(ErrorKind::MalformedMatrix, err))?;
    RawMatrix::read(BufReader::new(file))
}

impl RawMatrix {
    /// Parse a raw matrix from a reader.
    ///
    /// The reader must end right after the last sample.
    pub fn read(mut from: impl Read) -> Result<Self, ExportError> {
        let malformed = |msg| ExportError::new(ErrorKind::MalformedMatrix, msg);
        let io_err = |err| ExportError::io(ErrorKind::MalformedMatrix, err);

        let mut token = Vec::with_capacity(MAX_TOKEN_LEN);
        loop {
            let mut byte = [0u8];
            from.read_exact(&mut byte).map_err(io_err)?;
            match byte[0] {
                b'\n' => break,
                _ if token.len() == MAX_TOKEN_LEN => {
                    return Err(malformed("type token is not terminated"))
                }
                other => token.push(other),
            }
        }

        let kind: ElementKind = core::str::from_utf8(&token)
            .map_err(|_| malformed("type token is not ASCII"))?
            .parse()?;

        let mut header = [0u8; 12];
        from.read_exact(&mut header).map_err(io_err)?;
        let [height, width, channels] = [0usize, 4, 8].map(|at| {
            let mut dim = [0u8; 4];
            dim.copy_from_slice(&header[at..at + 4]);
            i32::from_ne_bytes(dim)
        });

        let dimension = |dim: i32| {
            usize::try_from(dim)
                .ok()
                .filter(|&dim| dim > 0)
                .ok_or_else(|| malformed("dimensions must be positive"))
        };

        let height = dimension(height)?;
        let width = dimension(width)?;
        let channels = dimension(channels)?;
        let layout = StridedSamples::packed(kind, width, height, channels)
            .map_err(|_| malformed("header does not describe a valid matrix"))?;

        // The header is untrusted, only grow as far as the data actually goes.
        let len = layout.byte_len();
        let mut data = Vec::new();
        from.by_ref()
            .take(u64::try_from(len).unwrap_or(u64::MAX))
            .read_to_end(&mut data)
            .map_err(io_err)?;

        if data.len() < len {
            return Err(malformed("data ends before the last sample"));
        }

        let mut trailing = [0u8];
        if from.read(&mut trailing).map_err(io_err)? != 0 {
            return Err(malformed("data continues after the last sample"));
        }

        Ok(RawMatrix {
            kind,
            height,
            width,
            channels,
            data,
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// The samples exactly as stored in the file.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Borrow the matrix as a packed buffer, for example to export it again.
    pub fn as_buffer(&self) -> Result<PixelBuffer<'_>, ExportError> {
        PixelBuffer::new(
            imwatch_texel::StrideSpec {
                kind: self.kind,
                width: self.width,
                height: self.height,
                channels: self.channels,
                row_stride: self.width,
            },
            &self.data,
        )
    }

    /// Decode all samples as `T`, which must match the element kind.
    pub fn samples<T: Sample>(&self) -> Result<Vec<T>, ExportError> {
        let buffer = self.as_buffer()?;
        let view = buffer.view::<T>()?;
        Ok(view.samples().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(buffer: &PixelBuffer) -> Vec<u8> {
        let mut out = vec![];
        write_raw_matrix(buffer, &mut out).expect("Writing to memory");
        out
    }

    #[test]
    fn header_layout() {
        let samples = [1u16, 2, 3, 4, 5, 6];
        let buffer = PixelBuffer::with_samples(&samples, 3, 1, 2, 3).unwrap();
        let bytes = encode(&buffer);

        assert!(bytes.starts_with(b"uint16\n"));
        let header = &bytes[7..19];
        assert_eq!(header[0..4], 1i32.to_ne_bytes());
        assert_eq!(header[4..8], 3i32.to_ne_bytes());
        assert_eq!(header[8..12], 2i32.to_ne_bytes());
        assert_eq!(&bytes[19..], bytemuck::cast_slice::<u16, u8>(&samples));
    }

    #[test]
    fn padding_is_skipped() {
        // Three pixels of two channels per row, followed by one slot of padding.
        let samples: [i16; 16] = [
            1, 2, 3, 4, 5, 6, -999, -999, //
            7, 8, 9, 10, 11, 12, -999, -999,
        ];
        let buffer = PixelBuffer::with_samples(&samples, 3, 2, 2, 4).unwrap();
        let bytes = encode(&buffer);
        assert_eq!(bytes.len(), b"int16\n".len() + 12 + 12 * 2);

        let matrix = RawMatrix::read(&bytes[..]).unwrap();
        assert_eq!(matrix.kind(), ElementKind::I16);
        assert_eq!((matrix.height(), matrix.width(), matrix.channels()), (2, 3, 2));
        let values = matrix.samples::<i16>().unwrap();
        assert_eq!(values, (1..=12).collect::<Vec<i16>>());
    }

    #[test]
    fn doubles_are_lossless() {
        let samples = [0.1f64, 1e300, -0.0, f64::MIN_POSITIVE];
        let buffer = PixelBuffer::with_samples(&samples, 4, 1, 1, 4).unwrap();
        let bytes = encode(&buffer);
        assert!(bytes.starts_with(b"double\n"));

        let matrix = RawMatrix::read(&bytes[..]).unwrap();
        let values = matrix.samples::<f64>().unwrap();
        let bits = |v: &[f64]| v.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&values), bits(&samples));
    }

    #[test]
    fn reject_malformed() {
        let samples = [1u8, 2, 3, 4];
        let buffer = PixelBuffer::with_samples(&samples, 2, 2, 1, 2).unwrap();
        let good = encode(&buffer);
        assert!(RawMatrix::read(&good[..]).is_ok());

        let check = |bytes: &[u8]| {
            let err = RawMatrix::read(bytes).unwrap_err();
            assert!(
                matches!(
                    err.kind(),
                    ErrorKind::MalformedMatrix | ErrorKind::UnsupportedElementKind
                ),
                "{:?}",
                err
            );
        };

        // Truncated samples, and trailing garbage.
        check(&good[..good.len() - 1]);
        let mut longer = good.clone();
        longer.push(0);
        check(&longer);

        // Unknown token, and one that never ends.
        check(b"int8\n");
        check(&[b'x'; 64]);

        // Negative height.
        let mut negative = b"uint8\n".to_vec();
        negative.extend_from_slice(&(-2i32).to_ne_bytes());
        negative.extend_from_slice(&2i32.to_ne_bytes());
        negative.extend_from_slice(&1i32.to_ne_bytes());
        check(&negative);

        // Five channels.
        let mut channels = b"uint8\n".to_vec();
        channels.extend_from_slice(&1i32.to_ne_bytes());
        channels.extend_from_slice(&1i32.to_ne_bytes());
        channels.extend_from_slice(&5i32.to_ne_bytes());
        channels.extend_from_slice(&[0; 5]);
        check(&channels);
    }

    #[test]
    fn oversized_header_without_data() {
        // Claims four tebibytes of samples, but ends right after the header.
        let mut huge = b"uint8\n".to_vec();
        huge.extend_from_slice(&(1i32 << 20).to_ne_bytes());
        huge.extend_from_slice(&(1i32 << 20).to_ne_bytes());
        huge.extend_from_slice(&4i32.to_ne_bytes());
        huge.extend_from_slice(&[7; 100]);

        let err = RawMatrix::read(&huge[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMatrix);
    }

    #[test]
    fn mismatched_sample_type() {
        let samples = [1.5f32];
        let buffer = PixelBuffer::with_samples(&samples, 1, 1, 1, 1).unwrap();
        let matrix = RawMatrix::read(&encode(&buffer)[..]).unwrap();
        assert!(matrix.samples::<i32>().is_err());
        assert_eq!(matrix.samples::<f32>().unwrap(), [1.5]);
    }
}

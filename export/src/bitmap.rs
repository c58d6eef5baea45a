//! PNG encoding of normalized planes.
use std::io::Write;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{ErrorKind, ExportError};
use crate::export::{Compression, ExportOptions, Filter};

/// Encode a packed RGBA plane of `width * height` pixels.
pub(crate) fn write_png(
    plane: &[[u8; 4]],
    width: usize,
    height: usize,
    options: &ExportOptions,
    into: impl Write,
) -> Result<(), ExportError> {
    debug_assert_eq!(plane.len(), width * height);

    let dimension = |dim: usize| {
        u32::try_from(dim).map_err(|_| {
            ExportError::new(
                ErrorKind::InvalidDimensions,
                "bitmap dimensions must fit into 32 bits",
            )
        })
    };

    let (width, height) = (dimension(width)?, dimension(height)?);
    let encoder = PngEncoder::new_with_quality(
        into,
        compression_type(options.compression()),
        filter_type(options.filter()),
    );

    encoder
        .write_image(
            bytemuck::cast_slice(plane),
            width,
            height,
            ExtendedColorType::Rgba8,
        )
        .map_err(ExportError::encoding)
}

fn compression_type(compression: Compression) -> CompressionType {
    match compression {
        Compression::Fast => CompressionType::Fast,
        Compression::Default => CompressionType::Default,
        Compression::Best => CompressionType::Best,
    }
}

fn filter_type(filter: Filter) -> FilterType {
    match filter {
        Filter::Adaptive => FilterType::Adaptive,
        Filter::NoFilter => FilterType::NoFilter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn decode(png: &[u8]) -> image::RgbaImage {
        image::load_from_memory_with_format(png, ImageFormat::Png)
            .expect("Valid png")
            .into_rgba8()
    }

    #[test]
    fn pixels_survive_encoding() {
        let plane = [[0, 1, 2, 3], [255, 128, 64, 0], [9, 9, 9, 255]];
        let mut png = vec![];
        write_png(&plane, 3, 1, &ExportOptions::default(), &mut png).unwrap();

        let image = decode(&png);
        assert_eq!(image.dimensions(), (3, 1));
        assert_eq!(image.as_raw().as_slice(), bytemuck::cast_slice::<_, u8>(&plane[..]));
    }

    #[test]
    fn options_do_not_change_pixels() {
        let plane: Vec<[u8; 4]> = (0..64u8).map(|v| [v, v * 2, 255 - v, 255]).collect();

        for compression in [Compression::Fast, Compression::Default, Compression::Best] {
            for filter in [Filter::Adaptive, Filter::NoFilter] {
                let options = ExportOptions::default()
                    .with_compression(compression)
                    .with_filter(filter);
                let mut png = vec![];
                write_png(&plane, 8, 8, &options, &mut png).unwrap();
                assert_eq!(
                    decode(&png).as_raw().as_slice(),
                    bytemuck::cast_slice::<_, u8>(&plane[..])
                );
            }
        }
    }
}

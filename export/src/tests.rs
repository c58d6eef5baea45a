use crate::{
    normalize, ContrastParameters, ElementKind, ErrorKind, PixelBuffer, PixelLayout, RawMatrix,
    StrideSpec,
};

/// Deterministic, varied samples of any kind, `count` of them, as bytes.
fn sample_bytes(kind: ElementKind, count: usize) -> Vec<u8> {
    let values = (0..count).map(|i| (i * 7919 % 1013) as i64 - 300);
    match kind {
        ElementKind::U8 => values.map(|v| v as u8).collect(),
        ElementKind::U16 => bytes(values.map(|v| (v * 61) as u16)),
        ElementKind::I16 => bytes(values.map(|v| (v * 31) as i16)),
        ElementKind::I32 => bytes(values.map(|v| (v * 1_000_003) as i32)),
        ElementKind::F32 => bytes(values.map(|v| v as f32 / 500.0)),
        ElementKind::F64 => bytes(values.map(|v| v as f64 / 500.0)),
    }
}

fn bytes<T: bytemuck::Pod>(values: impl Iterator<Item = T>) -> Vec<u8> {
    let values: Vec<T> = values.collect();
    bytemuck::cast_slice(&values).to_vec()
}

fn spec(
    kind: ElementKind,
    width: usize,
    height: usize,
    channels: usize,
    row_stride: usize,
) -> StrideSpec {
    StrideSpec {
        kind,
        width,
        height,
        channels,
        row_stride,
    }
}

#[test]
fn every_kind_and_channel_count() -> Result<(), crate::ExportError> {
    for kind in ElementKind::ALL {
        for channels in 1..=4 {
            let spec = spec(kind, 5, 3, channels, 7);
            let data = sample_bytes(kind, 7 * 3 * channels);
            let buffer = PixelBuffer::new(spec, &data)?;

            for contrast in [
                ContrastParameters::identity(kind),
                ContrastParameters::auto_range(&buffer)?,
            ] {
                let plane = normalize(&buffer, &contrast, PixelLayout::RGBA)?;
                assert_eq!(plane.len(), 5 * 3, "{:?} with {} channels", kind, channels);

                for &[r, g, b, a] in &plane {
                    if channels == 1 {
                        assert_eq!((r, r), (g, b));
                    }
                    if channels == 2 {
                        assert_eq!(b, 0);
                    }
                    if channels < 4 {
                        assert_eq!(a, 255);
                    }
                }
            }
        }
    }

    Ok(())
}

#[test]
fn normalization_is_repeatable() {
    let data = sample_bytes(ElementKind::F32, 4 * 4 * 3);
    let buffer = PixelBuffer::new(spec(ElementKind::F32, 4, 4, 3, 4), &data).unwrap();
    let contrast = ContrastParameters::auto_range(&buffer).unwrap();

    let first = normalize(&buffer, &contrast, PixelLayout::BGRA).unwrap();
    let second = normalize(&buffer, &contrast, PixelLayout::BGRA).unwrap();
    assert_eq!(first, second);
}

#[test]
fn layouts_permute_identical_pixels() {
    let data = sample_bytes(ElementKind::U16, 6 * 2 * 4);
    let buffer = PixelBuffer::new(spec(ElementKind::U16, 5, 2, 4, 6), &data).unwrap();
    let contrast = ContrastParameters::auto_range(&buffer).unwrap();

    let rgba = normalize(&buffer, &contrast, PixelLayout::RGBA).unwrap();
    let bgra = normalize(&buffer, &contrast, PixelLayout::BGRA).unwrap();
    let argb = normalize(&buffer, &contrast, "argb".parse().unwrap()).unwrap();

    for ((&[r, g, b, a], &swapped), &rotated) in rgba.iter().zip(&bgra).zip(&argb) {
        assert_eq!(swapped, [b, g, r, a]);
        assert_eq!(rotated, [a, r, g, b]);
    }
}

#[test]
fn values_clamp_at_both_ends() {
    let samples = [0u8, 100, 200, 255];
    let buffer = PixelBuffer::with_samples(&samples, 4, 1, 1, 4).unwrap();

    // Doubled, then shifted down by a quarter of the range.
    let contrast =
        ContrastParameters::from_coefficients([2.0, 2.0, 2.0, 2.0, -0.25, 0.0, 0.0, 0.0]);
    let plane = normalize(&buffer, &contrast, PixelLayout::RGBA).unwrap();
    let red: Vec<u8> = plane.iter().map(|px| px[0]).collect();
    assert_eq!(red[0], 0);
    assert_eq!(red[2], 255);
    assert_eq!(red[3], 255);
}

#[test]
fn grayscale_identity() {
    let samples = [10u8, 200];
    let buffer = PixelBuffer::with_samples(&samples, 2, 1, 1, 2).unwrap();
    let contrast = ContrastParameters::from_range(ElementKind::U8, [0.0; 4], [255.0; 4]);
    let plane = normalize(&buffer, &contrast, "rgba".parse().unwrap()).unwrap();
    assert_eq!(plane, [[10, 10, 10, 255], [200, 200, 200, 255]]);
}

#[test]
fn float_color_swapped() {
    let samples = [0.5f32, 0.25, 0.75];
    let buffer = PixelBuffer::with_samples(&samples, 1, 1, 3, 1).unwrap();
    let contrast = ContrastParameters::from_range(ElementKind::F32, [0.0; 4], [1.0; 4]);
    let plane = normalize(&buffer, &contrast, "bgra".parse().unwrap()).unwrap();
    assert_eq!(plane, [[191, 63, 127, 255]]);
}

#[test]
fn doubles_narrow_for_display_only() {
    let close = [0.5f64, 0.5 + 1e-12];
    assert_ne!(close[0], close[1]);
    let buffer = PixelBuffer::with_samples(&close, 2, 1, 1, 2).unwrap();

    let contrast = ContrastParameters::identity(ElementKind::F64);
    let plane = normalize(&buffer, &contrast, PixelLayout::RGBA).unwrap();
    assert_eq!(plane[0], plane[1]);

    let mut raw = vec![];
    crate::write_raw_matrix(&buffer, &mut raw).unwrap();
    let matrix = RawMatrix::read(&raw[..]).unwrap();
    assert_eq!(matrix.samples::<f64>().unwrap(), close);
}

#[test]
fn bridge_codes() {
    let data = [0u8; 16];
    for (code, size) in [(0, 1), (2, 2), (3, 2), (4, 4), (5, 4), (6, 8)] {
        let kind = ElementKind::from_code(code).unwrap();
        assert_eq!(kind.size(), size);
        let buffer = PixelBuffer::new(spec(kind, 2, 1, 1, 2), &data).unwrap();
        assert_eq!(buffer.as_bytes().len(), 16);
    }

    let err = crate::ExportError::from(ElementKind::from_code(1).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::UnsupportedElementKind);
}

#[test]
fn reject_invalid_buffers_before_normalizing() {
    let data = [0u8; 8];
    let invalid = [
        (spec(ElementKind::U8, 0, 1, 1, 1), ErrorKind::InvalidDimensions),
        (spec(ElementKind::U8, 1, 0, 1, 1), ErrorKind::InvalidDimensions),
        (spec(ElementKind::U8, 1, 1, 5, 1), ErrorKind::InvalidChannelCount),
        (spec(ElementKind::U8, 4, 1, 1, 3), ErrorKind::InvalidStride),
        (spec(ElementKind::F64, 2, 1, 1, 2), ErrorKind::BufferTooShort),
    ];

    for (spec, kind) in invalid {
        let err = PixelBuffer::new(spec, &data).unwrap_err();
        assert_eq!(err.kind(), kind, "for {:?}", spec);
    }
}

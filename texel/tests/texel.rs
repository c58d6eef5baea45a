use imwatch_texel::{
    ElementKind, GenericSampleAction, Sample, SampleView, StrideSpec, StridedSamples,
};

/// Sums the valid samples of a byte buffer, whatever its kind.
struct Sum<'data> {
    layout: StridedSamples,
    data: &'data [u8],
}

impl GenericSampleAction<f64> for Sum<'_> {
    fn run<T: Sample>(self) -> f64 {
        let view = SampleView::<T>::new(self.layout, self.data).expect("Long enough");
        view.samples().map(|s| f64::from(s.to_display())).sum()
    }
}

fn bytes_of<T: Sample>(samples: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(samples).to_vec()
}

#[test]
fn dispatch_selects_sample_type() {
    // One row of two pixels, stride of three: the last slot is padding.
    let buffers = [
        (ElementKind::U8, bytes_of(&[1u8, 2, 100])),
        (ElementKind::U16, bytes_of(&[1u16, 2, 1000])),
        (ElementKind::I16, bytes_of(&[1i16, 2, -1000])),
        (ElementKind::I32, bytes_of(&[1i32, 2, 1 << 20])),
        (ElementKind::F32, bytes_of(&[1.0f32, 2.0, 1e9])),
        (ElementKind::F64, bytes_of(&[1.0f64, 2.0, 1e9])),
    ];

    for (kind, data) in buffers {
        let layout = StridedSamples::new(StrideSpec {
            kind,
            width: 2,
            height: 1,
            channels: 1,
            row_stride: 3,
        })
        .expect("Valid layout");

        assert_eq!(data.len(), 3 * kind.size());
        let sum = kind.action(Sum {
            layout,
            data: &data,
        });
        assert_eq!(sum, 3.0, "for {}", kind);
    }
}

#[test]
fn last_row_needs_no_padding() {
    let samples: [u8; 6] = [1, 2, 0xff, 3, 4, 0xff];
    let layout = StridedSamples::new(StrideSpec {
        kind: ElementKind::U8,
        width: 2,
        height: 2,
        channels: 1,
        row_stride: 3,
    })
    .expect("Valid layout");

    assert_eq!(layout.byte_len(), 5);
    let view = SampleView::<u8>::new(layout, &samples[..5]).expect("Long enough");
    let rows: Vec<Vec<u8>> = view.rows().map(|row| row.samples().collect()).collect();
    assert_eq!(rows, [[1, 2], [3, 4]]);
}

#[test]
fn pixels_split_channels() {
    let samples: [u16; 8] = [10, 11, 12, 13, 20, 21, 22, 23];
    let layout = StridedSamples::packed(ElementKind::U16, 2, 1, 4).expect("Valid layout");
    let view = SampleView::<u16>::new(layout, bytemuck::cast_slice(&samples)).expect("Exact");

    let row = view.row(0);
    let pixels: Vec<Vec<u16>> = row.pixels().map(|px| px.iter().collect()).collect();
    assert_eq!(pixels, [[10, 11, 12, 13], [20, 21, 22, 23]]);
    assert!(row.pixels().all(|px| px.channels() == 4));
}

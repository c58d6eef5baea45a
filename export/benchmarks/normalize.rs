use brunch::Bench;

use imwatch_export::{
    normalize_into, ContrastParameters, ElementKind, ExportError, PixelBuffer, PixelLayout,
    StrideSpec,
};

#[derive(Debug)]
struct Normalize {
    kind: ElementKind,
    channels: usize,
    layout: PixelLayout,
    padding: usize,
    sz: usize,
}

impl Normalize {
    fn name(&self) -> String {
        format!(
            "normalize({}x{}, {}, pad {}, {})",
            self.kind, self.channels, self.layout, self.padding, self.sz
        )
    }

    fn prepare(&self) -> Result<impl FnMut() -> Result<(), ExportError>, ExportError> {
        let spec = StrideSpec {
            kind: self.kind,
            width: self.sz,
            height: self.sz,
            channels: self.channels,
            row_stride: self.sz + self.padding,
        };

        let len = spec.row_stride * spec.height * spec.channels * spec.kind.size();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();

        // Floats made of arbitrary bytes contain NaN and infinities, which is fine here.
        let contrast = ContrastParameters::auto_range(&PixelBuffer::new(spec, &data)?)?;
        let layout = self.layout;
        let mut plane = Vec::new();

        Ok(move || {
            let buffer = PixelBuffer::new(spec, &data)?;
            normalize_into(&buffer, &contrast, layout, &mut plane)
        })
    }
}

fn main() {
    let tests = [
        Normalize {
            kind: ElementKind::U8,
            channels: 1,
            layout: PixelLayout::RGBA,
            padding: 0,
            sz: 512,
        },
        Normalize {
            kind: ElementKind::U8,
            channels: 3,
            layout: PixelLayout::RGBA,
            padding: 0,
            sz: 512,
        },
        Normalize {
            kind: ElementKind::U8,
            channels: 4,
            layout: PixelLayout::BGRA,
            padding: 0,
            sz: 512,
        },
        Normalize {
            kind: ElementKind::U16,
            channels: 1,
            layout: PixelLayout::RGBA,
            padding: 13,
            sz: 512,
        },
        Normalize {
            kind: ElementKind::I32,
            channels: 2,
            layout: PixelLayout::RGBA,
            padding: 0,
            sz: 512,
        },
        Normalize {
            kind: ElementKind::F32,
            channels: 3,
            layout: PixelLayout::BGRA,
            padding: 13,
            sz: 512,
        },
        Normalize {
            kind: ElementKind::F64,
            channels: 1,
            layout: PixelLayout::RGBA,
            padding: 0,
            sz: 512,
        },
    ];

    let mut benches = brunch::Benches::default();
    benches.extend(tests.map(|normalize| {
        let bench = match normalize.prepare() {
            Ok(bench) => bench,
            Err(err) => panic!("Failed to setup benchmark {:?}: {:?}", normalize, err),
        };

        Bench::new(format!("imwatch::normalize::main::{}", normalize.name())).run(bench)
    }));
    benches.finish();
}

//! Writes a padded float gradient both as bitmap and as raw matrix.
//!
//! Usage: `cargo run --example export-gradient [output-dir]`, with `RUST_LOG=debug` for details.
use std::path::PathBuf;

use imwatch_export::{
    ContrastParameters, ExportError, ExportOptions, Exporter, OutputRequest, PixelBuffer,
    PixelLayout,
};

const WIDTH: usize = 256;
const HEIGHT: usize = 128;
const STRIDE: usize = 260;

fn main() -> Result<(), ExportError> {
    env_logger::init();

    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let mut samples = vec![f32::NAN; STRIDE * HEIGHT * 3];
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let at = (y * STRIDE + x) * 3;
            samples[at] = x as f32 * 4.0;
            samples[at + 1] = y as f32 * 8.0;
            samples[at + 2] = 1024.0 - x as f32 * 2.0;
        }
    }

    let buffer = PixelBuffer::with_samples(&samples, WIDTH, HEIGHT, 3, STRIDE)?;
    let contrast = ContrastParameters::auto_range(&buffer)?;
    let mut exporter = Exporter::with_options(ExportOptions::default().with_parent_dirs(true));

    for name in ["gradient.png", "gradient.oct"] {
        let path = dir.join(name);
        if let Some(request) = OutputRequest::from_path(&path) {
            exporter.export(&buffer, &contrast, PixelLayout::RGBA, &request)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

//! Picking an output format and writing a buffer to disk.
use std::path::{Path, PathBuf};

use crate::bitmap;
use crate::buffer::PixelBuffer;
use crate::contrast::ContrastParameters;
use crate::destination::Destination;
use crate::error::{ErrorKind, ExportError};
use crate::layout::PixelLayout;
use crate::matrix;
use crate::shader;

/// The file format of an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// An RGBA image with eight bits per channel, as displayed by the viewer.
    Bitmap,
    /// The raw samples, bit for bit, in the format of [`crate::RawMatrix`].
    RawMatrix,
}

/// Where to export, and in which format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRequest {
    path: PathBuf,
    kind: OutputKind,
}

/// The zlib effort spent on bitmaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    Fast,
    #[default]
    Default,
    Best,
}

/// The scanline filter strategy of bitmaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Choose a filter per row, which usually compresses best.
    #[default]
    Adaptive,
    /// Store rows unfiltered, which is the fastest.
    NoFilter,
}

/// Settings shared by all exports of an [`Exporter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportOptions {
    compression: Compression,
    filter: Filter,
    create_parent_dirs: bool,
}

/// How many times the current need a retained bitmap allocation may be.
const PLANE_SLACK: usize = 4;

/// Writes buffers to files.
///
/// An exporter holds on to the memory of its last normalized bitmap, so exporting several
/// buffers of similar size through the same exporter avoids repeated allocation. The memory is
/// released again when a bitmap needs less than a quarter of it.
#[derive(Debug, Default)]
pub struct Exporter {
    options: ExportOptions,
    plane: Vec<[u8; 4]>,
}

impl OutputKind {
    /// Guess the format from the file extension: `.png` or `.oct`, in any case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("png") {
            Some(OutputKind::Bitmap)
        } else if extension.eq_ignore_ascii_case("oct") {
            Some(OutputKind::RawMatrix)
        } else {
            None
        }
    }

    /// The customary file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Bitmap => "png",
            OutputKind::RawMatrix => "oct",
        }
    }
}

impl OutputRequest {
    pub fn new(path: impl Into<PathBuf>, kind: OutputKind) -> Self {
        OutputRequest {
            path: path.into(),
            kind,
        }
    }

    /// A request whose format is chosen by the extension of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = OutputKind::from_path(&path)?;
        Some(OutputRequest { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }
}

impl ExportOptions {
    pub fn with_compression(self, compression: Compression) -> Self {
        ExportOptions {
            compression,
            ..self
        }
    }

    pub fn with_filter(self, filter: Filter) -> Self {
        ExportOptions { filter, ..self }
    }

    /// Create missing directories leading up to the destination, instead of failing.
    pub fn with_parent_dirs(self, create_parent_dirs: bool) -> Self {
        ExportOptions {
            create_parent_dirs,
            ..self
        }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn creates_parent_dirs(&self) -> bool {
        self.create_parent_dirs
    }
}

impl Exporter {
    pub fn new() -> Self {
        Exporter::default()
    }

    pub fn with_options(options: ExportOptions) -> Self {
        Exporter {
            options,
            plane: Vec::new(),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export a buffer in the requested format.
    ///
    /// Contrast and layout only affect bitmaps, raw matrices always store the unmodified
    /// samples. On error, no file is left at the destination.
    pub fn export(
        &mut self,
        buffer: &PixelBuffer<'_>,
        contrast: &ContrastParameters,
        layout: PixelLayout,
        request: &OutputRequest,
    ) -> Result<(), ExportError> {
        log::debug!(
            "exporting {} {}x{} as {:?} to {}",
            buffer.type_label(),
            buffer.width(),
            buffer.height(),
            request.kind(),
            request.path().display(),
        );

        match request.kind() {
            OutputKind::Bitmap => self.export_bitmap(buffer, contrast, layout, request.path())?,
            OutputKind::RawMatrix => self.export_raw(buffer, request.path())?,
        }

        log::debug!("exported {}", request.path().display());
        Ok(())
    }

    /// Write the raw samples of `buffer` to `path`.
    pub fn export_raw(&self, buffer: &PixelBuffer<'_>, path: &Path) -> Result<(), ExportError> {
        let mut destination = Destination::create(path, self.options.create_parent_dirs)?;
        matrix::write_raw_matrix(buffer, destination.writer())
            .map_err(|err| ExportError::io(ErrorKind::DestinationUnwritable, err))?;
        destination.commit()
    }

    fn export_bitmap(
        &mut self,
        buffer: &PixelBuffer<'_>,
        contrast: &ContrastParameters,
        layout: PixelLayout,
        path: &Path,
    ) -> Result<(), ExportError> {
        let mut destination = Destination::create(path, self.options.create_parent_dirs)?;

        let pixels = buffer.width() * buffer.height();
        if self.plane.capacity() / PLANE_SLACK > pixels {
            self.plane.clear();
            self.plane.shrink_to(pixels);
        }

        shader::normalize_into(buffer, contrast, layout, &mut self.plane)?;
        bitmap::write_png(
            &self.plane,
            buffer.width(),
            buffer.height(),
            &self.options,
            destination.writer(),
        )?;
        destination.commit()
    }
}

/// Export a buffer with default options.
///
/// See [`Exporter::export`].
pub fn export_buffer(
    buffer: &PixelBuffer<'_>,
    contrast: &ContrastParameters,
    layout: PixelLayout,
    request: &OutputRequest,
) -> Result<(), ExportError> {
    Exporter::new().export(buffer, contrast, layout, request)
}

/// Write the raw samples of a buffer with default options.
pub fn export_raw(buffer: &PixelBuffer<'_>, path: impl AsRef<Path>) -> Result<(), ExportError> {
    Exporter::new().export_raw(buffer, path.as_ref())
}

#[test]
fn output_kind_from_extension() {
    let kind = |path: &str| OutputKind::from_path(Path::new(path));
    assert_eq!(kind("frame.png"), Some(OutputKind::Bitmap));
    assert_eq!(kind("/tmp/FRAME.PNG"), Some(OutputKind::Bitmap));
    assert_eq!(kind("depth.oct"), Some(OutputKind::RawMatrix));
    assert_eq!(kind("depth.Oct"), Some(OutputKind::RawMatrix));
    assert_eq!(kind("depth.bmp"), None);
    assert_eq!(kind("png"), None);
    assert_eq!(kind("archive.oct.gz"), None);

    for kind in [OutputKind::Bitmap, OutputKind::RawMatrix] {
        let path = format!("out.{}", kind.extension());
        assert_eq!(OutputRequest::from_path(path).map(|r| r.kind()), Some(kind));
    }
}

#[test]
fn options_builder() {
    let options = ExportOptions::default();
    assert_eq!(options.compression(), Compression::Default);
    assert_eq!(options.filter(), Filter::Adaptive);
    assert!(!options.creates_parent_dirs());

    let options = options
        .with_compression(Compression::Best)
        .with_filter(Filter::NoFilter)
        .with_parent_dirs(true);
    assert_eq!(options.compression(), Compression::Best);
    assert_eq!(options.filter(), Filter::NoFilter);
    assert!(options.creates_parent_dirs());
    assert_eq!(Exporter::with_options(options).options(), &options);
}

#[cfg(test)]
fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("imwatch-exporter-{}-{}", std::process::id(), name))
}

#[test]
fn destination_checked_before_normalizing() {
    let samples = [0u8; 16];
    let buffer = PixelBuffer::with_samples(&samples, 4, 4, 1, 4).unwrap();
    let contrast = ContrastParameters::identity(buffer.kind());
    let missing = scratch_path("missing").join("out.png");
    let request = OutputRequest::new(&missing, OutputKind::Bitmap);

    let mut exporter = Exporter::new();
    let err = exporter
        .export(&buffer, &contrast, PixelLayout::RGBA, &request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationUnwritable);
    assert_eq!(exporter.plane.capacity(), 0, "Nothing was normalized");
}

#[test]
fn plane_memory_is_released() {
    let path = scratch_path("release.png");
    let request = OutputRequest::new(&path, OutputKind::Bitmap);
    let mut exporter = Exporter::new();

    let large = vec![0u8; 64 * 64];
    let buffer = PixelBuffer::with_samples(&large, 64, 64, 1, 64).unwrap();
    let contrast = ContrastParameters::identity(buffer.kind());
    exporter
        .export(&buffer, &contrast, PixelLayout::RGBA, &request)
        .unwrap();
    assert!(exporter.plane.capacity() >= 64 * 64);

    // A similar size keeps the allocation.
    let similar = PixelBuffer::with_samples(&large, 60, 60, 1, 64).unwrap();
    exporter
        .export(&similar, &contrast, PixelLayout::RGBA, &request)
        .unwrap();
    assert!(exporter.plane.capacity() >= 64 * 64);

    let small = PixelBuffer::with_samples(&large[..4], 2, 2, 1, 2).unwrap();
    exporter
        .export(&small, &contrast, PixelLayout::RGBA, &request)
        .unwrap();
    assert!(exporter.plane.capacity() < 64 * 64 / PLANE_SLACK);

    std::fs::remove_file(&path).unwrap();
}

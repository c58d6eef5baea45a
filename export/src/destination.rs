//! Output files that only appear at their final path once completely written.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use crate::error::{ErrorKind, ExportError};

/// An output file under construction.
///
/// Content is written to a hidden sibling of the destination. Only [`Destination::commit`]
/// moves it into place, so a failed or abandoned export never leaves a file at the destination
/// path. Dropping the destination without committing removes the partial file.
pub(crate) struct Destination {
    writer: BufWriter<File>,
    partial: PartialFile,
    target: PathBuf,
}

/// Removes the partial file unless disarmed.
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl Destination {
    pub(crate) fn create(target: &Path, create_dirs: bool) -> Result<Self, ExportError> {
        let name = target.file_name().ok_or_else(|| {
            ExportError::new(
                ErrorKind::DestinationUnwritable,
                "destination does not name a file",
            )
        })?;

        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        if create_dirs {
            fs::create_dir_all(parent)
                .map_err(|err| ExportError::io(ErrorKind::DestinationUnwritable, err))?;
        }

        let mut partial_name = std::ffi::OsString::from(".");
        partial_name.push(name);
        partial_name.push(format!(".{}.partial", process::id()));
        let partial_path = parent.join(partial_name);

        let file = File::create(&partial_path)
            .map_err(|err| ExportError::io(ErrorKind::DestinationUnwritable, err))?;

        Ok(Destination {
            writer: BufWriter::new(file),
            partial: PartialFile {
                path: partial_path,
                armed: true,
            },
            target: target.to_path_buf(),
        })
    }

    pub(crate) fn writer(&mut self) -> &mut BufWriter<File> {
        &mut self.writer
    }

    /// Flush all content to disk and move the file to its destination.
    pub(crate) fn commit(self) -> Result<(), ExportError> {
        let Destination {
            mut writer,
            mut partial,
            target,
        } = self;

        let unwritable = |err| ExportError::io(ErrorKind::DestinationUnwritable, err);

        writer.flush().map_err(unwritable)?;
        let file = writer
            .into_inner()
            .map_err(|err| unwritable(err.into_error()))?;
        file.sync_all().map_err(unwritable)?;
        drop(file);

        fs::rename(&partial.path, &target).map_err(unwritable)?;
        partial.armed = false;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let Err(err) = fs::remove_file(&self.path) {
            log::warn!(
                "could not remove partial export {}: {}",
                self.path.display(),
                err
            );
        }
    }
}

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::write::{ExtendedFileOptions, FileOptions};
use zip::{CompressionMethod, ZipWriter};

use crate::jar::error::{JarError, JarResult};
use crate::jar::format::{DIR_MODE, EXTENDED_TIMESTAMP_ID, FILE_MODE, JAR_MAGIC_ID};
use crate::jar::timestamp::ReferenceTime;

/// Output archive under construction.
///
/// Entries are appended in call order. Until [`DestinationArchive::finish`]
/// succeeds, dropping the value closes the writer and then deletes the file,
/// so a failed run never leaves a partial archive behind.
pub struct DestinationArchive {
    path: PathBuf,
    zip: Option<ZipWriter<BufWriter<File>>>,
    written: usize,
}

impl DestinationArchive {
    /// Creates parent directories as needed and truncates any existing file.
    pub fn create(path: &Path) -> JarResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip: Some(ZipWriter::new(BufWriter::new(file))),
            written: 0,
        })
    }

    /// Number of entries started so far.
    pub(crate) fn len(&self) -> usize {
        self.written
    }

    pub fn add_directory(&mut self, name: &str, at: &ReferenceTime) -> JarResult<()> {
        let options = self.options(CompressionMethod::Stored, DIR_MODE, 0, at)?;
        self.writer()?.add_directory(name, options)?;
        self.written += 1;
        Ok(())
    }

    /// Starts a regular entry; its content follows through [`Write`].
    ///
    /// Stored entries stay stored, everything else is deflated. `size` is
    /// the uncompressed length; past 4 GiB the entry is written as Zip64.
    pub fn start_file(
        &mut self,
        name: &str,
        source_method: CompressionMethod,
        size: u64,
        at: &ReferenceTime,
    ) -> JarResult<()> {
        let method = match source_method {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let options = self.options(method, FILE_MODE, size, at)?;
        self.writer()?.start_file(name, options)?;
        self.written += 1;
        Ok(())
    }

    /// Writes a whole regular entry in one go.
    pub fn write_file(
        &mut self,
        name: &str,
        source_method: CompressionMethod,
        at: &ReferenceTime,
        content: &[u8],
    ) -> JarResult<()> {
        self.start_file(name, source_method, content.len() as u64, at)?;
        self.writer()?.write_all(content)?;
        Ok(())
    }

    /// Writes the central directory and flushes the file. The output is
    /// kept only if all of that succeeds; otherwise it is removed.
    pub fn finish(mut self) -> JarResult<PathBuf> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| JarError::Invalid("destination already closed".into()))?;
        // Consumes the writer: the file is closed before any removal.
        let finalized = (move || -> JarResult<()> {
            let mut out = zip.finish()?;
            out.flush()?;
            out.get_ref().sync_all()?;
            Ok(())
        })();
        match finalized {
            Ok(()) => Ok(std::mem::take(&mut self.path)),
            Err(e) => {
                remove_partial(&self.path);
                Err(e)
            }
        }
    }

    fn writer(&mut self) -> JarResult<&mut ZipWriter<BufWriter<File>>> {
        self.zip
            .as_mut()
            .ok_or_else(|| JarError::Invalid("destination already closed".into()))
    }

    fn options(
        &self,
        method: CompressionMethod,
        mode: u32,
        size: u64,
        at: &ReferenceTime,
    ) -> JarResult<FileOptions<'static, ExtendedFileOptions>> {
        let mut options = FileOptions::<'static, ExtendedFileOptions>::default()
            .compression_method(method)
            .last_modified_time(at.dos_time()?)
            .unix_permissions(mode)
            .large_file(needs_zip64(size));
        if self.written == 0 {
            options.add_extra_data(JAR_MAGIC_ID, Vec::new().into_boxed_slice(), false)?;
        }
        if let Some(field) = at.extended_field() {
            options.add_extra_data(EXTENDED_TIMESTAMP_ID, field, false)?;
        }
        Ok(options)
    }
}

impl Write for DestinationArchive {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.zip.as_mut() {
            Some(zip) => zip.write(buf),
            None => Err(std::io::Error::other("destination already closed")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.zip.as_mut() {
            Some(zip) => zip.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for DestinationArchive {
    fn drop(&mut self) {
        if let Some(zip) = self.zip.take() {
            // Close first, then delete.
            drop(zip);
            remove_partial(&self.path);
        }
    }
}

/// Entries whose uncompressed size does not fit the 32-bit fields.
fn needs_zip64(size: u64) -> bool {
    size >= u64::from(u32::MAX)
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::warn!(path = %path.display(), "removed partial output"),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "could not remove partial output"
        ),
    }
}

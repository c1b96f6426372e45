#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use zip::{CompressionMethod, ZipArchive};

use crate::jar::error::JarResult;

/// A source archive opened for random access. Closed on drop.
pub struct SourceArchive {
    zip: ZipArchive<BufReader<File>>,
}

impl SourceArchive {
    pub fn open(path: &Path) -> JarResult<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;
        Ok(Self { zip })
    }

    pub(crate) fn len(&self) -> usize {
        self.zip.len()
    }

    /// Storage-order view of the entry at `index`.
    pub fn by_index(&mut self, index: usize) -> JarResult<SourceEntry<'_>> {
        let file = self.zip.by_index(index)?;
        Ok(SourceEntry::new(
            file.name().to_string(),
            file.is_dir(),
            file.compression(),
            file.size(),
            Box::new(file),
        ))
    }

    /// Fresh lookup by exact name.
    pub fn by_name(&mut self, name: &str) -> JarResult<SourceEntry<'_>> {
        let file = self.zip.by_name(name)?;
        Ok(SourceEntry::new(
            file.name().to_string(),
            file.is_dir(),
            file.compression(),
            file.size(),
            Box::new(file),
        ))
    }
}

/// An entry of the source archive: metadata plus its decompressed content.
pub struct SourceEntry<'a> {
    name: String,
    is_dir: bool,
    compression: CompressionMethod,
    size: u64,
    content: Box<dyn Read + 'a>,
}

impl<'a> SourceEntry<'a> {
    pub(crate) fn new(
        name: String,
        is_dir: bool,
        compression: CompressionMethod,
        size: u64,
        content: Box<dyn Read + 'a>,
    ) -> Self {
        Self {
            name,
            is_dir,
            compression,
            size,
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    /// Uncompressed size as recorded in the archive.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn read_all(&mut self) -> JarResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.content.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Reads the whole content now (checksum included) and returns the same
    /// entry backed by memory.
    pub(crate) fn buffered(&mut self) -> JarResult<SourceEntry<'static>> {
        let content = self.read_all()?;
        Ok(SourceEntry::new(
            self.name.clone(),
            self.is_dir,
            self.compression,
            content.len() as u64,
            Box::new(Cursor::new(content)),
        ))
    }
}

impl Read for SourceEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.content.read(buf)
    }
}

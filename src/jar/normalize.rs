#![forbid(unsafe_code)]

use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::jar::error::{JarError, NormalizeError};
use crate::jar::format::{classify, is_pom_properties, EntryClass};
use crate::jar::manifest::{ManifestStripper, ManifestTransformer};
use crate::jar::plan::EmissionPlan;
use crate::jar::properties::{PomPropertiesStripper, PropertiesTransformer};
use crate::jar::read::{SourceArchive, SourceEntry};
use crate::jar::timestamp::ReferenceTime;
use crate::jar::write::DestinationArchive;

const COPY_BUF: usize = 64 * 1024;

/// Rewrites an archive into its reproducible form.
///
/// Output layout:
/// - `META-INF/` marker (if present)
/// - `META-INF/MANIFEST.MF` (if present), rewritten
/// - every other directory marker, sorted by name bytes
/// - every other entry, sorted by name bytes; `*/pom.properties` rewritten
///
/// Every entry carries the reference time and nothing else from the
/// source's per-entry metadata.
pub struct Normalizer {
    manifest: Box<dyn ManifestTransformer>,
    properties: Box<dyn PropertiesTransformer>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ManifestStripper::default(), PomPropertiesStripper)
    }
}

impl Normalizer {
    pub fn new(
        manifest: impl ManifestTransformer + 'static,
        properties: impl PropertiesTransformer + 'static,
    ) -> Self {
        Self {
            manifest: Box::new(manifest),
            properties: Box::new(properties),
        }
    }

    /// Returns the number of entries written. On error nothing is left at
    /// `destination`.
    pub fn normalize(
        &self,
        source: &Path,
        at: &ReferenceTime,
        destination: &Path,
    ) -> Result<usize, NormalizeError> {
        info!(
            source = %source.display(),
            destination = %destination.display(),
            timestamp = %at,
            "normalizing archive"
        );

        let reading = |e: JarError| NormalizeError::reading(source, e);
        let writing = |e: JarError| NormalizeError::writing(destination, e);

        let mut src = SourceArchive::open(source).map_err(reading)?;
        if is_same_file(source, destination) {
            return Err(writing(JarError::Invalid(
                "destination is the source archive".into(),
            )));
        }
        // From here on, an early return drops `out`, which removes the file.
        let mut out = DestinationArchive::create(destination).map_err(writing)?;

        let mut plan = EmissionPlan::default();
        let mut manifest_root_written = false;
        let mut held_manifests: Vec<String> = Vec::new();

        // Pass 1: the manifest root and manifest go out now, the rest is
        // bucketed by name.
        for index in 0..src.len() {
            let mut entry = src.by_index(index).map_err(reading)?;
            let name = entry.name().to_string();
            plan.observe(&name).map_err(reading)?;

            match classify(&name, entry.is_dir()) {
                EntryClass::ManifestDir => {
                    out.add_directory(&name, at).map_err(writing)?;
                    manifest_root_written = true;
                    debug!(entry = %name, "wrote manifest root");
                }
                EntryClass::Manifest if manifest_root_written => {
                    let mut entry = entry.buffered().map_err(reading)?;
                    self.write_manifest(&mut out, &mut entry, at)?;
                }
                // Stored ahead of its directory: wait until pass 1 is done
                // so the marker still comes first.
                EntryClass::Manifest => held_manifests.push(name),
                EntryClass::Directory => plan.push_directory(name),
                EntryClass::File => plan.push_file(name),
            }
        }

        held_manifests.sort_unstable();
        for name in &held_manifests {
            let mut entry = src
                .by_name(name)
                .and_then(|mut e| e.buffered())
                .map_err(reading)?;
            self.write_manifest(&mut out, &mut entry, at)?;
        }

        // Pass 2: sorted buckets, each entry looked up again by name.
        for name in plan.into_order() {
            let mut entry = src.by_name(&name).map_err(reading)?;

            if is_pom_properties(&name) {
                // Source failures surface as such, not as rewrite failures.
                let mut entry = entry.buffered().map_err(reading)?;
                self.properties
                    .normalize_properties_entry(&mut out, &mut entry, at)
                    .map_err(|e| NormalizeError::rewriting(&name, e))?;
                debug!(entry = %name, "rewrote properties");
            } else if entry.is_dir() {
                out.add_directory(&name, at).map_err(writing)?;
                debug!(entry = %name, "wrote directory");
            } else {
                out.start_file(&name, entry.compression(), entry.size(), at)
                    .map_err(writing)?;
                let copied = copy_content(&mut entry, &mut out, source, destination)?;
                debug!(entry = %name, bytes = copied, "copied entry");
            }
        }

        let written = out.len();
        out.finish().map_err(writing)?;
        info!(entries = written, destination = %destination.display(), "archive normalized");
        Ok(written)
    }

    fn write_manifest(
        &self,
        out: &mut DestinationArchive,
        entry: &mut SourceEntry<'_>,
        at: &ReferenceTime,
    ) -> Result<(), NormalizeError> {
        self.manifest
            .normalize_manifest_entry(out, entry, at)
            .map_err(|e| NormalizeError::rewriting(entry.name(), e))?;
        debug!(entry = %entry.name(), "rewrote manifest");
        Ok(())
    }
}

/// Normalizes `source` into `destination` with the stock transformers.
pub fn normalize(
    source: &Path,
    at: &ReferenceTime,
    destination: &Path,
) -> Result<usize, NormalizeError> {
    Normalizer::default().normalize(source, at, destination)
}

/// Streams the decompressed content through unchanged, keeping read and
/// write failures apart.
fn copy_content(
    entry: &mut SourceEntry<'_>,
    out: &mut DestinationArchive,
    source: &Path,
    destination: &Path,
) -> Result<u64, NormalizeError> {
    let mut buf = vec![0u8; COPY_BUF];
    let mut total = 0u64;
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(NormalizeError::reading(source, e)),
        };
        out.write_all(&buf[..n])
            .map_err(|e| NormalizeError::writing(destination, e))?;
        total += n as u64;
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#![forbid(unsafe_code)]

use crate::jar::error::JarResult;
use crate::jar::read::SourceEntry;
use crate::jar::timestamp::ReferenceTime;
use crate::jar::write::DestinationArchive;

/// Rewrites a build-coordinate properties entry (`.../pom.properties`).
///
/// Same contract as the manifest transformer: exactly one entry, same name,
/// stamped with `at`.
pub trait PropertiesTransformer {
    fn normalize_properties_entry(
        &self,
        out: &mut DestinationArchive,
        entry: &mut SourceEntry<'_>,
        at: &ReferenceTime,
    ) -> JarResult<()>;
}

/// Drops comments (Maven records the generation date in one) and blank
/// lines, then sorts the remaining properties.
///
/// Works on bytes: these files are ISO-8859-1, not UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct PomPropertiesStripper;

impl PomPropertiesStripper {
    pub fn rewrite(&self, raw: &[u8]) -> Vec<u8> {
        let mut props: Vec<Vec<u8>> = logical_lines(raw)
            .into_iter()
            .filter(|line| !is_blank_or_comment(line))
            .collect();
        props.sort_unstable();

        let mut out = Vec::with_capacity(raw.len());
        for line in props {
            out.extend_from_slice(&line);
            out.push(b'\n');
        }
        out
    }
}

impl PropertiesTransformer for PomPropertiesStripper {
    fn normalize_properties_entry(
        &self,
        out: &mut DestinationArchive,
        entry: &mut SourceEntry<'_>,
        at: &ReferenceTime,
    ) -> JarResult<()> {
        let raw = entry.read_all()?;
        let rewritten = self.rewrite(&raw);
        out.write_file(entry.name(), entry.compression(), at, &rewritten)
    }
}

fn is_blank_or_comment(line: &[u8]) -> bool {
    match line
        .iter()
        .copied()
        .find(|&b| !matches!(b, b' ' | b'\t' | b'\x0c'))
    {
        None => true,
        Some(b'#') | Some(b'!') => true,
        Some(_) => false,
    }
}

/// A trailing backslash continues the line, unless it is itself escaped.
fn continues(line: &[u8]) -> bool {
    line.iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}

/// Physical lines (CRLF, LF or CR) joined into logical ones. Continuation
/// markers and line breaks are kept verbatim so the value is untouched.
fn logical_lines(raw: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    let mut rest = raw;
    while !rest.is_empty() {
        let (line, skip) = match rest.iter().position(|&b| b == b'\r' || b == b'\n') {
            Some(i) if rest[i..].starts_with(b"\r\n") => (&rest[..i], i + 2),
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };
        rest = &rest[skip..];

        let logical = match current.take() {
            Some(mut prev) => {
                prev.push(b'\n');
                prev.extend_from_slice(line);
                prev
            }
            None => {
                // A comment never continues.
                if is_blank_or_comment(line) {
                    out.push(line.to_vec());
                    continue;
                }
                line.to_vec()
            }
        };
        if continues(line) {
            current = Some(logical);
        } else {
            out.push(logical);
        }
    }
    if let Some(last) = current {
        out.push(last);
    }
    out
}

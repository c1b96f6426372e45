#![forbid(unsafe_code)]

use crate::jar::error::{JarError, JarResult};
use crate::jar::read::SourceEntry;
use crate::jar::timestamp::ReferenceTime;
use crate::jar::write::DestinationArchive;

/// Rewrites the manifest entry.
///
/// Implementations write exactly one entry to `out`, under the entry's own
/// name, stamped with `at`.
pub trait ManifestTransformer {
    fn normalize_manifest_entry(
        &self,
        out: &mut DestinationArchive,
        entry: &mut SourceEntry<'_>,
        at: &ReferenceTime,
    ) -> JarResult<()>;
}

/// Attributes that record who/when/what-JDK built the archive.
pub const DEFAULT_STRIPPED_ATTRIBUTES: &[&str] = &[
    "Built-By",
    "Created-By",
    "Build-Jdk",
    "Build-Jdk-Spec",
    "Build-Time",
    "Build-Date",
    "Build-Timestamp",
    "Bnd-LastModified",
];

const MANIFEST_VERSION: &str = "Manifest-Version";
const SECTION_NAME: &str = "Name";
const MAX_LINE_BYTES: usize = 72;

/// Default manifest rewrite: drops build-environment attributes, orders
/// named sections, and re-emits the text in canonical form.
#[derive(Debug, Clone)]
pub struct ManifestStripper {
    stripped: Vec<String>,
}

impl Default for ManifestStripper {
    fn default() -> Self {
        Self {
            stripped: DEFAULT_STRIPPED_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ManifestStripper {
    /// Strips `extra` on top of the defaults.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut me = Self::default();
        for name in extra {
            let name = name.into();
            if !me.is_stripped(&name) {
                me.stripped.push(name);
            }
        }
        me
    }

    fn is_stripped(&self, attribute: &str) -> bool {
        self.stripped
            .iter()
            .any(|s| s.eq_ignore_ascii_case(attribute))
    }

    pub fn rewrite(&self, raw: &[u8]) -> JarResult<Vec<u8>> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| JarError::Manifest(format!("not UTF-8: {e}")))?;
        let mut sections = parse_sections(text)?;

        for section in &mut sections {
            section.retain(|(k, _)| !self.is_stripped(k));
        }

        let mut iter = sections.into_iter();
        let mut main = iter.next().unwrap_or_default();
        if let Some(pos) = main
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(MANIFEST_VERSION))
        {
            let version = main.remove(pos);
            main.insert(0, version);
        }

        let mut named: Vec<Section> = iter.filter(|s| !s.is_empty()).collect();
        named.sort_by(|a, b| section_name(a).cmp(section_name(b)));

        let mut out = String::with_capacity(raw.len());
        write_section(&mut out, &main);
        for section in &named {
            write_section(&mut out, section);
        }
        Ok(out.into_bytes())
    }
}

impl ManifestTransformer for ManifestStripper {
    fn normalize_manifest_entry(
        &self,
        out: &mut DestinationArchive,
        entry: &mut SourceEntry<'_>,
        at: &ReferenceTime,
    ) -> JarResult<()> {
        let raw = entry.read_all()?;
        let rewritten = self.rewrite(&raw)?;
        out.write_file(entry.name(), entry.compression(), at, &rewritten)
    }
}

type Section = Vec<(String, String)>;

fn section_name(section: &Section) -> &str {
    section
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(SECTION_NAME))
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

fn physical_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(i) => {
                lines.push(&rest[..i]);
                let skip = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + skip..];
            }
            None => {
                lines.push(rest);
                rest = "";
            }
        }
    }
    lines
}

fn parse_sections(text: &str) -> JarResult<Vec<Section>> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut blank = false;

    for line in physical_lines(text) {
        if line.is_empty() {
            blank = true;
            continue;
        }
        if let Some(cont) = line.strip_prefix(' ') {
            match current.last_mut() {
                Some(prev) if !blank => prev.push_str(cont),
                _ => {
                    return Err(JarError::Manifest(format!(
                        "continuation without a header: {line:?}"
                    )))
                }
            }
            continue;
        }
        if blank && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        blank = false;
        current.push(line.to_string());
    }
    groups.push(current);

    groups
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|line| {
                    let (k, v) = line.split_once(": ").ok_or_else(|| {
                        JarError::Manifest(format!("header without ': ': {line:?}"))
                    })?;
                    if k.is_empty() {
                        return Err(JarError::Manifest(format!("empty header name: {line:?}")));
                    }
                    Ok((k.to_string(), v.to_string()))
                })
                .collect()
        })
        .collect()
}

fn write_section(out: &mut String, section: &Section) {
    for (k, v) in section {
        write_wrapped(out, &format!("{k}: {v}"));
    }
    out.push_str("\r\n");
}

/// Emits `line` as 72-byte physical lines, continuations prefixed by one
/// space, never splitting a UTF-8 sequence.
fn write_wrapped(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE_BYTES;
    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        limit = MAX_LINE_BYTES - 1;
    }
}

#![forbid(unsafe_code)]

/// Directory marker that holds the manifest.
pub const MANIFEST_DIR: &str = "META-INF/";

/// Well-known manifest entry name.
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

/// Suffix of the Maven build-coordinate properties entries.
pub const POM_PROPERTIES_SUFFIX: &str = "/pom.properties";

/// Extended timestamp extra field (Info-ZIP "UT").
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

/// Zero-length extra field the JDK `jar` tool puts on the first entry.
pub const JAR_MAGIC_ID: u16 = 0xCAFE;

pub const FILE_MODE: u32 = 0o644;
pub const DIR_MODE: u32 = 0o755;

/// Where an entry goes during the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryClass {
    ManifestDir,
    Manifest,
    Directory,
    File,
}

pub(crate) fn classify(name: &str, is_dir: bool) -> EntryClass {
    if is_dir && name.eq_ignore_ascii_case(MANIFEST_DIR) {
        EntryClass::ManifestDir
    } else if name.eq_ignore_ascii_case(MANIFEST_NAME) {
        EntryClass::Manifest
    } else if is_dir {
        EntryClass::Directory
    } else {
        EntryClass::File
    }
}

pub(crate) fn is_pom_properties(name: &str) -> bool {
    name.ends_with(POM_PROPERTIES_SUFFIX)
}

/// Public view of an archive entry (for listing and inspection).
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub compressed_size: u64,
    /// "stored" or "deflated" (anything else is reported by its debug name).
    pub compression: String,
    /// DOS date/time as stored, rendered `YYYY-MM-DD hh:mm:ss`.
    pub dos_time: Option<String>,
    /// Extended timestamp mtime (Unix seconds), when the entry carries one.
    pub unix_mtime: Option<u32>,
    /// Blake3 hash (hex) of the uncompressed content.
    pub content_hash_hex: String,
}

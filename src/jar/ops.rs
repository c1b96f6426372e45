#![forbid(unsafe_code)]

use blake3::Hasher;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use zip::extra_fields::ExtraField;
use zip::{CompressionMethod, ZipArchive};

use crate::jar::error::{JarError, JarResult};
use crate::jar::format::{classify, EntryClass, EntryInfo};
use crate::jar::timestamp::{render_dos, ReferenceTime};

/// Read every entry (storage order), hashing the uncompressed content.
pub fn entries(jar: &Path) -> JarResult<Vec<EntryInfo>> {
    let file = File::open(jar)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let mut out = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut f = zip.by_index(i)?;

        let unix_mtime = f.extra_data_fields().find_map(|field| match field {
            ExtraField::ExtendedTimestamp(ts) => ts.mod_time(),
            _ => None,
        });
        let compression = match f.compression() {
            CompressionMethod::Stored => "stored".to_string(),
            CompressionMethod::Deflated => "deflated".to_string(),
            other => format!("{other:?}"),
        };
        let name = f.name().to_string();
        let is_dir = f.is_dir();
        let size = f.size();
        let compressed_size = f.compressed_size();
        let dos_time = f.last_modified().map(|t| render_dos(&t));

        let mut hasher = Hasher::new();
        std::io::copy(&mut f, &mut hasher)?;

        out.push(EntryInfo {
            name,
            is_dir,
            size,
            compressed_size,
            compression,
            dos_time,
            unix_mtime,
            content_hash_hex: hasher.finalize().to_hex().to_string(),
        });
    }
    Ok(out)
}

pub fn list(jar: &Path, verbose: bool) -> JarResult<()> {
    for e in entries(jar)? {
        if verbose {
            println!(
                "{}  kind={} size={} packed={} method={} time={} mtime={} hash={}",
                e.name,
                if e.is_dir { "dir" } else { "file" },
                e.size,
                e.compressed_size,
                e.compression,
                e.dos_time.as_deref().unwrap_or("-"),
                e.unix_mtime
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".into()),
                e.content_hash_hex
            );
        } else {
            println!("{}", e.name);
        }
    }
    Ok(())
}

/// Checks that `jar` is laid out the way the normalizer writes archives and
/// that all entries share one timestamp (`expected`, when given).
/// Returns the entry count.
pub fn verify(jar: &Path, expected: Option<&ReferenceTime>) -> JarResult<usize> {
    let entries = entries(jar)?;
    check_layout(&entries)?;
    check_timestamps(&entries, expected)?;
    Ok(entries.len())
}

fn rank(class: EntryClass) -> u8 {
    match class {
        EntryClass::ManifestDir => 0,
        EntryClass::Manifest => 1,
        EntryClass::Directory => 2,
        EntryClass::File => 3,
    }
}

fn check_layout(entries: &[EntryInfo]) -> JarResult<()> {
    for w in entries.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let ra = rank(classify(&a.name, a.is_dir));
        let rb = rank(classify(&b.name, b.is_dir));
        if ra > rb {
            return Err(JarError::Invalid(format!(
                "{} is stored after {}",
                a.name, b.name
            )));
        }
        if ra == rb && ra >= 2 && a.name.as_bytes() > b.name.as_bytes() {
            return Err(JarError::Invalid(format!(
                "entries not sorted: {} before {}",
                a.name, b.name
            )));
        }
    }
    Ok(())
}

fn describe(dos: Option<&str>, mtime: Option<u32>) -> String {
    match mtime {
        Some(m) => format!("{} (unix {m})", dos.unwrap_or("-")),
        None => dos.unwrap_or("-").to_string(),
    }
}

fn check_timestamps(entries: &[EntryInfo], expected: Option<&ReferenceTime>) -> JarResult<()> {
    let want = match expected {
        Some(t) => (Some(render_dos(&t.dos_time()?)), t.extended_mtime()),
        None => match entries.first() {
            Some(e) => (e.dos_time.clone(), e.unix_mtime),
            None => return Ok(()),
        },
    };

    for e in entries {
        if e.dos_time != want.0 || e.unix_mtime != want.1 {
            return Err(JarError::Invalid(format!(
                "{}: timestamp {} differs from {}",
                e.name,
                describe(e.dos_time.as_deref(), e.unix_mtime),
                describe(want.0.as_deref(), want.1)
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, dos: &str, mtime: Option<u32>) -> EntryInfo {
        EntryInfo {
            name: name.to_string(),
            is_dir: name.ends_with('/'),
            size: 0,
            compressed_size: 0,
            compression: "stored".into(),
            dos_time: Some(dos.to_string()),
            unix_mtime: mtime,
            content_hash_hex: String::new(),
        }
    }

    const EPOCH_DOS: &str = "1980-01-01 00:00:00";

    #[test]
    fn accepts_normalized_layout() {
        let entries = vec![
            info("META-INF/", EPOCH_DOS, Some(0)),
            info("META-INF/MANIFEST.MF", EPOCH_DOS, Some(0)),
            info("META-INF/maven/", EPOCH_DOS, Some(0)),
            info("z/", EPOCH_DOS, Some(0)),
            info("META-INF/maven/g/a/pom.properties", EPOCH_DOS, Some(0)),
            info("a.txt", EPOCH_DOS, Some(0)),
        ];
        check_layout(&entries).unwrap();
        let t = ReferenceTime::from_unix_seconds(0).unwrap();
        check_timestamps(&entries, Some(&t)).unwrap();
        check_timestamps(&entries, None).unwrap();
    }

    #[test]
    fn rejects_file_before_directory() {
        let entries = vec![
            info("a.txt", EPOCH_DOS, None),
            info("b/", EPOCH_DOS, None),
        ];
        assert!(check_layout(&entries).is_err());
    }

    #[test]
    fn rejects_unsorted_bucket() {
        let entries = vec![
            info("b.txt", EPOCH_DOS, None),
            info("a.txt", EPOCH_DOS, None),
        ];
        assert!(check_layout(&entries).is_err());
    }

    #[test]
    fn rejects_mixed_timestamps() {
        let entries = vec![
            info("a.txt", EPOCH_DOS, Some(0)),
            info("b.txt", "2024-01-01 00:00:00", Some(1_704_067_200)),
        ];
        let err = check_timestamps(&entries, None).unwrap_err();
        assert!(err.to_string().contains("b.txt"));
    }

    #[test]
    fn rejects_other_reference_time() {
        let entries = vec![info("a.txt", EPOCH_DOS, Some(0))];
        let t = ReferenceTime::parse("2024-01-01").unwrap();
        assert!(check_timestamps(&entries, Some(&t)).is_err());
    }
}

//! Fixture jars for the integration tests.

#![allow(dead_code, clippy::clone_on_copy)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub enum Item<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Per-fixture metadata noise: time, permissions and compression.
#[derive(Clone, Copy)]
pub struct Noise {
    pub time: (u16, u8, u8, u8, u8, u8),
    pub mode: u32,
    pub method: CompressionMethod,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            time: (2023, 6, 15, 13, 37, 42),
            mode: 0o600,
            method: CompressionMethod::Deflated,
        }
    }
}

pub fn write_jar(path: &Path, items: &[Item<'_>], noise: Noise) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let (y, mo, d, h, mi, s) = noise.time;
    let options = SimpleFileOptions::default()
        .compression_method(noise.method)
        .last_modified_time(DateTime::from_date_and_time(y, mo, d, h, mi, s).unwrap())
        .unix_permissions(noise.mode);

    for item in items {
        match item {
            Item::Dir(name) => zip.add_directory(*name, options.clone()).unwrap(),
            Item::File(name, content) => {
                zip.start_file(*name, options.clone()).unwrap();
                zip.write_all(content).unwrap();
            }
        }
    }
    zip.finish().unwrap();
}

/// Names and contents, in storage order.
pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut out = Vec::new();
    for i in 0..zip.len() {
        let mut f = zip.by_index(i).unwrap();
        let mut buf = Vec::new();
        f.read_to_end(&mut buf).unwrap();
        out.push((f.name().to_string(), buf));
    }
    out
}

pub fn names(path: &Path) -> Vec<String> {
    read_jar(path).into_iter().map(|(n, _)| n).collect()
}

pub const MANIFEST: &[u8] = b"Manifest-Version: 1.0\r\nBuilt-By: ci\r\nBuild-Time: 2024-01-01\r\nMain-Class: a.Main\r\n\r\n";

pub const POM_PROPERTIES: &[u8] =
    b"#Generated by Maven\n#Mon Jan 01 10:00:00 CET 2024\nversion=1.0\ngroupId=g\nartifactId=a\n";

/// The layout used across tests, deliberately stored out of order.
pub fn sample_items() -> Vec<Item<'static>> {
    vec![
        Item::File("b.txt", b"bee"),
        Item::File("META-INF/maven/g/a/pom.properties", POM_PROPERTIES),
        Item::File("a.txt", b"ay"),
        Item::Dir("META-INF/maven/g/a/"),
        Item::File("META-INF/MANIFEST.MF", MANIFEST),
        Item::Dir("META-INF/"),
    ]
}

#![forbid(unsafe_code)]

//! Reproducible repacking of JAR archives: fixed entry order, one timestamp
//! for every entry, and build-environment noise stripped from the manifest
//! and `pom.properties`.

pub mod jar;

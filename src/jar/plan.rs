#![forbid(unsafe_code)]

use std::collections::HashSet;

use crate::jar::error::{JarError, JarResult};

/// Names collected during the first pass, emitted in the second.
///
/// Ordering rules:
/// - directories before files
/// - each bucket sorted by name bytes, never by storage order or time
#[derive(Debug, Default)]
pub(crate) struct EmissionPlan {
    directories: Vec<String>,
    files: Vec<String>,
    seen: HashSet<String>,
}

impl EmissionPlan {
    /// Records a name as present in the source. Every entry goes through
    /// here, including the ones pass one emits directly.
    pub fn observe(&mut self, name: &str) -> JarResult<()> {
        if !self.seen.insert(name.to_string()) {
            return Err(JarError::DuplicateEntry(name.to_string()));
        }
        Ok(())
    }

    pub fn push_directory(&mut self, name: String) {
        self.directories.push(name);
    }

    pub fn push_file(&mut self, name: String) {
        self.files.push(name);
    }

    pub fn into_order(mut self) -> Vec<String> {
        self.directories.sort_unstable();
        self.files.sort_unstable();
        let mut order = self.directories;
        order.extend(self.files);
        order
    }
}

#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JarError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid archive: {0}")]
    Invalid(String),

    #[error("malformed manifest: {0}")]
    Manifest(String),

    #[error("bad timestamp: {0}")]
    Timestamp(String),

    #[error("duplicate entry name: {0}")]
    DuplicateEntry(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

pub type JarResult<T> = Result<T, JarError>;

/// Failure of one normalization run. The partial output has already been
/// removed by the time a caller sees this.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("source archive {}: {cause}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        cause: Box<JarError>,
    },

    #[error("destination archive {}: {cause}", .path.display())]
    Destination {
        path: PathBuf,
        #[source]
        cause: Box<JarError>,
    },

    #[error("rewriting {entry}: {cause}")]
    Transform {
        entry: String,
        #[source]
        cause: Box<JarError>,
    },
}

impl NormalizeError {
    pub(crate) fn reading(path: &std::path::Path, cause: impl Into<JarError>) -> Self {
        NormalizeError::Source {
            path: path.to_path_buf(),
            cause: Box::new(cause.into()),
        }
    }

    pub(crate) fn writing(path: &std::path::Path, cause: impl Into<JarError>) -> Self {
        NormalizeError::Destination {
            path: path.to_path_buf(),
            cause: Box::new(cause.into()),
        }
    }

    pub(crate) fn rewriting(entry: &str, cause: impl Into<JarError>) -> Self {
        NormalizeError::Transform {
            entry: entry.to_string(),
            cause: Box::new(cause.into()),
        }
    }
}

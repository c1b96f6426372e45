#![forbid(unsafe_code)]

mod error;
mod format;
mod manifest;
mod normalize;
mod ops;
mod plan;
mod properties;
mod read;
mod timestamp;
mod write;

pub use error::{JarError, JarResult, NormalizeError};
pub use format::{EntryInfo, MANIFEST_DIR, MANIFEST_NAME, POM_PROPERTIES_SUFFIX};
pub use manifest::{ManifestStripper, ManifestTransformer, DEFAULT_STRIPPED_ATTRIBUTES};
pub use normalize::{normalize, Normalizer};
pub use ops::{entries, list, verify};
pub use properties::{PomPropertiesStripper, PropertiesTransformer};
pub use read::{SourceArchive, SourceEntry};
pub use timestamp::ReferenceTime;
pub use write::DestinationArchive;

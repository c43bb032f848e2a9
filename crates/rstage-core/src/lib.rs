mod manifest;
mod package;

pub use manifest::{AppManifest, DEFAULT_CRAN_MIRROR, MANIFEST_FILE_NAME};
pub use package::{
    NoSourceError, PackageRequest, RunOutcome, SourceResolution, TaskStatus, VendorEntry,
    NO_SOURCE_MESSAGE,
};

#[cfg(test)]
mod tests;

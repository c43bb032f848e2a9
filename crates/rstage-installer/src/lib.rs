use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

mod cleanup;
mod primitive;
mod report;
mod scheduler;
mod types;

pub use cleanup::cleanup_vendored;
pub use primitive::{classify_failure, PackageInstaller, RRunner};
pub use report::Reporter;
pub use scheduler::run_install;
pub use types::{
    FailureKind, FailurePolicy, InstallConfig, InstallFailure, InstallRun, InstallTask,
};

/// Filesystem layout of one application staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    app_dir: PathBuf,
}

impl StagingLayout {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.app_dir.join(rstage_core::MANIFEST_FILE_NAME)
    }

    pub fn vendor_dir(&self) -> PathBuf {
        self.app_dir.join("vendor_r")
    }

    /// Target library the packages are installed into; becomes part of the
    /// runtime image.
    pub fn r_library_dir(&self) -> PathBuf {
        self.app_dir.join("rlib")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.app_dir.clone(), self.r_library_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

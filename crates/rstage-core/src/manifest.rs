use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::package::PackageRequest;

pub const MANIFEST_FILE_NAME: &str = "r.toml";
pub const DEFAULT_CRAN_MIRROR: &str = "https://cran.r-project.org";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppManifest {
    pub cran_mirror: Option<String>,
    pub num_threads: Option<usize>,
    #[serde(default)]
    pub packages: Vec<PackageRequest>,
}

impl AppManifest {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse r.toml manifest")?;

        if manifest.packages.is_empty() {
            return Err(anyhow!("manifest declares no packages"));
        }
        if let Some(mirror) = &manifest.cran_mirror {
            if mirror.trim().is_empty() {
                return Err(anyhow!("cran_mirror must not be empty"));
            }
        }
        if manifest.num_threads == Some(0) {
            return Err(anyhow!("num_threads must be at least 1"));
        }

        let mut seen = HashSet::new();
        for package in &manifest.packages {
            package
                .validate()
                .with_context(|| format!("invalid package declaration '{}'", package.name))?;
            if !seen.insert(package.name.clone()) {
                return Err(anyhow!(
                    "package '{}' is declared more than once",
                    package.name
                ));
            }
        }

        Ok(manifest)
    }

    pub fn effective_mirror(&self) -> &str {
        self.cran_mirror.as_deref().unwrap_or(DEFAULT_CRAN_MIRROR)
    }
}

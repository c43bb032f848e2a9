use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Literal prefix acceptance probes grep for when resolution fails.
pub const NO_SOURCE_MESSAGE: &str = "No source found for installing packages";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRequest {
    pub name: String,
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PackageRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            dependencies: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_package_name(&self.name)?;
        if let Some(version) = &self.version {
            validate_package_version(&self.name, version)?;
        }
        for dependency in &self.dependencies {
            validate_package_name(dependency)?;
        }
        Ok(())
    }
}

pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("package name must not be empty"));
    }

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(anyhow!("package name must not be empty"));
    };
    if !first.is_ascii_alphabetic() {
        return Err(anyhow!(
            "package name must start with an ASCII letter: {name}"
        ));
    }
    if chars.any(|ch| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '-')) {
        return Err(anyhow!(
            "package name contains invalid character(s): {name}"
        ));
    }
    if name.ends_with('.') {
        return Err(anyhow!("package name must not end with a dot: {name}"));
    }

    Ok(())
}

fn validate_package_version(name: &str, version: &str) -> Result<()> {
    if version.trim().is_empty() {
        return Err(anyhow!("package '{name}' declares an empty version"));
    }
    // R versions are dot/dash separated digit groups, e.g. 1.8-4.
    if version
        .chars()
        .any(|ch| !(ch.is_ascii_digit() || ch == '.' || ch == '-'))
    {
        return Err(anyhow!(
            "package '{name}' declares an invalid version: {version}"
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceResolution {
    RemoteAvailable,
    VendoredAvailable(PathBuf),
    Unavailable,
}

impl SourceResolution {
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Installing,
    Installed,
    Failed(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Installed | Self::Failed(_))
    }

    /// Value reported for this package in the final summary map.
    pub fn summary_value(&self) -> String {
        match self {
            Self::Pending => "pending".to_string(),
            Self::Installing => "installing".to_string(),
            Self::Installed => "installed".to_string(),
            Self::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    PartialFailure,
    NoSourceFailure,
    Aborted,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialFailure => "partial-failure",
            Self::NoSourceFailure => "no-source-failure",
            Self::Aborted => "aborted",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A vendored source copy staged purely to feed installation; deleted by the
/// cleanup coordinator once the run is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoSourceError {
    pub missing: Vec<String>,
}

impl fmt::Display for NoSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", NO_SOURCE_MESSAGE, self.missing.join(", "))
    }
}

impl std::error::Error for NoSourceError {}

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Result};
use rstage_core::{PackageRequest, RunOutcome, SourceResolution, TaskStatus};

/// One package paired with its resolved source and lifecycle status. Owned by
/// the scheduler while the run is live; read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTask {
    pub request: PackageRequest,
    pub resolution: SourceResolution,
    pub status: TaskStatus,
    /// True only for packages scheduled because another package depends on
    /// them; never for a directly declared package, even one that other
    /// packages also list as a dependency.
    pub transitive: bool,
}

impl InstallTask {
    pub fn new(request: PackageRequest, resolution: SourceResolution) -> Self {
        Self {
            request,
            resolution,
            status: TaskStatus::Pending,
            transitive: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.request.name
    }
}

/// Aggregate of one staging invocation after the scheduler has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRun {
    pub tasks: Vec<InstallTask>,
    pub ncpus: usize,
    pub outcome: RunOutcome,
}

impl InstallRun {
    /// Final name -> status map; every attempted package appears exactly once.
    pub fn summary(&self) -> BTreeMap<String, String> {
        self.tasks
            .iter()
            .map(|task| (task.name().to_string(), task.status.summary_value()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BuildFailed,
    ResourceExhaustion,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildFailed => "build-failed",
            Self::ResourceExhaustion => "resource-exhaustion",
        }
    }
}

/// Non-success outcome of the install primitive for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallFailure {
    pub package: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl fmt::Display for InstallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "installation of package {} failed ({}): {}",
            self.package,
            self.kind.as_str(),
            self.detail
        )
    }
}

impl std::error::Error for InstallFailure {}

/// What a failed task that only other packages depend on does to the overall
/// outcome. `Strict` is the default: every failure makes the run non-successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Strict,
    WarnTransitive,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::WarnTransitive => "warn-transitive",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "strict" => Ok(Self::Strict),
            "warn-transitive" => Ok(Self::WarnTransitive),
            _ => Err(anyhow!("invalid failure policy: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallConfig {
    /// Concurrency budget for the worker pool, surfaced as `Ncpus=<n>`.
    pub ncpus: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            ncpus: 1,
            failure_policy: FailurePolicy::Strict,
        }
    }
}

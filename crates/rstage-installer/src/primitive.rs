use std::path::{Path, PathBuf};
use std::process::Command;

use rstage_core::{PackageRequest, SourceResolution};

use crate::types::{FailureKind, InstallFailure};

/// The blocking installation primitive. Workers call this with one resolved
/// package at a time and wait for completion; there is no cancellation.
pub trait PackageInstaller: Sync {
    fn install(
        &self,
        request: &PackageRequest,
        resolution: &SourceResolution,
    ) -> Result<(), InstallFailure>;
}

/// Production primitive: drives the R runtime on the staging container.
/// Vendored sources go through `R CMD INSTALL`; everything else is fetched
/// from the mirror by `Rscript -e 'install.packages(...)'`.
#[derive(Debug, Clone)]
pub struct RRunner {
    mirror: String,
    library_dir: PathBuf,
}

impl RRunner {
    pub fn new(mirror: impl Into<String>, library_dir: impl Into<PathBuf>) -> Self {
        Self {
            mirror: mirror.into(),
            library_dir: library_dir.into(),
        }
    }

    fn vendored_command(&self, source_path: &Path) -> Command {
        let mut command = Command::new("R");
        command
            .arg("CMD")
            .arg("INSTALL")
            .arg("-l")
            .arg(&self.library_dir)
            .arg(source_path);
        command
    }

    fn remote_command(&self, name: &str) -> Command {
        let mut command = Command::new("Rscript");
        command.arg("--vanilla").arg("-e").arg(format!(
            "install.packages(\"{}\", repos=\"{}\", lib=\"{}\")",
            name,
            self.mirror,
            self.library_dir.display()
        ));
        command
    }
}

impl PackageInstaller for RRunner {
    fn install(
        &self,
        request: &PackageRequest,
        resolution: &SourceResolution,
    ) -> Result<(), InstallFailure> {
        let mut command = match resolution {
            SourceResolution::VendoredAvailable(path) => self.vendored_command(path),
            SourceResolution::RemoteAvailable => self.remote_command(&request.name),
            SourceResolution::Unavailable => {
                // The locator gate rejects these before scheduling.
                return Err(InstallFailure {
                    package: request.name.clone(),
                    kind: FailureKind::BuildFailed,
                    detail: "no source resolved for package".to_string(),
                });
            }
        };

        run_captured(&mut command).map_err(|detail| InstallFailure {
            package: request.name.clone(),
            kind: classify_failure(&detail),
            detail,
        })
    }
}

/// Runs a command to completion with captured output; on non-success folds
/// status, stdout and stderr into one diagnosable detail string.
fn run_captured(command: &mut Command) -> Result<(), String> {
    let output = command
        .output()
        .map_err(|err| format!("command failed to start: {err}"))?;
    if output.status.success() {
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(format!(
        "status={} stdout='{}' stderr='{}'",
        output.status,
        stdout.trim(),
        stderr.trim()
    ))
}

const EXHAUSTION_SIGNATURES: [&str; 3] = [
    "no space left on device",
    "cannot allocate memory",
    "disk quota exceeded",
];

/// Staging disk/memory exhaustion aborts the whole run; anything else is an
/// ordinary per-package build failure (missing headers included).
pub fn classify_failure(detail: &str) -> FailureKind {
    let lowered = detail.to_lowercase();
    if EXHAUSTION_SIGNATURES
        .iter()
        .any(|signature| lowered.contains(signature))
    {
        return FailureKind::ResourceExhaustion;
    }
    FailureKind::BuildFailed
}

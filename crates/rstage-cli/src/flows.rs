use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rstage_core::{AppManifest, PackageRequest, RunOutcome, SourceResolution, VendorEntry};
use rstage_installer::{
    cleanup_vendored, run_install, FailurePolicy, InstallConfig, InstallTask, PackageInstaller,
    Reporter, StagingLayout,
};
use rstage_locator::{ensure_all_resolvable, resolve_sources, scan_vendor_dir};

pub struct InstallFlowOptions {
    pub manifest_override: Option<PathBuf>,
    pub ncpus_override: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub dry_run: bool,
}

/// Manifest location: an explicit `--manifest` path wins over the
/// application-root default.
pub fn manifest_path(layout: &StagingLayout, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => layout.manifest_path(),
    }
}

pub fn load_manifest(layout: &StagingLayout, override_path: Option<&Path>) -> Result<AppManifest> {
    let path = manifest_path(layout, override_path);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read application manifest: {}", path.display()))?;
    AppManifest::from_toml_str(&raw)
        .with_context(|| format!("failed to load application manifest: {}", path.display()))
}

/// The full staging pipeline: manifest -> locate -> schedule -> report ->
/// cleanup. Returns the run outcome; the caller maps non-success to the exit
/// code. The remote probe and the install primitive are injected so the flow
/// is testable without a network or an R runtime.
pub fn run_install_flow<W, F>(
    layout: &StagingLayout,
    options: &InstallFlowOptions,
    installer: &dyn PackageInstaller,
    mut remote_has: F,
    out: W,
) -> Result<RunOutcome>
where
    W: Write,
    F: FnMut(&str) -> Result<bool>,
{
    let manifest = load_manifest(layout, options.manifest_override.as_deref())?;
    let vendored = scan_vendor_dir(&layout.vendor_dir())?;
    let requests = expand_install_requests(&manifest.packages);
    let resolutions = resolve_sources(&requests, &vendored, &mut remote_has)?;

    let mut reporter = Reporter::new(out);

    if options.dry_run {
        let mut out = reporter.into_inner();
        for line in format_resolution_lines(&requests, &resolutions) {
            writeln!(out, "{line}").context("failed to write resolution line")?;
        }
        return Ok(RunOutcome::Success);
    }

    if let Err(no_source) = ensure_all_resolvable(&requests, &resolutions) {
        reporter.no_source(&no_source)?;
        return Ok(RunOutcome::NoSourceFailure);
    }

    let config = InstallConfig {
        ncpus: effective_ncpus(&manifest, options.ncpus_override),
        failure_policy: options.failure_policy,
    };

    layout.ensure_base_dirs()?;
    let declared: HashSet<&str> = manifest
        .packages
        .iter()
        .map(|package| package.name.as_str())
        .collect();
    let tasks = requests
        .iter()
        .zip(&resolutions)
        .map(|(request, resolution)| {
            let mut task = InstallTask::new(request.clone(), resolution.clone());
            task.transitive = !declared.contains(request.name.as_str());
            task
        })
        .collect();

    let run = run_install(tasks, &config, installer, &mut reporter)?;
    reporter.summary(&run.summary())?;

    let entries: Vec<VendorEntry> = vendored.into_values().collect();
    cleanup_vendored(&run, &layout.vendor_dir(), &entries)?;
    reporter.cleanup_done()?;

    Ok(run.outcome)
}

/// Declared packages first, in declaration order, followed by one synthesized
/// request per dependency name no package declares directly. Only those
/// synthesized entries count as transitive for the failure policy; a declared
/// package stays a hard requirement even when other packages depend on it.
pub fn expand_install_requests(declared: &[PackageRequest]) -> Vec<PackageRequest> {
    let declared_names: HashSet<&str> =
        declared.iter().map(|package| package.name.as_str()).collect();
    let mut requests: Vec<PackageRequest> = declared.to_vec();
    let mut seen = HashSet::new();
    for package in declared {
        for dependency in &package.dependencies {
            if declared_names.contains(dependency.as_str()) {
                continue;
            }
            if !seen.insert(dependency.clone()) {
                continue;
            }
            requests.push(PackageRequest::new(dependency.clone()));
        }
    }
    requests
}

/// Ncpus precedence: CLI flag, then manifest `num_threads`, then 1. Both
/// sources reject zero before reaching here.
pub fn effective_ncpus(manifest: &AppManifest, ncpus_override: Option<usize>) -> usize {
    ncpus_override.or(manifest.num_threads).unwrap_or(1)
}

pub fn format_resolution_lines(
    requests: &[PackageRequest],
    resolutions: &[SourceResolution],
) -> Vec<String> {
    requests
        .iter()
        .zip(resolutions)
        .map(|(request, resolution)| match resolution {
            SourceResolution::VendoredAvailable(path) => {
                format!("{}: vendored ({})", request.name, path.display())
            }
            SourceResolution::RemoteAvailable => format!("{}: remote", request.name),
            SourceResolution::Unavailable => format!("{}: no source", request.name),
        })
        .collect()
}

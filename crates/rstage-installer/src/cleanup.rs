use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use rstage_core::VendorEntry;

use crate::types::InstallRun;

/// Removes vendored source copies staged purely to feed installation, so the
/// runtime image does not retain duplicate source trees.
///
/// Taking the finished `InstallRun` by reference pins the ordering invariant
/// at the type level: there is no run value to pass until every task has
/// reached a terminal state, so no still-in-use source can be deleted.
/// Removal is idempotent; entries already gone are skipped. Success or
/// failure of individual tasks does not matter, the staging copies go either
/// way. Returns the paths actually removed.
pub fn cleanup_vendored(
    _run: &InstallRun,
    vendor_dir: &Path,
    entries: &[VendorEntry],
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in entries {
        let Some(path) = safe_vendor_path(vendor_dir, &entry.path) else {
            continue;
        };
        if !path.exists() {
            continue;
        }

        if path.is_dir() {
            fs::remove_dir_all(&path).with_context(|| {
                format!(
                    "failed to remove vendored package '{}': {}",
                    entry.name,
                    path.display()
                )
            })?;
        } else {
            fs::remove_file(&path).with_context(|| {
                format!(
                    "failed to remove vendored package '{}': {}",
                    entry.name,
                    path.display()
                )
            })?;
        }
        removed.push(path);
    }
    Ok(removed)
}

/// Only paths inside the vendor directory are ever deleted.
fn safe_vendor_path(vendor_dir: &Path, path: &Path) -> Option<PathBuf> {
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return None;
    }
    if !path.starts_with(vendor_dir) {
        return None;
    }
    Some(path.to_path_buf())
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rstage_core::VendorEntry;

/// Directory at the application root holding pre-fetched package sources.
pub const VENDOR_DIR_NAME: &str = "vendor_r";

/// Scans the vendor directory for staged package sources.
///
/// An entry is either an unpacked source tree `vendor_r/<name>/` (recognized
/// by its `DESCRIPTION` file) or a CRAN source tarball
/// `vendor_r/<name>_<version>.tar.gz`. Anything else is ignored. Results are
/// keyed by package name and deterministic for a given directory state.
pub fn scan_vendor_dir(vendor_dir: &Path) -> Result<BTreeMap<String, VendorEntry>> {
    let mut entries = BTreeMap::new();
    if !vendor_dir.exists() {
        return Ok(entries);
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(vendor_dir)
        .with_context(|| format!("failed to read vendor directory: {}", vendor_dir.display()))?
    {
        let entry = entry?;
        paths.push((entry.path(), entry.file_type()?));
    }
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, file_type) in paths {
        if file_type.is_dir() {
            if !path.join("DESCRIPTION").exists() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|v| v.to_str()) else {
                continue;
            };
            entries.insert(
                name.to_string(),
                VendorEntry {
                    name: name.to_string(),
                    path: path.clone(),
                },
            );
            continue;
        }

        if !file_type.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|v| v.to_str()) else {
            continue;
        };
        let Some(name) = tarball_package_name(file_name) else {
            continue;
        };
        // An unpacked tree for the same name wins over its tarball.
        entries
            .entry(name.to_string())
            .or_insert_with(|| VendorEntry {
                name: name.to_string(),
                path: path.clone(),
            });
    }

    Ok(entries)
}

/// Extracts the package name from a CRAN source tarball file name, e.g.
/// `stringr_1.5.0.tar.gz` -> `stringr`.
fn tarball_package_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".tar.gz")?;
    let (name, version) = stem.split_once('_')?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some(name)
}

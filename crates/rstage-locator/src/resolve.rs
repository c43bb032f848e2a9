use std::collections::BTreeMap;

use anyhow::Result;
use rstage_core::{NoSourceError, PackageRequest, SourceResolution, VendorEntry};

/// Resolves a source for every declared package, in declaration order.
///
/// Priority per package: vendored copy, then remote mirror, then
/// `Unavailable`. The remote is injected as a membership probe so callers
/// decide how (and whether) the network is touched.
pub fn resolve_sources<F>(
    requests: &[PackageRequest],
    vendored: &BTreeMap<String, VendorEntry>,
    mut remote_has: F,
) -> Result<Vec<SourceResolution>>
where
    F: FnMut(&str) -> Result<bool>,
{
    let mut resolutions = Vec::with_capacity(requests.len());
    for request in requests {
        if let Some(entry) = vendored.get(&request.name) {
            resolutions.push(SourceResolution::VendoredAvailable(entry.path.clone()));
            continue;
        }
        if remote_has(&request.name)? {
            resolutions.push(SourceResolution::RemoteAvailable);
            continue;
        }
        resolutions.push(SourceResolution::Unavailable);
    }
    Ok(resolutions)
}

/// Fail-fast gate between resolution and scheduling: any unavailable package
/// aborts the whole run before a single installation is attempted.
pub fn ensure_all_resolvable(
    requests: &[PackageRequest],
    resolutions: &[SourceResolution],
) -> Result<(), NoSourceError> {
    let missing: Vec<String> = requests
        .iter()
        .zip(resolutions)
        .filter(|(_, resolution)| !resolution.is_available())
        .map(|(request, _)| request.name.clone())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(NoSourceError { missing })
}

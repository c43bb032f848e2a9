use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use rstage_core::{PackageRequest, SourceResolution, NO_SOURCE_MESSAGE};

use super::*;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_vendor_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let sequence = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!(
        "rstage-locator-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        sequence
    ));
    path.push(VENDOR_DIR_NAME);
    path
}

fn stage_source_tree(vendor_dir: &PathBuf, name: &str) {
    let package_dir = vendor_dir.join(name);
    fs::create_dir_all(&package_dir).expect("must create vendored package dir");
    fs::write(
        package_dir.join("DESCRIPTION"),
        format!("Package: {name}\nVersion: 1.0.0\n"),
    )
    .expect("must write DESCRIPTION");
}

fn stage_tarball(vendor_dir: &PathBuf, name: &str, version: &str) {
    fs::create_dir_all(vendor_dir).expect("must create vendor dir");
    fs::write(vendor_dir.join(format!("{name}_{version}.tar.gz")), b"gz")
        .expect("must write tarball");
}

#[test]
fn scan_missing_vendor_dir_is_empty() {
    let vendor_dir = test_vendor_dir();
    let entries = scan_vendor_dir(&vendor_dir).expect("must scan");
    assert!(entries.is_empty());
}

#[test]
fn scan_finds_source_trees_and_tarballs() {
    let vendor_dir = test_vendor_dir();
    stage_source_tree(&vendor_dir, "stringr");
    stage_tarball(&vendor_dir, "jsonlite", "1.8.4");
    fs::write(vendor_dir.join("README.md"), b"not a package").expect("must write stray file");
    fs::create_dir_all(vendor_dir.join("no-description")).expect("must create stray dir");

    let entries = scan_vendor_dir(&vendor_dir).expect("must scan");
    assert_eq!(
        entries.keys().cloned().collect::<Vec<_>>(),
        vec!["jsonlite", "stringr"]
    );
    assert_eq!(entries["stringr"].path, vendor_dir.join("stringr"));
    assert_eq!(
        entries["jsonlite"].path,
        vendor_dir.join("jsonlite_1.8.4.tar.gz")
    );

    let _ = fs::remove_dir_all(vendor_dir.parent().expect("vendor dir has parent"));
}

#[test]
fn scan_prefers_source_tree_over_tarball() {
    let vendor_dir = test_vendor_dir();
    stage_source_tree(&vendor_dir, "stringr");
    stage_tarball(&vendor_dir, "stringr", "1.5.0");

    let entries = scan_vendor_dir(&vendor_dir).expect("must scan");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["stringr"].path, vendor_dir.join("stringr"));

    let _ = fs::remove_dir_all(vendor_dir.parent().expect("vendor dir has parent"));
}

#[test]
fn scan_is_idempotent_over_unchanged_state() {
    let vendor_dir = test_vendor_dir();
    stage_source_tree(&vendor_dir, "stringr");
    stage_tarball(&vendor_dir, "jsonlite", "1.8.4");

    let first = scan_vendor_dir(&vendor_dir).expect("must scan");
    let second = scan_vendor_dir(&vendor_dir).expect("must scan again");
    assert_eq!(first, second);

    let _ = fs::remove_dir_all(vendor_dir.parent().expect("vendor dir has parent"));
}

#[test]
fn resolution_prefers_vendored_over_remote() {
    let vendor_dir = test_vendor_dir();
    stage_source_tree(&vendor_dir, "stringr");
    let vendored = scan_vendor_dir(&vendor_dir).expect("must scan");

    let requests = vec![
        PackageRequest::new("stringr"),
        PackageRequest::new("jsonlite"),
    ];
    let resolutions =
        resolve_sources(&requests, &vendored, |_| Ok(true)).expect("must resolve");
    assert_eq!(
        resolutions[0],
        SourceResolution::VendoredAvailable(vendor_dir.join("stringr"))
    );
    assert_eq!(resolutions[1], SourceResolution::RemoteAvailable);

    let _ = fs::remove_dir_all(vendor_dir.parent().expect("vendor dir has parent"));
}

#[test]
fn vendored_package_skips_remote_probe() {
    let vendor_dir = test_vendor_dir();
    stage_source_tree(&vendor_dir, "stringr");
    let vendored = scan_vendor_dir(&vendor_dir).expect("must scan");

    let requests = vec![PackageRequest::new("stringr")];
    let resolutions = resolve_sources(&requests, &vendored, |name| {
        panic!("remote probe must not run for vendored package '{name}'")
    })
    .expect("must resolve");
    assert!(matches!(
        resolutions[0],
        SourceResolution::VendoredAvailable(_)
    ));

    let _ = fs::remove_dir_all(vendor_dir.parent().expect("vendor dir has parent"));
}

#[test]
fn resolution_marks_missing_packages_unavailable() {
    let requests = vec![
        PackageRequest::new("stringr"),
        PackageRequest::new("definitely-not-on-cran"),
    ];
    let index = CranIndex::parse("Package: stringr\n");
    let resolutions =
        resolve_sources(&requests, &std::collections::BTreeMap::new(), |name| {
            Ok(index.contains(name))
        })
        .expect("must resolve");
    assert_eq!(resolutions[0], SourceResolution::RemoteAvailable);
    assert_eq!(resolutions[1], SourceResolution::Unavailable);
}

#[test]
fn resolution_order_matches_request_order() {
    let requests = vec![
        PackageRequest::new("zeallot"),
        PackageRequest::new("abind"),
        PackageRequest::new("missing"),
    ];
    let index = CranIndex::parse("Package: zeallot\nPackage: abind\n");
    let resolutions =
        resolve_sources(&requests, &std::collections::BTreeMap::new(), |name| {
            Ok(index.contains(name))
        })
        .expect("must resolve");
    assert_eq!(
        resolutions,
        vec![
            SourceResolution::RemoteAvailable,
            SourceResolution::RemoteAvailable,
            SourceResolution::Unavailable,
        ]
    );
}

#[test]
fn ensure_all_resolvable_passes_when_every_source_exists() {
    let requests = vec![PackageRequest::new("stringr")];
    let resolutions = vec![SourceResolution::RemoteAvailable];
    ensure_all_resolvable(&requests, &resolutions).expect("must pass");
}

#[test]
fn ensure_all_resolvable_lists_every_missing_package() {
    let requests = vec![
        PackageRequest::new("stringr"),
        PackageRequest::new("jsonlite"),
        PackageRequest::new("sf"),
    ];
    let resolutions = vec![
        SourceResolution::Unavailable,
        SourceResolution::RemoteAvailable,
        SourceResolution::Unavailable,
    ];

    let err = ensure_all_resolvable(&requests, &resolutions)
        .expect_err("missing sources must fail the gate");
    assert_eq!(err.missing, vec!["stringr", "sf"]);
    assert!(err.to_string().starts_with(NO_SOURCE_MESSAGE));
}

#[test]
fn remote_probe_errors_propagate() {
    let requests = vec![PackageRequest::new("stringr")];
    let err = resolve_sources(&requests, &std::collections::BTreeMap::new(), |_| {
        Err(anyhow::anyhow!("mirror unreachable"))
    })
    .expect_err("probe failure must propagate");
    assert!(err.to_string().contains("mirror unreachable"));
}

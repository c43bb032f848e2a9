use super::*;

#[test]
fn parse_manifest() {
    let content = r#"
cran_mirror = "https://cran.example.test"
num_threads = 2

[[packages]]
name = "stringr"

[[packages]]
name = "jsonlite"
version = "1.8-4"
dependencies = ["R6"]
"#;

    let parsed = AppManifest::from_toml_str(content).expect("manifest should parse");
    assert_eq!(parsed.cran_mirror.as_deref(), Some("https://cran.example.test"));
    assert_eq!(parsed.effective_mirror(), "https://cran.example.test");
    assert_eq!(parsed.num_threads, Some(2));
    assert_eq!(parsed.packages.len(), 2);
    assert_eq!(parsed.packages[0].name, "stringr");
    assert_eq!(parsed.packages[0].version, None);
    assert_eq!(parsed.packages[1].name, "jsonlite");
    assert_eq!(parsed.packages[1].version.as_deref(), Some("1.8-4"));
    assert_eq!(parsed.packages[1].dependencies, vec!["R6"]);
}

#[test]
fn parse_manifest_minimal() {
    let content = r#"
[[packages]]
name = "stringr"
"#;

    let parsed = AppManifest::from_toml_str(content).expect("manifest should parse");
    assert_eq!(parsed.effective_mirror(), DEFAULT_CRAN_MIRROR);
    assert_eq!(parsed.num_threads, None);
}

#[test]
fn reject_manifest_without_packages() {
    let err = AppManifest::from_toml_str("cran_mirror = \"https://cran.example.test\"\n")
        .expect_err("empty package list must be rejected");
    assert!(err.to_string().contains("declares no packages"));
}

#[test]
fn reject_duplicate_package_declarations() {
    let content = r#"
[[packages]]
name = "stringr"

[[packages]]
name = "stringr"
"#;

    let err = AppManifest::from_toml_str(content).expect_err("duplicates must be rejected");
    assert!(err.to_string().contains("declared more than once"));
}

#[test]
fn reject_zero_num_threads() {
    let content = r#"
num_threads = 0

[[packages]]
name = "stringr"
"#;

    let err = AppManifest::from_toml_str(content).expect_err("zero budget must be rejected");
    assert!(err.to_string().contains("num_threads must be at least 1"));
}

#[test]
fn reject_invalid_package_names() {
    for bad in ["", "1stringr", "str ngr", "stringr."] {
        assert!(
            package::validate_package_name(bad).is_err(),
            "name '{bad}' should be rejected"
        );
    }
    for good in ["stringr", "R6", "data.table", "foo-bar"] {
        assert!(
            package::validate_package_name(good).is_ok(),
            "name '{good}' should be accepted"
        );
    }
}

#[test]
fn reject_invalid_package_version() {
    let content = r#"
[[packages]]
name = "jsonlite"
version = "one.two"
"#;

    let err = AppManifest::from_toml_str(content).expect_err("bad version must be rejected");
    assert!(format!("{err:#}").contains("invalid version"));
}

#[test]
fn task_status_summary_values() {
    assert_eq!(TaskStatus::Installed.summary_value(), "installed");
    assert_eq!(
        TaskStatus::Failed("compile error".to_string()).summary_value(),
        "failed: compile error"
    );
    assert!(TaskStatus::Installed.is_terminal());
    assert!(TaskStatus::Failed("x".to_string()).is_terminal());
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(!TaskStatus::Installing.is_terminal());
}

#[test]
fn no_source_error_message_carries_literal_and_names() {
    let err = NoSourceError {
        missing: vec!["stringr".to_string(), "jsonlite".to_string()],
    };
    let text = err.to_string();
    assert!(text.starts_with(NO_SOURCE_MESSAGE));
    assert!(text.contains("stringr"));
    assert!(text.contains("jsonlite"));
}

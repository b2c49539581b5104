#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Manifest policy tests.
//!
//! These verify that Cargo.toml keeps the agreed lint levels and feature
//! wiring. If any test fails, the manifest has drifted from project policy.
//!
//! All checks are synchronous filesystem reads.

use std::path::PathBuf;

/// Returns the project root directory (where Cargo.toml lives).
fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn manifest() -> toml::Table {
    let path = project_root().join("Cargo.toml");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read '{}': {}", path.display(), e));
    toml::from_str(&text).expect("Cargo.toml must be valid TOML")
}

const PANIC_FREE_LINTS: &[&str] = &[
    "unwrap_used",
    "expect_used",
    "panic",
    "todo",
    "unimplemented",
    "indexing_slicing",
];

#[test]
fn panic_prone_lints_are_denied() {
    let manifest = manifest();
    let clippy = manifest
        .get("lints")
        .and_then(|l| l.get("clippy"))
        .and_then(|c| c.as_table())
        .expect("Cargo.toml is missing [lints.clippy]");
    for lint in PANIC_FREE_LINTS {
        assert_eq!(
            clippy.get(*lint).and_then(|v| v.as_str()),
            Some("deny"),
            "[lints.clippy] must set `{lint} = \"deny\"`"
        );
    }
}

fn feature_list(features: &toml::Table, name: &str) -> Vec<String> {
    features[name]
        .as_array()
        .unwrap_or_else(|| panic!("feature `{name}` must be an array"))
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[test]
fn runtime_feature_is_default_and_enables_tokio_rt() {
    let manifest = manifest();
    let features = manifest["features"].as_table().expect("[features] table");

    assert!(feature_list(features, "default").contains(&"tokio-runtime".to_string()));

    let runtime = feature_list(features, "tokio-runtime");
    assert!(runtime.contains(&"tokio/rt".to_string()));
    assert!(runtime.contains(&"tokio/time".to_string()));
}

#[test]
fn msrv_is_declared() {
    let manifest = manifest();
    let version = manifest["package"]["rust-version"]
        .as_str()
        .expect("Cargo.toml must declare a rust-version");
    assert!(
        version.split('.').count() == 3,
        "rust-version should be a full semver triple, got {version}"
    );
}

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the read-only `keys` and `values` commands.

mod common;

use common::ProjectBuilder;
use codemucker_merge::commands;
use serde_json::json;

// ---------------------------------------------------------------------------
// Snapshot: built-in profile keys
// ---------------------------------------------------------------------------

/// Regression guard: adding, removing or renaming a built-in profile must be
/// a deliberate snapshot update.
#[test]
fn builtin_profile_keys() {
    let mut out = Vec::new();
    commands::keys::run(&mut out).unwrap();
    let keys = String::from_utf8(out).unwrap();
    insta::assert_snapshot!(keys.trim_end(), @r"
    @codemucker/merge/default
    @codemucker/merge/default/none
    @codemucker/merge/default/pnpm-ts-module-dist
    @codemucker/merge/default/pnpm-ts-module-install
    @codemucker/merge/dist
    @codemucker/merge/install
    @codemucker/merge/none
    ");
}

// ---------------------------------------------------------------------------
// values
// ---------------------------------------------------------------------------

#[test]
fn values_show_project_override_of_builtin() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "name": "demo",
            "@codemucker/merge/install": { "logLevel": "debug" }
        }))
        .build();

    let value = project.values("install");
    assert_eq!(value["logLevel"], "debug");
    assert_eq!(value["tasks"].as_array().unwrap().len(), 4);
    assert_eq!(value["defaultDest"], "build/release/dist");
}

#[test]
fn values_resolve_unscoped_project_key() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "local": { "extends": "none", "defaultSrc": "lib" }
        }))
        .build();

    let value = project.values("local");
    assert_eq!(value["defaultSrc"], "lib");
    assert_eq!(value["logLevel"], "fatal");
    assert_eq!(value["tasks"], json!([]));
}

#[test]
fn values_star_lists_every_builtin() {
    let project = ProjectBuilder::new().build();
    let value = project.values("*");
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 7);
    assert!(object.contains_key("@codemucker/merge/dist"));
}

#[test]
fn values_read_toml_descriptor() {
    let project = ProjectBuilder::new()
        .with_file(
            "merge.toml",
            "[\"@codemucker/merge/site\"]\ndefaultDest = \"public\"\ntasks = []\n",
        )
        .build();
    let global = codemucker_merge::cli::GlobalOpts {
        config: Some(project.root_path().join("merge.toml")),
        ..project.global()
    };
    let mut out = Vec::new();
    commands::values::run(
        &global,
        &codemucker_merge::cli::ValuesOpts {
            key: "site".to_string(),
        },
        &mut out,
    )
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["defaultDest"], "public");
}

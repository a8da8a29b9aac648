#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `run` command.
//!
//! These tests run profiles end to end against a real temporary project:
//! the built-in `dist` and `install` flows, project-defined profiles with
//! `extends` and pre/post tasks, required-match failures, dry runs, and the
//! project-root containment guard.

mod common;

use common::ProjectBuilder;
use codemucker_merge::error::{PathError, TaskError};
use codemucker_merge::logging::TaskStatus;
use serde_json::json;

// ---------------------------------------------------------------------------
// Built-in profiles
// ---------------------------------------------------------------------------

fn dist_project() -> common::ProjectContext {
    ProjectBuilder::new()
        .with_descriptor(&json!({
            "name": "demo",
            "version": "1.0.0",
            "type": "module",
            "scripts": { "build": "tsc" },
            "devDependencies": { "typescript": "^5" },
            "@codemucker/merge/local": { "tasks": [] }
        }))
        .with_file("LICENSE", "MIT\n")
        .with_file("README.md", "# demo\n")
        .with_file("src/index.ts", "export const x = 1;\n")
        .with_file("src/package.cjs.json", "{\"type\":\"commonjs\"}\n")
        .with_file("src/package.mjs.json", "{\"type\":\"module\"}\n")
        .with_file("build/mjs/src/index.js", "export const x = 1;\n")
        .with_file(
            "build/mjs/src/index.js.map",
            "{\"sources\":[\"../../src/index.ts\"]}",
        )
        .with_file("build/cjs/src/index.js", "exports.x = 1;\n")
        .build()
}

#[test]
fn dist_assembles_release_tree() {
    let project = dist_project();
    let log = project.run("dist", false).unwrap();

    for file in [
        "build/release/LICENSE",
        "build/release/README.md",
        "build/release/package.json",
        "build/release/src/index.ts",
        "build/release/dist/mjs/index.js",
        "build/release/dist/cjs/index.js",
        "build/release/dist/cjs/package.json",
        "build/release/dist/mjs/package.json",
    ] {
        assert!(project.exists(file), "missing {file}");
    }
    assert_eq!(
        project.read_json("build/release/dist/cjs/package.json"),
        json!({ "type": "commonjs" })
    );
    assert_eq!(log.failure_count(), 0);
}

#[test]
fn dist_strips_manifest_fields() {
    let project = dist_project();
    project.run("dist", false).unwrap();

    let manifest = project.read_json("build/release/package.json");
    assert_eq!(manifest, json!({ "name": "demo", "version": "1.0.0" }));
    assert!(
        project
            .read("build/release/package.json")
            .unwrap()
            .ends_with("}\n")
    );
    // The project descriptor itself is untouched.
    assert_eq!(project.read_json("package.json")["scripts"]["build"], "tsc");
}

#[test]
fn dist_fixes_source_map_paths() {
    let project = dist_project();
    project.run("dist", false).unwrap();
    assert_eq!(
        project.read("build/release/dist/mjs/index.js.map").unwrap(),
        "{\"sources\":[\"src/index.ts\"]}"
    );
}

#[test]
fn dist_fails_when_required_build_output_is_missing() {
    let project = ProjectBuilder::new()
        .with_file("LICENSE", "MIT\n")
        .with_file("package.json", "{}\n")
        .build();
    let err = project.run("dist", false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TaskError>(),
        Some(TaskError::InsufficientMatches {
            expected: 1,
            found: 0,
            ..
        })
    ));
    assert!(!project.exists("build/release"));
}

#[test]
fn dry_run_reports_but_changes_nothing() {
    let project = dist_project();
    let before = project.files();
    let log = project.run("dist", true).unwrap();

    assert_eq!(project.files(), before);
    let entries = log.task_entries();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e.status != TaskStatus::Failed));
    assert!(entries.iter().any(|e| e.status == TaskStatus::DryRun));
}

#[test]
fn dry_run_tolerates_missing_required_matches() {
    let project = ProjectBuilder::new().with_file("package.json", "{}\n").build();
    let log = project.run("dist", true).unwrap();
    assert_eq!(log.failure_count(), 0);
    assert_eq!(project.files(), vec!["package.json"]);
}

#[test]
fn install_copies_tooling_and_merges_scripts() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "name": "consumer",
            "scripts": { "test": "jest" },
            "devDependencies": { "jest": "^29" }
        }))
        .with_file("LICENSE", "Apache-2.0\n")
        .with_file("node_modules/@codemucker/merge/assets/tsconfig.json", "{}\n")
        .with_file(
            "node_modules/@codemucker/merge/assets/.prettierrc.cjs",
            "module.exports = {};\n",
        )
        .with_file("node_modules/@codemucker/merge/assets/.prettierignore", "dist\n")
        .with_file("node_modules/@codemucker/merge/assets/.npmignore", "src\n")
        .with_file("node_modules/@codemucker/merge/assets/LICENSE", "MIT\n")
        .with_file(
            "node_modules/@codemucker/merge/dist/templates/package.scripts.json",
            r#"{ "scripts": { "build": "tsc" }, "dependencies": { "typescript": "^5" } }"#,
        )
        .build();

    project.run("install", false).unwrap();

    assert_eq!(project.read("tsconfig.json").unwrap(), "{}\n");
    assert!(project.exists(".prettierrc.cjs"));
    assert_eq!(
        project.read("LICENSE").unwrap(),
        "Apache-2.0\n",
        "overwrite=false keeps the existing license"
    );
    let manifest = project.read_json("package.json");
    assert_eq!(manifest["scripts"], json!({ "test": "jest", "build": "tsc" }));
    assert_eq!(
        manifest["devDependencies"],
        json!({ "jest": "^29", "typescript": "^5" })
    );
}

#[test]
fn install_twice_is_stable() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({ "scripts": {}, "devDependencies": {} }))
        .with_file("node_modules/@codemucker/merge/assets/tsconfig.json", "{}\n")
        .with_file("node_modules/@codemucker/merge/assets/.prettierrc.cjs", "")
        .with_file("node_modules/@codemucker/merge/assets/.prettierignore", "")
        .with_file("node_modules/@codemucker/merge/assets/.npmignore", "")
        .with_file("node_modules/@codemucker/merge/assets/LICENSE", "MIT\n")
        .with_file(
            "node_modules/@codemucker/merge/dist/templates/package.scripts.json",
            r#"{ "scripts": { "build": "tsc" }, "dependencies": { "typescript": "^5" } }"#,
        )
        .build();

    project.run("install", false).unwrap();
    let first = project.read("package.json").unwrap();
    project.run("install", false).unwrap();
    assert_eq!(project.read("package.json").unwrap(), first);
}

#[test]
fn none_profile_does_nothing() {
    let project = ProjectBuilder::new().with_file("a.txt", "a").build();
    let log = project.run("none", false).unwrap();
    assert!(log.task_entries().is_empty());
    assert_eq!(project.files(), vec!["a.txt"]);
}

// ---------------------------------------------------------------------------
// Project-defined profiles
// ---------------------------------------------------------------------------

#[test]
fn project_profile_runs_pre_own_and_post_tasks_in_order() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "@codemucker/merge/prepare": {
                "tasks": [{ "task": "copy", "label": "stage", "include": "in/*.txt", "dest": "stage" }]
            },
            "@codemucker/merge/cleanup": {
                "tasks": [{ "task": "delete", "label": "drop stage", "srcDir": "stage" }]
            },
            "@codemucker/merge/ship": {
                "preTasks": "prepare",
                "postTasks": ["cleanup"],
                "tasks": [{
                    "task": "copy",
                    "label": "publish",
                    "srcDir": "stage",
                    "dest": "out"
                }]
            }
        }))
        .with_file("in/a.txt", "a")
        .with_file("in/b.txt", "b")
        .build();

    let log = project.run("ship", false).unwrap();

    assert_eq!(project.read("out/in/a.txt").unwrap(), "a");
    assert_eq!(project.read("out/in/b.txt").unwrap(), "b");
    assert!(!project.exists("stage/in/a.txt"));
    let names: Vec<String> = log.task_entries().into_iter().map(|e| e.name).collect();
    assert_eq!(
        names,
        vec!["prepare: stage", "ship: publish", "cleanup: drop stage"]
    );
}

#[test]
fn project_profile_extends_builtin_and_overrides_defaults() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "@codemucker/merge/assets": {
                "extends": "default",
                "defaultSrc": "static",
                "defaultDest": "public",
                "tasks": [{ "task": "copy", "include": "**/*.css" }]
            }
        }))
        .with_file("static/site.css", "body {}")
        .with_file("static/skip.html", "<p/>")
        .build();

    project.run("assets", false).unwrap();

    assert_eq!(project.read("public/site.css").unwrap(), "body {}");
    assert!(!project.exists("public/skip.html"));
}

#[test]
fn update_with_inline_values_edits_every_content_type() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "@codemucker/merge/configure": {
                "tasks": [
                    {
                        "task": "update",
                        "include": "app.properties",
                        "expression": "host",
                        "value": "example.org"
                    },
                    {
                        "task": "update",
                        "include": "settings.json",
                        "expression": "server.port",
                        "value": 8080
                    },
                    {
                        "task": "update",
                        "include": "notes.txt",
                        "expressionType": "regex",
                        "expression": "v(\\d+)",
                        "value": "version $1"
                    }
                ]
            }
        }))
        .with_file("app.properties", "host=localhost\nport=80\n")
        .with_file("settings.json", "{\n  \"server\": {\n    \"port\": 80\n  }\n}\n")
        .with_file("notes.txt", "released v2\n")
        .build();

    project.run("configure", false).unwrap();

    assert_eq!(
        project.read("app.properties").unwrap(),
        "host=\"example.org\"\nport=80\n"
    );
    assert_eq!(project.read_json("settings.json")["server"]["port"], 8080);
    assert_eq!(project.read("notes.txt").unwrap(), "released version 2\n");
}

#[test]
fn unknown_task_kind_fails_the_run() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "@codemucker/merge/odd": { "tasks": [{ "task": "explode" }] }
        }))
        .build();
    let err = project.run("odd", false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TaskError>(),
        Some(TaskError::UnknownTaskKind { .. })
    ));
}

#[test]
fn unknown_profile_fails_before_any_task() {
    let project = ProjectBuilder::new().build();
    let err = project.run("missing", false).unwrap_err();
    assert!(err.to_string().contains("missing"));
}

// ---------------------------------------------------------------------------
// Project-root containment
// ---------------------------------------------------------------------------

#[test]
fn copy_target_outside_root_is_rejected_without_writes() {
    let outside = tempfile::tempdir().unwrap();
    let escape = outside.path().join("stolen.txt");
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "@codemucker/merge/escape": {
                "tasks": [
                    { "task": "copy", "include": "a.txt", "dest": "ok" },
                    { "task": "copy", "include": "a.txt", "target": escape.to_string_lossy() }
                ]
            }
        }))
        .with_file("a.txt", "a")
        .build();

    let err = project.run("escape", false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PathError>(),
        Some(PathError::Escape { .. })
    ));
    assert!(project.exists("ok/a.txt"), "earlier task ran");
    assert!(!escape.exists());
}

#[test]
fn relative_escape_is_rejected() {
    let project = ProjectBuilder::new()
        .with_descriptor(&json!({
            "@codemucker/merge/escape": {
                "tasks": [{ "task": "copy", "include": "a.txt", "dest": "../../elsewhere" }]
            }
        }))
        .with_file("a.txt", "a")
        .build();

    let before = project.files();
    let err = project.run("escape", false).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PathError>(),
        Some(PathError::Escape { .. })
    ));
    assert_eq!(project.files(), before);
}

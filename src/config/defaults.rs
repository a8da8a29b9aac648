//! Built-in default profiles and the hard defaults every profile starts from.
use serde_json::{Map, Value, json};

/// The outermost base layer of every resolved profile.
#[must_use]
pub fn hard_defaults() -> Value {
    json!({
        "logLevel": "info",
        "tasks": [],
        "defaultSrc": ".",
        "defaultDest": "build/release/dist"
    })
}

/// Package that ships the install templates and shared tooling config.
const TOOLING_PACKAGE: &str = "@codemucker/merge";

/// Template holding the `scripts` and `dependencies` blocks merged into
/// consumer manifests.
const SCRIPTS_TEMPLATE: &str =
    "node_modules/@codemucker/merge/dist/templates/package.scripts.json";

/// The built-in profiles, keyed by fully namespaced profile key.
///
/// - `…/default`: empty task list.
/// - `…/default/none`: silent no-op.
/// - `…/default/pnpm-ts-module-dist`: assemble a dual ESM/CommonJS release
///   under `build/release/`.
/// - `…/default/pnpm-ts-module-install`: install shared tooling config into a
///   consumer project.
/// - `…/none`, `…/dist`, `…/install`: short aliases of the above.
#[must_use]
pub fn builtin_profiles() -> Map<String, Value> {
    let profiles = json!({
        "@codemucker/merge/default": {
            "logLevel": "info",
            "tasks": []
        },
        "@codemucker/merge/default/none": {
            "extends": "@codemucker/merge/default",
            "logLevel": "fatal"
        },
        "@codemucker/merge/default/pnpm-ts-module-dist": {
            "defaultSrc": "./",
            "defaultDest": "build/release/",
            "tasks": [
                {
                    "task": "copy",
                    "label": "built esm files",
                    "srcDir": "build/mjs/src",
                    "dest": "build/release/dist/mjs",
                    "required": true
                },
                {
                    "task": "copy",
                    "label": "built commonjs files",
                    "srcDir": "build/cjs/src",
                    "dest": "build/release/dist/cjs",
                    "required": true
                },
                {
                    "task": "copy",
                    "label": "common assets",
                    "include": ["LICENSE", "README*", "package.json"],
                    "dest": "build/release/",
                    "required": true
                },
                {
                    "task": "copy",
                    "label": "source code",
                    "srcDir": "src/",
                    "dest": "build/release/src/"
                },
                {
                    "task": "copy",
                    "label": "commonjs package.json",
                    "include": "src/package.cjs.json",
                    "target": "build/release/dist/cjs/package.json",
                    "required": true
                },
                {
                    "task": "copy",
                    "label": "esm package.json",
                    "include": "src/package.mjs.json",
                    "target": "build/release/dist/mjs/package.json",
                    "required": true
                },
                {
                    "task": "update",
                    "label": "strip publish-irrelevant manifest fields",
                    "srcDir": "build/release/",
                    "include": "package.json",
                    "expressionType": "json",
                    "expression": [
                        "scripts",
                        "type",
                        "files",
                        "devDependencies",
                        "build",
                        "settings",
                        "config",
                        "@codemucker/*"
                    ],
                    "required": true
                },
                {
                    "task": "update",
                    "label": "fixup source maps",
                    "srcDir": "build/release/",
                    "include": "**/*.js.map",
                    "expressionType": "text",
                    "expression": "../../",
                    "value": ""
                }
            ]
        },
        "@codemucker/merge/default/pnpm-ts-module-install": {
            "tasks": [
                {
                    "task": "copy",
                    "label": "code setup",
                    "fromPackage": TOOLING_PACKAGE,
                    "srcDir": "assets",
                    "include": ["tsconfig.*", ".prettierignore", ".prettierrc.cjs", ".npmignore"],
                    "dest": ".",
                    "required": true,
                    "overwrite": true
                },
                {
                    "task": "copy",
                    "label": "copy license",
                    "fromPackage": TOOLING_PACKAGE,
                    "srcDir": "assets",
                    "include": "LICENSE*",
                    "dest": ".",
                    "required": true,
                    "overwrite": false
                },
                {
                    "task": "update",
                    "label": "merge scripts block",
                    "include": "package.json",
                    "expressionType": "json",
                    "fromFile": SCRIPTS_TEMPLATE,
                    "fromExpression": "scripts",
                    "expression": "scripts",
                    "strategy": "merge",
                    "required": true
                },
                {
                    "task": "update",
                    "label": "copy dependencies from devDependencies",
                    "include": "package.json",
                    "expressionType": "json",
                    "fromFile": SCRIPTS_TEMPLATE,
                    "fromExpression": "dependencies",
                    "expression": "devDependencies",
                    "strategy": "merge",
                    "required": true
                }
            ]
        },
        "@codemucker/merge/none": {
            "extends": "@codemucker/merge/default/none"
        },
        "@codemucker/merge/dist": {
            "extends": "@codemucker/merge/default/pnpm-ts-module-dist"
        },
        "@codemucker/merge/install": {
            "extends": "@codemucker/merge/default/pnpm-ts-module-install"
        }
    });

    match profiles {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, ProfileRegistry, Task};

    fn registry() -> ProfileRegistry {
        ProfileRegistry::with_builtin_defaults(Map::new())
    }

    #[test]
    fn every_builtin_profile_resolves() {
        let reg = registry();
        for key in reg.builtin_keys() {
            let profile = reg
                .resolve(key)
                .unwrap_or_else(|e| panic!("'{key}' failed to resolve: {e:#}"));
            assert!(
                profile
                    .tasks
                    .iter()
                    .all(|t| !matches!(t, Task::Unknown { .. })),
                "'{key}' contains an unknown task kind"
            );
        }
    }

    #[test]
    fn none_profile_is_silent_and_empty() {
        let profile = registry().resolve("none").unwrap();
        assert_eq!(profile.log_level, LogLevel::Fatal);
        assert!(profile.tasks.is_empty());
    }

    #[test]
    fn dist_alias_inherits_dist_profile() {
        let reg = registry();
        let alias = reg.resolve("dist").unwrap();
        let full = reg
            .resolve("@codemucker/merge/default/pnpm-ts-module-dist")
            .unwrap();
        assert_eq!(alias.tasks, full.tasks);
        assert_eq!(alias.default_dest, "build/release/");
        assert_eq!(alias.tasks.len(), 8);
    }

    #[test]
    fn install_profile_keeps_existing_license() {
        let profile = registry().resolve("install").unwrap();
        let license = profile
            .tasks
            .iter()
            .find(|t| t.label() == Some("copy license"))
            .expect("license task");
        let Task::Copy(copy) = license else {
            panic!("license task should be a copy");
        };
        assert!(!copy.overwrite);
    }

    #[test]
    fn hard_defaults_are_an_object() {
        assert!(hard_defaults().is_object());
    }
}

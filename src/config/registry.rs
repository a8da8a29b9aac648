//! Two-tier profile registry and the `extends` resolver.
//!
//! Raw profile entries come from two places: the project descriptor and the
//! built-in defaults. Resolution works on untyped JSON values so that the
//! merge rules (see [`crate::document::merge`]) apply uniformly to every
//! field; only the final result is deserialized into a [`Profile`].

use anyhow::Result;
use serde_json::{Map, Value};

use super::defaults;
use super::profile::Profile;
use crate::document::deep_merge;
use crate::error::ConfigError;

/// Namespace tried first for unscoped profile keys.
pub const NAMESPACE: &str = "@codemucker/merge/";

/// The project-level and built-in profile entries.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    project: Map<String, Value>,
    builtin: Map<String, Value>,
}

impl ProfileRegistry {
    /// Create a registry from explicit project and built-in entries.
    #[must_use]
    pub const fn new(project: Map<String, Value>, builtin: Map<String, Value>) -> Self {
        Self { project, builtin }
    }

    /// Create a registry whose built-in tier is [`defaults::builtin_profiles`].
    #[must_use]
    pub fn with_builtin_defaults(project: Map<String, Value>) -> Self {
        Self::new(project, defaults::builtin_profiles())
    }

    /// All built-in profile keys, sorted.
    #[must_use]
    pub fn builtin_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.builtin.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Keys looked up for `key`, in order.
    ///
    /// Scoped keys (starting with `@`) are used as is; unscoped keys are
    /// tried in the [`NAMESPACE`] first and then bare.
    ///
    /// # Examples
    ///
    /// ```
    /// use codemucker_merge::config::ProfileRegistry;
    ///
    /// assert_eq!(
    ///     ProfileRegistry::candidate_keys("dist"),
    ///     vec!["@codemucker/merge/dist", "dist"]
    /// );
    /// assert_eq!(ProfileRegistry::candidate_keys("@acme/x"), vec!["@acme/x"]);
    /// ```
    #[must_use]
    pub fn candidate_keys(key: &str) -> Vec<String> {
        if key.starts_with('@') {
            vec![key.to_string()]
        } else {
            vec![format!("{NAMESPACE}{key}"), key.to_string()]
        }
    }

    /// The raw entry for `key` and the candidate key it was found under.
    ///
    /// At the first candidate with any entry, the built-in entry is the base
    /// and the project entry is merged over it.
    fn raw_entry(&self, key: &str) -> Result<(String, Value)> {
        let candidates = Self::candidate_keys(key);
        for candidate in &candidates {
            let builtin = self.builtin.get(candidate);
            let project = self.project.get(candidate);
            let entry = match (builtin, project) {
                (None, None) => continue,
                (Some(base), None) => base.clone(),
                (None, Some(overlay)) => overlay.clone(),
                (Some(base), Some(overlay)) => deep_merge(base, overlay),
            };
            tracing::trace!("found config '{key}' as '{candidate}'");
            return Ok((candidate.clone(), entry));
        }
        Err(ConfigError::NotFound {
            key: key.to_string(),
            tried: candidates.join(", "),
        }
        .into())
    }

    fn resolve_chain(&self, key: &str, chain: &mut Vec<String>) -> Result<Value> {
        let (found_key, entry) = self.raw_entry(key)?;
        let cyclic = chain.contains(&found_key);
        chain.push(found_key);
        if cyclic {
            return Err(ConfigError::ExtendsCycle(chain.join(" -> ")).into());
        }

        match entry.get("extends").and_then(Value::as_str) {
            Some(parent) => {
                tracing::trace!("resolving parent '{parent}' for '{key}'");
                let parent_value = self.resolve_chain(parent, chain)?;
                Ok(deep_merge(&parent_value, &entry))
            }
            None => Ok(entry),
        }
    }

    /// Resolve `key` to its fully merged, untyped entry.
    ///
    /// The `extends` chain is merged child over parent and the result is
    /// merged over [`defaults::hard_defaults`]. The registry is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `key` (or any ancestor) has no
    /// entry, or [`ConfigError::ExtendsCycle`] if the chain revisits a key.
    pub fn resolve_value(&self, key: &str) -> Result<Value> {
        let resolved = self.resolve_chain(key, &mut Vec::new())?;
        Ok(deep_merge(&defaults::hard_defaults(), &resolved))
    }

    /// Resolve `key` to a typed [`Profile`].
    ///
    /// # Errors
    ///
    /// Everything [`resolve_value`](Self::resolve_value) reports, plus
    /// [`ConfigError::Invalid`] if the merged entry is not a valid profile.
    pub fn resolve(&self, key: &str) -> Result<Profile> {
        let value = self.resolve_value(key)?;
        serde_json::from_value(value).map_err(|source| {
            ConfigError::Invalid {
                key: key.to_string(),
                source,
            }
            .into()
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::unreachable
)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, Task};
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn registry(project: Value, builtin: Value) -> ProfileRegistry {
        ProfileRegistry::new(map(project), map(builtin))
    }

    fn error_of<T: std::fmt::Debug>(result: Result<T>) -> ConfigError {
        result
            .unwrap_err()
            .downcast::<ConfigError>()
            .expect("expected a ConfigError")
    }

    #[test]
    fn chain_takes_nearest_definition_of_each_field() {
        let reg = registry(
            json!({
                "a": { "extends": "b", "defaultDest": "a-dest" },
                "b": { "extends": "c", "logLevel": "debug", "tasks": [{ "task": "delete" }] },
                "c": {
                    "logLevel": "warn",
                    "defaultSrc": "c-src",
                    "defaultDest": "c-dest",
                    "tasks": [{ "task": "copy" }, { "task": "copy" }]
                }
            }),
            json!({}),
        );
        let profile = reg.resolve("a").unwrap();
        assert_eq!(profile.log_level, LogLevel::Debug);
        assert_eq!(profile.default_src, "c-src");
        assert_eq!(profile.default_dest, "a-dest");
        assert_eq!(profile.tasks.len(), 1, "child array replaces parent array");
        assert_eq!(profile.tasks[0].kind(), "delete");
    }

    #[test]
    fn hard_defaults_fill_missing_fields() {
        let reg = registry(json!({ "bare": {} }), json!({}));
        let profile = reg.resolve("bare").unwrap();
        assert_eq!(profile.log_level, LogLevel::Info);
        assert_eq!(profile.default_src, ".");
        assert_eq!(profile.default_dest, "build/release/dist");
        assert!(profile.tasks.is_empty());
    }

    #[test]
    fn missing_key_reports_all_candidates() {
        let reg = registry(json!({}), json!({}));
        let ConfigError::NotFound { key, tried } = error_of(reg.resolve("nope")) else {
            unreachable!("expected NotFound");
        };
        assert_eq!(key, "nope");
        assert_eq!(tried, "@codemucker/merge/nope, nope");
    }

    #[test]
    fn missing_parent_is_not_found() {
        let reg = registry(json!({ "child": { "extends": "ghost" } }), json!({}));
        assert!(matches!(
            error_of(reg.resolve("child")),
            ConfigError::NotFound { .. }
        ));
    }

    #[test]
    fn extends_cycle_fails_fast() {
        let reg = registry(
            json!({
                "a": { "extends": "b" },
                "b": { "extends": "a" }
            }),
            json!({}),
        );
        let ConfigError::ExtendsCycle(chain) = error_of(reg.resolve("a")) else {
            unreachable!("expected ExtendsCycle");
        };
        assert_eq!(chain, "a -> b -> a");
    }

    #[test]
    fn self_extension_is_a_cycle() {
        let reg = registry(json!({ "a": { "extends": "a" } }), json!({}));
        assert!(matches!(
            error_of(reg.resolve("a")),
            ConfigError::ExtendsCycle(_)
        ));
    }

    #[test]
    fn namespaced_key_wins_over_bare_key() {
        let reg = registry(
            json!({
                "@codemucker/merge/dist": { "defaultDest": "namespaced" },
                "dist": { "defaultDest": "bare" }
            }),
            json!({}),
        );
        assert_eq!(reg.resolve("dist").unwrap().default_dest, "namespaced");
    }

    #[test]
    fn bare_key_is_the_fallback() {
        let reg = registry(json!({ "custom": { "defaultDest": "bare" } }), json!({}));
        assert_eq!(reg.resolve("custom").unwrap().default_dest, "bare");
    }

    #[test]
    fn scoped_key_is_looked_up_exactly() {
        let reg = registry(json!({ "@acme/tool": {} }), json!({}));
        assert!(reg.resolve("@acme/tool").is_ok());
        assert!(reg.resolve("@acme/other").is_err());
    }

    #[test]
    fn project_entry_is_merged_over_builtin_entry() {
        let reg = registry(
            json!({ "@codemucker/merge/dist": { "defaultDest": "out/" } }),
            json!({ "@codemucker/merge/dist": { "defaultSrc": "src/", "defaultDest": "build/" } }),
        );
        let profile = reg.resolve("dist").unwrap();
        assert_eq!(profile.default_src, "src/");
        assert_eq!(profile.default_dest, "out/");
    }

    #[test]
    fn project_profile_can_extend_builtin_profile() {
        let reg = ProfileRegistry::with_builtin_defaults(map(json!({
            "release": { "extends": "dist", "defaultDest": "out/" }
        })));
        let profile = reg.resolve("release").unwrap();
        assert_eq!(profile.default_dest, "out/");
        assert!(!profile.tasks.is_empty());
        assert!(profile.tasks.iter().all(|t| !matches!(t, Task::Unknown { .. })));
    }

    #[test]
    fn resolution_does_not_mutate_registry() {
        let reg = registry(
            json!({ "a": { "extends": "b" }, "b": { "logLevel": "warn" } }),
            json!({}),
        );
        let first = reg.resolve_value("a").unwrap();
        let second = reg.resolve_value("a").unwrap();
        assert_eq!(first, second);
        assert_eq!(reg.project.get("a"), Some(&json!({ "extends": "b" })));
    }

    #[test]
    fn invalid_profile_is_reported_with_key() {
        let reg = registry(json!({ "bad": { "tasks": "not-a-list" } }), json!({}));
        let ConfigError::Invalid { key, .. } = error_of(reg.resolve("bad")) else {
            unreachable!("expected Invalid");
        };
        assert_eq!(key, "bad");
    }

    #[test]
    fn builtin_keys_are_sorted() {
        let reg = registry(json!({}), json!({ "b": {}, "a": {}, "c": {} }));
        assert_eq!(reg.builtin_keys(), vec!["a", "b", "c"]);
    }
}

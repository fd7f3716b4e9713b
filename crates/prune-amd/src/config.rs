// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AmdError, Result};

/// Options controlling where references are looked up.
///
/// Deserializes from the JSON options file:
///
/// ```json
/// { "root": "js", "basePath": "", "paths": { "app": "deep/deeper" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory references are resolved against
    pub root: PathBuf,

    /// Sub-directory of `root` that module names are relative to
    pub base_path: PathBuf,

    /// Path aliases (logical prefix -> replacement)
    pub paths: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            base_path: PathBuf::new(),
            paths: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Create a configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON options file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AmdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| AmdError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Set the base path.
    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Add a path alias.
    pub fn path(mut self, prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.paths.insert(prefix.into(), replacement.into());
        self
    }

    /// The absolute directory module names are relative to.
    pub fn base_dir(&self) -> Result<PathBuf> {
        let dir = if self.base_path.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.base_path)
        };
        let dir = std::path::absolute(&dir).map_err(|source| AmdError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(crate::module::normalize_path(&dir))
    }

    /// Substitute the longest path alias that prefixes `id`.
    ///
    /// A prefix only applies when it equals `id` or is followed by `/`.
    pub fn apply_path_alias(&self, id: &str) -> String {
        let best = self
            .paths
            .iter()
            .filter(|(prefix, _)| {
                id.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .max_by_key(|(prefix, _)| prefix.len());

        match best {
            Some((prefix, replacement)) => format!("{}{}", replacement, &id[prefix.len()..]),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.root, PathBuf::from("."));
        assert!(config.paths.is_empty());
    }

    #[test]
    fn test_path_alias_longest_prefix() {
        let config = Config::default()
            .path("app", "deep/deeper")
            .path("app/lib", "vendor");
        assert_eq!(config.apply_path_alias("app/pathaliased"), "deep/deeper/pathaliased");
        assert_eq!(config.apply_path_alias("app/lib/x"), "vendor/x");
        assert_eq!(config.apply_path_alias("app"), "deep/deeper");
        assert_eq!(config.apply_path_alias("application"), "application");
        assert_eq!(config.apply_path_alias("other/app"), "other/app");
    }

    #[test]
    fn test_load_options_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"root": "js", "paths": {{"app": "deep/deeper"}}}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.root, PathBuf::from("js"));
        assert_eq!(config.base_path, PathBuf::new());
        assert_eq!(config.paths.get("app").map(String::as_str), Some("deep/deeper"));
    }

    #[test]
    fn test_load_invalid_options_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(Config::load(file.path()), Err(AmdError::Config(_))));
    }

    #[test]
    fn test_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_root(dir.path()).base_path("lib");
        assert_eq!(config.base_dir().unwrap(), dir.path().join("lib"));
    }
}

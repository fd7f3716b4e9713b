// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resource resolution - finds, reads and parses every referenced module

use prune_syntax::ast::Program;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::assemble::assemble;
use crate::config::Config;
use crate::error::{AmdError, Result};
use crate::extract::{self, CallStyle, Reference};
use crate::graph::relationships;
use crate::module::{EntryId, Inventory, Module, ResolvedReference, normalize_path, relative_id};
use crate::naming;
use crate::plugins::PluginRegistry;
use crate::toposort::toposort;
use crate::uri::{join_id, normalize_id};

/// How a relative reference is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Against the root, as the global `require([...])` does
    Amd,
    /// Against the referencing module's directory, as `define()`
    /// dependencies and `require('x')` do
    Cjs,
}

impl From<CallStyle> for ResolutionMode {
    fn from(style: CallStyle) -> Self {
        match style {
            CallStyle::Amd => ResolutionMode::Amd,
            CallStyle::CommonJs => ResolutionMode::Cjs,
        }
    }
}

/// State of one inlining run.
pub struct Bundler {
    /// Resolution options
    config: Config,
    /// Absolute directory module names are relative to
    base_dir: PathBuf,
    /// Every module and alias seen so far
    inventory: Inventory,
    /// Content plugins
    plugins: PluginRegistry,
}

impl Bundler {
    /// Create a bundler with the built-in plugins
    pub fn new(config: Config) -> Result<Self> {
        Self::with_plugins(config, PluginRegistry::new())
    }

    /// Create a bundler with a custom plugin registry
    pub fn with_plugins(config: Config, plugins: PluginRegistry) -> Result<Self> {
        let base_dir = config.base_dir()?;
        Ok(Self {
            config,
            base_dir,
            inventory: Inventory::new(),
            plugins,
        })
    }

    /// The inventory built so far
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The directory module names are relative to
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Register the entry module `file`, already parsed as `program`, and
    /// load everything it references.
    pub fn add_entry(&mut self, file: &Path, program: Program) -> Result<EntryId> {
        let file = std::path::absolute(file).map_err(|source| AmdError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let mut module = Module::new(normalize_path(&file), &self.base_dir, false);
        info!("Entry module '{}' read from {}", module.name, file.display());
        module.tree = Some(program);

        let id = self.inventory.register_module(module);
        self.resolve_dependencies(id)?;
        Ok(id)
    }

    /// Resolve one reference made from a module in `current_dir` (relative
    /// to the base directory) and load the module it names.
    ///
    /// A module already in the inventory is returned as is, which also
    /// breaks reference cycles.
    pub fn process_reference(
        &mut self,
        reference: &Reference,
        current_dir: &str,
        mode: ResolutionMode,
    ) -> Result<EntryId> {
        let uri = &reference.uri;

        // Logical id, then path aliases
        let logical = match mode {
            ResolutionMode::Cjs if uri.is_relative() => join_id(current_dir, uri.resource()),
            _ => normalize_id(uri.resource()),
        };
        let logical = self.config.apply_path_alias(&logical);

        let mut file = self.base_dir.join(&logical).into_os_string();
        if uri.plugins().is_empty() {
            file.push(".js");
        }
        let file = normalize_path(Path::new(&file));

        // Check inventory
        let module = Module::new(file.clone(), &self.base_dir, !uri.plugins().is_empty());
        if let Some(existing) = self.inventory.get(&module.name) {
            return Ok(existing);
        }

        // Registered before reading so a missing file is looked up only once
        let name = module.name.clone();
        let id = self.inventory.register_module(module);

        if !file.is_file() {
            return Err(AmdError::NotFound {
                reference: uri.to_string(),
                path: file,
            });
        }
        info!("AMD resource '{}' resolved to {}", uri, file.display());

        let raw = std::fs::read(&file).map_err(|source| AmdError::Io {
            path: file.clone(),
            source,
        })?;
        let raw = self.plugins.apply(uri.plugins(), raw, &name, &self.config)?;
        let source = String::from_utf8_lossy(&raw);
        let label = relative_id(&file, &self.base_dir);
        let tree = prune_syntax::parse(&source, Some(&label))?;

        if let Some(module) = self.inventory.module_mut(id) {
            module.tree = Some(tree);
        }
        self.resolve_dependencies(id)?;
        Ok(id)
    }

    /// Name module `id` from its define calls and load its references.
    fn resolve_dependencies(&mut self, id: EntryId) -> Result<()> {
        let Some(module) = self.inventory.module(id) else {
            return Ok(());
        };
        let Some(tree) = &module.tree else {
            return Ok(());
        };

        let defines = extract::define_calls(tree);
        let requires = extract::require_calls(tree);
        let current_dir = relative_id(&module.path.dir, &self.base_dir);
        debug!(
            "Found {} define calls and {} require calls in '{}'",
            defines.len(),
            requires.len(),
            module.name
        );

        naming::assign_defines(&mut self.inventory, id, &defines)?;

        for define in &defines {
            for reference in &define.references {
                self.follow(id, reference, &current_dir, ResolutionMode::Cjs)?;
            }
        }
        for require in &requires {
            for reference in &require.references {
                self.follow(id, reference, &current_dir, require.style.into())?;
            }
        }
        Ok(())
    }

    /// Resolve `reference` and record the edge on module `owner`. Errors
    /// that only concern this reference are logged and the edge dropped.
    fn follow(
        &mut self,
        owner: EntryId,
        reference: &Reference,
        current_dir: &str,
        mode: ResolutionMode,
    ) -> Result<()> {
        match self.process_reference(reference, current_dir, mode) {
            Ok(target) => {
                if let Some(module) = self.inventory.module_mut(owner) {
                    module.references.push(ResolvedReference {
                        site: reference.site,
                        target,
                    });
                }
                Ok(())
            }
            Err(err) if err.is_recoverable() => {
                warn!("{}", err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Name every module, order them and combine their trees.
    pub fn finish(mut self) -> Result<Program> {
        naming::finalize(&mut self.inventory)?;

        let graph = relationships(&self.inventory);
        let clusters = toposort(&graph);

        let imported: Vec<&str> = clusters
            .iter()
            .flatten()
            .map(|id| self.inventory.entry(*id).name())
            .collect();
        info!("Modules imported: {:?}", imported);

        Ok(assemble(&mut self.inventory, &clusters))
    }
}

/// Inline every module `program` (read from `file`) depends on.
pub fn inline_dependencies(file: &Path, program: Program, config: Config) -> Result<Program> {
    let mut bundler = Bundler::new(config)?;
    bundler.add_entry(file, program)?;
    bundler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::ResourceUri;
    use prune_syntax::ast::NodeId;
    use std::fs;

    fn reference(text: &str) -> Reference {
        Reference {
            site: NodeId(0),
            uri: ResourceUri::parse(text),
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("deep/deeper")).unwrap();
        fs::write(dir.path().join("deep/relative.js"), "define(function () { return 1; });").unwrap();
        fs::write(dir.path().join("relative.js"), "define(function () { return 2; });").unwrap();
        fs::write(dir.path().join("deep/template.html"), "<b></b>").unwrap();
        dir
    }

    #[test]
    fn test_cjs_relative_resolves_against_module_dir() {
        let dir = fixture();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let id = bundler
            .process_reference(&reference("../relative"), "deep/deeper", ResolutionMode::Cjs)
            .unwrap();
        assert_eq!(bundler.inventory().entry(id).name(), "deep/relative");
    }

    #[test]
    fn test_amd_relative_resolves_against_root() {
        let dir = fixture();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let id = bundler
            .process_reference(&reference("./relative"), "deep/deeper", ResolutionMode::Amd)
            .unwrap();
        assert_eq!(bundler.inventory().entry(id).name(), "relative");
    }

    #[test]
    fn test_memoized_by_name() {
        let dir = fixture();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let first = bundler
            .process_reference(&reference("deep/relative"), "", ResolutionMode::Amd)
            .unwrap();
        let second = bundler
            .process_reference(&reference("./relative"), "deep", ResolutionMode::Cjs)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(bundler.inventory().len(), 1);
    }

    #[test]
    fn test_plugin_resource_keeps_extension() {
        let dir = fixture();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let id = bundler
            .process_reference(&reference("text!deep/template.html"), "", ResolutionMode::Amd)
            .unwrap();
        let module = bundler.inventory().module(id).unwrap();
        assert_eq!(module.name, "deep/template.html");
        assert!(module.tree.is_some());
    }

    #[test]
    fn test_missing_file_registered_once() {
        let dir = fixture();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let err = bundler
            .process_reference(&reference("nope"), "", ResolutionMode::Amd)
            .unwrap_err();
        assert!(matches!(err, AmdError::NotFound { .. }));
        assert!(err.is_recoverable());

        // the placeholder answers the second lookup
        let id = bundler
            .process_reference(&reference("nope"), "", ResolutionMode::Amd)
            .unwrap();
        assert!(bundler.inventory().module(id).unwrap().tree.is_none());
    }

    #[test]
    fn test_unsupported_plugin() {
        let dir = fixture();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let err = bundler
            .process_reference(&reference("i18n!deep/template.html"), "", ResolutionMode::Amd)
            .unwrap_err();
        assert!(matches!(err, AmdError::UnsupportedPlugin { .. }));
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let dir = fixture();
        fs::write(dir.path().join("broken.js"), "define(function () {").unwrap();
        let mut bundler = Bundler::new(Config::with_root(dir.path())).unwrap();
        let err = bundler
            .process_reference(&reference("broken"), "", ResolutionMode::Amd)
            .unwrap_err();
        assert!(matches!(err, AmdError::Parse(_)));
        assert!(!err.is_recoverable());
    }
}

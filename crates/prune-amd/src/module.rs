// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records and the module inventory.
//!
//! The inventory owns every [`Entry`] in an arena and maps the current name
//! of each entry to its [`EntryId`]. Ids never change, names may: renaming a
//! module re-keys it and leaves a [`ModuleAlias`] under the old name.

use indexmap::IndexMap;
use prune_syntax::ast::{NodeId, Program, SourceLocation};
use std::path::{Component, Path, PathBuf};

use crate::error::{AmdError, Result};

/// Index of an entry in the inventory arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

/// Where a module was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
    /// Absolute file path
    pub file: PathBuf,
    /// Directory containing the file
    pub dir: PathBuf,
}

/// A dependency edge recorded on a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedReference {
    /// The string literal naming the dependency
    pub site: NodeId,
    /// The entry it resolved to
    pub target: EntryId,
}

/// A module backed by a file.
#[derive(Debug, Clone)]
pub struct Module {
    /// Current module name
    pub name: String,
    /// Source location on disk
    pub path: ModulePath,
    /// Parsed tree, absent until the file has been read
    pub tree: Option<Program>,
    /// Dependencies in discovery order
    pub references: Vec<ResolvedReference>,
    /// The define call that names this module
    pub define: Option<NodeId>,
    /// Locations of anonymous define calls that are not the owning one
    pub stray_defines: Vec<SourceLocation>,
}

impl Module {
    /// Create a module for `file`, named relative to `base_dir`.
    ///
    /// The `.js` extension is dropped from the name unless `keep_extension`
    /// is set, which is the case for plugin resources.
    pub fn new(file: PathBuf, base_dir: &Path, keep_extension: bool) -> Self {
        let relative = relative_id(&file, base_dir);
        let name = match relative.strip_suffix(".js") {
            Some(stripped) if !keep_extension => stripped.to_string(),
            _ => relative,
        };
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            name,
            path: ModulePath { file, dir },
            tree: None,
            references: Vec::new(),
            define: None,
            stray_defines: Vec::new(),
        }
    }
}

/// Why an alias exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasOrigin {
    /// A second named define call in the target's file
    NamedDefine,
    /// The file-derived name of a module that was renamed
    Rename,
}

/// A name under which another module is also known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAlias {
    /// The alias name
    pub name: String,
    /// The module supplying the tree
    pub target: EntryId,
    /// Why the alias exists
    pub origin: AliasOrigin,
}

/// An inventory entry.
#[derive(Debug, Clone)]
pub enum Entry {
    /// A file-backed module
    Module(Module),
    /// An alternate name for a module
    Alias(ModuleAlias),
}

impl Entry {
    /// The entry's name.
    pub fn name(&self) -> &str {
        match self {
            Entry::Module(module) => &module.name,
            Entry::Alias(alias) => &alias.name,
        }
    }

    /// The module, unless this is an alias.
    pub fn as_module(&self) -> Option<&Module> {
        match self {
            Entry::Module(module) => Some(module),
            Entry::Alias(_) => None,
        }
    }

    /// Mutable access to the module, unless this is an alias.
    pub fn as_module_mut(&mut self) -> Option<&mut Module> {
        match self {
            Entry::Module(module) => Some(module),
            Entry::Alias(_) => None,
        }
    }
}

/// All modules and aliases discovered during one run.
#[derive(Debug, Default)]
pub struct Inventory {
    entries: Vec<Entry>,
    names: IndexMap<String, EntryId>,
}

impl Inventory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module under its own name. An existing key is overwritten in
    /// place.
    pub fn register_module(&mut self, module: Module) -> EntryId {
        let name = module.name.clone();
        let id = self.push(Entry::Module(module));
        self.names.insert(name, id);
        id
    }

    /// Add an alias for the module `target`.
    pub fn add_alias(&mut self, target: EntryId, name: &str, origin: AliasOrigin) -> Result<EntryId> {
        if self.entry(target).name() == name {
            return Err(AmdError::AliasNameClash(name.to_string()));
        }
        let id = self.push(Entry::Alias(ModuleAlias {
            name: name.to_string(),
            target,
            origin,
        }));
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Point `name` at `id`, returning the entry previously stored there.
    pub fn bind(&mut self, name: &str, id: EntryId) -> Option<EntryId> {
        self.names.insert(name.to_string(), id)
    }

    fn push(&mut self, entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len());
        self.entries.push(entry);
        id
    }

    /// Look up an entry by its current name.
    pub fn get(&self, name: &str) -> Option<EntryId> {
        self.names.get(name).copied()
    }

    /// The entry with id `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not issued by this inventory.
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// Mutable access to the entry with id `id`.
    pub fn entry_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.0]
    }

    /// The module with id `id`, if it is one.
    pub fn module(&self, id: EntryId) -> Option<&Module> {
        self.entry(id).as_module()
    }

    /// Mutable access to the module with id `id`, if it is one.
    pub fn module_mut(&mut self, id: EntryId) -> Option<&mut Module> {
        self.entry_mut(id).as_module_mut()
    }

    /// The module supplying the tree for `id`.
    pub fn resolve(&self, id: EntryId) -> EntryId {
        match self.entry(id) {
            Entry::Alias(alias) => alias.target,
            Entry::Module(_) => id,
        }
    }

    /// The name a reference to `id` should carry in the output.
    ///
    /// Aliases left behind by a rename are not defined anywhere, so such
    /// references use the target's name instead.
    pub fn reference_name(&self, id: EntryId) -> &str {
        match self.entry(id) {
            Entry::Alias(alias) if alias.origin == AliasOrigin::Rename => {
                self.entry(alias.target).name()
            }
            entry => entry.name(),
        }
    }

    /// Names and ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, EntryId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Every module in the arena, including ones no name points at any more.
    pub fn modules(&self) -> impl Iterator<Item = (EntryId, &Module)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_module().map(|module| (EntryId(index), module)))
    }

    /// Returns true if `id` is still stored under its own name.
    pub fn is_bound(&self, id: EntryId) -> bool {
        self.get(self.entry(id).name()) == Some(id)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Lexically collapse `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `file` relative to `base`, joined with `/`.
pub fn relative_id(file: &Path, base: &Path) -> String {
    let relative = pathdiff::diff_paths(file, base).unwrap_or_else(|| file.to_path_buf());
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(file: &str, keep_extension: bool) -> Module {
        Module::new(PathBuf::from(file), Path::new("/project/js"), keep_extension)
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module("/project/js/deep/main.js", false).name, "deep/main");
        assert_eq!(module("/project/js/deep/template.html", true).name, "deep/template.html");
        assert_eq!(module("/project/js/deep/plain.js", true).name, "deep/plain.js");
        assert_eq!(module("/project/js/main.js", false).path.dir, PathBuf::from("/project/js"));
    }

    #[test]
    fn test_register_and_lookup() {
        let mut inventory = Inventory::new();
        let a = inventory.register_module(module("/project/js/a.js", false));
        let b = inventory.register_module(module("/project/js/b.js", false));
        assert_eq!(inventory.get("a"), Some(a));
        assert_eq!(inventory.get("b"), Some(b));
        assert_eq!(inventory.get("c"), None);
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn test_alias() {
        let mut inventory = Inventory::new();
        let a = inventory.register_module(module("/project/js/a.js", false));
        let alias = inventory.add_alias(a, "named", AliasOrigin::NamedDefine).unwrap();
        assert_eq!(inventory.resolve(alias), a);
        assert_eq!(inventory.reference_name(alias), "named");
        assert!(matches!(
            inventory.add_alias(a, "a", AliasOrigin::NamedDefine),
            Err(AmdError::AliasNameClash(name)) if name == "a"
        ));
    }

    #[test]
    fn test_rebinding_keeps_position() {
        let mut inventory = Inventory::new();
        let a = inventory.register_module(module("/project/js/a.js", false));
        let b = inventory.register_module(module("/project/js/b.js", false));
        assert_eq!(inventory.bind("a", b), Some(a));
        let order: Vec<_> = inventory.iter().collect();
        assert_eq!(order, [("a", b), ("b", b)]);

        assert!(!inventory.is_bound(a));
        assert!(inventory.is_bound(b));
        let modules: Vec<_> = inventory.modules().map(|(id, _)| id).collect();
        assert_eq!(modules, [a, b]);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/project/js/deep/../relative.js")),
            PathBuf::from("/project/js/relative.js")
        );
        assert_eq!(normalize_path(Path::new("/a/./b")), PathBuf::from("/a/b"));
    }
}

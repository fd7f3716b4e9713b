// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module naming.
//!
//! A file may hold several `define()` calls. One of them owns the file and
//! decides the module's name; every other named call becomes an alias of the
//! module. Once every file is loaded, [`finalize`] writes the final names
//! back into the trees.

use prune_syntax::ast::{CallExpression, Expression, NodeId, StringLiteral};
use prune_syntax::visit::walk_expressions_mut;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::error::{AmdError, Result};
use crate::extract::{self, DefineCall};
use crate::module::{AliasOrigin, EntryId, Inventory};

/// Pick the define call that owns a module named `module_name`.
///
/// The first anonymous call wins, then the first call named after the
/// module, then the last call.
pub fn owning_define(module_name: &str, defines: &[DefineCall]) -> Option<usize> {
    if let Some(index) = defines.iter().position(|define| define.name.is_none()) {
        return Some(index);
    }
    if let Some(index) = defines
        .iter()
        .position(|define| define.name.as_deref() == Some(module_name))
    {
        return Some(index);
    }
    let last = defines.len().checked_sub(1)?;
    info!(
        "Module '{}' has no define call of its own name, using the last one ('{}')",
        module_name,
        defines[last].name.as_deref().unwrap_or_default()
    );
    Some(last)
}

/// Apply the define calls of module `id` to the inventory.
pub fn assign_defines(inventory: &mut Inventory, id: EntryId, defines: &[DefineCall]) -> Result<()> {
    let Some(module) = inventory.module(id) else {
        return Ok(());
    };
    let Some(owning) = owning_define(&module.name, defines) else {
        return Ok(());
    };

    let owner = &defines[owning];
    if let Some(name) = &owner.name {
        if *name != module.name {
            rename(inventory, id, name)?;
        }
    }

    let mut strays = Vec::new();
    for (index, define) in defines.iter().enumerate() {
        if index == owning {
            continue;
        }
        match &define.name {
            Some(name) => {
                if let Some(existing) = inventory.get(name) {
                    warn!(
                        "Define '{}' in module '{}' replaces existing entry '{}'",
                        name,
                        inventory.entry(id).name(),
                        inventory.entry(existing).name()
                    );
                }
                inventory.add_alias(id, name, AliasOrigin::NamedDefine)?;
            }
            None => strays.push(define.location.clone().unwrap_or_default()),
        }
    }

    if let Some(module) = inventory.module_mut(id) {
        module.define = Some(owner.id);
        module.stray_defines = strays;
    }
    Ok(())
}

/// Give module `id` the name `name`, leaving an alias under the old one.
pub fn rename(inventory: &mut Inventory, id: EntryId, name: &str) -> Result<()> {
    let Some(module) = inventory.module_mut(id) else {
        return Ok(());
    };
    let old = std::mem::replace(&mut module.name, name.to_string());
    info!("Module '{}' is renamed to '{}' as named by its define call", old, name);

    if let Some(previous) = inventory.bind(name, id) {
        if previous != id {
            warn!("Module '{}' overwrites existing entry '{}'", old, name);
        }
    }
    inventory.add_alias(id, &old, AliasOrigin::Rename)?;
    Ok(())
}

/// Write final names into every tree.
///
/// Owning define calls that are still anonymous are named after their
/// module and every reference literal takes its target's name. A loaded
/// module whose name now points at another entry is a fatal
/// `NameCollision`.
pub fn finalize(inventory: &mut Inventory) -> Result<()> {
    let modules: Vec<EntryId> = inventory.modules().map(|(id, _)| id).collect();

    for id in modules {
        let Some(module) = inventory.module(id) else {
            continue;
        };
        if module.tree.is_none() {
            continue;
        }
        let key = module.name.clone();
        if !inventory.is_bound(id) {
            return Err(AmdError::NameCollision {
                name: key,
                path: module.path.file.clone(),
            });
        }
        if let Some(location) = module.stray_defines.first() {
            return Err(AmdError::AnonymousDefine {
                module: key,
                location: location.to_string(),
            });
        }

        let names: FxHashMap<NodeId, String> = module
            .references
            .iter()
            .map(|reference| {
                (
                    reference.site,
                    inventory.reference_name(reference.target).to_string(),
                )
            })
            .collect();
        let define = module.define;

        let Some(tree) = inventory.module_mut(id).and_then(|module| module.tree.as_mut()) else {
            continue;
        };

        let mut failure = None;
        walk_expressions_mut(tree, |expression| {
            if let Expression::Call(call) = expression {
                if Some(call.id) == define && extract::define_name(call).is_none() {
                    if let Err(err) = name_define(call, &key) {
                        failure.get_or_insert(err);
                    }
                }
            } else if let Some(literal) = expression.as_string_literal_mut() {
                if let Some(name) = names.get(&literal.id) {
                    literal.set_value(name.as_str());
                }
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
    }
    Ok(())
}

/// Make `name` the first argument of a define call.
///
/// A string literal already in that position takes the new value.
pub fn name_define(call: &mut CallExpression, name: &str) -> Result<()> {
    if let Some(literal) = call.arguments.first_mut().and_then(Expression::as_string_literal_mut) {
        literal.set_value(name);
        return Ok(());
    }
    if call.arguments.len() >= 3 {
        return Err(AmdError::MalformedDefine {
            module: name.to_string(),
        });
    }
    let mut literal = StringLiteral::new(name);
    literal.set_value(name);
    call.arguments
        .insert(0, Expression::Literal(prune_syntax::ast::Literal::String(literal)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::define_calls;
    use crate::module::Module;
    use prune_syntax::codegen::{GeneratorOptions, generate};
    use std::path::{Path, PathBuf};

    fn defines(source: &str) -> Vec<DefineCall> {
        define_calls(&prune_syntax::parse(source, None).unwrap())
    }

    fn inventory_with(name: &str, source: &str) -> (Inventory, EntryId) {
        let mut inventory = Inventory::new();
        let mut module = Module::new(
            PathBuf::from(format!("/js/{}.js", name)),
            Path::new("/js"),
            false,
        );
        module.tree = Some(prune_syntax::parse(source, None).unwrap());
        let id = inventory.register_module(module);
        (inventory, id)
    }

    #[test]
    fn test_owning_define_selection() {
        let calls = defines("define('x', f); define(f); define('m', f);");
        assert_eq!(owning_define("m", &calls), Some(1));

        let calls = defines("define('x', f); define('m', f); define('y', f);");
        assert_eq!(owning_define("m", &calls), Some(1));

        let calls = defines("define('x', f); define('y', f);");
        assert_eq!(owning_define("m", &calls), Some(1));

        assert_eq!(owning_define("m", &[]), None);
    }

    #[test]
    fn test_rename_leaves_alias() {
        let source = "define('namedmodule', f); define('deep/namedmodule', g);";
        let (mut inventory, id) = inventory_with("main", source);
        assign_defines(&mut inventory, id, &defines(source)).unwrap();

        assert_eq!(inventory.entry(id).name(), "deep/namedmodule");
        assert_eq!(inventory.get("deep/namedmodule"), Some(id));

        let old = inventory.get("main").unwrap();
        assert_eq!(inventory.resolve(old), id);
        assert_eq!(inventory.reference_name(old), "deep/namedmodule");

        let sibling = inventory.get("namedmodule").unwrap();
        assert_eq!(inventory.resolve(sibling), id);
        assert_eq!(inventory.reference_name(sibling), "namedmodule");
    }

    #[test]
    fn test_anonymous_define_is_named_after_key() {
        let source = "define(['dep'], function (dep) { return dep; });";
        let (mut inventory, id) = inventory_with("foo/bar", source);
        assign_defines(&mut inventory, id, &defines(source)).unwrap();
        finalize(&mut inventory).unwrap();

        let tree = inventory.module(id).unwrap().tree.as_ref().unwrap();
        assert_eq!(
            generate(tree, &GeneratorOptions::compact()),
            "define(\"foo/bar\",['dep'],function(dep){return dep;});"
        );
    }

    #[test]
    fn test_reference_literals_rewritten() {
        let source = "define(['./dep'], function (dep) {});";
        let (mut inventory, id) = inventory_with("a", source);
        let calls = defines(source);
        let dep = inventory.register_module(Module::new(PathBuf::from("/js/dep.js"), Path::new("/js"), false));
        inventory.module_mut(id).unwrap().references.push(crate::module::ResolvedReference {
            site: calls[0].references[0].site,
            target: dep,
        });
        assign_defines(&mut inventory, id, &calls).unwrap();
        rename(&mut inventory, dep, "lib/dep").unwrap();
        finalize(&mut inventory).unwrap();

        let tree = inventory.module(id).unwrap().tree.as_ref().unwrap();
        assert_eq!(
            generate(tree, &GeneratorOptions::compact()),
            "define(\"a\",[\"lib/dep\"],function(dep){});"
        );
    }

    #[test]
    fn test_stray_anonymous_define_is_fatal() {
        let source = "define(function () {}); define(function () {});";
        let (mut inventory, id) = inventory_with("a", source);
        assign_defines(&mut inventory, id, &defines(source)).unwrap();
        assert!(matches!(
            finalize(&mut inventory),
            Err(AmdError::AnonymousDefine { module, .. }) if module == "a"
        ));
    }

    #[test]
    fn test_shadowed_module_is_fatal() {
        let source = "define(function () {});";
        let (mut inventory, a) = inventory_with("a", source);
        assign_defines(&mut inventory, a, &defines(source)).unwrap();

        let other = "define('a', function () {});";
        let mut module = Module::new(PathBuf::from("/js/x.js"), Path::new("/js"), false);
        module.tree = Some(prune_syntax::parse(other, None).unwrap());
        let x = inventory.register_module(module);
        assign_defines(&mut inventory, x, &defines(other)).unwrap();

        assert!(matches!(
            finalize(&mut inventory),
            Err(AmdError::NameCollision { name, path }) if name == "a" && path == Path::new("/js/a.js")
        ));
    }

    #[test]
    fn test_name_define_argument_forms() {
        let mut program = prune_syntax::parse("define(a, b, c);", None).unwrap();
        let mut result = Ok(());
        walk_expressions_mut(&mut program, |expression| {
            if let Expression::Call(call) = expression {
                result = name_define(call, "m");
            }
        });
        assert!(matches!(result, Err(AmdError::MalformedDefine { .. })));

        let mut program = prune_syntax::parse("define('already', f);", None).unwrap();
        walk_expressions_mut(&mut program, |expression| {
            if let Expression::Call(call) = expression {
                name_define(call, "m").unwrap();
            }
        });
        assert_eq!(
            generate(&program, &GeneratorOptions::compact()),
            "define(\"m\",f);"
        );

        let mut program = prune_syntax::parse("define(f);", None).unwrap();
        walk_expressions_mut(&mut program, |expression| {
            if let Expression::Call(call) = expression {
                name_define(call, "m").unwrap();
            }
        });
        assert_eq!(
            generate(&program, &GeneratorOptions::compact()),
            "define(\"m\",f);"
        );
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Combining module trees into one program.

use prune_syntax::ast::Program;

use crate::module::{EntryId, Inventory};

/// Concatenate the statements of every module in `clusters` order.
///
/// Trees are moved out of the inventory, so a module listed twice is only
/// emitted once. Aliases and modules that were never read add nothing.
pub fn assemble(inventory: &mut Inventory, clusters: &[Vec<EntryId>]) -> Program {
    let mut body = Vec::new();
    for id in clusters.iter().flatten() {
        let tree = inventory.module_mut(*id).and_then(|module| module.tree.take());
        if let Some(tree) = tree {
            body.extend(tree.body);
        }
    }
    Program { body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{AliasOrigin, Module};
    use prune_syntax::codegen::{GeneratorOptions, generate};
    use std::path::{Path, PathBuf};

    fn module(name: &str, source: Option<&str>) -> Module {
        let mut module = Module::new(PathBuf::from(format!("/js/{}.js", name)), Path::new("/js"), false);
        module.tree = source.map(|source| prune_syntax::parse(source, None).unwrap());
        module
    }

    #[test]
    fn test_order_and_single_inclusion() {
        let mut inventory = Inventory::new();
        let a = inventory.register_module(module("a", Some("var a = 1; var a2 = 2;")));
        let b = inventory.register_module(module("b", Some("var b = 1;")));
        let missing = inventory.register_module(module("missing", None));
        let alias = inventory.add_alias(a, "named", AliasOrigin::NamedDefine).unwrap();

        let program = assemble(&mut inventory, &[vec![b], vec![missing], vec![a, alias], vec![b]]);
        assert_eq!(
            generate(&program, &GeneratorOptions::compact()),
            "var b=1;var a=1;var a2=2;"
        );
    }
}

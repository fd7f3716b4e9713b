// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Dependency graph over the inventory.

use crate::module::{EntryId, Inventory};
use crate::toposort::Relationship;

/// One relationship per inventory entry, in inventory order.
///
/// A module links to the targets of its references. An alias links to
/// everything its target links to, and to the target itself.
pub fn relationships(inventory: &Inventory) -> Vec<Relationship<EntryId>> {
    inventory
        .iter()
        .map(|(_, id)| {
            let target = inventory.resolve(id);
            let mut links: Vec<EntryId> = inventory
                .module(target)
                .map(|module| module.references.iter().map(|r| r.target).collect())
                .unwrap_or_default();
            if target != id {
                links.push(target);
            }
            Relationship::new(id, links)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{AliasOrigin, Module, ResolvedReference};
    use prune_syntax::ast::NodeId;
    use std::path::{Path, PathBuf};

    fn module(name: &str) -> Module {
        Module::new(PathBuf::from(format!("/js/{}.js", name)), Path::new("/js"), false)
    }

    #[test]
    fn test_module_and_alias_links() {
        let mut inventory = Inventory::new();
        let a = inventory.register_module(module("a"));
        let b = inventory.register_module(module("b"));
        inventory.module_mut(a).unwrap().references.push(ResolvedReference {
            site: NodeId(3),
            target: b,
        });
        let alias = inventory.add_alias(a, "named", AliasOrigin::NamedDefine).unwrap();

        let graph = relationships(&inventory);
        assert_eq!(
            graph,
            [
                Relationship::new(a, vec![b]),
                Relationship::leaf(b),
                Relationship::new(alias, vec![b, a]),
            ]
        );
    }
}

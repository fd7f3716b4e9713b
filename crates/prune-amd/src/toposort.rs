// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Dependency ordering with strongly connected components.
//!
//! [`toposort`] runs Tarjan's algorithm. Components come out in reverse
//! topological order: whatever a node links to is emitted before the node,
//! and nodes that link to each other share one component.
//!
//! ```rust
//! use prune_amd::toposort::{toposort, Relationship};
//!
//! let graph = [
//!     Relationship::new("app", vec!["lib", "util"]),
//!     Relationship::new("lib", vec!["util"]),
//! ];
//! assert_eq!(toposort(&graph), [vec!["util"], vec!["lib"], vec!["app"]]);
//! ```
//!
//! The recursion is as deep as the longest dependency chain.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// A node and the nodes it links to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship<T> {
    /// The node
    pub node: T,
    /// Nodes it depends on
    pub links: Vec<T>,
}

impl<T> Relationship<T> {
    /// Create a relationship
    pub fn new(node: T, links: Vec<T>) -> Self {
        Self { node, links }
    }

    /// A node without links
    pub fn leaf(node: T) -> Self {
        Self::new(node, Vec::new())
    }
}

/// Group `graph` into strongly connected components, dependencies first.
///
/// Nodes that only appear as links are included with no links of their own.
/// When a node has several relationships the last one is used. Members of a
/// component are listed in the order they left the stack.
pub fn toposort<T>(graph: &[Relationship<T>]) -> Vec<Vec<T>>
where
    T: Copy + Eq + Hash,
{
    let mut tarjan = Tarjan {
        links: graph
            .iter()
            .map(|relationship| (relationship.node, relationship.links.as_slice()))
            .collect(),
        index: 0,
        indices: FxHashMap::default(),
        lowlinks: FxHashMap::default(),
        stack: Vec::new(),
        on_stack: FxHashSet::default(),
        components: Vec::new(),
    };

    for relationship in graph {
        if !tarjan.indices.contains_key(&relationship.node) {
            tarjan.strongconnect(relationship.node);
        }
    }
    tarjan.components
}

struct Tarjan<'a, T> {
    links: FxHashMap<T, &'a [T]>,
    index: usize,
    indices: FxHashMap<T, usize>,
    lowlinks: FxHashMap<T, usize>,
    stack: Vec<T>,
    on_stack: FxHashSet<T>,
    components: Vec<Vec<T>>,
}

impl<T> Tarjan<'_, T>
where
    T: Copy + Eq + Hash,
{
    fn strongconnect(&mut self, node: T) {
        self.indices.insert(node, self.index);
        self.lowlinks.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let links = self.links.get(&node).copied().unwrap_or_default();
        for &link in links {
            if !self.indices.contains_key(&link) {
                self.strongconnect(link);
                let low = self.lowlinks[&node].min(self.lowlinks[&link]);
                self.lowlinks.insert(node, low);
            } else if self.on_stack.contains(&link) {
                let low = self.lowlinks[&node].min(self.indices[&link]);
                self.lowlinks.insert(node, low);
            }
        }

        if self.lowlinks[&node] == self.indices[&node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(&member);
                component.push(member);
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

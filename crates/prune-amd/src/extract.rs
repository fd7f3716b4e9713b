// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Locating `define()`/`require()` calls and the references they carry.
//!
//! Only string literals are references. Anything computed at runtime is
//! skipped silently, and URLs are left for the loader to fetch.

use prune_syntax::ast::{CallExpression, Expression, NodeId, Program, SourceLocation};
use prune_syntax::matcher::{Condition, NodePattern, find_all};
use tracing::debug;

use crate::uri::ResourceUri;

/// Dependency names the AMD loader provides itself.
const PSEUDO_DEPENDENCIES: [&str; 3] = ["require", "exports", "module"];

/// A candidate dependency found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The string literal the reference was read from
    pub site: NodeId,
    /// The parsed reference
    pub uri: ResourceUri,
}

/// How the arguments of a call list dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// `require(['a', 'b'], callback)`
    Amd,
    /// `require('a')`
    CommonJs,
}

impl CallStyle {
    /// Infer the style of a `require()` call from its first argument.
    pub fn of(call: &CallExpression) -> Self {
        match call.arguments.first() {
            Some(Expression::Literal(prune_syntax::ast::Literal::String(_))) => CallStyle::CommonJs,
            _ => CallStyle::Amd,
        }
    }
}

/// A `define()` call, detached from the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineCall {
    /// The call node
    pub id: NodeId,
    /// The module name given as first argument
    pub name: Option<String>,
    /// Where the call is
    pub location: Option<SourceLocation>,
    /// Its dependency list
    pub references: Vec<Reference>,
}

/// A `require()` call, detached from the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RequireCall {
    /// Argument convention
    pub style: CallStyle,
    /// Requested modules
    pub references: Vec<Reference>,
}

/// Every `define()` call of `program`, in source order.
pub fn define_calls(program: &Program) -> Vec<DefineCall> {
    calls_to(program, "define")
        .into_iter()
        .map(|call| DefineCall {
            id: call.id,
            name: define_name(call).map(str::to_string),
            location: call.loc.clone(),
            references: amd_references(call),
        })
        .collect()
}

/// Every `require()` call of `program`, in source order.
pub fn require_calls(program: &Program) -> Vec<RequireCall> {
    calls_to(program, "require")
        .into_iter()
        .map(|call| {
            let style = CallStyle::of(call);
            let references = match style {
                CallStyle::Amd => amd_references(call),
                CallStyle::CommonJs => commonjs_references(call),
            };
            RequireCall { style, references }
        })
        .collect()
}

fn calls_to<'a>(program: &'a Program, name: &str) -> Vec<&'a CallExpression> {
    find_all(program, &[vec![Condition::new(NodePattern::call_to(name))]])
        .into_iter()
        .filter_map(|node| node.as_call())
        .collect()
}

/// The module name a `define()` call gives itself.
pub fn define_name(call: &CallExpression) -> Option<&str> {
    call.arguments
        .first()
        .and_then(Expression::as_string_literal)
        .map(|literal| literal.value.as_str())
}

/// References listed in the dependency array of an AMD-style call.
///
/// The array is the first argument or, after a module name, the second.
pub fn amd_references(call: &CallExpression) -> Vec<Reference> {
    let array = call.arguments.iter().take(2).find_map(|argument| match argument {
        Expression::Array(array) => Some(array),
        _ => None,
    });
    let Some(array) = array else {
        return Vec::new();
    };

    array
        .elements
        .iter()
        .flatten()
        .filter_map(candidate)
        .collect()
}

/// The reference of a CommonJS-style `require('x')` call.
pub fn commonjs_references(call: &CallExpression) -> Vec<Reference> {
    call.arguments.first().and_then(candidate).into_iter().collect()
}

fn candidate(expression: &Expression) -> Option<Reference> {
    let literal = expression.as_string_literal()?;
    let uri = ResourceUri::parse(&literal.value);
    if uri.is_absolute() {
        return None;
    }
    if uri.plugins().is_empty() && PSEUDO_DEPENDENCIES.contains(&uri.resource()) {
        debug!("Skipping loader-provided dependency '{}'", uri);
        return None;
    }
    Some(Reference {
        site: literal.id,
        uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_syntax::parse;

    fn resources(references: &[Reference]) -> Vec<String> {
        references.iter().map(|r| r.uri.to_string()).collect()
    }

    #[test]
    fn test_anonymous_define() {
        let program = parse("define(['a', 'text!b.html', x, 'c'], function () {});", None).unwrap();
        let defines = define_calls(&program);
        assert_eq!(defines.len(), 1);
        assert_eq!(defines[0].name, None);
        assert_eq!(resources(&defines[0].references), ["a", "text!b.html", "c"]);
    }

    #[test]
    fn test_named_define() {
        let program = parse("define('lib/x', ['y'], function (y) {});", None).unwrap();
        let defines = define_calls(&program);
        assert_eq!(defines[0].name.as_deref(), Some("lib/x"));
        assert_eq!(resources(&defines[0].references), ["y"]);
    }

    #[test]
    fn test_define_without_dependencies() {
        let program = parse("define('named', function () { return 1; });", None).unwrap();
        let defines = define_calls(&program);
        assert_eq!(defines[0].name.as_deref(), Some("named"));
        assert!(defines[0].references.is_empty());
    }

    #[test]
    fn test_absolute_and_pseudo_dependencies_dropped() {
        let program = parse(
            "define(['//localhost/x', 'http://cdn/y', 'require', 'exports', 'module', 'z'], f);",
            None,
        )
        .unwrap();
        assert_eq!(resources(&define_calls(&program)[0].references), ["z"]);
    }

    #[test]
    fn test_require_styles() {
        let program = parse(
            "var a = require('a', 'ignored'); require(['b', prefix + 'c'], function (b) {}); require(name);",
            None,
        )
        .unwrap();
        let requires = require_calls(&program);
        assert_eq!(requires.len(), 3);
        assert_eq!(requires[0].style, CallStyle::CommonJs);
        assert_eq!(resources(&requires[0].references), ["a"]);
        assert_eq!(requires[1].style, CallStyle::Amd);
        assert_eq!(resources(&requires[1].references), ["b"]);
        assert!(requires[2].references.is_empty());
    }

    #[test]
    fn test_nested_calls_found() {
        let program = parse(
            "(function () { if (false) { x = require('deep/dynamic'); } define(function () { require('y'); }); })();",
            None,
        )
        .unwrap();
        let requires = require_calls(&program);
        assert_eq!(requires.len(), 2);
        assert_eq!(define_calls(&program).len(), 1);
    }

    #[test]
    fn test_sites_are_literal_ids() {
        let program = parse("require(['a']);", None).unwrap();
        let requires = require_calls(&program);
        assert!(!requires[0].references[0].site.is_synthetic());
    }
}

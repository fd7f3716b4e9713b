// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Declarative node matching.
//!
//! A query is a list of alternatives; each alternative is a list of
//! [`Condition`]s that must all hold. A condition constrains a node and,
//! optionally, its parent, the parent's parent and so on.
//!
//! ```rust
//! use prune_syntax::matcher::{find_all, Condition, NodeKind, NodePattern};
//!
//! let program = prune_syntax::parse("define(['a'], f); require('b');", None).unwrap();
//! let defines = find_all(
//!     &program,
//!     &[vec![Condition::new(NodePattern::call_to("define"))]],
//! );
//! assert_eq!(defines.len(), 1);
//!
//! let literals_in_arrays = find_all(
//!     &program,
//!     &[vec![Condition::new(NodePattern::kind(NodeKind::StringLiteral))
//!         .with_parent(Condition::new(NodePattern::kind(NodeKind::Array)))]],
//! );
//! assert_eq!(literals_in_arrays.len(), 1);
//! ```

use crate::ast::*;
use crate::visit::{Node, Visit, traverse};

/// The syntactic category of a node. Variants are named after the
/// statement or expression they stand for.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    VariableDeclaration,
    FunctionDeclaration,
    ExpressionStatement,
    Block,
    If,
    Switch,
    While,
    DoWhile,
    For,
    ForIn,
    Return,
    Break,
    Continue,
    Throw,
    Try,
    With,
    Labeled,
    Debugger,
    Empty,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    NullLiteral,
    RegExpLiteral,
    Identifier,
    This,
    Array,
    Object,
    Binary,
    Unary,
    Assignment,
    Call,
    Member,
    Conditional,
    Function,
    New,
    Update,
    Sequence,
}

impl NodeKind {
    /// The kind of `node`.
    pub fn of(node: Node<'_>) -> NodeKind {
        match node {
            Node::Statement(statement) => match statement {
                Statement::VariableDeclaration(_) => NodeKind::VariableDeclaration,
                Statement::FunctionDeclaration(_) => NodeKind::FunctionDeclaration,
                Statement::Expression(_) => NodeKind::ExpressionStatement,
                Statement::Block(_) => NodeKind::Block,
                Statement::If(_) => NodeKind::If,
                Statement::Switch(_) => NodeKind::Switch,
                Statement::While(_) => NodeKind::While,
                Statement::DoWhile(_) => NodeKind::DoWhile,
                Statement::For(_) => NodeKind::For,
                Statement::ForIn(_) => NodeKind::ForIn,
                Statement::Return(_) => NodeKind::Return,
                Statement::Break(_) => NodeKind::Break,
                Statement::Continue(_) => NodeKind::Continue,
                Statement::Throw(_) => NodeKind::Throw,
                Statement::Try(_) => NodeKind::Try,
                Statement::With(_) => NodeKind::With,
                Statement::Labeled(_) => NodeKind::Labeled,
                Statement::Debugger => NodeKind::Debugger,
                Statement::Empty => NodeKind::Empty,
            },
            Node::Expression(expression) => match expression {
                Expression::Literal(Literal::String(_)) => NodeKind::StringLiteral,
                Expression::Literal(Literal::Number(_)) => NodeKind::NumberLiteral,
                Expression::Literal(Literal::Boolean(_)) => NodeKind::BooleanLiteral,
                Expression::Literal(Literal::Null) => NodeKind::NullLiteral,
                Expression::Literal(Literal::RegExp { .. }) => NodeKind::RegExpLiteral,
                Expression::Identifier(_) => NodeKind::Identifier,
                Expression::This => NodeKind::This,
                Expression::Array(_) => NodeKind::Array,
                Expression::Object(_) => NodeKind::Object,
                Expression::Binary(_) => NodeKind::Binary,
                Expression::Unary(_) => NodeKind::Unary,
                Expression::Assignment(_) => NodeKind::Assignment,
                Expression::Call(_) => NodeKind::Call,
                Expression::Member(_) => NodeKind::Member,
                Expression::Conditional(_) => NodeKind::Conditional,
                Expression::Function(_) => NodeKind::Function,
                Expression::New(_) => NodeKind::New,
                Expression::Update(_) => NodeKind::Update,
                Expression::Sequence(_) => NodeKind::Sequence,
            },
        }
    }
}

/// Constraints on a single node. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePattern {
    /// Required kind
    pub kind: Option<NodeKind>,
    /// Required name of an identifier, function declaration or named
    /// function expression
    pub name: Option<String>,
    /// Required value of a string literal
    pub value: Option<String>,
    /// Pattern the callee of a call or `new` must satisfy
    pub callee: Option<Box<NodePattern>>,
}

impl NodePattern {
    /// A pattern matching every node.
    pub fn any() -> Self {
        Self::default()
    }

    /// A pattern matching nodes of `kind`.
    pub fn kind(kind: NodeKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// An identifier named `name`.
    pub fn identifier(name: &str) -> Self {
        Self::kind(NodeKind::Identifier).with_name(name)
    }

    /// A call whose callee is the identifier `name`.
    pub fn call_to(name: &str) -> Self {
        Self::kind(NodeKind::Call).with_callee(Self::identifier(name))
    }

    /// Adds a name constraint.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Adds a string value constraint.
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Adds a callee constraint.
    pub fn with_callee(mut self, callee: NodePattern) -> Self {
        self.callee = Some(Box::new(callee));
        self
    }

    /// Returns true if `node` satisfies every set field.
    pub fn matches(&self, node: Node<'_>) -> bool {
        if let Some(kind) = self.kind {
            if NodeKind::of(node) != kind {
                return false;
            }
        }

        if let Some(name) = &self.name {
            if node_name(node) != Some(name.as_str()) {
                return false;
            }
        }

        if let Some(value) = &self.value {
            match node.as_string_literal() {
                Some(literal) if &literal.value == value => {}
                _ => return false,
            }
        }

        if let Some(callee) = &self.callee {
            let target = match node {
                Node::Expression(Expression::Call(call)) => &call.callee,
                Node::Expression(Expression::New(new)) => &new.callee,
                _ => return false,
            };
            if !callee.matches(Node::Expression(target)) {
                return false;
            }
        }

        true
    }
}

fn node_name(node: Node<'_>) -> Option<&str> {
    match node {
        Node::Expression(Expression::Identifier(id)) => Some(&id.name),
        Node::Expression(Expression::Function(func)) => func.id.as_ref().map(|id| id.name.as_str()),
        Node::Statement(Statement::FunctionDeclaration(func)) => Some(&func.id.name),
        _ => None,
    }
}

/// A node pattern plus an optional constraint on the node's parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Constraint on the node itself
    pub node: NodePattern,
    /// Constraint on the direct parent, applied recursively upward
    pub parent: Option<Box<Condition>>,
}

impl Condition {
    /// A condition on the node alone.
    pub fn new(node: NodePattern) -> Self {
        Self { node, parent: None }
    }

    /// Adds a constraint on the parent.
    pub fn with_parent(mut self, parent: Condition) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Checks the condition against `node` whose ancestors are `ancestors`
    /// (outermost first).
    pub fn matches(&self, node: Node<'_>, ancestors: &[Node<'_>]) -> bool {
        if !self.node.matches(node) {
            return false;
        }
        match &self.parent {
            None => true,
            Some(parent) => match ancestors.split_last() {
                Some((direct, rest)) => parent.matches(*direct, rest),
                None => false,
            },
        }
    }
}

/// Collects, in pre-order, every node that satisfies at least one of the
/// alternatives. An alternative holds when all its conditions hold; an empty
/// alternative matches every node.
pub fn find_all<'a>(program: &'a Program, alternatives: &[Vec<Condition>]) -> Vec<Node<'a>> {
    let mut found = Vec::new();
    traverse(program, |node, ancestors| {
        let hit = alternatives.iter().any(|conditions| {
            conditions
                .iter()
                .all(|condition| condition.matches(node, ancestors))
        });
        if hit {
            found.push(node);
        }
        Visit::Continue
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_call_to_matches_only_named_callee() {
        let program = parse("define('a', []); obj.define(); require('b'); define();", None).unwrap();
        let found = find_all(&program, &[vec![Condition::new(NodePattern::call_to("define"))]]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|node| node.as_call().is_some()));
    }

    #[test]
    fn test_alternatives_are_or_conditions_are_and() {
        let program = parse("define(); require(); load();", None).unwrap();
        let either = find_all(
            &program,
            &[
                vec![Condition::new(NodePattern::call_to("define"))],
                vec![Condition::new(NodePattern::call_to("require"))],
            ],
        );
        assert_eq!(either.len(), 2);

        let both = find_all(
            &program,
            &[vec![
                Condition::new(NodePattern::call_to("define")),
                Condition::new(NodePattern::call_to("require")),
            ]],
        );
        assert!(both.is_empty());
    }

    #[test]
    fn test_parent_chain() {
        let program = parse("require(['a', 'b']); x = ['c']; require('d');", None).unwrap();
        let in_require_array = Condition::new(NodePattern::kind(NodeKind::StringLiteral)).with_parent(
            Condition::new(NodePattern::kind(NodeKind::Array))
                .with_parent(Condition::new(NodePattern::call_to("require"))),
        );
        let found = find_all(&program, &[vec![in_require_array]]);
        let values: Vec<_> = found
            .iter()
            .filter_map(|node| node.as_string_literal())
            .map(|literal| literal.value.as_str())
            .collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn test_value_and_any() {
        let program = parse("f('x', 'y');", None).unwrap();
        let found = find_all(
            &program,
            &[vec![Condition::new(NodePattern::any().with_value("y"))]],
        );
        assert_eq!(found.len(), 1);

        let everything = find_all(&program, &[vec![Condition::new(NodePattern::any())]]);
        // statement, call, callee, two literals
        assert_eq!(everything.len(), 5);
    }

    #[test]
    fn test_function_names() {
        let program = parse("function init() {} var f = function helper() {};", None).unwrap();
        let found = find_all(
            &program,
            &[
                vec![Condition::new(NodePattern::any().with_name("init"))],
                vec![Condition::new(NodePattern::kind(NodeKind::Function).with_name("helper"))],
            ],
        );
        assert_eq!(found.len(), 2);
    }
}

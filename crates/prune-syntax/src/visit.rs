// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tree traversal.
//!
//! [`traverse`] walks a [`Program`] depth-first in source order, handing the
//! callback each statement and expression together with the chain of its
//! ancestors. [`walk_expressions_mut`] is the mutable counterpart used by
//! rewriting passes.

use crate::ast::*;

/// A borrowed statement or expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// A statement
    Statement(&'a Statement),
    /// An expression
    Expression(&'a Expression),
}

impl<'a> Node<'a> {
    /// The call expression this node is, if any.
    pub fn as_call(self) -> Option<&'a CallExpression> {
        match self {
            Node::Expression(Expression::Call(call)) => Some(call),
            _ => None,
        }
    }

    /// The string literal this node is, if any.
    pub fn as_string_literal(self) -> Option<&'a StringLiteral> {
        match self {
            Node::Expression(expr) => expr.as_string_literal(),
            Node::Statement(_) => None,
        }
    }
}

/// What the traversal does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the node's children
    Continue,
    /// Do not descend into this node; siblings are still visited
    SkipChildren,
}

/// Visits every statement and expression of `program` in pre-order.
///
/// The second callback argument is the ancestor chain, outermost first;
/// its last element is the direct parent.
pub fn traverse<'a, F>(program: &'a Program, f: F)
where
    F: FnMut(Node<'a>, &[Node<'a>]) -> Visit,
{
    let mut walker = Walker {
        ancestors: Vec::new(),
        f,
    };
    walker.statements(&program.body);
}

struct Walker<'a, F> {
    ancestors: Vec<Node<'a>>,
    f: F,
}

impl<'a, F> Walker<'a, F>
where
    F: FnMut(Node<'a>, &[Node<'a>]) -> Visit,
{
    fn enter(&mut self, node: Node<'a>) -> bool {
        if (self.f)(node, &self.ancestors) == Visit::SkipChildren {
            return false;
        }
        self.ancestors.push(node);
        true
    }

    fn statements(&mut self, statements: &'a [Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &'a Statement) {
        if !self.enter(Node::Statement(statement)) {
            return;
        }

        match statement {
            Statement::VariableDeclaration(decl) => self.declaration(decl),
            Statement::FunctionDeclaration(func) => self.statements(&func.body),
            Statement::Expression(stmt) => self.expression(&stmt.expression),
            Statement::Block(block) => self.statements(&block.body),
            Statement::If(stmt) => {
                self.expression(&stmt.test);
                self.statement(&stmt.consequent);
                if let Some(alternate) = &stmt.alternate {
                    self.statement(alternate);
                }
            }
            Statement::Switch(stmt) => {
                self.expression(&stmt.discriminant);
                for case in &stmt.cases {
                    if let Some(test) = &case.test {
                        self.expression(test);
                    }
                    self.statements(&case.consequent);
                }
            }
            Statement::While(stmt) => {
                self.expression(&stmt.test);
                self.statement(&stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.statement(&stmt.body);
                self.expression(&stmt.test);
            }
            Statement::For(stmt) => {
                match &stmt.init {
                    Some(ForInit::Declaration(decl)) => self.declaration(decl),
                    Some(ForInit::Expression(expr)) => self.expression(expr),
                    None => {}
                }
                if let Some(test) = &stmt.test {
                    self.expression(test);
                }
                if let Some(update) = &stmt.update {
                    self.expression(update);
                }
                self.statement(&stmt.body);
            }
            Statement::ForIn(stmt) => {
                match &stmt.left {
                    ForInLeft::Declaration(decl) => self.declaration(decl),
                    ForInLeft::Expression(expr) => self.expression(expr),
                }
                self.expression(&stmt.right);
                self.statement(&stmt.body);
            }
            Statement::Return(stmt) => {
                if let Some(argument) = &stmt.argument {
                    self.expression(argument);
                }
            }
            Statement::Throw(stmt) => self.expression(&stmt.argument),
            Statement::Try(stmt) => {
                self.statements(&stmt.block.body);
                if let Some(handler) = &stmt.handler {
                    self.statements(&handler.body.body);
                }
                if let Some(finalizer) = &stmt.finalizer {
                    self.statements(&finalizer.body);
                }
            }
            Statement::With(stmt) => {
                self.expression(&stmt.object);
                self.statement(&stmt.body);
            }
            Statement::Labeled(stmt) => self.statement(&stmt.body),
            Statement::Break(_) | Statement::Continue(_) | Statement::Debugger | Statement::Empty => {}
        }

        self.ancestors.pop();
    }

    fn declaration(&mut self, decl: &'a VariableDeclaration) {
        for declarator in &decl.declarations {
            if let Some(init) = &declarator.init {
                self.expression(init);
            }
        }
    }

    fn expression(&mut self, expression: &'a Expression) {
        if !self.enter(Node::Expression(expression)) {
            return;
        }

        match expression {
            Expression::Literal(_) | Expression::Identifier(_) | Expression::This => {}
            Expression::Array(array) => {
                for element in array.elements.iter().flatten() {
                    self.expression(element);
                }
            }
            Expression::Object(object) => {
                for property in &object.properties {
                    self.expression(&property.value);
                }
            }
            Expression::Binary(bin) => {
                self.expression(&bin.left);
                self.expression(&bin.right);
            }
            Expression::Unary(unary) => self.expression(&unary.argument),
            Expression::Assignment(assign) => {
                self.expression(&assign.left);
                self.expression(&assign.right);
            }
            Expression::Call(call) => {
                self.expression(&call.callee);
                for argument in &call.arguments {
                    self.expression(argument);
                }
            }
            Expression::Member(member) => {
                self.expression(&member.object);
                if let MemberProperty::Expression(property) = &member.property {
                    self.expression(property);
                }
            }
            Expression::Conditional(cond) => {
                self.expression(&cond.test);
                self.expression(&cond.consequent);
                self.expression(&cond.alternate);
            }
            Expression::Function(func) => self.statements(&func.body),
            Expression::New(new) => {
                self.expression(&new.callee);
                for argument in &new.arguments {
                    self.expression(argument);
                }
            }
            Expression::Update(update) => self.expression(&update.argument),
            Expression::Sequence(seq) => {
                for expr in &seq.expressions {
                    self.expression(expr);
                }
            }
        }

        self.ancestors.pop();
    }
}

/// Calls `f` on every expression of `program`, parents before children.
///
/// Children are read after `f` returns, so a rewrite of a node is itself
/// walked.
pub fn walk_expressions_mut<F>(program: &mut Program, mut f: F)
where
    F: FnMut(&mut Expression),
{
    for statement in &mut program.body {
        statement_mut(statement, &mut f);
    }
}

fn statements_mut(statements: &mut [Statement], f: &mut dyn FnMut(&mut Expression)) {
    for statement in statements {
        statement_mut(statement, f);
    }
}

fn declaration_mut(decl: &mut VariableDeclaration, f: &mut dyn FnMut(&mut Expression)) {
    for declarator in &mut decl.declarations {
        if let Some(init) = &mut declarator.init {
            expression_mut(init, f);
        }
    }
}

fn statement_mut(statement: &mut Statement, f: &mut dyn FnMut(&mut Expression)) {
    match statement {
        Statement::VariableDeclaration(decl) => declaration_mut(decl, f),
        Statement::FunctionDeclaration(func) => statements_mut(&mut func.body, f),
        Statement::Expression(stmt) => expression_mut(&mut stmt.expression, f),
        Statement::Block(block) => statements_mut(&mut block.body, f),
        Statement::If(stmt) => {
            expression_mut(&mut stmt.test, f);
            statement_mut(&mut stmt.consequent, f);
            if let Some(alternate) = &mut stmt.alternate {
                statement_mut(alternate, f);
            }
        }
        Statement::Switch(stmt) => {
            expression_mut(&mut stmt.discriminant, f);
            for case in &mut stmt.cases {
                if let Some(test) = &mut case.test {
                    expression_mut(test, f);
                }
                statements_mut(&mut case.consequent, f);
            }
        }
        Statement::While(stmt) => {
            expression_mut(&mut stmt.test, f);
            statement_mut(&mut stmt.body, f);
        }
        Statement::DoWhile(stmt) => {
            statement_mut(&mut stmt.body, f);
            expression_mut(&mut stmt.test, f);
        }
        Statement::For(stmt) => {
            match &mut stmt.init {
                Some(ForInit::Declaration(decl)) => declaration_mut(decl, f),
                Some(ForInit::Expression(expr)) => expression_mut(expr, f),
                None => {}
            }
            if let Some(test) = &mut stmt.test {
                expression_mut(test, f);
            }
            if let Some(update) = &mut stmt.update {
                expression_mut(update, f);
            }
            statement_mut(&mut stmt.body, f);
        }
        Statement::ForIn(stmt) => {
            match &mut stmt.left {
                ForInLeft::Declaration(decl) => declaration_mut(decl, f),
                ForInLeft::Expression(expr) => expression_mut(expr, f),
            }
            expression_mut(&mut stmt.right, f);
            statement_mut(&mut stmt.body, f);
        }
        Statement::Return(stmt) => {
            if let Some(argument) = &mut stmt.argument {
                expression_mut(argument, f);
            }
        }
        Statement::Throw(stmt) => expression_mut(&mut stmt.argument, f),
        Statement::Try(stmt) => {
            statements_mut(&mut stmt.block.body, f);
            if let Some(handler) = &mut stmt.handler {
                statements_mut(&mut handler.body.body, f);
            }
            if let Some(finalizer) = &mut stmt.finalizer {
                statements_mut(&mut finalizer.body, f);
            }
        }
        Statement::With(stmt) => {
            expression_mut(&mut stmt.object, f);
            statement_mut(&mut stmt.body, f);
        }
        Statement::Labeled(stmt) => statement_mut(&mut stmt.body, f),
        Statement::Break(_) | Statement::Continue(_) | Statement::Debugger | Statement::Empty => {}
    }
}

fn expression_mut(expression: &mut Expression, f: &mut dyn FnMut(&mut Expression)) {
    f(expression);

    match expression {
        Expression::Literal(_) | Expression::Identifier(_) | Expression::This => {}
        Expression::Array(array) => {
            for element in array.elements.iter_mut().flatten() {
                expression_mut(element, f);
            }
        }
        Expression::Object(object) => {
            for property in &mut object.properties {
                expression_mut(&mut property.value, f);
            }
        }
        Expression::Binary(bin) => {
            expression_mut(&mut bin.left, f);
            expression_mut(&mut bin.right, f);
        }
        Expression::Unary(unary) => expression_mut(&mut unary.argument, f),
        Expression::Assignment(assign) => {
            expression_mut(&mut assign.left, f);
            expression_mut(&mut assign.right, f);
        }
        Expression::Call(call) => {
            expression_mut(&mut call.callee, f);
            for argument in &mut call.arguments {
                expression_mut(argument, f);
            }
        }
        Expression::Member(member) => {
            expression_mut(&mut member.object, f);
            if let MemberProperty::Expression(property) = &mut member.property {
                expression_mut(property, f);
            }
        }
        Expression::Conditional(cond) => {
            expression_mut(&mut cond.test, f);
            expression_mut(&mut cond.consequent, f);
            expression_mut(&mut cond.alternate, f);
        }
        Expression::Function(func) => statements_mut(&mut func.body, f),
        Expression::New(new) => {
            expression_mut(&mut new.callee, f);
            for argument in &mut new.arguments {
                expression_mut(argument, f);
            }
        }
        Expression::Update(update) => expression_mut(&mut update.argument, f),
        Expression::Sequence(seq) => {
            for expr in &mut seq.expressions {
                expression_mut(expr, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn call_names(program: &Program) -> Vec<String> {
        let mut names = Vec::new();
        traverse(program, |node, _| {
            if let Some(call) = node.as_call() {
                if let Expression::Identifier(id) = &*call.callee {
                    names.push(id.name.clone());
                }
            }
            Visit::Continue
        });
        names
    }

    #[test]
    fn test_preorder_reaches_nested_functions() {
        let program = parse(
            "define(function () { if (x) { require('a'); } return function () { load(); }; });",
            None,
        )
        .unwrap();
        assert_eq!(call_names(&program), ["define", "require", "load"]);
    }

    #[test]
    fn test_skip_children_prunes_only_that_subtree() {
        let program = parse("outer(inner()); after();", None).unwrap();
        let mut seen = Vec::new();
        traverse(&program, |node, _| {
            if let Some(call) = node.as_call() {
                if let Expression::Identifier(id) = &*call.callee {
                    seen.push(id.name.clone());
                    if id.name == "outer" {
                        return Visit::SkipChildren;
                    }
                }
            }
            Visit::Continue
        });
        assert_eq!(seen, ["outer", "after"]);
    }

    #[test]
    fn test_ancestors_end_with_parent() {
        let program = parse("require(['a']);", None).unwrap();
        let mut parent_of_literal = None;
        traverse(&program, |node, ancestors| {
            if node.as_string_literal().is_some() {
                parent_of_literal = ancestors.last().copied();
                assert!(ancestors.len() >= 3);
            }
            Visit::Continue
        });
        assert!(matches!(
            parent_of_literal,
            Some(Node::Expression(Expression::Array(_)))
        ));
    }

    #[test]
    fn test_walk_expressions_mut_rewrites_literals() {
        let mut program = parse("var x = require('a'), y = ['a', 'b'];", None).unwrap();
        walk_expressions_mut(&mut program, |expr| {
            if let Some(literal) = expr.as_string_literal_mut() {
                if literal.value == "a" {
                    literal.set_value("lib/a");
                }
            }
        });
        let mut values = Vec::new();
        traverse(&program, |node, _| {
            if let Some(literal) = node.as_string_literal() {
                values.push((literal.value.clone(), literal.raw.clone()));
            }
            Visit::Continue
        });
        assert_eq!(
            values,
            [
                ("lib/a".to_string(), Some("\"lib/a\"".to_string())),
                ("lib/a".to_string(), Some("\"lib/a\"".to_string())),
                ("b".to_string(), Some("'b'".to_string())),
            ]
        );
    }
}

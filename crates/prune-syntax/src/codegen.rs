// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! JavaScript code generation.
//!
//! Turns a [`Program`] back into source text, either compact (no optional
//! whitespace) or pretty-printed. Parentheses are inserted from operator
//! precedence, never copied from the input.

use crate::ast::*;

/// How generated code is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Drop every optional space and line break
    pub compact: bool,
    /// Spaces per indentation level in pretty mode
    pub indent: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            compact: false,
            indent: 4,
        }
    }
}

impl GeneratorOptions {
    /// Options for minimal output.
    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Self::default()
        }
    }
}

/// Generates source text for `program`.
pub fn generate(program: &Program, options: &GeneratorOptions) -> String {
    let mut generator = Generator {
        out: String::new(),
        options,
        depth: 0,
    };
    for (index, statement) in program.body.iter().enumerate() {
        if index > 0 {
            generator.newline();
        }
        generator.statement(statement);
    }
    if !options.compact && !program.body.is_empty() {
        generator.out.push('\n');
    }
    generator.out
}

// Expression precedence levels, loosest first.
const SEQUENCE: u8 = 0;
const ASSIGNMENT: u8 = 1;
const CONDITIONAL: u8 = 2;
const UNARY: u8 = 13;
const POSTFIX: u8 = 14;
const CALL: u8 = 15;
const PRIMARY: u8 = 16;

fn binary_precedence(operator: BinaryOperator) -> u8 {
    CONDITIONAL + operator.precedence()
}

fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::Sequence(_) => SEQUENCE,
        Expression::Assignment(_) => ASSIGNMENT,
        Expression::Conditional(_) => CONDITIONAL,
        Expression::Binary(bin) => binary_precedence(bin.operator),
        Expression::Unary(_) => UNARY,
        Expression::Update(update) if update.prefix => UNARY,
        Expression::Update(_) => POSTFIX,
        Expression::Call(_) | Expression::Member(_) | Expression::New(_) => CALL,
        Expression::Literal(_)
        | Expression::Identifier(_)
        | Expression::This
        | Expression::Array(_)
        | Expression::Object(_)
        | Expression::Function(_) => PRIMARY,
    }
}

struct Generator<'o> {
    out: String,
    options: &'o GeneratorOptions,
    depth: usize,
}

impl Generator<'_> {
    /// Appends a token, separating it from the previous one when the two
    /// would otherwise lex differently.
    fn token(&mut self, text: &str) {
        if let (Some(last), Some(first)) = (self.out.chars().next_back(), text.chars().next()) {
            let merges = (is_word_char(last) && is_word_char(first))
                || (last == '+' && first == '+')
                || (last == '-' && first == '-')
                || (last == '/' && first == '/');
            if merges {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    fn space(&mut self) {
        if !self.options.compact {
            self.out.push(' ');
        }
    }

    fn newline(&mut self) {
        if !self.options.compact {
            self.out.push('\n');
            for _ in 0..self.depth * self.options.indent {
                self.out.push(' ');
            }
        }
    }

    fn comma(&mut self) {
        self.token(",");
        self.space();
    }

    /// `text` with spaces around it in pretty mode.
    fn infix(&mut self, text: &str) {
        self.space();
        self.token(text);
        self.space();
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VariableDeclaration(decl) => {
                self.declaration(decl, false);
                self.token(";");
            }
            Statement::FunctionDeclaration(func) => {
                self.token("function");
                self.out.push(' ');
                self.token(&func.id.name);
                self.function_rest(&func.params, &func.body);
            }
            Statement::Expression(stmt) => {
                if starts_ambiguously(&stmt.expression) {
                    self.token("(");
                    self.expression(&stmt.expression, SEQUENCE);
                    self.token(")");
                } else {
                    self.expression(&stmt.expression, SEQUENCE);
                }
                self.token(";");
            }
            Statement::Block(block) => self.block(&block.body),
            Statement::If(stmt) => {
                self.token("if");
                self.space();
                self.token("(");
                self.expression(&stmt.test, SEQUENCE);
                self.token(")");
                match &stmt.alternate {
                    Some(alternate) => {
                        // an `else` would bind to a nested if that lacks one
                        if ends_with_open_if(&stmt.consequent) {
                            self.space();
                            self.block(std::slice::from_ref(&*stmt.consequent));
                        } else {
                            self.body(&stmt.consequent);
                        }
                        self.space();
                        self.token("else");
                        if matches!(**alternate, Statement::If(_)) {
                            self.out.push(' ');
                            self.statement(alternate);
                        } else {
                            self.body(alternate);
                        }
                    }
                    None => self.body(&stmt.consequent),
                }
            }
            Statement::Switch(stmt) => {
                self.token("switch");
                self.space();
                self.token("(");
                self.expression(&stmt.discriminant, SEQUENCE);
                self.token(")");
                self.space();
                self.token("{");
                self.depth += 1;
                for case in &stmt.cases {
                    self.newline();
                    match &case.test {
                        Some(test) => {
                            self.token("case");
                            self.out.push(' ');
                            self.expression(test, SEQUENCE);
                        }
                        None => self.token("default"),
                    }
                    self.token(":");
                    self.depth += 1;
                    for statement in &case.consequent {
                        self.newline();
                        self.statement(statement);
                    }
                    self.depth -= 1;
                }
                self.depth -= 1;
                self.newline();
                self.token("}");
            }
            Statement::While(stmt) => {
                self.token("while");
                self.space();
                self.token("(");
                self.expression(&stmt.test, SEQUENCE);
                self.token(")");
                self.body(&stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.token("do");
                self.body(&stmt.body);
                self.space();
                self.token("while");
                self.space();
                self.token("(");
                self.expression(&stmt.test, SEQUENCE);
                self.token(")");
                self.token(";");
            }
            Statement::For(stmt) => {
                self.token("for");
                self.space();
                self.token("(");
                match &stmt.init {
                    Some(ForInit::Declaration(decl)) => self.declaration(decl, true),
                    Some(ForInit::Expression(expr)) => self.expression_no_in(expr, SEQUENCE),
                    None => {}
                }
                self.token(";");
                if let Some(test) = &stmt.test {
                    self.space();
                    self.expression(test, SEQUENCE);
                }
                self.token(";");
                if let Some(update) = &stmt.update {
                    self.space();
                    self.expression(update, SEQUENCE);
                }
                self.token(")");
                self.body(&stmt.body);
            }
            Statement::ForIn(stmt) => {
                self.token("for");
                self.space();
                self.token("(");
                match &stmt.left {
                    ForInLeft::Declaration(decl) => self.declaration(decl, true),
                    ForInLeft::Expression(expr) => self.expression(expr, CALL),
                }
                self.out.push(' ');
                self.token("in");
                self.out.push(' ');
                self.expression(&stmt.right, SEQUENCE);
                self.token(")");
                self.body(&stmt.body);
            }
            Statement::Return(stmt) => {
                self.token("return");
                if let Some(argument) = &stmt.argument {
                    self.space();
                    self.expression(argument, SEQUENCE);
                }
                self.token(";");
            }
            Statement::Break(label) => {
                self.token("break");
                if let Some(label) = label {
                    self.out.push(' ');
                    self.token(&label.name);
                }
                self.token(";");
            }
            Statement::Continue(label) => {
                self.token("continue");
                if let Some(label) = label {
                    self.out.push(' ');
                    self.token(&label.name);
                }
                self.token(";");
            }
            Statement::Throw(stmt) => {
                self.token("throw");
                self.space();
                self.expression(&stmt.argument, SEQUENCE);
                self.token(";");
            }
            Statement::Try(stmt) => {
                self.token("try");
                self.space();
                self.block(&stmt.block.body);
                if let Some(handler) = &stmt.handler {
                    self.space();
                    self.token("catch");
                    self.space();
                    self.token("(");
                    self.token(&handler.param.name);
                    self.token(")");
                    self.space();
                    self.block(&handler.body.body);
                }
                if let Some(finalizer) = &stmt.finalizer {
                    self.space();
                    self.token("finally");
                    self.space();
                    self.block(&finalizer.body);
                }
            }
            Statement::With(stmt) => {
                self.token("with");
                self.space();
                self.token("(");
                self.expression(&stmt.object, SEQUENCE);
                self.token(")");
                self.body(&stmt.body);
            }
            Statement::Labeled(stmt) => {
                self.token(&stmt.label.name);
                self.token(":");
                self.space();
                self.statement(&stmt.body);
            }
            Statement::Debugger => self.token("debugger;"),
            Statement::Empty => self.token(";"),
        }
    }

    /// The body of a compound statement.
    fn body(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => {
                self.space();
                self.block(&block.body);
            }
            Statement::Empty => self.token(";"),
            other => {
                self.space();
                self.statement(other);
            }
        }
    }

    fn block(&mut self, body: &[Statement]) {
        self.token("{");
        if body.is_empty() {
            self.token("}");
            return;
        }
        self.depth += 1;
        for statement in body {
            self.newline();
            self.statement(statement);
        }
        self.depth -= 1;
        self.newline();
        self.token("}");
    }

    fn declaration(&mut self, decl: &VariableDeclaration, no_in: bool) {
        self.token(decl.kind.as_str());
        self.out.push(' ');
        for (index, declarator) in decl.declarations.iter().enumerate() {
            if index > 0 {
                self.comma();
            }
            self.token(&declarator.id.name);
            if let Some(init) = &declarator.init {
                self.infix("=");
                if no_in {
                    self.expression_no_in(init, ASSIGNMENT);
                } else {
                    self.expression(init, ASSIGNMENT);
                }
            }
        }
    }

    fn function_rest(&mut self, params: &[Identifier], body: &[Statement]) {
        self.token("(");
        for (index, param) in params.iter().enumerate() {
            if index > 0 {
                self.comma();
            }
            self.token(&param.name);
        }
        self.token(")");
        self.space();
        self.block(body);
    }

    /// An expression inside a for-loop head, where a bare `in` would be
    /// read as a for-in.
    fn expression_no_in(&mut self, expr: &Expression, min: u8) {
        if contains_in(expr) {
            self.token("(");
            self.expression(expr, SEQUENCE);
            self.token(")");
        } else {
            self.expression(expr, min);
        }
    }

    fn expression(&mut self, expr: &Expression, min: u8) {
        if precedence(expr) < min {
            self.token("(");
            self.expression(expr, SEQUENCE);
            self.token(")");
            return;
        }

        match expr {
            Expression::Literal(literal) => self.literal(literal),
            Expression::Identifier(id) => self.token(&id.name),
            Expression::This => self.token("this"),
            Expression::Array(array) => {
                self.token("[");
                for (index, element) in array.elements.iter().enumerate() {
                    if index > 0 {
                        self.comma();
                    }
                    if let Some(element) = element {
                        self.expression(element, ASSIGNMENT);
                    }
                }
                if matches!(array.elements.last(), Some(None)) {
                    self.token(",");
                }
                self.token("]");
            }
            Expression::Object(object) => {
                self.token("{");
                for (index, property) in object.properties.iter().enumerate() {
                    if index > 0 {
                        self.comma();
                    }
                    self.property(property);
                }
                self.token("}");
            }
            Expression::Binary(bin) => {
                let level = binary_precedence(bin.operator);
                self.expression(&bin.left, level);
                let word = matches!(bin.operator, BinaryOperator::In | BinaryOperator::InstanceOf);
                if word {
                    self.out.push(' ');
                    self.token(bin.operator.as_str());
                    self.out.push(' ');
                } else {
                    self.infix(bin.operator.as_str());
                }
                self.expression(&bin.right, level + 1);
            }
            Expression::Unary(unary) => {
                self.token(unary.operator.as_str());
                if matches!(
                    unary.operator,
                    UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete
                ) {
                    self.space();
                }
                self.expression(&unary.argument, UNARY);
            }
            Expression::Assignment(assign) => {
                self.expression(&assign.left, CALL);
                self.infix(assign.operator.as_str());
                self.expression(&assign.right, ASSIGNMENT);
            }
            Expression::Call(call) => {
                self.expression(&call.callee, CALL);
                self.arguments(&call.arguments);
            }
            Expression::Member(member) => {
                if matches!(*member.object, Expression::Literal(Literal::Number(_))) {
                    self.token("(");
                    self.expression(&member.object, SEQUENCE);
                    self.token(")");
                } else {
                    self.expression(&member.object, CALL);
                }
                match &member.property {
                    MemberProperty::Identifier(name) => {
                        self.token(".");
                        self.token(&name.name);
                    }
                    MemberProperty::Expression(property) => {
                        self.token("[");
                        self.expression(property, SEQUENCE);
                        self.token("]");
                    }
                }
            }
            Expression::Conditional(cond) => {
                self.expression(&cond.test, CONDITIONAL + 1);
                self.infix("?");
                self.expression(&cond.consequent, ASSIGNMENT);
                self.infix(":");
                self.expression(&cond.alternate, ASSIGNMENT);
            }
            Expression::Function(func) => {
                self.token("function");
                match &func.id {
                    Some(id) => {
                        self.out.push(' ');
                        self.token(&id.name);
                    }
                    None => self.space(),
                }
                self.function_rest(&func.params, &func.body);
            }
            Expression::New(new) => {
                self.token("new");
                self.out.push(' ');
                // a call inside the callee would take over the argument list
                if contains_call(&new.callee) {
                    self.token("(");
                    self.expression(&new.callee, SEQUENCE);
                    self.token(")");
                } else {
                    self.expression(&new.callee, CALL);
                }
                self.arguments(&new.arguments);
            }
            Expression::Update(update) => {
                if update.prefix {
                    self.token(update.operator.as_str());
                    self.expression(&update.argument, UNARY);
                } else {
                    self.expression(&update.argument, CALL);
                    self.token(update.operator.as_str());
                }
            }
            Expression::Sequence(seq) => {
                for (index, expr) in seq.expressions.iter().enumerate() {
                    if index > 0 {
                        self.comma();
                    }
                    self.expression(expr, ASSIGNMENT);
                }
            }
        }
    }

    fn arguments(&mut self, arguments: &[Expression]) {
        self.token("(");
        for (index, argument) in arguments.iter().enumerate() {
            if index > 0 {
                self.comma();
            }
            self.expression(argument, ASSIGNMENT);
        }
        self.token(")");
    }

    fn property(&mut self, property: &Property) {
        match property.kind {
            PropertyKind::Init => {
                self.property_key(&property.key);
                self.token(":");
                self.space();
                self.expression(&property.value, ASSIGNMENT);
            }
            PropertyKind::Get | PropertyKind::Set => {
                self.token(if property.kind == PropertyKind::Get { "get" } else { "set" });
                self.out.push(' ');
                self.property_key(&property.key);
                if let Expression::Function(func) = &property.value {
                    self.function_rest(&func.params, &func.body);
                }
            }
        }
    }

    fn property_key(&mut self, key: &PropertyKey) {
        match key {
            PropertyKey::Identifier(id) => self.token(&id.name),
            PropertyKey::Literal(literal) => self.literal(literal),
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Number(number) => match &number.raw {
                Some(raw) => self.token(raw),
                None => self.token(&format_number(number.value)),
            },
            Literal::String(string) => match &string.raw {
                Some(raw) => self.token(raw),
                None => self.token(&quote(&string.value)),
            },
            Literal::Boolean(true) => self.token("true"),
            Literal::Boolean(false) => self.token("false"),
            Literal::Null => self.token("null"),
            Literal::RegExp { pattern, flags } => self.token(&format!("/{pattern}/{flags}")),
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\\' || !ch.is_ascii()
}

/// Whether an expression statement would start with `function` or `{`.
fn starts_ambiguously(expr: &Expression) -> bool {
    match expr {
        Expression::Function(_) | Expression::Object(_) => true,
        Expression::Call(call) => starts_ambiguously(&call.callee),
        Expression::Member(member) => starts_ambiguously(&member.object),
        Expression::Binary(bin) => starts_ambiguously(&bin.left),
        Expression::Assignment(assign) => starts_ambiguously(&assign.left),
        Expression::Conditional(cond) => starts_ambiguously(&cond.test),
        Expression::Sequence(seq) => seq.expressions.first().is_some_and(starts_ambiguously),
        Expression::Update(update) if !update.prefix => starts_ambiguously(&update.argument),
        _ => false,
    }
}

/// Whether `statement` ends with an `if` that has no `else`.
fn ends_with_open_if(statement: &Statement) -> bool {
    match statement {
        Statement::If(stmt) => match &stmt.alternate {
            None => true,
            Some(alternate) => ends_with_open_if(alternate),
        },
        Statement::While(stmt) => ends_with_open_if(&stmt.body),
        Statement::For(stmt) => ends_with_open_if(&stmt.body),
        Statement::ForIn(stmt) => ends_with_open_if(&stmt.body),
        Statement::With(stmt) => ends_with_open_if(&stmt.body),
        Statement::Labeled(stmt) => ends_with_open_if(&stmt.body),
        _ => false,
    }
}

/// Whether a call appears along the member chain of a `new` callee.
fn contains_call(expr: &Expression) -> bool {
    match expr {
        Expression::Call(_) => true,
        Expression::Member(member) => contains_call(&member.object),
        _ => false,
    }
}

/// Whether an unparenthesized `in` operator would be printed for `expr`.
fn contains_in(expr: &Expression) -> bool {
    match expr {
        Expression::Binary(bin) => {
            bin.operator == BinaryOperator::In || contains_in(&bin.left) || contains_in(&bin.right)
        }
        Expression::Assignment(assign) => contains_in(&assign.right),
        Expression::Conditional(cond) => {
            contains_in(&cond.test) || contains_in(&cond.consequent) || contains_in(&cond.alternate)
        }
        Expression::Sequence(seq) => seq.expressions.iter().any(contains_in),
        Expression::Unary(unary) => contains_in(&unary.argument),
        _ => false,
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        value.to_string()
    }
}

/// Double-quotes `value` as a JavaScript string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            ch if (ch as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", ch as u32)),
            ch => out.push(ch),
        }
    }
    out.push('"');
    out
}

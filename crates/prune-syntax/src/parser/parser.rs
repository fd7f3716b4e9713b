// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The main parser implementation.

use std::sync::Arc;

use crate::Error;
use crate::ast::*;
use crate::lexer::{LineIndex, Scanner, Span, Token, TokenKind};

/// A recursive descent parser for JavaScript.
pub struct Parser<'a> {
    source: &'a str,
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    lines: LineIndex,
    label: Option<Arc<str>>,
    next_id: u32,
    /// Set while parsing a for-loop initializer, where `in` ends the
    /// expression instead of being a relational operator.
    no_in: bool,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            source,
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
            lines: LineIndex::new(source),
            label: None,
            next_id: 0,
            no_in: false,
        }
    }

    /// Sets the label recorded in every source location, usually a path.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(Arc::from(label));
        self
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, Error> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(declaration))
            }
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                let label = self.parse_jump_label()?;
                Ok(Statement::Break(label))
            }
            TokenKind::Continue => {
                self.advance();
                let label = self.parse_jump_label()?;
                Ok(Statement::Continue(label))
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Debugger => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Debugger)
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Statement::Block(self.parse_block_body()?))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Label of a `break`/`continue`. A line break ends the statement.
    fn parse_jump_label(&mut self) -> Result<Option<Identifier>, Error> {
        let label = match &self.current.kind {
            TokenKind::Identifier(name) if !self.current.newline_before => {
                let label = Identifier::new(name.clone());
                self.advance();
                Some(label)
            }
            _ => None,
        };
        self.consume_semicolon()?;
        Ok(label)
    }

    fn parse_with_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'with'
        self.expect(&TokenKind::LeftParen)?;
        let object = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_statement()?;
        Ok(Statement::With(WithStatement {
            object,
            body: Box::new(body),
        }))
    }

    /// Parses `var`/`let`/`const` and its declarators, without the
    /// terminating semicolon.
    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, Error> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.error("Expected variable keyword")),
        };
        self.advance();

        let mut declarations = Vec::new();

        loop {
            let id = self.expect_identifier()?;
            let init = if self.check(&TokenKind::Equal) {
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };

            declarations.push(VariableDeclarator { id, init });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'function'

        let id = self.expect_identifier()?;
        let (params, body) = self.parse_function_rest()?;

        Ok(Statement::FunctionDeclaration(FunctionDeclaration { id, params, body }))
    }

    /// Parses `(params) { body }` of a function.
    fn parse_function_rest(&mut self) -> Result<(Vec<Identifier>, Vec<Statement>), Error> {
        self.allow_in(|p| {
            p.expect(&TokenKind::LeftParen)?;
            let params = p.parse_parameters()?;
            p.expect(&TokenKind::RightParen)?;
            p.expect(&TokenKind::LeftBrace)?;
            let body = p.parse_block_body()?.body;
            Ok((params, body))
        })
    }

    fn parse_parameters(&mut self) -> Result<Vec<Identifier>, Error> {
        let mut params = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }

        Ok(params)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'switch'
        self.expect(&TokenKind::LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::LeftBrace)?;

        let mut cases = Vec::new();
        let mut seen_default = false;

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let test = if self.check(&TokenKind::Case) {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::Colon)?;
                Some(expr)
            } else if self.check(&TokenKind::Default) {
                if seen_default {
                    return Err(self.error("More than one default clause in switch statement"));
                }
                seen_default = true;
                self.advance();
                self.expect(&TokenKind::Colon)?;
                None
            } else {
                return Err(self.error("Expected 'case' or 'default'"));
            };

            let mut consequent = Vec::new();
            while !self.check(&TokenKind::Case)
                && !self.check(&TokenKind::Default)
                && !self.check(&TokenKind::RightBrace)
                && !self.is_at_end()
            {
                consequent.push(self.parse_statement()?);
            }

            cases.push(SwitchCase { test, consequent });
        }

        self.expect(&TokenKind::RightBrace)?;

        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'do'
        let body = Box::new(self.parse_statement()?);
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        // the semicolon after do-while is always optional
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }

        Ok(Statement::DoWhile(DoWhileStatement { body, test }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if matches!(
            self.current.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let declaration = self.forbid_in(|p| p.parse_variable_declaration())?;

            if self.check(&TokenKind::In) {
                if declaration.declarations.len() != 1 {
                    return Err(self.error("Only one variable may be declared in a for-in loop"));
                }
                return self.parse_for_in_rest(ForInLeft::Declaration(declaration));
            }

            Some(ForInit::Declaration(declaration))
        } else {
            let expr = self.forbid_in(|p| p.parse_expression())?;

            if self.check(&TokenKind::In) {
                if !is_assignment_target(&expr) {
                    return Err(self.error("Invalid left-hand side in for-in loop"));
                }
                return self.parse_for_in_rest(ForInLeft::Expression(expr));
            }

            Some(ForInit::Expression(expr))
        };

        self.expect(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_for_in_rest(&mut self, left: ForInLeft) -> Result<Statement, Error> {
        self.advance(); // consume 'in'
        let right = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::ForIn(ForInStatement { left, right, body }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(self.error("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(ThrowStatement { argument }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'try'
        self.expect(&TokenKind::LeftBrace)?;
        let block = self.parse_block_body()?;

        let handler = if self.check(&TokenKind::Catch) {
            self.advance();
            self.expect(&TokenKind::LeftParen)?;
            let param = self.expect_identifier()?;
            self.expect(&TokenKind::RightParen)?;
            self.expect(&TokenKind::LeftBrace)?;
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.check(&TokenKind::Finally) {
            self.advance();
            self.expect(&TokenKind::LeftBrace)?;
            Some(self.parse_block_body()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Try statement must have catch or finally"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    /// Parses statements up to and including the closing `}`.
    fn parse_block_body(&mut self) -> Result<BlockStatement, Error> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(BlockStatement { body })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'return'
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::Return(ReturnStatement { argument }))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, Error> {
        // Check for labeled statement: identifier followed by colon
        if let TokenKind::Identifier(name) = &self.current.kind {
            if self.scanner.peek_token().kind == TokenKind::Colon {
                let label = Identifier::new(name.clone());
                self.advance(); // consume identifier
                self.advance(); // consume colon
                let body = self.parse_statement()?;
                return Ok(Statement::Labeled(LabeledStatement {
                    label,
                    body: Box::new(body),
                }));
            }
        }

        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Expression(ExpressionStatement { expression }))
    }

    /// Parses an expression, including the comma operator.
    pub fn parse_expression(&mut self) -> Result<Expression, Error> {
        let first = self.parse_assignment()?;

        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.check(&TokenKind::Comma) {
            self.advance();
            expressions.push(self.parse_assignment()?);
        }

        Ok(Expression::Sequence(SequenceExpression { expressions }))
    }

    fn parse_assignment(&mut self) -> Result<Expression, Error> {
        let expr = self.parse_conditional()?;

        let Some(operator) = assignment_operator(&self.current.kind) else {
            return Ok(expr);
        };

        if !is_assignment_target(&expr) {
            return Err(self.error("Invalid assignment target"));
        }

        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: Box::new(expr),
            right: Box::new(value),
        }))
    }

    /// Parse conditional (ternary) expression: test ? consequent : alternate
    fn parse_conditional(&mut self) -> Result<Expression, Error> {
        let test = self.parse_binary(0)?;

        if self.check(&TokenKind::Question) {
            self.advance(); // consume '?'
            let consequent = self.allow_in(|p| p.parse_assignment())?;
            self.expect(&TokenKind::Colon)?;
            let alternate = self.parse_assignment()?;

            return Ok(Expression::Conditional(ConditionalExpression {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            }));
        }

        Ok(test)
    }

    /// Precedence climbing over the binary operators binding tighter than
    /// `min_precedence`.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(operator) = binary_operator(&self.current.kind) else {
                break;
            };
            if operator == BinaryOperator::In && self.no_in {
                break;
            }
            let precedence = operator.precedence();
            if precedence <= min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence)?;
            left = Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        let update = match &self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOperator::Increment),
            TokenKind::MinusMinus => Some(UpdateOperator::Decrement),
            _ => None,
        };

        if let Some(operator) = update {
            self.advance();
            let argument = self.parse_unary()?;
            if !is_assignment_target(&argument) {
                return Err(self.error("Invalid left-hand side in prefix operation"));
            }
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(argument),
                prefix: true,
            }));
        }

        let operator = match &self.current.kind {
            TokenKind::Bang => Some(UnaryOperator::LogicalNot),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Typeof => Some(UnaryOperator::Typeof),
            TokenKind::Void => Some(UnaryOperator::Void),
            TokenKind::Delete => Some(UnaryOperator::Delete),
            TokenKind::Tilde => Some(UnaryOperator::BitwiseNot),
            _ => None,
        };

        if let Some(op) = operator {
            self.advance();
            let argument = self.parse_unary()?;
            return Ok(Expression::Unary(UnaryExpression {
                operator: op,
                argument: Box::new(argument),
            }));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, Error> {
        let expr = self.parse_call()?;

        // a line break before ++/-- makes it a prefix of the next statement
        if self.current.newline_before {
            return Ok(expr);
        }

        let operator = match &self.current.kind {
            TokenKind::PlusPlus => UpdateOperator::Increment,
            TokenKind::MinusMinus => UpdateOperator::Decrement,
            _ => return Ok(expr),
        };

        if !is_assignment_target(&expr) {
            return Err(self.error("Invalid left-hand side in postfix operation"));
        }

        self.advance();
        Ok(Expression::Update(UpdateExpression {
            operator,
            argument: Box::new(expr),
            prefix: false,
        }))
    }

    /// Parses member accesses and calls.
    fn parse_call(&mut self) -> Result<Expression, Error> {
        let start = self.current.span.start;
        let mut expr = self.parse_member_or_new()?;

        loop {
            if self.check(&TokenKind::LeftParen) {
                let arguments = self.parse_arguments()?;
                let id = self.next_id();
                let loc = self.location(start, self.previous.span.end);
                expr = Expression::Call(CallExpression {
                    id,
                    callee: Box::new(expr),
                    arguments,
                    loc: Some(loc),
                });
            } else if let Some(property) = self.parse_member_property()? {
                expr = Expression::Member(MemberExpression {
                    object: Box::new(expr),
                    property,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parses a member expression, where `new` takes the first argument
    /// list it meets.
    fn parse_member_or_new(&mut self) -> Result<Expression, Error> {
        let mut expr = if self.check(&TokenKind::New) {
            self.advance(); // consume 'new'
            let callee = Box::new(self.parse_member_or_new()?);

            // Arguments are optional with 'new'
            let arguments = if self.check(&TokenKind::LeftParen) {
                self.parse_arguments()?
            } else {
                vec![]
            };

            Expression::New(NewExpression { callee, arguments })
        } else {
            self.parse_primary()?
        };

        while let Some(property) = self.parse_member_property()? {
            expr = Expression::Member(MemberExpression {
                object: Box::new(expr),
                property,
            });
        }

        Ok(expr)
    }

    /// Parses `.name` or `[expr]` if the current token starts one.
    fn parse_member_property(&mut self) -> Result<Option<MemberProperty>, Error> {
        if self.check(&TokenKind::Dot) {
            self.advance();
            let name = self.expect_property_name()?;
            Ok(Some(MemberProperty::Identifier(name)))
        } else if self.check(&TokenKind::LeftBracket) {
            self.advance();
            let property = self.allow_in(|p| p.parse_expression())?;
            self.expect(&TokenKind::RightBracket)?;
            Ok(Some(MemberProperty::Expression(Box::new(property))))
        } else {
            Ok(None)
        }
    }

    /// Parses `( args )`.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, Error> {
        self.expect(&TokenKind::LeftParen)?;
        self.allow_in(|p| {
            let mut args = Vec::new();

            if !p.check(&TokenKind::RightParen) {
                loop {
                    args.push(p.parse_assignment()?);
                    if !p.check(&TokenKind::Comma) {
                        break;
                    }
                    p.advance();
                }
            }

            p.expect(&TokenKind::RightParen)?;
            Ok(args)
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        if matches!(self.current.kind, TokenKind::Slash | TokenKind::SlashEqual) {
            self.current = self
                .scanner
                .rescan_regex(self.current.span.start, self.current.newline_before);
        }

        match &self.current.kind {
            TokenKind::Number(_) | TokenKind::String(_) => {
                let literal = self.parse_literal()?;
                Ok(Expression::Literal(literal))
            }
            TokenKind::RegExp { pattern, flags } => {
                let literal = Literal::RegExp {
                    pattern: pattern.clone(),
                    flags: flags.clone(),
                };
                self.advance();
                Ok(Expression::Literal(literal))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Literal(Literal::Null))
            }
            TokenKind::Identifier(name) => {
                let id = Identifier::new(name.clone());
                self.advance();
                Ok(Expression::Identifier(id))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expression::This)
            }
            TokenKind::Function => self.parse_function_expression(),
            TokenKind::LeftParen => {
                self.advance(); // consume '('
                let expr = self.allow_in(|p| p.parse_expression())?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            _ => Err(self.unexpected()),
        }
    }

    /// Parses a number or string literal token.
    fn parse_literal(&mut self) -> Result<Literal, Error> {
        let span = self.current.span;
        let raw = self.source[span.start..span.end].to_string();
        let literal = match &self.current.kind {
            TokenKind::Number(value) => Literal::Number(NumberLiteral {
                value: *value,
                raw: Some(raw),
            }),
            TokenKind::String(value) => {
                let value = value.clone();
                let id = self.next_id();
                Literal::String(StringLiteral {
                    id,
                    value,
                    raw: Some(raw),
                    loc: Some(self.location(span.start, span.end)),
                })
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(literal)
    }

    fn parse_function_expression(&mut self) -> Result<Expression, Error> {
        self.advance(); // consume 'function'

        // Optional function name
        let id = if let TokenKind::Identifier(name) = &self.current.kind {
            let id = Identifier::new(name.clone());
            self.advance();
            Some(id)
        } else {
            None
        };

        let (params, body) = self.parse_function_rest()?;

        Ok(Expression::Function(FunctionExpression { id, params, body }))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, Error> {
        self.advance(); // consume '['
        let elements = self.allow_in(|p| {
            let mut elements = Vec::new();

            while !p.check(&TokenKind::RightBracket) && !p.is_at_end() {
                if p.check(&TokenKind::Comma) {
                    p.advance();
                    elements.push(None); // Hole in array
                    continue;
                }

                elements.push(Some(p.parse_assignment()?));

                if !p.check(&TokenKind::RightBracket) {
                    p.expect(&TokenKind::Comma)?;
                }
            }

            p.expect(&TokenKind::RightBracket)?;
            Ok(elements)
        })?;

        Ok(Expression::Array(ArrayExpression { elements }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, Error> {
        self.advance(); // consume '{'
        let properties = self.allow_in(|p| {
            let mut properties = Vec::new();

            while !p.check(&TokenKind::RightBrace) && !p.is_at_end() {
                properties.push(p.parse_property()?);

                if !p.check(&TokenKind::RightBrace) {
                    p.expect(&TokenKind::Comma)?;
                }
            }

            p.expect(&TokenKind::RightBrace)?;
            Ok(properties)
        })?;

        Ok(Expression::Object(ObjectExpression { properties }))
    }

    fn parse_property(&mut self) -> Result<Property, Error> {
        let accessor = match &self.current.kind {
            TokenKind::Identifier(name) if name == "get" => Some(PropertyKind::Get),
            TokenKind::Identifier(name) if name == "set" => Some(PropertyKind::Set),
            _ => None,
        };

        if let Some(kind) = accessor {
            let next = self.scanner.peek_token().kind;
            if !matches!(
                next,
                TokenKind::Colon | TokenKind::Comma | TokenKind::RightBrace
            ) {
                self.advance(); // consume 'get' / 'set'
                let key = self.parse_property_key()?;
                let (params, body) = self.parse_function_rest()?;
                let expected = if kind == PropertyKind::Get { 0 } else { 1 };
                if params.len() != expected {
                    return Err(self.error("Wrong number of accessor parameters"));
                }
                return Ok(Property {
                    key,
                    value: Expression::Function(FunctionExpression {
                        id: None,
                        params,
                        body,
                    }),
                    kind,
                });
            }
        }

        let key = self.parse_property_key()?;
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_assignment()?;

        Ok(Property {
            key,
            value,
            kind: PropertyKind::Init,
        })
    }

    fn parse_property_key(&mut self) -> Result<PropertyKey, Error> {
        match &self.current.kind {
            TokenKind::Number(_) | TokenKind::String(_) => {
                Ok(PropertyKey::Literal(self.parse_literal()?))
            }
            _ => Ok(PropertyKey::Identifier(self.expect_property_name()?)),
        }
    }

    // Helper methods

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.scanner.next_token());
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else if let TokenKind::Invalid(message) = self.current.kind {
            Err(self.error(message))
        } else {
            Err(self.error(format!(
                "Expected {:?}, found {}",
                kind,
                self.describe_current()
            )))
        }
    }

    /// Automatic semicolon insertion: an explicit `;`, or a `}`, the end of
    /// input or a line break before the current token.
    fn consume_semicolon(&mut self) -> Result<(), Error> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            Ok(())
        } else if self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier, Error> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let id = Identifier::new(name.clone());
            self.advance();
            Ok(id)
        } else {
            Err(self.error(format!(
                "Expected identifier, found {}",
                self.describe_current()
            )))
        }
    }

    /// An identifier or a reserved word, as allowed after `.` and as an
    /// object key.
    fn expect_property_name(&mut self) -> Result<Identifier, Error> {
        if self.current.kind.is_keyword() {
            let span = self.current.span;
            let id = Identifier::new(&self.source[span.start..span.end]);
            self.advance();
            Ok(id)
        } else {
            self.expect_identifier()
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn location(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation {
            source: self.label.clone(),
            start: self.lines.position(start),
            end: self.lines.position(end),
        }
    }

    fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn forbid_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        let saved = std::mem::replace(&mut self.no_in, true);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn describe_current(&self) -> String {
        match &self.current.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => {
                let span = self.current.span;
                format!("'{}'", &self.source[span.start..span.end])
            }
        }
    }

    fn unexpected(&self) -> Error {
        match self.current.kind {
            TokenKind::Invalid(message) => self.error(message),
            TokenKind::Eof => self.error("Unexpected end of input"),
            _ => self.error(format!("Unexpected token {}", self.describe_current())),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let span = self.current.span;
        Error::Syntax {
            message: message.into(),
            location: self.location(span.start, span.end),
        }
    }
}

fn is_assignment_target(expr: &Expression) -> bool {
    matches!(expr, Expression::Identifier(_) | Expression::Member(_))
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOperator> {
    let operator = match kind {
        TokenKind::Equal => AssignmentOperator::Assign,
        TokenKind::PlusEqual => AssignmentOperator::AddAssign,
        TokenKind::MinusEqual => AssignmentOperator::SubtractAssign,
        TokenKind::StarEqual => AssignmentOperator::MultiplyAssign,
        TokenKind::SlashEqual => AssignmentOperator::DivideAssign,
        TokenKind::PercentEqual => AssignmentOperator::ModuloAssign,
        TokenKind::LeftShiftEqual => AssignmentOperator::LeftShiftAssign,
        TokenKind::RightShiftEqual => AssignmentOperator::RightShiftAssign,
        TokenKind::UnsignedRightShiftEqual => AssignmentOperator::UnsignedRightShiftAssign,
        TokenKind::AmpersandEqual => AssignmentOperator::BitwiseAndAssign,
        TokenKind::PipeEqual => AssignmentOperator::BitwiseOrAssign,
        TokenKind::CaretEqual => AssignmentOperator::BitwiseXorAssign,
        _ => return None,
    };
    Some(operator)
}

fn binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    let operator = match kind {
        TokenKind::PipePipe => BinaryOperator::LogicalOr,
        TokenKind::AmpersandAmpersand => BinaryOperator::LogicalAnd,
        TokenKind::Pipe => BinaryOperator::BitwiseOr,
        TokenKind::Caret => BinaryOperator::BitwiseXor,
        TokenKind::Ampersand => BinaryOperator::BitwiseAnd,
        TokenKind::EqualEqual => BinaryOperator::Equal,
        TokenKind::NotEqual => BinaryOperator::NotEqual,
        TokenKind::StrictEqual => BinaryOperator::StrictEqual,
        TokenKind::StrictNotEqual => BinaryOperator::StrictNotEqual,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::LessThanEqual => BinaryOperator::LessThanEqual,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::GreaterThanEqual => BinaryOperator::GreaterThanEqual,
        TokenKind::In => BinaryOperator::In,
        TokenKind::Instanceof => BinaryOperator::InstanceOf,
        TokenKind::LeftShift => BinaryOperator::LeftShift,
        TokenKind::RightShift => BinaryOperator::RightShift,
        TokenKind::UnsignedRightShift => BinaryOperator::UnsignedRightShift,
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        _ => return None,
    };
    Some(operator)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes JavaScript source code.
///
/// The scanner is cheap to clone, which is how the parser peeks ahead.
/// Whether a `/` starts a division or a regular expression depends on the
/// grammar, so the scanner always produces [`TokenKind::Slash`] and the
/// parser asks for [`Scanner::rescan_regex`] when it expects an operand.
#[derive(Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        // a leading byte order mark is not part of the program
        let pos = if source.starts_with('\u{feff}') { 3 } else { 0 };
        Self { source, pos }
    }

    /// The source text being scanned.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = match self.skip_whitespace_and_comments() {
            Ok(newline) => newline,
            Err(start) => {
                return Token {
                    kind: TokenKind::Invalid("unterminated comment"),
                    span: Span::new(start, self.pos),
                    newline_before: false,
                };
            }
        };

        let start = self.pos;

        let Some(ch) = self.advance() else {
            return Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
                newline_before,
            };
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,

            '.' if matches!(self.peek(), Some('0'..='9')) => self.scan_number(ch),
            '.' => TokenKind::Dot,
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_with_equal(TokenKind::Star, TokenKind::StarEqual),
            '/' => self.scan_with_equal(TokenKind::Slash, TokenKind::SlashEqual),
            '%' => self.scan_with_equal(TokenKind::Percent, TokenKind::PercentEqual),
            '^' => self.scan_with_equal(TokenKind::Caret, TokenKind::CaretEqual),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_pipe(),

            '"' | '\'' => self.scan_string(ch),

            '0'..='9' => self.scan_number(ch),

            _ if is_id_start(ch) => self.scan_identifier(start),

            _ => TokenKind::Invalid("unexpected character"),
        };

        Token {
            kind,
            span: Span::new(start, self.pos),
            newline_before,
        }
    }

    /// Returns the token after the next one without consuming anything.
    pub fn peek_token(&self) -> Token {
        self.clone().next_token()
    }

    /// Re-reads the source starting at `start` (the offset of a `/` token)
    /// as a regular expression literal.
    pub fn rescan_regex(&mut self, start: usize, newline_before: bool) -> Token {
        self.pos = start + 1;
        let mut pattern = String::new();
        let mut in_class = false;

        let kind = loop {
            match self.advance() {
                None => break TokenKind::Invalid("unterminated regular expression"),
                Some(ch) if is_line_terminator(ch) => {
                    break TokenKind::Invalid("unterminated regular expression");
                }
                Some('\\') => {
                    pattern.push('\\');
                    match self.advance() {
                        Some(ch) if !is_line_terminator(ch) => pattern.push(ch),
                        _ => break TokenKind::Invalid("unterminated regular expression"),
                    }
                }
                Some('[') => {
                    in_class = true;
                    pattern.push('[');
                }
                Some(']') => {
                    in_class = false;
                    pattern.push(']');
                }
                Some('/') if !in_class => {
                    let mut flags = String::new();
                    while let Some(ch) = self.peek() {
                        if !is_id_continue(ch) {
                            break;
                        }
                        flags.push(ch);
                        self.advance();
                    }
                    break TokenKind::RegExp { pattern, flags };
                }
                Some(ch) => pattern.push(ch),
            }
        };

        Token {
            kind,
            span: Span::new(start, self.pos),
            newline_before,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and comments, reporting whether a line terminator
    /// was crossed on the way. A block comment without its closing `*/`
    /// yields the offset it started at.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, usize> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(ch) if is_line_terminator(ch) => {
                    newline = true;
                    self.advance();
                }
                Some(ch) if is_whitespace(ch) => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        let start = self.pos;
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        let mut closed = false;
                        while let Some(ch) = self.advance() {
                            if is_line_terminator(ch) {
                                newline = true;
                            }
                            if prev == '*' && ch == '/' {
                                closed = true;
                                break;
                            }
                            prev = ch;
                        }
                        if !closed {
                            return Err(start);
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(newline)
    }

    fn scan_with_equal(&mut self, plain: TokenKind, with_equal: TokenKind) -> TokenKind {
        if self.eat('=') { with_equal } else { plain }
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.eat('+') {
            TokenKind::PlusPlus
        } else if self.eat('=') {
            TokenKind::PlusEqual
        } else {
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.eat('-') {
            TokenKind::MinusMinus
        } else if self.eat('=') {
            TokenKind::MinusEqual
        } else {
            TokenKind::Minus
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.eat('<') {
            self.scan_with_equal(TokenKind::LeftShift, TokenKind::LeftShiftEqual)
        } else if self.eat('=') {
            TokenKind::LessThanEqual
        } else {
            TokenKind::LessThan
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.eat('>') {
            if self.eat('>') {
                self.scan_with_equal(
                    TokenKind::UnsignedRightShift,
                    TokenKind::UnsignedRightShiftEqual,
                )
            } else {
                self.scan_with_equal(TokenKind::RightShift, TokenKind::RightShiftEqual)
            }
        } else if self.eat('=') {
            TokenKind::GreaterThanEqual
        } else {
            TokenKind::GreaterThan
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.eat('=') {
            self.scan_with_equal(TokenKind::EqualEqual, TokenKind::StrictEqual)
        } else {
            TokenKind::Equal
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.eat('=') {
            self.scan_with_equal(TokenKind::NotEqual, TokenKind::StrictNotEqual)
        } else {
            TokenKind::Bang
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.eat('&') {
            TokenKind::AmpersandAmpersand
        } else {
            self.scan_with_equal(TokenKind::Ampersand, TokenKind::AmpersandEqual)
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.eat('|') {
            TokenKind::PipePipe
        } else {
            self.scan_with_equal(TokenKind::Pipe, TokenKind::PipeEqual)
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Invalid("unterminated string literal"),
                Some(ch) if ch == quote => break,
                Some(ch) if is_line_terminator(ch) => {
                    return TokenKind::Invalid("unterminated string literal");
                }
                Some('\\') => {
                    let Some(escaped) = self.advance() else {
                        return TokenKind::Invalid("unterminated string literal");
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' if !matches!(self.peek(), Some('0'..='9')) => value.push('\0'),
                        'x' => match self.scan_hex_escape(2) {
                            Some(ch) => value.push(ch),
                            None => return TokenKind::Invalid("malformed hexadecimal escape"),
                        },
                        'u' => match self.scan_hex_escape(4) {
                            Some(ch) => value.push(ch),
                            None => return TokenKind::Invalid("malformed unicode escape"),
                        },
                        // line continuation
                        '\r' => {
                            self.eat('\n');
                        }
                        ch if is_line_terminator(ch) => {}
                        other => value.push(other),
                    }
                }
                Some(ch) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Option<char> {
        let end = self.pos + digits;
        let hex = self.source.get(self.pos..end)?;
        let code = u32::from_str_radix(hex, 16).ok()?;
        self.pos = end;
        // lone surrogates cannot live in a Rust string
        Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let start = self.pos;
            while matches!(self.peek(), Some(ch) if ch.is_ascii_hexdigit()) {
                self.advance();
            }
            return match u64::from_str_radix(&self.source[start..self.pos], 16) {
                Ok(n) => TokenKind::Number(n as f64),
                Err(_) => TokenKind::Invalid("malformed hexadecimal literal"),
            };
        }

        let start = self.pos - first.len_utf8();

        if first != '.' {
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
            if self.peek() == Some('.') {
                self.advance();
            }
        }
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            if !matches!(self.peek(), Some('0'..='9')) {
                return TokenKind::Invalid("malformed exponent");
            }
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some(ch) if is_id_start(ch)) {
            return TokenKind::Invalid("identifier directly after number");
        }

        let text = &self.source[start..self.pos];

        // legacy octal: 0 followed only by octal digits
        if text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            if let Ok(n) = u64::from_str_radix(&text[1..], 8) {
                return TokenKind::Number(n as f64);
            }
        }

        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid("malformed number"),
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        let name = &self.source[start..self.pos];
        TokenKind::keyword(name).unwrap_or_else(|| TokenKind::Identifier(name.to_string()))
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_'
        || ch == '$'
        || ch == '\u{200c}'
        || ch == '\u{200d}'
        || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\u{b}' | '\u{c}' | '\u{a0}' | '\u{feff}'
    ) || (ch as u32 > 0x7f && ch.is_whitespace() && !is_line_terminator(ch))
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::new(src).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            kinds("{ } ( ) [ ] ;"),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let mut scanner = Scanner::new("42 3.14 0xff .5 1e3 017");
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 42.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 3.14));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 255.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 0.5));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 1000.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 15.0));
    }

    #[test]
    fn test_strings_and_escapes() {
        let mut scanner = Scanner::new(r#""hello" 'wo\'rld' "\x41B\n" 'a\
b'"#);
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "hello"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "wo'rld"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "AB\n"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "ab"));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(kinds("'abc")[0], TokenKind::Invalid(_)));
        assert!(matches!(kinds("'ab\nc'")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("function define $ _x"),
            vec![
                TokenKind::Function,
                TokenKind::Identifier("define".into()),
                TokenKind::Identifier("$".into()),
                TokenKind::Identifier("_x".into()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds(">>>= !== === ++ -= &&"),
            vec![
                TokenKind::UnsignedRightShiftEqual,
                TokenKind::StrictNotEqual,
                TokenKind::StrictEqual,
                TokenKind::PlusPlus,
                TokenKind::MinusEqual,
                TokenKind::AmpersandAmpersand,
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut scanner = Scanner::new("1 /* c */ 2 /* multi\nline */ 3 // tail\n4");
        let one = scanner.next_token();
        let two = scanner.next_token();
        let three = scanner.next_token();
        let four = scanner.next_token();
        assert!(!one.newline_before);
        assert!(!two.newline_before);
        assert!(three.newline_before);
        assert!(four.newline_before);
        assert!(matches!(four.kind, TokenKind::Number(n) if n == 4.0));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut scanner = Scanner::new("1 /* open");
        scanner.next_token();
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Invalid("unterminated comment"));
        assert_eq!(token.span, Span::new(2, 9));

        // `/*/` does not close itself
        assert!(matches!(kinds("/*/")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_division_vs_regex() {
        let mut scanner = Scanner::new("a / b");
        scanner.next_token();
        assert_eq!(scanner.next_token().kind, TokenKind::Slash);

        let mut scanner = Scanner::new("/ab+[/]c/gi.test(x)");
        let slash = scanner.next_token();
        assert_eq!(slash.kind, TokenKind::Slash);
        let regex = scanner.rescan_regex(slash.span.start, slash.newline_before);
        assert_eq!(
            regex.kind,
            TokenKind::RegExp {
                pattern: "ab+[/]c".into(),
                flags: "gi".into()
            }
        );
        assert_eq!(scanner.next_token().kind, TokenKind::Dot);
    }

    #[test]
    fn test_peek_token_does_not_consume() {
        let mut scanner = Scanner::new("label: x");
        scanner.next_token();
        assert_eq!(scanner.peek_token().kind, TokenKind::Colon);
        assert_eq!(scanner.next_token().kind, TokenKind::Colon);
    }
}

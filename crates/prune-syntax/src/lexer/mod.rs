// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical analysis (tokenization) for JavaScript source code.
//!
//! The lexer transforms JavaScript source text into a stream of tokens
//! that can be consumed by the parser.
//!
//! ## Structure
//!
//! - `scanner.rs` - Main `Scanner` struct that produces tokens
//! - `token.rs` - `Token` and `TokenKind` definitions
//! - `lines.rs` - `LineIndex`, mapping byte offsets to line/column pairs
//!
//! ## Usage
//!
//! ```rust
//! use prune_syntax::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("define(['a'], function (a) {});");
//!
//! loop {
//!     let token = scanner.next_token();
//!     if matches!(token.kind, TokenKind::Eof) {
//!         break;
//!     }
//!     println!("{:?}", token.kind);
//! }
//! ```

mod lines;
mod scanner;
mod token;

pub use lines::LineIndex;
pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};

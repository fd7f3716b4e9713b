// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # prune-syntax
//!
//! The JavaScript front and back end used by `prune`.
//!
//! ## Overview
//!
//! - [`lexer`] and [`parser`] turn ES5 source into an [`ast::Program`]
//! - [`visit`] walks a tree, [`matcher`] finds nodes declaratively
//! - [`codegen`] prints a tree back to source text
//!
//! ## Quick Start
//!
//! ```rust
//! use prune_syntax::codegen::{generate, GeneratorOptions};
//!
//! let program = prune_syntax::parse("define(['a'], function (a) { return a; });", Some("main.js"))?;
//! let code = generate(&program, &GeneratorOptions::compact());
//! assert_eq!(code, "define(['a'],function(a){return a;});");
//! # Ok::<(), prune_syntax::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod codegen;
mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod visit;

pub use error::Error;

/// Parses `source` into a program. `label` is recorded in every source
/// location, usually the path the source was read from.
pub fn parse(source: &str, label: Option<&str>) -> Result<ast::Program, Error> {
    let parser = parser::Parser::new(source);
    let mut parser = match label {
        Some(label) => parser.with_label(label),
        None => parser,
    };
    parser.parse_program()
}

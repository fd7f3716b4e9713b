// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # prune-amd
//!
//! Resolves the AMD and CommonJS dependencies of a JavaScript entry file and
//! inlines them into one program, every module ahead of its dependents.
//!
//! ## Overview
//!
//! - [`uri`] parses references such as `text!deep/template.html`
//! - [`extract`] finds `define()`/`require()` calls and their references
//! - [`resolver`] maps references to files, reads and parses them
//! - [`plugins`] turn non-module resources into modules
//! - [`naming`] decides module names and aliases
//! - [`graph`], [`toposort`] and [`assemble`] order and combine the trees
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prune_amd::{Config, inline_dependencies};
//! use std::path::Path;
//!
//! let entry = Path::new("js/main.js");
//! let source = std::fs::read_to_string(entry)?;
//! let program = prune_syntax::parse(&source, Some("main.js"))?;
//! let combined = inline_dependencies(entry, program, Config::with_root("js"))?;
//! println!("{} statements", combined.body.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod config;
mod error;
pub mod extract;
pub mod graph;
pub mod module;
pub mod naming;
pub mod plugins;
pub mod resolver;
pub mod toposort;
pub mod uri;

pub use config::Config;
pub use error::{AmdError, Result};
pub use resolver::{Bundler, ResolutionMode, inline_dependencies};

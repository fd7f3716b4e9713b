// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Command pipeline.
//!
//! Commands always run in the order of [`Command::ALL`], whatever order they
//! were requested in. `amd` and `minify` name sets of commands.

use anyhow::{Context, Result, bail};
use prune_amd::{Config, inline_dependencies};
use prune_syntax::codegen::{GeneratorOptions, generate};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Pull every dependency of the source into its tree
    AmdInlineDependencies,
    /// Write the tree with minimal whitespace
    Compress,
    /// Write the tree indented
    PrettyPrint,
}

impl Command {
    /// Every command in execution order
    pub const ALL: [Command; 3] = [
        Command::AmdInlineDependencies,
        Command::Compress,
        Command::PrettyPrint,
    ];

    /// The name used on the command line
    pub fn name(self) -> &'static str {
        match self {
            Command::AmdInlineDependencies => "amd-inlinedependencies",
            Command::Compress => "compress",
            Command::PrettyPrint => "prettyprint",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn command_set(name: &str) -> Option<&'static [Command]> {
    match name {
        "amd" => Some(&[Command::AmdInlineDependencies]),
        "minify" => Some(&[Command::Compress]),
        _ => None,
    }
}

/// Expand command and set names into commands in execution order.
pub fn expand(names: &[String]) -> Result<Vec<Command>> {
    let mut requested = Vec::new();
    for name in names {
        if let Some(set) = command_set(name) {
            requested.extend_from_slice(set);
        } else if let Some(command) = Command::ALL.iter().find(|c| c.name() == name.as_str()) {
            requested.push(*command);
        } else {
            let known: Vec<&str> = Command::ALL.iter().map(|c| c.name()).collect();
            bail!(
                "Unknown command '{}' (expected one of: amd, minify, {})",
                name,
                known.join(", ")
            );
        }
    }

    Ok(Command::ALL
        .into_iter()
        .filter(|command| requested.contains(command))
        .collect())
}

/// What a pipeline run reads and writes.
#[derive(Debug, Clone)]
pub struct Job {
    /// Entry JavaScript file
    pub source: PathBuf,
    /// Output file, `-` for stdout
    pub target: String,
    /// Resolution options
    pub config: Config,
}

/// Parse the source and run `commands` over it.
pub fn run(commands: &[Command], job: &Job) -> Result<()> {
    let text = std::fs::read_to_string(&job.source)
        .with_context(|| format!("Failed to read source file {}", job.source.display()))?;
    let label = job.source.display().to_string();
    let mut program = prune_syntax::parse(&text, Some(&label))?;

    if !commands
        .iter()
        .any(|c| matches!(c, Command::Compress | Command::PrettyPrint))
    {
        warn!("No output command requested, {} will not be written", job.target);
    }

    for command in commands {
        info!("Processing command: {}", command);
        match command {
            Command::AmdInlineDependencies => {
                program = inline_dependencies(&job.source, program, job.config.clone())?;
            }
            Command::Compress => write(&job.target, &generate(&program, &GeneratorOptions::compact()))?,
            Command::PrettyPrint => write(&job.target, &generate(&program, &GeneratorOptions::default()))?,
        }
    }
    Ok(())
}

fn write(target: &str, code: &str) -> Result<()> {
    if target == "-" {
        print!("{}", code);
        return Ok(());
    }
    info!("Writing file {}", target);
    std::fs::write(target, code).with_context(|| format!("Failed to write {}", target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expand_orders_and_dedups() {
        assert_eq!(
            expand(&names(&["prettyprint", "minify", "amd", "compress"])).unwrap(),
            Command::ALL
        );
        assert_eq!(expand(&names(&["minify"])).unwrap(), [Command::Compress]);
        assert!(expand(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_expand_unknown() {
        let err = expand(&names(&["mangle"])).unwrap_err();
        assert!(err.to_string().contains("Unknown command 'mangle'"));
    }

    #[test]
    fn test_run_inlines_and_compresses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.js"), "require(['a'], function (a) {\n    a();\n});\n").unwrap();
        fs::write(dir.path().join("a.js"), "define(function () {\n    return function () {};\n});\n").unwrap();
        let target = dir.path().join("main.min.js");

        let job = Job {
            source: dir.path().join("main.js"),
            target: target.display().to_string(),
            config: Config::with_root(dir.path()),
        };
        run(&expand(&names(&["amd", "minify"])).unwrap(), &job).unwrap();

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "define(\"a\",function(){return function(){};});require([\"a\"],function(a){a();});"
        );
    }

    #[test]
    fn test_run_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job {
            source: dir.path().join("missing.js"),
            target: "-".to_string(),
            config: Config::default(),
        };
        let err = run(&[Command::Compress], &job).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read source file"));
    }
}

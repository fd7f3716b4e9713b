// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! prune - inlines the AMD/CommonJS dependencies of a JavaScript entry file
//!
//! ```text
//! prune js/main.js -t main.min.js -c amd,minify --root js --path app=deep/deeper
//! ```

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use prune_amd::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::commands::Job;

#[derive(Parser)]
#[command(
    name = "prune",
    about = "Inlines the AMD/CommonJS dependencies of a JavaScript entry file",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Entry JavaScript file
    #[arg(default_value = "main.js")]
    source: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "main.min.js")]
    target: String,

    /// Commands or command sets to run (amd, minify, amd-inlinedependencies, compress, prettyprint)
    #[arg(short, long = "commands", value_delimiter = ',', default_value = "minify")]
    commands: Vec<String>,

    /// JSON options file
    #[arg(short = 'o', long = "options-file")]
    options_file: Option<PathBuf>,

    /// Directory references are resolved against
    #[arg(long)]
    root: Option<PathBuf>,

    /// Sub-directory of the root that module names are relative to
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Path alias, as PREFIX=REPLACEMENT
    #[arg(long = "path", value_parser = parse_path_alias)]
    paths: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn parse_path_alias(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((prefix, replacement)) if !prefix.is_empty() => {
            Ok((prefix.to_string(), replacement.to_string()))
        }
        _ => Err(format!("expected PREFIX=REPLACEMENT, got '{}'", value)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "prune=debug,prune_amd=debug"
    } else {
        "prune=info,prune_amd=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.options_file {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load options file {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(base_path) = cli.base_path {
        config.base_path = base_path;
    }
    for (prefix, replacement) in cli.paths {
        config = config.path(prefix, replacement);
    }

    let commands = commands::expand(&cli.commands)?;
    let job = Job {
        source: cli.source,
        target: cli.target,
        config,
    };
    commands::run(&commands, &job)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for dependency resolution

use std::path::PathBuf;
use thiserror::Error;

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, AmdError>;

/// Errors that can occur while resolving and inlining modules
#[derive(Debug, Error)]
pub enum AmdError {
    /// A referenced resource does not exist on disk
    #[error("AMD resource '{reference}' as resolved to '{}' was not found on the file system", .path.display())]
    NotFound {
        /// The reference as written
        reference: String,
        /// Where it was looked up
        path: PathBuf,
    },

    /// A reference names a plugin that cannot be inlined
    #[error("AMD plugin '{plugin}' is not on the list of supported inline-able plugins ({supported})")]
    UnsupportedPlugin {
        /// The plugin name
        plugin: String,
        /// Comma separated list of registered plugins
        supported: String,
    },

    /// Reading a resource failed
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        /// The file being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A module did not parse
    #[error("{0}")]
    Parse(#[from] prune_syntax::Error),

    /// A define call has a name in a form that cannot be rewritten
    #[error("Define call for module '{module}' already appears to contain a name, but not in a format that can be altered")]
    MalformedDefine {
        /// Module owning the call
        module: String,
    },

    /// An alias would shadow its own target
    #[error("Module and alias cannot share the same name '{0}'")]
    AliasNameClash(String),

    /// A module holds an anonymous define that cannot be attributed
    #[error("Module '{module}' contains an anonymous define call at {location} that is not its own")]
    AnonymousDefine {
        /// Module holding the call
        module: String,
        /// Where the call is
        location: String,
    },

    /// A loaded module lost its name to another module or define
    #[error("Module '{name}' read from '{}' is shadowed by another define of the same name", .path.display())]
    NameCollision {
        /// The contested name
        name: String,
        /// File of the shadowed module
        path: PathBuf,
    },

    /// Invalid options
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AmdError {
    /// Returns true if the error only invalidates a single reference.
    ///
    /// Recoverable errors are logged by the resolver and the offending edge
    /// is dropped; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AmdError::NotFound { .. } | AmdError::UnsupportedPlugin { .. } | AmdError::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let missing = AmdError::NotFound {
            reference: "a".into(),
            path: PathBuf::from("/x/a.js"),
        };
        assert!(missing.is_recoverable());
        assert!(!AmdError::AliasNameClash("a".into()).is_recoverable());
        assert!(
            !AmdError::MalformedDefine {
                module: "a".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_messages() {
        let err = AmdError::UnsupportedPlugin {
            plugin: "i18n".into(),
            supported: "text, js, css".into(),
        };
        assert_eq!(
            err.to_string(),
            "AMD plugin 'i18n' is not on the list of supported inline-able plugins (text, js, css)"
        );
        assert_eq!(
            AmdError::AliasNameClash("lib/a".into()).to_string(),
            "Module and alias cannot share the same name 'lib/a'"
        );
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for parsing.

use thiserror::Error;

use crate::ast::SourceLocation;

/// Errors produced while turning source text into a [`Program`](crate::ast::Program).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The source is not valid JavaScript
    #[error("SyntaxError: {message} ({location})")]
    Syntax {
        /// What the parser expected or found
        message: String,
        /// Where it happened
        location: SourceLocation,
    },
}

impl Error {
    /// Where the error was detected.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Error::Syntax { location, .. } => location,
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Parsing of AMD resource references.
//!
//! A reference is a resource id optionally prefixed by a chain of plugin
//! names, `text!templates/item.html` or `css!js!styles/base.css`. Plugins
//! apply right to left, so the chain is stored reversed: the first entry is
//! the plugin that runs first.

use std::fmt;

/// A parsed resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    plugins: Vec<String>,
    resource: String,
}

impl ResourceUri {
    /// Parse a reference string.
    ///
    /// ```rust
    /// use prune_amd::uri::ResourceUri;
    ///
    /// let uri = ResourceUri::parse("css!text!styles/base.css");
    /// assert_eq!(uri.plugins(), ["text", "css"]);
    /// assert_eq!(uri.resource(), "styles/base.css");
    ///
    /// // a segment that is not a plain word belongs to the resource
    /// let uri = ResourceUri::parse("text!./odd!name");
    /// assert_eq!(uri.plugins(), ["text"]);
    /// assert_eq!(uri.resource(), "./odd!name");
    /// ```
    pub fn parse(reference: &str) -> Self {
        let segments: Vec<&str> = reference.split('!').collect();
        let last = segments.len() - 1;

        let split = segments[..last]
            .iter()
            .position(|segment| !is_plugin_name(segment))
            .unwrap_or(last);

        let mut plugins: Vec<String> = segments[..split].iter().map(|s| s.to_string()).collect();
        plugins.reverse();

        Self {
            plugins,
            resource: segments[split..].join("!"),
        }
    }

    /// Plugins in application order.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// The resource id.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns true if the resource is a URL (`//host/x`, `http://host/x`).
    pub fn is_absolute(&self) -> bool {
        let rest = self
            .resource
            .strip_prefix("http:")
            .or_else(|| self.resource.strip_prefix("https:"))
            .unwrap_or(&self.resource);
        rest.starts_with("//")
    }

    /// Returns true if the resource starts with dots followed by a slash.
    pub fn is_relative(&self) -> bool {
        let dots = self.resource.bytes().take_while(|&b| b == b'.').count();
        dots > 0 && self.resource[dots..].starts_with('/')
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for plugin in self.plugins.iter().rev() {
            write!(f, "{}!", plugin)?;
        }
        f.write_str(&self.resource)
    }
}

fn is_plugin_name(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Collapse `.` and `..` segments of a slash separated id.
///
/// Leading `..` segments that cannot be collapsed are kept.
pub fn normalize_id(id: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in id.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ => out.push(".."),
            },
            _ => out.push(segment),
        }
    }
    out.join("/")
}

/// Join a directory id and a relative id, then normalize.
pub fn join_id(dir: &str, id: &str) -> String {
    if dir.is_empty() {
        normalize_id(id)
    } else {
        normalize_id(&format!("{}/{}", dir, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_resource() {
        let uri = ResourceUri::parse("deep/main");
        assert!(uri.plugins().is_empty());
        assert_eq!(uri.resource(), "deep/main");
        assert!(!uri.is_absolute());
        assert!(!uri.is_relative());
    }

    #[test]
    fn test_plugin_chain_is_reversed() {
        let uri = ResourceUri::parse("a!b!c!res");
        assert_eq!(uri.plugins(), ["c", "b", "a"]);
        assert_eq!(uri.resource(), "res");
        assert_eq!(uri.to_string(), "a!b!c!res");
    }

    #[test]
    fn test_non_word_segment_switches_to_resource() {
        let uri = ResourceUri::parse("text!deep/template.html");
        assert_eq!(uri.plugins(), ["text"]);
        assert_eq!(uri.resource(), "deep/template.html");

        let uri = ResourceUri::parse("a!b-c!d");
        assert_eq!(uri.plugins(), ["a"]);
        assert_eq!(uri.resource(), "b-c!d");
    }

    #[test]
    fn test_absolute() {
        assert!(ResourceUri::parse("//localhost/x").is_absolute());
        assert!(ResourceUri::parse("http://localhost/x").is_absolute());
        assert!(ResourceUri::parse("https://cdn/x.js").is_absolute());
        assert!(ResourceUri::parse("js!//cdn/jquery.js").is_absolute());
        assert!(!ResourceUri::parse("ftp://cdn/x").is_absolute());
        assert!(!ResourceUri::parse("/x").is_absolute());
    }

    #[test]
    fn test_relative() {
        assert!(ResourceUri::parse("./a").is_relative());
        assert!(ResourceUri::parse("../a").is_relative());
        assert!(ResourceUri::parse(".../a").is_relative());
        assert!(!ResourceUri::parse(".a").is_relative());
        assert!(!ResourceUri::parse("a/../b").is_relative());
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("./a"), "a");
        assert_eq!(normalize_id("deep/deeper/../relative"), "deep/relative");
        assert_eq!(normalize_id("a//b/./c"), "a/b/c");
        assert_eq!(normalize_id("../a"), "../a");
        assert_eq!(join_id("deep/deeper", "../relative"), "deep/relative");
        assert_eq!(join_id("", "./x"), "x");
    }
}

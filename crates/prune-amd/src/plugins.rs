// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Content plugins.
//!
//! A reference such as `text!templates/item.html` names a resource that is
//! not a module. Before such a resource is parsed, each plugin in its chain
//! turns the raw bytes into JavaScript that defines an equivalent module.

use indexmap::IndexMap;

use crate::config::Config;
use crate::error::{AmdError, Result};

/// Turns resource bytes into module source.
pub trait ContentPlugin {
    /// Name used in references (`text` in `text!a.html`)
    fn name(&self) -> &str;

    /// Transform `raw`, the content of `module`.
    fn transform(&self, raw: Vec<u8>, module: &str, config: &Config) -> Result<Vec<u8>>;
}

/// Plugins by name.
pub struct PluginRegistry {
    plugins: IndexMap<String, Box<dyn ContentPlugin>>,
}

impl PluginRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            plugins: IndexMap::new(),
        }
    }

    /// A registry with the `text`, `js` and `css` plugins.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(TextPlugin));
        registry.register(Box::new(JsPlugin));
        registry.register(Box::new(CssPlugin));
        registry
    }

    /// Add a plugin, replacing one with the same name.
    pub fn register(&mut self, plugin: Box<dyn ContentPlugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    /// Look up a plugin.
    pub fn get(&self, name: &str) -> Option<&dyn ContentPlugin> {
        self.plugins.get(name).map(|plugin| plugin.as_ref())
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Run `chain` over `raw` in order.
    pub fn apply(&self, chain: &[String], raw: Vec<u8>, module: &str, config: &Config) -> Result<Vec<u8>> {
        chain.iter().try_fold(raw, |content, name| {
            let plugin = self.get(name).ok_or_else(|| AmdError::UnsupportedPlugin {
                plugin: name.clone(),
                supported: self.names().join(", "),
            })?;
            plugin.transform(content, module, config)
        })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `text!`: the resource becomes a module returning its content as a string.
pub struct TextPlugin;

impl ContentPlugin for TextPlugin {
    fn name(&self) -> &str {
        "text"
    }

    fn transform(&self, raw: Vec<u8>, _module: &str, _config: &Config) -> Result<Vec<u8>> {
        let text = String::from_utf8_lossy(&raw);
        let source = format!(
            "define(function(){{return unescape(\n'{}'\n)}});",
            escape(&text).replace('\'', "\\'")
        );
        Ok(source.into_bytes())
    }
}

/// `js!`: a plain script, followed by an empty define so the reference
/// still resolves to a module.
pub struct JsPlugin;

impl ContentPlugin for JsPlugin {
    fn name(&self) -> &str {
        "js"
    }

    fn transform(&self, mut raw: Vec<u8>, _module: &str, _config: &Config) -> Result<Vec<u8>> {
        if !raw.is_empty() && !raw.ends_with(b"\n") {
            raw.push(b'\n');
        }
        raw.extend_from_slice(b"define(function(){});");
        Ok(raw)
    }
}

/// `css!`: a module that adds the stylesheet to the document head and
/// returns its text.
pub struct CssPlugin;

impl ContentPlugin for CssPlugin {
    fn name(&self) -> &str {
        "css"
    }

    fn transform(&self, raw: Vec<u8>, _module: &str, _config: &Config) -> Result<Vec<u8>> {
        let css = String::from_utf8_lossy(&raw);
        let source = format!(
            concat!(
                "define(function(){{\n",
                "var css = unescape('{}');\n",
                "if (typeof document !== 'undefined') {{\n",
                "var style = document.createElement('style');\n",
                "style.type = 'text/css';\n",
                "if (style.styleSheet) {{ style.styleSheet.cssText = css; }}\n",
                "else {{ style.appendChild(document.createTextNode(css)); }}\n",
                "(document.head || document.getElementsByTagName('head')[0]).appendChild(style);\n",
                "}}\n",
                "return css;\n",
                "}});"
            ),
            escape(&css)
        );
        Ok(source.into_bytes())
    }
}

/// JavaScript's global `escape()`.
///
/// ASCII letters, digits and `@*_+-./` pass through; other UTF-16 code units
/// become `%XX` below 256 and `%uXXXX` otherwise.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() || "@*_+-./".contains(c) => out.push(c),
            _ if unit < 0x100 => out.push_str(&format!("%{:02X}", unit)),
            _ => out.push_str(&format!("%u{:04X}", unit)),
        }
    }
    out
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

use crate::ast::Position;

/// Byte offsets of every line start in a source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Builds the index for `source`.
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        let mut chars = source.char_indices().peekable();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '\r' => {
                    if let Some((_, '\n')) = chars.peek() {
                        chars.next();
                        starts.push(offset + 2);
                    } else {
                        starts.push(offset + 1);
                    }
                }
                '\n' => starts.push(offset + 1),
                '\u{2028}' | '\u{2029}' => starts.push(offset + ch.len_utf8()),
                _ => {}
            }
        }
        Self { starts }
    }

    /// Line (1-based) and column (0-based, in bytes) of `offset`.
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        Position {
            line: line as u32 + 1,
            column: (offset - self.starts[line]) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        let index = LineIndex::new("ab\ncd\r\nef");
        assert_eq!(index.position(0), Position { line: 1, column: 0 });
        assert_eq!(index.position(1), Position { line: 1, column: 1 });
        assert_eq!(index.position(3), Position { line: 2, column: 0 });
        assert_eq!(index.position(7), Position { line: 3, column: 0 });
        assert_eq!(index.position(8), Position { line: 3, column: 1 });
    }
}

// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Splitting of `__...__` preprocessing blocks
//!
//! An expression containing preprocessing blocks cannot be parsed as a whole
//! until the blocks are evaluated against a context. Parsing therefore stops
//! at a [`PreprocessTemplate`]: the literal text around the blocks plus the
//! already parsed inner expressions. `\_` outside text literals stands for a
//! plain underscore and never opens a block.

use super::error::{ParseError, ParseResult};
use crate::ast::ExpressionNode;
use std::fmt;

/// Piece of an expression text produced by [`split_preprocessing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSegment<'a> {
    /// Outer text with `\_` escapes resolved
    Text(String),
    /// Content of a `__...__` block
    Inner {
        /// Text between the markers
        text: &'a str,
        /// Byte offset of `text` in the input
        position: usize,
    },
}

/// Segment of a parsed preprocessing template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Literal outer text, spliced as is
    Text(String),
    /// Inner expression, evaluated and spliced as text
    Expression(ExpressionNode),
}

/// Expression text awaiting `__...__` substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessTemplate {
    segments: Vec<TemplateSegment>,
}

impl PreprocessTemplate {
    /// Create a template from its segments
    pub fn new(segments: Vec<TemplateSegment>) -> Self {
        Self { segments }
    }

    /// Segments in source order
    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Inner expressions in source order
    pub fn expressions(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.segments.iter().filter_map(|segment| match segment {
            TemplateSegment::Expression(expr) => Some(expr),
            TemplateSegment::Text(_) => None,
        })
    }
}

impl fmt::Display for PreprocessTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                TemplateSegment::Text(text) => f.write_str(&text.replace('_', "\\_"))?,
                TemplateSegment::Expression(expr) => write!(f, "__{expr}__")?,
            }
        }
        Ok(())
    }
}

/// Whether `input` may hold preprocessing blocks or escapes
pub fn needs_preprocessing(input: &str) -> bool {
    input.contains("__") || input.contains("\\_")
}

/// Closing `__` of a block whose content starts at `from`
fn find_block_end(input: &str, from: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut in_literal = false;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\'' => in_literal = !in_literal,
            b'_' if !in_literal && bytes.get(i + 1) == Some(&b'_') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split `input` at its `__...__` blocks.
///
/// Returns `None` when the input has neither blocks nor `\_` escapes.
pub fn split_preprocessing(input: &str) -> ParseResult<Option<Vec<RawSegment<'_>>>> {
    if !needs_preprocessing(input) {
        return Ok(None);
    }

    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut text_start = 0;
    let mut in_literal = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !in_literal && bytes.get(i + 1) == Some(&b'_') => {
                text.push_str(&input[text_start..i]);
                text.push('_');
                i += 2;
                text_start = i;
            }
            b'\\' => {
                i += 1;
                if matches!(bytes.get(i), Some(b'\'' | b'\\')) {
                    i += 1;
                }
            }
            b'\'' => {
                in_literal = !in_literal;
                i += 1;
            }
            b'_' if !in_literal && bytes.get(i + 1) == Some(&b'_') => {
                let content_start = i + 2;
                let end = find_block_end(input, content_start)
                    .ok_or(ParseError::UnclosedPreprocessing { position: i })?;

                text.push_str(&input[text_start..i]);
                if !text.is_empty() {
                    segments.push(RawSegment::Text(std::mem::take(&mut text)));
                }
                segments.push(RawSegment::Inner {
                    text: &input[content_start..end],
                    position: content_start,
                });

                i = end + 2;
                text_start = i;
            }
            _ => i += 1,
        }
    }

    text.push_str(&input[text_start..]);
    if !text.is_empty() {
        segments.push(RawSegment::Text(text));
    }
    Ok(Some(segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_needs_nothing() {
        assert_eq!(split_preprocessing("${a_b} + 1").unwrap(), None);
    }

    #[test]
    fn test_blocks_are_split() {
        let segments = split_preprocessing("#{'msg.' + __${key}__}").unwrap().unwrap();
        assert_eq!(
            segments,
            vec![
                RawSegment::Text("#{'msg.' + ".into()),
                RawSegment::Inner {
                    text: "${key}",
                    position: 13,
                },
                RawSegment::Text("}".into()),
            ]
        );
    }

    #[test]
    fn test_markers_inside_literals_are_text() {
        let segments = split_preprocessing("'a__b' + __${x} + '__'__").unwrap().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], RawSegment::Text("'a__b' + ".into()));
        assert!(matches!(segments[1], RawSegment::Inner { text: "${x} + '__'", .. }));
    }

    #[test]
    fn test_escaped_underscores() {
        let segments = split_preprocessing(r"'a' + \_\_b\_\_").unwrap().unwrap();
        assert_eq!(segments, vec![RawSegment::Text("'a' + __b__".into())]);
    }

    #[test]
    fn test_unclosed_block() {
        assert_eq!(
            split_preprocessing("1 + __${x}"),
            Err(ParseError::UnclosedPreprocessing { position: 4 })
        );
    }
}

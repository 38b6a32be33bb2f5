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

//! Character scans over raw expression text that run before tokenizing
//!
//! All scans honour single-quoted literals, where a quote preceded by an odd
//! number of backslashes does not close the literal.

use super::error::{ParseError, ParseResult};

/// Whether the byte at `pos` is preceded by an odd number of backslashes
pub fn is_escaped(input: &str, pos: usize) -> bool {
    let bytes = input.as_bytes();
    let mut count = 0;
    let mut i = pos;
    while i > 0 && bytes[i - 1] == b'\\' {
        count += 1;
        i -= 1;
    }
    count % 2 == 1
}

/// Split `base(params)` into its base and parameter text.
///
/// Scans backward from a trailing `)` to its matching `(`. When that `(` is
/// the first character the whole input is a parenthesized base without
/// parameters. Inputs without a trailing `)` have no parameters.
pub fn split_trailing_parameters(input: &str) -> ParseResult<(&str, Option<&str>)> {
    let bytes = input.as_bytes();
    if bytes.last() != Some(&b')') {
        return Ok((input, None));
    }

    let mut depth = 0usize;
    let mut in_literal = false;
    for i in (0..bytes.len()).rev() {
        let b = bytes[i];
        if b == b'\'' && !is_escaped(input, i) {
            in_literal = !in_literal;
            continue;
        }
        if in_literal {
            continue;
        }
        match b {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    if i == 0 {
                        return Ok((input, None));
                    }
                    let base = input[..i].trim_end();
                    let params = input[i + 1..bytes.len() - 1].trim();
                    return Ok((base, Some(params)));
                }
            }
            _ => {}
        }
    }

    Err(ParseError::SyntaxError {
        position: bytes.len() - 1,
        message: "unbalanced parentheses".to_string(),
    })
}

/// Position of the top-level `::` separating template name and selector
pub fn find_fragment_separator(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut in_literal = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' && !is_escaped(input, i) {
            in_literal = !in_literal;
        } else if !in_literal {
            match b {
                b'(' | b'{' | b'[' => depth += 1,
                b')' | b'}' | b']' => depth = depth.saturating_sub(1),
                b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => return Some(i),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Byte offset of `inner` within `outer`; `inner` must be a subslice of `outer`
pub fn offset_within(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}

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

//! Source-text scan for constructs forbidden in restricted mode

use std::borrow::Cow;

/// Message of the error raised when restricted mode rejects an expression
pub const RESTRICTED_MESSAGE: &str = "Instantiation of new objects and access to static classes or parameters is forbidden in this context";

/// Drop control characters except newline, so they cannot split a keyword
pub fn normalize(text: &str) -> Cow<'_, str> {
    let is_dropped = |c: char| c != '\n' && (c < '\u{20}' || ('\u{7f}'..='\u{9f}').contains(&c));
    if text.chars().any(is_dropped) {
        Cow::Owned(text.chars().filter(|&c| !is_dropped(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

#[inline]
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether the word starting at byte `start` is not glued to a preceding identifier
fn at_word_boundary(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !is_identifier_char(c))
}

/// First non-whitespace character at or after byte `from`
fn next_significant(text: &str, from: usize) -> Option<char> {
    text[from..].chars().find(|c| !c.is_whitespace())
}

/// Whether `text` contains `new <...>`, `T(...)` or `param.x` / `param[...]`
/// outside of a longer identifier.
///
/// Candidates are found scanning forward and accepted only when the preceding character is not
/// an identifier character, which yields the same answers as a backward character-by-character
/// scan.
pub fn contains_instantiation_or_static_or_param(text: &str) -> bool {
    let text = normalize(text);
    let text = text.as_ref();

    for (start, _) in text.match_indices("new") {
        let end = start + 3;
        if at_word_boundary(text, start)
            && text[end..].chars().next().is_some_and(char::is_whitespace)
        {
            return true;
        }
    }

    for (start, _) in text.match_indices('T') {
        if at_word_boundary(text, start) && next_significant(text, start + 1) == Some('(') {
            return true;
        }
    }

    for (start, _) in text.match_indices("param") {
        let end = start + 5;
        if at_word_boundary(text, start) && matches!(next_significant(text, end), Some('.' | '['))
        {
            return true;
        }
    }

    false
}

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

//! Literal substitution: `|Hello ${name}!|` becomes `'Hello ' + ${name} + '!'`

use super::error::{ParseError, ParseResult};
use super::scan::is_escaped;
use std::borrow::Cow;

const DELIMITER: char = '|';

/// Rewrite every `|...|` block into a concatenation of text literals and the
/// `${}`, `*{}`, `#{}` and `@{}` expressions it contains.
///
/// `||` outside a block is the OR operator and is left alone. Text returned
/// unchanged is borrowed.
pub fn perform_literal_substitution(input: &str) -> ParseResult<Cow<'_, str>> {
    if !input.contains(DELIMITER) {
        return Ok(Cow::Borrowed(input));
    }

    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut out = String::with_capacity(input.len() + 20);
    let mut changed = false;

    let mut in_substitution = false;
    let mut substitution_start = 0;
    let mut in_insertion = false;
    let mut expression_level = 0usize;
    let mut in_literal = false;

    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let prev = i.checked_sub(1).map(|j| chars[j].1);
        let in_nothing = !in_literal && expression_level == 0;

        if c == DELIMITER && in_nothing && !in_substitution && next == Some(DELIMITER) {
            out.push_str("||");
            i += 2;
            continue;
        }

        if c == DELIMITER && in_nothing && !in_substitution {
            in_substitution = true;
            substitution_start = pos;
            changed = true;
        } else if c == DELIMITER && in_nothing && in_substitution {
            if in_insertion {
                out.push('\'');
                in_insertion = false;
            }
            in_substitution = false;
        } else if in_nothing && matches!(c, '$' | '*' | '#' | '@') && next == Some('{') {
            if in_substitution && in_insertion {
                out.push_str("' + ");
                in_insertion = false;
            } else if in_substitution && prev == Some('}') {
                out.push_str(" + '' + ");
            }
            out.push(c);
            out.push('{');
            expression_level = 1;
            i += 2;
            continue;
        } else if expression_level == 1 && c == '}' {
            out.push('}');
            expression_level = 0;
        } else if expression_level > 0 && c == '{' {
            out.push('{');
            expression_level += 1;
        } else if expression_level > 1 && c == '}' {
            out.push('}');
            expression_level -= 1;
        } else if expression_level > 0 {
            out.push(c);
        } else if !in_substitution && c == '\'' && !is_escaped(input, pos) {
            in_literal = !in_literal;
            out.push(c);
        } else if in_substitution && in_nothing {
            if !in_insertion {
                if prev != Some(DELIMITER) {
                    out.push_str(" + ");
                }
                out.push('\'');
                in_insertion = true;
            }
            if c == '\'' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        } else {
            out.push(c);
        }
        i += 1;
    }

    if in_substitution {
        return Err(ParseError::InvalidSubstitution {
            position: substitution_start,
        });
    }

    if changed {
        log::trace!("literal substitution: {input:?} -> {out:?}");
        Ok(Cow::Owned(out))
    } else {
        Ok(Cow::Borrowed(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("|Hello ${name}!|", "'Hello ' + ${name} + '!'")]
    #[case("|${a}${b}|", "${a} + '' + ${b}")]
    #[case("|It's #{m} \\o/|", r"'It\'s ' + #{m} + ' \\o/'")]
    #[case("|${a|b}|", "${a|b}")]
    #[case("'a|b' + |c|", "'a|b' + 'c'")]
    fn test_substitution(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(perform_literal_substitution(input).unwrap(), expected);
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        let result = perform_literal_substitution("${a} || ${b}").unwrap();
        assert!(matches!(result, Cow::Borrowed("${a} || ${b}")));
    }

    #[test]
    fn test_unclosed_substitution() {
        assert_eq!(
            perform_literal_substitution("1 + |abc"),
            Err(ParseError::InvalidSubstitution { position: 4 })
        );
    }
}

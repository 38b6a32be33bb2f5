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

//! Parser error types

use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while turning expression text into an AST
///
/// Positions are byte offsets into the text handed to the parser.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// Generic syntax error
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError {
        /// Position where the error occurred
        position: usize,
        /// Error message describing the syntax error
        message: String,
    },

    /// Unexpected token
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was found
        token: String,
        /// Position where the token was found
        position: usize,
    },

    /// Input ended while more was expected
    #[error("Unexpected end of input at position {position}")]
    UnexpectedEof {
        /// Position where more input was expected
        position: usize,
    },

    /// Unclosed string literal
    #[error("Unclosed string literal starting at position {position}")]
    UnclosedString {
        /// Position of the opening quote
        position: usize,
    },

    /// Bracketed expression without its closing brace
    #[error("Unclosed '{marker}{{' expression starting at position {position}")]
    UnclosedExpression {
        /// Expression marker character (`$`, `*`, `#`, `@`, `~`)
        marker: char,
        /// Position of the marker
        position: usize,
    },

    /// Invalid literal value
    #[error("Invalid {literal_type} literal at position {position}: {value}")]
    InvalidLiteral {
        /// Type of literal that failed to parse
        literal_type: String,
        /// The invalid value that was encountered
        value: String,
        /// Position where the invalid literal was found
        position: usize,
    },

    /// Invalid escape sequence
    #[error("Invalid escape sequence at position {position}: {sequence}")]
    InvalidEscape {
        /// The invalid escape sequence
        sequence: String,
        /// Position where the escape sequence was found
        position: usize,
    },

    /// Nesting exceeded the configured ceiling
    #[error("Expression nesting exceeds the limit of {limit} at position {position}")]
    NestingTooDeep {
        /// Configured maximum depth
        limit: usize,
        /// Position where the limit was hit
        position: usize,
    },

    /// `__` preprocessing block without its closing marker
    #[error("Unclosed preprocessing block starting at position {position}")]
    UnclosedPreprocessing {
        /// Position of the opening `__`
        position: usize,
    },

    /// `|...|` literal substitution without its closing bar
    #[error("Unclosed literal substitution starting at position {position}")]
    InvalidSubstitution {
        /// Position of the opening `|`
        position: usize,
    },
}

impl ParseError {
    /// Byte offset the error refers to
    pub fn position(&self) -> usize {
        match self {
            Self::SyntaxError { position, .. }
            | Self::UnexpectedToken { position, .. }
            | Self::UnexpectedEof { position }
            | Self::UnclosedString { position }
            | Self::UnclosedExpression { position, .. }
            | Self::InvalidLiteral { position, .. }
            | Self::InvalidEscape { position, .. }
            | Self::NestingTooDeep { position, .. }
            | Self::UnclosedPreprocessing { position }
            | Self::InvalidSubstitution { position } => *position,
        }
    }

    /// Shift the position by `offset`, used when an inner text was parsed on its own
    pub fn offset_by(self, offset: usize) -> Self {
        match self {
            Self::SyntaxError { position, message } => Self::SyntaxError {
                position: position + offset,
                message,
            },
            Self::UnexpectedToken { token, position } => Self::UnexpectedToken {
                token,
                position: position + offset,
            },
            Self::UnexpectedEof { position } => Self::UnexpectedEof {
                position: position + offset,
            },
            Self::UnclosedString { position } => Self::UnclosedString {
                position: position + offset,
            },
            Self::UnclosedExpression { marker, position } => Self::UnclosedExpression {
                marker,
                position: position + offset,
            },
            Self::InvalidLiteral {
                literal_type,
                value,
                position,
            } => Self::InvalidLiteral {
                literal_type,
                value,
                position: position + offset,
            },
            Self::InvalidEscape { sequence, position } => Self::InvalidEscape {
                sequence,
                position: position + offset,
            },
            Self::NestingTooDeep { limit, position } => Self::NestingTooDeep {
                limit,
                position: position + offset,
            },
            Self::UnclosedPreprocessing { position } => Self::UnclosedPreprocessing {
                position: position + offset,
            },
            Self::InvalidSubstitution { position } => Self::InvalidSubstitution {
                position: position + offset,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_keeps_payload() {
        let err = ParseError::UnexpectedToken {
            token: ")".into(),
            position: 3,
        }
        .offset_by(2);
        assert_eq!(err.position(), 5);
        assert_eq!(err.to_string(), "Unexpected token ')' at position 5");
    }
}

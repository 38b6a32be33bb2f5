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

//! Standard expression parser
//!
//! Turns expression text into an [`ExpressionNode`] tree. Parsing is a pure
//! function of the text: literal substitution (`|...|`) is applied first, and
//! text holding `__...__` blocks compiles to a [`PreprocessTemplate`] that is
//! completed at evaluation time.

#![warn(missing_docs)]

pub mod error;
pub mod pratt;
pub mod preprocess;
pub mod scan;
pub mod substitution;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::{PrattParser, Precedence, parse_expression_pratt};
pub use preprocess::{PreprocessTemplate, TemplateSegment};
pub use substitution::perform_literal_substitution;
pub use tokenizer::{SimpleExpressionKind, SpannedToken, Token, Tokenizer, TokenizerMode};

use crate::ast::ExpressionNode;
use preprocess::{RawSegment, split_preprocessing};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parser limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting of sub-expressions before parsing fails with
    /// [`ParseError::NestingTooDeep`]
    pub max_nesting_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 128,
        }
    }
}

impl ParserConfig {
    /// Set the maximum nesting depth
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

/// Result of compiling expression text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledExpression {
    /// Ready to evaluate
    Expression(ExpressionNode),
    /// Needs `__...__` substitution against a context before the outer text can be parsed
    Preprocessed(PreprocessTemplate),
}

impl CompiledExpression {
    /// Parsed tree, when no preprocessing is pending
    pub fn as_expression(&self) -> Option<&ExpressionNode> {
        match self {
            Self::Expression(expr) => Some(expr),
            Self::Preprocessed(_) => None,
        }
    }

    /// Whether evaluation needs a preprocessing pass
    pub fn is_preprocessed(&self) -> bool {
        matches!(self, Self::Preprocessed(_))
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => write!(f, "{expr}"),
            Self::Preprocessed(template) => write!(f, "{template}"),
        }
    }
}

/// Parse expression text with default limits
pub fn parse_expression(input: &str) -> ParseResult<ExpressionNode> {
    parse_with_config(input, &ParserConfig::default())
}

/// Parse expression text; preprocessing markers are not interpreted
pub fn parse_with_config(input: &str, config: &ParserConfig) -> ParseResult<ExpressionNode> {
    let text = perform_literal_substitution(input)?;
    PrattParser::with_config(&text, config).parse()
}

/// Compile expression text, splitting out `__...__` blocks
pub fn compile(input: &str, config: &ParserConfig) -> ParseResult<CompiledExpression> {
    let Some(raw_segments) = split_preprocessing(input)? else {
        return parse_with_config(input, config).map(CompiledExpression::Expression);
    };

    if raw_segments
        .iter()
        .all(|segment| matches!(segment, RawSegment::Text(_)))
    {
        let text: String = raw_segments
            .into_iter()
            .filter_map(|segment| match segment {
                RawSegment::Text(text) => Some(text),
                RawSegment::Inner { .. } => None,
            })
            .collect();
        return parse_with_config(&text, config).map(CompiledExpression::Expression);
    }

    let mut segments = Vec::with_capacity(raw_segments.len());
    for segment in raw_segments {
        segments.push(match segment {
            RawSegment::Text(text) => TemplateSegment::Text(text),
            RawSegment::Inner { text, position } => TemplateSegment::Expression(
                parse_with_config(text, config).map_err(|e| e.offset_by(position))?,
            ),
        });
    }
    log::trace!("compiled {input:?} into {} preprocessing segments", segments.len());
    Ok(CompiledExpression::Preprocessed(PreprocessTemplate::new(segments)))
}

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

//! Pratt parser for standard expressions
//!
//! One parser type handles both grammars: the outer expression language and
//! the navigation language inside `${...}` / `*{...}`. The content of
//! bracketed expressions is parsed eagerly by nested parsers that share the
//! nesting budget of their parent.

use super::ParserConfig;
use super::error::{ParseError, ParseResult};
use super::scan::{find_fragment_separator, offset_within, split_trailing_parameters};
use super::substitution::perform_literal_substitution;
use super::tokenizer::{SimpleExpressionKind, SpannedToken, Token, Tokenizer, TokenizerMode};
use crate::ast::{
    Arguments, Assignation, BinaryOperator, ExpressionNode, FragmentData, FragmentParameters,
    LinkData, LiteralValue, MessageData, UnaryOperator,
};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// `cond ? a : b` (right associative)
    Conditional = 1,
    /// `a ?: b`
    Default = 2,
    /// `or`, `||`
    Or = 3,
    /// `and`, `&&`
    And = 4,
    /// `==`, `!=`
    Equality = 5,
    /// `<`, `<=`, `>`, `>=`
    Relational = 6,
    /// `+`, `-`
    Additive = 7,
    /// `*`, `/`, `%`
    Multiplicative = 8,
    /// `!`, unary `-`
    Unary = 9,
    /// `.`, `[]`, calls (navigation only)
    Postfix = 10,
}

impl Precedence {
    /// Raw level
    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Next tighter level, used for the right operand of left-associative operators
    #[inline(always)]
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Conditional => Precedence::Default,
            Precedence::Default => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Postfix,
            Precedence::Postfix => Precedence::Postfix,
        }
    }

    /// Whether operators at this level associate to the right
    #[inline(always)]
    pub const fn is_right_associative(self) -> bool {
        matches!(self, Precedence::Conditional)
    }
}

/// Binary operator and precedence for a token
#[inline(always)]
fn binary_operator(token: &Token<'_>) -> Option<(BinaryOperator, Precedence)> {
    let entry = match token {
        Token::Plus => (BinaryOperator::Add, Precedence::Additive),
        Token::Minus => (BinaryOperator::Subtract, Precedence::Additive),
        Token::Equal => (BinaryOperator::Equal, Precedence::Equality),
        Token::NotEqual => (BinaryOperator::NotEqual, Precedence::Equality),
        Token::And => (BinaryOperator::And, Precedence::And),
        Token::Or => (BinaryOperator::Or, Precedence::Or),
        Token::Multiply => (BinaryOperator::Multiply, Precedence::Multiplicative),
        Token::Divide => (BinaryOperator::Divide, Precedence::Multiplicative),
        Token::Remainder => (BinaryOperator::Remainder, Precedence::Multiplicative),
        Token::LessThan => (BinaryOperator::LessThan, Precedence::Relational),
        Token::LessThanOrEqual => (BinaryOperator::LessThanOrEqual, Precedence::Relational),
        Token::GreaterThan => (BinaryOperator::GreaterThan, Precedence::Relational),
        Token::GreaterThanOrEqual => (BinaryOperator::GreaterThanOrEqual, Precedence::Relational),
        _ => return None,
    };
    Some(entry)
}

/// Pratt parser over a single expression text
pub struct PrattParser<'input> {
    input: &'input str,
    tokenizer: Tokenizer<'input>,
    current_token: Option<SpannedToken<'input>>,
    max_depth: usize,
    depth: usize,
}

impl<'input> PrattParser<'input> {
    /// Create a standard-mode parser with default limits
    pub fn new(input: &'input str) -> Self {
        Self::with_config(input, &ParserConfig::default())
    }

    /// Create a standard-mode parser
    pub fn with_config(input: &'input str, config: &ParserConfig) -> Self {
        Self::nested(input, TokenizerMode::Standard, config.max_nesting_depth, 0)
    }

    fn nested(input: &'input str, mode: TokenizerMode, max_depth: usize, depth: usize) -> Self {
        Self {
            input,
            tokenizer: Tokenizer::with_mode(input, mode),
            current_token: None,
            max_depth,
            depth,
        }
    }

    /// Parser for an inner text, sharing this parser's nesting budget
    fn sub_parser<'a>(&self, input: &'a str, mode: TokenizerMode) -> PrattParser<'a> {
        PrattParser::nested(input, mode, self.max_depth, self.depth)
    }

    #[inline(always)]
    fn advance(&mut self) -> ParseResult<()> {
        self.current_token = self.tokenizer.next_token()?;
        Ok(())
    }

    #[inline(always)]
    fn current(&self) -> Option<&Token<'input>> {
        self.current_token.as_ref().map(|token| &token.token)
    }

    /// Offset of the current token, or the end of input
    fn position(&self) -> usize {
        self.current_token
            .as_ref()
            .map_or(self.input.len(), |token| token.start)
    }

    fn unexpected(&self) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::UnexpectedToken {
                token: token.token.describe(),
                position: token.start,
            },
            None => ParseError::UnexpectedEof {
                position: self.input.len(),
            },
        }
    }

    fn expect(&mut self, expected: Token<'input>) -> ParseResult<()> {
        match self.current() {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(&expected) => {
                self.advance()
            }
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
                position: self.position(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn is_navigation(&self) -> bool {
        self.tokenizer.mode() == TokenizerMode::Navigation
    }

    fn parse_primary(&mut self) -> ParseResult<ExpressionNode> {
        let Some(token) = self.current_token.clone() else {
            return Err(self.unexpected());
        };
        let start = token.start;

        let node = match token.token {
            Token::Integer(text) => {
                let value = BigInt::from_str(text).map_err(|_| invalid_literal("integer", text, start))?;
                ExpressionNode::integer(value)
            }
            Token::Decimal(text) => {
                ExpressionNode::literal(LiteralValue::Decimal(parse_decimal(text, start)?))
            }
            Token::String(raw) => ExpressionNode::text(process_string_escapes(raw, start + 1)?),
            Token::Boolean(value) => ExpressionNode::literal(LiteralValue::Boolean(value)),
            Token::Null => ExpressionNode::literal(LiteralValue::Null),
            Token::NoOp => ExpressionNode::NoOp,
            Token::Word(word) => {
                self.advance()?;
                return self.parse_word(word);
            }
            Token::Simple { kind, content } => self.parse_simple(kind, content, start + 2)?,
            Token::LeftParen => {
                self.advance()?;
                let expr = self.parse_expression_with_precedence(Precedence::Conditional)?;
                self.expect(Token::RightParen)?;
                return Ok(expr);
            }
            _ => return Err(self.unexpected()),
        };

        self.advance()?;
        Ok(node)
    }

    /// A word already consumed: generic token, root identifier, `new` or `T(...)`
    fn parse_word(&mut self, word: &'input str) -> ParseResult<ExpressionNode> {
        if !self.is_navigation() {
            return Ok(ExpressionNode::token(word));
        }
        match word {
            "new" if matches!(self.current(), Some(Token::Word(_))) => {
                let type_name = self.parse_qualified_name()?;
                self.expect(Token::LeftParen)?;
                let args = self.parse_arguments()?;
                Ok(ExpressionNode::instantiation(&type_name, args))
            }
            "T" if matches!(self.current(), Some(Token::LeftParen)) => {
                self.advance()?;
                let type_name = self.parse_qualified_name()?;
                self.expect(Token::RightParen)?;
                Ok(ExpressionNode::type_reference(&type_name))
            }
            _ => Ok(ExpressionNode::identifier(word)),
        }
    }

    /// `a.b.C`
    fn parse_qualified_name(&mut self) -> ParseResult<String> {
        let mut name = String::new();
        loop {
            match self.current() {
                Some(Token::Word(part)) if !part.starts_with('#') => name.push_str(part),
                _ => return Err(self.unexpected()),
            }
            self.advance()?;
            if !matches!(self.current(), Some(Token::Dot)) {
                return Ok(name);
            }
            name.push('.');
            self.advance()?;
        }
    }

    /// Member name after `.`; keywords such as `and` or `div` are valid names here
    fn parse_member_name(&mut self) -> ParseResult<&'input str> {
        let input = self.input;
        let name = match &self.current_token {
            Some(SpannedToken {
                token: Token::Word(word),
                ..
            }) if !word.starts_with('#') => *word,
            Some(token) => {
                let text = token.source(input);
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(self.unexpected());
                }
                text
            }
            None => return Err(self.unexpected()),
        };
        self.advance()?;
        Ok(name)
    }

    /// Arguments after an opening `(`, through the closing `)`
    fn parse_arguments(&mut self) -> ParseResult<Arguments> {
        let mut args = Arguments::new();
        if matches!(self.current(), Some(Token::RightParen)) {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression_with_precedence(Precedence::Conditional)?);
            match self.current() {
                Some(Token::Comma) => self.advance()?,
                Some(Token::RightParen) => {
                    self.advance()?;
                    return Ok(args);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_postfix(&mut self, mut left: ExpressionNode) -> ParseResult<ExpressionNode> {
        loop {
            match self.current() {
                Some(Token::Dot) => {
                    self.advance()?;
                    let name = self.parse_member_name()?;
                    left = if matches!(self.current(), Some(Token::LeftParen)) {
                        self.advance()?;
                        let args = self.parse_arguments()?;
                        ExpressionNode::method_call(left, name, args)
                    } else {
                        ExpressionNode::property(left, name)
                    };
                }
                Some(Token::LeftBracket) => {
                    self.advance()?;
                    let index = self.parse_expression_with_precedence(Precedence::Conditional)?;
                    self.expect(Token::RightBracket)?;
                    left = ExpressionNode::index(left, index);
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_unary(&mut self) -> ParseResult<ExpressionNode> {
        let op = match self.current() {
            Some(Token::Not) => Some(UnaryOperator::Not),
            Some(Token::Minus) => Some(UnaryOperator::Minus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let operand = self.parse_expression_with_precedence(Precedence::Unary)?;
            return Ok(ExpressionNode::unary_op(op, operand));
        }

        let primary = self.parse_primary()?;
        if self.is_navigation() {
            self.parse_postfix(primary)
        } else {
            Ok(primary)
        }
    }

    /// Precedence climbing loop
    fn parse_expression_with_precedence(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<ExpressionNode> {
        self.enter()?;
        let mut left = self.parse_unary()?;

        while let Some(token) = self.current().cloned() {
            match token {
                Token::Question if min_precedence <= Precedence::Conditional => {
                    self.advance()?;
                    let then_expr = self.parse_expression_with_precedence(Precedence::Conditional)?;
                    let else_expr = if matches!(self.current(), Some(Token::Colon)) {
                        self.advance()?;
                        Some(self.parse_expression_with_precedence(Precedence::Conditional)?)
                    } else {
                        None
                    };
                    left = ExpressionNode::conditional(left, then_expr, else_expr);
                }
                Token::Elvis if min_precedence <= Precedence::Default => {
                    self.advance()?;
                    let fallback =
                        self.parse_expression_with_precedence(Precedence::Default.next_level())?;
                    left = ExpressionNode::default_value(left, fallback);
                }
                _ => {
                    let Some((op, precedence)) = binary_operator(&token) else {
                        break;
                    };
                    if precedence < min_precedence {
                        break;
                    }
                    self.advance()?;
                    let next = if precedence.is_right_associative() {
                        precedence
                    } else {
                        precedence.next_level()
                    };
                    let right = self.parse_expression_with_precedence(next)?;
                    left = ExpressionNode::binary_op(op, left, right);
                }
            }
        }

        self.leave();
        Ok(left)
    }

    /// Parse one expression at the lowest precedence
    pub fn parse_expression(&mut self) -> ParseResult<ExpressionNode> {
        self.parse_expression_with_precedence(Precedence::Conditional)
    }

    /// Parse the whole input as one expression
    pub fn parse(&mut self) -> ParseResult<ExpressionNode> {
        self.advance()?;
        let expr = self.parse_expression()?;
        if self.current_token.is_some() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    /// Parse the whole input as `name[=value], ...`
    pub fn parse_assignation_sequence(
        &mut self,
        allow_valueless: bool,
    ) -> ParseResult<Vec<Assignation>> {
        self.advance()?;
        let mut items = Vec::new();
        loop {
            let name = self.parse_expression()?;
            let value = if matches!(self.current(), Some(Token::Assign)) {
                self.advance()?;
                Some(self.parse_expression()?)
            } else if allow_valueless {
                None
            } else {
                return Err(ParseError::SyntaxError {
                    position: self.position(),
                    message: "expected '=' after parameter name".to_string(),
                });
            };
            items.push(Assignation { name, value });

            match self.current() {
                None => return Ok(items),
                Some(Token::Comma) => self.advance()?,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    /// Parse the whole input as a comma separated list of expressions
    pub fn parse_expression_sequence(&mut self) -> ParseResult<Vec<ExpressionNode>> {
        self.advance()?;
        let mut items = Vec::new();
        loop {
            items.push(self.parse_expression()?);
            match self.current() {
                None => return Ok(items),
                Some(Token::Comma) => self.advance()?,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_simple(
        &self,
        kind: SimpleExpressionKind,
        content: &str,
        offset: usize,
    ) -> ParseResult<ExpressionNode> {
        match kind {
            SimpleExpressionKind::Variable | SimpleExpressionKind::Selection => {
                let body = self
                    .sub_parser(content, TokenizerMode::Navigation)
                    .parse()
                    .map_err(|e| e.offset_by(offset))?;
                Ok(if kind == SimpleExpressionKind::Variable {
                    ExpressionNode::variable(content, body)
                } else {
                    ExpressionNode::selection(content, body)
                })
            }
            SimpleExpressionKind::Message => self.parse_message(content, offset),
            SimpleExpressionKind::Link => self.parse_link(content, offset),
            SimpleExpressionKind::Fragment => self.parse_fragment(content, offset),
        }
    }

    /// Standard-grammar parse of an inner text, after literal substitution
    fn parse_standard(&self, text: &str, offset: usize) -> ParseResult<ExpressionNode> {
        let text = perform_literal_substitution(text).map_err(|e| e.offset_by(offset))?;
        self.sub_parser(&text, TokenizerMode::Standard)
            .parse()
            .map_err(|e| e.offset_by(offset))
    }

    /// Parse `text`, or take it verbatim as a text literal when it does not parse
    fn parse_default_as_literal(&self, text: &str, offset: usize) -> ParseResult<ExpressionNode> {
        match self.parse_standard(text, offset) {
            Ok(node) => Ok(node),
            Err(err @ ParseError::NestingTooDeep { .. }) => Err(err),
            Err(err) => {
                log::trace!("taking {text:?} as a text literal: {err}");
                Ok(ExpressionNode::text(text))
            }
        }
    }

    fn parse_sequence(&self, text: &str, offset: usize) -> ParseResult<Vec<ExpressionNode>> {
        let text = perform_literal_substitution(text).map_err(|e| e.offset_by(offset))?;
        self.sub_parser(&text, TokenizerMode::Standard)
            .parse_expression_sequence()
            .map_err(|e| e.offset_by(offset))
    }

    fn parse_assignations(
        &self,
        text: &str,
        offset: usize,
        allow_valueless: bool,
    ) -> ParseResult<Vec<Assignation>> {
        let text = perform_literal_substitution(text).map_err(|e| e.offset_by(offset))?;
        self.sub_parser(&text, TokenizerMode::Standard)
            .parse_assignation_sequence(allow_valueless)
            .map_err(|e| e.offset_by(offset))
    }

    /// `#{key(args)}`
    fn parse_message(&self, content: &str, offset: usize) -> ParseResult<ExpressionNode> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ParseError::SyntaxError {
                position: offset,
                message: "message key is empty".to_string(),
            });
        }

        let (key_text, params) = split_trailing_parameters(trimmed)
            .map_err(|e| e.offset_by(offset + offset_within(content, trimmed)))?;
        let key = self.parse_default_as_literal(key_text, offset + offset_within(content, key_text))?;
        let args = match params {
            Some(params) if !params.is_empty() => self
                .parse_sequence(params, offset + offset_within(content, params))?
                .into_iter()
                .collect(),
            _ => Arguments::new(),
        };

        Ok(ExpressionNode::Message(Box::new(MessageData { key, args })))
    }

    /// `@{base(params)}`
    fn parse_link(&self, content: &str, offset: usize) -> ParseResult<ExpressionNode> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ParseError::SyntaxError {
                position: offset,
                message: "link base is empty".to_string(),
            });
        }

        let (base_text, params) = split_trailing_parameters(trimmed)
            .map_err(|e| e.offset_by(offset + offset_within(content, trimmed)))?;
        let base =
            self.parse_default_as_literal(base_text, offset + offset_within(content, base_text))?;
        let parameters = match params {
            Some(params) if !params.is_empty() => {
                self.parse_assignations(params, offset + offset_within(content, params), true)?
            }
            _ => Vec::new(),
        };

        Ok(ExpressionNode::Link(Box::new(LinkData { base, parameters })))
    }

    /// `~{template :: selector (params)}`, `~{template}`, `~{:: selector}` or `~{}`
    fn parse_fragment(&self, content: &str, offset: usize) -> ParseResult<ExpressionNode> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(ExpressionNode::Fragment(Box::default()));
        }

        let (template_text, selector_text, params) = match find_fragment_separator(trimmed) {
            Some(separator) => {
                let template_text = trimmed[..separator].trim();
                let selector_part = trimmed[separator + 2..].trim();
                if selector_part.is_empty() {
                    return Err(ParseError::SyntaxError {
                        position: offset + offset_within(content, trimmed) + separator,
                        message: "fragment selector is empty".to_string(),
                    });
                }
                let (selector_text, params) = split_trailing_parameters(selector_part)
                    .map_err(|e| e.offset_by(offset + offset_within(content, selector_part)))?;
                (template_text, Some(selector_text), params)
            }
            None => {
                let (template_text, params) = split_trailing_parameters(trimmed)
                    .map_err(|e| e.offset_by(offset + offset_within(content, trimmed)))?;
                (template_text, None, params)
            }
        };

        let template = if template_text.is_empty() {
            None
        } else {
            Some(self.parse_default_as_literal(
                template_text,
                offset + offset_within(content, template_text),
            )?)
        };
        let selector = match selector_text {
            Some(text) => Some(self.parse_default_as_literal(text, offset + offset_within(content, text))?),
            None => None,
        };
        let parameters = match params {
            Some(params) if !params.is_empty() => {
                self.parse_fragment_parameters(params, offset + offset_within(content, params))?
            }
            _ => FragmentParameters::None,
        };

        Ok(ExpressionNode::Fragment(Box::new(FragmentData {
            template,
            selector,
            parameters,
        })))
    }

    /// Named parameters when every item is `name=value`, positional otherwise
    fn parse_fragment_parameters(&self, text: &str, offset: usize) -> ParseResult<FragmentParameters> {
        match self.parse_assignations(text, offset, false) {
            Ok(named) => Ok(FragmentParameters::Named(named)),
            Err(err @ ParseError::NestingTooDeep { .. }) => Err(err),
            Err(_) => self
                .parse_sequence(text, offset)
                .map(FragmentParameters::Positional),
        }
    }
}

fn invalid_literal(literal_type: &str, value: &str, position: usize) -> ParseError {
    ParseError::InvalidLiteral {
        literal_type: literal_type.to_string(),
        value: value.to_string(),
        position,
    }
}

fn parse_decimal(text: &str, position: usize) -> ParseResult<Decimal> {
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed.map_err(|_| invalid_literal("decimal", text, position))
}

/// Resolve `\'` and `\\` in the raw content of a text literal
fn process_string_escapes(raw: &str, position: usize) -> ParseResult<String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some((_, '\\')) => result.push('\\'),
            Some((_, '\'')) => result.push('\''),
            Some((_, other)) => {
                return Err(ParseError::InvalidEscape {
                    sequence: format!("\\{other}"),
                    position: position + i,
                });
            }
            None => {
                return Err(ParseError::InvalidEscape {
                    sequence: "\\".to_string(),
                    position: position + i,
                });
            }
        }
    }
    Ok(result)
}

/// Parse a standard expression with default limits
pub fn parse_expression_pratt(input: &str) -> ParseResult<ExpressionNode> {
    PrattParser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn canonical(input: &str) -> String {
        parse_expression_pratt(input).unwrap().to_string()
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(Precedence::Multiplicative > Precedence::Additive);
        assert!(Precedence::Additive > Precedence::Relational);
        assert!(Precedence::Relational > Precedence::Equality);
        assert!(Precedence::Equality > Precedence::And);
        assert!(Precedence::And > Precedence::Or);
        assert!(Precedence::Or > Precedence::Default);
        assert!(Precedence::Default > Precedence::Conditional);
    }

    #[test]
    fn test_basic_expressions() {
        let result = parse_expression_pratt("2 + 3 * 4").unwrap();
        let ExpressionNode::BinaryOp(data) = result else {
            panic!("expected a binary operation");
        };
        assert_eq!(data.op, BinaryOperator::Add);
        assert_eq!(data.left, ExpressionNode::integer(2));
        assert!(matches!(&data.right, ExpressionNode::BinaryOp(inner) if inner.op == BinaryOperator::Multiply));
    }

    #[rstest]
    #[case("1 + 2 - 3", "(1 + 2) - 3")]
    #[case("-3 -4 - -5", "((-3) - 4) - (-5)")]
    #[case("a or b and c", "a or (b and c)")]
    #[case("1 < 2 == true", "(1 < 2) == true")]
    #[case("!a ? 'x' : 34", "(!a) ? 'x' : 34")]
    #[case("a ? b : c ? d : e", "a ? b : (c ? d : e)")]
    #[case("a ? b ? c : d : e", "a ? (b ? c : d) : e")]
    #[case("a ?: b ?: c", "(a ?: b) ?: c")]
    #[case("x ?: y ? 1 : 2", "(x ?: y) ? 1 : 2")]
    #[case("a gt b AND c le d", "(a > b) and (c <= d)")]
    #[case("10 div 3 mod 2", "(10 / 3) % 2")]
    #[case("'it\\'s'", "'it\\'s'")]
    #[case("2.5E-2", "0.025")]
    #[case("_", "_")]
    fn test_canonical_forms(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical(input), expected);
    }

    #[test]
    fn test_conditional_without_else() {
        let result = parse_expression_pratt("${flag} ? 'on'").unwrap();
        let ExpressionNode::Conditional(data) = result else {
            panic!("expected a conditional");
        };
        assert!(data.else_expr.is_none());
    }

    #[test]
    fn test_navigation_body() {
        let result = parse_expression_pratt("${user.addresses[0].city.toUpperCase()}").unwrap();
        let ExpressionNode::Variable(data) = result else {
            panic!("expected a variable expression");
        };
        assert_eq!(&*data.source, "user.addresses[0].city.toUpperCase()");
        assert_eq!(data.body.to_string(), "user.addresses[0].city.toUpperCase()");
        assert!(matches!(data.body, ExpressionNode::MethodCall(_)));
    }

    #[test]
    fn test_navigation_special_forms() {
        let ExpressionNode::Variable(data) =
            parse_expression_pratt("${new java.util.Date(1, 'a')}").unwrap()
        else {
            panic!("expected a variable expression");
        };
        assert_eq!(data.body.to_string(), "new java.util.Date(1, 'a')");

        let ExpressionNode::Variable(data) =
            parse_expression_pratt("${T(java.lang.Math).max(1, 2)}").unwrap()
        else {
            panic!("expected a variable expression");
        };
        assert_eq!(data.body.to_string(), "T(java.lang.Math).max(1, 2)");

        let ExpressionNode::Selection(data) = parse_expression_pratt("*{#ctx.and}").unwrap() else {
            panic!("expected a selection expression");
        };
        assert_eq!(data.body, ExpressionNode::property(ExpressionNode::identifier("#ctx"), "and"));
    }

    #[test]
    fn test_message_expression() {
        assert_eq!(canonical("#{home.welcome(${name}, 3)}"), "#{home.welcome(${name}, 3)}");
        let ExpressionNode::Message(data) = parse_expression_pratt("#{${key}}").unwrap() else {
            panic!("expected a message expression");
        };
        assert!(matches!(data.key, ExpressionNode::Variable(_)));
        assert!(data.args.is_empty());
    }

    #[test]
    fn test_link_expression() {
        let ExpressionNode::Link(data) =
            parse_expression_pratt("@{http://a.b.com/xx/yy(p1='zz', p2=${user.name}, flag)}").unwrap()
        else {
            panic!("expected a link expression");
        };
        assert_eq!(data.base, ExpressionNode::text("http://a.b.com/xx/yy"));
        assert_eq!(data.parameters.len(), 3);
        assert_eq!(data.parameters[0].name, ExpressionNode::token("p1"));
        assert_eq!(data.parameters[0].value, Some(ExpressionNode::text("zz")));
        assert!(data.parameters[2].value.is_none());

        assert_eq!(canonical("@{order/details}"), "@{order/details}");
        assert_eq!(canonical("@{(${base})}"), "@{${base}}");
    }

    #[test]
    fn test_fragment_expression() {
        assert_eq!(canonical("~{}"), "~{}");
        assert_eq!(canonical("~{footer :: copy}"), "~{footer :: copy}");
        assert_eq!(canonical("~{:: copy}"), "~{:: copy}");
        assert_eq!(
            canonical("~{fragments/footer :: copy(year=2011)}"),
            "~{fragments/footer :: copy (year=2011)}"
        );
        let ExpressionNode::Fragment(data) =
            parse_expression_pratt("~{footer :: copy(${a}, 'b')}").unwrap()
        else {
            panic!("expected a fragment expression");
        };
        assert!(matches!(&data.parameters, FragmentParameters::Positional(values) if values.len() == 2));
    }

    #[test]
    fn test_fragment_empty_selector() {
        assert!(matches!(
            parse_expression_pratt("~{footer ::}"),
            Err(ParseError::SyntaxError { .. })
        ));
    }

    #[test]
    fn test_inner_error_positions() {
        assert_eq!(
            parse_expression_pratt("1 + ${a.}"),
            Err(ParseError::UnexpectedEof { position: 8 })
        );
        assert_eq!(
            parse_expression_pratt("(1 + 2"),
            Err(ParseError::UnexpectedEof { position: 6 })
        );
        assert_eq!(
            parse_expression_pratt("1 2"),
            Err(ParseError::UnexpectedToken {
                token: "2".into(),
                position: 2
            })
        );
        assert!(matches!(
            parse_expression_pratt("'a\\n'"),
            Err(ParseError::InvalidEscape { position: 2, .. })
        ));
        assert_eq!(parse_expression_pratt("   "), Err(ParseError::UnexpectedEof { position: 3 }));
    }

    #[test]
    fn test_nesting_limit() {
        let config = ParserConfig { max_nesting_depth: 8 };
        let deep = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let result = PrattParser::with_config(&deep, &config).parse();
        assert!(matches!(result, Err(ParseError::NestingTooDeep { limit: 8, .. })));

        let nested = "${a[${b[${c[${d[${e}]}]}]}]}";
        let result = PrattParser::with_config(nested, &ParserConfig { max_nesting_depth: 4 }).parse();
        assert!(matches!(result, Err(ParseError::NestingTooDeep { .. })));
        assert!(parse_expression_pratt(nested).is_ok());
    }
}

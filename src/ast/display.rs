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

//! Canonical textual form of expressions
//!
//! Re-parsing the canonical form yields an expression that evaluates the same
//! way as the original. Operands that are themselves operations are always
//! wrapped in parentheses, so precedence never depends on spacing.

use super::expression::{
    Assignation, ExpressionNode, FragmentData, FragmentParameters, LiteralValue,
};
use std::fmt::{self, Write};

/// Write a text literal with `'` and `\` escaped
pub fn write_text_literal(f: &mut impl Write, text: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('\'')
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write_text_literal(f, text),
            Self::Integer(i) => write!(f, "{i}"),
            // a decimal without fractional digits must not read back as an integer
            Self::Decimal(d) if d.scale() == 0 => write!(f, "{d}.0"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

struct Operand<'a>(&'a ExpressionNode);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_complex() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Navigation targets additionally wrap atomic forms other than identifiers
struct Target<'a>(&'a ExpressionNode);

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ExpressionNode::Identifier(_)
            | ExpressionNode::Property(_)
            | ExpressionNode::Index(_)
            | ExpressionNode::MethodCall(_)
            | ExpressionNode::TypeReference(_) => write!(f, "{}", self.0),
            other => write!(f, "({other})"),
        }
    }
}

fn write_list<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a ExpressionNode>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_assignations(f: &mut fmt::Formatter<'_>, params: &[Assignation]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", Operand(&param.name))?;
        if let Some(value) = &param.value {
            write!(f, "={}", Operand(value))?;
        }
    }
    Ok(())
}

fn write_fragment(f: &mut fmt::Formatter<'_>, data: &FragmentData) -> fmt::Result {
    f.write_str("~{")?;
    if let Some(template) = &data.template {
        write!(f, "{}", Operand(template))?;
    }
    if let Some(selector) = &data.selector {
        if data.template.is_some() {
            f.write_char(' ')?;
        }
        write!(f, ":: {}", Operand(selector))?;
    }
    match &data.parameters {
        FragmentParameters::None => {}
        FragmentParameters::Named(params) => {
            f.write_str(" (")?;
            write_assignations(f, params)?;
            f.write_char(')')?;
        }
        FragmentParameters::Positional(values) => {
            f.write_str(" (")?;
            write_list(f, values)?;
            f.write_char(')')?;
        }
    }
    f.write_char('}')
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{literal}"),
            Self::Token(token) => f.write_str(token),
            Self::NoOp => f.write_char('_'),
            Self::Variable(data) => write!(f, "${{{}}}", data.source),
            Self::Selection(data) => write!(f, "*{{{}}}", data.source),
            Self::Message(data) => {
                write!(f, "#{{{}", Operand(&data.key))?;
                if !data.args.is_empty() {
                    f.write_char('(')?;
                    write_list(f, &data.args)?;
                    f.write_char(')')?;
                }
                f.write_char('}')
            }
            Self::Link(data) => {
                write!(f, "@{{{}", Operand(&data.base))?;
                if !data.parameters.is_empty() {
                    f.write_char('(')?;
                    write_assignations(f, &data.parameters)?;
                    f.write_char(')')?;
                }
                f.write_char('}')
            }
            Self::Fragment(data) => write_fragment(f, data),
            Self::UnaryOp(data) => write!(f, "{}{}", data.op, Operand(&data.operand)),
            Self::BinaryOp(data) => write!(
                f,
                "{} {} {}",
                Operand(&data.left),
                data.op,
                Operand(&data.right)
            ),
            Self::Conditional(data) => {
                write!(
                    f,
                    "{} ? {}",
                    Operand(&data.condition),
                    Operand(&data.then_expr)
                )?;
                if let Some(else_expr) = &data.else_expr {
                    write!(f, " : {}", Operand(else_expr))?;
                }
                Ok(())
            }
            Self::Default(data) => {
                write!(f, "{} ?: {}", Operand(&data.value), Operand(&data.fallback))
            }
            Self::Identifier(name) => f.write_str(name),
            Self::Property(data) => write!(f, "{}.{}", Target(&data.target), data.name),
            Self::Index(data) => write!(f, "{}[{}]", Target(&data.target), data.index),
            Self::MethodCall(data) => {
                write!(f, "{}.{}(", Target(&data.target), data.method)?;
                write_list(f, &data.args)?;
                f.write_char(')')
            }
            Self::Instantiation(data) => {
                write!(f, "new {}(", data.type_name)?;
                write_list(f, &data.args)?;
                f.write_char(')')
            }
            Self::TypeReference(type_name) => write!(f, "T({type_name})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, UnaryOperator};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_text_literal_escaping() {
        let node = ExpressionNode::text("it's a \\ path");
        assert_eq!(node.to_string(), r"'it\'s a \\ path'");
    }

    #[test]
    fn test_decimal_literals_keep_a_fraction() {
        let scientific = Decimal::from_scientific("1.5E2").unwrap();
        assert_eq!(LiteralValue::Decimal(scientific).to_string(), "150.0");
        assert_eq!(LiteralValue::Decimal(Decimal::new(250, 2)).to_string(), "2.50");
        let small = Decimal::from_scientific("2.5E-2").unwrap();
        assert_eq!(LiteralValue::Decimal(small).to_string(), "0.025");
    }

    #[test]
    fn test_complex_operands_are_parenthesized() {
        let sum = ExpressionNode::binary_op(
            BinaryOperator::Add,
            ExpressionNode::integer(2),
            ExpressionNode::integer(3),
        );
        let product =
            ExpressionNode::binary_op(BinaryOperator::Multiply, sum, ExpressionNode::integer(4));
        assert_eq!(product.to_string(), "(2 + 3) * 4");
    }

    #[test]
    fn test_conditional_without_else() {
        let node = ExpressionNode::conditional(
            ExpressionNode::unary_op(UnaryOperator::Not, ExpressionNode::token("a")),
            ExpressionNode::text("x"),
            None,
        );
        assert_eq!(node.to_string(), "(!a) ? 'x'");
    }

    #[test]
    fn test_navigation_forms() {
        let node = ExpressionNode::method_call(
            ExpressionNode::property(ExpressionNode::identifier("user"), "name"),
            "substring",
            [ExpressionNode::integer(0), ExpressionNode::integer(2)]
                .into_iter()
                .collect(),
        );
        assert_eq!(node.to_string(), "user.name.substring(0, 2)");
        assert_eq!(
            ExpressionNode::type_reference("a.b.Type").to_string(),
            "T(a.b.Type)"
        );
    }
}

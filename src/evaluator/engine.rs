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

//! Tree-walking evaluator
//!
//! Walks an [`ExpressionNode`] tree against an [`EvaluationContext`].
//! Children are evaluated left to right; `and`, `or`, the conditional and
//! the Elvis operator skip operands they do not need.

use super::config::EvaluationConfig;
use super::context::EvaluationContext;
use super::error::{EvaluationError, EvaluationResult};
use super::evaluators::{ArithmeticEvaluator, ComparisonEvaluator, LogicalEvaluator};
use crate::ast::{
    BinaryOpData, BinaryOperator, ExpressionNode, LiteralValue, UnaryOperator, VariableData,
};
use crate::guard::RestrictionGuard;
use crate::model::{Navigation, Value};

/// Evaluates expression trees for one context
pub struct Evaluator<'a> {
    pub(super) config: &'a EvaluationConfig,
    pub(super) guard: &'a RestrictionGuard,
    pub(super) context: &'a dyn EvaluationContext,
    pub(super) restricted: bool,
    in_selection: bool,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator; restricted mode is on when either `restricted` or the context says so
    pub fn new(
        config: &'a EvaluationConfig,
        guard: &'a RestrictionGuard,
        context: &'a dyn EvaluationContext,
        restricted: bool,
    ) -> Self {
        Self {
            config,
            guard,
            context,
            restricted: restricted || context.is_restricted(),
            in_selection: false,
            depth: 0,
        }
    }

    /// Whether restricted mode is active
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Evaluate a node
    pub fn evaluate(&mut self, node: &ExpressionNode) -> EvaluationResult<Value> {
        if self.depth >= self.config.max_recursion_depth {
            return Err(EvaluationError::RecursionLimit {
                limit: self.config.max_recursion_depth,
            });
        }
        self.depth += 1;
        let result = self.evaluate_node(node);
        self.depth -= 1;
        result
    }

    /// Evaluate a node with restricted mode forced on
    pub(super) fn evaluate_restricted(&mut self, node: &ExpressionNode) -> EvaluationResult<Value> {
        let previous = std::mem::replace(&mut self.restricted, true);
        let result = self.evaluate(node);
        self.restricted = previous;
        result
    }

    pub(super) fn is_truthy(&self, value: &Value) -> bool {
        LogicalEvaluator::is_truthy(value, self.config.lenient_truthiness)
    }

    fn evaluate_node(&mut self, node: &ExpressionNode) -> EvaluationResult<Value> {
        match node {
            ExpressionNode::Literal(literal) => Ok(literal_value(literal)),
            ExpressionNode::Token(text) => Ok(Value::Text(text.clone())),
            ExpressionNode::NoOp => Ok(Value::NoOp),
            ExpressionNode::Variable(data) => self.evaluate_variable(data, false),
            ExpressionNode::Selection(data) => self.evaluate_variable(data, true),
            ExpressionNode::Message(data) => self.evaluate_message(data),
            ExpressionNode::Link(data) => self.evaluate_link(data),
            ExpressionNode::Fragment(data) => self.evaluate_fragment(data),
            ExpressionNode::UnaryOp(data) => {
                let operand = self.evaluate(&data.operand)?;
                match data.op {
                    UnaryOperator::Not => {
                        Ok(LogicalEvaluator::evaluate_not(&operand, self.config.lenient_truthiness))
                    }
                    UnaryOperator::Minus => ArithmeticEvaluator::evaluate_negation(&operand),
                }
            }
            ExpressionNode::BinaryOp(data) => self.evaluate_binary(data),
            ExpressionNode::Conditional(data) => {
                let condition = self.evaluate(&data.condition)?;
                if self.is_truthy(&condition) {
                    self.evaluate(&data.then_expr)
                } else {
                    match &data.else_expr {
                        Some(else_expr) => self.evaluate(else_expr),
                        None => Ok(Value::Null),
                    }
                }
            }
            ExpressionNode::Default(data) => {
                let value = self.evaluate(&data.value)?;
                if value.is_null() {
                    self.evaluate(&data.fallback)
                } else {
                    Ok(value)
                }
            }
            ExpressionNode::Identifier(name) => self.resolve_root(name),
            ExpressionNode::Property(data) => {
                let target = self.evaluate(&data.target)?;
                self.read_property(&target, &data.name)
            }
            ExpressionNode::Index(data) => {
                let target = self.evaluate(&data.target)?;
                if target.is_null() {
                    return Err(EvaluationError::NullNavigation {
                        member: format!("[{}]", data.index),
                    });
                }
                let index = self.evaluate(&data.index)?;
                if matches!(target, Value::Object(_)) {
                    self.guard.check_property(&target, &index.to_text())?;
                }
                self.context.navigator().index(&target, &index)
            }
            ExpressionNode::MethodCall(data) => {
                let target = self.evaluate(&data.target)?;
                if target.is_null() {
                    return Err(EvaluationError::NullNavigation {
                        member: format!("{}()", data.method),
                    });
                }
                self.guard.check_member(&target, &data.method)?;
                let args = self.evaluate_all(&data.args)?;
                match self
                    .context
                    .navigator()
                    .invoke_method(&target, &data.method, &args)
                {
                    Navigation::Found(value) => Ok(value),
                    Navigation::NotFound => Err(EvaluationError::MethodNotFound {
                        method: data.method.to_string(),
                        target_type: target.type_name().to_string(),
                    }),
                    Navigation::Denied => Err(denied(&target, &data.method)),
                }
            }
            ExpressionNode::Instantiation(data) => {
                self.guard.check_type(&data.type_name, self.restricted)?;
                let args = self.evaluate_all(&data.args)?;
                self.context
                    .navigator()
                    .instantiate(&data.type_name, &args)
                    .found()
                    .ok_or_else(|| EvaluationError::UnknownType {
                        type_name: data.type_name.to_string(),
                    })
            }
            ExpressionNode::TypeReference(type_name) => {
                self.guard.check_type(type_name, self.restricted)?;
                self.context
                    .navigator()
                    .resolve_type(type_name)
                    .found()
                    .ok_or_else(|| EvaluationError::UnknownType {
                        type_name: type_name.to_string(),
                    })
            }
        }
    }

    pub(super) fn evaluate_all(&mut self, nodes: &[ExpressionNode]) -> EvaluationResult<Vec<Value>> {
        nodes.iter().map(|node| self.evaluate(node)).collect()
    }

    fn evaluate_variable(&mut self, data: &VariableData, selection: bool) -> EvaluationResult<Value> {
        self.guard.check_source(&data.source, self.restricted)?;
        let previous = std::mem::replace(&mut self.in_selection, selection);
        let result = self.evaluate(&data.body);
        self.in_selection = previous;
        result
    }

    fn evaluate_binary(&mut self, data: &BinaryOpData) -> EvaluationResult<Value> {
        match data.op {
            BinaryOperator::And => {
                let left = self.evaluate(&data.left)?;
                if !self.is_truthy(&left) {
                    return Ok(Value::Boolean(false));
                }
                let right = self.evaluate(&data.right)?;
                Ok(Value::Boolean(self.is_truthy(&right)))
            }
            BinaryOperator::Or => {
                let left = self.evaluate(&data.left)?;
                if self.is_truthy(&left) {
                    return Ok(Value::Boolean(true));
                }
                let right = self.evaluate(&data.right)?;
                Ok(Value::Boolean(self.is_truthy(&right)))
            }
            op if op.is_equality() || op.is_relational() => {
                let left = self.evaluate(&data.left)?;
                let right = self.evaluate(&data.right)?;
                ComparisonEvaluator::evaluate(op, &left, &right)
            }
            op => {
                let left = self.evaluate(&data.left)?;
                let right = self.evaluate(&data.right)?;
                ArithmeticEvaluator::evaluate(op, &left, &right)
            }
        }
    }

    /// Root of a navigation chain
    fn resolve_root(&mut self, name: &str) -> EvaluationResult<Value> {
        if self.in_selection && !name.starts_with('#') {
            if let Some(target) = self.context.selection_target() {
                return self.read_property(&target, name);
            }
        }
        match self.context.lookup_variable(name) {
            Navigation::Found(value) => Ok(value),
            Navigation::NotFound if self.config.strict_variables => {
                Err(EvaluationError::VariableNotFound {
                    name: name.to_string(),
                })
            }
            Navigation::NotFound => {
                log::trace!("variable {name} not found, evaluating to null");
                Ok(Value::Null)
            }
            Navigation::Denied => Err(EvaluationError::forbidden(format!(
                "Access to variable '{name}' is forbidden"
            ))),
        }
    }

    fn read_property(&self, target: &Value, name: &str) -> EvaluationResult<Value> {
        if target.is_null() {
            return Err(EvaluationError::NullNavigation {
                member: name.to_string(),
            });
        }
        self.guard.check_property(target, name)?;
        match self.context.navigator().get_property(target, name) {
            Navigation::Found(value) => Ok(value),
            Navigation::NotFound => Err(EvaluationError::PropertyNotFound {
                property: name.to_string(),
                target_type: target.type_name().to_string(),
            }),
            Navigation::Denied => Err(denied(target, name)),
        }
    }
}

fn denied(target: &Value, member: &str) -> EvaluationError {
    EvaluationError::forbidden(format!(
        "Access to member '{member}' of type '{}' is forbidden",
        target.type_name()
    ))
}

/// Runtime value of a literal
pub fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Text(text) => Value::Text(text.clone()),
        LiteralValue::Integer(i) => Value::Integer(i.clone()),
        LiteralValue::Decimal(d) => Value::Decimal(*d),
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Null => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::StandardContext;
    use crate::parser::parse_expression;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn context() -> StandardContext {
        StandardContext::default()
            .with_variable("one", 1)
            .with_variable("user", Value::map([("name", Value::text("Lucy"))]))
            .with_variable("items", Value::list([Value::text("a"), Value::text("b")]))
    }

    fn eval_with(input: &str, config: &EvaluationConfig) -> EvaluationResult<Value> {
        let expr = parse_expression(input).unwrap();
        let guard = RestrictionGuard::default();
        let context = context();
        Evaluator::new(config, &guard, &context, false).evaluate(&expr)
    }

    fn eval(input: &str) -> EvaluationResult<Value> {
        eval_with(input, &EvaluationConfig::default())
    }

    #[rstest]
    #[case("2 + 3 * 4", Value::integer(14))]
    #[case("(2 + 3) * 4", Value::integer(20))]
    #[case("23 + 43 + 1", Value::integer(67))]
    #[case("-3 -4 - -5 + -10 - 1", Value::integer(-13))]
    #[case("-3 -4 - (-5 + -10)", Value::integer(8))]
    #[case("'.' + 3 + 2", Value::text(".32"))]
    #[case("3 + 2 + '.'", Value::text("5."))]
    #[case("'4' == 4", Value::Boolean(true))]
    #[case("'4' neq 4", Value::Boolean(false))]
    #[case("${one} gt 0 and ${one} lt 2", Value::Boolean(true))]
    #[case("${user.name}", Value::text("Lucy"))]
    #[case("${items[1]}", Value::text("b"))]
    #[case("${items.size()}", Value::integer(2))]
    #[case("${missing} ?: 'fallback'", Value::text("fallback"))]
    #[case("${one} ?: 'fallback'", Value::integer(1))]
    #[case("${true} ? 'x' : 'y'", Value::text("x"))]
    #[case("${false} ? 'x'", Value::Null)]
    #[case("main-section", Value::text("main-section"))]
    #[case("_", Value::NoOp)]
    #[case("not ${missing}", Value::Boolean(true))]
    fn test_evaluate(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(eval(input), Ok(expected), "{input}");
    }

    #[test]
    fn test_short_circuit_skips_failing_operand() {
        assert_eq!(eval("false and ${missing.field}"), Ok(Value::Boolean(false)));
        assert_eq!(eval("true or ${missing.field}"), Ok(Value::Boolean(true)));
        assert!(matches!(
            eval("true and ${missing.field}"),
            Err(EvaluationError::NullNavigation { .. })
        ));
    }

    #[test]
    fn test_strict_variables() {
        let config = EvaluationConfig::default().with_strict_variables(true);
        assert_eq!(
            eval_with("${missing}", &config),
            Err(EvaluationError::VariableNotFound {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn test_navigation_errors() {
        assert!(matches!(
            eval("${items[5]}"),
            Err(EvaluationError::IndexOutOfBounds { index: 5, size: 2 })
        ));
        assert!(matches!(
            eval("${one.nothing}"),
            Err(EvaluationError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            eval("${items.explode()}"),
            Err(EvaluationError::MethodNotFound { .. })
        ));
        assert!(matches!(
            eval("${user.getClassLoader()}"),
            Err(EvaluationError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_recursion_limit() {
        let config = EvaluationConfig::default().with_max_recursion_depth(4);
        assert_eq!(
            eval_with("1 + (1 + (1 + (1 + 1)))", &config),
            Err(EvaluationError::RecursionLimit { limit: 4 })
        );
        assert_eq!(eval_with("1 + 1", &config), Ok(Value::integer(2)));
    }

    #[test]
    fn test_selection_uses_target() {
        let guard = RestrictionGuard::default();
        let config = EvaluationConfig::default();
        let context = context().with_selection(Value::map([("name", Value::text("Jo"))]));
        let expr = parse_expression("*{name} + ' / ' + ${user.name}").unwrap();
        assert_eq!(
            Evaluator::new(&config, &guard, &context, false).evaluate(&expr),
            Ok(Value::text("Jo / Lucy"))
        );
    }

    #[test]
    fn test_instantiation_needs_backend() {
        assert_eq!(
            eval("${new java.util.Date()}"),
            Err(EvaluationError::UnknownType {
                type_name: "java.util.Date".into()
            })
        );
        assert!(matches!(
            eval("${T(java.lang.Runtime)}"),
            Err(EvaluationError::Forbidden { .. })
        ));
    }
}

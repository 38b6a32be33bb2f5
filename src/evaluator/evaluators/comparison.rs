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

//! Comparison operations evaluator

use crate::ast::BinaryOperator;
use crate::evaluator::{EvaluationError, EvaluationResult};
use crate::model::{Numeric, Value};
use std::cmp::Ordering;

/// Specialized evaluator for equality and relational operations
pub struct ComparisonEvaluator;

impl ComparisonEvaluator {
    /// Dispatch a comparison operator
    pub fn evaluate(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Value> {
        let result = match op {
            BinaryOperator::Equal => Self::equals(left, right),
            BinaryOperator::NotEqual => !Self::equals(left, right),
            BinaryOperator::GreaterThan => Self::compare(op, left, right)?.is_gt(),
            BinaryOperator::GreaterThanOrEqual => Self::compare(op, left, right)?.is_ge(),
            BinaryOperator::LessThan => Self::compare(op, left, right)?.is_lt(),
            BinaryOperator::LessThanOrEqual => Self::compare(op, left, right)?.is_le(),
            other => {
                return Err(EvaluationError::InvalidOperation {
                    message: format!("'{other}' is not a comparison operator"),
                });
            }
        };
        Ok(Value::Boolean(result))
    }

    /// Equality: numeric when both sides read as numbers, structural otherwise
    pub fn equals(left: &Value, right: &Value) -> bool {
        if let (Some(a), Some(b)) = (
            Numeric::from_value(left, true),
            Numeric::from_value(right, true),
        ) {
            return a.compare(&b) == Some(Ordering::Equal);
        }
        left == right
    }

    /// Ordering for relational operators
    pub fn compare(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Ordering> {
        let incomparable = || EvaluationError::IncomparableValues {
            left: left.type_name().to_string(),
            right: right.type_name().to_string(),
            operator: op.to_string(),
        };

        if let (Some(a), Some(b)) = (
            Numeric::from_value(left, true),
            Numeric::from_value(right, true),
        ) {
            return a.compare(&b).ok_or_else(incomparable);
        }
        match (left, right) {
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            _ => Err(incomparable()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case(Value::integer(13), Value::text("13.0"), true)]
    #[case(Value::integer(14), Value::text("13"), false)]
    #[case(Value::text("4"), Value::integer(4), true)]
    #[case(Value::Decimal(Decimal::new(130, 1)), Value::integer(13), true)]
    #[case(Value::text("a"), Value::text("a"), true)]
    #[case(Value::text("a"), Value::text("A"), false)]
    #[case(Value::Null, Value::Null, true)]
    #[case(Value::Null, Value::text(""), false)]
    #[case(Value::Boolean(true), Value::text("true"), false)]
    fn test_equality(#[case] left: Value, #[case] right: Value, #[case] expected: bool) {
        assert_eq!(ComparisonEvaluator::equals(&left, &right), expected);
        assert_eq!(
            ComparisonEvaluator::evaluate(BinaryOperator::NotEqual, &left, &right),
            Ok(Value::Boolean(!expected))
        );
    }

    #[rstest]
    #[case(BinaryOperator::GreaterThan, Value::integer(3), Value::text("2.5"), true)]
    #[case(BinaryOperator::LessThanOrEqual, Value::integer(2), Value::integer(2), true)]
    #[case(BinaryOperator::LessThan, Value::text("abc"), Value::text("abd"), true)]
    #[case(BinaryOperator::GreaterThanOrEqual, Value::Boolean(false), Value::Boolean(true), false)]
    fn test_relational(
        #[case] op: BinaryOperator,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: bool,
    ) {
        assert_eq!(
            ComparisonEvaluator::evaluate(op, &left, &right),
            Ok(Value::Boolean(expected))
        );
    }

    #[test]
    fn test_incomparable() {
        let err = ComparisonEvaluator::evaluate(
            BinaryOperator::GreaterThan,
            &Value::text("abc"),
            &Value::integer(1),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::IncomparableValues {
                left: "text".into(),
                right: "integer".into(),
                operator: ">".into(),
            }
        );
        assert!(
            ComparisonEvaluator::evaluate(BinaryOperator::LessThan, &Value::Null, &Value::integer(1))
                .is_err()
        );
    }
}

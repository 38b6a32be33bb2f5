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

//! Logical operations evaluator

use crate::model::{Numeric, Value};

/// Specialized evaluator for truthiness and boolean operators
///
/// `and` / `or` short-circuit in the tree walker; this type only decides
/// what counts as true.
pub struct LogicalEvaluator;

impl LogicalEvaluator {
    /// Truthiness of a value
    ///
    /// Null and the no-op token are false and booleans are themselves. With
    /// `lenient` set, `"false"`, `"off"`, `"no"` (any case) and numeric zero
    /// are also false. Everything else is true.
    pub fn is_truthy(value: &Value, lenient: bool) -> bool {
        match value {
            Value::Null | Value::NoOp => false,
            Value::Boolean(b) => *b,
            Value::Integer(_) | Value::Decimal(_) if lenient => {
                Numeric::from_value(value, false).is_some_and(|n| !n.is_zero())
            }
            Value::Text(text) if lenient => {
                let text = text.trim();
                !["false", "off", "no"]
                    .iter()
                    .any(|word| text.eq_ignore_ascii_case(word))
            }
            _ => true,
        }
    }

    /// Evaluate `!` / `not`
    pub fn evaluate_not(operand: &Value, lenient: bool) -> Value {
        Value::Boolean(!Self::is_truthy(operand, lenient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case(Value::Null, false, false)]
    #[case(Value::NoOp, false, false)]
    #[case(Value::Boolean(false), false, false)]
    #[case(Value::Boolean(true), true, true)]
    #[case(Value::text("false"), true, false)]
    #[case(Value::text(" Off "), true, false)]
    #[case(Value::text("yes"), true, true)]
    #[case(Value::text(""), true, true)]
    #[case(Value::integer(0), true, false)]
    #[case(Value::Decimal(Decimal::new(0, 2)), true, false)]
    #[case(Value::integer(2), true, true)]
    #[case(Value::list([]), true, true)]
    fn test_truthiness(#[case] value: Value, #[case] strict: bool, #[case] lenient: bool) {
        assert_eq!(LogicalEvaluator::is_truthy(&value, false), strict, "strict {value:?}");
        assert_eq!(LogicalEvaluator::is_truthy(&value, true), lenient, "lenient {value:?}");
    }

    #[test]
    fn test_not() {
        assert_eq!(LogicalEvaluator::evaluate_not(&Value::Null, false), Value::Boolean(true));
        assert_eq!(
            LogicalEvaluator::evaluate_not(&Value::text("x"), false),
            Value::Boolean(false)
        );
    }
}

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

//! Arithmetic operations evaluator

use crate::ast::BinaryOperator;
use crate::evaluator::{EvaluationError, EvaluationResult};
use crate::model::{Numeric, Value};
use num_bigint::BigInt;
use num_traits::Zero;
use rust_decimal::Decimal;

/// Specialized evaluator for arithmetic operations
///
/// Integer operands stay exact. A decimal on either side promotes both sides
/// to `Decimal` with overflow checks. Numeric text is accepted by every
/// operator except `+`, which concatenates unless both sides already are
/// numbers.
pub struct ArithmeticEvaluator;

enum Operands {
    Integers(BigInt, BigInt),
    Decimals(Decimal, Decimal),
}

impl ArithmeticEvaluator {
    /// Dispatch an arithmetic binary operator
    pub fn evaluate(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Value> {
        match op {
            BinaryOperator::Add => Self::evaluate_addition(left, right),
            BinaryOperator::Subtract => Self::evaluate_subtraction(left, right),
            BinaryOperator::Multiply => Self::evaluate_multiplication(left, right),
            BinaryOperator::Divide => Self::evaluate_division(left, right),
            BinaryOperator::Remainder => Self::evaluate_remainder(left, right),
            other => Err(EvaluationError::InvalidOperation {
                message: format!("'{other}' is not an arithmetic operator"),
            }),
        }
    }

    /// Numeric addition, or concatenation of both textual forms
    pub fn evaluate_addition(left: &Value, right: &Value) -> EvaluationResult<Value> {
        if left.is_number() && right.is_number() {
            return match Self::operands(left, right, "+")? {
                Operands::Integers(a, b) => Ok(Value::Integer(a + b)),
                Operands::Decimals(a, b) => checked(a.checked_add(b), || format!("{a} + {b}")),
            };
        }
        Ok(Value::text(format!("{left}{right}")))
    }

    /// Evaluate subtraction
    pub fn evaluate_subtraction(left: &Value, right: &Value) -> EvaluationResult<Value> {
        match Self::operands(left, right, "-")? {
            Operands::Integers(a, b) => Ok(Value::Integer(a - b)),
            Operands::Decimals(a, b) => checked(a.checked_sub(b), || format!("{a} - {b}")),
        }
    }

    /// Evaluate multiplication
    pub fn evaluate_multiplication(left: &Value, right: &Value) -> EvaluationResult<Value> {
        match Self::operands(left, right, "*")? {
            Operands::Integers(a, b) => Ok(Value::Integer(a * b)),
            Operands::Decimals(a, b) => checked(a.checked_mul(b), || format!("{a} * {b}")),
        }
    }

    /// Evaluate division; an exact integer quotient stays an integer
    pub fn evaluate_division(left: &Value, right: &Value) -> EvaluationResult<Value> {
        match Self::operands(left, right, "/")? {
            Operands::Integers(_, b) if b.is_zero() => Err(EvaluationError::DivisionByZero),
            Operands::Integers(a, b) if (&a % &b).is_zero() => Ok(Value::Integer(a / b)),
            Operands::Integers(a, b) => {
                let (a, b) = (promote(Numeric::Integer(a))?, promote(Numeric::Integer(b))?);
                Self::divide_decimals(a, b)
            }
            Operands::Decimals(a, b) => Self::divide_decimals(a, b),
        }
    }

    /// Evaluate remainder; the sign follows the dividend
    pub fn evaluate_remainder(left: &Value, right: &Value) -> EvaluationResult<Value> {
        match Self::operands(left, right, "%")? {
            Operands::Integers(_, b) if b.is_zero() => Err(EvaluationError::DivisionByZero),
            Operands::Integers(a, b) => Ok(Value::Integer(a % b)),
            Operands::Decimals(_, b) if b.is_zero() => Err(EvaluationError::DivisionByZero),
            Operands::Decimals(a, b) => checked(a.checked_rem(b), || format!("{a} % {b}")),
        }
    }

    /// Evaluate unary minus
    pub fn evaluate_negation(operand: &Value) -> EvaluationResult<Value> {
        Numeric::from_value(operand, true)
            .map(|n| n.negate().into_value())
            .ok_or_else(|| EvaluationError::type_error("number", operand.type_name()))
    }

    fn divide_decimals(a: Decimal, b: Decimal) -> EvaluationResult<Value> {
        if b.is_zero() {
            return Err(EvaluationError::DivisionByZero);
        }
        checked(a.checked_div(b).map(|d| d.normalize()), || format!("{a} / {b}"))
    }

    fn operands(left: &Value, right: &Value, symbol: &str) -> EvaluationResult<Operands> {
        let numeric = |value: &Value| {
            Numeric::from_value(value, true).ok_or_else(|| EvaluationError::TypeError {
                expected: format!("number operand for '{symbol}'"),
                actual: value.type_name().to_string(),
            })
        };
        match (numeric(left)?, numeric(right)?) {
            (Numeric::Integer(a), Numeric::Integer(b)) => Ok(Operands::Integers(a, b)),
            (a, b) => Ok(Operands::Decimals(promote(a)?, promote(b)?)),
        }
    }
}

fn promote(number: Numeric) -> EvaluationResult<Decimal> {
    number.to_decimal().ok_or_else(|| EvaluationError::NumericOverflow {
        value: format!("{} does not fit a decimal", number.into_value()),
    })
}

fn checked(result: Option<Decimal>, describe: impl FnOnce() -> String) -> EvaluationResult<Value> {
    result
        .map(Value::Decimal)
        .ok_or_else(|| EvaluationError::NumericOverflow { value: describe() })
}

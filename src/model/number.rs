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

//! Numeric view over values
//!
//! Integers stay exact as `BigInt`; as soon as a decimal takes part in an
//! operation both sides are promoted to `Decimal`.

use super::value::Value;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

/// A value viewed as a number
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    /// Exact integer
    Integer(BigInt),
    /// Decimal number
    Decimal(Decimal),
}

impl Numeric {
    /// View a value as a number.
    ///
    /// Numbers convert directly. Text converts only when `coerce_text` is set
    /// and the trimmed text starts like a number and parses completely.
    pub fn from_value(value: &Value, coerce_text: bool) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(Self::Integer(i.clone())),
            Value::Decimal(d) => Some(Self::Decimal(*d)),
            Value::Text(text) if coerce_text => Self::parse(text),
            _ => None,
        }
    }

    /// Parse numeric text: plain digits are integers, a fraction or exponent makes a decimal
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let first = text.bytes().next()?;
        if !(first.is_ascii_digit() || first == b'+' || first == b'-') {
            return None;
        }

        let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return BigInt::from_str(text.strip_prefix('+').unwrap_or(text))
                .ok()
                .map(Self::Integer);
        }

        if digits.contains(['e', 'E']) {
            Decimal::from_scientific(text).ok().map(Self::Decimal)
        } else {
            Decimal::from_str(text).ok().map(Self::Decimal)
        }
    }

    /// Convert to a decimal, `None` when an integer exceeds decimal range
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Decimal::from_str_exact(&i.to_string()).ok(),
            Self::Decimal(d) => Some(*d),
        }
    }

    /// Whether the number equals zero
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Integer(i) => i.is_zero(),
            Self::Decimal(d) => d.is_zero(),
        }
    }

    /// Whether the number is a decimal
    pub fn is_decimal(&self) -> bool {
        matches!(self, Self::Decimal(_))
    }

    /// Numeric ordering, `None` when a conversion overflows
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            _ => Some(self.to_decimal()?.cmp(&other.to_decimal()?)),
        }
    }

    /// Negate the number
    pub fn negate(self) -> Self {
        match self {
            Self::Integer(i) => Self::Integer(-i),
            Self::Decimal(d) => Self::Decimal(-d),
        }
    }

    /// Absolute value
    pub fn abs(&self) -> Self {
        match self {
            Self::Integer(i) => Self::Integer(i.abs()),
            Self::Decimal(d) => Self::Decimal(d.abs()),
        }
    }

    /// Turn back into a value
    pub fn into_value(self) -> Value {
        match self {
            Self::Integer(i) => Value::Integer(i),
            Self::Decimal(d) => Value::Decimal(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("13", Some(Numeric::Integer(BigInt::from(13))))]
    #[case(" -4 ", Some(Numeric::Integer(BigInt::from(-4))))]
    #[case("+7", Some(Numeric::Integer(BigInt::from(7))))]
    #[case("13.0", Some(Numeric::Decimal(Decimal::from_str("13.0").unwrap())))]
    #[case("1e3", Some(Numeric::Decimal(Decimal::from(1000))))]
    #[case("abc", None)]
    #[case(".5", None)]
    #[case("12abc", None)]
    #[case("", None)]
    fn test_parse(#[case] input: &str, #[case] expected: Option<Numeric>) {
        assert_eq!(Numeric::parse(input), expected);
    }

    #[test]
    fn test_huge_integer_stays_exact() {
        let big = Numeric::parse("123456789012345678901234567890123456789").unwrap();
        assert!(matches!(big, Numeric::Integer(_)));
        assert_eq!(big.to_decimal(), None);
    }

    #[test]
    fn test_mixed_compare() {
        let a = Numeric::parse("13").unwrap();
        let b = Numeric::parse("13.0").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn test_text_coercion_is_opt_in() {
        let text = Value::text("5");
        assert_eq!(Numeric::from_value(&text, false), None);
        assert!(Numeric::from_value(&text, true).is_some());
    }
}

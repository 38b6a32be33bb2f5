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

//! Operator definitions

use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Logical OR (`or`, `||`), short-circuiting
    Or,
    /// Logical AND (`and`, `&&`), short-circuiting
    And,
    /// Equality (`==`, `eq`)
    Equal,
    /// Inequality (`!=`, `ne`, `neq`)
    NotEqual,
    /// Greater than (`>`, `gt`)
    GreaterThan,
    /// Greater than or equal (`>=`, `ge`)
    GreaterThanOrEqual,
    /// Less than (`<`, `lt`)
    LessThan,
    /// Less than or equal (`<=`, `le`)
    LessThanOrEqual,
    /// Addition or text concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`, `div`)
    Divide,
    /// Remainder (`%`, `mod`)
    Remainder,
}

impl BinaryOperator {
    /// Canonical symbol
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
        }
    }

    /// Whether the right operand may be skipped
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Self::Or | Self::And)
    }

    /// Whether this is `==` or `!=`
    pub const fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }

    /// Whether this is one of the ordering comparisons
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqual | Self::LessThan | Self::LessThanOrEqual
        )
    }

    /// Whether this is an arithmetic operator
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Remainder
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Boolean negation (`!`, `not`)
    Not,
    /// Numeric negation (`-`)
    Minus,
}

impl UnaryOperator {
    /// Canonical symbol
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Minus => "-",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

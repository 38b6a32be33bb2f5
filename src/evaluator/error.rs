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

// Error types for expression evaluation

use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Type error during evaluation
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type found
        actual: String,
    },

    /// Variable not found (only raised with strict variable resolution)
    #[error("Variable {name} not found")]
    VariableNotFound {
        /// Variable name
        name: String,
    },

    /// Property not found
    #[error("Property {property} not found on {target_type}")]
    PropertyNotFound {
        /// Property name
        property: String,
        /// Type of the navigated value
        target_type: String,
    },

    /// Method not found
    #[error("Method {method} not found on {target_type}")]
    MethodNotFound {
        /// Method name
        method: String,
        /// Type of the receiver
        target_type: String,
    },

    /// Member access on null
    #[error("Cannot access '{member}' on null")]
    NullNavigation {
        /// Property, method or index that was accessed
        member: String,
    },

    /// Construct refused by restricted mode or the member denylist
    #[error("{message}")]
    Forbidden {
        /// Error message
        message: String,
    },

    /// Division or remainder by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Relational comparison between values without an ordering
    #[error("Cannot compare {left} and {right} with '{operator}'")]
    IncomparableValues {
        /// Left operand type
        left: String,
        /// Right operand type
        right: String,
        /// Operator
        operator: String,
    },

    /// Message key without a translation
    #[error("No message found for key '{key}' and locale '{locale}'")]
    MessageNotFound {
        /// Message key
        key: String,
        /// Locale the lookup used
        locale: String,
    },

    /// Message key that is empty or not text
    #[error("Invalid message key: {message}")]
    InvalidMessageKey {
        /// Error message
        message: String,
    },

    /// Link base or parameter that cannot be used
    #[error("Invalid link parameter: {message}")]
    InvalidLinkParameter {
        /// Error message
        message: String,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for collection of size {size}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Collection size
        size: usize,
    },

    /// Type named by `new` or `T(...)` that the backend does not know
    #[error("Unknown type {type_name}")]
    UnknownType {
        /// Qualified type name
        type_name: String,
    },

    /// Evaluation nested deeper than the configured ceiling
    #[error("Evaluation exceeds the recursion limit of {limit}")]
    RecursionLimit {
        /// Configured limit
        limit: usize,
    },

    /// Arithmetic result outside the decimal range
    #[error("Numeric overflow: {value}")]
    NumericOverflow {
        /// Description of the overflowing operation
        value: String,
    },

    /// Invalid operation
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Error message
        message: String,
    },
}

impl EvaluationError {
    /// Type mismatch for a value of `actual` type
    pub fn type_error(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Forbidden construct
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Whether the error comes from restricted mode or the member denylist
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            EvaluationError::type_error("number", "boolean").to_string(),
            "Type error: expected number, got boolean"
        );
        assert_eq!(
            EvaluationError::IncomparableValues {
                left: "text".into(),
                right: "integer".into(),
                operator: ">".into(),
            }
            .to_string(),
            "Cannot compare text and integer with '>'"
        );
        assert!(EvaluationError::forbidden("no").is_forbidden());
    }
}

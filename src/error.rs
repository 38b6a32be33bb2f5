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

//! Crate-level error type
//!
//! Parse, preprocessing and evaluation failures reach the host paired with
//! the expression text they came from.

use crate::evaluator::EvaluationError;
use crate::parser::ParseError;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ExpressionError>;

/// Error returned by [`ExpressionEngine`](crate::ExpressionEngine)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Expression text violates the grammar
    #[error("Could not parse as expression: \"{source_text}\": {error}")]
    Parse {
        /// Text that failed to parse
        source_text: String,
        /// Underlying parse error
        #[source]
        error: ParseError,
    },

    /// A `__...__` block failed to evaluate
    #[error("Preprocessing of \"{source_text}\" failed: {error}")]
    Preprocessing {
        /// Expression holding the preprocessing block
        source_text: String,
        /// Error raised by the inner expression
        #[source]
        error: EvaluationError,
    },

    /// Evaluation failed
    #[error("Error evaluating \"{source_text}\": {error}")]
    Evaluation {
        /// Evaluated expression text
        source_text: String,
        /// Underlying evaluation error
        #[source]
        error: EvaluationError,
    },

    /// A cache entry does not match its key
    #[error(transparent)]
    CacheConsistency(#[from] CacheConsistencyError),
}

impl ExpressionError {
    /// Expression text the error refers to
    pub fn source_text(&self) -> Option<&str> {
        match self {
            Self::Parse { source_text, .. }
            | Self::Preprocessing { source_text, .. }
            | Self::Evaluation { source_text, .. } => Some(source_text),
            Self::CacheConsistency(_) => None,
        }
    }

    /// Evaluation error behind an evaluation or preprocessing failure
    pub fn evaluation_error(&self) -> Option<&EvaluationError> {
        match self {
            Self::Preprocessing { error, .. } | Self::Evaluation { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether restricted mode or the member denylist refused the expression
    pub fn is_forbidden(&self) -> bool {
        self.evaluation_error()
            .is_some_and(EvaluationError::is_forbidden)
    }
}

/// Internal consistency failure of the expression cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheConsistencyError {
    /// The entry was stored under another expression's text
    #[error("Cache entry for \"{key}\" holds the expression parsed from \"{found}\"")]
    KeyMismatch {
        /// Cache key text
        key: String,
        /// Source text of the cached expression
        found: String,
    },

    /// The cached tree differs from a fresh parse of its key
    #[error("Cache entry for \"{key}\" differs from a fresh parse")]
    StaleEntry {
        /// Cache key text
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_accessors() {
        let err = ExpressionError::Evaluation {
            source_text: "${a.b}".into(),
            error: EvaluationError::NullNavigation { member: "b".into() },
        };
        assert_eq!(err.to_string(), "Error evaluating \"${a.b}\": Cannot access 'b' on null");
        assert_eq!(err.source_text(), Some("${a.b}"));
        assert!(!err.is_forbidden());

        let err = ExpressionError::Preprocessing {
            source_text: "__${x}__".into(),
            error: EvaluationError::forbidden("no"),
        };
        assert!(err.is_forbidden());
    }
}

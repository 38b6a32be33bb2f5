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

//! Evaluation configuration

use serde::{Deserialize, Serialize};

/// Evaluation behaviour settings
///
/// # Examples
///
/// ```rust
/// use template_expressions::evaluator::EvaluationConfig;
///
/// let config = EvaluationConfig::default()
///     .with_strict_variables(true)
///     .with_max_recursion_depth(64);
/// assert!(config.strict_variables);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Maximum depth of nested node evaluation. Default: 256
    pub max_recursion_depth: usize,

    /// Fail with `VariableNotFound` instead of evaluating missing root variables to null.
    /// Default: false
    pub strict_variables: bool,

    /// Render unresolved messages as `??key_locale??` instead of failing. Default: true
    pub message_absent_representation: bool,

    /// Treat `"false"`, `"off"`, `"no"` and numeric zero as false in boolean contexts.
    /// Default: false
    pub lenient_truthiness: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 256,
            strict_variables: false,
            message_absent_representation: true,
            lenient_truthiness: false,
        }
    }
}

impl EvaluationConfig {
    /// Create configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Enable or disable strict variable resolution
    pub fn with_strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    /// Enable or disable the `??key_locale??` rendering of missing messages
    pub fn with_message_absent_representation(mut self, enabled: bool) -> Self {
        self.message_absent_representation = enabled;
        self
    }

    /// Enable or disable lenient truthiness
    pub fn with_lenient_truthiness(mut self, lenient: bool) -> Self {
        self.lenient_truthiness = lenient;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_deserialization() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{"strict_variables": true}"#).unwrap();
        assert!(config.strict_variables);
        assert_eq!(config.max_recursion_depth, 256);
        assert!(config.message_absent_representation);
    }
}

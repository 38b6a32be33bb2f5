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

//! Fragment descriptors

use super::value::{Value, ValueMap};
use std::fmt;

/// Fragment reference produced by evaluating `~{template :: selector (params)}`
///
/// Resolving the fragment into markup belongs to the host template engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    /// Template name, `None` for the current template
    pub template_name: Option<String>,
    /// Selector inside the template, `None` for the whole template
    pub selector: Option<String>,
    /// Parameters passed to the fragment
    pub parameters: ValueMap,
    /// Whether parameter names were generated (`_arg0`, `_arg1`, ...) for positional arguments
    pub synthetic_parameters: bool,
}

impl Fragment {
    /// Prefix of generated parameter names
    pub const SYNTHETIC_PARAMETER_PREFIX: &'static str = "_arg";

    /// The empty fragment, `~{}`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty fragment
    pub fn is_empty(&self) -> bool {
        self.template_name.is_none() && self.selector.is_none()
    }

    /// Generated name for the positional parameter at `index`
    pub fn synthetic_parameter_name(index: usize) -> String {
        format!("{}{index}", Self::SYNTHETIC_PARAMETER_PREFIX)
    }

    /// Look up a parameter
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{{")?;
        if let Some(template) = &self.template_name {
            write!(f, "{template}")?;
        }
        if let Some(selector) = &self.selector {
            if self.template_name.is_some() {
                write!(f, " ")?;
            }
            write!(f, ":: {selector}")?;
        }
        if !self.parameters.is_empty() {
            let params: Vec<String> = self
                .parameters
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            write!(f, " ({})", params.join(", "))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment() {
        let fragment = Fragment::empty();
        assert!(fragment.is_empty());
        assert_eq!(fragment.to_string(), "~{}");
    }

    #[test]
    fn test_display_with_parameters() {
        let mut fragment = Fragment {
            template_name: Some("footer".into()),
            selector: Some("copy".into()),
            ..Default::default()
        };
        fragment
            .parameters
            .insert(Fragment::synthetic_parameter_name(0), Value::from(2011));
        assert_eq!(fragment.to_string(), "~{footer :: copy (_arg0=2011)}");
    }
}

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

//! Evaluation context consumed by the evaluator
//!
//! The context is supplied by the host per render. It resolves root
//! variables, messages and links, carries the locale and restricted flag and
//! provides the navigation backend used for property and method access.

use super::error::EvaluationResult;
use crate::link::StandardLinkBuilder;
use crate::model::{Locale, Navigation, Value, ValueMap};
use crate::navigation::{DefaultNavigator, Navigator};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Link parameters in authored order; `None` marks a valueless parameter
pub type LinkParameters = IndexMap<String, Option<Value>>;

static DEFAULT_NAVIGATOR: DefaultNavigator = DefaultNavigator;

/// Capabilities the evaluator needs from the host
pub trait EvaluationContext {
    /// Resolve a root variable; `#name` utility objects are looked up with their `#`
    fn lookup_variable(&self, name: &str) -> Navigation;

    /// Locale of the current render
    fn locale(&self) -> &Locale;

    /// Resolve and format a message, `None` when the key is unknown
    fn resolve_message(&self, key: &str, args: &[Value]) -> Option<String>;

    /// Build a URL from an evaluated base and parameters
    fn build_link(&self, base: &str, parameters: &LinkParameters) -> EvaluationResult<String>;

    /// Whether the expression comes from a less trusted source
    fn is_restricted(&self) -> bool {
        false
    }

    /// Backend for property reads, method calls and indexing
    fn navigator(&self) -> &dyn Navigator {
        &DEFAULT_NAVIGATOR
    }

    /// Object `*{...}` roots resolve against
    fn selection_target(&self) -> Option<Value> {
        None
    }
}

/// Ready-made context backed by in-memory maps
///
/// # Examples
///
/// ```rust
/// use template_expressions::evaluator::StandardContext;
/// use template_expressions::model::{Locale, Value};
///
/// let context = StandardContext::new(Locale::parse("en_US"))
///     .with_variable("name", Value::text("Lucy"))
///     .with_message("greeting", "Hello, {0}!");
/// ```
#[derive(Clone)]
pub struct StandardContext {
    variables: ValueMap,
    locale: Locale,
    messages: FxHashMap<String, String>,
    link_builder: StandardLinkBuilder,
    restricted: bool,
    selection: Option<Value>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for StandardContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardContext")
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .field("locale", &self.locale)
            .field("messages", &self.messages.len())
            .field("restricted", &self.restricted)
            .finish()
    }
}

impl Default for StandardContext {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl StandardContext {
    /// Empty context for a locale
    pub fn new(locale: Locale) -> Self {
        Self {
            variables: ValueMap::new(),
            locale,
            messages: FxHashMap::default(),
            link_builder: StandardLinkBuilder::default(),
            restricted: false,
            selection: None,
            navigator: Arc::new(DefaultNavigator::new()),
        }
    }

    /// Add a root variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Add a message pattern; `{0}`, `{1}`, ... are replaced by the arguments
    pub fn with_message(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.messages.insert(key.into(), pattern.into());
        self
    }

    /// Replace the link builder
    pub fn with_link_builder(mut self, builder: StandardLinkBuilder) -> Self {
        self.link_builder = builder;
        self
    }

    /// Mark the context restricted
    pub fn with_restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    /// Set the selection target for `*{...}`
    pub fn with_selection(mut self, target: impl Into<Value>) -> Self {
        self.selection = Some(target.into());
        self
    }

    /// Replace the navigation backend
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Set or replace a root variable in place
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }
}

/// Replace `{n}` placeholders with the matching argument text
pub fn format_message(pattern: &str, args: &[Value]) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|index| (index, close)));
        match placeholder {
            Some((index, close)) => {
                match args.get(index) {
                    Some(arg) => result.push_str(&arg.to_text()),
                    None => result.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

impl EvaluationContext for StandardContext {
    fn lookup_variable(&self, name: &str) -> Navigation {
        self.variables.get(name).cloned().into()
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }

    fn resolve_message(&self, key: &str, args: &[Value]) -> Option<String> {
        self.messages
            .get(key)
            .map(|pattern| format_message(pattern, args))
    }

    fn build_link(&self, base: &str, parameters: &LinkParameters) -> EvaluationResult<String> {
        self.link_builder.build(base, parameters)
    }

    fn is_restricted(&self) -> bool {
        self.restricted
    }

    fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    fn selection_target(&self) -> Option<Value> {
        self.selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Hello, {0}!", "Hello, Lucy!")]
    #[case("{0} and {1}", "Lucy and 3")]
    #[case("{2} stays", "{2} stays")]
    #[case("{x} {0", "{x} {0")]
    #[case("no placeholders", "no placeholders")]
    fn test_format_message(#[case] pattern: &str, #[case] expected: &str) {
        let args = [Value::text("Lucy"), Value::integer(3)];
        assert_eq!(format_message(pattern, &args), expected);
    }

    #[test]
    fn test_standard_context_lookup() {
        let context = StandardContext::default()
            .with_variable("a", 1)
            .with_message("k", "v {0}");
        assert_eq!(context.lookup_variable("a"), Navigation::Found(Value::integer(1)));
        assert_eq!(context.lookup_variable("b"), Navigation::NotFound);
        assert_eq!(
            context.resolve_message("k", &[Value::text("x")]).as_deref(),
            Some("v x")
        );
        assert_eq!(context.resolve_message("missing", &[]), None);
        assert!(!context.is_restricted());
    }
}

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

//! Message, link and fragment expressions
//!
//! These atoms evaluate their parts and hand the results to the context:
//! messages to `resolve_message`, links to `build_link`. Fragments become a
//! [`Fragment`] descriptor for the host to resolve.

use super::context::LinkParameters;
use super::engine::Evaluator;
use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{FragmentData, FragmentParameters, LinkData, MessageData};
use crate::model::{Fragment, Value, ValueMap};
use std::sync::Arc;

impl Evaluator<'_> {
    /// `#{key(args)}`
    pub(super) fn evaluate_message(&mut self, data: &MessageData) -> EvaluationResult<Value> {
        let key = self.evaluate(&data.key)?.to_text();
        if key.trim().is_empty() {
            return Err(EvaluationError::InvalidMessageKey {
                message: "message key is empty or blank".to_string(),
            });
        }
        let args = self.evaluate_all(&data.args)?;

        if let Some(message) = self.context.resolve_message(&key, &args) {
            return Ok(Value::text(message));
        }
        let locale = self.context.locale().to_string();
        if self.config.message_absent_representation {
            log::trace!("no message for {key} in {locale}");
            Ok(Value::text(format!("??{key}_{locale}??")))
        } else {
            Err(EvaluationError::MessageNotFound {
                key,
                locale,
            })
        }
    }

    /// `@{base(params)}`
    pub(super) fn evaluate_link(&mut self, data: &LinkData) -> EvaluationResult<Value> {
        let base = self.evaluate_restricted(&data.base)?;
        if base.is_null() {
            return Err(EvaluationError::InvalidLinkParameter {
                message: "link base evaluated to null".to_string(),
            });
        }
        let base = base.to_text();

        let mut parameters = LinkParameters::with_capacity(data.parameters.len());
        for assignation in &data.parameters {
            let name = self.evaluate(&assignation.name)?.to_text();
            if name.is_empty() {
                return Err(EvaluationError::InvalidLinkParameter {
                    message: format!("empty parameter name in link '{base}'"),
                });
            }
            let value = match &assignation.value {
                Some(expr) => match self.evaluate(expr)? {
                    Value::Null => Some(Value::text("")),
                    value => Some(value),
                },
                None => None,
            };

            let existing = parameters
                .keys()
                .position(|key| key.eq_ignore_ascii_case(&name));
            match existing.and_then(|index| parameters.get_index_mut(index)) {
                Some((_, slot)) => *slot = accumulate(slot.take(), value),
                None => {
                    parameters.insert(name, value);
                }
            }
        }

        self.context.build_link(&base, &parameters).map(Value::text)
    }

    /// `~{template :: selector (params)}`
    pub(super) fn evaluate_fragment(&mut self, data: &FragmentData) -> EvaluationResult<Value> {
        if data.is_empty() {
            return Ok(Value::Fragment(Arc::new(Fragment::empty())));
        }

        let template_name = self.evaluate_optional_name(data.template.as_ref())?;
        let selector = self.evaluate_optional_name(data.selector.as_ref())?;

        let mut parameters = ValueMap::new();
        let synthetic_parameters = match &data.parameters {
            FragmentParameters::None => false,
            FragmentParameters::Named(assignations) => {
                for assignation in assignations {
                    let name = self.evaluate(&assignation.name)?.to_text();
                    if name.is_empty() {
                        return Err(EvaluationError::InvalidOperation {
                            message: "fragment parameter name cannot be empty".to_string(),
                        });
                    }
                    let value = match &assignation.value {
                        Some(expr) => self.evaluate(expr)?,
                        None => Value::Null,
                    };
                    parameters.insert(name, value);
                }
                false
            }
            FragmentParameters::Positional(values) => {
                for (index, expr) in values.iter().enumerate() {
                    let value = self.evaluate(expr)?;
                    parameters.insert(Fragment::synthetic_parameter_name(index), value);
                }
                true
            }
        };

        Ok(Value::Fragment(Arc::new(Fragment {
            template_name,
            selector,
            parameters,
            synthetic_parameters,
        })))
    }

    fn evaluate_optional_name(
        &mut self,
        node: Option<&crate::ast::ExpressionNode>,
    ) -> EvaluationResult<Option<String>> {
        let Some(node) = node else {
            return Ok(None);
        };
        let name = self.evaluate(node)?.to_text();
        Ok((!name.is_empty()).then_some(name))
    }
}

/// Merge a repeated link parameter into a list
fn accumulate(existing: Option<Value>, value: Option<Value>) -> Option<Value> {
    match (existing, value) {
        (None, value) | (value, None) => value,
        (Some(Value::List(items)), Some(value)) => {
            let mut items = Arc::unwrap_or_clone(items);
            items.push(value);
            Some(Value::from(items))
        }
        (Some(first), Some(value)) => Some(Value::list([first, value])),
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{
        EvaluationConfig, EvaluationError, EvaluationResult, Evaluator, StandardContext,
    };
    use crate::guard::RestrictionGuard;
    use crate::link::StandardLinkBuilder;
    use crate::model::{Fragment, Locale, Value};
    use crate::parser::parse_expression;
    use pretty_assertions::assert_eq;

    fn context() -> StandardContext {
        StandardContext::new(Locale::parse("en_US"))
            .with_variable("name", "Lucy")
            .with_variable("id", 42)
            .with_message("welcome", "Welcome, {0}!")
            .with_message("plain", "Hello")
            .with_message("42", "The answer")
            .with_variable("blank", "   ")
            .with_link_builder(StandardLinkBuilder::new("/app"))
    }

    fn eval_with(input: &str, config: &EvaluationConfig) -> EvaluationResult<Value> {
        let expr = parse_expression(input).unwrap();
        let guard = RestrictionGuard::default();
        let context = context();
        Evaluator::new(config, &guard, &context, false).evaluate(&expr)
    }

    fn eval(input: &str) -> EvaluationResult<Value> {
        eval_with(input, &EvaluationConfig::default())
    }

    #[test]
    fn test_messages() {
        assert_eq!(eval("#{plain}"), Ok(Value::text("Hello")));
        assert_eq!(eval("#{welcome(${name})}"), Ok(Value::text("Welcome, Lucy!")));
        assert_eq!(eval("#{missing.key}"), Ok(Value::text("??missing.key_en_US??")));

        let strict = EvaluationConfig::default().with_message_absent_representation(false);
        assert_eq!(
            eval_with("#{missing.key}", &strict),
            Err(EvaluationError::MessageNotFound {
                key: "missing.key".into(),
                locale: "en_US".into()
            })
        );
        assert!(matches!(
            eval("#{${nothing}}"),
            Err(EvaluationError::InvalidMessageKey { .. })
        ));
    }

    #[test]
    fn test_message_keys_are_converted_to_text() {
        assert_eq!(eval("#{${id}}"), Ok(Value::text("The answer")));
        assert_eq!(
            eval("#{${blank}}"),
            Err(EvaluationError::InvalidMessageKey {
                message: "message key is empty or blank".into()
            })
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(
            eval("@{/order/details(id=${id},mode='full')}"),
            Ok(Value::text("/app/order/details?id=42&mode=full"))
        );
        assert_eq!(
            eval("@{/order/{id}/details(id=${id},flag)}"),
            Ok(Value::text("/app/order/42/details?flag"))
        );
        assert_eq!(
            eval("@{/search(q=a,Q=b)}"),
            Ok(Value::text("/app/search?q=a&q=b"))
        );
        assert_eq!(
            eval("@{/search(q=${nothing})}"),
            Ok(Value::text("/app/search?q="))
        );
    }

    #[test]
    fn test_fragments() {
        let Ok(Value::Fragment(fragment)) = eval("~{footer :: copy (${id}, 'x')}") else {
            panic!("expected a fragment");
        };
        assert_eq!(fragment.template_name.as_deref(), Some("footer"));
        assert_eq!(fragment.selector.as_deref(), Some("copy"));
        assert!(fragment.synthetic_parameters);
        assert_eq!(fragment.parameter("_arg0"), Some(&Value::integer(42)));
        assert_eq!(fragment.parameter("_arg1"), Some(&Value::text("x")));

        let Ok(Value::Fragment(named)) = eval("~{::menu (active=${name})}") else {
            panic!("expected a fragment");
        };
        assert_eq!(named.template_name, None);
        assert!(!named.synthetic_parameters);
        assert_eq!(named.parameter("active"), Some(&Value::text("Lucy")));

        assert_eq!(eval("~{}"), Ok(Value::Fragment(Fragment::empty().into())));
    }
}

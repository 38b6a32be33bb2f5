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

//! Navigation over maps, lists, text and host objects

use super::Navigator;
use crate::evaluator::{EvaluationError, EvaluationResult};
use crate::model::{Navigation, Numeric, Value, ValueMap};
use num_traits::ToPrimitive;

/// Navigator for the built-in value model
///
/// Map properties and keys that are missing read as null. Text and list
/// helpers follow the usual bean names (`length()`, `isEmpty()`,
/// `toUpperCase()`, ...). Host object properties fall back to `getX()` and
/// `isX()` accessors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNavigator;

impl DefaultNavigator {
    /// Create the navigator
    pub fn new() -> Self {
        Self
    }

    fn text_method(text: &str, method: &str, args: &[Value]) -> Navigation {
        let value = match (method, args) {
            ("length", []) => Value::from(text.chars().count()),
            ("isEmpty", []) => Value::Boolean(text.is_empty()),
            ("toUpperCase", []) => Value::text(text.to_uppercase()),
            ("toLowerCase", []) => Value::text(text.to_lowercase()),
            ("trim", []) => Value::text(text.trim()),
            ("startsWith", [prefix]) => Value::Boolean(text.starts_with(&prefix.to_text())),
            ("endsWith", [suffix]) => Value::Boolean(text.ends_with(&suffix.to_text())),
            ("contains", [part]) => Value::Boolean(text.contains(&part.to_text())),
            ("indexOf", [part]) => match text.find(&part.to_text()) {
                Some(byte) => Value::from(text[..byte].chars().count()),
                None => Value::integer(-1),
            },
            ("concat", [other]) => Value::text(format!("{text}{}", other.to_text())),
            ("replace", [from, to]) => Value::text(text.replace(&from.to_text(), &to.to_text())),
            ("substring", [begin]) => match position_of(begin) {
                Some(begin) => Value::text(text.chars().skip(begin).collect::<String>()),
                None => return Navigation::NotFound,
            },
            ("substring", [begin, end]) => match (position_of(begin), position_of(end)) {
                (Some(begin), Some(end)) => Value::text(
                    text.chars()
                        .skip(begin)
                        .take(end.saturating_sub(begin))
                        .collect::<String>(),
                ),
                _ => return Navigation::NotFound,
            },
            _ => return Navigation::NotFound,
        };
        Navigation::Found(value)
    }

    fn list_method(items: &[Value], method: &str, args: &[Value]) -> Navigation {
        let value = match (method, args) {
            ("size", []) => Value::from(items.len()),
            ("isEmpty", []) => Value::Boolean(items.is_empty()),
            ("contains", [item]) => Value::Boolean(items.contains(item)),
            ("indexOf", [item]) => match items.iter().position(|candidate| candidate == item) {
                Some(index) => Value::from(index),
                None => Value::integer(-1),
            },
            ("get", [index]) => match position_of(index).and_then(|i| items.get(i)) {
                Some(item) => item.clone(),
                None => return Navigation::NotFound,
            },
            _ => return Navigation::NotFound,
        };
        Navigation::Found(value)
    }

    fn map_method(map: &ValueMap, method: &str, args: &[Value]) -> Navigation {
        let value = match (method, args) {
            ("size", []) => Value::from(map.len()),
            ("isEmpty", []) => Value::Boolean(map.is_empty()),
            ("containsKey", [key]) => Value::Boolean(map.contains_key(key.to_text().as_str())),
            ("get", [key]) => map.get(key.to_text().as_str()).cloned().unwrap_or_default(),
            ("keySet", []) => Value::list(map.keys().map(Value::text)),
            ("values", []) => Value::list(map.values().cloned()),
            _ => return Navigation::NotFound,
        };
        Navigation::Found(value)
    }

    /// Methods every value answers
    fn common_method(target: &Value, method: &str, args: &[Value]) -> Navigation {
        match (method, args) {
            ("toString", []) => Navigation::Found(Value::text(target.to_text())),
            ("equals", [other]) => Navigation::Found(Value::Boolean(target == other)),
            _ => Navigation::NotFound,
        }
    }
}

/// `name` → `Name`
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Integral position from an integer, an integral decimal or numeric text
fn integral_of(value: &Value) -> Option<i64> {
    match Numeric::from_value(value, true)? {
        Numeric::Integer(i) => i.to_i64(),
        Numeric::Decimal(d) if d.fract().is_zero() => d.to_i64(),
        Numeric::Decimal(_) => None,
    }
}

fn position_of(value: &Value) -> Option<usize> {
    integral_of(value).and_then(|i| usize::try_from(i).ok())
}

fn index_error(index: &Value) -> EvaluationError {
    EvaluationError::type_error("integer index", index.type_name())
}

impl Navigator for DefaultNavigator {
    fn get_property(&self, target: &Value, name: &str) -> Navigation {
        match target {
            Value::Map(map) => Navigation::Found(map.get(name).cloned().unwrap_or_default()),
            Value::List(items) => match name {
                "size" | "length" => Navigation::Found(Value::from(items.len())),
                "empty" => Navigation::Found(Value::Boolean(items.is_empty())),
                _ => Navigation::NotFound,
            },
            Value::Text(text) => match name {
                "length" => Navigation::Found(Value::from(text.chars().count())),
                "empty" => Navigation::Found(Value::Boolean(text.is_empty())),
                _ => Navigation::NotFound,
            },
            Value::Fragment(fragment) => match name {
                "templateName" => Navigation::Found(Value::from(fragment.template_name.clone())),
                "selector" => Navigation::Found(Value::from(fragment.selector.clone())),
                _ => fragment.parameter(name).cloned().into(),
            },
            Value::Object(object) => object
                .property(name)
                .or_else(|| object.invoke(&format!("get{}", capitalize(name)), &[]))
                .or_else(|| object.invoke(&format!("is{}", capitalize(name)), &[])),
            _ => Navigation::NotFound,
        }
    }

    fn invoke_method(&self, target: &Value, method: &str, args: &[Value]) -> Navigation {
        let result = match target {
            Value::Object(object) => object.invoke(method, args),
            Value::Text(text) => Self::text_method(text, method, args),
            Value::List(items) => Self::list_method(items, method, args),
            Value::Map(map) => Self::map_method(map, method, args),
            _ => Navigation::NotFound,
        };
        result.or_else(|| Self::common_method(target, method, args))
    }

    fn index(&self, target: &Value, index: &Value) -> EvaluationResult<Value> {
        match target {
            Value::List(items) => {
                let position = integral_of(index).ok_or_else(|| index_error(index))?;
                usize::try_from(position)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(EvaluationError::IndexOutOfBounds {
                        index: position,
                        size: items.len(),
                    })
            }
            Value::Text(text) => {
                let position = integral_of(index).ok_or_else(|| index_error(index))?;
                usize::try_from(position)
                    .ok()
                    .and_then(|i| text.chars().nth(i))
                    .map(|c| Value::text(c.to_string()))
                    .ok_or_else(|| EvaluationError::IndexOutOfBounds {
                        index: position,
                        size: text.chars().count(),
                    })
            }
            Value::Map(map) => Ok(map.get(index.to_text().as_str()).cloned().unwrap_or_default()),
            Value::Fragment(fragment) => Ok(fragment
                .parameter(&index.to_text())
                .cloned()
                .unwrap_or_default()),
            Value::Object(object) => {
                let key = index.to_text();
                self.get_property(target, &key)
                    .found()
                    .ok_or_else(|| EvaluationError::PropertyNotFound {
                        property: key,
                        target_type: object.type_name().to_string(),
                    })
            }
            other => Err(EvaluationError::type_error(
                "list, map or text",
                other.type_name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HostObject;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[derive(Debug)]
    struct Account {
        owner: &'static str,
        active: bool,
    }

    impl HostObject for Account {
        fn type_name(&self) -> &str {
            "app.Account"
        }

        fn invoke(&self, method: &str, args: &[Value]) -> Navigation {
            match (method, args) {
                ("getOwner", []) => Navigation::Found(Value::text(self.owner)),
                ("isActive", []) => Navigation::Found(Value::Boolean(self.active)),
                _ => Navigation::NotFound,
            }
        }
    }

    #[test]
    fn test_map_and_list_properties() {
        let nav = DefaultNavigator::new();
        let map = Value::map([("a", Value::integer(1))]);
        assert_eq!(nav.get_property(&map, "a"), Navigation::Found(Value::integer(1)));
        assert_eq!(nav.get_property(&map, "missing"), Navigation::Found(Value::Null));

        let list = Value::list([Value::integer(1), Value::integer(2)]);
        assert_eq!(nav.get_property(&list, "size"), Navigation::Found(Value::integer(2)));
        assert_eq!(nav.get_property(&list, "first"), Navigation::NotFound);
    }

    #[rstest]
    #[case("toUpperCase", vec![], Value::text("HELLO WORLD"))]
    #[case("length", vec![], Value::integer(11))]
    #[case("startsWith", vec![Value::text("hello")], Value::Boolean(true))]
    #[case("indexOf", vec![Value::text("world")], Value::integer(6))]
    #[case("substring", vec![Value::integer(6)], Value::text("world"))]
    #[case("substring", vec![Value::integer(0), Value::integer(5)], Value::text("hello"))]
    #[case("replace", vec![Value::text("o"), Value::text("0")], Value::text("hell0 w0rld"))]
    #[case("toString", vec![], Value::text("hello world"))]
    fn test_text_methods(#[case] method: &str, #[case] args: Vec<Value>, #[case] expected: Value) {
        let nav = DefaultNavigator::new();
        assert_eq!(
            nav.invoke_method(&Value::text("hello world"), method, &args),
            Navigation::Found(expected)
        );
    }

    #[test]
    fn test_bean_accessors() {
        let nav = DefaultNavigator::new();
        let account = Value::object(Account {
            owner: "Lucy",
            active: true,
        });
        assert_eq!(nav.get_property(&account, "owner"), Navigation::Found(Value::text("Lucy")));
        assert_eq!(nav.get_property(&account, "active"), Navigation::Found(Value::Boolean(true)));
        assert_eq!(nav.get_property(&account, "balance"), Navigation::NotFound);
        assert_eq!(
            nav.invoke_method(&account, "toString", &[]),
            Navigation::Found(Value::text("app.Account"))
        );
    }

    #[test]
    fn test_indexing() {
        let nav = DefaultNavigator::new();
        let list = Value::list([Value::text("a"), Value::text("b"), Value::text("c")]);
        assert_eq!(nav.index(&list, &Value::integer(1)), Ok(Value::text("b")));
        assert_eq!(
            nav.index(&list, &Value::Decimal(Decimal::new(20, 1))),
            Ok(Value::text("c"))
        );
        assert_eq!(
            nav.index(&list, &Value::integer(3)),
            Err(EvaluationError::IndexOutOfBounds { index: 3, size: 3 })
        );
        assert!(matches!(
            nav.index(&list, &Value::Boolean(true)),
            Err(EvaluationError::TypeError { .. })
        ));

        let map = Value::map([("k", Value::integer(7))]);
        assert_eq!(nav.index(&map, &Value::text("k")), Ok(Value::integer(7)));
        assert_eq!(nav.index(&map, &Value::text("x")), Ok(Value::Null));
    }
}

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

//! Runtime values produced by expression evaluation

use super::fragment::Fragment;
use super::host::HostObject;
use indexmap::IndexMap;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Ordered string-keyed map value
pub type ValueMap = IndexMap<String, Value>;

/// Value produced by evaluating an expression
///
/// Operator semantics match exhaustively over these variants, so numeric
/// promotion and the string-concatenation fallback are closed cases.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent or null value
    #[default]
    Null,

    /// The no-op token (`_`), telling the host to leave markup untouched
    NoOp,

    /// Boolean value
    Boolean(bool),

    /// Integer value with arbitrary precision
    Integer(BigInt),

    /// Decimal value, never a binary float
    Decimal(Decimal),

    /// Text value
    Text(Arc<str>),

    /// Ordered list of values
    List(Arc<Vec<Value>>),

    /// Ordered map of values keyed by name
    Map(Arc<ValueMap>),

    /// Fragment descriptor produced by `~{...}`
    Fragment(Arc<Fragment>),

    /// Opaque host object resolved through the navigation backend
    Object(Arc<dyn HostObject>),
}

impl Value {
    /// Create a text value
    pub fn text(value: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(value.as_ref()))
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Self::Integer(BigInt::from(value))
    }

    /// Create a list value
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(Arc::new(items.into_iter().collect()))
    }

    /// Create a map value from `(name, value)` pairs, keeping their order
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Wrap a host object
    pub fn object(object: impl HostObject + 'static) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this is an integer or decimal
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal(_))
    }

    /// Borrow the text content if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean if this is a boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the value's type, used in diagnostics and denylist checks
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::NoOp => "no-op",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Fragment(_) => "fragment",
            Self::Object(obj) => obj.type_name(),
        }
    }

    /// Textual form used for concatenation, substitution and rendering.
    ///
    /// Unlike `Display`, null renders as empty text.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::NoOp, Self::NoOp) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Fragment(a), Self::Fragment(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                Arc::ptr_eq(a, b) || a.equals(b.as_ref())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::NoOp => write!(f, "_"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{}", s.as_ref()),
            Self::List(items) => {
                let item_strings: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", item_strings.join(", "))
            }
            Self::Map(entries) => {
                let entry_strings: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", entry_strings.join(", "))
            }
            Self::Fragment(fragment) => write!(f, "{fragment}"),
            Self::Object(obj) => write!(f, "{}", obj.to_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(Arc::new(value))
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Self::Map(Arc::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_keeps_decimal_scale() {
        let value = Value::Decimal(Decimal::from_str("13.0").unwrap());
        assert_eq!(value.to_string(), "13.0");
    }

    #[test]
    fn test_null_text_is_empty() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_collections_display() {
        let list = Value::list([Value::from(1), Value::from("a")]);
        assert_eq!(list.to_string(), "[1, a]");

        let map = Value::map([("k", Value::from(true))]);
        assert_eq!(map.to_string(), "{k=true}");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::from("x"), Value::text("x"));
        assert_ne!(Value::from(1), Value::from("1"));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }
}

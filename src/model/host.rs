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

//! Host objects and navigation outcomes

use super::value::Value;
use std::fmt;

/// Outcome of a navigation step (variable lookup, property read, method call)
///
/// "Not found" is an ordinary result, not an error: the evaluator decides
/// whether it is fatal for the construct being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// The member resolved to a value
    Found(Value),
    /// Nothing by that name exists on the target
    NotFound,
    /// The member exists but access is refused
    Denied,
}

impl Navigation {
    /// Whether the navigation resolved
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Keep the value if found
    pub fn found(self) -> Option<Value> {
        match self {
            Self::Found(v) => Some(v),
            _ => None,
        }
    }

    /// Chain another lookup when this one did not find anything
    pub fn or_else(self, f: impl FnOnce() -> Navigation) -> Navigation {
        match self {
            Self::NotFound => f(),
            other => other,
        }
    }
}

impl From<Option<Value>> for Navigation {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

/// An object owned by the host application and exposed to expressions
///
/// The record/struct-based navigation strategy: the object answers property
/// reads and method calls itself. `type_name` is the qualified name checked
/// against the member denylist.
pub trait HostObject: fmt::Debug + Send + Sync {
    /// Qualified type name, e.g. `app.model.User`
    fn type_name(&self) -> &str;

    /// Read a property
    fn property(&self, _name: &str) -> Navigation {
        Navigation::NotFound
    }

    /// Invoke a method
    fn invoke(&self, _method: &str, _args: &[Value]) -> Navigation {
        Navigation::NotFound
    }

    /// Whether this object stands for a type (the result of `T(...)`) rather than an instance
    fn is_type(&self) -> bool {
        false
    }

    /// Text used when the object is concatenated or rendered
    fn to_text(&self) -> String {
        self.type_name().to_string()
    }

    /// Value equality with another host object
    fn equals(&self, _other: &dyn HostObject) -> bool {
        false
    }
}

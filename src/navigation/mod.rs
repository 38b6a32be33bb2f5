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

//! Pluggable object-graph navigation
//!
//! The evaluator never inspects host data itself: property reads, method
//! calls, indexing, instantiation and type resolution all go through a
//! [`Navigator`]. Hosts plug in their own backend through the evaluation
//! context; [`DefaultNavigator`] covers maps, lists, text and
//! [`HostObject`](crate::model::HostObject) implementations.

mod default;

pub use default::DefaultNavigator;

use crate::evaluator::EvaluationResult;
use crate::model::{Navigation, Value};

/// Backend resolving navigation steps on values
///
/// Targets are never null: the evaluator reports null navigation before
/// calling into the backend. Member denylist checks also happen before the
/// call, so implementations only decide whether a member exists.
pub trait Navigator: Send + Sync {
    /// Read `target.name`
    fn get_property(&self, target: &Value, name: &str) -> Navigation;

    /// Call `target.method(args)`
    fn invoke_method(&self, target: &Value, method: &str, args: &[Value]) -> Navigation;

    /// Whether `target.name` resolves
    fn has_property(&self, target: &Value, name: &str) -> bool {
        self.get_property(target, name).is_found()
    }

    /// Evaluate `target[index]`
    fn index(&self, target: &Value, index: &Value) -> EvaluationResult<Value>;

    /// Create an instance for `new type_name(args)`
    fn instantiate(&self, _type_name: &str, _args: &[Value]) -> Navigation {
        Navigation::NotFound
    }

    /// Resolve `T(type_name)` to a value standing for the type
    fn resolve_type(&self, _type_name: &str) -> Navigation {
        Navigation::NotFound
    }
}

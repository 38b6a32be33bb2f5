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

//! Member denylist applied to every property read and method call

use super::GuardConfig;
use super::text::normalize;
use crate::model::Value;
use rustc_hash::FxHashSet;

/// Compiled form of the type and member lists in [`GuardConfig`]
#[derive(Debug, Clone)]
pub struct MemberDenylist {
    blocked_type_prefixes: Vec<String>,
    allowed_type_prefixes: Vec<String>,
    blocked_type_reference_prefixes: Vec<String>,
    allowed_types: FxHashSet<String>,
    blocked_members: FxHashSet<String>,
}

/// Members every instance answers regardless of its type
const ALWAYS_ALLOWED_MEMBERS: [&str; 2] = ["getClass", "toString"];

impl MemberDenylist {
    /// Build the denylist from configuration
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            blocked_type_prefixes: config.blocked_type_prefixes.clone(),
            allowed_type_prefixes: config.allowed_type_prefixes.clone(),
            blocked_type_reference_prefixes: config.blocked_type_reference_prefixes.clone(),
            allowed_types: config.allowed_types.iter().cloned().collect(),
            blocked_members: config.blocked_members.iter().cloned().collect(),
        }
    }

    /// Whether the type lives in a package blocked for any use
    pub fn is_type_blocked(&self, type_name: &str) -> bool {
        let has_prefix = |prefixes: &[String]| prefixes.iter().any(|p| type_name.starts_with(p.as_str()));
        has_prefix(&self.blocked_type_prefixes) && !has_prefix(&self.allowed_type_prefixes)
    }

    /// Whether the type may not be named by `T(...)` or `new`
    pub fn is_type_blocked_for_reference(&self, type_name: &str) -> bool {
        self.is_type_blocked(type_name)
            || self
                .blocked_type_reference_prefixes
                .iter()
                .any(|p| type_name.starts_with(p.as_str()))
    }

    /// Whether `T(type_name)` or `new type_name(...)` is allowed
    pub fn is_type_allowed(&self, type_name: &str) -> bool {
        let type_name = normalize(type_name);
        !self.is_type_blocked_for_reference(&type_name) || self.allowed_types.contains(type_name.as_ref())
    }

    /// Whether `member` may be read or called on `target`
    pub fn is_member_allowed(&self, target: &Value, member: &str) -> bool {
        let Value::Object(object) = target else {
            return !self.blocked_members.contains(member);
        };

        let member = normalize(member);
        let member = member.as_ref();
        if ALWAYS_ALLOWED_MEMBERS.contains(&member) {
            return true;
        }
        if self.blocked_members.contains(member) {
            return false;
        }

        let type_name = normalize(object.type_name());
        if object.is_type() {
            return member == "getName" || self.is_type_allowed(&type_name);
        }
        !self.is_type_blocked(&type_name) || self.allowed_types.contains(type_name.as_ref())
    }
}

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

//! Restricted evaluation guard
//!
//! Two independent layers. In restricted mode the source text of every
//! `${...}` / `*{...}` is scanned for instantiation, static type access and
//! request parameter access before evaluation, and `new` / `T(...)` nodes are
//! refused outright. Independently of the mode, every member access goes
//! through the [`MemberDenylist`].

mod members;
mod text;

pub use members::MemberDenylist;
pub use text::{RESTRICTED_MESSAGE, contains_instantiation_or_static_or_param, normalize};

use crate::evaluator::{EvaluationError, EvaluationResult};
use crate::model::Value;
use serde::{Deserialize, Serialize};

/// Type and member lists used by the guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Type name prefixes blocked for every purpose
    pub blocked_type_prefixes: Vec<String>,
    /// Exceptions to `blocked_type_prefixes`
    pub allowed_type_prefixes: Vec<String>,
    /// Types allowed even though their package is blocked
    pub allowed_types: Vec<String>,
    /// Additional prefixes blocked for `T(...)` and `new`
    pub blocked_type_reference_prefixes: Vec<String>,
    /// Member names refused on every target
    pub blocked_members: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            blocked_type_prefixes: strings(&[
                "java.", "javax.", "jakarta.", "jdk.", "org.ietf.jgss.", "org.omg.",
                "org.w3c.dom.", "org.xml.sax.", "com.sun.", "sun.",
            ]),
            allowed_type_prefixes: strings(&["java.time."]),
            allowed_types: strings(&[
                "java.lang.Boolean", "java.lang.Byte", "java.lang.Character", "java.lang.Double",
                "java.lang.Enum", "java.lang.Float", "java.lang.Integer", "java.lang.Long",
                "java.lang.Math", "java.lang.Number", "java.lang.Short", "java.lang.String",
                "java.math.BigDecimal", "java.math.BigInteger", "java.math.RoundingMode",
                "java.util.ArrayList", "java.util.LinkedList", "java.util.HashMap",
                "java.util.LinkedHashMap", "java.util.HashSet", "java.util.LinkedHashSet",
                "java.util.Iterator", "java.util.Enumeration", "java.util.Locale",
                "java.util.Properties", "java.util.Date", "java.util.Calendar",
                "java.util.Optional", "java.util.UUID", "java.util.Collection", "java.util.List",
                "java.util.Map", "java.util.Set",
            ]),
            blocked_type_reference_prefixes: strings(&[
                "com.squareup.javapoet.", "net.bytebuddy.", "net.sf.cglib.", "javassist.",
                "org.apache.bcel.", "org.aspectj.", "org.javassist.", "org.mockito.",
                "org.objectweb.asm.", "org.objenesis.", "org.springframework.aot.",
                "org.springframework.asm.", "org.springframework.cglib.",
                "org.springframework.context.", "org.springframework.beans.",
                "org.springframework.expression.", "org.springframework.util.",
                "org.springframework.web.",
            ]),
            blocked_members: strings(&[
                "getClassLoader", "forName", "loadClass", "exec", "getRuntime", "newInstance",
                "invoke", "setAccessible", "getDeclaredMethod", "getDeclaredMethods",
                "getMethod", "getMethods", "getDeclaredField", "getDeclaredFields", "getField",
            ]),
        }
    }
}

impl GuardConfig {
    /// Allow a type whose package is blocked
    pub fn with_allowed_type(mut self, type_name: impl Into<String>) -> Self {
        self.allowed_types.push(type_name.into());
        self
    }

    /// Refuse a member name on every target
    pub fn with_blocked_member(mut self, member: impl Into<String>) -> Self {
        self.blocked_members.push(member.into());
        self
    }

    /// Block a type name prefix
    pub fn with_blocked_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blocked_type_prefixes.push(prefix.into());
        self
    }
}

/// Checks run by the evaluator before navigating
#[derive(Debug, Clone)]
pub struct RestrictionGuard {
    denylist: MemberDenylist,
}

impl Default for RestrictionGuard {
    fn default() -> Self {
        Self::new(&GuardConfig::default())
    }
}

impl RestrictionGuard {
    /// Create a guard from configuration
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            denylist: MemberDenylist::new(config),
        }
    }

    /// The member denylist
    pub fn denylist(&self) -> &MemberDenylist {
        &self.denylist
    }

    /// Scan the source of a `${...}` / `*{...}` body
    pub fn check_source(&self, source: &str, restricted: bool) -> EvaluationResult<()> {
        if restricted && contains_instantiation_or_static_or_param(source) {
            log::debug!("restricted mode rejected {source:?}");
            return Err(EvaluationError::forbidden(RESTRICTED_MESSAGE));
        }
        Ok(())
    }

    /// `new type_name(...)` or `T(type_name)`
    pub fn check_type(&self, type_name: &str, restricted: bool) -> EvaluationResult<()> {
        if restricted {
            return Err(EvaluationError::forbidden(RESTRICTED_MESSAGE));
        }
        if !self.denylist.is_type_allowed(type_name) {
            return Err(EvaluationError::forbidden(format!(
                "Access to type '{type_name}' is forbidden"
            )));
        }
        Ok(())
    }

    /// Method call `target.member(...)`
    pub fn check_member(&self, target: &Value, member: &str) -> EvaluationResult<()> {
        if self.denylist.is_member_allowed(target, member) {
            Ok(())
        } else {
            Err(EvaluationError::forbidden(format!(
                "Access to member '{member}' of type '{}' is forbidden",
                target.type_name()
            )))
        }
    }

    /// Property read `target.name`, which may resolve through `getName()` / `isName()`
    pub fn check_property(&self, target: &Value, name: &str) -> EvaluationResult<()> {
        self.check_member(target, name)?;
        if matches!(target, Value::Object(_)) {
            let mut chars = name.chars();
            if let Some(first) = chars.next() {
                let rest = chars.as_str();
                let capitalized: String = first.to_uppercase().chain(rest.chars()).collect();
                self.check_member(target, &format!("get{capitalized}"))?;
                self.check_member(target, &format!("is{capitalized}"))?;
            }
        }
        Ok(())
    }
}

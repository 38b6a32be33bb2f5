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

//! Standard link builder
//!
//! Turns the evaluated base and parameters of `@{...}` into a URL. Hosts
//! with their own routing implement
//! [`EvaluationContext::build_link`](crate::evaluator::EvaluationContext::build_link)
//! directly; this builder covers the common cases:
//!
//! - absolute (`http://...`, `//host/...`, `mailto:`) and page-relative bases are kept as is
//! - context-relative bases (`/x`) get the context path prepended
//! - server-relative bases (`~/x`) lose the `~`
//! - `{name}` and `{/name}` path variables consume the parameter of that name
//! - remaining parameters become the query string; list values repeat the name
//! - a `#fragment` in the base is moved after the query string

use crate::evaluator::{EvaluationResult, LinkParameters};
use crate::model::Value;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const PATH_SEGMENT: &AsciiSet = &PATH.add(b'/');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkType {
    Absolute,
    ContextRelative,
    ServerRelative,
    BaseRelative,
}

impl LinkType {
    fn of(base: &str) -> Self {
        let lower = base.get(..7).map(str::to_ascii_lowercase);
        if lower.as_deref() == Some("mailto:") || base.starts_with("//") || base.contains("://") {
            Self::Absolute
        } else if base.starts_with('/') {
            Self::ContextRelative
        } else if base.starts_with("~/") {
            Self::ServerRelative
        } else {
            Self::BaseRelative
        }
    }
}

/// URL builder for link expressions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardLinkBuilder {
    /// Path prefix for context-relative links, e.g. `/app`
    pub context_path: String,
}

impl StandardLinkBuilder {
    /// Builder prefixing context-relative links with `context_path`
    pub fn new(context_path: impl Into<String>) -> Self {
        Self {
            context_path: context_path.into(),
        }
    }

    /// Build the URL for `base` and `parameters`
    pub fn build(&self, base: &str, parameters: &LinkParameters) -> EvaluationResult<String> {
        let link_type = LinkType::of(base);
        let context_path = match link_type {
            LinkType::ContextRelative if self.context_path != "/" => self.context_path.as_str(),
            _ => "",
        };

        let (base, url_fragment) = match base.rfind('#') {
            Some(hash) if hash > 0 => base.split_at(hash),
            _ => (base, ""),
        };

        let mut remaining = parameters.clone();
        let mut link = if base.contains('{') {
            replace_path_variables(base, &mut remaining)
        } else {
            base.to_string()
        };

        if !remaining.is_empty() {
            link.push(if link.contains('?') { '&' } else { '?' });
            append_query(&mut link, &remaining);
        }
        link.push_str(url_fragment);

        if link_type == LinkType::ServerRelative {
            link.remove(0);
        }
        if !context_path.is_empty() {
            link.insert_str(0, context_path);
        }
        log::trace!("built link {link}");
        Ok(link)
    }
}

fn encode_query(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

/// Replacement text of a path variable; list values are comma separated
fn template_value(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::List(items)) => items
            .iter()
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(","),
        Some(value) => value.to_text(),
    }
}

fn replace_path_variables(base: &str, parameters: &mut LinkParameters) -> String {
    let mut link = base.to_string();
    let mut consumed = Vec::new();

    for (name, value) in parameters.iter() {
        let query_start = link.rfind('?');
        let (template, set) = {
            let plain = format!("{{{name}}}");
            if link.contains(&plain) {
                (plain, PATH)
            } else {
                let segment = format!("{{/{name}}}");
                if !link.contains(&segment) {
                    continue;
                }
                (segment, PATH_SEGMENT)
            }
        };

        let replacement = template_value(value.as_ref());
        let mut result = String::with_capacity(link.len());
        let mut rest = link.as_str();
        let mut offset = 0;
        while let Some(found) = rest.find(&template) {
            result.push_str(&rest[..found]);
            let in_query = query_start.is_some_and(|q| offset + found > q);
            if in_query {
                result.push_str(&encode_query(&replacement));
            } else {
                result.extend(utf8_percent_encode(&replacement, set));
            }
            offset += found + template.len();
            rest = &rest[found + template.len()..];
        }
        result.push_str(rest);
        link = result;
        consumed.push(name.clone());
    }

    for name in consumed {
        parameters.shift_remove(&name);
    }
    link
}

fn append_query(link: &mut String, parameters: &LinkParameters) {
    let mut first = true;
    let mut push_pair = |link: &mut String, name: &str, value: Option<&Value>| {
        if !first {
            link.push('&');
        }
        first = false;
        link.push_str(&encode_query(name));
        if let Some(value) = value.filter(|v| !v.is_null()) {
            link.push('=');
            link.push_str(&encode_query(&value.to_text()));
        }
    };

    for (name, value) in parameters {
        match value {
            Some(Value::List(items)) => {
                for item in items.iter() {
                    push_pair(link, name, Some(item));
                }
            }
            other => push_pair(link, name, other.as_ref()),
        }
    }
}

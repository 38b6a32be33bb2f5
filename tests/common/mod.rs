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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use template_expressions::evaluator::StandardContext;
use template_expressions::model::{HostObject, Locale, Navigation, Value};
use template_expressions::{ExpressionEngine, ExpressionError, StandardLinkBuilder};

/// Application user exposed as a host object
#[derive(Debug, Clone)]
pub struct User {
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub nationality: &'static str,
    pub active: bool,
    pub permissions: Vec<&'static str>,
}

impl User {
    pub fn new(first_name: &'static str, last_name: &'static str, nationality: &'static str) -> Self {
        Self {
            first_name,
            last_name,
            nationality,
            active: true,
            permissions: Vec::new(),
        }
    }
}

impl HostObject for User {
    fn type_name(&self) -> &str {
        "app.model.User"
    }

    fn property(&self, name: &str) -> Navigation {
        match name {
            "firstName" => Navigation::Found(Value::text(self.first_name)),
            "lastName" => Navigation::Found(Value::text(self.last_name)),
            "nationality" => Navigation::Found(Value::text(self.nationality)),
            "permissions" => Navigation::Found(Value::list(
                self.permissions.iter().map(|p| Value::text(p)),
            )),
            _ => Navigation::NotFound,
        }
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Navigation {
        match (method, args) {
            ("getName", []) => {
                Navigation::Found(Value::text(format!("{} {}", self.first_name, self.last_name)))
            }
            ("isActive", []) => Navigation::Found(Value::Boolean(self.active)),
            ("greet", [other]) => {
                Navigation::Found(Value::text(format!("{} greets {}", self.first_name, other)))
            }
            _ => Navigation::NotFound,
        }
    }

    fn to_text(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub fn loceania() -> User {
    User {
        permissions: vec!["read", "write"],
        ..User::new("Lucy", "Oceania", "Australian")
    }
}

pub fn meurope() -> User {
    User::new("Mark", "Europe", "Spanish")
}

pub fn jafrica() -> User {
    User {
        active: false,
        ..User::new("John", "Africa", "Nigerian")
    }
}

pub fn pamerica() -> User {
    User::new("Petronila", "America", "Argentinian")
}

/// Route crate logging to the test output; `RUST_LOG=trace` shows cache and parser activity
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Context with the four fixture users, a few messages and an `/app` context path
pub fn context() -> StandardContext {
    init_logging();
    let users = Value::map([
        ("loceania", Value::object(loceania())),
        ("meurope", Value::object(meurope())),
        ("jafrica", Value::object(jafrica())),
        ("pamerica", Value::object(pamerica())),
    ]);
    StandardContext::new(Locale::parse("en_US"))
        .with_variable("users", users)
        .with_variable("loceania", Value::object(loceania()))
        .with_variable("pamerica", Value::object(pamerica()))
        .with_variable("jafrica", Value::object(jafrica()))
        .with_variable("key", "pamerica")
        .with_variable("count", 3)
        .with_variable("price", Value::text("12.50"))
        .with_message("welcome", "Welcome, {0}!")
        .with_message("items.count", "{0} items for {1}")
        .with_link_builder(StandardLinkBuilder::new("/app"))
}

pub fn eval(engine: &ExpressionEngine, text: &str) -> Result<Value, ExpressionError> {
    engine.evaluate_text(text, &context())
}

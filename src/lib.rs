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

//! Standard expression language for server-side templates
//!
//! Parses and evaluates the expressions template attributes carry:
//! variables (`${...}`), selections (`*{...}`), messages (`#{...}`),
//! links (`@{...}`), fragments (`~{...}`), literals, operators, conditionals,
//! literal substitution (`|...|`) and preprocessing (`__...__`).
//!
//! ```rust
//! use template_expressions::ExpressionEngine;
//! use template_expressions::evaluator::StandardContext;
//! use template_expressions::model::Value;
//!
//! let engine = ExpressionEngine::default();
//! let context = StandardContext::default().with_variable("user", "Lucy");
//! let greeting = engine.evaluate_text("|Hello, ${user}!|", &context).unwrap();
//! assert_eq!(greeting, Value::text("Hello, Lucy!"));
//! ```

pub mod ast;
pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod link;
pub mod model;
pub mod navigation;
pub mod parser;

// Re-export main types
pub use cache::{CacheConfig, CacheStats, ExpressionCache};
pub use engine::{EngineConfig, ExpressionEngine, ParsedExpression};
pub use error::{CacheConsistencyError, ExpressionError, Result};
pub use evaluator::{EvaluationConfig, EvaluationContext, EvaluationError, StandardContext};
pub use guard::{GuardConfig, RestrictionGuard};
pub use link::StandardLinkBuilder;
pub use model::{Fragment, Locale, Value};
pub use navigation::{DefaultNavigator, Navigator};
pub use parser::{ParseError, ParserConfig, parse_expression as parse};

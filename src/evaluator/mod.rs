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

//! Standard expression evaluator
//!
//! Walks parsed expression trees against a host supplied
//! [`EvaluationContext`]. Operator semantics live in the specialized
//! evaluators; navigation goes through the context's
//! [`Navigator`](crate::navigation::Navigator) after the
//! [`RestrictionGuard`](crate::guard::RestrictionGuard) has approved it.

#![warn(missing_docs)]

mod atoms;
mod config;
mod context;
mod engine;
mod error;
pub mod evaluators;

pub use config::EvaluationConfig;
pub use context::{EvaluationContext, LinkParameters, StandardContext, format_message};
pub use engine::{Evaluator, literal_value};
pub use error::{EvaluationError, EvaluationResult};

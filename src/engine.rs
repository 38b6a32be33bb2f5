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

//! Expression engine facade
//!
//! The two operations hosts call: parse expression text (through the
//! injected cache) and evaluate a parsed expression against a context.

use crate::cache::{CacheConfig, ExpressionCache};
use crate::error::{CacheConsistencyError, ExpressionError, Result};
use crate::evaluator::{EvaluationConfig, EvaluationContext, EvaluationResult, Evaluator};
use crate::guard::{GuardConfig, RestrictionGuard};
use crate::model::Value;
use crate::parser::{
    CompiledExpression, ParserConfig, PreprocessTemplate, TemplateSegment, compile,
    parse_with_config,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Engine configuration
///
/// # Examples
///
/// ```rust
/// use template_expressions::{CacheConfig, EngineConfig, EvaluationConfig};
///
/// let config = EngineConfig::default()
///     .with_cache_config(CacheConfig::default().with_max_entries(1000))
///     .with_evaluation_config(EvaluationConfig::default().with_strict_variables(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parser limits
    pub parser: ParserConfig,
    /// Expression cache settings
    pub cache: CacheConfig,
    /// Evaluation behaviour
    pub evaluation: EvaluationConfig,
    /// Restricted mode and member denylist
    pub guard: GuardConfig,
}

impl EngineConfig {
    /// Create configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parser configuration
    pub fn with_parser_config(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Set cache configuration
    pub fn with_cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set evaluation configuration
    pub fn with_evaluation_config(mut self, evaluation: EvaluationConfig) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Set guard configuration
    pub fn with_guard_config(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }
}

/// Parsed, immutable expression ready for evaluation
///
/// Cloning is cheap: the tree is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    source: Arc<str>,
    compiled: Arc<CompiledExpression>,
    restricted: bool,
}

impl ParsedExpression {
    /// Wrap a compiled expression parsed from `source`
    pub fn new(source: &str, compiled: CompiledExpression) -> Self {
        Self {
            source: Arc::from(source),
            compiled: Arc::new(compiled),
            restricted: false,
        }
    }

    /// Copy of this expression with the restricted flag set
    pub fn with_restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    /// Text the expression was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled form
    pub fn compiled(&self) -> &CompiledExpression {
        &self.compiled
    }

    /// Whether evaluation runs in restricted mode regardless of the context
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Whether evaluation starts with a preprocessing pass
    pub fn is_preprocessed(&self) -> bool {
        self.compiled.is_preprocessed()
    }

    /// Canonical text; re-parsing it yields an equivalent expression
    pub fn canonical(&self) -> String {
        self.compiled.to_string()
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compiled)
    }
}

/// Standard expression engine
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use template_expressions::{EngineConfig, ExpressionCache, ExpressionEngine};
/// use template_expressions::evaluator::StandardContext;
/// use template_expressions::model::Value;
///
/// let config = EngineConfig::default();
/// let cache = Arc::new(ExpressionCache::new(&config.cache));
/// let engine = ExpressionEngine::new(config, cache);
///
/// let context = StandardContext::default().with_variable("count", 3);
/// let value = engine.evaluate_text("'Count: ' + ${count}", &context).unwrap();
/// assert_eq!(value, Value::text("Count: 3"));
/// ```
#[derive(Debug)]
pub struct ExpressionEngine {
    config: EngineConfig,
    cache: Arc<ExpressionCache>,
    guard: RestrictionGuard,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl ExpressionEngine {
    /// Create an engine sharing `cache`
    pub fn new(config: EngineConfig, cache: Arc<ExpressionCache>) -> Self {
        let guard = RestrictionGuard::new(&config.guard);
        Self {
            config,
            cache,
            guard,
        }
    }

    /// Create an engine with a private cache built from `config.cache`
    pub fn with_config(config: EngineConfig) -> Self {
        let cache = Arc::new(ExpressionCache::new(&config.cache));
        Self::new(config, cache)
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared expression cache
    pub fn cache(&self) -> &Arc<ExpressionCache> {
        &self.cache
    }

    /// Parse expression text, reusing the cached tree when there is one
    pub fn parse_expression(&self, raw: &str, restricted: bool) -> Result<ParsedExpression> {
        let parsed = self.parse_cached(raw, true)?;
        Ok(parsed.with_restricted(restricted))
    }

    /// Evaluate a parsed expression
    ///
    /// Restricted mode applies when the expression was parsed restricted or
    /// the context is restricted.
    pub fn evaluate(
        &self,
        parsed: &ParsedExpression,
        context: &dyn EvaluationContext,
    ) -> Result<Value> {
        let restricted = parsed.is_restricted() || context.is_restricted();
        match parsed.compiled() {
            CompiledExpression::Expression(node) => {
                self.evaluator(context, restricted)
                    .evaluate(node)
                    .map_err(|error| ExpressionError::Evaluation {
                        source_text: parsed.source().to_string(),
                        error,
                    })
            }
            CompiledExpression::Preprocessed(template) => {
                let text = self
                    .preprocess(template, context, restricted)
                    .map_err(|error| ExpressionError::Preprocessing {
                        source_text: parsed.source().to_string(),
                        error,
                    })?;
                log::trace!("preprocessed {:?} into {text:?}", parsed.source());
                let outer = self.parse_cached(&text, false)?.with_restricted(restricted);
                // outer text is parsed without preprocessing, so this does not recurse again
                self.evaluate(&outer, context)
            }
        }
    }

    /// Parse (through the cache) and evaluate
    pub fn evaluate_text(&self, raw: &str, context: &dyn EvaluationContext) -> Result<Value> {
        let parsed = self.parse_expression(raw, false)?;
        self.evaluate(&parsed, context)
    }

    /// Check every cache entry against a fresh parse of its key
    pub fn verify_cache(&self) -> std::result::Result<(), CacheConsistencyError> {
        self.cache
            .verify(|text, simple| self.parse_uncached(text, simple).ok())
    }

    fn evaluator<'a>(&'a self, context: &'a dyn EvaluationContext, restricted: bool) -> Evaluator<'a> {
        Evaluator::new(&self.config.evaluation, &self.guard, context, restricted)
    }

    /// Cache lookup; outer text produced by preprocessing is only cached when configured
    fn parse_cached(&self, text: &str, simple: bool) -> Result<ParsedExpression> {
        if simple || self.config.cache.cache_composite_parts {
            self.cache
                .get_or_parse(text, simple, || self.parse_uncached(text, simple))
        } else {
            self.parse_uncached(text, simple)
        }
    }

    /// Authored text is compiled with preprocessing; preprocessed output is parsed as is
    fn parse_uncached(&self, text: &str, simple: bool) -> Result<ParsedExpression> {
        log::debug!("parsing expression {text:?}");
        let compiled = if simple {
            compile(text, &self.config.parser)
        } else {
            parse_with_config(text, &self.config.parser).map(CompiledExpression::Expression)
        };
        compiled
            .map(|compiled| ParsedExpression::new(text, compiled))
            .map_err(|error| ExpressionError::Parse {
                source_text: text.to_string(),
                error,
            })
    }

    /// Evaluate the `__...__` blocks and splice their text into the outer expression
    fn preprocess(
        &self,
        template: &PreprocessTemplate,
        context: &dyn EvaluationContext,
        restricted: bool,
    ) -> EvaluationResult<String> {
        let mut evaluator = self.evaluator(context, restricted);
        let mut text = String::new();
        for segment in template.segments() {
            match segment {
                TemplateSegment::Text(part) => text.push_str(part),
                TemplateSegment::Expression(node) => {
                    let value = evaluator.evaluate(node)?;
                    text.push_str(&value.to_text());
                }
            }
        }
        Ok(text.trim().to_string())
    }
}

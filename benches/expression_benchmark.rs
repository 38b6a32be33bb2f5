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

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use template_expressions::evaluator::StandardContext;
use template_expressions::model::Value;
use template_expressions::parser::{ParserConfig, compile};
use template_expressions::{CacheConfig, EngineConfig, ExpressionEngine};

const EXPRESSIONS: &[&str] = &[
    "${user.name}",
    "${count} * 2 + 1",
    "|Hello, ${user.name}!|",
    "${count} gt 2 ? 'many' : 'few'",
    "@{/order/details(id=${count},mode='full')}",
    "${__${field}__}",
];

fn context() -> StandardContext {
    StandardContext::default()
        .with_variable("user", Value::map([("name", Value::text("Lucy"))]))
        .with_variable("count", 3)
        .with_variable("field", "count")
}

fn benchmark_parser(c: &mut Criterion) {
    let config = ParserConfig::default();
    c.bench_function("parser", |b| {
        b.iter(|| {
            for expression in EXPRESSIONS {
                black_box(compile(black_box(expression), &config)).ok();
            }
        })
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let context = context();
    let cached = ExpressionEngine::default();
    let uncached = ExpressionEngine::with_config(
        EngineConfig::default().with_cache_config(CacheConfig::default().with_enabled(false)),
    );

    for (i, expression) in EXPRESSIONS.iter().enumerate() {
        c.bench_function(&format!("evaluate_cached_{i}"), |b| {
            b.iter(|| black_box(cached.evaluate_text(black_box(expression), &context)))
        });
        c.bench_function(&format!("evaluate_uncached_{i}"), |b| {
            b.iter(|| black_box(uncached.evaluate_text(black_box(expression), &context)))
        });
    }
}

criterion_group!(benches, benchmark_parser, benchmark_evaluation);
criterion_main!(benches);

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

//! Expression cache shared between engines and threads

mod common;

use common::{context, eval};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use template_expressions::model::Value;
use template_expressions::{CacheConfig, EngineConfig, ExpressionCache, ExpressionEngine};

fn engine_with(cache: CacheConfig) -> ExpressionEngine {
    ExpressionEngine::with_config(EngineConfig::default().with_cache_config(cache))
}

#[test]
fn test_engines_share_a_cache() {
    let config = EngineConfig::default();
    let cache = Arc::new(ExpressionCache::new(&config.cache));
    let first = ExpressionEngine::new(config.clone(), Arc::clone(&cache));
    let second = ExpressionEngine::new(config, Arc::clone(&cache));

    eval(&first, "${loceania.firstName}").unwrap();
    eval(&second, "${loceania.firstName}").unwrap();

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[test]
fn test_restricted_flag_is_not_cached() {
    let engine = ExpressionEngine::default();
    let restricted = engine.parse_expression("${param.id}", true).unwrap();
    let open = engine.parse_expression("${param.id}", false).unwrap();
    assert!(restricted.is_restricted());
    assert!(!open.is_restricted());
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn test_bounded_size() {
    let engine = engine_with(CacheConfig::default().with_max_entries(3));
    for n in 0..10 {
        assert_eq!(eval(&engine, &format!("{n} + 1")), Ok(Value::integer(n + 1)));
    }
    let stats = engine.cache().stats();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.evictions, 7);
}

#[test]
fn test_disabled_cache_still_evaluates() {
    let engine = engine_with(CacheConfig::default().with_enabled(false));
    for _ in 0..3 {
        assert_eq!(eval(&engine, "${count} * 2"), Ok(Value::integer(6)));
    }
    assert!(engine.cache().is_empty());
    assert_eq!(engine.cache().stats().hits, 0);
}

#[test]
fn test_composite_parts() {
    let text = "${__${key}__.firstName}";

    let engine = ExpressionEngine::default();
    eval(&engine, text).unwrap();
    assert_eq!(engine.cache().len(), 1);

    let engine = engine_with(CacheConfig::default().with_composite_parts(true));
    eval(&engine, text).unwrap();
    eval(&engine, text).unwrap();
    assert_eq!(engine.cache().len(), 2);
    assert_eq!(engine.cache().stats().hits, 2);
}

#[test]
fn test_concurrent_evaluation() {
    let engine = Arc::new(engine_with(CacheConfig::default().with_composite_parts(true)));
    let expressions = [
        ("${loceania.name}", Value::text("Lucy Oceania")),
        ("${count} * 2 + 1", Value::integer(7)),
        ("${__${key}__.nationality}", Value::text("Argentinian")),
        ("#{welcome(${pamerica.firstName})}", Value::text("Welcome, Petronila!")),
    ];

    thread::scope(|scope| {
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            let expressions = &expressions;
            scope.spawn(move || {
                let context = context();
                for _ in 0..50 {
                    for (text, expected) in expressions {
                        assert_eq!(engine.evaluate_text(text, &context).as_ref(), Ok(expected));
                    }
                }
            });
        }
    });

    // four authored expressions plus the preprocessed outer text
    assert_eq!(engine.cache().len(), 5);
    assert_eq!(engine.verify_cache(), Ok(()));
}

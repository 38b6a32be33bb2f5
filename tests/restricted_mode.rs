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

//! Restricted evaluation and the member denylist

mod common;

use common::{context, eval};
use rstest::rstest;
use std::sync::Arc;
use template_expressions::evaluator::{EvaluationError, EvaluationResult};
use template_expressions::guard::RESTRICTED_MESSAGE;
use template_expressions::model::{Navigation, Value};
use template_expressions::{DefaultNavigator, EngineConfig, ExpressionEngine, GuardConfig, Navigator};

/// Navigator able to create fixture users
#[derive(Debug, Default)]
struct UserFactory(DefaultNavigator);

impl Navigator for UserFactory {
    fn get_property(&self, target: &Value, name: &str) -> Navigation {
        self.0.get_property(target, name)
    }

    fn invoke_method(&self, target: &Value, method: &str, args: &[Value]) -> Navigation {
        self.0.invoke_method(target, method, args)
    }

    fn index(&self, target: &Value, index: &Value) -> EvaluationResult<Value> {
        self.0.index(target, index)
    }

    fn instantiate(&self, type_name: &str, _args: &[Value]) -> Navigation {
        match type_name {
            "app.model.User" => Navigation::Found(Value::object(common::meurope())),
            _ => Navigation::NotFound,
        }
    }
}

fn eval_restricted(engine: &ExpressionEngine, text: &str) -> template_expressions::Result<Value> {
    let parsed = engine.parse_expression(text, true)?;
    engine.evaluate(&parsed, &context())
}

#[rstest]
#[case("${new app.model.User()}")]
#[case("${T(java.lang.Math).max(1, 2)}")]
#[case("${param.id}")]
#[case("'x' + ${param['id']}")]
#[case("@{${T(java.lang.Math)}}")]
fn test_restricted_rejects(#[case] text: &str) {
    let engine = ExpressionEngine::default();
    let err = eval_restricted(&engine, text).unwrap_err();
    assert!(err.is_forbidden(), "{text}: {err}");
    assert_eq!(
        err.evaluation_error(),
        Some(&EvaluationError::forbidden(RESTRICTED_MESSAGE)),
        "{text}"
    );
}

#[test]
fn test_restricted_allows_plain_navigation() {
    let engine = ExpressionEngine::default();
    assert_eq!(
        eval_restricted(&engine, "${loceania.firstName} + ' / ' + ${users['meurope'].lastName}"),
        Ok(Value::text("Lucy / Europe"))
    );
    assert_eq!(
        eval_restricted(&engine, "${renewal}"),
        Ok(Value::Null)
    );
}

#[test]
fn test_restricted_context() {
    let engine = ExpressionEngine::default();
    let parsed = engine.parse_expression("${new app.model.User()}", false).unwrap();

    let err = engine
        .evaluate(&parsed, &context().with_restricted(true))
        .unwrap_err();
    assert!(err.is_forbidden());

    // unrestricted, the type is allowed but nothing can instantiate it
    let err = engine.evaluate(&parsed, &context()).unwrap_err();
    assert_eq!(
        err.evaluation_error(),
        Some(&EvaluationError::UnknownType {
            type_name: "app.model.User".into()
        })
    );
}

#[test]
fn test_instantiation_outside_restricted_mode() {
    let engine = ExpressionEngine::default();
    let factory = context().with_navigator(Arc::new(UserFactory::default()));
    let text = "${new app.model.User().firstName}";

    let parsed = engine.parse_expression(text, false).unwrap();
    assert_eq!(engine.evaluate(&parsed, &factory), Ok(Value::text("Mark")));

    let parsed = engine.parse_expression(text, true).unwrap();
    assert!(engine.evaluate(&parsed, &factory).unwrap_err().is_forbidden());
}

#[test]
fn test_denylist_applies_without_restriction() {
    let engine = ExpressionEngine::default();
    assert!(eval(&engine, "${loceania.getClassLoader()}").unwrap_err().is_forbidden());
    assert!(eval(&engine, "${T(java.lang.Runtime)}").unwrap_err().is_forbidden());
    assert!(eval(&engine, "${new java.io.File('x')}").unwrap_err().is_forbidden());
}

#[test]
fn test_configured_denylist() {
    let guard = GuardConfig::default().with_blocked_member("greet");
    let engine = ExpressionEngine::with_config(EngineConfig::default().with_guard_config(guard));
    assert!(eval(&engine, "${loceania.greet('x')}").unwrap_err().is_forbidden());
    assert_eq!(
        eval(&engine, "${loceania.firstName}"),
        Ok(Value::text("Lucy"))
    );
}

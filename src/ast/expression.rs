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

//! Expression AST node definitions

use super::operator::{BinaryOperator, UnaryOperator};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::sync::Arc;

/// Argument list of method calls, instantiations and message expressions
pub type Arguments = SmallVec<[ExpressionNode; 2]>;

/// AST of a standard expression
///
/// Large variants are boxed to keep the enum small. Nodes are immutable once
/// built; a parsed tree can be shared between threads through an `Arc`.
/// The navigation variants (`Identifier` and below) only appear inside the
/// body of `${...}` and `*{...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionNode {
    /// Text, number, boolean or null literal
    Literal(LiteralValue),

    /// Generic token, evaluates to its own text
    Token(Arc<str>),

    /// No-op token `_`
    NoOp,

    /// Variable expression `${...}`
    Variable(Box<VariableData>),

    /// Selection variable expression `*{...}`
    Selection(Box<VariableData>),

    /// Message expression `#{...}`
    Message(Box<MessageData>),

    /// Link expression `@{...}`
    Link(Box<LinkData>),

    /// Fragment expression `~{...}`
    Fragment(Box<FragmentData>),

    /// Negation or unary minus
    UnaryOp(Box<UnaryOpData>),

    /// Arithmetic, comparison or logical operation
    BinaryOp(Box<BinaryOpData>),

    /// Ternary conditional `cond ? then : else`
    Conditional(Box<ConditionalData>),

    /// Elvis default `left ?: right`
    Default(Box<DefaultData>),

    /// Root variable reference inside a navigation body
    Identifier(Arc<str>),

    /// Property read `target.name`
    Property(Box<PropertyData>),

    /// Index access `target[index]`
    Index(Box<IndexData>),

    /// Method call `target.name(args)`
    MethodCall(Box<MethodCallData>),

    /// Object instantiation `new a.b.Type(args)`
    Instantiation(Box<InstantiationData>),

    /// Static type reference `T(a.b.Type)`
    TypeReference(Arc<str>),
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    /// Text literal with escapes already processed
    Text(Arc<str>),
    /// Integer literal
    Integer(BigInt),
    /// Decimal literal
    Decimal(Decimal),
    /// `true` / `false`
    Boolean(bool),
    /// `null`
    Null,
}

/// Data of `${...}` and `*{...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableData {
    /// Inner text exactly as authored
    pub source: Arc<str>,
    /// Parsed navigation body
    pub body: ExpressionNode,
}

/// Data of `#{key(args)}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageData {
    /// Message key expression
    pub key: ExpressionNode,
    /// Message arguments
    pub args: Arguments,
}

/// One `name=value` item of an assignation sequence; the value is optional in links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignation {
    /// Parameter name expression
    pub name: ExpressionNode,
    /// Parameter value expression
    pub value: Option<ExpressionNode>,
}

/// Data of `@{base(params)}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    /// Base URL expression
    pub base: ExpressionNode,
    /// Query or path-variable parameters, in authored order
    pub parameters: Vec<Assignation>,
}

/// Parameters of a fragment expression
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FragmentParameters {
    /// No parameter list
    #[default]
    None,
    /// `name=value` pairs
    Named(Vec<Assignation>),
    /// Positional values, named `_arg0`, `_arg1`, ... at evaluation
    Positional(Vec<ExpressionNode>),
}

/// Data of `~{template :: selector (params)}`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentData {
    /// Template name, `None` for the current template
    pub template: Option<ExpressionNode>,
    /// Fragment selector
    pub selector: Option<ExpressionNode>,
    /// Fragment parameters
    pub parameters: FragmentParameters,
}

impl FragmentData {
    /// Whether this is the empty fragment `~{}`
    pub fn is_empty(&self) -> bool {
        self.template.is_none() && self.selector.is_none()
    }
}

/// Data of a unary operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryOpData {
    /// Operator
    pub op: UnaryOperator,
    /// Operand
    pub operand: ExpressionNode,
}

/// Data of a binary operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOpData {
    /// Operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// Data of a ternary conditional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalData {
    /// Condition
    pub condition: ExpressionNode,
    /// Result when the condition holds
    pub then_expr: ExpressionNode,
    /// Result otherwise; null when omitted
    pub else_expr: Option<ExpressionNode>,
}

/// Data of an Elvis default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultData {
    /// Value to use when not null
    pub value: ExpressionNode,
    /// Fallback
    pub fallback: ExpressionNode,
}

/// Data of a property read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyData {
    /// Navigated object
    pub target: ExpressionNode,
    /// Property name
    pub name: Arc<str>,
}

/// Data of an index access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexData {
    /// Indexed object
    pub target: ExpressionNode,
    /// Index or key expression
    pub index: ExpressionNode,
}

/// Data of a method call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCallData {
    /// Receiver
    pub target: ExpressionNode,
    /// Method name
    pub method: Arc<str>,
    /// Arguments
    pub args: Arguments,
}

/// Data of an instantiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiationData {
    /// Qualified type name
    pub type_name: Arc<str>,
    /// Constructor arguments
    pub args: Arguments,
}

impl ExpressionNode {
    /// Create a literal node
    pub fn literal(value: LiteralValue) -> Self {
        Self::Literal(value)
    }

    /// Create a text literal node
    pub fn text(value: impl AsRef<str>) -> Self {
        Self::Literal(LiteralValue::Text(Arc::from(value.as_ref())))
    }

    /// Create an integer literal node
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Literal(LiteralValue::Integer(value.into()))
    }

    /// Create a generic token node
    pub fn token(text: &str) -> Self {
        Self::Token(Arc::from(text))
    }

    /// Create a variable expression node
    pub fn variable(source: &str, body: ExpressionNode) -> Self {
        Self::Variable(Box::new(VariableData {
            source: Arc::from(source),
            body,
        }))
    }

    /// Create a selection expression node
    pub fn selection(source: &str, body: ExpressionNode) -> Self {
        Self::Selection(Box::new(VariableData {
            source: Arc::from(source),
            body,
        }))
    }

    /// Create a unary operation node
    pub fn unary_op(op: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOp(Box::new(UnaryOpData { op, operand }))
    }

    /// Create a binary operation node
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a conditional node
    pub fn conditional(
        condition: ExpressionNode,
        then_expr: ExpressionNode,
        else_expr: Option<ExpressionNode>,
    ) -> Self {
        Self::Conditional(Box::new(ConditionalData {
            condition,
            then_expr,
            else_expr,
        }))
    }

    /// Create an Elvis default node
    pub fn default_value(value: ExpressionNode, fallback: ExpressionNode) -> Self {
        Self::Default(Box::new(DefaultData { value, fallback }))
    }

    /// Create a root identifier node
    pub fn identifier(name: &str) -> Self {
        Self::Identifier(Arc::from(name))
    }

    /// Create a property read node
    pub fn property(target: ExpressionNode, name: &str) -> Self {
        Self::Property(Box::new(PropertyData {
            target,
            name: Arc::from(name),
        }))
    }

    /// Create an index access node
    pub fn index(target: ExpressionNode, index: ExpressionNode) -> Self {
        Self::Index(Box::new(IndexData { target, index }))
    }

    /// Create a method call node
    pub fn method_call(target: ExpressionNode, method: &str, args: Arguments) -> Self {
        Self::MethodCall(Box::new(MethodCallData {
            target,
            method: Arc::from(method),
            args,
        }))
    }

    /// Create an instantiation node
    pub fn instantiation(type_name: &str, args: Arguments) -> Self {
        Self::Instantiation(Box::new(InstantiationData {
            type_name: Arc::from(type_name),
            args,
        }))
    }

    /// Create a static type reference node
    pub fn type_reference(type_name: &str) -> Self {
        Self::TypeReference(Arc::from(type_name))
    }

    /// Whether this node is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Whether this node is one of the bracketed atomic forms or a literal/token
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Literal(_)
                | Self::Token(_)
                | Self::NoOp
                | Self::Variable(_)
                | Self::Selection(_)
                | Self::Message(_)
                | Self::Link(_)
                | Self::Fragment(_)
        )
    }

    /// Whether the canonical form needs parentheses when used as an operand
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Self::UnaryOp(_) | Self::BinaryOp(_) | Self::Conditional(_) | Self::Default(_)
        )
    }

    /// Call `f` on every direct child node, left to right
    pub fn for_each_child<'a>(&'a self, mut f: impl FnMut(&'a ExpressionNode)) {
        match self {
            Self::Literal(_)
            | Self::Token(_)
            | Self::NoOp
            | Self::Identifier(_)
            | Self::TypeReference(_) => {}
            Self::Variable(data) | Self::Selection(data) => f(&data.body),
            Self::Message(data) => {
                f(&data.key);
                data.args.iter().for_each(f);
            }
            Self::Link(data) => {
                f(&data.base);
                for param in &data.parameters {
                    f(&param.name);
                    if let Some(value) = &param.value {
                        f(value);
                    }
                }
            }
            Self::Fragment(data) => {
                if let Some(template) = &data.template {
                    f(template);
                }
                if let Some(selector) = &data.selector {
                    f(selector);
                }
                match &data.parameters {
                    FragmentParameters::None => {}
                    FragmentParameters::Named(params) => {
                        for param in params {
                            f(&param.name);
                            if let Some(value) = &param.value {
                                f(value);
                            }
                        }
                    }
                    FragmentParameters::Positional(values) => values.iter().for_each(f),
                }
            }
            Self::UnaryOp(data) => f(&data.operand),
            Self::BinaryOp(data) => {
                f(&data.left);
                f(&data.right);
            }
            Self::Conditional(data) => {
                f(&data.condition);
                f(&data.then_expr);
                if let Some(else_expr) = &data.else_expr {
                    f(else_expr);
                }
            }
            Self::Default(data) => {
                f(&data.value);
                f(&data.fallback);
            }
            Self::Property(data) => f(&data.target),
            Self::Index(data) => {
                f(&data.target);
                f(&data.index);
            }
            Self::MethodCall(data) => {
                f(&data.target);
                data.args.iter().for_each(f);
            }
            Self::Instantiation(data) => data.args.iter().for_each(f),
        }
    }

    /// Whether this node or any descendant satisfies `predicate`
    pub fn any(&self, predicate: &impl Fn(&ExpressionNode) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        let mut found = false;
        self.for_each_child(|child| {
            if !found && child.any(predicate) {
                found = true;
            }
        });
        found
    }

    /// Depth of the tree, a single node being depth 1
    pub fn depth(&self) -> usize {
        let mut max_child = 0;
        self.for_each_child(|child| max_child = max_child.max(child.depth()));
        max_child + 1
    }
}

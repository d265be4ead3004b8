//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, NodeTypeTest, Step,
    UnaryOperator,
};
use super::functions;
use super::{axes, operators};
use crate::datasource::{DataSourceNode, NodeType, XML_NAMESPACE};
use crate::error::XPathError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

/// Converts a string to a number as per XPath 1.0: surrounding whitespace is
/// allowed, anything that is not a plain decimal is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != ".";
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Formats a number as per the XPath 1.0 `string()` rules.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|n| string_to_number(&n.string_value()))
                .unwrap_or(f64::NAN),
        }
    }

    pub fn into_nodes(self) -> Option<Vec<N>> {
        match self {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// All state needed during expression evaluation.
/// `'a` is the lifetime of the underlying tree.
/// `'d` is the lifetime of the borrowed namespace bindings.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    /// The node an absolute path (`/...`) starts from.
    pub root_node: N,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    /// Prefix to namespace URI bindings used to resolve prefixed name tests.
    pub namespaces: &'d HashMap<String, String>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(context_node: N, root_node: N, namespaces: &'d HashMap<String, String>) -> Self {
        Self {
            context_node,
            root_node,
            context_position: 1,
            context_size: 1,
            namespaces,
            _marker: PhantomData,
        }
    }

    /// A context for evaluating a predicate against one node of a candidate list.
    fn at(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            context_position: position,
            context_size: size,
            namespaces: self.namespaces,
            _marker: PhantomData,
        }
    }

    pub fn resolve_prefix(&self, prefix: &str) -> Result<&str, XPathError> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE);
        }
        self.namespaces
            .get(prefix)
            .map(String::as_str)
            .ok_or_else(|| XPathError::UnknownNamespacePrefix(prefix.to_string()))
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::Filter { expr, predicates } => {
            let nodes = evaluate_to_nodes(expr, e_ctx)?;
            // Filter expressions use document order as their proximity order.
            let filtered = apply_predicates(nodes, predicates, e_ctx)?;
            Ok(XPathValue::NodeSet(filtered))
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            // `and`/`or` short-circuit.
            match op {
                BinaryOperator::And if !left_val.to_bool() => {
                    return Ok(XPathValue::Boolean(false));
                }
                BinaryOperator::Or if left_val.to_bool() => {
                    return Ok(XPathValue::Boolean(true));
                }
                _ => {}
            }
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

fn evaluate_to_nodes<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    evaluate(expr, e_ctx)?.into_nodes().ok_or_else(|| {
        XPathError::TypeError("Expression does not evaluate to a node-set".to_string())
    })
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut current: Vec<N> = if let Some(start) = &path.start_point {
        evaluate_to_nodes(start, e_ctx)?
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    for step in &path.steps {
        current = evaluate_step(step, &current, e_ctx)?;
    }
    Ok(current)
}

/// Applies one step to every context node, filtering each axis result with the
/// step's predicates before merging. The merged set is in document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for &node in context_nodes {
        let mut candidates = Vec::new();
        for candidate in axes::collect(step.axis, node) {
            if matches_node_test(candidate, &step.node_test, step.axis, e_ctx)? {
                candidates.push(candidate);
            }
        }
        for found in apply_predicates(candidates, &step.predicates, e_ctx)? {
            if seen.insert(found) {
                merged.push(found);
            }
        }
    }
    merged.sort();
    Ok(merged)
}

fn principal_node_type(axis: Axis) -> NodeType {
    match axis {
        Axis::Attribute => NodeType::Attribute,
        _ => NodeType::Element,
    }
}

fn matches_name<'a, N>(
    node: N,
    test: &NameTest,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<bool, XPathError>
where
    N: DataSourceNode<'a>,
{
    let Some(name) = node.name() else {
        return Ok(false);
    };
    if name.local_part != test.local_part {
        return Ok(false);
    }
    match &test.prefix {
        Some(prefix) => Ok(node.namespace_uri() == Some(e_ctx.resolve_prefix(prefix)?)),
        None => Ok(node.namespace_uri().is_none()),
    }
}

fn matches_node_test<'a, N>(
    node: N,
    test: &NodeTest,
    axis: Axis,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<bool, XPathError>
where
    N: DataSourceNode<'a>,
{
    let node_type = node.node_type();
    match test {
        NodeTest::Wildcard => Ok(node_type == principal_node_type(axis)),
        NodeTest::Name(name_test) => Ok(node_type == principal_node_type(axis)
            && matches_name(node, name_test, e_ctx)?),
        NodeTest::NamespaceWildcard(prefix) => {
            if node_type != principal_node_type(axis) {
                return Ok(false);
            }
            let uri = e_ctx.resolve_prefix(prefix)?;
            Ok(node.namespace_uri() == Some(uri))
        }
        NodeTest::NodeType(NodeTypeTest::Node) => Ok(true),
        NodeTest::NodeType(NodeTypeTest::Text) => Ok(node_type == NodeType::Text),
        NodeTest::NodeType(NodeTypeTest::Comment) => Ok(node_type == NodeType::Comment),
        NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(target)) => {
            if node_type != NodeType::ProcessingInstruction {
                return Ok(false);
            }
            Ok(match target {
                Some(t) => node.name().is_some_and(|n| n.local_part == t),
                None => true,
            })
        }
    }
}

/// Filters `nodes` (given in proximity order) through each predicate in turn.
fn apply_predicates<'a, N>(
    mut nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    for predicate in predicates {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let position = i + 1;
            let predicate_ctx = e_ctx.at(node, position, size);
            let keep = match evaluate(predicate, &predicate_ctx)? {
                XPathValue::Number(n) => n == position as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(node);
            }
        }
        nodes = kept;
    }
    Ok(nodes)
}

//! Contains pure functions for evaluating XPath binary operators.

use super::ast::BinaryOperator;
use super::engine::{XPathValue, string_to_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),
        Union => evaluate_union(left, right),
    }
}

/// A comparison operand reduced to one of its atomic forms.
#[derive(Clone)]
enum Atom {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Atom {
    fn number(&self) -> f64 {
        match self {
            Atom::String(s) => string_to_number(s),
            Atom::Number(n) => *n,
            Atom::Boolean(b) => f64::from(u8::from(*b)),
        }
    }

    fn boolean(&self) -> bool {
        match self {
            Atom::String(s) => !s.is_empty(),
            Atom::Number(n) => *n != 0.0 && !n.is_nan(),
            Atom::Boolean(b) => *b,
        }
    }

    fn string(&self) -> String {
        match self {
            Atom::String(s) => s.clone(),
            Atom::Number(n) => crate::engine::number_to_string(*n),
            Atom::Boolean(b) => b.to_string(),
        }
    }
}

fn compare_atoms(op: BinaryOperator, left: &Atom, right: &Atom) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let equal = match (left, right) {
                (Atom::Boolean(_), _) | (_, Atom::Boolean(_)) => left.boolean() == right.boolean(),
                (Atom::Number(_), _) | (_, Atom::Number(_)) => left.number() == right.number(),
                _ => left.string() == right.string(),
            };
            if op == Equals { equal } else { !equal }
        }
        LessThan => left.number() < right.number(),
        LessThanOrEqual => left.number() <= right.number(),
        GreaterThan => left.number() > right.number(),
        GreaterThanOrEqual => left.number() >= right.number(),
        _ => false,
    }
}

/// XPath 1.0 comparison. A node-set operand compares true if any of its
/// members' string values satisfies the comparison; a node-set compared with
/// a boolean is converted to a boolean first.
fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    let members = |nodes: &[N]| -> Vec<Atom> {
        nodes.iter().map(|n| Atom::String(n.string_value())).collect()
    };
    let atom = |value: &XPathValue<N>| -> Atom {
        match value {
            XPathValue::String(s) => Atom::String(s.clone()),
            XPathValue::Number(n) => Atom::Number(*n),
            XPathValue::Boolean(b) => Atom::Boolean(*b),
            XPathValue::NodeSet(nodes) => Atom::Boolean(!nodes.is_empty()),
        }
    };
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_atoms = members(r);
            members(l)
                .iter()
                .any(|a| right_atoms.iter().any(|b| compare_atoms(op, a, b)))
        }
        (XPathValue::NodeSet(_), XPathValue::Boolean(_))
        | (XPathValue::Boolean(_), XPathValue::NodeSet(_)) => {
            compare_atoms(op, &atom(left), &atom(right))
        }
        (XPathValue::NodeSet(l), other) => {
            let b = atom(other);
            members(l).iter().any(|a| compare_atoms(op, &coerce_like(a, &b), &b))
        }
        (other, XPathValue::NodeSet(r)) => {
            let a = atom(other);
            members(r).iter().any(|b| compare_atoms(op, &a, &coerce_like(b, &a)))
        }
        _ => compare_atoms(op, &atom(left), &atom(right)),
    }
}

/// A node-set member compared with a number is compared as a number.
fn coerce_like(member: &Atom, other: &Atom) -> Atom {
    match other {
        Atom::Number(_) => Atom::Number(member.number()),
        _ => member.clone(),
    }
}

fn evaluate_union<'a, N: DataSourceNode<'a> + 'a>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let XPathValue::NodeSet(l_nodes) = left else {
        return Err(XPathError::TypeError(
            "Left-hand side of '|' must be a node-set.".to_string(),
        ));
    };
    let XPathValue::NodeSet(r_nodes) = right else {
        return Err(XPathError::TypeError(
            "Right-hand side of '|' must be a node-set.".to_string(),
        ));
    };

    let mut merged = l_nodes;
    merged.extend(r_nodes);
    merged.sort();
    merged.dedup();
    Ok(XPathValue::NodeSet(merged))
}

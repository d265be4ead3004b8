//! An XPath 1.0 engine written against the [`DataSourceNode`] abstraction.
//!
//! The engine knows nothing about how a tree is stored. Any tree whose node
//! handles are cheap to copy, hashable and ordered in document order can be
//! queried with [`parse_expression`] followed by [`evaluate`].

pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, Step};
pub use datasource::{DataSourceNode, NodeType, QName, XML_NAMESPACE};
pub use engine::{EvaluationContext, XPathValue, evaluate};
pub use error::XPathError;
pub use parser::parse_expression;

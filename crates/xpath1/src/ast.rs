//! Defines the Abstract Syntax Tree (AST) for XPath 1.0 expressions.

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    /// A primary expression narrowed by predicates, e.g. `(//item)[1]`.
    Filter {
        expr: Box<Expression>,
        predicates: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
}

impl Expression {
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    pub fn is_binary_op(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    // Set
    Union,
}

/// A location path such as `/child::foo`, `//bar[1]` or `id('x')/baz`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// An optional starting expression, for paths like `(//a)/b` or `id('x')/b`.
    /// If `None`, the path starts from the context node or root.
    pub start_point: Option<Box<Expression>>,
    /// True if the path starts at the root of the context node's tree.
    /// Meaningless if `start_point` is `Some`.
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

/// A single step in a location path, like `child::foo[position() > 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }

    /// The implicit `descendant-or-self::node()` step that `//` expands to.
    pub fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::NodeType(NodeTypeTest::Node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    /// Reverse axes number their nodes from the context node backwards.
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling | Axis::Preceding
        )
    }
}

/// A qualified name test. An unprefixed test only matches nodes without a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTest {
    pub prefix: Option<String>,
    pub local_part: String,
}

impl NameTest {
    pub fn local(local_part: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_part: local_part.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `foo` or `ns:foo`
    Name(NameTest),
    /// `*`
    Wildcard,
    /// `ns:*`
    NamespaceWildcard(String),
    /// `text()`, `node()`, `comment()`, `processing-instruction()`
    NodeType(NodeTypeTest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTypeTest {
    Text,
    Node,
    Comment,
    /// Optionally restricted to a target name: `processing-instruction('render')`.
    ProcessingInstruction(Option<String>),
}

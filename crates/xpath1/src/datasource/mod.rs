//! Defines the core abstraction for a navigable tree the engine can query.
use std::hash::Hash;

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl std::fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_part),
            None => f.write_str(self.local_part),
        }
    }
}

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract for a node the XPath engine can navigate.
///
/// The `Ord` implementation MUST follow document order: a node sorts after its
/// ancestors and preceding siblings, and an element's attributes sort after the
/// element and before its children. Nodes of unrelated trees only need a stable
/// total order.
///
/// `'a` is the lifetime of the underlying tree storage.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node. `None` for text, comment and root nodes.
    /// For a processing instruction this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI the node's name is bound to, if any.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The string value as defined by the XPath 1.0 `string()` function.
    /// - For a text node, this is its content.
    /// - For an element or root, the concatenation of all descendant text.
    /// - For an attribute, its value.
    fn string_value(&self) -> String;

    /// Attribute nodes of an element. Empty for every other node type.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// Child nodes in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. The owner element for attributes, `None` for tree roots.
    fn parent(&self) -> Option<Self>;
}

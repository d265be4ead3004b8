//! Turns the different kinds of selector arguments into node lists.

use crate::error::NodesError;
use crate::nodes::Nodes;
use arbor_dom::Node;
use std::borrow::Cow;
use std::fmt;

/// Callback selectors receive the context node (`None` for the document)
/// and may decline with `None`.
pub type SelectorFn<'a> = &'a dyn Fn(Option<&Node>) -> Option<Vec<Node>>;

/// A selector argument.
#[derive(Clone)]
pub enum Selector<'a> {
    /// An XPath expression, passed through the collection's selector hook.
    Expression(Cow<'a, str>),
    Node(Node),
    List(Vec<Node>),
    Collection(&'a Nodes),
    Callback(SelectorFn<'a>),
}

impl fmt::Debug for Selector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Expression(expr) => f.debug_tuple("Expression").field(expr).finish(),
            Selector::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Selector::List(nodes) => f.debug_tuple("List").field(nodes).finish(),
            Selector::Collection(nodes) => f.debug_tuple("Collection").field(nodes).finish(),
            Selector::Callback(_) => f.write_str("Callback"),
        }
    }
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(expr: &'a str) -> Self {
        Selector::Expression(Cow::Borrowed(expr))
    }
}

impl<'a> From<&'a String> for Selector<'a> {
    fn from(expr: &'a String) -> Self {
        Selector::Expression(Cow::Borrowed(expr))
    }
}

impl From<String> for Selector<'_> {
    fn from(expr: String) -> Self {
        Selector::Expression(Cow::Owned(expr))
    }
}

impl From<Node> for Selector<'_> {
    fn from(node: Node) -> Self {
        Selector::Node(node)
    }
}

impl From<&Node> for Selector<'_> {
    fn from(node: &Node) -> Self {
        Selector::Node(node.clone())
    }
}

impl From<Vec<Node>> for Selector<'_> {
    fn from(nodes: Vec<Node>) -> Self {
        Selector::List(nodes)
    }
}

impl From<&[Node]> for Selector<'_> {
    fn from(nodes: &[Node]) -> Self {
        Selector::List(nodes.to_vec())
    }
}

impl<'a> From<&'a Nodes> for Selector<'a> {
    fn from(nodes: &'a Nodes) -> Self {
        Selector::Collection(nodes)
    }
}

impl<'a> From<SelectorFn<'a>> for Selector<'a> {
    fn from(callback: SelectorFn<'a>) -> Self {
        Selector::Callback(callback)
    }
}

impl Nodes {
    /// Resolves `selector` with `context` (or the document node) as context.
    /// Expressions must evaluate to a node-set; a callback that declines
    /// yields an empty list.
    pub fn resolve(
        &self,
        selector: &Selector<'_>,
        context: Option<&Node>,
    ) -> Result<Vec<Node>, NodesError> {
        match selector {
            Selector::Expression(expr) => {
                if expr.trim().is_empty() {
                    return Err(NodesError::InvalidSelector(
                        "empty selector expression".to_string(),
                    ));
                }
                let prepared = self.prepare_selector(expr);
                self.document()
                    .evaluate(&prepared, context)?
                    .into_nodes()
                    .ok_or(NodesError::InvalidSelectorResult(prepared))
            }
            Selector::Node(node) => Ok(vec![node.clone()]),
            Selector::List(nodes) => Ok(nodes.clone()),
            Selector::Collection(nodes) => Ok(nodes.to_vec()),
            Selector::Callback(callback) => match callback(context) {
                Some(nodes) => Ok(nodes),
                None => {
                    log::trace!("Selector callback declined, resolving to nothing");
                    Ok(Vec::new())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Nodes {
        Nodes::from_source("<root><a id=\"1\"/><b/><a id=\"2\"/></root>", "xml").unwrap()
    }

    #[test]
    fn expressions_select_in_document_order() {
        let nodes = sample();
        let found = nodes.resolve(&"//a | //b".into(), None).unwrap();
        let names: Vec<String> = found.iter().map(Node::node_name).collect();
        assert_eq!(names, ["a", "b", "a"]);
    }

    #[test]
    fn expressions_resolve_against_the_context_node() {
        let nodes = sample();
        let root = nodes.document().document_element().unwrap();
        assert_eq!(nodes.resolve(&"a".into(), Some(&root)).unwrap().len(), 2);
        assert!(nodes.resolve(&"a".into(), None).unwrap().is_empty());
    }

    #[test]
    fn scalar_results_are_rejected() {
        let nodes = sample();
        assert!(matches!(
            nodes.resolve(&"count(//a)".into(), None),
            Err(NodesError::InvalidSelectorResult(expr)) if expr == "count(//a)"
        ));
        assert!(matches!(
            nodes.resolve(&"  ".into(), None),
            Err(NodesError::InvalidSelector(_))
        ));
    }

    #[test]
    fn literal_nodes_and_collections_pass_through() {
        let nodes = sample();
        let b = nodes.document().select("//b", None).unwrap();
        assert_eq!(nodes.resolve(&Selector::from(&b[0]), None).unwrap(), b);
        assert_eq!(nodes.resolve(&Selector::from(b.clone()), None).unwrap(), b);
        let held = nodes.spawn_with(b.clone()).unwrap();
        assert_eq!(nodes.resolve(&Selector::from(&held), None).unwrap(), b);
    }

    #[test]
    fn callbacks_may_decline() {
        let nodes = sample();
        let none = |_: Option<&Node>| -> Option<Vec<Node>> { None };
        assert!(nodes.resolve(&Selector::Callback(&none), None).unwrap().is_empty());

        let children = |context: Option<&Node>| context.map(Node::children);
        let root = nodes.document().document_element().unwrap();
        assert_eq!(
            nodes.resolve(&Selector::Callback(&children), Some(&root)).unwrap().len(),
            3
        );
    }
}
